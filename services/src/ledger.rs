//! Balance movements shared by the token and peer services

use crate::error::{Result, ServiceError};
use scholar_core::{Aggregate, Collection, TokenTransaction};

/// Collections a balance movement touches.
pub const LEDGER_COLLECTIONS: [Collection; 2] = [Collection::TokenBalances, Collection::Transactions];

/// Check the arguments of a movement from `from` to `to`.
pub(crate) fn validate_movement(from: &str, to: &str, amount: u64, what: &str) -> Result<()> {
    if amount == 0 {
        return Err(ServiceError::InvalidAmount(format!("{} amount must be positive", what)));
    }
    if from == to {
        return Err(ServiceError::InvalidAmount(format!("{} to yourself is not allowed", what)));
    }
    Ok(())
}

/// Debit `transaction.from`, credit `transaction.to` and record the
/// transaction in both histories. Nothing changes when the sender is short.
pub(crate) fn move_tokens(
    aggregate: &mut Aggregate,
    transaction: &TokenTransaction,
    default_balance: u64,
) -> Result<()> {
    let (from, to, amount) = (&transaction.from, &transaction.to, transaction.amount);
    let available = aggregate.balance_or(from, default_balance);
    if available < amount {
        return Err(ServiceError::InsufficientBalance {
            requested: amount,
            available,
        });
    }
    let received = aggregate.balance_or(to, default_balance);

    aggregate.token_balances.insert(from.clone(), available - amount);
    aggregate
        .token_balances
        .insert(to.clone(), received.saturating_add(amount));
    aggregate.push_transaction(from, transaction.clone());
    aggregate.push_transaction(to, transaction.clone());
    Ok(())
}

/// Credit `transaction.to` without debiting anyone. Returns the new balance.
pub(crate) fn credit(aggregate: &mut Aggregate, transaction: &TokenTransaction, default_balance: u64) -> u64 {
    let balance = aggregate
        .balance_or(&transaction.to, default_balance)
        .saturating_add(transaction.amount);
    aggregate
        .token_balances
        .insert(transaction.to.clone(), balance);
    aggregate.push_transaction(&transaction.to, transaction.clone());
    balance
}
