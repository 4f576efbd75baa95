//! Token service

use crate::error::{Result, ServiceError};
use crate::ledger::{credit, move_tokens, validate_movement, LEDGER_COLLECTIONS};
use crate::{ServiceContext, REWARD_ISSUER};
use scholar_core::{generate_id, now_nanos, RewardReceipt, TokenTransaction, TransactionType};
use scholar_storage::Change;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct TokenService {
    context: Arc<ServiceContext>,
}

impl TokenService {
    pub(crate) fn new(context: Arc<ServiceContext>) -> Self {
        Self { context }
    }

    /// Balance of `principal`, or of the caller when `None`.
    pub async fn get_balance(&self, principal: Option<&str>) -> Result<u64> {
        let principal = principal.unwrap_or(self.context.caller_id());
        Ok(self.context.records.get_token_balance(principal))
    }

    /// Create `amount` new tokens for `to`, issued by the caller.
    pub async fn mint_tokens(&self, to: &str, amount: u64, memo: &str) -> Result<TokenTransaction> {
        if amount == 0 {
            return Err(ServiceError::InvalidAmount("mint amount must be positive".to_string()));
        }
        let issuer = self.context.caller_id();
        let default_balance = self.context.records.default_balance();
        let transaction = TokenTransaction::new(
            generate_id(),
            issuer,
            to,
            amount,
            TransactionType::Mint,
            now_nanos(),
            memo,
        );

        let new_balance = self
            .context
            .records
            .store()
            .transact(&LEDGER_COLLECTIONS, |aggregate| {
                let balance = credit(aggregate, &transaction, default_balance);
                if issuer != to {
                    aggregate.push_transaction(issuer, transaction.clone());
                }
                Ok::<_, ServiceError>(Change::Write(balance))
            })?;

        info!(issuer, to, amount, new_balance, "tokens minted");
        Ok(transaction)
    }

    /// Sum of every mint so far.
    ///
    /// Default balances of principals never written are not part of the
    /// supply.
    pub async fn get_total_supply(&self) -> Result<u64> {
        let aggregate = self.context.records.store().read();
        Ok(aggregate
            .ledger()
            .into_iter()
            .filter(|tx| tx.is_mint())
            .fold(0u64, |supply, tx| supply.saturating_add(tx.amount)))
    }

    /// Move `amount` from the caller to `to`.
    ///
    /// The debit, the credit and both history entries are one write.
    pub async fn transfer_tokens(&self, to: &str, amount: u64, memo: &str) -> Result<TokenTransaction> {
        self.send(to, amount, memo, TransactionType::Transfer).await
    }

    /// Tip `to` directly, outside of any note.
    pub async fn tip_peer(&self, to: &str, amount: u64, memo: &str) -> Result<TokenTransaction> {
        self.send(to, amount, memo, TransactionType::PeerTip).await
    }

    async fn send(
        &self,
        to: &str,
        amount: u64,
        memo: &str,
        transaction_type: TransactionType,
    ) -> Result<TokenTransaction> {
        let from = self.context.caller_id();
        let what = match transaction_type {
            TransactionType::PeerTip => "tip",
            _ => "transfer",
        };
        validate_movement(from, to, amount, what)?;

        let default_balance = self.context.records.default_balance();
        let transaction = TokenTransaction::new(
            generate_id(),
            from,
            to,
            amount,
            transaction_type,
            now_nanos(),
            memo,
        );

        self.context
            .records
            .store()
            .transact(&LEDGER_COLLECTIONS, |aggregate| {
                move_tokens(aggregate, &transaction, default_balance)?;
                Ok::<_, ServiceError>(Change::Write(()))
            })?;

        info!(from, to, amount, ?transaction_type, "tokens sent");
        Ok(transaction)
    }

    pub async fn get_transaction_history(&self) -> Result<Vec<TokenTransaction>> {
        Ok(self
            .context
            .records
            .get_transactions(self.context.caller_id()))
    }

    /// Credit `amount` to `student_id` for finishing `course_id`.
    pub async fn reward_course_completion(
        &self,
        student_id: &str,
        amount: u64,
        course_id: &str,
    ) -> Result<RewardReceipt> {
        let default_balance = self.context.records.default_balance();
        let transaction = TokenTransaction::course_reward(
            generate_id(),
            REWARD_ISSUER,
            student_id,
            amount,
            course_id,
            now_nanos(),
        );

        let new_balance = self
            .context
            .records
            .store()
            .transact(&LEDGER_COLLECTIONS, |aggregate| {
                Ok::<_, ServiceError>(Change::Write(credit(aggregate, &transaction, default_balance)))
            })?;

        info!(student_id, course_id, amount, new_balance, "course reward paid");
        Ok(RewardReceipt {
            success: true,
            transaction_id: transaction.id,
            new_balance,
        })
    }
}
