//! Token ledger records

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    Mint,
    Transfer,
    CourseReward,
    PeerTip,
}

/// One entry in a principal's transaction history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTransaction {
    pub id: String,
    pub from: String,
    pub to: String,
    pub amount: u64,
    pub transaction_type: TransactionType,
    pub timestamp: u64,
    #[serde(default)]
    pub memo: String,
    /// Note a `PeerTip` transaction was given for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_id: Option<String>,
}

impl TokenTransaction {
    pub fn new(
        id: String,
        from: &str,
        to: &str,
        amount: u64,
        transaction_type: TransactionType,
        timestamp: u64,
        memo: &str,
    ) -> Self {
        Self {
            id,
            from: from.to_string(),
            to: to.to_string(),
            amount,
            transaction_type,
            timestamp,
            memo: memo.to_string(),
            note_id: None,
        }
    }

    /// Reward credited to `student` for finishing `course_id`.
    pub fn course_reward(
        id: String,
        issuer: &str,
        student: &str,
        amount: u64,
        course_id: &str,
        timestamp: u64,
    ) -> Self {
        Self::new(
            id,
            issuer,
            student,
            amount,
            TransactionType::CourseReward,
            timestamp,
            &reward_memo(course_id),
        )
    }

    /// Tokens minted into existence, not taken from anyone's balance.
    pub fn is_mint(&self) -> bool {
        self.transaction_type == TransactionType::Mint
    }
}

/// Memo attached to course completion rewards.
pub fn reward_memo(course_id: &str) -> String {
    format!("Course completion reward: {}", course_id)
}

/// Result of crediting a course completion reward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardReceipt {
    pub success: bool,
    pub transaction_id: String,
    pub new_balance: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_reward_memo_names_course() {
        let tx = TokenTransaction::course_reward(
            "tx1".to_string(),
            "issuer",
            "alice",
            50,
            "course1",
            10,
        );
        assert_eq!(tx.memo, "Course completion reward: course1");
        assert_eq!(tx.transaction_type, TransactionType::CourseReward);
        assert_eq!(tx.to, "alice");
        assert_eq!(tx.amount, 50);
        assert!(tx.note_id.is_none());
    }

    #[test]
    fn test_note_id_omitted_from_json_when_absent() {
        let tx = TokenTransaction::new(
            "tx1".to_string(),
            "alice",
            "bob",
            5,
            TransactionType::Transfer,
            1,
            "",
        );
        let json = serde_json::to_value(&tx).unwrap();
        assert!(json.get("note_id").is_none());

        let back: TokenTransaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, tx);
    }
}
