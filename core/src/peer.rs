//! Peer notes and tips

use crate::token::{TokenTransaction, TransactionType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteType {
    Question,
    Answer,
    #[serde(alias = "Study Note")]
    StudyNote,
    Tip,
}

impl fmt::Display for NoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NoteType::Question => "Question",
            NoteType::Answer => "Answer",
            NoteType::StudyNote => "StudyNote",
            NoteType::Tip => "Tip",
        };
        f.write_str(name)
    }
}

impl FromStr for NoteType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace([' ', '-', '_'], "").as_str() {
            "question" => Ok(NoteType::Question),
            "answer" => Ok(NoteType::Answer),
            "studynote" => Ok(NoteType::StudyNote),
            "tip" => Ok(NoteType::Tip),
            _ => Err(format!("Unknown note type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerNote {
    pub id: String,
    pub course_id: String,
    pub author: String,
    pub author_name: String,
    pub content: String,
    pub note_type: NoteType,
    pub created_at: u64,
    pub updated_at: u64,
    /// Accumulated tips; only ever grows.
    #[serde(default)]
    pub tips_received: u64,
}

/// Partial note fields merged by `Records::update_peer_note`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerNoteUpdate {
    pub content: Option<String>,
    pub note_type: Option<NoteType>,
    pub tips_received: Option<u64>,
    pub updated_at: Option<u64>,
}

impl PeerNoteUpdate {
    pub fn apply(&self, note: &mut PeerNote) {
        if let Some(content) = &self.content {
            note.content = content.clone();
        }
        if let Some(note_type) = self.note_type {
            note.note_type = note_type;
        }
        if let Some(tips) = self.tips_received {
            note.tips_received = tips;
        }
        if let Some(updated_at) = self.updated_at {
            note.updated_at = updated_at;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerTip {
    pub id: String,
    pub note_id: String,
    pub tipper: String,
    pub recipient: String,
    pub amount: u64,
    pub timestamp: u64,
    pub message: String,
}

impl PeerTip {
    /// Ledger entry recording this tip.
    pub fn to_transaction(&self) -> TokenTransaction {
        let mut transaction = TokenTransaction::new(
            self.id.clone(),
            &self.tipper,
            &self.recipient,
            self.amount,
            TransactionType::PeerTip,
            self.timestamp,
            &self.message,
        );
        transaction.note_id = Some(self.note_id.clone());
        transaction
    }

    /// The tip a ledger entry records, if it is a tip on a note.
    pub fn from_transaction(transaction: &TokenTransaction) -> Option<Self> {
        if transaction.transaction_type != TransactionType::PeerTip {
            return None;
        }
        Some(Self {
            id: transaction.id.clone(),
            note_id: transaction.note_id.clone()?,
            tipper: transaction.from.clone(),
            recipient: transaction.to.clone(),
            amount: transaction.amount,
            timestamp: transaction.timestamp,
            message: transaction.memo.clone(),
        })
    }
}
