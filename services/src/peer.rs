//! Peer exchange service

use crate::error::{Result, ServiceError};
use crate::ledger::move_tokens;
use crate::ServiceContext;
use scholar_core::{
    generate_id, now_nanos, Collection, NoteType, PeerNote, PeerNoteUpdate, PeerTip,
};
use scholar_storage::Change;
use std::sync::Arc;
use tracing::{debug, info};

/// Recipient reported for tips on notes that do not exist.
const UNKNOWN_RECIPIENT: &str = "unknown";

const TIP_COLLECTIONS: [Collection; 3] = [
    Collection::PeerNotes,
    Collection::TokenBalances,
    Collection::Transactions,
];

#[derive(Clone)]
pub struct PeerService {
    context: Arc<ServiceContext>,
}

impl PeerService {
    pub(crate) fn new(context: Arc<ServiceContext>) -> Self {
        Self { context }
    }

    pub async fn create_peer_note(
        &self,
        course_id: &str,
        author_name: &str,
        content: &str,
        note_type: NoteType,
    ) -> Result<PeerNote> {
        let now = now_nanos();
        let note = PeerNote {
            id: generate_id(),
            course_id: course_id.to_string(),
            author: self.context.caller_id().to_string(),
            author_name: author_name.to_string(),
            content: content.to_string(),
            note_type,
            created_at: now,
            updated_at: now,
            tips_received: 0,
        };
        self.context.records.add_peer_note(note.clone())?;
        info!(note_id = %note.id, course_id, %note_type, "peer note created");
        Ok(note)
    }

    pub async fn get_all_notes(&self) -> Result<Vec<PeerNote>> {
        Ok(self.context.records.get_peer_notes())
    }

    pub async fn get_course_notes(&self, course_id: &str) -> Result<Vec<PeerNote>> {
        Ok(self.context.records.get_course_notes(course_id))
    }

    /// Notes written by the caller.
    pub async fn get_user_notes(&self) -> Result<Vec<PeerNote>> {
        Ok(self
            .context
            .records
            .get_user_notes(self.context.caller_id()))
    }

    /// Replace the content of a note.
    pub async fn update_peer_note(&self, note_id: &str, content: &str) -> Result<PeerNote> {
        let now = now_nanos();
        self.context
            .records
            .store()
            .transact(&[Collection::PeerNotes], |aggregate| {
                let note = aggregate
                    .peer_note_mut(note_id)
                    .ok_or_else(|| ServiceError::NoteNotFound(note_id.to_string()))?;
                PeerNoteUpdate {
                    content: Some(content.to_string()),
                    updated_at: Some(now),
                    ..Default::default()
                }
                .apply(note);
                Ok(Change::Write(note.clone()))
            })
    }

    /// Tip the author of a note.
    ///
    /// The tokens move from the caller to the author, the note's
    /// `tips_received` grows and the tip lands in both transaction
    /// histories, all in one write. Tipping an unknown note changes nothing.
    pub async fn tip_peer_note(&self, note_id: &str, amount: u64, message: &str) -> Result<PeerTip> {
        if amount == 0 {
            return Err(ServiceError::InvalidAmount("tip amount must be positive".to_string()));
        }
        let tipper = self.context.caller_id();
        let default_balance = self.context.records.default_balance();
        let mut tip = PeerTip {
            id: generate_id(),
            note_id: note_id.to_string(),
            tipper: tipper.to_string(),
            recipient: UNKNOWN_RECIPIENT.to_string(),
            amount,
            timestamp: now_nanos(),
            message: message.to_string(),
        };

        self.context
            .records
            .store()
            .transact(&TIP_COLLECTIONS, |aggregate| {
                let Some(author) = aggregate
                    .peer_notes
                    .iter()
                    .find(|note| note.id == note_id)
                    .map(|note| note.author.clone())
                else {
                    debug!(note_id, "tip for unknown note ignored");
                    tip.recipient = UNKNOWN_RECIPIENT.to_string();
                    return Ok(Change::Skip(tip.clone()));
                };
                if author == tipper {
                    return Err(ServiceError::CannotTipOwnNote(note_id.to_string()));
                }

                tip.recipient = author;
                move_tokens(aggregate, &tip.to_transaction(), default_balance)?;
                if let Some(note) = aggregate.peer_note_mut(note_id) {
                    note.tips_received = note.tips_received.saturating_add(amount);
                }
                info!(note_id, tipper, recipient = %tip.recipient, amount, "note tipped");
                Ok(Change::Write(tip.clone()))
            })
    }

    /// Tips given on `note_id`, oldest first.
    pub async fn get_note_tips(&self, note_id: &str) -> Result<Vec<PeerTip>> {
        Ok(self.tips(|tip| tip.note_id == note_id))
    }

    /// Tips received by `principal`, or by the caller when `None`.
    pub async fn get_user_tips_received(&self, principal: Option<&str>) -> Result<Vec<PeerTip>> {
        let principal = principal.unwrap_or(self.context.caller_id());
        Ok(self.tips(|tip| tip.recipient == principal))
    }

    fn tips(&self, keep: impl Fn(&PeerTip) -> bool) -> Vec<PeerTip> {
        self.context
            .records
            .store()
            .read()
            .ledger()
            .into_iter()
            .filter_map(PeerTip::from_transaction)
            .filter(|tip| keep(tip))
            .collect()
    }
}
