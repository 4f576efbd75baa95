//! Aggregate application state

use crate::course::{Course, EducatorProfile};
use crate::peer::PeerNote;
use crate::student::{Certificate, Enrollment, StudentProfile};
use crate::token::TokenTransaction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Opaque identity of the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Principal {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for Principal {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// All mutable application state, persisted as one JSON blob.
///
/// Missing fields deserialize to empty collections so a partial or older
/// blob still yields a structurally complete value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Aggregate {
    pub courses: Vec<Course>,
    pub peer_notes: Vec<PeerNote>,
    pub enrollments: Vec<Enrollment>,
    pub certificates: Vec<Certificate>,
    pub educator_profiles: HashMap<String, EducatorProfile>,
    pub student_profiles: HashMap<String, StudentProfile>,
    pub token_balances: HashMap<String, u64>,
    pub transactions: HashMap<String, Vec<TokenTransaction>>,
    /// Milliseconds since the epoch of the last write.
    pub last_updated: i64,
}

impl Default for Aggregate {
    fn default() -> Self {
        Self {
            courses: Vec::new(),
            peer_notes: Vec::new(),
            enrollments: Vec::new(),
            certificates: Vec::new(),
            educator_profiles: HashMap::new(),
            student_profiles: HashMap::new(),
            token_balances: HashMap::new(),
            transactions: HashMap::new(),
            last_updated: crate::ids::now_millis(),
        }
    }
}

impl Aggregate {
    /// True when nothing has been created yet: no courses, no notes and no
    /// educator profiles.
    pub fn is_pristine(&self) -> bool {
        self.courses.is_empty() && self.peer_notes.is_empty() && self.educator_profiles.is_empty()
    }

    /// Equality ignoring `last_updated`.
    pub fn same_records(&self, other: &Aggregate) -> bool {
        self.courses == other.courses
            && self.peer_notes == other.peer_notes
            && self.enrollments == other.enrollments
            && self.certificates == other.certificates
            && self.educator_profiles == other.educator_profiles
            && self.student_profiles == other.student_profiles
            && self.token_balances == other.token_balances
            && self.transactions == other.transactions
    }

    pub fn course_mut(&mut self, course_id: &str) -> Option<&mut Course> {
        self.courses.iter_mut().find(|c| c.id == course_id)
    }

    pub fn enrollment_mut(&mut self, student_id: &str, course_id: &str) -> Option<&mut Enrollment> {
        self.enrollments
            .iter_mut()
            .find(|e| e.matches(student_id, course_id))
    }

    pub fn peer_note_mut(&mut self, note_id: &str) -> Option<&mut PeerNote> {
        self.peer_notes.iter_mut().find(|n| n.id == note_id)
    }

    pub fn certificate_for(&self, student_id: &str, course_id: &str) -> Option<&Certificate> {
        self.certificates
            .iter()
            .find(|c| c.student_id == student_id && c.course_id == course_id)
    }

    pub fn balance_or(&self, principal: &str, default_balance: u64) -> u64 {
        self.token_balances
            .get(principal)
            .copied()
            .unwrap_or(default_balance)
    }

    pub fn push_transaction(&mut self, principal: &str, transaction: TokenTransaction) {
        self.transactions
            .entry(principal.to_string())
            .or_default()
            .push(transaction);
    }

    /// Every transaction once, oldest first.
    ///
    /// A transaction between two principals sits in both histories; it is
    /// returned a single time.
    pub fn ledger(&self) -> Vec<&TokenTransaction> {
        let mut seen = HashSet::new();
        let mut ledger: Vec<&TokenTransaction> = self
            .transactions
            .values()
            .flatten()
            .filter(|tx| seen.insert(tx.id.as_str()))
            .collect();
        ledger.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        ledger
    }
}

/// One slice of the aggregate; the topic carried by change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    Courses,
    PeerNotes,
    Enrollments,
    Certificates,
    EducatorProfiles,
    StudentProfiles,
    TokenBalances,
    Transactions,
}

impl Collection {
    pub const ALL: [Collection; 8] = [
        Collection::Courses,
        Collection::PeerNotes,
        Collection::Enrollments,
        Collection::Certificates,
        Collection::EducatorProfiles,
        Collection::StudentProfiles,
        Collection::TokenBalances,
        Collection::Transactions,
    ];
}
