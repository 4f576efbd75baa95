//! ICP Scholar Core Library
//!
//! Data model shared by the record store and the service facade: courses,
//! enrollments, certificates, peer notes, token transactions, and the single
//! aggregate that holds all of them.

pub mod course;
pub mod ids;
pub mod peer;
pub mod seed;
pub mod state;
pub mod student;
pub mod token;

// Re-export main types
pub use course::{Course, CourseUpdate, EducatorProfile, Section};
pub use ids::{generate_id, now_millis, now_nanos};
pub use peer::{NoteType, PeerNote, PeerNoteUpdate, PeerTip};
pub use state::{Aggregate, Collection, Principal};
pub use student::{Certificate, Enrollment, EnrollmentUpdate, StudentProfile};
pub use token::{RewardReceipt, TokenTransaction, TransactionType};

/// Balance reported for a principal that has never been assigned one.
pub const DEFAULT_TOKEN_BALANCE: u64 = 100;

/// Storage key the aggregate is persisted under.
pub const DEFAULT_STORAGE_KEY: &str = "icp_scholar_global_data";

/// Display name used on certificates when the student has no profile.
pub const DEFAULT_STUDENT_NAME: &str = "Student";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_constants() {
        assert_eq!(DEFAULT_TOKEN_BALANCE, 100);
        assert_eq!(DEFAULT_STORAGE_KEY, "icp_scholar_global_data");
        assert_eq!(DEFAULT_STUDENT_NAME, "Student");
    }
}
