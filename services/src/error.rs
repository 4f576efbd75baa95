//! Service error types

use scholar_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Enrollment not found: student {student_id}, course {course_id}")]
    EnrollmentNotFound {
        student_id: String,
        course_id: String,
    },

    #[error("Course not found: {0}")]
    CourseNotFound(String),

    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: u64, available: u64 },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("Cannot tip your own note: {0}")]
    CannotTipOwnNote(String),

    #[error("Student profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
