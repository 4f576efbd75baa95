//! Student profiles, enrollments and certificates

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub principal: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub bio: String,
    pub created_at: u64,
    pub updated_at: u64,
}

/// Progress of one student through one course.
///
/// At most one enrollment exists per `(student_id, course_id)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub student_id: String,
    pub course_id: String,
    pub enrolled_at: u64,
    /// Completed section ids, in completion order, without duplicates.
    #[serde(default)]
    pub progress: Vec<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<u64>,
}

impl Enrollment {
    pub fn new(student_id: impl Into<String>, course_id: impl Into<String>, now: u64) -> Self {
        Self {
            student_id: student_id.into(),
            course_id: course_id.into(),
            enrolled_at: now,
            progress: Vec::new(),
            completed: false,
            completed_at: None,
        }
    }

    pub fn matches(&self, student_id: &str, course_id: &str) -> bool {
        self.student_id == student_id && self.course_id == course_id
    }

    /// Append `section_id` unless it is already recorded.
    ///
    /// Returns `true` when the progress list changed.
    pub fn record_section(&mut self, section_id: &str) -> bool {
        if self.progress.iter().any(|done| done == section_id) {
            return false;
        }
        self.progress.push(section_id.to_string());
        true
    }

    pub fn mark_completed(&mut self, now: u64) {
        self.completed = true;
        self.completed_at = Some(now);
    }
}

/// Partial enrollment fields merged by `Records::update_enrollment`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrollmentUpdate {
    pub progress: Option<Vec<String>>,
    pub completed: Option<bool>,
    pub completed_at: Option<u64>,
}

impl EnrollmentUpdate {
    pub fn completed(now: u64) -> Self {
        Self {
            completed: Some(true),
            completed_at: Some(now),
            ..Self::default()
        }
    }

    pub fn apply(&self, enrollment: &mut Enrollment) {
        if let Some(progress) = &self.progress {
            enrollment.progress = progress.clone();
        }
        if let Some(completed) = self.completed {
            enrollment.completed = completed;
        }
        if let Some(completed_at) = self.completed_at {
            enrollment.completed_at = Some(completed_at);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub certificate_id: String,
    pub student_id: String,
    #[serde(default)]
    pub student_name: String,
    pub course_id: String,
    pub course_title: String,
    pub issued_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_section_is_idempotent() {
        let mut enrollment = Enrollment::new("alice", "course1", 1);
        assert!(enrollment.record_section("s1"));
        assert!(!enrollment.record_section("s1"));
        assert!(enrollment.record_section("s2"));
        assert_eq!(enrollment.progress, vec!["s1", "s2"]);
    }

    #[test]
    fn test_update_marks_completion() {
        let mut enrollment = Enrollment::new("alice", "course1", 1);
        EnrollmentUpdate::completed(42).apply(&mut enrollment);
        assert!(enrollment.completed);
        assert_eq!(enrollment.completed_at, Some(42));
        assert!(enrollment.progress.is_empty());
    }

    #[test]
    fn test_enrollment_json_shape() {
        let enrollment = Enrollment::new("alice", "course1", 7);
        let json = serde_json::to_value(&enrollment).unwrap();
        assert_eq!(json["student_id"], "alice");
        assert_eq!(json["course_id"], "course1");
        assert_eq!(json["completed_at"], serde_json::Value::Null);
    }
}
