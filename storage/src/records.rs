//! Domain accessors
//!
//! Narrow operations over one slice of the aggregate. Each call is its own
//! read-modify-write through [`RecordStore::update`]; updates addressed to a
//! record that does not exist are silent no-ops that neither write nor
//! notify.

use crate::error::Result;
use crate::record_store::{Change, RecordStore};
use scholar_core::seed::seed_notes;
use scholar_core::{
    now_nanos, Certificate, Collection, Course, CourseUpdate, EducatorProfile, Enrollment,
    EnrollmentUpdate, PeerNote, PeerNoteUpdate, StudentProfile, TokenTransaction,
    DEFAULT_TOKEN_BALANCE,
};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct Records {
    store: Arc<RecordStore>,
    default_balance: u64,
}

impl Records {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self {
            store,
            default_balance: DEFAULT_TOKEN_BALANCE,
        }
    }

    /// Balance reported for principals without one.
    pub fn with_default_balance(mut self, default_balance: u64) -> Self {
        self.default_balance = default_balance;
        self
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    pub fn default_balance(&self) -> u64 {
        self.default_balance
    }

    /// Write the welcome notes into a store that has never been used.
    ///
    /// Returns whether anything was written.
    pub fn initialize_defaults(&self) -> Result<bool> {
        let seeded = self.store.update(&[Collection::PeerNotes], |aggregate| {
            if !aggregate.is_pristine() {
                return Change::Skip(false);
            }
            aggregate.peer_notes = seed_notes(now_nanos());
            Change::Write(true)
        })?;
        if seeded {
            info!("initialized default shared data");
        }
        Ok(seeded)
    }

    // Courses

    /// Insert `course`, replacing any course with the same id.
    pub fn add_course(&self, course: Course) -> Result<()> {
        debug!(course_id = %course.id, title = %course.title, "adding course");
        self.store.update(&[Collection::Courses], |aggregate| {
            aggregate.courses.retain(|c| c.id != course.id);
            aggregate.courses.push(course.clone());
            Change::Write(())
        })
    }

    pub fn get_courses(&self) -> Vec<Course> {
        self.store.read().courses
    }

    pub fn get_course(&self, course_id: &str) -> Option<Course> {
        self.get_courses().into_iter().find(|c| c.id == course_id)
    }

    /// Published courses in insertion order.
    pub fn get_published_courses(&self) -> Vec<Course> {
        self.get_courses()
            .into_iter()
            .filter(|c| c.published)
            .collect()
    }

    pub fn get_educator_courses(&self, educator_id: &str) -> Vec<Course> {
        self.get_courses()
            .into_iter()
            .filter(|c| c.educator_id == educator_id)
            .collect()
    }

    /// Merge `update` into the course. Returns whether the course existed.
    pub fn update_course(&self, course_id: &str, update: &CourseUpdate) -> Result<bool> {
        self.store.update(&[Collection::Courses], |aggregate| {
            match aggregate.course_mut(course_id) {
                Some(course) => {
                    update.apply(course);
                    Change::Write(true)
                }
                None => Change::Skip(false),
            }
        })
    }

    // Peer notes

    pub fn add_peer_note(&self, note: PeerNote) -> Result<()> {
        debug!(note_id = %note.id, course_id = %note.course_id, "adding peer note");
        self.store.update(&[Collection::PeerNotes], |aggregate| {
            aggregate.peer_notes.push(note.clone());
            Change::Write(())
        })
    }

    pub fn get_peer_notes(&self) -> Vec<PeerNote> {
        self.store.read().peer_notes
    }

    pub fn get_course_notes(&self, course_id: &str) -> Vec<PeerNote> {
        self.get_peer_notes()
            .into_iter()
            .filter(|n| n.course_id == course_id)
            .collect()
    }

    pub fn get_user_notes(&self, author: &str) -> Vec<PeerNote> {
        self.get_peer_notes()
            .into_iter()
            .filter(|n| n.author == author)
            .collect()
    }

    pub fn update_peer_note(&self, note_id: &str, update: &PeerNoteUpdate) -> Result<bool> {
        self.store.update(&[Collection::PeerNotes], |aggregate| {
            match aggregate.peer_note_mut(note_id) {
                Some(note) => {
                    update.apply(note);
                    Change::Write(true)
                }
                None => Change::Skip(false),
            }
        })
    }

    // Enrollments

    /// Insert `enrollment`, replacing any existing one for the same
    /// student and course.
    pub fn add_enrollment(&self, enrollment: Enrollment) -> Result<()> {
        debug!(student_id = %enrollment.student_id, course_id = %enrollment.course_id, "adding enrollment");
        self.store.update(&[Collection::Enrollments], |aggregate| {
            aggregate
                .enrollments
                .retain(|e| !e.matches(&enrollment.student_id, &enrollment.course_id));
            aggregate.enrollments.push(enrollment.clone());
            Change::Write(())
        })
    }

    pub fn get_enrollments(&self) -> Vec<Enrollment> {
        self.store.read().enrollments
    }

    pub fn get_student_enrollments(&self, student_id: &str) -> Vec<Enrollment> {
        self.get_enrollments()
            .into_iter()
            .filter(|e| e.student_id == student_id)
            .collect()
    }

    pub fn get_enrollment(&self, student_id: &str, course_id: &str) -> Option<Enrollment> {
        self.get_enrollments()
            .into_iter()
            .find(|e| e.matches(student_id, course_id))
    }

    pub fn update_enrollment(
        &self,
        student_id: &str,
        course_id: &str,
        update: &EnrollmentUpdate,
    ) -> Result<bool> {
        self.store.update(&[Collection::Enrollments], |aggregate| {
            match aggregate.enrollment_mut(student_id, course_id) {
                Some(enrollment) => {
                    update.apply(enrollment);
                    Change::Write(true)
                }
                None => Change::Skip(false),
            }
        })
    }

    // Certificates

    pub fn add_certificate(&self, certificate: Certificate) -> Result<()> {
        debug!(course_title = %certificate.course_title, "adding certificate");
        self.store.update(&[Collection::Certificates], |aggregate| {
            aggregate.certificates.push(certificate.clone());
            Change::Write(())
        })
    }

    pub fn get_certificates(&self) -> Vec<Certificate> {
        self.store.read().certificates
    }

    pub fn get_student_certificates(&self, student_id: &str) -> Vec<Certificate> {
        self.get_certificates()
            .into_iter()
            .filter(|c| c.student_id == student_id)
            .collect()
    }

    // Profiles

    pub fn set_educator_profile(&self, principal: &str, profile: EducatorProfile) -> Result<()> {
        self.store.update(&[Collection::EducatorProfiles], |aggregate| {
            aggregate
                .educator_profiles
                .insert(principal.to_string(), profile.clone());
            Change::Write(())
        })
    }

    pub fn get_educator_profile(&self, principal: &str) -> Option<EducatorProfile> {
        self.store.read().educator_profiles.remove(principal)
    }

    pub fn set_student_profile(&self, principal: &str, profile: StudentProfile) -> Result<()> {
        self.store.update(&[Collection::StudentProfiles], |aggregate| {
            aggregate
                .student_profiles
                .insert(principal.to_string(), profile.clone());
            Change::Write(())
        })
    }

    pub fn get_student_profile(&self, principal: &str) -> Option<StudentProfile> {
        self.store.read().student_profiles.remove(principal)
    }

    // Tokens

    pub fn get_token_balance(&self, principal: &str) -> u64 {
        self.store
            .read()
            .balance_or(principal, self.default_balance)
    }

    pub fn set_token_balance(&self, principal: &str, balance: u64) -> Result<()> {
        debug!(principal, balance, "setting token balance");
        self.store.update(&[Collection::TokenBalances], |aggregate| {
            aggregate
                .token_balances
                .insert(principal.to_string(), balance);
            Change::Write(())
        })
    }

    /// Append to `principal`'s history. Histories are never trimmed.
    pub fn add_transaction(&self, principal: &str, transaction: TokenTransaction) -> Result<()> {
        self.store.update(&[Collection::Transactions], |aggregate| {
            aggregate.push_transaction(principal, transaction.clone());
            Change::Write(())
        })
    }

    pub fn get_transactions(&self, principal: &str) -> Vec<TokenTransaction> {
        self.store
            .read()
            .transactions
            .remove(principal)
            .unwrap_or_default()
    }
}
