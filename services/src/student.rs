//! Student service

use crate::completion::{complete_enrollment, CompletionRequest, COMPLETION_COLLECTIONS};
use crate::error::{Result, ServiceError};
use crate::ServiceContext;
use scholar_core::{now_nanos, Certificate, Collection, Enrollment, StudentProfile};
use scholar_storage::Change;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct StudentService {
    context: Arc<ServiceContext>,
}

impl StudentService {
    pub(crate) fn new(context: Arc<ServiceContext>) -> Self {
        Self { context }
    }

    pub async fn create_student_profile(&self, name: &str, email: &str, bio: &str) -> Result<StudentProfile> {
        let now = now_nanos();
        let profile = StudentProfile {
            principal: self.context.caller_id().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            bio: bio.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.context
            .records
            .set_student_profile(self.context.caller_id(), profile.clone())?;
        Ok(profile)
    }

    pub async fn get_student_profile(&self) -> Result<Option<StudentProfile>> {
        Ok(self
            .context
            .records
            .get_student_profile(self.context.caller_id()))
    }

    /// Change the given fields of the caller's profile.
    pub async fn update_student_profile(
        &self,
        name: Option<&str>,
        email: Option<&str>,
        bio: Option<&str>,
    ) -> Result<StudentProfile> {
        let principal = self.context.caller_id();
        let now = now_nanos();
        self.context
            .records
            .store()
            .transact(&[Collection::StudentProfiles], |aggregate| {
                let profile = aggregate
                    .student_profiles
                    .get_mut(principal)
                    .ok_or_else(|| ServiceError::ProfileNotFound(principal.to_string()))?;
                if let Some(name) = name {
                    profile.name = name.to_string();
                }
                if let Some(email) = email {
                    profile.email = email.to_string();
                }
                if let Some(bio) = bio {
                    profile.bio = bio.to_string();
                }
                profile.updated_at = now;
                Ok(Change::Write(profile.clone()))
            })
    }

    /// Enroll the caller, resetting any earlier enrollment in the course.
    pub async fn enroll_in_course(&self, course_id: &str) -> Result<Enrollment> {
        let enrollment = Enrollment::new(self.context.caller_id(), course_id, now_nanos());
        self.context.records.add_enrollment(enrollment.clone())?;
        info!(student_id = %enrollment.student_id, course_id, "enrolled");
        Ok(enrollment)
    }

    pub async fn get_student_enrollments(&self) -> Result<Vec<Enrollment>> {
        Ok(self
            .context
            .records
            .get_student_enrollments(self.context.caller_id()))
    }

    /// Record `section_id` as done.
    ///
    /// When the progress then covers every section of the course, the course
    /// is completed in the same write: certificate issued, reward paid.
    pub async fn mark_section_complete(&self, course_id: &str, section_id: &str) -> Result<Enrollment> {
        let student_id = self.context.caller_id();
        let default_balance = self.context.records.default_balance();
        let now = now_nanos();

        self.context
            .records
            .store()
            .transact(&COMPLETION_COLLECTIONS, |aggregate| {
                let enrollment = aggregate.enrollment_mut(student_id, course_id).ok_or_else(|| {
                    ServiceError::EnrollmentNotFound {
                        student_id: student_id.to_string(),
                        course_id: course_id.to_string(),
                    }
                })?;
                let recorded = enrollment.record_section(section_id);
                let completed = enrollment.completed;
                let progress = enrollment.progress.clone();

                let course = self.context.find_course(aggregate, course_id);
                let mut changed = recorded;
                if let Some(course) = course.filter(|c| !completed && c.is_covered_by(&progress)) {
                    debug!(course_id, "all sections done; completing course");
                    let completion = complete_enrollment(
                        aggregate,
                        &CompletionRequest {
                            student_id,
                            course_id,
                            course_title: &course.title,
                            token_reward: course.token_reward,
                            default_student_name: &self.context.options.default_student_name,
                            default_balance,
                            now,
                        },
                    );
                    changed |= completion.changed;
                }

                let enrollment = aggregate
                    .enrollments
                    .iter()
                    .find(|e| e.matches(student_id, course_id))
                    .cloned()
                    .ok_or_else(|| ServiceError::EnrollmentNotFound {
                        student_id: student_id.to_string(),
                        course_id: course_id.to_string(),
                    })?;
                Ok(if changed {
                    Change::Write(enrollment)
                } else {
                    Change::Skip(enrollment)
                })
            })
    }

    /// Complete the caller's enrollment and return its certificate.
    ///
    /// Pays the course's token reward on the first completion only; repeated
    /// calls return the certificate already issued. Without an enrollment the
    /// certificate is issued all the same.
    pub async fn complete_course(&self, course_id: &str, course_title: &str) -> Result<Certificate> {
        let student_id = self.context.caller_id();
        let default_balance = self.context.records.default_balance();
        let now = now_nanos();

        self.context
            .records
            .store()
            .transact(&COMPLETION_COLLECTIONS, |aggregate| {
                let token_reward = self
                    .context
                    .find_course(aggregate, course_id)
                    .map(|course| course.token_reward)
                    .unwrap_or(0);
                let completion = complete_enrollment(
                    aggregate,
                    &CompletionRequest {
                        student_id,
                        course_id,
                        course_title,
                        token_reward,
                        default_student_name: &self.context.options.default_student_name,
                        default_balance,
                        now,
                    },
                );
                Ok(if completion.changed {
                    Change::Write(completion.certificate)
                } else {
                    Change::Skip(completion.certificate)
                })
            })
    }

    pub async fn get_student_certificates(&self) -> Result<Vec<Certificate>> {
        Ok(self
            .context
            .records
            .get_student_certificates(self.context.caller_id()))
    }
}

#[cfg(test)]
mod tests {
    use crate::{ScholarServices, ServiceError, ServiceOptions};
    use scholar_core::Principal;
    use scholar_storage::{RecordStore, Records};
    use std::sync::Arc;

    fn services(caller: &str) -> ScholarServices {
        let records = Records::new(Arc::new(RecordStore::in_memory()));
        ScholarServices::new(records, Principal::from(caller), ServiceOptions::default())
    }

    #[tokio::test]
    async fn test_update_profile_changes_given_fields() {
        let services = services("alice");
        assert!(matches!(
            services.student.update_student_profile(Some("A"), None, None).await,
            Err(ServiceError::ProfileNotFound(_))
        ));

        let created = services
            .student
            .create_student_profile("Alice", "alice@example.com", "hi")
            .await
            .unwrap();
        let updated = services
            .student
            .update_student_profile(None, Some("alice@example.org"), None)
            .await
            .unwrap();

        assert_eq!(updated.name, "Alice");
        assert_eq!(updated.email, "alice@example.org");
        assert_eq!(updated.bio, "hi");
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(services.student.get_student_profile().await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_reenrolling_resets_enrollment() {
        let services = services("alice");
        services.student.enroll_in_course("course1").await.unwrap();
        services
            .student
            .mark_section_complete("course1", "intro-blockchain")
            .await
            .unwrap();

        let again = services.student.enroll_in_course("course1").await.unwrap();
        let enrollments = services.student.get_student_enrollments().await.unwrap();

        assert_eq!(enrollments.len(), 1);
        assert!(enrollments[0].progress.is_empty());
        assert_eq!(enrollments[0].enrolled_at, again.enrolled_at);
    }

    #[tokio::test]
    async fn test_mark_section_twice_records_once() {
        let services = services("alice");
        services.student.enroll_in_course("course1").await.unwrap();

        services
            .student
            .mark_section_complete("course1", "crypto-foundations")
            .await
            .unwrap();
        let enrollment = services
            .student
            .mark_section_complete("course1", "crypto-foundations")
            .await
            .unwrap();

        assert_eq!(enrollment.progress, vec!["crypto-foundations"]);
        assert!(!enrollment.completed);
    }

    #[tokio::test]
    async fn test_mark_section_without_enrollment_fails() {
        let services = services("alice");
        let result = services
            .student
            .mark_section_complete("course1", "intro-blockchain")
            .await;
        assert!(matches!(result, Err(ServiceError::EnrollmentNotFound { .. })));
    }

    #[tokio::test]
    async fn test_completing_last_section_completes_course() {
        let services = services("alice");
        services.student.enroll_in_course("course2").await.unwrap();

        let mut enrollment = None;
        for section in ["smart-contract-basics", "solidity-programming", "dapp-architecture"] {
            enrollment = Some(
                services
                    .student
                    .mark_section_complete("course2", section)
                    .await
                    .unwrap(),
            );
        }

        let enrollment = enrollment.unwrap();
        assert!(enrollment.completed);
        assert!(enrollment.completed_at.is_some());

        let certificates = services.student.get_student_certificates().await.unwrap();
        assert_eq!(certificates.len(), 1);
        assert_eq!(certificates[0].course_title, "Smart Contracts & DApp Development");
        assert_eq!(certificates[0].student_name, "Student");
        assert_eq!(services.token.get_balance(None).await.unwrap(), 100 + 75);
    }

    #[tokio::test]
    async fn test_complete_course_uses_profile_name_and_is_idempotent() {
        let services = services("alice");
        services
            .student
            .create_student_profile("Alice", "alice@example.com", "")
            .await
            .unwrap();
        services.student.enroll_in_course("course1").await.unwrap();

        let first = services
            .student
            .complete_course("course1", "Introduction to Blockchain")
            .await
            .unwrap();
        let second = services
            .student
            .complete_course("course1", "Introduction to Blockchain")
            .await
            .unwrap();

        assert_eq!(first.student_name, "Alice");
        assert_eq!(first, second);
        assert_eq!(services.student.get_student_certificates().await.unwrap().len(), 1);
        assert_eq!(services.token.get_balance(None).await.unwrap(), 150);
        assert_eq!(services.token.get_transaction_history().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_complete_course_without_enrollment_still_certifies() {
        let services = services("alice");
        let certificate = services
            .student
            .complete_course("course1", "Intro")
            .await
            .unwrap();

        assert_eq!(certificate.course_id, "course1");
        assert_eq!(certificate.course_title, "Intro");
        assert!(services.student.get_student_enrollments().await.unwrap().is_empty());
        assert_eq!(services.student.get_student_certificates().await.unwrap(), vec![certificate]);
        assert_eq!(services.token.get_balance(None).await.unwrap(), 150);
    }
}
