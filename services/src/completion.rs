//! Course completion
//!
//! Marking an enrollment completed, issuing its certificate and paying the
//! course reward happen against one aggregate, so they are persisted by a
//! single write or not at all. Completion is idempotent per student and
//! course: once a certificate exists, later completions return it and pay
//! nothing.

use crate::REWARD_ISSUER;
use scholar_core::{generate_id, Aggregate, Certificate, Collection, TokenTransaction};
use tracing::{debug, info};

/// Collections a completion may touch.
pub const COMPLETION_COLLECTIONS: [Collection; 4] = [
    Collection::Enrollments,
    Collection::Certificates,
    Collection::TokenBalances,
    Collection::Transactions,
];

#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    pub student_id: &'a str,
    pub course_id: &'a str,
    pub course_title: &'a str,
    pub token_reward: u64,
    pub default_student_name: &'a str,
    pub default_balance: u64,
    pub now: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub certificate: Certificate,
    /// Reward paid by this completion, if any.
    pub reward: Option<TokenTransaction>,
    /// Whether `aggregate` was modified.
    pub changed: bool,
}

/// Complete `request.student_id`'s enrollment in `request.course_id`.
///
/// A missing enrollment is left missing; the certificate and reward are
/// still issued.
pub fn complete_enrollment(aggregate: &mut Aggregate, request: &CompletionRequest<'_>) -> Completion {
    let student_name = aggregate
        .student_profiles
        .get(request.student_id)
        .map(|profile| profile.name.clone())
        .unwrap_or_else(|| request.default_student_name.to_string());
    let existing = aggregate
        .certificate_for(request.student_id, request.course_id)
        .cloned();

    let mut changed = false;
    match aggregate.enrollment_mut(request.student_id, request.course_id) {
        Some(enrollment) if !enrollment.completed => {
            enrollment.mark_completed(request.now);
            changed = true;
        }
        Some(_) => {}
        None => debug!(
            student_id = request.student_id,
            course_id = request.course_id,
            "completing without an enrollment"
        ),
    }

    if let Some(certificate) = existing {
        return Completion {
            certificate,
            reward: None,
            changed,
        };
    }

    let certificate = Certificate {
        certificate_id: generate_id(),
        student_id: request.student_id.to_string(),
        student_name,
        course_id: request.course_id.to_string(),
        course_title: request.course_title.to_string(),
        issued_at: request.now,
    };
    aggregate.certificates.push(certificate.clone());

    let reward = (request.token_reward > 0).then(|| {
        let balance = aggregate.balance_or(request.student_id, request.default_balance);
        aggregate.token_balances.insert(
            request.student_id.to_string(),
            balance.saturating_add(request.token_reward),
        );
        let transaction = TokenTransaction::course_reward(
            generate_id(),
            REWARD_ISSUER,
            request.student_id,
            request.token_reward,
            request.course_id,
            request.now,
        );
        aggregate.push_transaction(request.student_id, transaction.clone());
        transaction
    });

    info!(
        student_id = request.student_id,
        course_id = request.course_id,
        reward = request.token_reward,
        "course completed"
    );

    Completion {
        certificate,
        reward,
        changed: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scholar_core::{Enrollment, StudentProfile, TransactionType};

    fn request(token_reward: u64) -> CompletionRequest<'static> {
        CompletionRequest {
            student_id: "alice",
            course_id: "c1",
            course_title: "Rust",
            token_reward,
            default_student_name: "Student",
            default_balance: 100,
            now: 42,
        }
    }

    fn enrolled() -> Aggregate {
        let mut aggregate = Aggregate::default();
        aggregate.enrollments.push(Enrollment::new("alice", "c1", 1));
        aggregate
    }

    #[test]
    fn test_first_completion_issues_and_rewards() {
        let mut aggregate = enrolled();
        let completion = complete_enrollment(&mut aggregate, &request(50));

        assert!(completion.changed);
        assert_eq!(completion.certificate.course_title, "Rust");
        assert_eq!(completion.certificate.student_name, "Student");
        assert!(aggregate.enrollments[0].completed);
        assert_eq!(aggregate.enrollments[0].completed_at, Some(42));
        assert_eq!(aggregate.token_balances.get("alice"), Some(&150));

        let reward = completion.reward.unwrap();
        assert_eq!(reward.transaction_type, TransactionType::CourseReward);
        assert_eq!(aggregate.transactions["alice"].len(), 1);
    }

    #[test]
    fn test_second_completion_is_idempotent() {
        let mut aggregate = enrolled();
        let first = complete_enrollment(&mut aggregate, &request(50));
        let second = complete_enrollment(&mut aggregate, &request(50));

        assert!(!second.changed);
        assert!(second.reward.is_none());
        assert_eq!(second.certificate, first.certificate);
        assert_eq!(aggregate.certificates.len(), 1);
        assert_eq!(aggregate.token_balances.get("alice"), Some(&150));
    }

    #[test]
    fn test_profile_name_on_certificate() {
        let mut aggregate = enrolled();
        aggregate.student_profiles.insert(
            "alice".to_string(),
            StudentProfile {
                principal: "alice".to_string(),
                name: "Alice Liddell".to_string(),
                email: String::new(),
                bio: String::new(),
                created_at: 1,
                updated_at: 1,
            },
        );

        let completion = complete_enrollment(&mut aggregate, &request(0));
        assert_eq!(completion.certificate.student_name, "Alice Liddell");
        assert!(completion.reward.is_none());
        assert!(aggregate.token_balances.is_empty());
    }

    #[test]
    fn test_missing_enrollment_still_certifies() {
        let mut aggregate = Aggregate::default();
        let completion = complete_enrollment(&mut aggregate, &request(50));

        assert!(completion.changed);
        assert!(aggregate.enrollments.is_empty());
        assert_eq!(aggregate.certificates, vec![completion.certificate]);
        assert_eq!(aggregate.token_balances.get("alice"), Some(&150));

        let again = complete_enrollment(&mut aggregate, &request(50));
        assert!(!again.changed);
        assert_eq!(aggregate.certificates.len(), 1);
    }
}
