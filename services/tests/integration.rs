//! End-to-end runs of the service facade over the record store.

use scholar_core::{Collection, Course, NoteType, Principal, Section, TransactionType};
use scholar_services::{ScholarServices, ServiceError, ServiceOptions};
use scholar_storage::{
    ChangeBus, ChangeNotifier, FileStore, KeyValueStore, MemoryStore, RecordStore, Records,
    SledStore, StoreOptions,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn section(id: &str, order: u32) -> Section {
    Section {
        id: id.to_string(),
        title: format!("Section {id}"),
        content: String::new(),
        order,
    }
}

fn two_section_course(id: &str, reward: u64) -> Course {
    Course {
        id: id.to_string(),
        title: "Ownership in Practice".to_string(),
        description: "Borrowing without tears".to_string(),
        educator_id: "educator".to_string(),
        sections: vec![section("s1", 0), section("s2", 1)],
        created_at: 1,
        updated_at: 1,
        published: true,
        token_reward: reward,
    }
}

fn services_over(backend: Arc<dyn KeyValueStore>, caller: &str) -> ScholarServices {
    let store = RecordStore::new(backend, ChangeNotifier::local(), StoreOptions::default());
    let records = Records::new(Arc::new(store));
    ScholarServices::new(records, Principal::from(caller), ServiceOptions::default())
}

/// Walk a student through a course and check the certificate and the payout.
async fn run_completion(services: &ScholarServices) {
    let course_id = "course-x";
    services
        .records()
        .add_course(two_section_course(course_id, 50))
        .unwrap();

    services.student.enroll_in_course(course_id).await.unwrap();
    services.student.mark_section_complete(course_id, "s1").await.unwrap();

    let before = services.token.get_balance(None).await.unwrap();
    assert_eq!(before, 100);

    let enrollment = services
        .student
        .mark_section_complete(course_id, "s2")
        .await
        .unwrap();
    assert!(enrollment.completed);
    assert!(enrollment.completed_at.is_some());

    let certificate = services
        .student
        .complete_course(course_id, "Ownership in Practice")
        .await
        .unwrap();
    assert_eq!(certificate.course_id, course_id);
    assert_eq!(certificate.student_name, "Student");

    assert_eq!(services.token.get_balance(None).await.unwrap(), before + 50);
    let history = services.token.get_transaction_history().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].amount, 50);
    assert_eq!(history[0].transaction_type, TransactionType::CourseReward);
    assert!(history[0].memo.contains(course_id));

    let certificates = services.student.get_student_certificates().await.unwrap();
    assert_eq!(certificates.len(), 1);
}

/// Scenario 5: finishing the last section completes the course once.
#[tokio::test]
async fn test_scenario_course_completion_in_memory() {
    let services = services_over(Arc::new(MemoryStore::new()), "student-1");
    run_completion(&services).await;
}

#[tokio::test]
async fn test_scenario_course_completion_on_files() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FileStore::open(dir.path()).unwrap();
    let services = services_over(Arc::new(backend), "student-1");
    run_completion(&services).await;

    let reopened = services_over(Arc::new(FileStore::open(dir.path()).unwrap()), "student-1");
    assert_eq!(reopened.token.get_balance(None).await.unwrap(), 150);
}

#[tokio::test]
async fn test_scenario_course_completion_on_sled() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records");
    {
        let backend = SledStore::open(&path).unwrap();
        let services = services_over(Arc::new(backend), "student-1");
        run_completion(&services).await;
    }

    let reopened = services_over(Arc::new(SledStore::open(&path).unwrap()), "student-1");
    let certificates = reopened.student.get_student_certificates().await.unwrap();
    assert_eq!(certificates.len(), 1);
}

/// Scenario 6: tips accumulate on the note and name its author.
#[tokio::test]
async fn test_scenario_tipping() {
    let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let author = services_over(Arc::clone(&backend), "author");
    let reader = services_over(backend, "reader");

    let note = author
        .peer
        .create_peer_note("course1", "Ada", "Hash pointers link the chain", NoteType::StudyNote)
        .await
        .unwrap();

    let tip = reader.peer.tip_peer_note(&note.id, 10, "thanks").await.unwrap();
    assert_eq!(tip.recipient, "author");
    assert_eq!(tip.tipper, "reader");

    let stored = reader.peer.get_course_notes("course1").await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].tips_received, 10);

    let ghost = reader.peer.tip_peer_note("missing", 10, "").await.unwrap();
    assert_eq!(ghost.recipient, "unknown");
}

/// A stored course sharing a seed id is listed once.
#[tokio::test]
async fn test_published_listing_deduplicates_seed_ids() {
    let services = services_over(Arc::new(MemoryStore::new()), "educator");
    let mut shadow = two_section_course("course1", 10);
    shadow.title = "Shadow".to_string();
    services.records().add_course(shadow).unwrap();

    let listed = services.course.get_published_courses().await.unwrap();
    let course1: Vec<_> = listed.iter().filter(|c| c.id == "course1").collect();
    assert_eq!(course1.len(), 1);
    assert_eq!(course1[0].title, "Introduction to Blockchain");
    assert!(listed.iter().any(|c| c.id == "course2"));
}

/// Completing a course nobody enrolled in still certifies and pays once.
#[tokio::test]
async fn test_completion_without_enrollment() {
    let services = services_over(Arc::new(MemoryStore::new()), "student-1");
    let first = services.student.complete_course("course1", "Intro").await.unwrap();
    let second = services.student.complete_course("course1", "Intro").await.unwrap();

    assert_eq!(first, second);
    assert!(services.student.get_student_enrollments().await.unwrap().is_empty());
    assert_eq!(services.student.get_student_certificates().await.unwrap().len(), 1);
    assert_eq!(services.token.get_balance(None).await.unwrap(), 150);
}

#[tokio::test]
async fn test_transfer_between_callers() {
    let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let alice = services_over(Arc::clone(&backend), "alice");
    let bob = services_over(backend, "bob");

    alice.token.transfer_tokens("bob", 40, "notes").await.unwrap();
    let result = bob.token.transfer_tokens("alice", 500, "all of it").await;

    assert!(matches!(result, Err(ServiceError::InsufficientBalance { available: 140, .. })));
    assert_eq!(alice.token.get_balance(None).await.unwrap(), 60);
    assert_eq!(bob.token.get_balance(None).await.unwrap(), 140);
}

/// Two contexts over one backend: a write in one reaches the other's
/// subscribers and the other reads the new state.
#[tokio::test]
async fn test_cross_context_change_notification() {
    let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let bus = ChangeBus::new(16);

    let writer_store = RecordStore::new(
        Arc::clone(&backend),
        ChangeNotifier::new(Some(bus.clone())),
        StoreOptions::default(),
    );
    let reader_store = RecordStore::new(
        backend,
        ChangeNotifier::new(Some(bus)),
        StoreOptions::default(),
    );

    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    let _subscription = reader_store.notifier().subscribe(move |event| {
        if event.touches(Collection::Courses) {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });
    let listener = reader_store.notifier().spawn_listener().unwrap();

    let writer = Records::new(Arc::new(writer_store));
    writer.add_course(two_section_course("shared", 5)).unwrap();

    for _ in 0..50 {
        if seen.load(Ordering::SeqCst) > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(seen.load(Ordering::SeqCst), 1);

    let reader = Records::new(Arc::new(reader_store));
    assert!(reader.get_course("shared").is_some());
    listener.abort();
}
