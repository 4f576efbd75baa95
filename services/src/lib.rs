//! ICP Scholar Service Facade
//!
//! Async, per-entity operation sets standing in for the remote course,
//! student, token and peer services. Every call goes straight to the domain
//! accessors and resolves without waiting on anything.

pub mod completion;
pub mod course;
pub mod error;
mod ledger;
pub mod peer;
pub mod student;
pub mod token;

pub use course::CourseService;
pub use error::{Result, ServiceError};
pub use peer::PeerService;
pub use student::StudentService;
pub use token::TokenService;

use scholar_core::seed::seed_courses;
use scholar_core::{now_nanos, Aggregate, Course, Principal, DEFAULT_STUDENT_NAME};
use scholar_storage::Records;
use std::sync::Arc;

/// Sender recorded on rewards the platform pays out.
pub const REWARD_ISSUER: &str = "icp-scholar";

#[derive(Debug, Clone)]
pub struct ServiceOptions {
    /// Name printed on certificates for students without a profile
    pub default_student_name: String,
    /// Offer the built-in courses alongside user-created ones
    pub include_seed_courses: bool,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            default_student_name: DEFAULT_STUDENT_NAME.to_string(),
            include_seed_courses: true,
        }
    }
}

/// State shared by the four services of one caller.
pub(crate) struct ServiceContext {
    pub(crate) records: Records,
    pub(crate) caller: Principal,
    pub(crate) seeds: Vec<Course>,
    pub(crate) options: ServiceOptions,
}

impl ServiceContext {
    pub(crate) fn caller_id(&self) -> &str {
        self.caller.as_str()
    }

    /// Stored course with `course_id`, falling back to the seed catalog.
    pub(crate) fn find_course(&self, aggregate: &Aggregate, course_id: &str) -> Option<Course> {
        aggregate
            .courses
            .iter()
            .chain(self.seeds.iter())
            .find(|c| c.id == course_id)
            .cloned()
    }
}

/// The full service surface for one caller.
#[derive(Clone)]
pub struct ScholarServices {
    pub course: CourseService,
    pub student: StudentService,
    pub token: TokenService,
    pub peer: PeerService,
    records: Records,
}

impl ScholarServices {
    pub fn new(records: Records, caller: Principal, options: ServiceOptions) -> Self {
        let seeds = if options.include_seed_courses {
            seed_courses(now_nanos())
        } else {
            Vec::new()
        };
        let context = Arc::new(ServiceContext {
            records: records.clone(),
            caller,
            seeds,
            options,
        });

        Self {
            course: CourseService::new(Arc::clone(&context)),
            student: StudentService::new(Arc::clone(&context)),
            token: TokenService::new(Arc::clone(&context)),
            peer: PeerService::new(context),
            records,
        }
    }

    pub fn caller(&self) -> &Principal {
        self.course.caller()
    }

    /// Accessors the services read and write through.
    pub fn records(&self) -> &Records {
        &self.records
    }
}
