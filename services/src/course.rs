//! Course service

use crate::error::{Result, ServiceError};
use crate::ServiceContext;
use scholar_core::{
    generate_id, now_nanos, Collection, Course, CourseUpdate, EducatorProfile, Principal, Section,
};
use scholar_storage::Change;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct CourseService {
    context: Arc<ServiceContext>,
}

impl CourseService {
    pub(crate) fn new(context: Arc<ServiceContext>) -> Self {
        Self { context }
    }

    pub fn caller(&self) -> &Principal {
        &self.context.caller
    }

    /// New unpublished course owned by the caller.
    pub async fn create_course(&self, title: &str, description: &str, token_reward: u64) -> Result<Course> {
        let now = now_nanos();
        let course = Course {
            id: generate_id(),
            title: title.to_string(),
            description: description.to_string(),
            educator_id: self.context.caller_id().to_string(),
            sections: Vec::new(),
            created_at: now,
            updated_at: now,
            published: false,
            token_reward,
        };
        self.context.records.add_course(course.clone())?;
        info!(course_id = %course.id, title, "course created");
        Ok(course)
    }

    /// Stored course, or the built-in one with that id.
    pub async fn get_course(&self, course_id: &str) -> Result<Option<Course>> {
        let aggregate = self.context.records.store().read();
        Ok(self.context.find_course(&aggregate, course_id))
    }

    /// Built-in courses followed by user-published ones, each id once.
    pub async fn get_published_courses(&self) -> Result<Vec<Course>> {
        let mut seen = HashSet::new();
        let courses = self
            .context
            .seeds
            .iter()
            .cloned()
            .chain(self.context.records.get_published_courses())
            .filter(|course| seen.insert(course.id.clone()))
            .collect();
        Ok(courses)
    }

    pub async fn get_educator_courses(&self) -> Result<Vec<Course>> {
        Ok(self
            .context
            .records
            .get_educator_courses(self.context.caller_id()))
    }

    /// Append a section; its `order` is the course's current section count.
    pub async fn add_course_section(&self, course_id: &str, title: &str, content: &str) -> Result<Course> {
        let now = now_nanos();
        self.context
            .records
            .store()
            .transact(&[Collection::Courses], |aggregate| {
                let course = aggregate
                    .course_mut(course_id)
                    .ok_or_else(|| ServiceError::CourseNotFound(course_id.to_string()))?;
                let section = Section {
                    id: generate_id(),
                    title: title.to_string(),
                    content: content.to_string(),
                    order: course.next_section_order(),
                };
                course.sections.push(section);
                course.updated_at = now;
                Ok(Change::Write(course.clone()))
            })
    }

    pub async fn publish_course(&self, course_id: &str) -> Result<Course> {
        let update = CourseUpdate::publish(now_nanos());
        self.context
            .records
            .store()
            .transact(&[Collection::Courses], |aggregate| {
                let course = aggregate
                    .course_mut(course_id)
                    .ok_or_else(|| ServiceError::CourseNotFound(course_id.to_string()))?;
                update.apply(course);
                Ok(Change::Write(course.clone()))
            })
    }

    pub async fn create_educator_profile(
        &self,
        name: &str,
        bio: &str,
        expertise: Vec<String>,
    ) -> Result<EducatorProfile> {
        let now = now_nanos();
        let profile = EducatorProfile {
            principal: self.context.caller_id().to_string(),
            name: name.to_string(),
            bio: bio.to_string(),
            expertise,
            created_at: now,
            updated_at: now,
        };
        self.context
            .records
            .set_educator_profile(self.context.caller_id(), profile.clone())?;
        Ok(profile)
    }

    /// Profile of `principal`, or of the caller when `None`.
    pub async fn get_educator_profile(&self, principal: Option<&str>) -> Result<Option<EducatorProfile>> {
        let principal = principal.unwrap_or(self.context.caller_id());
        Ok(self.context.records.get_educator_profile(principal))
    }
}
