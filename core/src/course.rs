//! Courses, sections and educator profiles

use serde::{Deserialize, Serialize};

/// A unit of course content. `order` defines the display sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub title: String,
    pub content: String,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: String,
    pub educator_id: String,
    #[serde(default)]
    pub sections: Vec<Section>,
    pub created_at: u64,
    pub updated_at: u64,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub token_reward: u64,
}

impl Course {
    /// Whether `progress` contains every section currently in the course.
    ///
    /// A course without sections is never considered covered.
    pub fn is_covered_by(&self, progress: &[String]) -> bool {
        !self.sections.is_empty()
            && self
                .sections
                .iter()
                .all(|section| progress.iter().any(|done| done == &section.id))
    }

    /// Order value for the next appended section.
    pub fn next_section_order(&self) -> u32 {
        u32::try_from(self.sections.len()).unwrap_or(u32::MAX)
    }
}

/// Partial course fields merged by `Records::update_course`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub sections: Option<Vec<Section>>,
    pub published: Option<bool>,
    pub token_reward: Option<u64>,
    pub updated_at: Option<u64>,
}

impl CourseUpdate {
    pub fn publish(now: u64) -> Self {
        Self {
            published: Some(true),
            updated_at: Some(now),
            ..Self::default()
        }
    }

    /// Merge the populated fields into `course`.
    pub fn apply(&self, course: &mut Course) {
        if let Some(title) = &self.title {
            course.title = title.clone();
        }
        if let Some(description) = &self.description {
            course.description = description.clone();
        }
        if let Some(sections) = &self.sections {
            course.sections = sections.clone();
        }
        if let Some(published) = self.published {
            course.published = published;
        }
        if let Some(token_reward) = self.token_reward {
            course.token_reward = token_reward;
        }
        if let Some(updated_at) = self.updated_at {
            course.updated_at = updated_at;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducatorProfile {
    pub principal: String,
    pub name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub expertise: Vec<String>,
    pub created_at: u64,
    pub updated_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course_with_sections(ids: &[&str]) -> Course {
        Course {
            id: "c1".to_string(),
            title: "Course".to_string(),
            description: String::new(),
            educator_id: "edu".to_string(),
            sections: ids
                .iter()
                .enumerate()
                .map(|(i, id)| Section {
                    id: id.to_string(),
                    title: format!("Section {}", i),
                    content: String::new(),
                    order: i as u32,
                })
                .collect(),
            created_at: 1,
            updated_at: 1,
            published: false,
            token_reward: 10,
        }
    }

    #[test]
    fn test_coverage_by_id() {
        let course = course_with_sections(&["s1", "s2"]);
        assert!(!course.is_covered_by(&["s1".to_string()]));
        assert!(course.is_covered_by(&["s2".to_string(), "s1".to_string()]));

        // A stale id left behind by a removed section does not count.
        assert!(!course.is_covered_by(&["s1".to_string(), "gone".to_string()]));
    }

    #[test]
    fn test_empty_course_is_never_covered() {
        let course = course_with_sections(&[]);
        assert!(!course.is_covered_by(&[]));
    }

    #[test]
    fn test_update_merges_only_given_fields() {
        let mut course = course_with_sections(&["s1"]);
        CourseUpdate {
            title: Some("Renamed".to_string()),
            ..CourseUpdate::default()
        }
        .apply(&mut course);

        assert_eq!(course.title, "Renamed");
        assert_eq!(course.sections.len(), 1);
        assert_eq!(course.token_reward, 10);
        assert!(!course.published);

        CourseUpdate::publish(99).apply(&mut course);
        assert!(course.published);
        assert_eq!(course.updated_at, 99);
    }
}
