use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::models::{Course, Recommendation};

/// Listing filters; empty fields (or "all") match everything.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct CourseFilter {
    pub region: String,
    pub style: String,
    pub search: String,
}

impl CourseFilter {
    fn matches(&self, course: &Course) -> bool {
        if !is_wildcard(&self.region) && course.region != self.region {
            return false;
        }
        if !is_wildcard(&self.style) && !course.styles.iter().any(|s| *s == self.style) {
            return false;
        }
        if !self.search.is_empty() {
            let needle = self.search.to_lowercase();
            let haystacks = [
                &course.name,
                &course.tagline,
                &course.characteristics,
                &course.region,
            ];
            if !haystacks.iter().any(|h| h.to_lowercase().contains(&needle)) {
                return false;
            }
        }
        true
    }
}

fn is_wildcard(value: &str) -> bool {
    value.is_empty() || value == "all"
}

/// Read-only course set loaded once from a JSON file.
pub struct CourseRepository {
    courses: Vec<Course>,
}

impl CourseRepository {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
        let repo = Self::from_json(&content)?;
        info!("loaded {} courses from {}", repo.courses.len(), path.display());
        Ok(repo)
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let courses: Vec<Course> = serde_json::from_str(content)?;
        Ok(Self::from_courses(courses))
    }

    pub fn from_courses(courses: Vec<Course>) -> Self {
        Self { courses }
    }

    /// Courses matching `filter`, in file order.
    pub fn find_all(&self, filter: &CourseFilter) -> Vec<&Course> {
        self.courses.iter().filter(|c| filter.matches(c)).collect()
    }

    pub fn find_by_id(&self, id: u32) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == id)
    }
}

/// Recommendations loaded once from a JSON file.
///
/// Lookups go by position in the file, not by the `id` field.
#[derive(Default)]
pub struct RecommendationRepository {
    recommendations: Vec<Recommendation>,
}

impl RecommendationRepository {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
        let repo = Self::from_json(&content)?;
        info!(
            "loaded {} recommendations from {}",
            repo.recommendations.len(),
            path.display()
        );
        Ok(repo)
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let recommendations: Vec<Recommendation> = serde_json::from_str(content)?;
        Ok(Self { recommendations })
    }

    pub fn find_all(&self) -> &[Recommendation] {
        &self.recommendations
    }

    pub fn find_by_index(&self, index: usize) -> Option<&Recommendation> {
        self.recommendations.get(index)
    }
}
