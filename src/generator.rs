//! Per-course image generation: thumbnail first, then detail.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{Config, Credentials};
use crate::error::{MapImageError, Result};
use crate::fetcher::{artifact_path, ensure_directories, ImageFetcher};
use crate::markers::assign_roles;
use crate::models::{Course, ImageArtifact, ImageVariant, Waypoint};
use crate::request::MapRequestBuilder;

/// What to do with a variant that succeeded when its sibling failed.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PartialFailurePolicy {
    /// Leave the written file in place; the course still counts as failed.
    #[default]
    Keep,
    /// Delete the written file so a course has both images or neither.
    Remove,
}

#[derive(Debug)]
pub struct VariantFailure {
    pub variant: ImageVariant,
    pub error: MapImageError,
}

/// Result of attempting both variants for one course.
#[derive(Debug)]
pub struct CourseOutcome {
    pub course_id: u32,
    /// Files left on disk by this run.
    pub artifacts: Vec<ImageArtifact>,
    pub failures: Vec<VariantFailure>,
}

impl CourseOutcome {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failure_summary(&self) -> String {
        self.failures
            .iter()
            .map(|f| format!("{}: {}", f.variant.dir_name(), f.error))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

pub struct MapImageGenerator {
    builder: MapRequestBuilder,
    fetcher: ImageFetcher,
    output_dir: PathBuf,
    policy: PartialFailurePolicy,
}

impl MapImageGenerator {
    pub fn new(
        builder: MapRequestBuilder,
        fetcher: ImageFetcher,
        output_dir: impl Into<PathBuf>,
        policy: PartialFailurePolicy,
    ) -> Self {
        Self {
            builder,
            fetcher,
            output_dir: output_dir.into(),
            policy,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = ImageFetcher::new(
            config.credentials.clone(),
            config.request_timeout_secs.map(Duration::from_secs),
        )?;
        Ok(Self::new(
            MapRequestBuilder::new(&config.endpoint)?,
            fetcher,
            config.output_dir.clone(),
            config.partial_failure,
        ))
    }

    pub fn credentials(&self) -> &Credentials {
        self.fetcher.credentials()
    }

    async fn generate_variant(
        &self,
        course_id: u32,
        waypoints: &[Waypoint],
        variant: ImageVariant,
    ) -> Result<ImageArtifact> {
        let url = self.builder.build_for_variant(waypoints, variant);
        let path = artifact_path(&self.output_dir, course_id, variant);
        debug!("course {} {}: GET {}", course_id, variant.dir_name(), url);
        self.fetcher.fetch_to_file(url, &path).await?;
        Ok(ImageArtifact {
            course_id,
            variant,
            path,
        })
    }

    /// Attempts every variant for `course`.
    ///
    /// Returns `Err` only when the course cannot be attempted at all;
    /// per-variant failures are reported in the outcome.
    pub async fn generate_course(&self, course: &Course) -> Result<CourseOutcome> {
        self.credentials().validate()?;

        if course.nav.is_empty() {
            return Err(MapImageError::Validation {
                course_id: course.id,
                reason: "course has no waypoints".to_string(),
            });
        }

        ensure_directories(&self.output_dir).await?;

        let waypoints = assign_roles(&course.nav);
        let mut outcome = CourseOutcome {
            course_id: course.id,
            artifacts: Vec::new(),
            failures: Vec::new(),
        };

        for variant in ImageVariant::ALL {
            match self.generate_variant(course.id, &waypoints, variant).await {
                Ok(artifact) => outcome.artifacts.push(artifact),
                Err(error) => outcome.failures.push(VariantFailure { variant, error }),
            }
        }

        if outcome.is_success() {
            info!("course {} ({}) images generated", course.id, course.name);
        } else if !outcome.artifacts.is_empty() {
            self.handle_partial(&mut outcome).await;
        }

        Ok(outcome)
    }

    async fn handle_partial(&self, outcome: &mut CourseOutcome) {
        match self.policy {
            PartialFailurePolicy::Keep => {
                for artifact in &outcome.artifacts {
                    warn!(
                        "course {}: keeping {} although the course failed",
                        outcome.course_id,
                        artifact.path.display()
                    );
                }
            }
            PartialFailurePolicy::Remove => {
                let mut kept = Vec::new();
                for artifact in outcome.artifacts.drain(..) {
                    match tokio::fs::remove_file(&artifact.path).await {
                        Ok(()) => debug!(
                            "course {}: removed {}",
                            artifact.course_id,
                            artifact.path.display()
                        ),
                        Err(e) => {
                            warn!(
                                "course {}: could not remove {}: {}",
                                artifact.course_id,
                                artifact.path.display(),
                                e
                            );
                            kept.push(artifact);
                        }
                    }
                }
                outcome.artifacts = kept;
            }
        }
    }
}
