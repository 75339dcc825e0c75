//! Runs the generator over every course and tallies the results.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{error, info};

use crate::config::Config;
use crate::error::Result;
use crate::generator::{CourseOutcome, MapImageGenerator};
use crate::models::{Course, ImageArtifact};

#[derive(Serialize, Debug, Clone)]
pub struct CourseFailure {
    pub course_id: u32,
    pub reason: String,
}

#[derive(Serialize, Debug, Clone, Default)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: Vec<CourseFailure>,
    /// Every file on disk written by this run, including those of failed
    /// courses kept under the partial failure policy.
    pub artifacts: Vec<ImageArtifact>,
}

impl BatchReport {
    fn record(&mut self, course: &Course, result: Result<CourseOutcome>) {
        match result {
            Ok(outcome) if outcome.is_success() => {
                self.succeeded += 1;
                self.artifacts.extend(outcome.artifacts);
            }
            Ok(outcome) => {
                let reason = outcome.failure_summary();
                error!("course {} image generation failed: {}", course.id, reason);
                self.artifacts.extend(outcome.artifacts);
                self.failed.push(CourseFailure {
                    course_id: course.id,
                    reason,
                });
            }
            Err(e) => {
                error!("course {} image generation failed: {}", course.id, e);
                self.failed.push(CourseFailure {
                    course_id: course.id,
                    reason: e.to_string(),
                });
            }
        }
    }
}

pub struct BatchOrchestrator {
    generator: MapImageGenerator,
    concurrency: usize,
}

impl BatchOrchestrator {
    pub fn new(generator: MapImageGenerator, concurrency: usize) -> Self {
        Self {
            generator,
            concurrency: concurrency.max(1),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            MapImageGenerator::from_config(config)?,
            config.concurrency,
        ))
    }

    /// Generates images for `courses` in order.
    ///
    /// Fails only when the credentials are unusable, in which case no course
    /// is attempted. Every other error is recorded against its course.
    pub async fn run(&self, courses: &[Course]) -> Result<BatchReport> {
        self.generator.credentials().validate()?;

        let mut report = BatchReport {
            total: courses.len(),
            ..Default::default()
        };

        let results = stream::iter(courses)
            .map(|course| async move { (course, self.generator.generate_course(course).await) })
            .buffered(self.concurrency);
        let mut results = std::pin::pin!(results);

        // Each course is logged and counted as soon as it finishes.
        while let Some((course, result)) = results.next().await {
            report.record(course, result);
        }

        info!(
            "{} of {} courses generated successfully",
            report.succeeded, report.total
        );
        Ok(report)
    }
}
