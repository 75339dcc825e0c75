//! Static map image generation for driving courses.
//!
//! Each course is framed (centroid and zoom level), its waypoints are
//! turned into markers, and a thumbnail and a detail image are fetched
//! from the static map API and written under the output directory.

pub mod batch;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod generator;
pub mod geometry;
pub mod markers;
pub mod models;
pub mod repository;
pub mod request;
pub mod server;

pub use batch::{BatchOrchestrator, BatchReport};
pub use config::{Config, Credentials};
pub use error::{MapImageError, Result};
pub use generator::{MapImageGenerator, PartialFailurePolicy};
