use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use course_mapgen::config::{Config, KEY_ID_ENV, KEY_SECRET_ENV};
use course_mapgen::repository::{CourseFilter, CourseRepository, RecommendationRepository};
use course_mapgen::server::{self, AppState};
use course_mapgen::BatchOrchestrator;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    // Variables already in the environment take precedence over `.env`.
    if let Err(e) = dotenvy::dotenv() {
        info!("no .env loaded: {}", e);
    }

    let config = Config::load()?;
    let thread_count = config.thread_count.unwrap_or_else(num_cpus::get);

    info!("starting with {} threads", thread_count);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(thread_count)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(config))
}

async fn async_main(config: Config) -> anyhow::Result<()> {
    let repository = CourseRepository::open(&config.courses_path)?;
    let recommendations = match RecommendationRepository::open(&config.recommendations_path) {
        Ok(r) => r,
        Err(e) => {
            warn!("serving no recommendations: {}", e);
            RecommendationRepository::default()
        }
    };

    if config.credentials.is_valid() {
        info!("static map credentials found, generating course images");
        generate_course_images(&config, &repository).await;
    } else {
        warn!(
            "static map credentials missing, skipping image generation; set {} and {}",
            KEY_ID_ENV, KEY_SECRET_ENV
        );
    }

    let state = Arc::new(AppState {
        repository,
        recommendations,
        image_dir: config.output_dir.clone(),
    });

    let app = server::router(state, server::cors_layer(&config.cors_origins));
    info!("listening on {}", config.listen_addr);
    let listener = TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn generate_course_images(config: &Config, repository: &CourseRepository) {
    let courses: Vec<_> = repository
        .find_all(&CourseFilter::default())
        .into_iter()
        .cloned()
        .collect();

    let orchestrator = match BatchOrchestrator::from_config(config) {
        Ok(o) => o,
        Err(e) => {
            error!("image generation setup failed: {}", e);
            return;
        }
    };

    match orchestrator.run(&courses).await {
        Ok(report) => info!(
            "image generation finished: {} of {} courses, {} files written",
            report.succeeded,
            report.total,
            report.artifacts.len()
        ),
        Err(e) => error!("image generation skipped: {}", e),
    }
}
