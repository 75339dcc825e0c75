use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, Method, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::models::{Course, ImageVariant, Recommendation};
use crate::repository::{CourseFilter, CourseRepository, RecommendationRepository};

/// URL prefix the generated images are served under.
pub const IMAGE_URL_PREFIX: &str = "/images/courses";

pub struct AppState {
    pub repository: CourseRepository,
    pub recommendations: RecommendationRepository,
    pub image_dir: PathBuf,
}

/// A course as returned by the API, with links to its generated images.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDto<'a> {
    #[serde(flatten)]
    pub course: &'a Course,
    pub thumbnail_image: String,
    pub detail_image: String,
}

impl<'a> CourseDto<'a> {
    pub fn new(course: &'a Course) -> Self {
        Self {
            course,
            thumbnail_image: image_url(course.id, ImageVariant::Thumbnail),
            detail_image: image_url(course.id, ImageVariant::Detail),
        }
    }
}

#[derive(Serialize)]
pub struct RecommendationDto<'a> {
    pub id: u32,
    pub title: &'a str,
    pub description: &'a str,
    pub courses: Vec<CourseDto<'a>>,
}

impl<'a> RecommendationDto<'a> {
    /// Resolves course ids; ids with no matching course are skipped.
    fn resolve(rec: &'a Recommendation, courses: &'a CourseRepository) -> Self {
        Self {
            id: rec.id,
            title: &rec.title,
            description: &rec.description,
            courses: rec
                .course_ids
                .iter()
                .filter_map(|id| courses.find_by_id(*id))
                .map(CourseDto::new)
                .collect(),
        }
    }
}

pub fn image_url(course_id: u32, variant: ImageVariant) -> String {
    format!(
        "{}/{}/course-{}.png",
        IMAGE_URL_PREFIX,
        variant.dir_name(),
        course_id
    )
}

/// CORS for the listed origins; unparsable entries are skipped.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("ignoring CORS origin {:?}: {}", o, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
}

pub fn router(state: Arc<AppState>, cors: CorsLayer) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/courses", get(list_courses))
        .route("/api/courses/{id}", get(get_course))
        .route("/api/recommendations", get(list_recommendations))
        .route("/api/recommendations/{id}", get(get_recommendation))
        .route("/images/courses/{variant}/{file}", get(get_image))
        .layer(middleware::from_fn(log_request_response))
        .layer(cors)
        .with_state(state)
}

async fn log_request_response(req: Request<axum::body::Body>, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let method = req.method().to_string();
    info!("incoming request: {} {}", method, path);
    let response = next.run(req).await;
    info!("request result: {} for {} {}", response.status(), method, path);
    response
}

fn not_found(message: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_courses(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<CourseFilter>,
) -> Response {
    let courses: Vec<CourseDto> = state
        .repository
        .find_all(&filter)
        .into_iter()
        .map(CourseDto::new)
        .collect();
    Json(courses).into_response()
}

async fn get_course(State(state): State<Arc<AppState>>, Path(id): Path<u32>) -> Response {
    match state.repository.find_by_id(id) {
        Some(course) => Json(CourseDto::new(course)).into_response(),
        None => not_found("not found"),
    }
}

async fn list_recommendations(State(state): State<Arc<AppState>>) -> Response {
    let recs: Vec<RecommendationDto> = state
        .recommendations
        .find_all()
        .iter()
        .map(|rec| RecommendationDto::resolve(rec, &state.repository))
        .collect();
    Json(recs).into_response()
}

/// `id` is the recommendation's position in the file.
async fn get_recommendation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<usize>,
) -> Response {
    match state.recommendations.find_by_index(id) {
        Some(rec) => Json(RecommendationDto::resolve(rec, &state.repository)).into_response(),
        None => not_found("recommendation not found"),
    }
}

/// Accepts only `course-<id>.png`, so no path outside the image dir is reachable.
fn is_artifact_name(file: &str) -> bool {
    file.strip_prefix("course-")
        .and_then(|rest| rest.strip_suffix(".png"))
        .map(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

async fn get_image(
    State(state): State<Arc<AppState>>,
    Path((variant, file)): Path<(String, String)>,
) -> Response {
    let Some(variant) = ImageVariant::from_dir_name(&variant) else {
        return (StatusCode::NOT_FOUND, "unknown image variant").into_response();
    };
    if !is_artifact_name(&file) {
        return (StatusCode::NOT_FOUND, "image not found").into_response();
    }

    let path = state.image_dir.join(variant.dir_name()).join(&file);
    match tokio::fs::read(&path).await {
        Ok(bytes) => ([("content-type", "image/png")], bytes).into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            (StatusCode::NOT_FOUND, "image not found").into_response()
        }
        Err(e) => {
            error!("failed to read {}: {}", path.display(), e);
            (StatusCode::INTERNAL_SERVER_ERROR, "image read error").into_response()
        }
    }
}
