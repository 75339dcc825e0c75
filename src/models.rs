use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// One navigation entry as stored in the course file.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct NavPoint {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    pub geolocation: GeoPoint,
}

impl NavPoint {
    pub fn new(name: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            kind: String::new(),
            name: name.to_string(),
            geolocation: GeoPoint::new(latitude, longitude),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Ratings {
    pub tech: u8,
    pub speed: u8,
    pub scenery: u8,
    pub road: u8,
    pub access: u8,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Course {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub characteristics: String,
    #[serde(rename = "naverMapUrl", default)]
    pub naver_map_url: String,
    #[serde(default)]
    pub nav: Vec<NavPoint>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub styles: Vec<String>,
    #[serde(default)]
    pub ratings: Ratings,
}

/// A curated group of courses, referenced by id.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub course_ids: Vec<u32>,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WaypointRole {
    Start,
    Via,
    End,
}

/// A navigation point with its positional role already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub role: WaypointRole,
    pub label: String,
    pub position: GeoPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerColor {
    Red,
    Blue,
    Green,
}

impl MarkerColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerColor::Red => "red",
            MarkerColor::Blue => "blue",
            MarkerColor::Green => "green",
        }
    }
}

impl From<WaypointRole> for MarkerColor {
    fn from(role: WaypointRole) -> Self {
        match role {
            WaypointRole::Start => MarkerColor::Red,
            WaypointRole::Via => MarkerColor::Blue,
            WaypointRole::End => MarkerColor::Green,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerSpec {
    pub color: MarkerColor,
    pub position: GeoPoint,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapRequestSpec {
    pub width: u32,
    pub height: u32,
    pub center: GeoPoint,
    pub zoom_level: u8,
    pub markers: Vec<MarkerSpec>,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ImageVariant {
    Thumbnail,
    Detail,
}

impl ImageVariant {
    /// Generation order for a single course.
    pub const ALL: [ImageVariant; 2] = [ImageVariant::Thumbnail, ImageVariant::Detail];

    /// Requested (width, height) in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            ImageVariant::Thumbnail => (500, 500),
            ImageVariant::Detail => (800, 600),
        }
    }

    pub fn dir_name(&self) -> &'static str {
        match self {
            ImageVariant::Thumbnail => "thumbnails",
            ImageVariant::Detail => "detail",
        }
    }

    pub fn from_dir_name(name: &str) -> Option<Self> {
        ImageVariant::ALL.into_iter().find(|v| v.dir_name() == name)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ImageArtifact {
    pub course_id: u32,
    pub variant: ImageVariant,
    pub path: PathBuf,
}
