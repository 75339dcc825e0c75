//! Static map request URLs.

use url::Url;

use crate::error::Result;
use crate::geometry::{compute_center, compute_zoom_level};
use crate::markers::{encode_markers, marker_specs};
use crate::models::{GeoPoint, ImageVariant, MapRequestSpec, Waypoint};

pub const DEFAULT_ENDPOINT: &str = "https://maps.apigw.ntruss.com/map-static/v2/raster";

#[derive(Debug, Clone)]
pub struct MapRequestBuilder {
    endpoint: Url,
}

impl MapRequestBuilder {
    /// Fails when `endpoint` is not an absolute URL.
    pub fn new(endpoint: &str) -> Result<Self> {
        Ok(Self {
            endpoint: Url::parse(endpoint)?,
        })
    }

    /// Frames the waypoints for the given output size.
    pub fn spec(&self, waypoints: &[Waypoint], width: u32, height: u32) -> MapRequestSpec {
        let points: Vec<GeoPoint> = waypoints.iter().map(|wp| wp.position).collect();
        MapRequestSpec {
            width,
            height,
            center: compute_center(&points),
            zoom_level: compute_zoom_level(&points),
            markers: marker_specs(waypoints),
        }
    }

    pub fn spec_for_variant(&self, waypoints: &[Waypoint], variant: ImageVariant) -> MapRequestSpec {
        let (w, h) = variant.dimensions();
        self.spec(waypoints, w, h)
    }

    /// Builds the request URL.
    ///
    /// The base parameters are form-encoded. The marker block is appended
    /// as-is so `|` and `:` survive; the URL only escapes the space.
    pub fn build(&self, spec: &MapRequestSpec) -> Url {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("w", &spec.width.to_string())
            .append_pair("h", &spec.height.to_string())
            .append_pair(
                "center",
                &format!("{:.6},{:.6}", spec.center.longitude, spec.center.latitude),
            )
            .append_pair("level", &spec.zoom_level.to_string())
            .append_pair("scale", "2")
            .append_pair("format", "png")
            .finish();

        let markers = encode_markers(&spec.markers);
        let raw_query = if markers.is_empty() {
            query
        } else {
            format!("{}&markers={}", query, markers)
        };

        let mut url = self.endpoint.clone();
        url.set_query(Some(&raw_query));
        url
    }

    pub fn build_for_variant(&self, waypoints: &[Waypoint], variant: ImageVariant) -> Url {
        self.build(&self.spec_for_variant(waypoints, variant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::assign_roles;
    use crate::models::NavPoint;

    fn query_values(url: &Url, key: &str) -> Vec<String> {
        url.query_pairs()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
            .collect()
    }

    #[test]
    fn single_waypoint_thumbnail() {
        let wps = assign_roles(&[NavPoint::new("start", 37.50, 127.00)]);
        let builder = MapRequestBuilder::new(DEFAULT_ENDPOINT).unwrap();
        let url = builder.build(&builder.spec(&wps, 500, 500));

        assert!(url.as_str().starts_with(DEFAULT_ENDPOINT));
        assert!(url.as_str().contains("level=14"));
        assert!(url.as_str().contains("w=500&h=500"));
        assert_eq!(query_values(&url, "center"), vec!["127.000000,37.500000"]);
        assert_eq!(query_values(&url, "scale"), vec!["2"]);
        assert_eq!(query_values(&url, "format"), vec!["png"]);
    }

    #[test]
    fn markers_are_not_form_encoded() {
        let wps = assign_roles(&[
            NavPoint::new("a", 37.50, 127.00),
            NavPoint::new("b", 37.52, 127.05),
            NavPoint::new("c", 37.55, 127.10),
        ]);
        let builder = MapRequestBuilder::new(DEFAULT_ENDPOINT).unwrap();
        let url = builder.build_for_variant(&wps, ImageVariant::Detail);
        let s = url.as_str();

        assert!(s.contains("w=800&h=600"));
        assert!(s.contains("&markers=type:d|size:mid|color:red|pos:127.000000%2037.500000"));
        assert!(s.contains("&markers=type:d|size:mid|color:blue|pos:127.050000%2037.520000"));
        assert!(s.contains("&markers=type:d|size:mid|color:green|pos:127.100000%2037.550000"));
        assert!(!s.contains("%7C"));
        assert_eq!(query_values(&url, "markers").len(), 3);
    }

    #[test]
    fn center_and_zoom_follow_waypoints() {
        let wps = assign_roles(&[
            NavPoint::new("a", 37.50, 127.00),
            NavPoint::new("b", 37.55, 127.10),
        ]);
        let builder = MapRequestBuilder::new(DEFAULT_ENDPOINT).unwrap();
        let spec = builder.spec_for_variant(&wps, ImageVariant::Thumbnail);
        assert_eq!(spec.zoom_level, 12);
        assert!((spec.center.latitude - 37.525).abs() < 1e-9);
        assert!((spec.center.longitude - 127.05).abs() < 1e-9);
        assert_eq!(spec.markers.len(), 2);
    }

    #[test]
    fn custom_endpoint() {
        let builder = MapRequestBuilder::new("http://127.0.0.1:9999/raster").unwrap();
        let wps = assign_roles(&[NavPoint::new("a", 1.0, 2.0)]);
        let url = builder.build_for_variant(&wps, ImageVariant::Thumbnail);
        assert_eq!(url.host_str(), Some("127.0.0.1"));
        assert_eq!(url.path(), "/raster");
    }

    #[test]
    fn malformed_endpoint_is_rejected_up_front() {
        let err = MapRequestBuilder::new("not a url").unwrap_err();
        assert!(matches!(err, crate::error::MapImageError::InvalidUrl(_)));
    }
}
