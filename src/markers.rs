//! Waypoint roles and the static map API's marker syntax.

use crate::models::{MarkerColor, MarkerSpec, NavPoint, Waypoint, WaypointRole};

/// Separator the API expects between repeated `markers` parameters.
pub const MARKER_SEPARATOR: &str = "&markers=";

/// Role of the waypoint at `index` in a route of `len` points.
///
/// The start check runs first, so a single-point route is a start.
pub fn role_for_index(index: usize, len: usize) -> WaypointRole {
    if index == 0 {
        WaypointRole::Start
    } else if index + 1 == len {
        WaypointRole::End
    } else {
        WaypointRole::Via
    }
}

/// Tags each navigation point with its positional role, preserving order.
pub fn assign_roles(nav: &[NavPoint]) -> Vec<Waypoint> {
    nav.iter()
        .enumerate()
        .map(|(i, point)| Waypoint {
            role: role_for_index(i, nav.len()),
            label: point.name.clone(),
            position: point.geolocation,
        })
        .collect()
}

pub fn marker_specs(waypoints: &[Waypoint]) -> Vec<MarkerSpec> {
    waypoints
        .iter()
        .map(|wp| MarkerSpec {
            color: MarkerColor::from(wp.role),
            position: wp.position,
        })
        .collect()
}

/// `type:d|size:mid|color:<color>|pos:<lng> <lat>`
pub fn encode_marker(marker: &MarkerSpec) -> String {
    format!(
        "type:d|size:mid|color:{}|pos:{:.6} {:.6}",
        marker.color.as_str(),
        marker.position.longitude,
        marker.position.latitude
    )
}

/// First marker bare, the rest each prefixed with `&markers=`.
pub fn encode_markers(markers: &[MarkerSpec]) -> String {
    markers
        .iter()
        .map(encode_marker)
        .collect::<Vec<_>>()
        .join(MARKER_SEPARATOR)
}
