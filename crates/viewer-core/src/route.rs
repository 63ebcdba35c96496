//! Route overlay and external navigation link.
//!
//! Built on demand from the current view center and the fetched point
//! positions; nothing here is persisted or cached.

use serde::Serialize;
use url::Url;

use map_common::LatLng;

/// A visible polyline through the worksite points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteOverlay {
    pub path: Vec<LatLng>,
    pub visible: bool,
}

/// Build the route polyline: the current view center first, then the fetched
/// point positions in order.
pub fn build_route(center: LatLng, points: &[LatLng]) -> RouteOverlay {
    let mut path = Vec::with_capacity(points.len() + 1);
    path.push(center);
    path.extend_from_slice(points);
    RouteOverlay {
        path,
        visible: true,
    }
}

/// Driving-directions URL for a path.
///
/// The final coordinate is the destination; everything before it becomes the
/// pipe-separated waypoint list. An empty path has no destination.
pub fn navigation_url(path: &[LatLng]) -> Option<Url> {
    let (destination, waypoints) = path.split_last()?;

    let mut url = Url::parse("https://www.google.com/maps/dir/").ok()?;
    {
        let mut q = url.query_pairs_mut();
        q.append_pair("api", "1");
        q.append_pair("destination", &destination.to_string());
        if !waypoints.is_empty() {
            let joined = waypoints
                .iter()
                .map(LatLng::to_string)
                .collect::<Vec<_>>()
                .join("|");
            q.append_pair("waypoints", &joined);
        }
        q.append_pair("travelmode", "driving");
    }
    Some(url)
}
