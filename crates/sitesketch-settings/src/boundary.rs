//! Planning boundary loading.
//!
//! Boundary files use the ArcGIS polygon JSON layout:
//!
//! ```json
//! { "rings": [[[x, y], ...]], "spatialReference": { "wkid": 3857 } }
//! ```
//!
//! A feature wrapper (`{ "geometry": { ... } }`) is accepted as well.

use crate::config::BoundarySettings;
use crate::error::SettingsResult;
use serde::Deserialize;
use sitesketch_core::{BoundaryPolygon, Point, SpatialReference};
use std::path::Path;

#[derive(Debug, Deserialize)]
struct WkidRef {
    wkid: u32,
}

#[derive(Debug, Deserialize)]
struct PolygonJson {
    rings: Vec<Vec<[f64; 2]>>,
    #[serde(rename = "spatialReference", default)]
    spatial_reference: Option<WkidRef>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BoundaryDocument {
    Polygon(PolygonJson),
    Feature { geometry: PolygonJson },
}

fn to_rings(rings: &[Vec<[f64; 2]>]) -> Vec<Vec<Point>> {
    rings
        .iter()
        .map(|ring| ring.iter().copied().map(Point::from).collect())
        .collect()
}

/// Parse an ArcGIS-style polygon document.
///
/// `default_wkid` applies when the document carries no spatial reference.
pub fn parse_boundary_json(text: &str, default_wkid: u32) -> SettingsResult<BoundaryPolygon> {
    let polygon = match serde_json::from_str::<BoundaryDocument>(text)? {
        BoundaryDocument::Polygon(p) => p,
        BoundaryDocument::Feature { geometry } => geometry,
    };
    let wkid = polygon
        .spatial_reference
        .map(|sr| sr.wkid)
        .unwrap_or(default_wkid);
    let boundary = BoundaryPolygon::new(to_rings(&polygon.rings), SpatialReference::new(wkid))?;
    Ok(boundary)
}

/// Resolve the configured boundary.
///
/// Relative paths are resolved against `base_dir` (normally the directory of
/// the config file). Returns `Ok(None)` when no boundary is configured.
pub fn load_boundary(
    settings: &BoundarySettings,
    base_dir: Option<&Path>,
) -> SettingsResult<Option<BoundaryPolygon>> {
    if let Some(rings) = &settings.rings {
        let boundary =
            BoundaryPolygon::new(to_rings(rings), SpatialReference::new(settings.wkid))?;
        tracing::info!("Using inline boundary with {} ring(s)", boundary.rings().len());
        return Ok(Some(boundary));
    }

    let Some(path) = &settings.path else {
        tracing::info!("No boundary configured; clipping disabled");
        return Ok(None);
    };

    let resolved = match base_dir {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path.clone(),
    };
    let text = std::fs::read_to_string(&resolved)?;
    let boundary = parse_boundary_json(&text, settings.wkid)?;
    tracing::info!(
        "Loaded boundary from {} ({} ring(s), {})",
        resolved.display(),
        boundary.rings().len(),
        boundary.spatial_reference()
    );
    Ok(Some(boundary))
}
