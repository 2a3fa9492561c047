//! Geometry Builder: shore-normal transects and their clip buffers.

use crate::{coastline, layer, ConfigError, Error, TransectConfig};
use geo::{
    geometry::{Coord, Geometry, LineString, Polygon},
    EuclideanLength, LineInterpolatePoint,
};
use log::info;
use serde_json::json;
use std::{
    f64::consts::{FRAC_PI_2, PI},
    path::Path,
};

/// Segments per quarter circle of a buffer's round caps.
const QUAD_SEGS: usize = 8;

/// A straight sampling line perpendicular to the coastline.
#[derive(Debug, Clone, PartialEq)]
pub struct Transect {
    /// 1-based, dense, stable across epochs.
    pub id: u32,
    pub line: LineString<f64>,
}

impl Transect {
    pub fn length(&self) -> f64 {
        self.line.euclidean_length()
    }

    pub fn start(&self) -> Option<Coord<f64>> {
        self.line.0.first().copied()
    }

    pub fn end(&self) -> Option<Coord<f64>> {
        self.line.0.last().copied()
    }

    /// Returns this transect's clip polygon: every location within
    /// `width` of the line between its endpoints.
    pub fn buffer(&self, width: f64) -> Option<Buffer> {
        Some(Buffer {
            id: self.id,
            polygon: capsule(self.start()?, self.end()?, width),
        })
    }
}

/// Spatial claim of one transect, used as a raster cutline.
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer {
    pub id: u32,
    pub polygon: Polygon<f64>,
}

/// Returns transects for `cfg`, either loaded from `precomputed` (when
/// enabled and given) or generated along the coastline at
/// `coastline_path`.
pub fn build(
    cfg: &TransectConfig,
    coastline_path: &Path,
    precomputed: Option<&Path>,
) -> Result<Vec<Transect>, Error> {
    cfg.validate()?;
    let transects = match precomputed {
        Some(path) if cfg.use_precalculated => load(path)?,
        _ => {
            let coastline = coastline::load(coastline_path)?;
            generate(&coastline, cfg.spacing, cfg.length)?
        }
    };
    info!(
        "{} transects, length {}, spacing {}",
        transects.len(),
        cfg.length,
        cfg.spacing
    );
    Ok(transects)
}

/// Places a transect every `spacing` units of arc length along
/// `coastline`, starting at its first vertex.
///
/// Each transect is centered on its anchor, `length` long, and
/// perpendicular to the chord through the neighboring anchors.
pub fn generate(
    coastline: &LineString<f64>,
    spacing: f64,
    length: f64,
) -> Result<Vec<Transect>, ConfigError> {
    let empty = || ConfigError::EmptyTransectSet { spacing, length };
    if !(spacing > 0.0 && length > 0.0) {
        return Err(empty());
    }
    let total = coastline.euclidean_length();
    if total <= 0.0 {
        return Err(empty());
    }

    let at = |s: f64| -> Option<Coord<f64>> {
        coastline
            .line_interpolate_point((s / total).clamp(0.0, 1.0))
            .map(Coord::from)
    };

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let count = (total / spacing).floor() as usize + 1;
    let mut anchors = Vec::with_capacity(count);
    for k in 0..count {
        #[allow(clippy::cast_precision_loss)]
        let s = k as f64 * spacing;
        if let Some(coord) = at(s) {
            anchors.push((s, coord));
        }
    }

    let half = length / 2.0;
    let mut transects = Vec::with_capacity(anchors.len());
    for (k, &(s, center)) in anchors.iter().enumerate() {
        let prev = k.checked_sub(1).map_or(center, |j| anchors[j].1);
        let next = anchors.get(k + 1).map_or(center, |a| a.1);
        let mut tangent = next - prev;
        if norm(tangent) == 0.0 {
            // Lone anchor, or neighbors folding back onto the anchor.
            let (Some(a), Some(b)) = (at(s - spacing / 2.0), at(s + spacing / 2.0)) else {
                continue;
            };
            tangent = b - a;
        }
        let len = norm(tangent);
        if len == 0.0 {
            continue;
        }
        let normal = Coord {
            x: -tangent.y / len,
            y: tangent.x / len,
        };
        let id = u32::try_from(transects.len() + 1).map_err(|_| empty())?;
        transects.push(Transect {
            id,
            line: LineString::new(vec![center - normal * half, center + normal * half]),
        });
    }

    if transects.is_empty() {
        Err(empty())
    } else {
        Ok(transects)
    }
}

/// Returns one buffer per transect, `width` wide on each side.
pub fn buffers(transects: &[Transect], width: f64) -> Vec<Buffer> {
    transects.iter().filter_map(|t| t.buffer(width)).collect()
}

/// Returns the round-capped polygon of all points within `width` of
/// segment `a`-`b`.
pub fn capsule(a: Coord<f64>, b: Coord<f64>, width: f64) -> Polygon<f64> {
    let heading = (b.y - a.y).atan2(b.x - a.x);
    let steps = 2 * QUAD_SEGS;
    let mut ring = Vec::with_capacity(2 * (steps + 1) + 1);
    for (center, from) in [(b, heading - FRAC_PI_2), (a, heading + FRAC_PI_2)] {
        for i in 0..=steps {
            #[allow(clippy::cast_precision_loss)]
            let theta = from + PI * i as f64 / steps as f64;
            ring.push(Coord {
                x: center.x + width * theta.cos(),
                y: center.y + width * theta.sin(),
            });
        }
    }
    Polygon::new(LineString::new(ring), vec![])
}

/// Loads a precomputed transect layer.
///
/// Ids come from the `id` (or `fid`) property of each feature.
pub fn load(path: &Path) -> Result<Vec<Transect>, Error> {
    let layer_path = layer::resolve(path)?;
    let mut transects = Vec::new();
    for (index, (geometry, props)) in layer::features(&layer_path)?.into_iter().enumerate() {
        let bad = |field| ConfigError::Feature {
            path: layer_path.clone(),
            index,
            field,
        };
        let id = layer::u32_property(&props, "id")
            .or_else(|| layer::u32_property(&props, "fid"))
            .ok_or_else(|| bad("id"))?;
        let line = match geometry {
            Geometry::LineString(line) => line,
            Geometry::Line(line) => LineString::from(line),
            Geometry::MultiLineString(lines) => {
                lines.0.into_iter().next().ok_or_else(|| bad("geometry"))?
            }
            _ => return Err(bad("geometry").into()),
        };
        if line.0.len() < 2 {
            return Err(bad("geometry").into());
        }
        transects.push(Transect { id, line });
    }
    if transects.is_empty() {
        return Err(ConfigError::Path(layer_path).into());
    }
    transects.sort_by_key(|t| t.id);
    Ok(transects)
}

pub fn write(path: &Path, transects: &[Transect], crs: Option<&str>) -> Result<(), Error> {
    let features = transects
        .iter()
        .map(|t| layer::feature(&t.line, id_properties(t.id)))
        .collect();
    layer::write(path, features, crs)
}

pub fn write_buffers(path: &Path, buffers: &[Buffer], crs: Option<&str>) -> Result<(), Error> {
    let features = buffers
        .iter()
        .map(|b| layer::feature(&b.polygon, id_properties(b.id)))
        .collect();
    layer::write(path, features, crs)
}

/// Loads a buffer layer written by [`write_buffers`].
pub fn load_buffers(path: &Path) -> Result<Vec<Buffer>, Error> {
    let mut buffers = Vec::new();
    for (index, (geometry, props)) in layer::features(path)?.into_iter().enumerate() {
        let bad = |field| ConfigError::Feature {
            path: path.to_owned(),
            index,
            field,
        };
        let id = layer::u32_property(&props, "id").ok_or_else(|| bad("id"))?;
        let polygon = match geometry {
            Geometry::Polygon(polygon) => polygon,
            _ => return Err(bad("geometry").into()),
        };
        buffers.push(Buffer { id, polygon });
    }
    Ok(buffers)
}

fn id_properties(id: u32) -> geojson::JsonObject {
    let mut props = geojson::JsonObject::new();
    props.insert("id".to_string(), json!(id));
    props
}

fn norm(c: Coord<f64>) -> f64 {
    c.x.hypot(c.y)
}
