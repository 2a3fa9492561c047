use crate::{layer, ConfigError, Error};
use geo::{Coord, Geometry, LineString};
use log::{debug, info};
use std::path::Path;

/// Endpoints closer than this (map units) are treated as shared.
const SNAP: f64 = 1e-6;

/// Loads the coastline at `path` as a single line.
///
/// Multi-part coastlines are merged end to end; parts that cannot be
/// chained are an error.
pub fn load(path: &Path) -> Result<LineString<f64>, Error> {
    let layer_path = layer::resolve(path)?;
    let mut parts = Vec::new();
    for geometry in layer::geometries(&layer_path)? {
        match geometry {
            Geometry::LineString(line) => parts.push(line),
            Geometry::MultiLineString(lines) => parts.extend(lines),
            other => debug!("ignoring non-line coastline geometry {other:?}"),
        }
    }
    parts.retain(|line| line.0.len() > 1);
    if parts.is_empty() {
        return Err(ConfigError::NoCoastlineFound(layer_path).into());
    }
    let count = parts.len();
    let line = merge(parts).ok_or(ConfigError::DisjointCoastline(layer_path))?;
    info!("coastline: {count} parts, {} vertices", line.0.len());
    Ok(line)
}

/// Chains `parts` into one line through coincident endpoints.
///
/// Returns `None` if `parts` is empty or cannot be joined.
pub fn merge(mut parts: Vec<LineString<f64>>) -> Option<LineString<f64>> {
    if parts.is_empty() {
        return None;
    }
    let mut chain: Vec<Coord<f64>> = parts.remove(0).0;
    while !parts.is_empty() {
        let head = *chain.first()?;
        let tail = *chain.last()?;
        let (idx, join) = parts.iter().enumerate().find_map(|(idx, part)| {
            let first = *part.0.first()?;
            let last = *part.0.last()?;
            if close(tail, first) {
                Some((idx, Join::Append))
            } else if close(tail, last) {
                Some((idx, Join::AppendReversed))
            } else if close(head, last) {
                Some((idx, Join::Prepend))
            } else if close(head, first) {
                Some((idx, Join::PrependReversed))
            } else {
                None
            }
        })?;
        let mut coords = parts.remove(idx).0;
        match join {
            Join::Append => chain.extend(coords.into_iter().skip(1)),
            Join::AppendReversed => chain.extend(coords.into_iter().rev().skip(1)),
            Join::Prepend => {
                coords.pop();
                coords.extend(chain);
                chain = coords;
            }
            Join::PrependReversed => {
                coords.reverse();
                coords.pop();
                coords.extend(chain);
                chain = coords;
            }
        }
    }
    Some(LineString::new(chain))
}

enum Join {
    Append,
    AppendReversed,
    Prepend,
    PrependReversed,
}

fn close(a: Coord<f64>, b: Coord<f64>) -> bool {
    (a.x - b.x).abs() <= SNAP && (a.y - b.y).abs() <= SNAP
}

#[cfg(test)]
mod tests {
    use super::merge;
    use geo::line_string;

    #[test]
    fn test_merge_out_of_order_parts() {
        let parts = vec![
            line_string![(x: 10.0, y: 0.0), (x: 20.0, y: 0.0)],
            line_string![(x: 30.0, y: 5.0), (x: 20.0, y: 0.0)],
            line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)],
        ];
        let merged = merge(parts).unwrap();
        assert_eq!(
            merged,
            line_string![
                (x: 0.0, y: 0.0),
                (x: 10.0, y: 0.0),
                (x: 20.0, y: 0.0),
                (x: 30.0, y: 5.0),
            ]
        );
    }

    #[test]
    fn test_disjoint_parts() {
        let parts = vec![
            line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)],
            line_string![(x: 50.0, y: 0.0), (x: 60.0, y: 0.0)],
        ];
        assert!(merge(parts).is_none());
        assert!(merge(Vec::new()).is_none());
    }
}
