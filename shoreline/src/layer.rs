//! GeoJSON vector layers.

use crate::{ConfigError, Error};
use geo::{Geometry, GeometryCollection};
use geojson::{quick_collection, Feature, FeatureCollection, GeoJson, JsonObject, JsonValue};
use serde::Serialize;
use std::{
    ffi::OsStr,
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

/// Returns the layer file for `path`.
///
/// Directories are searched for their first (by name) `.geojson` or
/// `.json` file, mirroring how shape folders are handed around.
pub fn resolve(path: &Path) -> Result<PathBuf, Error> {
    if path.is_file() {
        return Ok(path.to_owned());
    }
    if !path.is_dir() {
        return Err(ConfigError::Path(path.to_owned()).into());
    }
    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let candidate = entry?.path();
        if matches!(
            candidate.extension().and_then(OsStr::to_str),
            Some("geojson" | "json")
        ) {
            candidates.push(candidate);
        }
    }
    candidates.sort();
    candidates
        .into_iter()
        .next()
        .ok_or_else(|| ConfigError::Path(path.to_owned()).into())
}

pub fn open(path: &Path) -> Result<GeoJson, Error> {
    let rdr = BufReader::new(File::open(path)?);
    Ok(GeoJson::from_reader(rdr)?)
}

/// Returns every geometry in the layer at `path`, properties dropped.
pub fn geometries(path: &Path) -> Result<GeometryCollection<f64>, Error> {
    let json = open(path)?;
    Ok(quick_collection(&json)?)
}

/// Returns `(geometry, properties)` for every feature of the layer at
/// `path`. Features without a geometry are skipped.
pub fn features(path: &Path) -> Result<Vec<(Geometry<f64>, JsonObject)>, Error> {
    let features = match open(path)? {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(geometry) => vec![Feature::from(geometry)],
    };
    let mut out = Vec::with_capacity(features.len());
    for feature in features {
        if let Some(geometry) = feature.geometry {
            let geometry = Geometry::<f64>::try_from(geometry)?;
            out.push((geometry, feature.properties.unwrap_or_default()));
        }
    }
    Ok(out)
}

/// Returns a feature of `geometry` carrying `properties`.
pub fn feature<G>(geometry: G, properties: JsonObject) -> Feature
where
    geojson::Value: From<G>,
{
    Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(geojson::Value::from(geometry))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Serializes a flat record into feature properties.
pub fn properties<T: Serialize>(record: &T) -> Result<JsonObject, Error> {
    match serde_json::to_value(record)? {
        JsonValue::Object(map) => Ok(map),
        other => {
            let mut map = JsonObject::new();
            map.insert("value".to_string(), other);
            Ok(map)
        }
    }
}

/// Reads an integer property, accepting both JSON numbers and
/// numeric strings.
pub fn u32_property(properties: &JsonObject, key: &str) -> Option<u32> {
    match properties.get(key)? {
        JsonValue::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64))
            .and_then(|n| u32::try_from(n).ok()),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Writes `features` as a feature collection to `path`.
///
/// When `crs` is set it is attached as a named `crs` member so
/// downstream tools keep the projected reference system.
pub fn write(path: &Path, features: Vec<Feature>, crs: Option<&str>) -> Result<(), Error> {
    let foreign_members = crs.map(|name| {
        let mut members = JsonObject::new();
        members.insert(
            "crs".to_string(),
            serde_json::json!({"type": "name", "properties": {"name": name}}),
        );
        members
    });
    let collection = GeoJson::from(FeatureCollection {
        bbox: None,
        features,
        foreign_members,
    });
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut out, &collection)?;
    out.flush()?;
    Ok(())
}
