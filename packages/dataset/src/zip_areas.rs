//! Zip-code area reader.
//!
//! Expects a `GeoJSON` `FeatureCollection` with one feature per postal
//! district. Features whose geometry is missing, not polygonal, or whose zip
//! property cannot be read are skipped with a warning; the map simply does
//! not draw them.
//!
//! Area ids are unique within a document. A numeric feature `id` is used as
//! is. A feature without one gets its position in the document, or the next
//! id no other feature claims when that position is taken.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use fyn_housing_sales_models::ZipArea;
use fyn_housing_spatial::geometry_to_multipolygon;
use geojson::{Feature, GeoJson, feature::Id};
use serde_json::Value;

use crate::{DatasetError, LoadOptions};

/// Reads the zip-code areas at `path`.
///
/// # Errors
///
/// * If the file cannot be read
/// * If it is not a `GeoJSON` `FeatureCollection`
pub fn load_zip_areas(path: &Path, options: &LoadOptions) -> Result<Vec<ZipArea>, DatasetError> {
    let file = crate::open(path)?;
    let areas = read_zip_areas(file, &path.display().to_string(), options)?;

    log::info!("Read {} zip areas from {}", areas.len(), path.display());

    Ok(areas)
}

/// Reads zip-code areas from any reader. `source` names the input in error
/// messages.
///
/// # Errors
///
/// * If the reader fails
/// * If the document is not a `GeoJSON` `FeatureCollection`
/// * If two features carry the same numeric `id`
pub fn read_zip_areas(
    mut reader: impl Read,
    source: &str,
    options: &LoadOptions,
) -> Result<Vec<ZipArea>, DatasetError> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| DatasetError::Io {
            path: source.to_string(),
            source: e,
        })?;

    let geojson: GeoJson = text.parse().map_err(|e| DatasetError::GeoJson {
        path: source.to_string(),
        source: Box::new(e),
    })?;

    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(DatasetError::NotFeatureCollection {
            path: source.to_string(),
        });
    };

    let mut converted = Vec::with_capacity(collection.features.len());
    for (index, feature) in collection.features.into_iter().enumerate() {
        match convert_feature(feature, options) {
            Ok((explicit, area)) => converted.push((index, explicit, area)),
            Err(reason) => log::warn!("{source}: skipping feature {index}: {reason}"),
        }
    }

    let mut taken = BTreeSet::new();
    for (_, explicit, _) in &converted {
        if let Some(id) = *explicit
            && !taken.insert(id)
        {
            return Err(DatasetError::DuplicateAreaId {
                path: source.to_string(),
                id,
            });
        }
    }

    let mut next_free = taken.last().map_or(0, |max| max.saturating_add(1));
    let mut areas = Vec::with_capacity(converted.len());
    for (index, explicit, mut area) in converted {
        area.id = match explicit {
            Some(id) => id,
            None => match u32::try_from(index).ok().filter(|id| !taken.contains(id)) {
                Some(id) => id,
                None => {
                    while taken.contains(&next_free) {
                        next_free += 1;
                    }
                    next_free
                }
            },
        };
        taken.insert(area.id);
        areas.push(area);
    }

    Ok(areas)
}

/// Converts one feature. The area id is left at 0 and the feature's own
/// numeric id, if any, is returned next to it.
fn convert_feature(
    feature: Feature,
    options: &LoadOptions,
) -> Result<(Option<u32>, ZipArea), String> {
    let zip_code = feature
        .property(&options.zip_property)
        .and_then(zip_from_value)
        .ok_or_else(|| format!("no usable '{}' property", options.zip_property))?;

    let name = feature
        .property(&options.name_property)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();

    let explicit = feature.id.as_ref().and_then(|id| match id {
        Id::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Id::String(_) => None,
    });

    let geometry = feature
        .geometry
        .and_then(geometry_to_multipolygon)
        .ok_or_else(|| format!("zip {zip_code} has no polygon geometry"))?;

    Ok((
        explicit,
        ZipArea {
            id: 0,
            zip_code,
            name,
            geometry,
        },
    ))
}

fn zip_from_value(value: &Value) -> Option<u32> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        _ => None,
    }
}
