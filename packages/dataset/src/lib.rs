#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dataset loading for the Fyn housing market.
//!
//! Reads the three input files (sales table, zip-code area `GeoJSON` and
//! population table) into a [`DataContext`]. Loading is all-or-nothing:
//! any malformed required value aborts with a [`DatasetError`] rather than
//! producing a partial dataset.

pub mod population;
pub mod sales;
pub mod zip_areas;

mod coerce;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use fyn_housing_sales_models::{GeoPoint, SaleRecord, ZipArea};
use fyn_housing_spatial::ZipAreaIndex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use coerce::is_missing;

/// Bathroom count assumed for sales that do not report one.
pub const DEFAULT_MISSING_BATHROOMS: u32 = 1;

/// Errors that abort a dataset load.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// A file could not be opened or read.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The CSV reader rejected the input.
    #[error("CSV error in {path}: {source}")]
    Csv {
        /// Source the rows were read from.
        path: String,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// The header row lacks a required column.
    #[error("{path}: missing required column '{column}'")]
    MissingColumn {
        /// Source the rows were read from.
        path: String,
        /// Column name.
        column: String,
    },

    /// A required field is empty or holds a missing-value sentinel.
    #[error("{path}: row {row} has no value for required column '{column}'")]
    MissingValue {
        /// Source the rows were read from.
        path: String,
        /// Zero-based data row.
        row: usize,
        /// Column name.
        column: String,
    },

    /// A value is present but cannot be parsed.
    #[error("{path}: row {row} column '{column}' has invalid value '{value}'")]
    InvalidValue {
        /// Source the rows were read from.
        path: String,
        /// Zero-based data row.
        row: usize,
        /// Column name.
        column: String,
        /// Raw text of the value.
        value: String,
    },

    /// A sale with a negative price.
    #[error("{path}: row {row} has negative price {value}")]
    NegativePrice {
        /// Source the rows were read from.
        path: String,
        /// Zero-based data row.
        row: usize,
        /// Raw text of the value.
        value: String,
    },

    /// The zip-code area document is not valid `GeoJSON`.
    #[error("GeoJSON error in {path}: {source}")]
    GeoJson {
        /// Source the document was read from.
        path: String,
        /// Underlying parse error.
        source: Box<geojson::Error>,
    },

    /// The zip-code area document is valid `GeoJSON` but not a
    /// `FeatureCollection`.
    #[error("{path}: expected a GeoJSON FeatureCollection")]
    NotFeatureCollection {
        /// Source the document was read from.
        path: String,
    },

    /// Two zip-code area features carry the same explicit id.
    #[error("{path}: feature id {id} is used by more than one zip area")]
    DuplicateAreaId {
        /// Source the document was read from.
        path: String,
        /// The repeated id.
        id: u32,
    },
}

/// Defaults substituted for missing values during loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissingValueDefaults {
    /// Bathroom count used when the column is missing, a sentinel or `0`.
    pub bathrooms: u32,
}

impl Default for MissingValueDefaults {
    fn default() -> Self {
        Self {
            bathrooms: DEFAULT_MISSING_BATHROOMS,
        }
    }
}

/// Options controlling how the input files are read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoadOptions {
    /// Field delimiter of the sales table.
    pub delimiter: char,
    /// `GeoJSON` property holding the zip code.
    pub zip_property: String,
    /// `GeoJSON` property holding the district name.
    pub name_property: String,
    /// Defaults for missing values.
    pub missing: MissingValueDefaults,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            zip_property: "POSTNR_TXT".to_string(),
            name_property: "POSTBYNAVN".to_string(),
            missing: MissingValueDefaults::default(),
        }
    }
}

impl LoadOptions {
    /// The delimiter as the single byte the CSV reader expects. Non-ASCII
    /// delimiters fall back to `,`.
    #[must_use]
    pub fn delimiter_byte(&self) -> u8 {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .unwrap_or(b',')
    }
}

/// Locations of the three input files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetPaths {
    /// Sales table (CSV).
    pub sales: PathBuf,
    /// Zip-code areas (`GeoJSON` `FeatureCollection`).
    pub zip_areas: PathBuf,
    /// Residences per zip code (CSV).
    pub population: PathBuf,
}

impl DatasetPaths {
    /// Default file names inside `dir`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            sales: dir.join("housesales.csv"),
            zip_areas: dir.join("zip_code_areas_fyn_with_id.geojson"),
            population: dir.join("population.csv"),
        }
    }

    /// Resolves relative paths against `dir`. Absolute paths are kept.
    #[must_use]
    pub fn relative_to(&self, dir: &Path) -> Self {
        Self {
            sales: dir.join(&self.sales),
            zip_areas: dir.join(&self.zip_areas),
            population: dir.join(&self.population),
        }
    }
}

/// The loaded, read-only dataset shared by every view.
pub struct DataContext {
    records: Vec<SaleRecord>,
    zip_areas: Vec<ZipArea>,
    population: BTreeMap<u32, u64>,
    area_index: ZipAreaIndex,
    date_span: Option<(NaiveDate, NaiveDate)>,
}

impl DataContext {
    /// Assembles a context from already-loaded parts and builds the
    /// spatial index.
    #[must_use]
    pub fn new(
        records: Vec<SaleRecord>,
        zip_areas: Vec<ZipArea>,
        population: BTreeMap<u32, u64>,
    ) -> Self {
        let date_span = records
            .iter()
            .map(|r| r.sale_date)
            .fold(None, |span: Option<(NaiveDate, NaiveDate)>, date| {
                Some(span.map_or((date, date), |(first, last)| {
                    (first.min(date), last.max(date))
                }))
            });
        let area_index = ZipAreaIndex::build(&zip_areas);

        Self {
            records,
            zip_areas,
            population,
            area_index,
            date_span,
        }
    }

    /// All sales, in source order.
    #[must_use]
    pub fn records(&self) -> &[SaleRecord] {
        &self.records
    }

    /// The sale at source row `row`.
    #[must_use]
    pub fn record(&self, row: usize) -> Option<&SaleRecord> {
        self.records
            .get(row)
            .filter(|r| r.row == row)
            .or_else(|| self.records.iter().find(|r| r.row == row))
    }

    /// All zip-code areas.
    #[must_use]
    pub fn zip_areas(&self) -> &[ZipArea] {
        &self.zip_areas
    }

    /// The area with synthetic id `id`.
    #[must_use]
    pub fn zip_area(&self, id: u32) -> Option<&ZipArea> {
        self.zip_areas.iter().find(|area| area.id == id)
    }

    /// Residences in `zip_code`, if known.
    #[must_use]
    pub fn population(&self, zip_code: u32) -> Option<u64> {
        self.population.get(&zip_code).copied()
    }

    /// Every zip code named by the area or population tables.
    #[must_use]
    pub fn reference_zips(&self) -> BTreeSet<u32> {
        self.zip_areas
            .iter()
            .map(|area| area.zip_code)
            .chain(self.population.keys().copied())
            .collect()
    }

    /// Zip code of the area containing `point`.
    #[must_use]
    pub fn lookup_zip(&self, point: GeoPoint) -> Option<u32> {
        self.area_index.lookup_zip(point)
    }

    /// First and last sale date, or `None` for an empty table.
    #[must_use]
    pub const fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.date_span
    }
}

/// Loads all three input files.
///
/// # Errors
///
/// * If any file cannot be read
/// * If the sales or population table is malformed
/// * If the zip-code area document is not a `GeoJSON` `FeatureCollection`
pub fn load(paths: &DatasetPaths, options: &LoadOptions) -> Result<DataContext, DatasetError> {
    let records = sales::load_sales(&paths.sales, options)?;
    let zip_areas = zip_areas::load_zip_areas(&paths.zip_areas, options)?;
    let population = population::load_population(&paths.population)?;

    log::info!(
        "Loaded {} sales, {} zip areas, {} population entries",
        records.len(),
        zip_areas.len(),
        population.len()
    );

    Ok(DataContext::new(records, zip_areas, population))
}

pub(crate) fn open(path: &Path) -> Result<std::fs::File, DatasetError> {
    std::fs::File::open(path).map_err(|source| DatasetError::Io {
        path: path.display().to_string(),
        source,
    })
}
