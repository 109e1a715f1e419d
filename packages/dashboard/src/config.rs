//! Dashboard configuration.
//!
//! The built-in defaults in `config/default.toml` are compiled into the
//! binary. A user-supplied TOML file is merged over them table by table,
//! so it only needs to name the keys it changes.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use fyn_housing_aggregate_models::{AggregateConfig, HistogramConfig, TimeGranularity};
use fyn_housing_dataset::{DatasetPaths, LoadOptions};
use fyn_housing_filter_models::{EmptyZipPolicy, FilterControls, RangeControl};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::view::{ApplyMode, ViewKind};

/// Built-in configuration, embedded at compile time.
const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The TOML is malformed or does not match the expected shape.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The configuration parsed but is inconsistent.
    #[error("Invalid configuration: {message}")]
    Invalid {
        /// Description of what went wrong.
        message: String,
    },
}

/// Where the input files live and how to read them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataConfig {
    /// Directory relative file names are resolved against.
    pub dir: PathBuf,
    pub sales: PathBuf,
    pub zip_areas: PathBuf,
    pub population: PathBuf,
    #[serde(default)]
    pub options: LoadOptions,
}

impl DataConfig {
    /// Input file paths resolved against [`DataConfig::dir`].
    #[must_use]
    pub fn paths(&self) -> DatasetPaths {
        DatasetPaths {
            sales: self.sales.clone(),
            zip_areas: self.zip_areas.clone(),
            population: self.population.clone(),
        }
        .relative_to(&self.dir)
    }
}

/// Histogram domains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramsConfig {
    pub price: HistogramConfig,
    pub price_per_m2: HistogramConfig,
}

/// Fixed date range for the period lists, replacing the dataset span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRange {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

/// Per-view behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSettings {
    /// Page title.
    pub title: String,
    /// Length of a time-series period.
    pub granularity: TimeGranularity,
    /// What an empty zip selection means on this page.
    #[serde(default)]
    pub empty_zip_policy: EmptyZipPolicy,
    /// Whether filter changes take effect immediately or on "Apply".
    #[serde(default)]
    pub apply_mode: ApplyMode,
}

/// Complete dashboard configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardConfig {
    pub data: DataConfig,
    #[serde(default)]
    pub controls: FilterControls,
    pub histograms: HistogramsConfig,
    /// Overrides the dataset span for the period lists.
    #[serde(default)]
    pub periods: Option<PeriodRange>,
    pub views: BTreeMap<ViewKind, ViewSettings>,
}

impl DashboardConfig {
    /// The built-in configuration.
    ///
    /// # Errors
    ///
    /// * If the embedded defaults are invalid
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_toml_str("")
    }

    /// Parses `overrides` and merges it over the built-in defaults.
    ///
    /// # Errors
    ///
    /// * If `overrides` is not valid TOML
    /// * If the merged configuration has the wrong shape or fails
    ///   [`DashboardConfig::validate`]
    pub fn from_toml_str(overrides: &str) -> Result<Self, ConfigError> {
        let mut table: toml::Table = DEFAULT_CONFIG.parse()?;
        let overrides: toml::Table = overrides.parse()?;
        merge_tables(&mut table, overrides);

        let config: Self = toml::Value::Table(table).try_into()?;
        config.validate()?;
        Ok(config)
    }

    /// Reads the config file at `path` and merges it over the defaults.
    ///
    /// # Errors
    ///
    /// * If the file cannot be read
    /// * If its contents are rejected by [`DashboardConfig::from_toml_str`]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        log::info!("Loaded dashboard config from {}", path.display());

        Self::from_toml_str(&text)
    }

    /// Checks that every view is configured and every span is non-empty.
    ///
    /// # Errors
    ///
    /// * If a view has no settings
    /// * If a control's floor is above its ceiling or either is NaN
    /// * If a histogram domain is empty, has a non-positive bin width or
    ///   needs more than [`HistogramConfig::MAX_BINS`] bins
    /// * If the period override ends before it starts
    pub fn validate(&self) -> Result<(), ConfigError> {
        for kind in ViewKind::all() {
            if !self.views.contains_key(kind) {
                return invalid(format!("no settings for view '{kind}'"));
            }
        }

        let c = &self.controls;
        check_span("price", &c.price)?;
        check_span("livingArea", &c.living_area)?;
        check_span("lotSize", &c.lot_size)?;
        check_span("rooms", &c.rooms)?;
        check_span("bathrooms", &c.bathrooms)?;
        check_span("buildYear", &c.build_year)?;
        check_span("saleDate", &c.sale_date)?;

        for (name, histogram) in [
            ("price", &self.histograms.price),
            ("pricePerM2", &self.histograms.price_per_m2),
        ] {
            if !histogram.is_valid() {
                return invalid(format!(
                    "histogram '{name}' needs min < max, a positive bin width and at most {} bins",
                    HistogramConfig::MAX_BINS
                ));
            }
        }

        if let Some(range) = self.periods
            && range.first > range.last
        {
            return invalid(format!(
                "period range ends ({}) before it starts ({})",
                range.last, range.first
            ));
        }

        Ok(())
    }

    /// Aggregation parameters for a view.
    #[must_use]
    pub fn aggregate_config(&self, settings: &ViewSettings) -> AggregateConfig {
        AggregateConfig {
            granularity: settings.granularity,
            period_range: self.periods.map(|r| (r.first, r.last)),
            price_histogram: self.histograms.price,
            price_per_m2_histogram: self.histograms.price_per_m2,
        }
    }
}

fn invalid<T>(message: String) -> Result<T, ConfigError> {
    Err(ConfigError::Invalid { message })
}

fn check_span<T: PartialOrd + std::fmt::Debug>(
    name: &str,
    control: &RangeControl<T>,
) -> Result<(), ConfigError> {
    if !matches!(
        control.floor.partial_cmp(&control.ceiling),
        Some(Ordering::Less | Ordering::Equal)
    ) {
        return invalid(format!(
            "control '{name}' needs floor {:?} at or below ceiling {:?}",
            control.floor, control.ceiling
        ));
    }
    Ok(())
}

/// Merges `overrides` into `base`. Nested tables merge key by key; any
/// other value replaces the base value.
fn merge_tables(base: &mut toml::Table, overrides: toml::Table) {
    for (key, value) in overrides {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
