#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Chart-ready aggregate types.
//!
//! An [`AggregateView`] is everything a dashboard page draws for one
//! filtered subset: histograms, a sales-volume series, per-zip counts and
//! rates, average price per m² series, map points and the detail card of
//! the selected sale. Views are recomputed from scratch on every event and
//! never persisted.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use fyn_housing_sales_models::{GeoPoint, SaleRecord};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Length of a time-series period.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TimeGranularity {
    /// Calendar months, labelled `YYYY-MM`.
    #[default]
    Monthly,
    /// Calendar quarters, labelled `YYYY-Qn`.
    Quarterly,
}

impl TimeGranularity {
    const fn periods_per_year(self) -> u32 {
        match self {
            Self::Monthly => 12,
            Self::Quarterly => 4,
        }
    }
}

/// Error returned when a period label cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid period label '{0}': expected YYYY-MM or YYYY-Qn")]
pub struct PeriodParseError(pub String);

/// A calendar month or quarter.
///
/// Serialized as its label (`"2021-03"`, `"2021-Q1"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Period {
    year: i32,
    index: u32,
    granularity: TimeGranularity,
}

impl Period {
    /// The period of the given granularity containing `date`.
    #[must_use]
    pub fn containing(date: NaiveDate, granularity: TimeGranularity) -> Self {
        let index = match granularity {
            TimeGranularity::Monthly => date.month(),
            TimeGranularity::Quarterly => date.month0() / 3 + 1,
        };
        Self {
            year: date.year(),
            index,
            granularity,
        }
    }

    /// The period immediately after this one.
    #[must_use]
    pub const fn next(self) -> Self {
        if self.index >= self.granularity.periods_per_year() {
            Self {
                year: self.year + 1,
                index: 1,
                granularity: self.granularity,
            }
        } else {
            Self {
                year: self.year,
                index: self.index + 1,
                granularity: self.granularity,
            }
        }
    }

    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    /// Month (1-12) or quarter (1-4) within the year.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    #[must_use]
    pub const fn granularity(self) -> TimeGranularity {
        self.granularity
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.granularity {
            TimeGranularity::Monthly => write!(f, "{:04}-{:02}", self.year, self.index),
            TimeGranularity::Quarterly => write!(f, "{:04}-Q{}", self.year, self.index),
        }
    }
}

impl FromStr for Period {
    type Err = PeriodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || PeriodParseError(s.to_string());
        let (year, rest) = s.trim().split_once('-').ok_or_else(err)?;
        let year: i32 = year.parse().map_err(|_| err())?;

        let (index, granularity) = rest.strip_prefix('Q').map_or_else(
            || (rest.parse::<u32>(), TimeGranularity::Monthly),
            |quarter| (quarter.parse::<u32>(), TimeGranularity::Quarterly),
        );
        let index = index.map_err(|_| err())?;

        if index == 0 || index > granularity.periods_per_year() {
            return Err(err());
        }

        Ok(Self {
            year,
            index,
            granularity,
        })
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.to_string()
    }
}

impl TryFrom<String> for Period {
    type Error = PeriodParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Fixed histogram domain. Bins never move with the data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramConfig {
    /// Lower edge of the first bin.
    pub min: f64,
    /// Upper edge of the last bin.
    pub max: f64,
    /// Width of every bin.
    pub bin_width: f64,
}

impl HistogramConfig {
    /// Sales price in DKK, 0 to 10 million in 250 000 steps.
    pub const PRICE: Self = Self {
        min: 0.0,
        max: 10_000_000.0,
        bin_width: 250_000.0,
    };

    /// Price per m², 0 to 40 000 in 1 000 steps.
    pub const PRICE_PER_M2: Self = Self {
        min: 0.0,
        max: 40_000.0,
        bin_width: 1_000.0,
    };

    /// Upper limit on the number of bins of a valid domain.
    pub const MAX_BINS: usize = 10_000;

    /// Whether the domain is non-empty with a positive bin width and at
    /// most [`Self::MAX_BINS`] bins.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn is_valid(&self) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && self.bin_width.is_finite()
            && self.bin_width > 0.0
            && self.max > self.min
            && ((self.max - self.min) / self.bin_width).ceil() <= Self::MAX_BINS as f64
    }

    /// Number of bins covering the domain. The last bin may be narrower
    /// than `bin_width` when the domain is not an exact multiple.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn bin_count(&self) -> usize {
        if !self.is_valid() {
            return 0;
        }
        ((self.max - self.min) / self.bin_width).ceil() as usize
    }
}

/// One histogram bin `[lower, upper)`. The last bin also includes its
/// upper edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: u64,
}

/// Counts of values per fixed-width bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
    /// Values below the domain.
    pub underflow: u64,
    /// Values above the domain.
    pub overflow: u64,
}

impl Histogram {
    /// Sum of all counts, including under- and overflow.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.bins.iter().map(|b| b.count).sum::<u64>() + self.underflow + self.overflow
    }
}

/// Number of sales in one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodCount {
    pub period: Period,
    pub count: u64,
}

/// Sales in one zip code, absolute and relative to its residences.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZipCount {
    pub zip_code: u32,
    pub count: u64,
    /// Residences in the zip, when known.
    pub residences: Option<u64>,
    /// Sales per 1000 residences. Zero when the population is zero or
    /// unknown.
    pub per_1000: f64,
}

/// Sales in one zip code during one period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZipPeriodCount {
    pub period: Period,
    pub count: u64,
    pub per_1000: f64,
}

/// Sales volume of one zip code over the period list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZipSeries {
    pub zip_code: u32,
    pub points: Vec<ZipPeriodCount>,
}

/// Smallest and largest observed value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueExtent<T> {
    pub min: T,
    pub max: T,
}

/// Observed value extents of one zip code's sales. Fields are `None` when
/// no sale has a value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZipExtents {
    pub zip_code: u32,
    pub sales: usize,
    pub price: Option<ValueExtent<u64>>,
    pub living_area: Option<ValueExtent<f64>>,
    pub lot_size: Option<ValueExtent<f64>>,
}

/// Average price per m² in one period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub period: Period,
    /// `None` when the period has no sales with a known living area.
    pub average_price_per_m2: Option<f64>,
    /// Sales contributing to the average.
    pub sales: u64,
}

/// Average price per m² over the period list, for one zip code or for
/// the whole region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSeries {
    /// Zip code, or `None` for the region-wide reference series.
    pub zip_code: Option<u32>,
    pub points: Vec<PricePoint>,
}

/// A sale drawn on the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapPoint {
    pub row: usize,
    pub latitude: f64,
    pub longitude: f64,
    pub price: u64,
}

/// How the user picked a sale for the detail card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Selection {
    /// A specific sale, e.g. a clicked map marker or table row.
    Row { row: usize },
    /// The filtered sale nearest to a clicked coordinate.
    Nearest { point: GeoPoint },
}

/// Detail card of the selected sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetail {
    #[serde(flatten)]
    pub record: SaleRecord,
    pub price_per_m2: Option<f64>,
}

impl From<&SaleRecord> for SaleDetail {
    fn from(record: &SaleRecord) -> Self {
        Self {
            record: record.clone(),
            price_per_m2: record.price_per_m2(),
        }
    }
}

/// Parameters of the aggregation step for one view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateConfig {
    /// Length of a time-series period.
    pub granularity: TimeGranularity,
    /// Date range the period list covers. When `None`, the dataset's own
    /// span is used.
    pub period_range: Option<(NaiveDate, NaiveDate)>,
    pub price_histogram: HistogramConfig,
    pub price_per_m2_histogram: HistogramConfig,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            granularity: TimeGranularity::Monthly,
            period_range: None,
            price_histogram: HistogramConfig::PRICE,
            price_per_m2_histogram: HistogramConfig::PRICE_PER_M2,
        }
    }
}

/// Everything a page draws for one filtered subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateView {
    /// Number of sales matching the filter.
    pub result_count: usize,
    pub price_histogram: Histogram,
    pub price_per_m2_histogram: Histogram,
    /// Sales per period, one entry per enumerated period.
    pub sales_over_time: Vec<PeriodCount>,
    /// Sales per zip code, ordered by zip code.
    pub sales_by_zip: Vec<ZipCount>,
    /// Sales per period for each selected zip code, in selection order.
    pub selected_zip_series: Vec<ZipSeries>,
    /// Sales per period for every zip code, ordered by zip code.
    pub sales_by_zip_and_period: Vec<ZipSeries>,
    /// Region-wide average price per m² series.
    pub region_price_series: PriceSeries,
    /// Average price per m² series per zip code, ordered by zip code.
    pub zip_price_series: Vec<PriceSeries>,
    pub map_points: Vec<MapPoint>,
    /// Detail of the selected sale, if any.
    pub selection: Option<SaleDetail>,
}
