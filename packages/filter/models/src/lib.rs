#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Filter state and control definitions.
//!
//! A [`FilterState`] is the complete set of constraints the user has
//! selected. Each numeric constraint belongs to a [`RangeControl`] that
//! knows the slider's floor and ceiling, which is what gives the
//! "or above" / "or below" meaning to a bound left at the end of its
//! slider. State changes are expressed as [`FilterUpdate`] values and always
//! produce a new state.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use fyn_housing_sales_models::{BoundingBox, PropertyType};
use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A closed interval `[min, max]` with `min <= max`.
///
/// Serialized as a two-element array, the shape range sliders report.
/// Inverted bounds are swapped on construction and on deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "[T; 2]",
    into = "[T; 2]",
    bound(
        deserialize = "T: Deserialize<'de> + PartialOrd",
        serialize = "T: Serialize + Clone"
    )
)]
pub struct ValueRange<T> {
    min: T,
    max: T,
}

impl<T: PartialOrd> ValueRange<T> {
    /// Creates a range, swapping the bounds if `a > b`.
    #[must_use]
    pub fn new(a: T, b: T) -> Self {
        if a > b {
            Self { min: b, max: a }
        } else {
            Self { min: a, max: b }
        }
    }
}

impl<T: Copy> ValueRange<T> {
    #[must_use]
    pub const fn min(&self) -> T {
        self.min
    }

    #[must_use]
    pub const fn max(&self) -> T {
        self.max
    }
}

impl<T: PartialOrd> From<[T; 2]> for ValueRange<T> {
    fn from([a, b]: [T; 2]) -> Self {
        Self::new(a, b)
    }
}

impl<T> From<ValueRange<T>> for [T; 2] {
    fn from(range: ValueRange<T>) -> Self {
        [range.min, range.max]
    }
}

/// Static description of a range slider.
///
/// `open_below` / `open_above` mark whether a bound left at the floor or
/// ceiling means "this value or below" / "this value or above" rather than
/// an exact bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeControl<T> {
    /// Lowest slider position.
    pub floor: T,
    /// Highest slider position.
    pub ceiling: T,
    /// A minimum at the floor matches everything below it.
    #[serde(default)]
    pub open_below: bool,
    /// A maximum at the ceiling matches everything above it.
    #[serde(default)]
    pub open_above: bool,
}

impl<T: PartialOrd + Copy> RangeControl<T> {
    /// Control whose ceiling is "or above".
    #[must_use]
    pub const fn open_above(floor: T, ceiling: T) -> Self {
        Self {
            floor,
            ceiling,
            open_below: false,
            open_above: true,
        }
    }

    /// Control whose floor is "or below".
    #[must_use]
    pub const fn open_below(floor: T, ceiling: T) -> Self {
        Self {
            floor,
            ceiling,
            open_below: true,
            open_above: false,
        }
    }

    /// Control with exact bounds at both ends.
    #[must_use]
    pub const fn closed(floor: T, ceiling: T) -> Self {
        Self {
            floor,
            ceiling,
            open_below: false,
            open_above: false,
        }
    }

    /// The range spanning the whole slider.
    #[must_use]
    pub fn full_range(&self) -> ValueRange<T> {
        ValueRange::new(self.floor, self.ceiling)
    }

    /// Whether `range` leaves the slider at both of its ends.
    #[must_use]
    pub fn is_full_coverage(&self, range: &ValueRange<T>) -> bool {
        range.min <= self.floor && range.max >= self.ceiling
    }

    /// Whether the minimum is at the floor of an "or below" slider.
    #[must_use]
    pub fn lower_is_open(&self, range: &ValueRange<T>) -> bool {
        self.open_below && range.min <= self.floor
    }

    /// Whether the maximum is at the ceiling of an "or above" slider.
    #[must_use]
    pub fn upper_is_open(&self, range: &ValueRange<T>) -> bool {
        self.open_above && range.max >= self.ceiling
    }
}

/// Floors and ceilings of every range control on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterControls {
    /// Sales price in DKK.
    pub price: RangeControl<u64>,
    /// Living area in m².
    pub living_area: RangeControl<f64>,
    /// Lot size in m².
    pub lot_size: RangeControl<f64>,
    /// Number of rooms.
    pub rooms: RangeControl<u32>,
    /// Number of bathrooms.
    pub bathrooms: RangeControl<u32>,
    /// Year of construction.
    pub build_year: RangeControl<i32>,
    /// Date of sale. Normally replaced by the loaded dataset's span.
    pub sale_date: RangeControl<NaiveDate>,
}

/// First month covered by the bundled sales extract.
pub const DEFAULT_FIRST_SALE_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2019, 7, 1) {
    Some(date) => date,
    None => panic!("invalid first sale date"),
};

/// Last day covered by the bundled sales extract.
pub const DEFAULT_LAST_SALE_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2021, 11, 30) {
    Some(date) => date,
    None => panic!("invalid last sale date"),
};

impl Default for FilterControls {
    fn default() -> Self {
        Self {
            price: RangeControl::open_above(0, 10_000_000),
            living_area: RangeControl::open_above(0.0, 250.0),
            lot_size: RangeControl::open_above(0.0, 10_000.0),
            rooms: RangeControl::open_above(0, 9),
            bathrooms: RangeControl::open_above(0, 5),
            build_year: RangeControl::open_below(1900, 2021),
            sale_date: RangeControl::closed(DEFAULT_FIRST_SALE_DATE, DEFAULT_LAST_SALE_DATE),
        }
    }
}

impl FilterControls {
    /// Replaces the sale date control with the given dataset span.
    #[must_use]
    pub fn with_sale_dates(mut self, first: NaiveDate, last: NaiveDate) -> Self {
        let span = ValueRange::new(first, last);
        self.sale_date = RangeControl::closed(span.min, span.max);
        self
    }
}

/// What an empty zip-code selection means for a view.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum EmptyZipPolicy {
    /// No zip codes selected: every zip code passes.
    #[default]
    NoFilter,
    /// No zip codes selected: nothing passes.
    MatchNothing,
}

/// The complete set of user-selected constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub price: ValueRange<u64>,
    pub living_area: ValueRange<f64>,
    pub lot_size: ValueRange<f64>,
    pub rooms: ValueRange<u32>,
    pub bathrooms: ValueRange<u32>,
    pub build_year: ValueRange<i32>,
    pub sale_date: ValueRange<NaiveDate>,
    /// Included property types. Empty excludes every record.
    pub property_types: BTreeSet<PropertyType>,
    /// Explicitly selected zip codes, in selection order. Repeats are
    /// dropped on deserialization.
    #[serde(deserialize_with = "deserialize_zip_codes")]
    pub zip_codes: Vec<u32>,
    /// Visible map area, when the user has panned or zoomed.
    pub viewport: Option<BoundingBox>,
    /// Keep records with an unknown room count when the room range is
    /// narrowed.
    #[serde(default)]
    pub include_unknown_rooms: bool,
}

impl FilterState {
    /// State that covers every record: each range spans its whole slider,
    /// all property types are included and nothing else is constrained.
    #[must_use]
    pub fn full_coverage(controls: &FilterControls) -> Self {
        Self {
            price: controls.price.full_range(),
            living_area: controls.living_area.full_range(),
            lot_size: controls.lot_size.full_range(),
            rooms: controls.rooms.full_range(),
            bathrooms: controls.bathrooms.full_range(),
            build_year: controls.build_year.full_range(),
            sale_date: controls.sale_date.full_range(),
            property_types: PropertyType::all().iter().copied().collect(),
            zip_codes: Vec::new(),
            viewport: None,
            include_unknown_rooms: false,
        }
    }
}

/// Identifies one user-facing filter control.
#[derive(
    Debug,
    Clone,
    Copy,
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
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ControlId {
    PropertyTypes,
    Price,
    SaleDate,
    LivingArea,
    LotSize,
    Rooms,
    Bathrooms,
    BuildYear,
    ZipCodes,
    Viewport,
}

impl ControlId {
    /// Human-readable control name used on badges.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::PropertyTypes => "Type",
            Self::Price => "Sales Price",
            Self::SaleDate => "Time of Sale",
            Self::LivingArea => "House Size",
            Self::LotSize => "Lot Size",
            Self::Rooms => "Number of Rooms",
            Self::Bathrooms => "Number of Bathrooms",
            Self::BuildYear => "Build Year",
            Self::ZipCodes => "Zip Codes",
            Self::Viewport => "Map Area",
        }
    }
}

/// A single control change. Applying one always yields a complete new
/// [`FilterState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "control", content = "value", rename_all = "camelCase")]
pub enum FilterUpdate {
    Price(ValueRange<u64>),
    LivingArea(ValueRange<f64>),
    LotSize(ValueRange<f64>),
    Rooms(ValueRange<u32>),
    Bathrooms(ValueRange<u32>),
    BuildYear(ValueRange<i32>),
    SaleDate(ValueRange<NaiveDate>),
    PropertyTypes(BTreeSet<PropertyType>),
    /// Replaces the whole zip selection (e.g. from a dropdown).
    ZipCodes(Vec<u32>),
    Viewport(Option<BoundingBox>),
    IncludeUnknownRooms(bool),
    /// Back to full coverage.
    Reset,
}

/// A filter that currently constrains the result, ready to render as a
/// badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveFilter {
    /// Which control is active.
    pub control: ControlId,
    /// Control title, e.g. "Sales Price".
    pub title: String,
    /// Selected value, e.g. "0 kr. - 5,000,000 kr.".
    pub label: String,
}

/// `zips` in first-occurrence order with repeats removed.
#[must_use]
pub fn unique_zip_codes(zips: impl IntoIterator<Item = u32>) -> Vec<u32> {
    let mut unique = Vec::new();
    for zip in zips {
        if !unique.contains(&zip) {
            unique.push(zip);
        }
    }
    unique
}

fn deserialize_zip_codes<'de, D>(deserializer: D) -> Result<Vec<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<u32>::deserialize(deserializer).map(unique_zip_codes)
}
