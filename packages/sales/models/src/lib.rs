#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Housing sale records and zip-code reference types.
//!
//! These types describe the data as it exists after loading: one
//! [`SaleRecord`] per registered transaction and one [`ZipArea`] per postal
//! region. Everything here is immutable once the dataset has been loaded;
//! filtering and aggregation only ever borrow these values.

use chrono::NaiveDate;
use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Kind of residence sold.
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
#[strum(ascii_case_insensitive)]
pub enum PropertyType {
    /// Detached or terraced house
    House,
    /// Owner-occupied flat
    Apartment,
    /// Summer house / holiday cottage
    Cottage,
    /// Anything the listing text does not map to the above
    Other,
}

impl PropertyType {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::House, Self::Apartment, Self::Cottage, Self::Other]
    }

    /// Maps listing text to a property type.
    ///
    /// Accepts the English names as well as the Danish vocabulary used by
    /// the land registry extracts (`Villa`, `Ejerlejlighed`, ...). Unknown
    /// text maps to [`PropertyType::Other`].
    #[must_use]
    pub fn from_listing_text(text: &str) -> Self {
        let text = text.trim();
        if let Ok(parsed) = text.parse::<Self>() {
            return parsed;
        }

        match text.to_lowercase().as_str() {
            "villa" | "rækkehus" | "raekkehus" | "parcelhus" | "landejendom" | "villalejlighed" => {
                Self::House
            }
            "ejerlejlighed" | "lejlighed" | "andelsbolig" => Self::Apartment,
            "fritidshus" | "sommerhus" | "fritidsbolig" => Self::Cottage,
            _ => Self::Other,
        }
    }
}

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl GeoPoint {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A geographic bounding box in WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western longitude boundary.
    pub west: f64,
    /// Southern latitude boundary.
    pub south: f64,
    /// Eastern longitude boundary.
    pub east: f64,
    /// Northern latitude boundary.
    pub north: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given coordinates.
    ///
    /// Swapped edges are put back in order, so `west <= east` and
    /// `south <= north` always hold.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        let (west, east) = if west > east { (east, west) } else { (west, east) };
        let (south, north) = if south > north {
            (north, south)
        } else {
            (south, north)
        };
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Whether the point lies inside the box (edges inclusive).
    #[must_use]
    pub fn contains(&self, point: GeoPoint) -> bool {
        (self.south..=self.north).contains(&point.latitude)
            && (self.west..=self.east).contains(&point.longitude)
    }
}

/// One registered housing sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    /// Position of the row in the source table.
    pub row: usize,
    /// Street address, e.g. "Vestergade 12, 5000 Odense C".
    pub address: Option<String>,
    /// Four-digit Danish postal code.
    pub zip_code: u32,
    /// Kind of residence.
    pub property_type: PropertyType,
    /// Total purchase sum in DKK.
    pub price: u64,
    /// Living area in m².
    pub living_area: Option<f64>,
    /// Lot size in m².
    pub lot_size: Option<f64>,
    /// Number of rooms.
    pub rooms: Option<u32>,
    /// Number of bathrooms.
    pub bathrooms: Option<u32>,
    /// Year the building was erected.
    pub build_year: Option<i32>,
    /// Registration date of the sale.
    pub sale_date: NaiveDate,
    /// Location of the property.
    pub location: Option<GeoPoint>,
}

impl SaleRecord {
    /// Price per m² of living area, if the living area is known and
    /// positive.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn price_per_m2(&self) -> Option<f64> {
        self.living_area
            .filter(|area| *area > 0.0)
            .map(|area| self.price as f64 / area)
    }
}

/// A postal-code region with its boundary polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct ZipArea {
    /// Synthetic identifier used by the map to address this region.
    pub id: u32,
    /// Postal code.
    pub zip_code: u32,
    /// Display name of the postal district.
    pub name: String,
    /// Region boundary.
    pub geometry: MultiPolygon<f64>,
}

impl ZipArea {
    /// Label used in dropdowns and hover text, e.g. "5000 Odense C".
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.zip_code, self.name)
    }
}
