#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Filter state transitions and the record filter evaluator.
//!
//! [`update`] turns the current [`FilterState`] plus one [`FilterUpdate`]
//! into a new state. [`apply`] evaluates a state against the loaded sales
//! and returns the matching subset in input order.
//!
//! Predicates are evaluated in a fixed order: property type, price, sale
//! date, living area, lot size, rooms, bathrooms, build year, zip code and
//! finally the map viewport. A range that spans its whole slider applies no
//! predicate at all, so records with unknown values are only dropped once
//! the user narrows the corresponding control.

mod labels;

pub use labels::{active_filters, format_thousands};

use fyn_housing_filter_models::{
    EmptyZipPolicy, FilterControls, FilterState, FilterUpdate, RangeControl, ValueRange,
    unique_zip_codes,
};
use fyn_housing_sales_models::SaleRecord;

/// Applies a single control change and returns the resulting state.
///
/// Ranges arrive already normalized (`min <= max`) and are not clamped to
/// the control's span. A zip list is de-duplicated keeping the first
/// occurrence of each code.
#[must_use]
pub fn update(current: &FilterState, change: FilterUpdate, controls: &FilterControls) -> FilterState {
    let mut next = current.clone();

    match change {
        FilterUpdate::Price(range) => next.price = range,
        FilterUpdate::LivingArea(range) => next.living_area = range,
        FilterUpdate::LotSize(range) => next.lot_size = range,
        FilterUpdate::Rooms(range) => next.rooms = range,
        FilterUpdate::Bathrooms(range) => next.bathrooms = range,
        FilterUpdate::BuildYear(range) => next.build_year = range,
        FilterUpdate::SaleDate(range) => next.sale_date = range,
        FilterUpdate::PropertyTypes(types) => next.property_types = types,
        FilterUpdate::ZipCodes(zips) => next.zip_codes = unique_zip_codes(zips),
        FilterUpdate::Viewport(viewport) => next.viewport = viewport,
        FilterUpdate::IncludeUnknownRooms(include) => next.include_unknown_rooms = include,
        FilterUpdate::Reset => next = FilterState::full_coverage(controls),
    }

    next
}

/// Adds a zip code selected by clicking its region on the map.
///
/// Clicking a region that is already selected leaves the state unchanged.
#[must_use]
pub fn add_zip_from_click(current: &FilterState, zip_code: u32) -> FilterState {
    let mut next = current.clone();
    if !next.zip_codes.contains(&zip_code) {
        next.zip_codes.push(zip_code);
    }
    next
}

/// Removes a zip code from the selection, if present.
#[must_use]
pub fn remove_zip(current: &FilterState, zip_code: u32) -> FilterState {
    let mut next = current.clone();
    next.zip_codes.retain(|zip| *zip != zip_code);
    next
}

/// Returns the records matching every constraint of `state`, in input
/// order.
///
/// `policy` decides what an empty zip selection means for the calling view.
pub fn apply<'a>(
    records: impl IntoIterator<Item = &'a SaleRecord>,
    state: &FilterState,
    controls: &FilterControls,
    policy: EmptyZipPolicy,
) -> Vec<&'a SaleRecord> {
    let filtered: Vec<&SaleRecord> = records
        .into_iter()
        .filter(|record| matches(record, state, controls, policy))
        .collect();

    log::trace!("Filter matched {} records", filtered.len());

    filtered
}

/// Evaluates every predicate against one record.
#[must_use]
pub fn matches(
    record: &SaleRecord,
    state: &FilterState,
    controls: &FilterControls,
    policy: EmptyZipPolicy,
) -> bool {
    state.property_types.contains(&record.property_type)
        && in_range(&controls.price, &state.price, Some(record.price))
        && in_range(&controls.sale_date, &state.sale_date, Some(record.sale_date))
        && in_range(&controls.living_area, &state.living_area, record.living_area)
        && in_range(&controls.lot_size, &state.lot_size, record.lot_size)
        && rooms_match(record, state, controls)
        && in_range(&controls.bathrooms, &state.bathrooms, record.bathrooms)
        && in_range(&controls.build_year, &state.build_year, record.build_year)
        && zip_matches(record.zip_code, &state.zip_codes, policy)
        && state
            .viewport
            .is_none_or(|bbox| record.location.is_some_and(|loc| bbox.contains(loc)))
}

fn in_range<T: PartialOrd + Copy>(
    control: &RangeControl<T>,
    range: &ValueRange<T>,
    value: Option<T>,
) -> bool {
    if control.is_full_coverage(range) {
        return true;
    }
    let Some(value) = value else {
        return false;
    };

    (control.lower_is_open(range) || value >= range.min())
        && (control.upper_is_open(range) || value <= range.max())
}

fn rooms_match(record: &SaleRecord, state: &FilterState, controls: &FilterControls) -> bool {
    if record.rooms.is_none() && state.include_unknown_rooms {
        return true;
    }
    in_range(&controls.rooms, &state.rooms, record.rooms)
}

fn zip_matches(zip_code: u32, selected: &[u32], policy: EmptyZipPolicy) -> bool {
    if selected.is_empty() {
        return match policy {
            EmptyZipPolicy::NoFilter => true,
            EmptyZipPolicy::MatchNothing => false,
        };
    }
    selected.contains(&zip_code)
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;
    use fyn_housing_sales_models::{GeoPoint, PropertyType, SaleRecord};

    pub fn sale(row: usize, zip_code: u32, price: u64) -> SaleRecord {
        SaleRecord {
            row,
            address: Some(format!("Vestergade {row}")),
            zip_code,
            property_type: PropertyType::House,
            price,
            living_area: Some(120.0),
            lot_size: Some(700.0),
            rooms: Some(4),
            bathrooms: Some(1),
            build_year: Some(1975),
            sale_date: NaiveDate::from_ymd_opt(2020, 6, 15).unwrap(),
            location: Some(GeoPoint::new(55.4, 10.4)),
        }
    }
}
