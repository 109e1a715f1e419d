//! Badge labels for the filters that currently constrain a result.

use fyn_housing_filter_models::{
    ActiveFilter, ControlId, FilterControls, FilterState, RangeControl, ValueRange,
};
use fyn_housing_sales_models::PropertyType;

/// Lists the controls that differ from full coverage, in the order they
/// appear on the page.
#[must_use]
pub fn active_filters(state: &FilterState, controls: &FilterControls) -> Vec<ActiveFilter> {
    let mut active = Vec::new();

    if state.property_types.len() < PropertyType::all().len() {
        let names: Vec<String> = state.property_types.iter().map(ToString::to_string).collect();
        let label = if names.is_empty() {
            "None".to_string()
        } else {
            names.join(", ")
        };
        active.push(badge(ControlId::PropertyTypes, label));
    }

    if !controls.price.is_full_coverage(&state.price) {
        let label = range_label(&controls.price, &state.price, |v| {
            format!("{} kr.", format_thousands(v))
        });
        active.push(badge(ControlId::Price, label));
    }

    if !controls.sale_date.is_full_coverage(&state.sale_date) {
        let label = range_label(&controls.sale_date, &state.sale_date, |d| {
            d.format("%Y-%m-%d").to_string()
        });
        active.push(badge(ControlId::SaleDate, label));
    }

    if !controls.living_area.is_full_coverage(&state.living_area) {
        let label = range_label(&controls.living_area, &state.living_area, area_label);
        active.push(badge(ControlId::LivingArea, label));
    }

    if !controls.lot_size.is_full_coverage(&state.lot_size) {
        let label = range_label(&controls.lot_size, &state.lot_size, area_label);
        active.push(badge(ControlId::LotSize, label));
    }

    if !controls.rooms.is_full_coverage(&state.rooms) {
        let mut label = range_label(&controls.rooms, &state.rooms, |v| v.to_string());
        if state.include_unknown_rooms {
            label.push_str(" (incl. unknown)");
        }
        active.push(badge(ControlId::Rooms, label));
    }

    if !controls.bathrooms.is_full_coverage(&state.bathrooms) {
        let label = range_label(&controls.bathrooms, &state.bathrooms, |v| v.to_string());
        active.push(badge(ControlId::Bathrooms, label));
    }

    if !controls.build_year.is_full_coverage(&state.build_year) {
        let label = range_label(&controls.build_year, &state.build_year, |v| v.to_string());
        active.push(badge(ControlId::BuildYear, label));
    }

    if !state.zip_codes.is_empty() {
        let zips: Vec<String> = state.zip_codes.iter().map(ToString::to_string).collect();
        active.push(badge(ControlId::ZipCodes, zips.join(", ")));
    }

    if let Some(bbox) = state.viewport {
        let label = format!(
            "{:.4}, {:.4} – {:.4}, {:.4}",
            bbox.south, bbox.west, bbox.north, bbox.east
        );
        active.push(badge(ControlId::Viewport, label));
    }

    active
}

/// Formats an integer with `,` thousands separators, e.g. `10,000,000`.
#[must_use]
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn badge(control: ControlId, label: String) -> ActiveFilter {
    ActiveFilter {
        control,
        title: control.title().to_string(),
        label,
    }
}

/// `"{min} – {max}"` with " +" after an open ceiling and " or before"
/// after an open floor.
fn range_label<T: PartialOrd + Copy>(
    control: &RangeControl<T>,
    range: &ValueRange<T>,
    fmt: impl Fn(T) -> String,
) -> String {
    let lower = if control.lower_is_open(range) {
        format!("{} or before", fmt(range.min()))
    } else {
        fmt(range.min())
    };
    let upper = if control.upper_is_open(range) {
        format!("{} +", fmt(range.max()))
    } else {
        fmt(range.max())
    };
    format!("{lower} – {upper}")
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn area_label(value: f64) -> String {
    if value >= 0.0 && value.fract() == 0.0 && value < u64::MAX as f64 {
        format!("{} m2", format_thousands(value as u64))
    } else {
        format!("{value} m2")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::update;
    use fyn_housing_filter_models::FilterUpdate;

    #[test]
    fn formats_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1_000), "1,000");
        assert_eq!(format_thousands(10_000_000), "10,000,000");
    }

    #[test]
    fn full_coverage_has_no_badges() {
        let controls = FilterControls::default();
        let state = FilterState::full_coverage(&controls);
        assert!(active_filters(&state, &controls).is_empty());
    }

    #[test]
    fn labels_open_ends_like_the_sliders() {
        let controls = FilterControls::default();
        let state = FilterState::full_coverage(&controls);
        let state = update(
            &state,
            FilterUpdate::Price(ValueRange::new(1_000_000, 10_000_000)),
            &controls,
        );
        let state = update(
            &state,
            FilterUpdate::BuildYear(ValueRange::new(1900, 1990)),
            &controls,
        );
        let state = update(
            &state,
            FilterUpdate::LivingArea(ValueRange::new(50.0, 250.0)),
            &controls,
        );

        let active = active_filters(&state, &controls);
        let labels: Vec<(ControlId, &str)> = active
            .iter()
            .map(|f| (f.control, f.label.as_str()))
            .collect();
        assert_eq!(
            labels,
            vec![
                (ControlId::Price, "1,000,000 kr. – 10,000,000 kr. +"),
                (ControlId::LivingArea, "50 m2 – 250 m2 +"),
                (ControlId::BuildYear, "1900 or before – 1990"),
            ]
        );
        assert_eq!(active[0].title, "Sales Price");
    }

    #[test]
    fn lists_selected_zips_in_click_order() {
        let controls = FilterControls::default();
        let state = FilterState::full_coverage(&controls);
        let state = crate::add_zip_from_click(&state, 5700);
        let state = crate::add_zip_from_click(&state, 5000);

        let active = active_filters(&state, &controls);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].control, ControlId::ZipCodes);
        assert_eq!(active[0].label, "5700, 5000");
    }
}
