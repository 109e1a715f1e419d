//! Dashboard pages.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// One dashboard page. Every page runs the same filter and aggregation
/// pipeline with its own settings.
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
pub enum ViewKind {
    /// Searchable table and map of individual sales.
    #[serde(rename = "sales-search")]
    #[strum(serialize = "sales-search")]
    SalesSearch,
    /// Average price per m² by zip code over time.
    #[serde(rename = "m2-prices")]
    #[strum(serialize = "m2-prices")]
    M2Prices,
    /// Sales volume per quarter and zip code.
    #[serde(rename = "total-sales")]
    #[strum(serialize = "total-sales")]
    TotalSales,
    /// Compare selected zip codes, applied with a button.
    #[serde(rename = "area-overview")]
    #[strum(serialize = "area-overview")]
    AreaOverview,
}

impl ViewKind {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::SalesSearch,
            Self::M2Prices,
            Self::TotalSales,
            Self::AreaOverview,
        ]
    }
}

/// When filter changes take effect.
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
pub enum ApplyMode {
    /// Every control change recomputes the view.
    #[default]
    Immediate,
    /// Control changes are staged until the "Apply" button is pressed.
    OnApply,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_ids_round_trip_through_strum() {
        for kind in ViewKind::all() {
            assert_eq!(kind.to_string().parse::<ViewKind>().unwrap(), *kind);
        }
        assert_eq!(ViewKind::M2Prices.as_ref(), "m2-prices");
        assert!("salesSearch".parse::<ViewKind>().is_err());
    }

    #[test]
    fn apply_mode_parses_kebab_case() {
        assert_eq!("on-apply".parse::<ApplyMode>().unwrap(), ApplyMode::OnApply);
    }
}
