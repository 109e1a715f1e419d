//! User interactions and per-client session state.

use fyn_housing_aggregate_models::Selection;
use fyn_housing_filter_models::{FilterState, FilterUpdate};
use fyn_housing_sales_models::GeoPoint;
use serde::{Deserialize, Serialize};

/// What a map click landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ClickTarget {
    /// A zip-code region, by its synthetic area id.
    #[serde(rename_all = "camelCase")]
    Region { area_id: u32 },
    /// A sale marker.
    Record { row: usize },
    /// Empty map.
    Nothing,
}

/// A click on the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapClick {
    pub latitude: f64,
    pub longitude: f64,
    pub target: ClickTarget,
}

impl MapClick {
    #[must_use]
    pub const fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Every interaction a page reacts to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum DashboardEvent {
    /// A filter control changed.
    FilterChanged(FilterUpdate),
    /// The map was clicked.
    MapClicked(MapClick),
    /// The "Apply" button was pressed.
    ApplyButtonPressed,
    /// The detail card was closed.
    SelectionCleared,
}

/// A client's dashboard state, sent with every event and returned updated.
///
/// `applied` drives the view. `pending` collects changes on pages that
/// apply on a button press; elsewhere it always equals `applied`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub applied: FilterState,
    pub pending: FilterState,
    #[serde(default)]
    pub selection: Option<Selection>,
}

impl SessionSnapshot {
    /// A session with `state` both applied and pending and nothing selected.
    #[must_use]
    pub fn new(state: FilterState) -> Self {
        Self {
            pending: state.clone(),
            applied: state,
            selection: None,
        }
    }
}
