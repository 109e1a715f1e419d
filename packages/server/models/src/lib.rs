#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the housing dashboard server.
//!
//! These types are serialized to JSON for the REST API. They wrap the
//! dashboard's own types so the wire contract can evolve independently.

use fyn_housing_aggregate_models::{AggregateView, TimeGranularity, ZipExtents};
use fyn_housing_dashboard::{
    ApplyMode, DashboardEvent, SessionSnapshot, ViewKind, ViewSettings, ViewUpdate,
};
use fyn_housing_filter_models::{ActiveFilter, EmptyZipPolicy, FilterControls};
use fyn_housing_sales_models::{GeoPoint, PropertyType};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
    /// Number of loaded sales.
    pub sales: usize,
}

/// A dashboard page and its settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiViewInfo {
    /// View id used in request paths, e.g. `sales-search`.
    pub id: ViewKind,
    pub title: String,
    pub granularity: TimeGranularity,
    pub empty_zip_policy: EmptyZipPolicy,
    pub apply_mode: ApplyMode,
}

impl ApiViewInfo {
    #[must_use]
    pub fn new(id: ViewKind, settings: &ViewSettings) -> Self {
        Self {
            id,
            title: settings.title.clone(),
            granularity: settings.granularity,
            empty_zip_policy: settings.empty_zip_policy,
            apply_mode: settings.apply_mode,
        }
    }
}

/// Body of `POST /api/views/{view}/events`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEventRequest {
    /// The client's current session. A fresh session is used when absent.
    #[serde(default)]
    pub session: Option<SessionSnapshot>,
    pub event: DashboardEvent,
}

/// A recomputed view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiViewResponse {
    /// The session to send with the next event.
    pub session: SessionSnapshot,
    pub view: AggregateView,
    pub result_count: usize,
    pub active_filters: Vec<ActiveFilter>,
    /// Value extents of the selected zips, for sliders that follow them.
    pub zip_extents: Vec<ZipExtents>,
}

impl From<ViewUpdate> for ApiViewResponse {
    fn from(update: ViewUpdate) -> Self {
        Self {
            result_count: update.view.result_count,
            session: update.session,
            view: update.view,
            active_filters: update.active_filters,
            zip_extents: update.zip_extents,
        }
    }
}

/// Response of `GET /api/views/{view}`: the initial view plus what the
/// client needs to draw the page's controls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiInitialView {
    pub info: ApiViewInfo,
    /// Slider spans.
    pub controls: FilterControls,
    #[serde(flatten)]
    pub response: ApiViewResponse,
}

/// A zip-code area for dropdowns and map labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiZipArea {
    /// Synthetic area id used by map clicks.
    pub id: u32,
    pub zip_code: u32,
    pub name: String,
    /// Dropdown label, e.g. "5000 Odense C".
    pub label: String,
    pub centroid: Option<GeoPoint>,
    /// Residences in the zip code, when known.
    pub residences: Option<u64>,
}

/// A property type checkbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPropertyType {
    pub value: PropertyType,
    pub label: String,
}

impl From<PropertyType> for ApiPropertyType {
    fn from(value: PropertyType) -> Self {
        Self {
            value,
            label: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_request_session_is_optional() {
        let request: ApiEventRequest =
            serde_json::from_str(r#"{"event":{"type":"selectionCleared"}}"#).unwrap();
        assert!(request.session.is_none());
        assert_eq!(request.event, DashboardEvent::SelectionCleared);
    }

    #[test]
    fn view_info_serializes_ids_and_policies() {
        let info = ApiViewInfo {
            id: ViewKind::AreaOverview,
            title: "Area Overview".to_string(),
            granularity: TimeGranularity::Monthly,
            empty_zip_policy: EmptyZipPolicy::MatchNothing,
            apply_mode: ApplyMode::OnApply,
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["id"], "area-overview");
        assert_eq!(json["emptyZipPolicy"], "match-nothing");
        assert_eq!(json["applyMode"], "on-apply");
        assert_eq!(json["granularity"], "monthly");
    }
}
