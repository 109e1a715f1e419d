#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Event dispatch for the housing dashboard pages.
//!
//! A [`Dashboard`] owns the shared [`DataContext`] and the configuration.
//! Each event a page receives updates the client's [`SessionSnapshot`] and
//! triggers exactly one synchronous recomputation: filter the sales with
//! the applied [`FilterState`](fyn_housing_filter_models::FilterState),
//! then aggregate the subset with the page's settings.

pub mod config;
pub mod event;
pub mod view;

use std::sync::Arc;

use fyn_housing_aggregate::{summarize, zip_extents};
use fyn_housing_aggregate_models::{AggregateView, Selection, ZipExtents};
use fyn_housing_dataset::DataContext;
use fyn_housing_filter::{active_filters, add_zip_from_click, apply, update};
use fyn_housing_filter_models::{ActiveFilter, FilterControls, FilterState};
use serde::{Deserialize, Serialize};

pub use config::{ConfigError, DashboardConfig, ViewSettings};
pub use event::{ClickTarget, DashboardEvent, MapClick, SessionSnapshot};
pub use view::{ApplyMode, ViewKind};

/// The result of one recomputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewUpdate {
    /// The session after the event.
    pub session: SessionSnapshot,
    /// Chart data for the applied filters.
    pub view: AggregateView,
    /// Badges for the applied filters that constrain the result.
    pub active_filters: Vec<ActiveFilter>,
    /// Observed value extents of each zip in the pending selection, for
    /// pages whose sliders follow the chosen zip.
    pub zip_extents: Vec<ZipExtents>,
}

/// Shared, read-only dashboard backend.
pub struct Dashboard {
    context: Arc<DataContext>,
    config: DashboardConfig,
    controls: FilterControls,
}

impl Dashboard {
    /// Creates a dashboard over a loaded dataset.
    ///
    /// The sale date control spans the dataset's own date range.
    ///
    /// # Errors
    ///
    /// * If `config` fails [`DashboardConfig::validate`]
    pub fn new(context: Arc<DataContext>, config: DashboardConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let controls = context
            .date_span()
            .map_or(config.controls, |(first, last)| {
                config.controls.with_sale_dates(first, last)
            });

        Ok(Self {
            context,
            config,
            controls,
        })
    }

    /// The shared dataset.
    #[must_use]
    pub fn context(&self) -> &DataContext {
        &self.context
    }

    #[must_use]
    pub const fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Control spans in effect, with the sale date span taken from the
    /// data.
    #[must_use]
    pub const fn controls(&self) -> &FilterControls {
        &self.controls
    }

    /// Settings of `kind`, present for every view once the config is
    /// validated.
    #[must_use]
    pub fn settings(&self, kind: ViewKind) -> Option<&ViewSettings> {
        self.config.views.get(&kind)
    }

    /// A fresh session: full coverage, nothing selected.
    #[must_use]
    pub fn initial_session(&self) -> SessionSnapshot {
        SessionSnapshot::new(FilterState::full_coverage(&self.controls))
    }

    /// Computes the view for `session` without changing it.
    #[must_use]
    pub fn render(&self, kind: ViewKind, session: SessionSnapshot) -> Option<ViewUpdate> {
        let settings = self.settings(kind)?;

        let filtered = apply(
            self.context.records(),
            &session.applied,
            &self.controls,
            settings.empty_zip_policy,
        );
        let view = summarize(
            &self.context,
            &filtered,
            &self.config.aggregate_config(settings),
            &session.applied.zip_codes,
            session.selection.as_ref(),
        );
        let active_filters = active_filters(&session.applied, &self.controls);
        let zip_extents = session
            .pending
            .zip_codes
            .iter()
            .map(|&zip| zip_extents(&self.context, zip))
            .collect();

        Some(ViewUpdate {
            session,
            view,
            active_filters,
            zip_extents,
        })
    }

    /// Applies `event` to `session` and recomputes the view once.
    ///
    /// Returns `None` only for a view without settings.
    #[must_use]
    pub fn dispatch(
        &self,
        kind: ViewKind,
        session: SessionSnapshot,
        event: DashboardEvent,
    ) -> Option<ViewUpdate> {
        let settings = self.settings(kind)?;
        let session = self.handle(settings.apply_mode, session, event);
        self.render(kind, session)
    }

    fn handle(
        &self,
        mode: ApplyMode,
        mut session: SessionSnapshot,
        event: DashboardEvent,
    ) -> SessionSnapshot {
        match event {
            DashboardEvent::FilterChanged(change) => {
                let next = update(editable(mode, &session), change, &self.controls);
                stage(mode, &mut session, next);
            }
            DashboardEvent::MapClicked(click) => match click.target {
                ClickTarget::Region { area_id } => {
                    let zip = self
                        .context
                        .zip_area(area_id)
                        .map(|area| area.zip_code)
                        .or_else(|| self.context.lookup_zip(click.point()));
                    if let Some(zip) = zip {
                        let next = add_zip_from_click(editable(mode, &session), zip);
                        stage(mode, &mut session, next);
                    } else {
                        log::debug!("Map click on unknown area {area_id} ignored");
                    }
                }
                ClickTarget::Record { row } => {
                    session.selection = Some(Selection::Row { row });
                }
                ClickTarget::Nothing => {
                    session.selection = Some(Selection::Nearest {
                        point: click.point(),
                    });
                }
            },
            DashboardEvent::ApplyButtonPressed => {
                session.applied = session.pending.clone();
            }
            DashboardEvent::SelectionCleared => {
                session.selection = None;
            }
        }
        session
    }
}

/// The state a control change edits: staged on apply-button pages,
/// applied elsewhere.
const fn editable(mode: ApplyMode, session: &SessionSnapshot) -> &FilterState {
    match mode {
        ApplyMode::Immediate => &session.applied,
        ApplyMode::OnApply => &session.pending,
    }
}

fn stage(mode: ApplyMode, session: &mut SessionSnapshot, next: FilterState) {
    match mode {
        ApplyMode::Immediate => {
            session.pending = next.clone();
            session.applied = next;
        }
        ApplyMode::OnApply => session.pending = next,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use fyn_housing_filter_models::{ControlId, FilterUpdate, ValueRange};
    use fyn_housing_sales_models::{GeoPoint, PropertyType, SaleRecord, ZipArea};
    use geo::{LineString, MultiPolygon, Polygon};

    fn sale(row: usize, zip_code: u32, price: u64, lat: f64) -> SaleRecord {
        SaleRecord {
            row,
            address: None,
            zip_code,
            property_type: PropertyType::House,
            price,
            living_area: Some(100.0),
            lot_size: None,
            rooms: Some(3),
            bathrooms: Some(1),
            build_year: Some(1980),
            sale_date: "2020-06-01".parse().unwrap(),
            location: Some(GeoPoint::new(lat, 10.2)),
        }
    }

    fn area(id: u32, zip_code: u32, south: f64) -> ZipArea {
        let ring = LineString::from(vec![
            (10.0, south),
            (10.5, south),
            (10.5, south + 0.5),
            (10.0, south + 0.5),
            (10.0, south),
        ]);
        ZipArea {
            id,
            zip_code,
            name: format!("Area {zip_code}"),
            geometry: MultiPolygon(vec![Polygon::new(ring, vec![])]),
        }
    }

    fn dashboard() -> Dashboard {
        let context = DataContext::new(
            vec![
                sale(0, 5000, 1_000_000, 55.1),
                sale(1, 5700, 5_000_000, 55.6),
                sale(2, 5000, 9_500_000, 55.2),
            ],
            vec![area(0, 5000, 55.0), area(1, 5700, 55.5)],
            BTreeMap::from([(5000, 1000), (5700, 500)]),
        );
        Dashboard::new(Arc::new(context), DashboardConfig::builtin().unwrap()).unwrap()
    }

    fn region_click(area_id: u32, latitude: f64) -> DashboardEvent {
        DashboardEvent::MapClicked(MapClick {
            latitude,
            longitude: 10.2,
            target: ClickTarget::Region { area_id },
        })
    }

    #[test]
    fn initial_view_shows_everything() {
        let dashboard = dashboard();
        let update = dashboard
            .render(ViewKind::SalesSearch, dashboard.initial_session())
            .unwrap();
        assert_eq!(update.view.result_count, 3);
        assert!(update.active_filters.is_empty());
        assert_eq!(update.view.sales_over_time.len(), 1);
    }

    #[test]
    fn filter_change_recomputes_immediately() {
        let dashboard = dashboard();
        let update = dashboard
            .dispatch(
                ViewKind::SalesSearch,
                dashboard.initial_session(),
                DashboardEvent::FilterChanged(FilterUpdate::Price(ValueRange::new(0, 5_000_000))),
            )
            .unwrap();
        assert_eq!(update.view.result_count, 2);
        assert_eq!(update.session.applied, update.session.pending);
        assert_eq!(update.active_filters[0].control, ControlId::Price);
    }

    #[test]
    fn region_clicks_add_zip_once() {
        let dashboard = dashboard();
        let first = dashboard
            .dispatch(
                ViewKind::SalesSearch,
                dashboard.initial_session(),
                region_click(1, 55.6),
            )
            .unwrap();
        let second = dashboard
            .dispatch(ViewKind::SalesSearch, first.session, region_click(1, 55.6))
            .unwrap();
        assert_eq!(second.session.applied.zip_codes, vec![5700]);
        assert_eq!(second.view.result_count, 1);
        assert_eq!(second.view.selected_zip_series.len(), 1);
    }

    #[test]
    fn posted_session_with_repeated_zips_gets_one_series_per_zip() {
        let dashboard = dashboard();
        let mut json = serde_json::to_value(dashboard.initial_session()).unwrap();
        json["applied"]["zipCodes"] = serde_json::json!([5700, 5700]);
        json["pending"]["zipCodes"] = serde_json::json!([5700, 5700]);
        let session: SessionSnapshot = serde_json::from_value(json).unwrap();

        let update = dashboard.render(ViewKind::SalesSearch, session).unwrap();
        assert_eq!(update.session.applied.zip_codes, vec![5700]);
        assert_eq!(update.view.selected_zip_series.len(), 1);
        assert_eq!(update.zip_extents.len(), 1);
    }

    #[test]
    fn zip_extents_follow_the_pending_selection() {
        let dashboard = dashboard();
        let update = dashboard
            .dispatch(
                ViewKind::AreaOverview,
                dashboard.initial_session(),
                DashboardEvent::FilterChanged(FilterUpdate::ZipCodes(vec![5000])),
            )
            .unwrap();
        assert!(update.session.applied.zip_codes.is_empty());
        assert_eq!(update.zip_extents.len(), 1);

        let extents = update.zip_extents[0];
        assert_eq!(extents.zip_code, 5000);
        assert_eq!(extents.sales, 2);
        let price = extents.price.unwrap();
        assert_eq!((price.min, price.max), (1_000_000, 9_500_000));

        let nothing_selected = dashboard
            .render(ViewKind::SalesSearch, dashboard.initial_session())
            .unwrap();
        assert!(nothing_selected.zip_extents.is_empty());
    }

    #[test]
    fn unknown_area_id_falls_back_to_point_lookup() {
        let dashboard = dashboard();
        let update = dashboard
            .dispatch(
                ViewKind::SalesSearch,
                dashboard.initial_session(),
                region_click(99, 55.2),
            )
            .unwrap();
        assert_eq!(update.session.applied.zip_codes, vec![5000]);

        let nowhere = dashboard
            .dispatch(
                ViewKind::SalesSearch,
                dashboard.initial_session(),
                region_click(99, 57.0),
            )
            .unwrap();
        assert!(nowhere.session.applied.zip_codes.is_empty());
    }

    #[test]
    fn area_overview_waits_for_apply() {
        let dashboard = dashboard();
        let initial = dashboard
            .render(ViewKind::AreaOverview, dashboard.initial_session())
            .unwrap();
        assert_eq!(initial.view.result_count, 0);

        let staged = dashboard
            .dispatch(ViewKind::AreaOverview, initial.session, region_click(0, 55.2))
            .unwrap();
        assert_eq!(staged.session.pending.zip_codes, vec![5000]);
        assert!(staged.session.applied.zip_codes.is_empty());
        assert_eq!(staged.view.result_count, 0);

        let applied = dashboard
            .dispatch(
                ViewKind::AreaOverview,
                staged.session,
                DashboardEvent::ApplyButtonPressed,
            )
            .unwrap();
        assert_eq!(applied.session.applied.zip_codes, vec![5000]);
        assert_eq!(applied.view.result_count, 2);
        assert_eq!(applied.view.selected_zip_series[0].zip_code, 5000);
    }

    #[test]
    fn record_clicks_select_and_clear() {
        let dashboard = dashboard();
        let selected = dashboard
            .dispatch(
                ViewKind::SalesSearch,
                dashboard.initial_session(),
                DashboardEvent::MapClicked(MapClick {
                    latitude: 55.6,
                    longitude: 10.2,
                    target: ClickTarget::Record { row: 1 },
                }),
            )
            .unwrap();
        assert_eq!(
            selected.view.selection.as_ref().map(|d| d.record.row),
            Some(1)
        );

        let cleared = dashboard
            .dispatch(
                ViewKind::SalesSearch,
                selected.session,
                DashboardEvent::SelectionCleared,
            )
            .unwrap();
        assert!(cleared.view.selection.is_none());
    }

    #[test]
    fn empty_map_click_selects_nearest_sale() {
        let dashboard = dashboard();
        let update = dashboard
            .dispatch(
                ViewKind::SalesSearch,
                dashboard.initial_session(),
                DashboardEvent::MapClicked(MapClick {
                    latitude: 55.19,
                    longitude: 10.2,
                    target: ClickTarget::Nothing,
                }),
            )
            .unwrap();
        assert_eq!(update.view.selection.map(|d| d.record.row), Some(2));
    }

    #[test]
    fn sale_date_control_spans_dataset() {
        let dashboard = dashboard();
        let span = dashboard.controls().sale_date;
        assert_eq!(span.floor, "2020-06-01".parse().unwrap());
        assert_eq!(span.ceiling, "2020-06-01".parse().unwrap());
    }

    #[test]
    fn total_sales_uses_quarters() {
        let dashboard = dashboard();
        let update = dashboard
            .render(ViewKind::TotalSales, dashboard.initial_session())
            .unwrap();
        assert_eq!(update.view.sales_over_time[0].period.to_string(), "2020-Q2");
    }
}
