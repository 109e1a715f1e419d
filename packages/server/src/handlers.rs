//! HTTP handler functions for the housing dashboard API.

use actix_web::{HttpResponse, web};
use fyn_housing_dashboard::ViewKind;
use fyn_housing_sales_models::PropertyType;
use fyn_housing_server_models::{
    ApiEventRequest, ApiHealth, ApiInitialView, ApiPropertyType, ApiViewInfo, ApiViewResponse,
    ApiZipArea,
};
use fyn_housing_spatial::area_centroid;

use crate::AppState;

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        sales: state.dashboard.context().records().len(),
    })
}

/// `GET /api/views`
///
/// Lists the dashboard pages and their settings.
pub async fn views(state: web::Data<AppState>) -> HttpResponse {
    let views: Vec<ApiViewInfo> = state
        .dashboard
        .config()
        .views
        .iter()
        .map(|(kind, settings)| ApiViewInfo::new(*kind, settings))
        .collect();

    HttpResponse::Ok().json(views)
}

/// `GET /api/views/{view}`
///
/// Returns a fresh session and the view it produces.
pub async fn initial_view(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let Some(kind) = parse_view(&path) else {
        return unknown_view(&path);
    };
    let dashboard = &state.dashboard;

    let (Some(settings), Some(update)) = (
        dashboard.settings(kind),
        dashboard.render(kind, dashboard.initial_session()),
    ) else {
        return unknown_view(&path);
    };

    HttpResponse::Ok().json(ApiInitialView {
        info: ApiViewInfo::new(kind, settings),
        controls: *dashboard.controls(),
        response: ApiViewResponse::from(update),
    })
}

/// `POST /api/views/{view}/events`
///
/// Applies one event to the posted session and returns the recomputed
/// view.
pub async fn view_event(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ApiEventRequest>,
) -> HttpResponse {
    let Some(kind) = parse_view(&path) else {
        return unknown_view(&path);
    };
    let dashboard = &state.dashboard;
    let ApiEventRequest { session, event } = body.into_inner();
    let session = session.unwrap_or_else(|| dashboard.initial_session());

    log::debug!("{kind}: {event:?}");

    match dashboard.dispatch(kind, session, event) {
        Some(update) => HttpResponse::Ok().json(ApiViewResponse::from(update)),
        None => unknown_view(&path),
    }
}

/// `GET /api/zip-areas`
///
/// Lists zip-code areas with their centroid and population.
pub async fn zip_areas(state: web::Data<AppState>) -> HttpResponse {
    let context = state.dashboard.context();
    let areas: Vec<ApiZipArea> = context
        .zip_areas()
        .iter()
        .map(|area| ApiZipArea {
            id: area.id,
            zip_code: area.zip_code,
            name: area.name.clone(),
            label: area.label(),
            centroid: area_centroid(area),
            residences: context.population(area.zip_code),
        })
        .collect();

    HttpResponse::Ok().json(areas)
}

/// `GET /api/property-types`
pub async fn property_types() -> HttpResponse {
    let types: Vec<ApiPropertyType> = PropertyType::all()
        .iter()
        .copied()
        .map(ApiPropertyType::from)
        .collect();

    HttpResponse::Ok().json(types)
}

fn parse_view(id: &str) -> Option<ViewKind> {
    id.parse().ok()
}

fn unknown_view(id: &str) -> HttpResponse {
    log::warn!("Request for unknown view '{id}'");
    HttpResponse::NotFound().json(serde_json::json!({
        "error": format!("Unknown view '{id}'")
    }))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test, web};
    use fyn_housing_dashboard::{Dashboard, DashboardConfig};
    use fyn_housing_dataset::DataContext;
    use fyn_housing_sales_models::{GeoPoint, SaleRecord};
    use serde_json::{Value, json};

    use super::*;
    use crate::configure_api;

    fn sale(row: usize, zip_code: u32, price: u64) -> SaleRecord {
        SaleRecord {
            row,
            address: Some(format!("Torvet {row}")),
            zip_code,
            property_type: PropertyType::House,
            price,
            living_area: Some(110.0),
            lot_size: Some(600.0),
            rooms: Some(4),
            bathrooms: Some(1),
            build_year: Some(1972),
            sale_date: "2021-02-01".parse().unwrap(),
            location: Some(GeoPoint::new(55.4, 10.4)),
        }
    }

    fn state() -> web::Data<AppState> {
        let context = DataContext::new(
            vec![
                sale(0, 5000, 1_000_000),
                sale(1, 5100, 5_000_000),
                sale(2, 5000, 9_500_000),
            ],
            Vec::new(),
            BTreeMap::from([(5000, 2000)]),
        );
        let dashboard =
            Dashboard::new(Arc::new(context), DashboardConfig::builtin().unwrap()).unwrap();
        web::Data::new(AppState {
            dashboard: Arc::new(dashboard),
        })
    }

    #[actix_web::test]
    async fn health_reports_loaded_sales() {
        let app =
            test::init_service(App::new().app_data(state()).configure(configure_api)).await;
        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/health").to_request(),
        )
        .await;
        assert_eq!(body["healthy"], true);
        assert_eq!(body["sales"], 3);
    }

    #[actix_web::test]
    async fn lists_all_views() {
        let app =
            test::init_service(App::new().app_data(state()).configure(configure_api)).await;
        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/views").to_request(),
        )
        .await;
        assert_eq!(body.as_array().map(Vec::len), Some(4));
    }

    #[actix_web::test]
    async fn initial_view_has_session_and_controls() {
        let app =
            test::init_service(App::new().app_data(state()).configure(configure_api)).await;
        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri("/api/views/sales-search")
                .to_request(),
        )
        .await;
        assert_eq!(body["resultCount"], 3);
        assert_eq!(body["info"]["id"], "sales-search");
        assert_eq!(body["controls"]["price"]["ceiling"], 10_000_000);
        assert!(body["session"]["applied"].is_object());
    }

    #[actix_web::test]
    async fn event_recomputes_view() {
        let app =
            test::init_service(App::new().app_data(state()).configure(configure_api)).await;
        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::post()
                .uri("/api/views/sales-search/events")
                .set_json(json!({
                    "event": {
                        "type": "filterChanged",
                        "payload": {"control": "zipCodes", "value": [5000]}
                    }
                }))
                .to_request(),
        )
        .await;
        assert_eq!(body["resultCount"], 2);
        assert_eq!(body["session"]["applied"]["zipCodes"], json!([5000]));
        assert_eq!(body["activeFilters"][0]["control"], "zipCodes");
        assert_eq!(body["zipExtents"][0]["price"]["min"], 1_000_000);
        assert_eq!(body["zipExtents"][0]["price"]["max"], 9_500_000);
        assert_eq!(
            body["view"]["salesByZipAndPeriod"][0]["points"][0]["count"],
            2
        );
    }

    #[actix_web::test]
    async fn unknown_view_is_not_found() {
        let app =
            test::init_service(App::new().app_data(state()).configure(configure_api)).await;
        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/views/nope").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn malformed_event_is_bad_request() {
        let app =
            test::init_service(App::new().app_data(state()).configure(configure_api)).await;
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/views/sales-search/events")
                .set_json(json!({"event": {"type": "teleport"}}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn lists_property_types() {
        let app =
            test::init_service(App::new().app_data(state()).configure(configure_api)).await;
        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/property-types").to_request(),
        )
        .await;
        assert_eq!(body[0]["value"], "House");
    }
}
