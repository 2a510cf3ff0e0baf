//! Application router configuration.

use axum::{
    Router,
    http::StatusCode,
    response::Response,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use crate::{
    AppState, endpoints, error_response,
    ingest::fetch_and_save_data_endpoint,
    statistics::{
        get_category_histogram_endpoint, get_price_histogram_endpoint, get_statistics_endpoint,
    },
    transaction::list_transactions_endpoint,
};

/// Return a router with all the app's routes.
///
/// Cross-origin requests are allowed from any origin.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::ROOT, get(get_liveness))
        .route(endpoints::FETCH_AND_SAVE, post(fetch_and_save_data_endpoint))
        .route(endpoints::LIST_TRANSACTIONS, get(list_transactions_endpoint))
        .route(endpoints::STATISTICS, get(get_statistics_endpoint))
        .route(endpoints::BAR_CHART, get(get_price_histogram_endpoint))
        .route(endpoints::PIE_CHART, get(get_category_histogram_endpoint))
        .fallback(get_404_not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// The root path '/' reports that the server is running.
async fn get_liveness() -> &'static str {
    "server working"
}

async fn get_404_not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "not found")
}

#[cfg(test)]
mod routing_tests {
    use axum::http::{HeaderName, HeaderValue, StatusCode};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;
    use time::macros::datetime;

    use crate::{
        AppState, DEFAULT_FEED_URL, endpoints,
        timestamp::Timestamp,
        transaction::{NewTransaction, insert_many},
    };

    use super::build_router;

    fn get_test_server() -> TestServer {
        let state = AppState::new(Connection::open_in_memory().unwrap(), DEFAULT_FEED_URL)
            .expect("Could not create app state.");
        {
            let conn = state.db_connection.lock().unwrap();
            insert_many(
                &[
                    NewTransaction::build("Backpack")
                        .price(329.85)
                        .category("men's clothing")
                        .sold(false)
                        .date_of_sale(Timestamp::new(datetime!(2021-11-27 14:59:54 UTC))),
                    NewTransaction::build("Ring")
                        .price(9.99)
                        .category("jewelery")
                        .sold(true)
                        .date_of_sale(Timestamp::new(datetime!(2021-11-02 08:00 UTC))),
                ],
                &conn,
            )
            .unwrap();
        }

        TestServer::new(build_router(state))
    }

    #[tokio::test]
    async fn root_reports_liveness() {
        let server = get_test_server();

        let response = server.get(endpoints::ROOT).await;

        response.assert_status_ok();
        response.assert_text("server working");
    }

    #[tokio::test]
    async fn routes_every_read_endpoint() {
        let server = get_test_server();

        let list = server.get(endpoints::LIST_TRANSACTIONS).await;
        let statistics = server
            .get(endpoints::STATISTICS)
            .add_query_param("month", "2021-11")
            .await;
        let bar_chart = server.get(endpoints::BAR_CHART).await;
        let pie_chart = server.get(endpoints::PIE_CHART).await;

        list.assert_status_ok();
        assert_eq!(list.json::<serde_json::Value>()["total_items"], 2);
        statistics.assert_status_ok();
        assert_eq!(statistics.json::<serde_json::Value>()["totalSoldItems"], 1);
        bar_chart.assert_status_ok();
        assert_eq!(bar_chart.json::<serde_json::Value>()["301-400"], 1);
        pie_chart.assert_status_ok();
        pie_chart.assert_json(&json!({"jewelery": 1, "men's clothing": 1}));
    }

    #[tokio::test]
    async fn fetch_requires_post() {
        let server = get_test_server();

        let response = server.get(endpoints::FETCH_AND_SAVE).await;

        response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn unknown_route_is_json_not_found() {
        let server = get_test_server();

        let response = server.get("/does-not-exist").await;

        response.assert_status_not_found();
        response.assert_json(&json!({"error": "not found"}));
    }

    #[tokio::test]
    async fn allows_any_origin() {
        let server = get_test_server();

        let response = server
            .get(endpoints::ROOT)
            .add_header(
                HeaderName::from_static("origin"),
                HeaderValue::from_static("http://localhost:3000"),
            )
            .await;

        response.assert_status_ok();
        assert_eq!(response.header("access-control-allow-origin"), "*");
    }
}
