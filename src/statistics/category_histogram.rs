//! Counts of transactions per category.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    Error,
    transaction::{Condition, Filter, count_transactions, distinct_categories},
};

use super::{MonthQuery, StatisticsState};

/// The number of transactions in each category, keyed by category name.
pub type CategoryHistogram = BTreeMap<String, u64>;

/// Route handler for the category histogram.
///
/// Errors are reported as 500 Internal Server Error.
pub async fn get_category_histogram_endpoint(
    State(state): State<StatisticsState>,
    query: Result<Query<MonthQuery>, QueryRejection>,
) -> Response {
    let result = query
        .map_err(|rejection| Error::InvalidQuery(rejection.body_text()))
        .and_then(|Query(query)| {
            let connection = state
                .db_connection
                .lock()
                .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
                .map_err(|_| Error::DatabaseLockError)?;

            get_category_histogram(query.month(), &connection)
        });

    match result {
        Ok(histogram) => Json(histogram).into_response(),
        Err(error) => error.into_server_error("Error generating pie chart data"),
    }
}

/// Count the transactions in each category.
///
/// Unlike the other statistics, `month` is not parsed as a calendar month:
/// it is matched, ignoring ASCII case, as a substring of the stored date of
/// sale (e.g. `2021-11-27T14:59:54.000Z`). "2021-11" therefore selects
/// November 2021, while "11" also selects any date with "11" in the day or
/// time. Transactions without a category are not counted.
///
/// # Errors
/// Returns [Error::StoreReadError] if there is an SQL error.
pub fn get_category_histogram(
    month: Option<&str>,
    connection: &Connection,
) -> Result<CategoryHistogram, Error> {
    let filter = Filter::all()
        .and_maybe(month.map(|month| Condition::DateOfSaleContains(month.to_owned())));

    let categories = distinct_categories(&filter, connection)
        .inspect_err(|error| tracing::error!("could not get categories: {error}"))?;

    let mut histogram = CategoryHistogram::new();
    for category in categories {
        let count = count_transactions(
            &filter.clone().and(Condition::CategoryIs(category.clone())),
            connection,
        )
        .inspect_err(|error| {
            tracing::error!("could not count transactions in category {category}: {error}")
        })?;
        histogram.insert(category, count);
    }

    Ok(histogram)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::get};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        db::initialize,
        endpoints,
        statistics::StatisticsState,
        timestamp::Timestamp,
        transaction::{Filter, NewTransaction, count_transactions, insert_many},
    };

    use super::{get_category_histogram, get_category_histogram_endpoint};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        insert_many(
            &[
                NewTransaction::build("Laptop")
                    .category("electronics")
                    .date_of_sale(Timestamp::new(datetime!(2021-11-27 14:59:54 UTC))),
                NewTransaction::build("Monitor")
                    .category("electronics")
                    .date_of_sale(Timestamp::new(datetime!(2022-01-05 10:00 UTC))),
                NewTransaction::build("Ring")
                    .category("jewelery")
                    .date_of_sale(Timestamp::new(datetime!(2021-11-02 08:00 UTC))),
                NewTransaction::build("Jacket")
                    .category("men's clothing")
                    .date_of_sale(Timestamp::new(datetime!(2022-03-11 11:11 UTC))),
            ],
            &conn,
        )
        .unwrap();
        conn
    }

    #[test]
    fn counts_every_category() {
        let conn = get_test_connection();

        let got = get_category_histogram(None, &conn).unwrap();

        assert_eq!(got.get("electronics"), Some(&2));
        assert_eq!(got.get("jewelery"), Some(&1));
        assert_eq!(got.get("men's clothing"), Some(&1));
        assert_eq!(got.len(), 3);
    }

    #[test]
    fn counts_sum_to_total() {
        let conn = get_test_connection();

        let got = get_category_histogram(None, &conn).unwrap();
        let total = count_transactions(&Filter::all(), &conn).unwrap();

        assert_eq!(got.values().sum::<u64>(), total);
    }

    #[test]
    fn month_is_a_substring_of_the_stored_date() {
        let conn = get_test_connection();

        let november = get_category_histogram(Some("2021-11"), &conn).unwrap();
        let elevens = get_category_histogram(Some("11"), &conn).unwrap();

        assert_eq!(november.get("electronics"), Some(&1));
        assert_eq!(november.get("jewelery"), Some(&1));
        assert_eq!(november.len(), 2);
        // "2022-03-11T11:11" contains "11" but is not in November.
        assert_eq!(elevens.get("men's clothing"), Some(&1));
    }

    #[test]
    fn categories_with_no_matches_are_left_out() {
        let conn = get_test_connection();

        let got = get_category_histogram(Some("1999"), &conn).unwrap();

        assert!(got.is_empty());
    }

    #[tokio::test]
    async fn endpoint_responds_with_category_counts() {
        let state = StatisticsState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        };
        let app = Router::new()
            .route(endpoints::PIE_CHART, get(get_category_histogram_endpoint))
            .with_state(state);
        let server = TestServer::new(app);

        let response = server
            .get(endpoints::PIE_CHART)
            .add_query_param("month", "2022")
            .await;

        response.assert_status_ok();
        response.assert_json(&serde_json::json!({
            "electronics": 1,
            "men's clothing": 1,
        }));
    }

    #[tokio::test]
    async fn missing_table_is_server_error() {
        let state = StatisticsState {
            db_connection: Arc::new(Mutex::new(Connection::open_in_memory().unwrap())),
        };
        let app = Router::new()
            .route(endpoints::PIE_CHART, get(get_category_histogram_endpoint))
            .with_state(state);
        let server = TestServer::new(app);

        let response = server
            .get(endpoints::PIE_CHART)
            .add_query_param("month", "2022")
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        response.assert_json(&serde_json::json!({"error": "Error generating pie chart data"}));
    }
}
