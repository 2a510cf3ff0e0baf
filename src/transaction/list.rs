//! Defines the route handler for listing and searching transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State, rejection::QueryRejection},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    month::SaleMonth,
    pagination::{Page, PaginationConfig},
};

use super::{
    core::Transaction,
    filter::{Condition, Filter},
    store::{count_transactions, find_transactions},
};

/// The query parameters for listing transactions.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Only list sales in this month, formatted `YYYY-MM`.
    pub month: Option<String>,
    /// Only list transactions whose title or description contains this text.
    pub search: Option<String>,
    /// The 1-based page number.
    pub page: Option<u64>,
    /// The maximum number of transactions per page.
    pub per_page: Option<u64>,
}

/// One page of transactions and the number of transactions on all pages.
#[derive(Debug, PartialEq, Serialize)]
pub struct TransactionPage {
    /// The transactions on the requested page.
    pub transactions: Vec<Transaction>,
    /// The number of transactions that matched, across all pages.
    pub total_items: u64,
}

/// The state needed for listing transactions.
#[derive(Debug, Clone)]
pub struct ListTransactionsState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The config that controls the default page and page size.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for ListTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// Route handler for listing transactions a page at a time.
///
/// Every error is reported as 400 Bad Request with the error message.
pub async fn list_transactions_endpoint(
    State(state): State<ListTransactionsState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Response {
    let result = query
        .map_err(|rejection| Error::InvalidQuery(rejection.body_text()))
        .and_then(|Query(query)| {
            let connection = state
                .db_connection
                .lock()
                .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
                .map_err(|_| Error::DatabaseLockError)?;

            list_transactions(&query, &state.pagination_config, &connection)
        });

    match result {
        Ok(page) => Json(page).into_response(),
        Err(error) => error.into_bad_request(),
    }
}

/// Get a page of the transactions that match the month and search text in
/// `query`, plus the number of matching transactions on all pages.
///
/// Empty `month` and `search` values are ignored.
///
/// # Errors
/// Returns a:
/// - [Error::InvalidMonthFormat] if `month` is not formatted `YYYY-MM`,
/// - or [Error::InvalidPagination] if the page number or size is zero,
/// - or [Error::StoreReadError] if there is an SQL error.
pub fn list_transactions(
    query: &ListQuery,
    pagination_config: &PaginationConfig,
    connection: &Connection,
) -> Result<TransactionPage, Error> {
    let month_condition = non_empty(&query.month)
        .map(SaleMonth::parse)
        .transpose()?
        .map(|month| Condition::DateOfSaleIn(month.range()));
    let search_condition = non_empty(&query.search)
        .map(|search| Condition::TitleOrDescriptionContains(search.to_owned()));
    let page = Page::new(query.page, query.per_page, pagination_config)?;

    let filter = Filter::all()
        .and_maybe(month_condition)
        .and_maybe(search_condition);

    let total_items = count_transactions(&filter, connection)
        .inspect_err(|error| tracing::error!("could not count transactions: {error}"))?;
    let transactions = find_transactions(&filter, page.limit(), page.offset(), connection)
        .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?;

    Ok(TransactionPage {
        transactions,
        total_items,
    })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod list_transactions_tests {
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        Error,
        db::initialize,
        pagination::PaginationConfig,
        timestamp::Timestamp,
        transaction::{NewTransaction, insert_many},
    };

    use super::{ListQuery, list_transactions};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn insert_numbered(count: i64, conn: &Connection) {
        let transactions: Vec<_> = (1..=count)
            .map(|i| {
                NewTransaction::build(&format!("Gadget #{i}"))
                    .id(i)
                    .date_of_sale(Timestamp::new(datetime!(2022-05-15 12:00 UTC)))
            })
            .collect();
        insert_many(&transactions, conn).unwrap();
    }

    #[test]
    fn second_page_of_twenty_five() {
        let conn = get_test_connection();
        insert_numbered(25, &conn);
        let query = ListQuery {
            page: Some(2),
            per_page: Some(10),
            ..Default::default()
        };

        let got = list_transactions(&query, &PaginationConfig::default(), &conn).unwrap();

        let got_ids: Vec<_> = got.transactions.iter().filter_map(|t| t.id).collect();
        assert_eq!(got_ids, (11..=20).collect::<Vec<_>>());
        assert_eq!(got.total_items, 25);
    }

    #[test]
    fn last_page_is_partial() {
        let conn = get_test_connection();
        insert_numbered(25, &conn);
        let query = ListQuery {
            page: Some(3),
            ..Default::default()
        };

        let got = list_transactions(&query, &PaginationConfig::default(), &conn).unwrap();

        assert_eq!(got.transactions.len(), 5);
        assert_eq!(got.total_items, 25);
    }

    #[test]
    fn month_and_search_must_both_match() {
        let conn = get_test_connection();
        insert_many(
            &[
                NewTransaction::build("Widget")
                    .date_of_sale(Timestamp::new(datetime!(2022-05-01 00:00 UTC))),
                NewTransaction::build("Widget")
                    .date_of_sale(Timestamp::new(datetime!(2022-06-01 00:00 UTC))),
                NewTransaction::build("Sprocket")
                    .date_of_sale(Timestamp::new(datetime!(2022-05-31 23:59:59.999 UTC))),
            ],
            &conn,
        )
        .unwrap();
        let query = ListQuery {
            month: Some("2022-05".to_owned()),
            search: Some("wid".to_owned()),
            ..Default::default()
        };

        let got = list_transactions(&query, &PaginationConfig::default(), &conn).unwrap();

        assert_eq!(got.total_items, 1);
        assert_eq!(got.transactions[0].title.as_deref(), Some("Widget"));
        assert_eq!(
            got.transactions[0].date_of_sale,
            Some(Timestamp::new(datetime!(2022-05-01 00:00 UTC)))
        );
    }

    #[test]
    fn empty_month_and_search_are_ignored() {
        let conn = get_test_connection();
        insert_numbered(3, &conn);
        let query = ListQuery {
            month: Some(String::new()),
            search: Some(String::new()),
            ..Default::default()
        };

        let got = list_transactions(&query, &PaginationConfig::default(), &conn).unwrap();

        assert_eq!(got.total_items, 3);
    }

    #[test]
    fn invalid_month_fails() {
        let conn = get_test_connection();

        for month in ["2024-13", "abc"] {
            let query = ListQuery {
                month: Some(month.to_owned()),
                ..Default::default()
            };

            let got = list_transactions(&query, &PaginationConfig::default(), &conn);

            assert_eq!(
                got,
                Err(Error::InvalidMonthFormat {
                    input: month.to_owned(),
                    expected: "YYYY-MM",
                })
            );
        }
    }

    #[test]
    fn page_zero_fails() {
        let conn = get_test_connection();
        let query = ListQuery {
            page: Some(0),
            ..Default::default()
        };

        let got = list_transactions(&query, &PaginationConfig::default(), &conn);

        assert_eq!(got, Err(Error::InvalidPagination));
    }
}
