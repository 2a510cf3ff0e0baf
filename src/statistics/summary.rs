//! Sale totals for a month.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    Error,
    month::SaleMonth,
    transaction::{Condition, Filter, SalesTotals, aggregate_sales},
};

use super::{MonthQuery, StatisticsState};

/// Route handler for the total sale amount and the number of sold and unsold
/// items.
///
/// Every error is reported as 400 Bad Request with the error message.
pub async fn get_statistics_endpoint(
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

            get_statistics(query.month(), &connection)
        });

    match result {
        Ok(totals) => Json(totals).into_response(),
        Err(error) => error.into_bad_request(),
    }
}

/// Sum the prices and count the sold and unsold items of the sales in
/// `month`, or of all transactions if there is no month.
///
/// Returns all zeros when no transaction matches.
///
/// # Errors
/// Returns a:
/// - [Error::InvalidMonthFormat] if `month` is not formatted `YYYY-MM`,
/// - or [Error::StoreReadError] if there is an SQL error.
pub fn get_statistics(month: Option<&str>, connection: &Connection) -> Result<SalesTotals, Error> {
    let month_condition = month
        .map(SaleMonth::parse)
        .transpose()?
        .map(|month| Condition::DateOfSaleIn(month.range()));

    aggregate_sales(&Filter::all().and_maybe(month_condition), connection)
        .inspect_err(|error| tracing::error!("could not aggregate sales: {error}"))
}
