//! Counts of transactions in fixed price ranges.

use std::ops::Bound;

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::{
    Error,
    month::{SaleMonth, current_year},
    transaction::{Condition, Filter, count_transactions},
};

use super::{MonthQuery, StatisticsState};

/// A price range in the histogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBucket {
    /// The label used as the key in the response, e.g. "101-200".
    pub label: &'static str,
    lower: Bound<f64>,
    upper: Bound<f64>,
}

impl PriceBucket {
    const fn new(label: &'static str, lower: Bound<f64>, upper: Bound<f64>) -> Self {
        Self {
            label,
            lower,
            upper,
        }
    }

    /// Whether `price` falls in this bucket.
    #[cfg(test)]
    pub fn contains(&self, price: f64) -> bool {
        use std::ops::RangeBounds;

        (self.lower, self.upper).contains(&price)
    }

    fn condition(&self) -> Condition {
        Condition::PriceIn(self.lower, self.upper)
    }
}

/// The histogram's price ranges in ascending order.
///
/// The first bucket is [0, 100] and each following bucket starts just above
/// the previous one's upper bound, so every non-negative price falls in
/// exactly one bucket. For whole-number prices the ranges read as the labels
/// say, e.g. 101 is the lowest whole price in "101-200".
pub const PRICE_BUCKETS: [PriceBucket; 10] = [
    PriceBucket::new("0-100", Bound::Included(0.0), Bound::Included(100.0)),
    PriceBucket::new("101-200", Bound::Excluded(100.0), Bound::Included(200.0)),
    PriceBucket::new("201-300", Bound::Excluded(200.0), Bound::Included(300.0)),
    PriceBucket::new("301-400", Bound::Excluded(300.0), Bound::Included(400.0)),
    PriceBucket::new("401-500", Bound::Excluded(400.0), Bound::Included(500.0)),
    PriceBucket::new("501-600", Bound::Excluded(500.0), Bound::Included(600.0)),
    PriceBucket::new("601-700", Bound::Excluded(600.0), Bound::Included(700.0)),
    PriceBucket::new("701-800", Bound::Excluded(700.0), Bound::Included(800.0)),
    PriceBucket::new("801-900", Bound::Excluded(800.0), Bound::Included(900.0)),
    PriceBucket::new("901-above", Bound::Excluded(900.0), Bound::Unbounded),
];

/// Find the bucket for `price`, if it is a non-negative number.
#[cfg(test)]
pub fn bucket_for_price(price: f64) -> Option<&'static PriceBucket> {
    PRICE_BUCKETS.iter().find(|bucket| bucket.contains(price))
}

/// The number of transactions in each price bucket.
///
/// Serializes as a JSON object with the bucket labels as keys, in bucket order.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistogram(Vec<(&'static str, u64)>);

#[cfg(test)]
impl PriceHistogram {
    /// The count for the bucket with `label`.
    pub fn get(&self, label: &str) -> Option<u64> {
        self.0
            .iter()
            .find(|(bucket_label, _)| *bucket_label == label)
            .map(|(_, count)| *count)
    }

    /// The sum of the counts in every bucket.
    pub fn total(&self) -> u64 {
        self.0.iter().map(|(_, count)| count).sum()
    }
}

impl Serialize for PriceHistogram {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, count) in &self.0 {
            map.serialize_entry(label, count)?;
        }
        map.end()
    }
}

/// Route handler for the price histogram.
///
/// Every error, including an invalid month, is reported as 500 Internal
/// Server Error.
pub async fn get_price_histogram_endpoint(
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

            get_price_histogram(query.month(), current_year(), &connection)
        });

    match result {
        Ok(histogram) => Json(histogram).into_response(),
        Err(error) => error.into_server_error("Error generating bar chart data"),
    }
}

/// Count the transactions in each price bucket, optionally only those sold
/// in `month`.
///
/// `month` may be `MM` or `YYYY-MM`, but either way the month is taken to be
/// in `year`; any year in `month` is ignored. Transactions without a price or
/// with a negative price are not counted.
///
/// # Errors
/// Returns a:
/// - [Error::InvalidMonthFormat] if `month` is neither `MM` nor `YYYY-MM`,
/// - or [Error::StoreReadError] if there is an SQL error.
pub fn get_price_histogram(
    month: Option<&str>,
    year: i32,
    connection: &Connection,
) -> Result<PriceHistogram, Error> {
    let month_condition = month
        .map(|month| SaleMonth::parse_in_year(month, year))
        .transpose()?
        .map(|month| Condition::DateOfSaleIn(month.range()));
    let filter = Filter::all().and_maybe(month_condition);

    let mut counts = Vec::with_capacity(PRICE_BUCKETS.len());
    for bucket in &PRICE_BUCKETS {
        let count = count_transactions(&filter.clone().and(bucket.condition()), connection)
            .inspect_err(|error| {
                tracing::error!("could not count transactions in {}: {error}", bucket.label)
            })?;
        counts.push((bucket.label, count));
    }

    Ok(PriceHistogram(counts))
}
