//! Aggregate views over transactions, optionally filtered by month.
//!
//! - Summary: total sale amount and sold/not sold counts
//! - Price histogram: transaction counts in ten price ranges
//! - Category histogram: transaction counts per category

mod category_histogram;
mod price_histogram;
mod summary;

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;
use serde::Deserialize;

use crate::AppState;

pub use category_histogram::get_category_histogram_endpoint;
pub use price_histogram::get_price_histogram_endpoint;
pub use summary::get_statistics_endpoint;

/// The query parameters shared by the statistics endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    /// Only include sales in this month. The accepted format depends on the endpoint.
    pub month: Option<String>,
}

impl MonthQuery {
    /// The month, unless it is missing or empty.
    fn month(&self) -> Option<&str> {
        self.month.as_deref().filter(|month| !month.is_empty())
    }
}

/// The state needed for the statistics endpoints.
#[derive(Debug, Clone)]
pub struct StatisticsState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for StatisticsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}
