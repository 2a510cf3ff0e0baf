//! Salesboard is a small JSON API over a feed of product sale transactions.
//!
//! The API ingests the feed into a SQLite store and serves a paginated,
//! searchable transaction listing plus three month-filterable statistics
//! views: sale totals, a price-range histogram and a category histogram.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde::Serialize;
use tokio::signal;

mod app_state;
mod database_id;
mod db;
mod endpoints;
mod ingest;
mod logging;
mod month;
mod pagination;
mod routing;
mod statistics;
mod timestamp;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::{AppState, DEFAULT_FEED_URL};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use timestamp::Timestamp;
pub use transaction::{NewTransaction, Transaction, insert_many};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The month query parameter did not have the expected shape.
    ///
    /// `expected` describes the accepted format(s), e.g. "YYYY-MM". `input` is
    /// kept for logging and is not shown to the client.
    #[error("Invalid month format. Use {expected}.")]
    InvalidMonthFormat {
        /// The month string sent by the client.
        input: String,
        /// A human readable description of the accepted format(s).
        expected: &'static str,
    },

    /// The page number or page size was less than one.
    #[error("page and per_page must be positive integers")]
    InvalidPagination,

    /// The query string could not be parsed, e.g. a non-numeric page number.
    #[error("invalid query parameters: {0}")]
    InvalidQuery(String),

    /// The transaction feed could not be fetched or was not a JSON array.
    ///
    /// The error string should only be logged on the server.
    #[error("could not fetch the transaction feed: {0}")]
    UpstreamFetchError(String),

    /// Transactions could not be written to the store.
    #[error("could not write to the store: {0}")]
    StoreWriteError(rusqlite::Error),

    /// An unhandled/unexpected SQL error while reading from the store.
    #[error("could not read from the store: {0}")]
    StoreReadError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

/// Store read failures are logged where they happen, not here.
impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        Error::StoreReadError(value)
    }
}

/// The JSON body sent to clients when a request fails.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

/// Create a JSON error response with the body `{"error": message}`.
pub(crate) fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorBody { error: message })).into_response()
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::InvalidMonthFormat { .. } | Error::InvalidPagination | Error::InvalidQuery(_) => {
                error_response(StatusCode::BAD_REQUEST, &self.to_string())
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::debug!("An unexpected error occurred: {}", error);
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred, check the server logs for more details.",
                )
            }
        }
    }
}

impl Error {
    /// Respond with 400 Bad Request and the error's own message, whatever the
    /// cause.
    ///
    /// Used by the listing and summary endpoints, which report every failure
    /// to the client as a bad request.
    fn into_bad_request(self) -> Response {
        tracing::debug!("responding with bad request: {}", self);
        error_response(StatusCode::BAD_REQUEST, &self.to_string())
    }

    /// Respond with 500 Internal Server Error and the generic `message`,
    /// whatever the cause.
    ///
    /// Used by the ingestion and chart endpoints, which hide the cause of
    /// every failure from the client.
    fn into_server_error(self, message: &str) -> Response {
        tracing::debug!("responding with \"{message}\": {}", self);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}
