//! Fetches the remote transaction feed and saves it to the database.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    AppState, Error,
    timestamp::Timestamp,
    transaction::{NewTransaction, insert_many},
};

/// The state needed for ingesting the feed.
#[derive(Debug, Clone)]
pub struct IngestState {
    /// The database connection for storing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The client used to fetch the feed.
    pub http_client: reqwest::Client,
    /// The URL of the JSON feed.
    pub feed_url: String,
}

impl FromRef<AppState> for IngestState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            http_client: state.http_client.clone(),
            feed_url: state.feed_url.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct IngestResponse {
    message: &'static str,
}

/// Route handler that fetches the feed once and saves every transaction in it.
///
/// Calling this twice stores every transaction twice. Errors are reported as
/// 500 Internal Server Error.
pub async fn fetch_and_save_data_endpoint(State(state): State<IngestState>) -> Response {
    match fetch_and_store(&state).await {
        Ok(_) => Json(IngestResponse {
            message: "Data fetched and saved successfully",
        })
        .into_response(),
        Err(error) => error.into_server_error("Error fetching and saving data"),
    }
}

/// Fetch the feed and insert its transactions, returning how many were
/// inserted.
///
/// Nothing is retried.
///
/// # Errors
/// Returns a:
/// - [Error::UpstreamFetchError] if the feed could not be fetched or parsed,
/// - or [Error::StoreWriteError] if the transactions could not be saved.
pub async fn fetch_and_store(state: &IngestState) -> Result<usize, Error> {
    let start_time = std::time::Instant::now();
    let transactions = fetch_feed(&state.http_client, &state.feed_url).await?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let inserted = insert_many(&transactions, &connection)
        .inspect_err(|error| tracing::error!("could not save feed transactions: {error}"))?;

    tracing::info!(
        "Saved {inserted} transactions from {} in {}ms",
        state.feed_url,
        start_time.elapsed().as_millis()
    );

    Ok(inserted)
}

/// Fetch the feed at `url` and parse it as a list of transactions.
///
/// # Errors
/// Returns [Error::UpstreamFetchError] if the request fails, the response
/// status is not a success, or the body is not a JSON array of objects.
pub async fn fetch_feed(client: &reqwest::Client, url: &str) -> Result<Vec<NewTransaction>, Error> {
    let upstream_error = |error: reqwest::Error| {
        tracing::error!("could not fetch feed from {url}: {error}");
        Error::UpstreamFetchError(error.to_string())
    };

    let records: Vec<Map<String, Value>> = client
        .get(url)
        .send()
        .await
        .map_err(upstream_error)?
        .error_for_status()
        .map_err(upstream_error)?
        .json()
        .await
        .map_err(upstream_error)?;

    tracing::debug!("Fetched {} records from {url}", records.len());

    Ok(records.iter().map(parse_feed_record).collect())
}

/// Convert a feed object to a transaction, keeping the fields that have the
/// expected type.
///
/// Missing and null fields are left unset. Numbers and booleans sent as
/// strings are converted. Fields that cannot be converted are logged and
/// left unset.
fn parse_feed_record(record: &Map<String, Value>) -> NewTransaction {
    NewTransaction {
        id: field(record, "id", |value| match value {
            Value::Number(number) => number.as_i64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }),
        title: field(record, "title", as_string),
        description: field(record, "description", as_string),
        price: field(record, "price", |value| match value {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }),
        category: field(record, "category", as_string),
        image: field(record, "image", as_string),
        sold: field(record, "sold", |value| match value {
            Value::Bool(sold) => Some(*sold),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }),
        date_of_sale: field(record, "dateOfSale", |value| {
            value
                .as_str()
                .and_then(|text| Timestamp::parse(text.trim()).ok())
        }),
    }
}

fn as_string(value: &Value) -> Option<String> {
    value.as_str().map(str::to_owned)
}

fn field<T>(
    record: &Map<String, Value>,
    name: &str,
    convert: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    match record.get(name) {
        None | Some(Value::Null) => None,
        Some(value) => {
            let converted = convert(value);
            if converted.is_none() {
                tracing::warn!("ignoring feed field \"{name}\" with unexpected value {value}");
            }
            converted
        }
    }
}
