//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{Error, db::initialize, pagination::PaginationConfig};

/// The URL of the product transaction feed used when none is configured.
pub const DEFAULT_FEED_URL: &str = "https://s3.amazonaws.com/roxiler.com/product_transaction.json";

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The config that controls the default page and page size.
    pub pagination_config: PaginationConfig,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// The URL the transaction feed is fetched from.
    pub feed_url: String,

    /// The client used to fetch the transaction feed.
    pub http_client: reqwest::Client,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the transaction table.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_connection: Connection, feed_url: &str) -> Result<Self, Error> {
        initialize(&db_connection)?;

        let connection = Arc::new(Mutex::new(db_connection));

        Ok(Self {
            pagination_config: PaginationConfig::default(),
            db_connection: connection,
            feed_url: feed_url.to_owned(),
            http_client: reqwest::Client::new(),
        })
    }
}
