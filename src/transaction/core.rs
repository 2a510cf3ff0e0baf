//! Defines the core data models and database schema for transactions.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    database_id::{DatabaseId, FeedId},
    timestamp::Timestamp,
};

// ============================================================================
// MODELS
// ============================================================================

/// A product sale from the transaction feed, as stored in the database.
///
/// Every field from the feed is optional: the store accepts whatever subset
/// of fields the feed provided.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The store's row key, which defines the natural order of transactions.
    #[serde(rename = "_id")]
    pub key: DatabaseId,
    /// The ID assigned by the feed. Not unique.
    pub id: Option<FeedId>,
    /// The product name.
    pub title: Option<String>,
    /// A longer description of the product.
    pub description: Option<String>,
    /// The sale price.
    pub price: Option<f64>,
    /// The product category, e.g. "electronics".
    pub category: Option<String>,
    /// A URL or path to an image of the product.
    pub image: Option<String>,
    /// Whether the product was sold.
    pub sold: Option<bool>,
    /// When the sale happened.
    pub date_of_sale: Option<Timestamp>,
}

/// A transaction that has not been stored yet.
///
/// Start from [NewTransaction::default] or [NewTransaction::build] and set
/// fields with the builder methods.
///
/// # Examples
///
/// ```ignore
/// use time::macros::datetime;
///
/// let transaction = NewTransaction::build("Mens Cotton Jacket")
///     .price(615.89)
///     .category("men's clothing")
///     .sold(true)
///     .date_of_sale(Timestamp::new(datetime!(2021-10-27 14:59:54 UTC)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    /// The ID assigned by the feed.
    pub id: Option<FeedId>,
    /// The product name.
    pub title: Option<String>,
    /// A longer description of the product.
    pub description: Option<String>,
    /// The sale price.
    pub price: Option<f64>,
    /// The product category.
    pub category: Option<String>,
    /// A URL or path to an image of the product.
    pub image: Option<String>,
    /// Whether the product was sold.
    pub sold: Option<bool>,
    /// When the sale happened.
    pub date_of_sale: Option<Timestamp>,
}

impl NewTransaction {
    /// Start a new transaction with a title and every other field unset.
    pub fn build(title: &str) -> Self {
        Self {
            title: Some(title.to_owned()),
            ..Default::default()
        }
    }

    /// Set the feed ID.
    pub fn id(mut self, id: FeedId) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the description.
    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_owned());
        self
    }

    /// Set the sale price.
    pub fn price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// Set the category.
    pub fn category(mut self, category: &str) -> Self {
        self.category = Some(category.to_owned());
        self
    }

    /// Set the image URL.
    pub fn image(mut self, image: &str) -> Self {
        self.image = Some(image.to_owned());
        self
    }

    /// Set whether the product was sold.
    pub fn sold(mut self, sold: bool) -> Self {
        self.sold = Some(sold);
        self
    }

    /// Set the date of sale.
    pub fn date_of_sale(mut self, date_of_sale: Timestamp) -> Self {
        self.date_of_sale = Some(date_of_sale);
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// The transaction table's columns in the order [map_transaction_row] reads them.
pub(crate) const TRANSACTION_COLUMNS: &str =
    "key, feed_id, title, description, price, category, image, sold, date_of_sale";

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                key INTEGER PRIMARY KEY AUTOINCREMENT,
                feed_id INTEGER,
                title TEXT,
                description TEXT,
                price REAL,
                category TEXT,
                image TEXT,
                sold INTEGER,
                date_of_sale TEXT
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_date_of_sale ON \"transaction\"(date_of_sale);",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_category ON \"transaction\"(category);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        key: row.get(0)?,
        id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        price: row.get(4)?,
        category: row.get(5)?,
        image: row.get(6)?,
        sold: row.get(7)?,
        date_of_sale: row.get(8)?,
    })
}
