//! Reads and writes transactions in the database.

use rusqlite::{Connection, Row, params_from_iter};
use serde::Serialize;

use crate::Error;

use super::{
    core::{NewTransaction, TRANSACTION_COLUMNS, Transaction, map_transaction_row},
    filter::Filter,
};

/// Sale totals over a set of transactions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesTotals {
    /// The sum of the prices of all transactions.
    pub total_sale_amount: f64,
    /// The number of transactions that were sold.
    pub total_sold_items: u64,
    /// The number of transactions that were not sold.
    pub total_not_sold_items: u64,
}

/// Insert many transactions at once.
///
/// Either every transaction is inserted or none is. Transactions are not
/// deduplicated: inserting the same feed twice stores every record twice.
///
/// # Errors
/// Returns [Error::StoreWriteError] if any insert fails.
pub fn insert_many(
    transactions: &[NewTransaction],
    connection: &Connection,
) -> Result<usize, Error> {
    let tx = connection
        .unchecked_transaction()
        .map_err(Error::StoreWriteError)?;

    {
        let mut stmt = tx
            .prepare(
                "INSERT INTO \"transaction\"
                 (feed_id, title, description, price, category, image, sold, date_of_sale)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .map_err(Error::StoreWriteError)?;

        for transaction in transactions {
            stmt.execute((
                transaction.id,
                &transaction.title,
                &transaction.description,
                transaction.price,
                &transaction.category,
                &transaction.image,
                transaction.sold,
                transaction.date_of_sale,
            ))
            .map_err(Error::StoreWriteError)?;
        }
    }

    tx.commit().map_err(Error::StoreWriteError)?;

    Ok(transactions.len())
}

/// Count the transactions that match `filter`.
///
/// # Errors
/// Returns [Error::StoreReadError] if there is an SQL error.
pub fn count_transactions(filter: &Filter, connection: &Connection) -> Result<u64, Error> {
    let clause = filter.to_where_clause();
    let query = format!("SELECT COUNT(*) FROM \"transaction\"{}", clause.sql);

    let count = connection.query_row(&query, params_from_iter(clause.params.iter()), |row| {
        get_count(row, 0)
    })?;

    Ok(count)
}

/// Get the transactions that match `filter` in natural order, skipping the
/// first `offset` and returning at most `limit`.
///
/// # Errors
/// Returns [Error::StoreReadError] if there is an SQL error.
pub fn find_transactions(
    filter: &Filter,
    limit: u64,
    offset: u64,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let mut clause = filter.to_where_clause();
    let query = format!(
        "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"{} ORDER BY key ASC LIMIT ? OFFSET ?",
        clause.sql
    );
    clause
        .params
        .push(Box::new(i64::try_from(limit).unwrap_or(i64::MAX)));
    clause
        .params
        .push(Box::new(i64::try_from(offset).unwrap_or(i64::MAX)));

    connection
        .prepare(&query)?
        .query_map(params_from_iter(clause.params.iter()), map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::StoreReadError))
        .collect()
}

/// Sum the prices and count the sold and unsold transactions that match
/// `filter`.
///
/// Returns all zeros if nothing matches.
///
/// # Errors
/// Returns [Error::StoreReadError] if there is an SQL error.
pub fn aggregate_sales(filter: &Filter, connection: &Connection) -> Result<SalesTotals, Error> {
    let clause = filter.to_where_clause();
    let query = format!(
        "SELECT COALESCE(SUM(price), 0.0), COALESCE(SUM(sold = 1), 0), COALESCE(SUM(sold = 0), 0) \
        FROM \"transaction\"{}",
        clause.sql
    );

    let totals = connection.query_row(&query, params_from_iter(clause.params.iter()), |row| {
        Ok(SalesTotals {
            total_sale_amount: row.get(0)?,
            total_sold_items: get_count(row, 1)?,
            total_not_sold_items: get_count(row, 2)?,
        })
    })?;

    Ok(totals)
}

/// Read a non-negative SQL integer as a count.
fn get_count(row: &Row, index: usize) -> Result<u64, rusqlite::Error> {
    let count: i64 = row.get(index)?;

    u64::try_from(count).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(index, count))
}

/// Get the distinct, non-null categories of the transactions that match
/// `filter`, sorted.
///
/// # Errors
/// Returns [Error::StoreReadError] if there is an SQL error.
pub fn distinct_categories(filter: &Filter, connection: &Connection) -> Result<Vec<String>, Error> {
    let clause = filter.to_where_clause();
    let not_null = if clause.sql.is_empty() {
        " WHERE category IS NOT NULL"
    } else {
        " AND category IS NOT NULL"
    };
    let query = format!(
        "SELECT DISTINCT category FROM \"transaction\"{}{not_null} ORDER BY category ASC",
        clause.sql
    );

    connection
        .prepare(&query)?
        .query_map(params_from_iter(clause.params.iter()), |row| row.get(0))?
        .map(|category_result| category_result.map_err(Error::StoreReadError))
        .collect()
}
