//! Transactions from the product sale feed.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `NewTransaction` for creating transactions
//! - Filters and database functions for storing and querying transactions
//! - The route handler for listing and searching transactions

mod core;
mod filter;
mod list;
mod store;

pub use core::{NewTransaction, Transaction, create_transaction_table};
pub use filter::{Condition, Filter};
pub use list::list_transactions_endpoint;
pub use store::{
    SalesTotals, aggregate_sales, count_transactions, distinct_categories, insert_many,
};
