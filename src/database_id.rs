//! Database ID type definitions.

/// Alias for the integer type used for the store's own row keys.
///
/// Row keys are assigned by the store on insert and define the natural order
/// of transactions.
pub type DatabaseId = i64;

/// Alias for the integer ID that the feed assigns to a transaction.
///
/// Unlike [DatabaseId], feed IDs are not unique in the store: ingesting the
/// feed twice stores every feed ID twice.
pub type FeedId = i64;
