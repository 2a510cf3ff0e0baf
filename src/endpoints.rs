//! The API endpoints URIs.

/// The root route which reports that the server is up.
pub const ROOT: &str = "/";
/// The route that fetches the transaction feed and saves it.
pub const FETCH_AND_SAVE: &str = "/fetch-and-save-data";
/// The route for listing and searching transactions a page at a time.
pub const LIST_TRANSACTIONS: &str = "/list-transactions";
/// The route for the sale totals of a month.
pub const STATISTICS: &str = "/statistics";
/// The route for the price range histogram.
pub const BAR_CHART: &str = "/bar-chart";
/// The route for the category histogram.
pub const PIE_CHART: &str = "/pie-chart";
