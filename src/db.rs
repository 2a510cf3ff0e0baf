//! Sets up the application's SQLite database.

use rusqlite::{Connection, Transaction as SqlTransaction, functions::FunctionFlags};

use crate::{Error, transaction::create_transaction_table};

/// The SQL name of [fold_case], registered on every connection by [initialize].
pub(crate) const FOLD_CASE_FUNCTION: &str = "fold_case";

/// Fold `text` to lower case using Unicode rules, so "ÉCLAIR" and "éclair"
/// compare equal.
pub(crate) fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Register the SQL functions used by the transaction queries.
///
/// Functions live on the connection, not in the database file, so this must
/// run for every new connection.
fn register_functions(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.create_scalar_function(
        FOLD_CASE_FUNCTION,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |context| {
            let text: Option<String> = context.get(0)?;
            Ok(text.map(|text| fold_case(&text)))
        },
    )
}

/// Register the connection's SQL functions, then create the tables and
/// indexes for the domain models.
///
/// Safe to call on a database that has already been initialized.
///
/// # Errors
/// Returns [Error::StoreWriteError] if the functions could not be registered
/// or the schema could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    register_functions(connection).map_err(Error::StoreWriteError)?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)
            .map_err(Error::StoreWriteError)?;

    create_transaction_table(&transaction).map_err(Error::StoreWriteError)?;

    transaction.commit().map_err(Error::StoreWriteError)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::{fold_case, initialize};

    #[test]
    fn initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize(&conn).expect("first initialization failed");
        initialize(&conn).expect("second initialization failed");

        let table_count: u32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'transaction'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(table_count, 1);
    }

    #[test]
    fn fold_case_handles_non_ascii_letters() {
        assert_eq!(fold_case("ÉCLAIR Maker"), "éclair maker");
        assert_eq!(fold_case("ÄRGER"), fold_case("ärger"));
    }

    #[test]
    fn registers_fold_case_function() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let got: Option<String> = conn
            .query_row("SELECT fold_case('Ärger'), fold_case(NULL)", [], |row| {
                assert_eq!(row.get::<_, Option<String>>(1)?, None);
                row.get(0)
            })
            .unwrap();

        assert_eq!(got.as_deref(), Some("ärger"));
    }
}
