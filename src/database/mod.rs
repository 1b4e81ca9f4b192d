//! Suma database layer.
//!
//! SQLite connection management and schema migrations. The only durable state
//! is the key-value preferences table.
//!
//! ```no_run
//! use suma::database::Database;
//!
//! let db = Database::open("suma.db").expect("failed to open database");
//! let conn = db.connection();
//! ```

pub mod connection;
pub mod migrations;

pub use connection::Database;
