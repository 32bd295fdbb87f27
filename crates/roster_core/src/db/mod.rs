//! SQLite connection bootstrap for the roster mapper.
//!
//! # Responsibility
//! - Open and configure the SQLite connection every repository borrows.
//! - Define the transport error shared by all persistence layers.
//!
//! # Invariants
//! - The connection is an explicit dependency; nothing in core keeps a
//!   process-wide handle.
//! - Table presence is owned by `EntityRepository::create_table`, not by
//!   connection bootstrap.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure reported by the relational engine.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
