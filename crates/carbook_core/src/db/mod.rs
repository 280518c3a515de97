//! Connection setup for the vehicle store.
//!
//! `open_db` and `open_db_in_memory` hand back a connection with foreign
//! keys enforced and the `owners`/`vehicles` schema at the version this
//! build ships. The schema version lives in `PRAGMA user_version`; a file
//! written by a later build is refused rather than downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening or migrating the store.
#[derive(Debug)]
pub enum DbError {
    /// Raw driver failure (I/O, locking, constraint, interrupt).
    Sqlite(rusqlite::Error),
    /// The file carries a schema version this build has no migrations for.
    SchemaTooNew { found: u32, supported: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "vehicle store schema v{found} is ahead of this build (max v{supported})"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        if let Self::Sqlite(err) = self {
            return Some(err);
        }
        None
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
