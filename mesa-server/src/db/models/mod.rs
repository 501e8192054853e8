//! Database row models
//!
//! SQLite stores money as TEXT and timestamps as INTEGER milliseconds; these
//! row structs decode straight from queries and convert into the shared API
//! models, failing with a database error on corrupt stored values.

pub mod order;
pub mod product;
pub mod profile;

pub use order::{OrderLineDetailRow, OrderRow};
pub use product::ProductRow;
pub use profile::ProfileRow;

use rust_decimal::Decimal;
use std::str::FromStr;

use super::repository::{RepoError, RepoResult};

/// Parse a stored decimal string
pub(crate) fn parse_money(value: &str, column: &str) -> RepoResult<Decimal> {
    Decimal::from_str(value)
        .map_err(|e| RepoError::Database(format!("Corrupt {column} value {value:?}: {e}")))
}

/// Narrow a stored quantity to the model's u32
pub(crate) fn parse_quantity(value: i64) -> RepoResult<u32> {
    u32::try_from(value)
        .map_err(|_| RepoError::Database(format!("Corrupt quantity value {value}")))
}
