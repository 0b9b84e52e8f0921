//! Query builders for the six model verbs.
//!
//! Each builder borrows a table identifier and the caller's loosely typed
//! arguments and renders one [`BuiltQuery`]: SQL text with `$1, $2, ...`
//! placeholders and the matching [`ParamList`]. Field keys are converted to
//! storage casing and every identifier is double-quoted.
//!
//! # Usage
//!
//! ```ignore
//! use pgmodel::qb::{self, Filter, SqlQb};
//!
//! let filter = Filter::new()
//!     .eq("propertyId", 3)
//!     .within("status", ["available", "reserved"]);
//! let query = qb::find_many("Unit", &filter)?;
//! // SELECT * FROM "Unit" WHERE "property_id" = $1 AND "status" IN ($2, $3)
//! ```

mod delete;
mod filter;
mod insert;
mod param;
mod select;
mod traits;
mod update;

pub use delete::DeleteQb;
pub use filter::{Condition, Filter, Order, WITHIN};
pub use insert::InsertQb;
pub use param::{ParamList, SqlValue};
pub use select::SelectQb;
pub use traits::{BuiltQuery, SqlQb, Verb};
pub use update::UpdateQb;

use crate::case::to_storage_key;
use crate::error::{ModelError, ModelResult};
use crate::ident::quote_ident;
use crate::record::Record;
use std::collections::HashSet;

/// Quoted storage columns for a record's keys, in record order.
///
/// Two keys naming the same column (`unitNumber` and `unit_number`) are a
/// build error.
pub(crate) fn storage_columns(table: &str, values: &Record) -> ModelResult<Vec<String>> {
    let mut seen = HashSet::with_capacity(values.len());
    values
        .keys()
        .map(|key| {
            let column = to_storage_key(key);
            if !seen.insert(column.clone()) {
                return Err(ModelError::build(format!(
                    "key \"{key}\" repeats column \"{column}\" of \"{table}\""
                )));
            }
            Ok(quote_ident(&column))
        })
        .collect()
}

/// Render `find_many` for the given table.
pub fn find_many(table: &str, filter: &Filter) -> ModelResult<BuiltQuery> {
    SelectQb::find_many(table, filter).build()
}

/// Render `find_unique` for the given table.
pub fn find_unique(table: &str, filter: &Filter) -> ModelResult<BuiltQuery> {
    SelectQb::find_unique(table, filter).build()
}

/// Render `count` for the given table.
pub fn count(table: &str, filter: &Filter) -> ModelResult<BuiltQuery> {
    SelectQb::count(table, filter).build()
}

/// Render `create` for the given table.
pub fn create(table: &str, values: &Record) -> ModelResult<BuiltQuery> {
    InsertQb::new(table, values).build()
}

/// Render `update` for the given table.
pub fn update(table: &str, filter: &Filter, values: &Record) -> ModelResult<BuiltQuery> {
    UpdateQb::new(table, filter, values).build()
}

/// Render `delete` for the given table.
///
/// # Safety
/// An empty filter is rejected; pass [`Filter::all`] to delete every row.
pub fn delete(table: &str, filter: &Filter) -> ModelResult<BuiltQuery> {
    DeleteQb::new(table, filter).build()
}
