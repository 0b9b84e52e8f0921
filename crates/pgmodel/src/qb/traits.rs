//! Trait definitions for query builders.

use crate::error::ModelResult;
use crate::qb::param::ParamList;
use std::fmt;

/// The verb a statement was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    FindMany,
    FindUnique,
    Create,
    Update,
    Delete,
    Count,
}

impl Verb {
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::FindMany => "find_many",
            Verb::FindUnique => "find_unique",
            Verb::Create => "create",
            Verb::Update => "update",
            Verb::Delete => "delete",
            Verb::Count => "count",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The result of building a query: SQL text plus positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub verb: Verb,
    pub table: String,
    pub sql: String,
    pub params: ParamList,
}

impl BuiltQuery {
    pub fn new(verb: Verb, table: &str, sql: String, params: ParamList) -> Self {
        Self {
            verb,
            table: table.to_string(),
            sql,
            params,
        }
    }
}

/// Base trait for all query builders.
pub trait SqlQb {
    /// Validate the arguments and render the statement.
    fn build(&self) -> ModelResult<BuiltQuery>;

    /// Debug helper to get the SQL string.
    fn to_sql(&self) -> ModelResult<String> {
        self.build().map(|q| q.sql)
    }
}
