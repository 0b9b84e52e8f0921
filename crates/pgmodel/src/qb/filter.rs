//! Filter-clause sets: the WHERE half of every verb.
//!
//! A [`Filter`] maps API-cased field keys to a [`Condition`]. Conditions are
//! rendered in insertion order and joined with `AND`. Keys are converted to
//! storage casing at render time.

use crate::case::to_storage_key;
use crate::error::{ModelError, ModelResult};
use crate::ident::{quote_ident, write_quoted};
use crate::qb::param::ParamList;
use crate::record::{Record, json_kind};
use serde_json::Value;

/// Key of the membership directive in loosely typed filters.
pub const WITHIN: &str = "within";

/// One constraint on a field.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    /// `column = $n`, or `column IS NULL` for a null value.
    Eq(Value),
    /// `column IN ($n, ...)`; an empty set never matches.
    Within(Vec<Value>),
}

impl Condition {
    /// Build a condition from a loosely typed value.
    ///
    /// An object carrying a `within` key is a membership directive; a bare
    /// scalar under `within` is a one-element set. Anything else is equality.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(mut map) if map.contains_key(WITHIN) => {
                match map.shift_remove(WITHIN).unwrap_or(Value::Null) {
                    Value::Array(items) => Condition::Within(items),
                    scalar => Condition::Within(vec![scalar]),
                }
            }
            other => Condition::Eq(other),
        }
    }

    fn is_equality(&self) -> bool {
        matches!(self, Condition::Eq(_))
    }
}

/// Sort direction for [`Filter::order_by`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    fn as_sql(self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

/// A filter-clause set.
///
/// An empty filter matches every row. `find_many` and `count` accept that, but
/// `update` and `delete` refuse it unless the filter was created with
/// [`Filter::all`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Condition)>,
    order_by: Vec<(String, Order)>,
    include: Vec<String>,
    match_all: bool,
}

impl Filter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Explicitly match every row. Required for unfiltered update/delete.
    pub fn all() -> Self {
        Self {
            match_all: true,
            ..Self::default()
        }
    }

    /// Build a filter from a JSON object of `key -> value | { "within": [...] }`.
    pub fn from_json(value: Value) -> ModelResult<Self> {
        match value {
            Value::Object(map) => Ok(map.into_iter().fold(Self::new(), |filter, (key, value)| {
                filter.condition(key, Condition::from_json(value))
            })),
            other => Err(ModelError::build(format!(
                "expected a JSON object for filter, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Build an equality filter from every field of a record.
    pub fn from_record(record: Record) -> Self {
        record
            .into_iter()
            .fold(Self::new(), |filter, (key, value)| filter.eq(key, value))
    }

    /// Add `key = value`. A key that is already present is replaced in place.
    pub fn eq(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition(key, Condition::Eq(value.into()))
    }

    /// Add `key IN (values...)`.
    pub fn within<I, V>(self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.condition(key, Condition::Within(values))
    }

    /// Add an arbitrary condition. A key that is already present is replaced in place.
    pub fn condition(mut self, key: impl Into<String>, condition: Condition) -> Self {
        let key = key.into();
        match self.clauses.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = condition,
            None => self.clauses.push((key, condition)),
        }
        self
    }

    /// Append an ordering term (used by `find_many` and `find_unique`).
    pub fn order_by(mut self, key: impl Into<String>, order: Order) -> Self {
        self.order_by.push((key.into(), order));
        self
    }

    /// Record a nested-include hint. Hints never change the generated SQL;
    /// related rows must be loaded with separate queries.
    pub fn include(mut self, relation: impl Into<String>) -> Self {
        self.include.push(relation.into());
        self
    }

    /// `true` if there are no conditions.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// `true` if this filter was created with [`Filter::all`].
    pub fn is_match_all(&self) -> bool {
        self.match_all
    }

    /// `true` if every condition is an equality.
    pub fn is_equality_only(&self) -> bool {
        self.clauses.iter().all(|(_, c)| c.is_equality())
    }

    pub fn clauses(&self) -> impl Iterator<Item = (&str, &Condition)> {
        self.clauses.iter().map(|(k, c)| (k.as_str(), c))
    }

    pub fn includes(&self) -> &[String] {
        &self.include
    }

    /// Append ` WHERE ...` to `sql` (nothing for an empty filter), pushing
    /// parameters after any already in `params`.
    pub(crate) fn write_where(&self, sql: &mut String, params: &mut ParamList) {
        for (i, (key, condition)) in self.clauses.iter().enumerate() {
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            let column = quote_ident(&to_storage_key(key));
            match condition {
                Condition::Eq(Value::Null) => {
                    sql.push_str(&format!("{column} IS NULL"));
                }
                Condition::Eq(value) => {
                    let idx = params.push(value.clone());
                    sql.push_str(&format!("{column} = ${idx}"));
                }
                Condition::Within(values) if values.is_empty() => sql.push_str("1=0"),
                Condition::Within(values) => {
                    let placeholders: Vec<String> = values
                        .iter()
                        .map(|v| format!("${}", params.push(v.clone())))
                        .collect();
                    sql.push_str(&format!("{column} IN ({})", placeholders.join(", ")));
                }
            }
        }
    }

    /// Append ` ORDER BY ...` to `sql` (nothing if no ordering was requested).
    pub(crate) fn write_order_by(&self, sql: &mut String) {
        for (i, (key, order)) in self.order_by.iter().enumerate() {
            sql.push_str(if i == 0 { " ORDER BY " } else { ", " });
            write_quoted(&to_storage_key(key), sql);
            sql.push(' ');
            sql.push_str(order.as_sql());
        }
    }
}

impl TryFrom<Value> for Filter {
    type Error = ModelError;

    fn try_from(value: Value) -> ModelResult<Self> {
        Self::from_json(value)
    }
}
