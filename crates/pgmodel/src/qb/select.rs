//! SELECT builders: `find_many`, `find_unique` and `count`.

use crate::error::{ModelError, ModelResult};
use crate::ident::write_quoted;
use crate::qb::filter::Filter;
use crate::qb::param::ParamList;
use crate::qb::traits::{BuiltQuery, SqlQb, Verb};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Shape {
    /// `SELECT *`
    Many,
    /// `SELECT *` + `LIMIT 1`, equality filters only
    Unique,
    /// `SELECT COUNT(*)`
    Count,
}

/// SELECT query builder over a single table.
#[derive(Clone, Debug)]
pub struct SelectQb<'a> {
    table: &'a str,
    filter: &'a Filter,
    shape: Shape,
}

impl<'a> SelectQb<'a> {
    /// `SELECT * FROM "<table>" [WHERE ...] [ORDER BY ...]`
    pub fn find_many(table: &'a str, filter: &'a Filter) -> Self {
        Self {
            table,
            filter,
            shape: Shape::Many,
        }
    }

    /// `SELECT * FROM "<table>" WHERE ... [ORDER BY ...] LIMIT 1`
    pub fn find_unique(table: &'a str, filter: &'a Filter) -> Self {
        Self {
            table,
            filter,
            shape: Shape::Unique,
        }
    }

    /// `SELECT COUNT(*) FROM "<table>" [WHERE ...]`
    pub fn count(table: &'a str, filter: &'a Filter) -> Self {
        Self {
            table,
            filter,
            shape: Shape::Count,
        }
    }

    fn verb(&self) -> Verb {
        match self.shape {
            Shape::Many => Verb::FindMany,
            Shape::Unique => Verb::FindUnique,
            Shape::Count => Verb::Count,
        }
    }

    fn validate(&self) -> ModelResult<()> {
        if self.shape != Shape::Unique {
            return Ok(());
        }
        if self.filter.is_empty() {
            return Err(ModelError::build(format!(
                "find_unique on \"{}\" requires at least one filter field",
                self.table
            )));
        }
        if !self.filter.is_equality_only() {
            return Err(ModelError::build(format!(
                "find_unique on \"{}\" accepts equality filters only",
                self.table
            )));
        }
        Ok(())
    }
}

impl SqlQb for SelectQb<'_> {
    fn build(&self) -> ModelResult<BuiltQuery> {
        self.validate()?;

        let mut params = ParamList::new();
        let mut sql = String::from(match self.shape {
            Shape::Count => "SELECT COUNT(*) FROM ",
            Shape::Many | Shape::Unique => "SELECT * FROM ",
        });
        write_quoted(self.table, &mut sql);
        self.filter.write_where(&mut sql, &mut params);

        if self.shape != Shape::Count {
            self.filter.write_order_by(&mut sql);
        }
        if self.shape == Shape::Unique {
            sql.push_str(" LIMIT 1");
        }

        Ok(BuiltQuery::new(self.verb(), self.table, sql, params))
    }
}
