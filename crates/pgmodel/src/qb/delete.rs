//! DELETE builder for `delete`.

use crate::error::{ModelError, ModelResult};
use crate::ident::write_quoted;
use crate::qb::filter::Filter;
use crate::qb::param::ParamList;
use crate::qb::traits::{BuiltQuery, SqlQb, Verb};

/// `DELETE FROM "<table>" WHERE ...`
///
/// # Safety
/// An empty filter is a build error. Use [`Filter::all`] to delete every row.
#[derive(Clone, Debug)]
pub struct DeleteQb<'a> {
    table: &'a str,
    filter: &'a Filter,
}

impl<'a> DeleteQb<'a> {
    pub fn new(table: &'a str, filter: &'a Filter) -> Self {
        Self { table, filter }
    }
}

impl SqlQb for DeleteQb<'_> {
    fn build(&self) -> ModelResult<BuiltQuery> {
        if self.filter.is_empty() && !self.filter.is_match_all() {
            return Err(ModelError::build(format!(
                "delete on \"{}\" without a filter; use Filter::all() to delete every row",
                self.table
            )));
        }

        let mut params = ParamList::new();
        let mut sql = String::from("DELETE FROM ");
        write_quoted(self.table, &mut sql);
        self.filter.write_where(&mut sql, &mut params);

        Ok(BuiltQuery::new(Verb::Delete, self.table, sql, params))
    }
}
