//! UPDATE builder for `update`.

use crate::error::{ModelError, ModelResult};
use crate::ident::write_quoted;
use crate::qb::filter::Filter;
use crate::qb::param::ParamList;
use crate::qb::storage_columns;
use crate::qb::traits::{BuiltQuery, SqlQb, Verb};
use crate::record::Record;

/// `UPDATE "<table>" SET ... WHERE ... RETURNING *`
///
/// SET parameters are numbered first; WHERE parameters continue the same list.
#[derive(Clone, Debug)]
pub struct UpdateQb<'a> {
    table: &'a str,
    filter: &'a Filter,
    values: &'a Record,
}

impl<'a> UpdateQb<'a> {
    pub fn new(table: &'a str, filter: &'a Filter, values: &'a Record) -> Self {
        Self {
            table,
            filter,
            values,
        }
    }

    fn validate(&self) -> ModelResult<()> {
        if self.values.is_empty() {
            return Err(ModelError::build(format!(
                "update on \"{}\": SET clause cannot be empty",
                self.table
            )));
        }
        if self.filter.is_empty() && !self.filter.is_match_all() {
            return Err(ModelError::build(format!(
                "update on \"{}\" without a filter; use Filter::all() to update every row",
                self.table
            )));
        }
        Ok(())
    }
}

impl SqlQb for UpdateQb<'_> {
    fn build(&self) -> ModelResult<BuiltQuery> {
        self.validate()?;

        let columns = storage_columns(self.table, self.values)?;
        let mut params = ParamList::new();
        let set_parts: Vec<String> = columns
            .iter()
            .zip(self.values.iter())
            .map(|(column, (_, value))| format!("{column} = ${}", params.push(value.clone())))
            .collect();

        let mut sql = String::from("UPDATE ");
        write_quoted(self.table, &mut sql);
        sql.push_str(" SET ");
        sql.push_str(&set_parts.join(", "));
        self.filter.write_where(&mut sql, &mut params);
        sql.push_str(" RETURNING *");

        Ok(BuiltQuery::new(Verb::Update, self.table, sql, params))
    }
}
