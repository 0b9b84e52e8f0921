//! INSERT builder for `create`.

use crate::error::{ModelError, ModelResult};
use crate::ident::write_quoted;
use crate::qb::param::ParamList;
use crate::qb::storage_columns;
use crate::qb::traits::{BuiltQuery, SqlQb, Verb};
use crate::record::Record;

/// `INSERT INTO "<table>" (...) VALUES (...) RETURNING *`
#[derive(Clone, Debug)]
pub struct InsertQb<'a> {
    table: &'a str,
    values: &'a Record,
}

impl<'a> InsertQb<'a> {
    pub fn new(table: &'a str, values: &'a Record) -> Self {
        Self { table, values }
    }
}

impl SqlQb for InsertQb<'_> {
    fn build(&self) -> ModelResult<BuiltQuery> {
        if self.values.is_empty() {
            return Err(ModelError::build(format!(
                "create on \"{}\" requires at least one value",
                self.table
            )));
        }

        let columns = storage_columns(self.table, self.values)?;
        let mut params = ParamList::new();
        let placeholders: Vec<String> = self
            .values
            .iter()
            .map(|(_, value)| format!("${}", params.push(value.clone())))
            .collect();

        let mut sql = String::from("INSERT INTO ");
        write_quoted(self.table, &mut sql);
        sql.push_str(&format!(
            " ({}) VALUES ({}) RETURNING *",
            columns.join(", "),
            placeholders.join(", ")
        ));

        Ok(BuiltQuery::new(Verb::Create, self.table, sql, params))
    }
}
