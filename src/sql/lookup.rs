//! Lookup emission: per-dimension SELECTs resolving whether the
//! dimension rows for a run already exist.
//!
//! `MAX(<key>)` is used rather than `LIMIT 1` because the engine
//! enforces no uniqueness; an empty (NULL) result tells the insert
//! emitter the dimension row is absent, so no COALESCE is applied.

use crate::error::StoreError;
use crate::record::Run;
use crate::schema::{walk, Column, SqlMap, TableSchema};
use crate::sql::key_column_of;
use crate::sql::literal::value_or_null;

/// One SELECT per dimension reachable from `run`. Dimensions whose
/// optional field is absent are skipped entirely.
pub fn dimension_lookups(schema: &TableSchema, run: &Run) -> Result<SqlMap, StoreError> {
    let mut error = None;
    let map = walk(
        schema,
        Some(run),
        false,
        |_, _| true,
        |_| None,
        |dim| match lookup_select(dim, run) {
            Ok(sql) => Some(sql),
            Err(e) => {
                error.get_or_insert(e);
                None
            }
        },
    );
    match error {
        Some(e) => Err(e),
        None => Ok(map),
    }
}

/// One `SELECT MAX(<key>) AS id FROM <dim>` per dimension, used to
/// seed the surrogate-key bank at startup.
pub fn key_seeds(schema: &TableSchema) -> Result<SqlMap, StoreError> {
    let mut error = None;
    let map = walk(
        schema,
        None,
        true,
        |_, _| true,
        |_| None,
        |dim| match key_column_of(dim.table) {
            Ok(key) => Some(format!(
                "SELECT MAX({}) AS id FROM {}",
                key,
                dim.table.name()
            )),
            Err(e) => {
                error.get_or_insert(e);
                None
            }
        },
    );
    match error {
        Some(e) => Err(e),
        None => Ok(map),
    }
}

fn lookup_select(schema: &TableSchema, run: &Run) -> Result<String, StoreError> {
    let key = key_column_of(schema.table)?;
    let mut joins = Vec::new();
    let mut conditions = Vec::new();
    collect_subtree(schema, run, &mut joins, &mut conditions)?;

    let table = schema.table.name();
    let mut sql = format!("SELECT MAX({table}.{key}) AS id FROM {table}");
    for join in &joins {
        sql.push(' ');
        sql.push_str(join);
    }
    sql.push_str(" WHERE ");
    sql.push_str(&conditions.join(" AND "));
    Ok(sql)
}

/// Descend a dimension's subtree collecting INNER JOINs for every
/// nested reference and an equality condition for every leaf column.
fn collect_subtree(
    schema: &TableSchema,
    run: &Run,
    joins: &mut Vec<String>,
    conditions: &mut Vec<String>,
) -> Result<(), StoreError> {
    for column in &schema.columns {
        match column {
            Column::Int { name, field } | Column::Text { name, field } => {
                conditions.push(format!(
                    "{}.{} = {}",
                    schema.table.name(),
                    name,
                    value_or_null(run.value(*field))
                ));
            }
            Column::ForeignKey(fk) => {
                let child_key = key_column_of(fk.child.table)?;
                joins.push(format!(
                    "INNER JOIN {child} ON {parent}.{fk_col} = {child}.{child_key}",
                    child = fk.child.table.name(),
                    parent = schema.table.name(),
                    fk_col = fk.name,
                ));
                collect_subtree(&fk.child, run, joins, conditions)?;
            }
        }
    }
    Ok(())
}
