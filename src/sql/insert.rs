//! Insert emission: dimension and fact INSERTs for one run.
//!
//! The walk extends only into dimensions the lookup phase left
//! unresolved. Each of those asks the key bank for an id keyed by the
//! subtree's content; a cache hit means another in-flight run already
//! owns the row, so nothing is emitted and the id is reused. The fact
//! INSERT always emits, with every reference column carrying the
//! resolved id or NULL.

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::error::StoreError;
use crate::keys::KeyBank;
use crate::record::{Run, Value};
use crate::schema::{walk, Column, SqlMap, Table, TableSchema};
use crate::sql::key_column_of;
use crate::sql::literal::{id_or_null, value_or_null};

/// INSERT statements for one run.
///
/// `known` holds the dimension ids the lookup phase resolved; it is
/// extended in place with every id the bank allocates here, so after
/// the call it maps every dimension present on the run.
pub fn run_inserts(
    schema: &TableSchema,
    run: &Run,
    keys: &KeyBank,
    known: &mut BTreeMap<Table, u64>,
) -> Result<SqlMap, StoreError> {
    struct State<'a> {
        known: &'a mut BTreeMap<Table, u64>,
        error: Option<StoreError>,
    }
    let state = RefCell::new(State { known, error: None });

    let map = walk(
        schema,
        Some(run),
        false,
        |child, _| !state.borrow().known.contains_key(&child.table),
        |fact| {
            let st = state.borrow();
            Some(insert_statement(fact, run, &*st.known, None))
        },
        |dim| {
            let mut st = state.borrow_mut();
            match dimension_insert(dim, run, keys, st.known) {
                Ok(sql) => sql,
                Err(e) => {
                    st.error.get_or_insert(e);
                    None
                }
            }
        },
    );

    let state = state.into_inner();
    match state.error {
        Some(e) => Err(e),
        None => Ok(map),
    }
}

/// Emit the INSERT for one unresolved dimension, or nothing on a
/// cache hit. Always records the id so parents can reference it.
fn dimension_insert(
    schema: &TableSchema,
    run: &Run,
    keys: &KeyBank,
    known: &mut BTreeMap<Table, u64>,
) -> Result<Option<String>, StoreError> {
    let key_column = key_column_of(schema.table)?;
    let (id, hit) = keys.request_key(schema.table, &content_key(schema, run));
    known.insert(schema.table, id);
    if hit {
        return Ok(None);
    }
    Ok(Some(insert_statement(
        schema,
        run,
        known,
        Some((key_column, id)),
    )))
}

/// Render `INSERT INTO <t>(<cols>[, <key>]) VALUES (<vals>[, <id>])`.
fn insert_statement(
    schema: &TableSchema,
    run: &Run,
    known: &BTreeMap<Table, u64>,
    surrogate: Option<(&str, u64)>,
) -> String {
    let mut columns = Vec::with_capacity(schema.columns.len() + 1);
    let mut values = Vec::with_capacity(schema.columns.len() + 1);
    for column in &schema.columns {
        match column {
            Column::Int { name, field } | Column::Text { name, field } => {
                columns.push(*name);
                values.push(value_or_null(run.value(*field)));
            }
            Column::ForeignKey(fk) => {
                columns.push(fk.name);
                values.push(id_or_null(known.get(&fk.child.table).copied()));
            }
        }
    }
    if let Some((key_column, id)) = surrogate {
        columns.push(key_column);
        values.push(id_or_null(Some(id)));
    }
    format!(
        "INSERT INTO {}({}) VALUES ({})",
        schema.table.name(),
        columns.join(", "),
        values.join(", ")
    )
}

/// Content key of a dimension subtree: the leaf values in schema
/// order joined by `#`, recursing through nested references. Two runs
/// denote the same dimension row iff their keys are equal.
fn content_key(schema: &TableSchema, run: &Run) -> String {
    let mut parts = Vec::new();
    collect_leaf_values(schema, run, &mut parts);
    parts.join("#")
}

fn collect_leaf_values(schema: &TableSchema, run: &Run, parts: &mut Vec<String>) {
    for column in &schema.columns {
        match column {
            Column::Int { field, .. } | Column::Text { field, .. } => {
                parts.push(match run.value(*field) {
                    Some(Value::Int(n)) => n.to_string(),
                    Some(Value::Text(s)) => s.to_string(),
                    None => "NULL".to_string(),
                });
            }
            Column::ForeignKey(fk) => collect_leaf_values(&fk.child, run, parts),
        }
    }
}
