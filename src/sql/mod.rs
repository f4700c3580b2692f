//! SQL emission.
//!
//! Every submodule is a pure query producer: it turns the schema and
//! a run into per-table SQL strings and never touches a connection.
//! The executor in [`crate::store`] is the only consumer.

pub mod ddl;
pub mod insert;
pub mod literal;
pub mod lookup;

use crate::error::StoreError;
use crate::schema::Table;

/// Resolve a table's surrogate key column, failing on a schema
/// literal that wired a reference at a keyless table.
pub(crate) fn key_column_of(table: Table) -> Result<&'static str, StoreError> {
    table.key_column().ok_or_else(|| {
        StoreError::SchemaMisuse(format!(
            "table {} has no surrogate key column",
            table.name()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_column_of_dimension() {
        assert_eq!(key_column_of(Table::Plugin).unwrap(), "plugin_id");
    }

    #[test]
    fn test_key_column_of_fact_is_misuse() {
        let err = key_column_of(Table::Fact).unwrap_err();
        assert!(matches!(err, StoreError::SchemaMisuse(_)));
    }
}
