//! DDL emission: CREATE and DROP statements for the star schema.
//!
//! Column types are fixed by the column variant: `INT UNSIGNED` for
//! numeric and foreign-key columns, `TINYTEXT` for text. Dimensions
//! get their surrogate key column appended; the fact table has none.
//! No PRIMARY KEY is declared anywhere because the columnar engine
//! rejects one.

use crate::schema::{walk, Column, SqlMap, TableSchema};

/// CREATE TABLE statements, one per table.
///
/// `column_store` controls the `ENGINE = ColumnStore` suffix.
pub fn create_tables(schema: &TableSchema, column_store: bool) -> SqlMap {
    walk(
        schema,
        None,
        true,
        |_, _| true,
        |s| Some(create_table(s, column_store)),
        |s| Some(create_table(s, column_store)),
    )
}

/// DROP TABLE statements, one per table.
pub fn drop_tables(schema: &TableSchema) -> SqlMap {
    let drop_table = |s: &TableSchema| Some(format!("DROP TABLE {};", s.table.name()));
    walk(schema, None, true, |_, _| true, drop_table, drop_table)
}

fn create_table(schema: &TableSchema, column_store: bool) -> String {
    let mut columns: Vec<String> = schema.columns.iter().map(column_def).collect();
    if let Some(key) = schema.table.key_column() {
        columns.push(format!("{key} INT UNSIGNED"));
    }
    let engine = if column_store {
        " ENGINE = ColumnStore"
    } else {
        ""
    };
    format!(
        "CREATE TABLE {}({}){};",
        schema.table.name(),
        columns.join(", "),
        engine
    )
}

fn column_def(column: &Column) -> String {
    match column {
        Column::Int { name, .. } => format!("{name} INT UNSIGNED"),
        Column::Text { name, .. } => format!("{name} TINYTEXT"),
        Column::ForeignKey(fk) => format!("{} INT UNSIGNED", fk.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{star_schema, Table};

    #[test]
    fn test_create_covers_every_table() {
        let map = create_tables(star_schema(), true);
        assert_eq!(map.len(), Table::ALL.len());
    }

    #[test]
    fn test_create_fact() {
        let map = create_tables(star_schema(), true);
        assert_eq!(
            map[&Table::Fact],
            "CREATE TABLE Fact(score INT UNSIGNED, status_code INT UNSIGNED, \
             error_message INT UNSIGNED, plugin INT UNSIGNED, browser INT UNSIGNED, \
             url INT UNSIGNED, extension_version TINYTEXT) ENGINE = ColumnStore;"
        );
    }

    #[test]
    fn test_create_dimension_appends_key_column() {
        let map = create_tables(star_schema(), true);
        assert_eq!(
            map[&Table::Plugin],
            "CREATE TABLE Plugin(version TINYTEXT, name INT UNSIGNED, \
             plugin_id INT UNSIGNED) ENGINE = ColumnStore;"
        );
        assert_eq!(
            map[&Table::Domain],
            "CREATE TABLE Domain(domain TINYTEXT, domain_id INT UNSIGNED) \
             ENGINE = ColumnStore;"
        );
    }

    #[test]
    fn test_engine_suffix_can_be_disabled() {
        let map = create_tables(star_schema(), false);
        for sql in map.values() {
            assert!(!sql.contains("ColumnStore"), "unexpected engine in {sql}");
            assert!(sql.ends_with(");"), "malformed statement: {sql}");
        }
    }

    #[test]
    fn test_no_primary_key_is_declared() {
        let map = create_tables(star_schema(), true);
        for sql in map.values() {
            assert!(!sql.contains("PRIMARY KEY"));
            assert!(!sql.contains("AUTO_INCREMENT"));
        }
    }

    #[test]
    fn test_drop_covers_every_table() {
        let map = drop_tables(star_schema());
        assert_eq!(map.len(), Table::ALL.len());
        assert_eq!(map[&Table::Fact], "DROP TABLE Fact;");
        assert_eq!(map[&Table::ErrorMessage], "DROP TABLE ErrorMessage;");
    }
}
