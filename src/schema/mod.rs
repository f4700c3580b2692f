//! Declarative star-schema model and the generic traversal that
//! drives every SQL emitter.
//!
//! The schema is a tree of column variants. The root table is the
//! fact; every [`Column::ForeignKey`] names a dimension whose own
//! schema is inlined at the reference site. The DDL, lookup and
//! insert emitters all share one post-order walk ([`walk`]) and
//! differ only in the closures they hand it.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use crate::record::{Field, Run};

/// The closed set of warehouse tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Table {
    Fact,
    Plugin,
    PluginName,
    Browser,
    BrowserName,
    Url,
    Domain,
    ErrorMessage,
}

impl Table {
    /// Every table, fact first.
    pub const ALL: [Table; 8] = [
        Table::Fact,
        Table::Plugin,
        Table::PluginName,
        Table::Browser,
        Table::BrowserName,
        Table::Url,
        Table::Domain,
        Table::ErrorMessage,
    ];

    /// Table name as it appears in emitted SQL.
    pub fn name(self) -> &'static str {
        match self {
            Table::Fact => "Fact",
            Table::Plugin => "Plugin",
            Table::PluginName => "PluginName",
            Table::Browser => "Browser",
            Table::BrowserName => "BrowserName",
            Table::Url => "Url",
            Table::Domain => "Domain",
            Table::ErrorMessage => "ErrorMessage",
        }
    }

    /// The client-generated surrogate key column. The fact table has
    /// none; the storage engine provides no auto-increment, so every
    /// dimension carries one.
    pub fn key_column(self) -> Option<&'static str> {
        match self {
            Table::Fact => None,
            Table::Plugin => Some("plugin_id"),
            Table::PluginName => Some("plugin_name_id"),
            Table::Browser => Some("browser_id"),
            Table::BrowserName => Some("browser_name_id"),
            Table::Url => Some("url_id"),
            Table::Domain => Some("domain_id"),
            Table::ErrorMessage => Some("error_message_id"),
        }
    }

    /// Whether this table is a dimension (everything but the fact).
    pub fn is_dimension(self) -> bool {
        self != Table::Fact
    }
}

/// One column of a table schema.
#[derive(Debug, Clone)]
pub enum Column {
    /// Numeric column bound to a record field.
    Int { name: &'static str, field: Field },
    /// Short-text column bound to a record field.
    Text { name: &'static str, field: Field },
    /// Reference to a dimension; the child schema is inlined here.
    ForeignKey(ForeignKey),
}

impl Column {
    fn int(name: &'static str, field: Field) -> Column {
        Column::Int { name, field }
    }

    fn text(name: &'static str, field: Field) -> Column {
        Column::Text { name, field }
    }
}

/// A foreign-key column and the dimension it points at.
#[derive(Debug, Clone)]
pub struct ForeignKey {
    /// Column name in the referencing table.
    pub name: &'static str,
    /// The referenced dimension's schema.
    pub child: TableSchema,
    /// When set, the dimension is skipped for a run that lacks this
    /// field and the parent column renders NULL.
    pub optional: Option<Field>,
}

/// One table: the fact at the root, a dimension everywhere else.
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub table: Table,
    pub columns: Vec<Column>,
}

/// Per-table SQL produced by one traversal.
pub type SqlMap = BTreeMap<Table, String>;

/// The process-wide schema constant.
static STAR_SCHEMA: Lazy<TableSchema> = Lazy::new(|| TableSchema {
    table: Table::Fact,
    columns: vec![
        Column::int("score", Field::Score),
        Column::int("status_code", Field::StatusCode),
        Column::ForeignKey(ForeignKey {
            name: "error_message",
            optional: Some(Field::ErrorMessage),
            child: TableSchema {
                table: Table::ErrorMessage,
                columns: vec![Column::text("message", Field::ErrorMessage)],
            },
        }),
        Column::ForeignKey(ForeignKey {
            name: "plugin",
            optional: None,
            child: TableSchema {
                table: Table::Plugin,
                columns: vec![
                    Column::text("version", Field::PluginVersion),
                    Column::ForeignKey(ForeignKey {
                        name: "name",
                        optional: None,
                        child: TableSchema {
                            table: Table::PluginName,
                            columns: vec![Column::text("name", Field::PluginName)],
                        },
                    }),
                ],
            },
        }),
        Column::ForeignKey(ForeignKey {
            name: "browser",
            optional: None,
            child: TableSchema {
                table: Table::Browser,
                columns: vec![
                    Column::text("version", Field::BrowserVersion),
                    Column::ForeignKey(ForeignKey {
                        name: "name",
                        optional: None,
                        child: TableSchema {
                            table: Table::BrowserName,
                            columns: vec![Column::text("name", Field::BrowserName)],
                        },
                    }),
                ],
            },
        }),
        Column::ForeignKey(ForeignKey {
            name: "url",
            optional: None,
            child: TableSchema {
                table: Table::Url,
                columns: vec![
                    Column::text("path", Field::Path),
                    Column::ForeignKey(ForeignKey {
                        name: "domain",
                        optional: None,
                        child: TableSchema {
                            table: Table::Domain,
                            columns: vec![Column::text("domain", Field::Url)],
                        },
                    }),
                ],
            },
        }),
        Column::text("extension_version", Field::ExtensionVersion),
    ],
});

/// The star schema describing the warehouse layout.
pub fn star_schema() -> &'static TableSchema {
    &STAR_SCHEMA
}

/// Post-order walk over the schema, collecting per-table SQL.
///
/// For every foreign-key node:
///
/// 1. unless `always_extend`, the child is skipped when its optional
///    field is missing from `run`;
/// 2. `condition(child, fk)` gates both the recursion and every
///    emission in the subtree;
/// 3. the recursion uses `dimension` at every level, so only the root
///    table goes through `fact`.
///
/// Emitters return `None` to emit nothing for a table. Later
/// emissions for the same table overwrite earlier ones.
pub fn walk<C, F, D>(
    schema: &TableSchema,
    run: Option<&Run>,
    always_extend: bool,
    mut condition: C,
    mut fact: F,
    mut dimension: D,
) -> SqlMap
where
    C: FnMut(&TableSchema, &ForeignKey) -> bool,
    F: FnMut(&TableSchema) -> Option<String>,
    D: FnMut(&TableSchema) -> Option<String>,
{
    let mut out = SqlMap::new();
    walk_node(
        schema,
        true,
        run,
        always_extend,
        &mut condition,
        &mut fact,
        &mut dimension,
        &mut out,
    );
    out
}

#[allow(clippy::too_many_arguments)]
fn walk_node<C, F, D>(
    schema: &TableSchema,
    root: bool,
    run: Option<&Run>,
    always_extend: bool,
    condition: &mut C,
    fact: &mut F,
    dimension: &mut D,
    out: &mut SqlMap,
) where
    C: FnMut(&TableSchema, &ForeignKey) -> bool,
    F: FnMut(&TableSchema) -> Option<String>,
    D: FnMut(&TableSchema) -> Option<String>,
{
    for column in &schema.columns {
        let Column::ForeignKey(fk) = column else {
            continue;
        };
        if !always_extend {
            if let (Some(field), Some(run)) = (fk.optional, run) {
                if run.value(field).is_none() {
                    continue;
                }
            }
        }
        if !condition(&fk.child, fk) {
            continue;
        }
        walk_node(
            &fk.child,
            false,
            run,
            always_extend,
            condition,
            fact,
            dimension,
            out,
        );
    }

    let emitted = if root { fact(schema) } else { dimension(schema) };
    if let Some(sql) = emitted {
        out.insert(schema.table, sql);
    }
}
