//! End-to-end emission scenarios: one run flowing through the lookup
//! and insert emitters against a shared key bank, the way the
//! warehouse drives them. The executor itself needs a live database;
//! everything up to the statement maps is exercised here.

use std::collections::BTreeMap;

use starlog::keys::KeyBank;
use starlog::record::Run;
use starlog::schema::{star_schema, Table};
use starlog::sql::insert::run_inserts;
use starlog::sql::lookup::{dimension_lookups, key_seeds};

fn seeded_bank() -> KeyBank {
    let bank = KeyBank::new();
    for table in Table::ALL {
        if table.is_dimension() {
            bank.set(table, 0);
        }
    }
    bank
}

#[test]
fn empty_warehouse_materializes_every_dimension_and_the_fact() {
    let run = Run::fixtures().remove(0);
    let bank = seeded_bank();

    // Lookup phase: one SELECT per dimension, nothing for the fact.
    let lookups = dimension_lookups(star_schema(), &run).unwrap();
    assert_eq!(lookups.len(), 7);
    for (table, sql) in &lookups {
        assert!(sql.starts_with(&format!("SELECT MAX({}.", table.name())));
        assert!(sql.contains(" WHERE "));
    }

    // Insert phase with nothing resolved: every table gets one INSERT.
    let mut known = BTreeMap::new();
    let inserts = run_inserts(star_schema(), &run, &bank, &mut known).unwrap();
    assert_eq!(inserts.len(), 8);
    for table in Table::ALL {
        assert!(inserts.contains_key(&table), "missing {}", table.name());
    }

    // The fact row references the ids allocated for its dimensions.
    let fact = &inserts[&Table::Fact];
    for table in [Table::Plugin, Table::Browser, Table::Url, Table::ErrorMessage] {
        let id = known[&table];
        assert!(fact.contains(&format!("'{id}'")), "{fact}");
    }
}

#[test]
fn duplicate_run_adds_only_a_fact_row() {
    let run = Run::fixtures().remove(0);
    let bank = seeded_bank();

    let mut first = BTreeMap::new();
    run_inserts(star_schema(), &run, &bank, &mut first).unwrap();

    // Same content within the cache window: every dimension hits.
    let mut second = BTreeMap::new();
    let inserts = run_inserts(star_schema(), &run, &bank, &mut second).unwrap();
    assert_eq!(inserts.len(), 1);
    assert!(inserts.contains_key(&Table::Fact));
    assert_eq!(first, second, "the duplicate must reference the same ids");
}

#[test]
fn run_without_error_message_leaves_the_dimension_untouched() {
    let run = Run::fixtures().remove(1);
    let bank = seeded_bank();

    let lookups = dimension_lookups(star_schema(), &run).unwrap();
    assert!(!lookups.contains_key(&Table::ErrorMessage));

    let mut known = BTreeMap::new();
    let inserts = run_inserts(star_schema(), &run, &bank, &mut known).unwrap();
    assert!(!inserts.contains_key(&Table::ErrorMessage));
    assert!(
        inserts[&Table::Fact].contains("NULL"),
        "absent dimension must render NULL in the fact row"
    );
}

#[test]
fn changed_plugin_name_reinserts_only_its_branch() {
    let run = Run::fixtures().remove(0);
    let bank = seeded_bank();
    let mut known = BTreeMap::new();
    run_inserts(star_schema(), &run, &bank, &mut known).unwrap();

    let mut changed = run.clone();
    changed.plugin_name = "Other".to_string();
    let mut ids = BTreeMap::new();
    let inserts = run_inserts(star_schema(), &changed, &bank, &mut ids).unwrap();

    // PluginName changed, so Plugin (which references it) follows;
    // Browser, BrowserName, Url, Domain and ErrorMessage all hit.
    let tables: Vec<Table> = inserts.keys().copied().collect();
    assert_eq!(tables, vec![Table::Fact, Table::Plugin, Table::PluginName]);
    assert_eq!(ids[&Table::Browser], known[&Table::Browser]);
    assert_eq!(ids[&Table::Url], known[&Table::Url]);
}

#[test]
fn embedded_quote_is_escaped_end_to_end() {
    let mut run = Run::fixtures().remove(0);
    run.plugin_name = "O'Brien".to_string();
    let bank = seeded_bank();

    let lookups = dimension_lookups(star_schema(), &run).unwrap();
    assert!(lookups[&Table::PluginName].contains("'O\\'Brien'"));

    let mut known = BTreeMap::new();
    let inserts = run_inserts(star_schema(), &run, &bank, &mut known).unwrap();
    assert!(inserts[&Table::PluginName].contains("'O\\'Brien'"));
}

#[test]
fn restart_continues_ids_after_existing_rows() {
    // Simulate a restart: the seed queries exist for every dimension,
    // and a bank seeded from their results allocates past the
    // existing rows.
    let seeds = key_seeds(star_schema()).unwrap();
    assert_eq!(seeds.len(), 7);

    let bank = KeyBank::new();
    for table in Table::ALL {
        if table.is_dimension() {
            bank.set(table, 5); // MAX(<key>) read at startup
        }
    }

    // A run whose dimensions all already exist: lookup resolves all
    // of them, so the insert phase touches only the fact and no new
    // ids are allocated.
    let run = Run::fixtures().remove(0);
    let mut known: BTreeMap<Table, u64> = Table::ALL
        .into_iter()
        .filter(|t| t.is_dimension())
        .map(|t| (t, 3))
        .collect();
    let inserts = run_inserts(star_schema(), &run, &bank, &mut known).unwrap();
    assert_eq!(inserts.len(), 1);
    assert_eq!(bank.current(Table::Plugin), 5);

    // A genuinely new dimension value continues after the seed.
    let mut changed = run.clone();
    changed.browser_name = "NewBrowser".to_string();
    let mut ids: BTreeMap<Table, u64> = Table::ALL
        .into_iter()
        .filter(|t| t.is_dimension() && *t != Table::Browser && *t != Table::BrowserName)
        .map(|t| (t, 3))
        .collect();
    let inserts = run_inserts(star_schema(), &changed, &bank, &mut ids).unwrap();
    assert!(inserts.contains_key(&Table::BrowserName));
    assert_eq!(ids[&Table::BrowserName], 6);
}
