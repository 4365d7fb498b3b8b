//! Table ordering for export scripts.

use std::collections::HashSet;

use crate::model::{Schema, Table};

fn name_key(name: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        name.to_string()
    } else {
        name.to_lowercase()
    }
}

/// Orders a schema's tables so that every table follows the tables its
/// foreign keys reference.
///
/// Model-only and stub tables are left out. References to other schemata
/// are not followed; cycles, including self references, are broken by the
/// visited set.
#[must_use]
pub fn sort_by_foreign_keys(schema: &Schema, case_sensitive: bool) -> Vec<&Table> {
    let mut visited = HashSet::new();
    let mut sorted = Vec::with_capacity(schema.tables.len());
    for table in &schema.tables {
        visit(schema, table, case_sensitive, &mut visited, &mut sorted);
    }
    sorted
}

fn visit<'a>(
    schema: &'a Schema,
    table: &'a Table,
    case_sensitive: bool,
    visited: &mut HashSet<String>,
    sorted: &mut Vec<&'a Table>,
) {
    if table.model_only || table.is_stub || !visited.insert(name_key(&table.name, case_sensitive)) {
        return;
    }
    for fk in table.foreign_keys.iter().filter(|fk| !fk.model_only) {
        let Some(reference) = &fk.referenced_table else {
            continue;
        };
        if !reference.schema.is_empty()
            && name_key(&reference.schema, case_sensitive) != name_key(&schema.name, case_sensitive)
        {
            continue;
        }
        if let Some(parent) = schema.find_table(&reference.name, case_sensitive) {
            visit(schema, parent, case_sensitive, visited, sorted);
        }
    }
    sorted.push(table);
}

/// Orders a schema's materialized tables by name.
#[must_use]
pub fn sort_alphabetically(schema: &Schema, case_sensitive: bool) -> Vec<&Table> {
    let mut tables: Vec<&Table> = schema
        .tables
        .iter()
        .filter(|t| !t.model_only && !t.is_stub)
        .collect();
    tables.sort_by_cached_key(|t| name_key(&t.name, case_sensitive));
    tables
}
