#![allow(dead_code)]

use oxide_ddl::prelude::*;

/// `mydb.table1(idtable1 PK, name, email)`.
pub fn table1() -> Table {
    Table::new("table1")
        .column(Column::new("idtable1", "INT").not_null())
        .column(Column::new("name", "VARCHAR(45)"))
        .column(Column::new("email", "VARCHAR(45)"))
        .index(Index::primary(&["idtable1"]))
}

/// A catalog holding one schema `mydb` with `tables`.
pub fn mydb(tables: Vec<Table>) -> Catalog {
    let schema = tables
        .into_iter()
        .fold(Schema::new("mydb"), |schema, table| schema.table(table));
    Catalog::new().schema(schema)
}

pub fn column(column: &Column) -> Value {
    Value::Column(Box::new(column.clone()))
}

pub fn index(index: &Index) -> Value {
    Value::Index(Box::new(index.clone()))
}

pub fn table(table: &Table) -> Value {
    Value::Table(Box::new(table.clone()))
}

/// A list attribute change.
pub fn list(name: &str, items: Vec<ListItemChange>) -> AttributeChange {
    AttributeChange::new(name, Change::list(items))
}

/// A modified table item carrying `attributes`.
pub fn modified_table(old: &Table, new: &Table, attributes: Vec<AttributeChange>) -> ListItemChange {
    ListItemChange::Modified {
        old: table(old),
        new: table(new),
        change: Some(Box::new(Change::modified(attributes))),
    }
}

/// A catalog change whose only modified schema is the first one, with
/// `tables` as its table list changes.
pub fn catalog_change(old: &Catalog, new: &Catalog, tables: Vec<ListItemChange>) -> Change {
    Change::modified(vec![list(
        "schemata",
        vec![ListItemChange::Modified {
            old: Value::Schema(Box::new(old.schemata[0].clone())),
            new: Value::Schema(Box::new(new.schemata[0].clone())),
            change: Some(Box::new(Change::modified(vec![list("tables", tables)]))),
        }],
    )])
}

/// Walks `change` into an ordered list store and returns its statements.
pub fn alter_statements(
    old: &Catalog,
    new: &Catalog,
    change: &Change,
    traits: DbTraits,
) -> Vec<String> {
    alter_statements_with(old, new, change, traits, GeneratorOptions::default())
}

/// [`alter_statements`] with explicit walker options.
pub fn alter_statements_with(
    old: &Catalog,
    new: &Catalog,
    change: &Change,
    traits: DbTraits,
    options: GeneratorOptions,
) -> Vec<String> {
    let mut store = FragmentStore::list();
    let mut backend = SqlGenerator::new(&mut store, traits, options.clone());
    DiffSqlGenerator::new(&mut backend, options)
        .process_diff_change(change, Some(old), Some(new))
        .unwrap_or_else(|e| panic!("walk failed: {e}"));
    store.statements().into_iter().map(str::to_string).collect()
}

/// A scalar attribute change.
pub fn attribute(name: &str, old: &str, new: &str) -> AttributeChange {
    AttributeChange::new(name, Change::text(old, new))
}

/// Byte offset of `needle` in `haystack`, failing the test when absent.
pub fn offset(haystack: &str, needle: &str) -> usize {
    haystack
        .find(needle)
        .unwrap_or_else(|| panic!("missing {needle:?} in:\n{haystack}"))
}
