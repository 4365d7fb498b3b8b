//! Schema object graph consumed by the generator.
//!
//! These types mirror the MySQL model a change tree refers to: a catalog owns
//! schemata, a schema owns tables, views and routines, and a table owns its
//! columns, indexes, foreign keys, triggers and partition definitions. Every
//! named object carries both its current `name` and its `old_name` so the DDL
//! backend can address the pre-change identity in `ALTER`/`DROP` targets.
//!
//! The graph is read-only input. Parent links are not stored; the walker
//! passes the enclosing schema and table down explicitly.

mod catalog;
mod table;

pub use catalog::{
    AttachedScript, Catalog, DocumentInfo, ObjectKind, ObjectRef, Role, RolePrivilege, Routine,
    Schema, ScriptPosition, User, View,
};
pub use table::{
    Column, ForeignKey, Index, IndexColumn, PartitionDefinition, SimpleType, Table, TableData,
    Trigger, TypeGroup,
};

/// Returns the identity an object had before the change.
///
/// Falls back to the current name when no old name was recorded.
#[must_use]
pub fn old_or_current<'a>(old_name: &'a str, name: &'a str) -> &'a str {
    if old_name.is_empty() {
        name
    } else {
        old_name
    }
}
