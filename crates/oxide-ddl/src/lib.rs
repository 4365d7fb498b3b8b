//! MySQL schema diff to DDL generator.
//!
//! `oxide-ddl` turns the structured difference between two versions of a
//! MySQL schema model into the DDL that takes a live database from one
//! version to the other, and can forward-engineer a complete model into a
//! standalone creation script.
//!
//! # Architecture
//!
//! - **Model** - the schema object graph (catalog, schemata, tables, ...)
//! - **Change** - the diff tree produced by an external comparison
//! - **Walker** - recognizes change patterns and drives an emission backend
//! - **Emit** - the [`emit::EmitActions`] trait every backend implements
//! - **Backend** - MySQL DDL ([`backend::SqlGenerator`]) and a prose report
//!   ([`backend::ReportGenerator`])
//! - **Store** - the caller-owned container of generated statements
//! - **Composer** - lays stored statements out as export and sync scripts
//!
//! # Example
//!
//! ```rust
//! use oxide_ddl::prelude::*;
//!
//! let catalog = Catalog::new().schema(
//!     Schema::new("shop").table(
//!         Table::new("users")
//!             .column(Column::new("id", "INT").not_null().auto_increment())
//!             .index(Index::primary(&["id"])),
//!     ),
//! );
//!
//! let script = make_export_script(
//!     &catalog,
//!     None,
//!     None,
//!     &ComposerOptions::default(),
//!     &DbTraits::default(),
//! )
//! .unwrap();
//! assert!(script.contains("CREATE TABLE IF NOT EXISTS `shop`.`users`"));
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Forward engineer a catalog
//! oxide-ddl export --catalog model.json
//!
//! # Script a change between two catalogs for a 5.7 server
//! oxide-ddl --target-version 5.7.0 sync --source old.json --target new.json --change diff.json
//! ```

pub mod backend;
pub mod change;
pub mod composer;
pub mod dialect;
pub mod emit;
pub mod error;
pub mod grants;
pub mod identity;
pub mod model;
pub mod options;
pub mod store;
pub mod walker;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::backend::{ReportGenerator, SqlGenerator};
    pub use crate::change::{AttributeChange, Change, ListItemChange, Value};
    pub use crate::composer::{
        alter_script_for_object, create_script_for_object, generate_report, generate_sql,
        make_alter_script, make_export_script,
    };
    pub use crate::emit::EmitActions;
    pub use crate::error::{DdlError, Result};
    pub use crate::grants::generate_grants;
    pub use crate::identity::{ObjectFilters, ObjectIdentity};
    pub use crate::model::{
        Catalog, Column, ForeignKey, Index, ObjectKind, ObjectRef, PartitionDefinition, Role,
        RolePrivilege, Routine, Schema, Table, TableData, Trigger, User, View,
    };
    pub use crate::options::{ComposerOptions, DbTraits, GeneratorOptions, ServerVersion};
    pub use crate::store::{Fragment, FragmentList, FragmentStore};
    pub use crate::walker::DiffSqlGenerator;
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn test_walker_drives_custom_store() {
        let catalog = Catalog::new().schema(Schema::new("shop").table(Table::new("t")));
        let change = Change::ValueAdded {
            value: Value::Schema(Box::new(catalog.schemata[0].clone())),
        };
        let mut store = FragmentStore::list();
        let options = GeneratorOptions::default();
        let mut backend = SqlGenerator::new(&mut store, DbTraits::default(), options.clone());
        DiffSqlGenerator::new(&mut backend, options)
            .process_diff_change(&change, None, Some(&catalog))
            .unwrap();

        let statements = store.statements();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE SCHEMA IF NOT EXISTS `shop`"));
        assert!(statements[1].starts_with("CREATE TABLE IF NOT EXISTS `shop`.`t`"));
    }

    #[test]
    fn test_root_must_be_catalog_or_schema() {
        let change = Change::ValueAdded {
            value: Value::Table(Box::new(Table::new("t"))),
        };
        let mut report = ReportGenerator::new();
        let err = DiffSqlGenerator::new(&mut report, GeneratorOptions::default())
            .process_diff_change(&change, None, None)
            .unwrap_err();
        assert!(matches!(err, DdlError::UnexpectedValue { .. }));
    }
}
