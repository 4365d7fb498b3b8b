//! Diff walker: turns a change tree into emission calls.
//!
//! The walker recognizes the structural patterns of a change tree (object
//! added, removed or modified; list items added, removed, modified or
//! reordered) and calls the matching [`EmitActions`] method for each
//! discrete DDL concern. It never produces text itself.
//!
//! # Ordering
//!
//! - Within a schema alter, foreign keys that go away are dropped first in a
//!   pre-pass so that later table drops and column changes never trip over a
//!   dangling constraint.
//! - With `separate_foreign_keys`, all other table changes run before any
//!   foreign key is added.
//! - Views follow tables and routines follow views.
//!
//! Objects are checked against the allow-lists by their pre-change identity
//! before anything is emitted for them.

mod schema;
mod table;

use tracing::debug;

use crate::change::{Change, Value};
use crate::emit::EmitActions;
use crate::error::{DdlError, Result};
use crate::identity::ObjectIdentity;
use crate::model::{Catalog, ForeignKey, Schema, Table};
use crate::options::GeneratorOptions;

/// Catalogs a change tree was computed from.
///
/// Used to resolve references that leave the object being processed, such
/// as the table a foreign key points at.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelContext<'a> {
    pub source: Option<&'a Catalog>,
    pub target: Option<&'a Catalog>,
}

impl<'a> ModelContext<'a> {
    /// Creates a context over the old and new catalogs.
    #[must_use]
    pub const fn new(source: Option<&'a Catalog>, target: Option<&'a Catalog>) -> Self {
        Self { source, target }
    }

    /// Resolves the table a foreign key references.
    ///
    /// The new catalog wins over the old one; `owner` is searched last so
    /// that a standalone schema still resolves its own tables.
    #[must_use]
    pub fn referenced_table<'s>(
        &self,
        owner: &'s Schema,
        fk: &ForeignKey,
        case_sensitive: bool,
    ) -> Option<&'s Table>
    where
        'a: 's,
    {
        let reference = fk.referenced_table.as_ref()?;
        let schema = if reference.schema.is_empty() {
            owner.name.as_str()
        } else {
            reference.schema.as_str()
        };
        [self.target, self.source]
            .into_iter()
            .flatten()
            .find_map(|catalog| catalog.find_table(schema, &reference.name, case_sensitive))
            .or_else(|| {
                let same_schema = if case_sensitive {
                    owner.name == schema
                } else {
                    owner.name.eq_ignore_ascii_case(schema)
                };
                if same_schema {
                    owner.find_table(&reference.name, case_sensitive)
                } else {
                    None
                }
            })
    }
}

/// Which table changes a pass over a schema's tables emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TablePass {
    Everything,
    AllButForeignKeys,
    ForeignKeysOnly,
}

impl TablePass {
    const fn includes_foreign_keys(self) -> bool {
        matches!(self, Self::Everything | Self::ForeignKeysOnly)
    }

    const fn includes_other(self) -> bool {
        matches!(self, Self::Everything | Self::AllButForeignKeys)
    }
}

/// Walks change trees and drives an emission backend.
pub struct DiffSqlGenerator<'e> {
    actions: &'e mut dyn EmitActions,
    options: GeneratorOptions,
    /// Set while walking a modification, so created objects are re-creations.
    for_alter: bool,
}

impl<'e> DiffSqlGenerator<'e> {
    /// Creates a walker over a backend.
    pub fn new(actions: &'e mut dyn EmitActions, options: GeneratorOptions) -> Self {
        Self {
            actions,
            options,
            for_alter: false,
        }
    }

    /// Processes the root of a change tree.
    ///
    /// An added or removed catalog or schema is created or dropped in full.
    /// A modification is interpreted as a change of the catalog from
    /// `source` to `target`, both of which are then required.
    ///
    /// # Errors
    ///
    /// Fails on contract violations in the change tree.
    pub fn process_diff_change(
        &mut self,
        change: &Change,
        source: Option<&Catalog>,
        target: Option<&Catalog>,
    ) -> Result<()> {
        match change {
            Change::ValueAdded { value } => {
                self.for_alter = false;
                match value {
                    Value::Catalog(catalog) => {
                        let ctx = ModelContext::new(source, Some(target.unwrap_or(catalog)));
                        self.create_catalog(&ctx, catalog);
                        Ok(())
                    }
                    Value::Schema(schema) => {
                        self.create_schema(&ModelContext::new(source, target), schema);
                        Ok(())
                    }
                    other => Err(unexpected_root(other)),
                }
            }
            Change::ValueRemoved { value } => {
                self.for_alter = false;
                match value {
                    Value::Catalog(catalog) => {
                        self.drop_catalog(catalog);
                        Ok(())
                    }
                    Value::Schema(schema) => {
                        self.drop_schema(schema);
                        Ok(())
                    }
                    other => Err(unexpected_root(other)),
                }
            }
            Change::ObjectModified { .. } => {
                self.for_alter = true;
                let (Some(old), Some(new)) = (source, target) else {
                    return Err(DdlError::MissingContext(
                        "a catalog modification needs both the old and the new catalog".into(),
                    ));
                };
                self.alter_catalog(&ModelContext::new(source, target), old, new, change)
            }
            other => Err(DdlError::UnexpectedChange {
                expected: "ObjectModified",
                found: other.kind_name(),
            }),
        }
    }

    /// Returns true if the object passes the allow-list for its kind.
    fn allowed(&self, identity: &ObjectIdentity) -> bool {
        if !self.options.use_filtered_lists {
            return true;
        }
        let allowed = self
            .options
            .filters
            .allows(identity, self.options.case_sensitive);
        if !allowed {
            debug!(
                object = %identity.qualified(true),
                kind = identity.kind.as_str(),
                "skipping filtered object"
            );
        }
        allowed
    }

    /// Returns true if a foreign key can be materialized.
    ///
    /// Model-only constraints and constraints whose referenced table is
    /// missing or model-only are skipped.
    fn fk_is_emittable(&self, ctx: &ModelContext<'_>, schema: &Schema, fk: &ForeignKey) -> bool {
        if fk.model_only {
            debug!(fk = %fk.name, "skipping model-only foreign key");
            return false;
        }
        match ctx.referenced_table(schema, fk, self.options.case_sensitive) {
            Some(table) if table.model_only => {
                debug!(fk = %fk.name, table = %table.name, "skipping foreign key to model-only table");
                false
            }
            Some(_) => true,
            None => {
                debug!(fk = %fk.name, "skipping foreign key with unresolved reference");
                false
            }
        }
    }

    /// Like [`Self::fk_is_emittable`], but the referenced table must also
    /// exist after the change. `schema` is the post-change schema.
    fn fk_is_addable(&self, ctx: &ModelContext<'_>, schema: &Schema, fk: &ForeignKey) -> bool {
        if !self.fk_is_emittable(ctx, schema, fk) {
            return false;
        }
        let after = ModelContext::new(None, ctx.target);
        let survives = after
            .referenced_table(schema, fk, self.options.case_sensitive)
            .is_some();
        if !survives {
            debug!(fk = %fk.name, "skipping foreign key to dropped table");
        }
        survives
    }
}

fn unexpected_root(value: &Value) -> DdlError {
    DdlError::UnexpectedValue {
        expected: "Catalog or Schema",
        found: value.kind_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ObjectRef;

    #[test]
    fn test_referenced_table_prefers_target() {
        let old = Catalog::new().schema(Schema::new("s").table(Table::new("parent")));
        let mut moved = Table::new("parent");
        moved.comment = "new".into();
        let new = Catalog::new().schema(Schema::new("s").table(moved));
        let owner = Schema::new("s");
        let fk = ForeignKey::new("fk", &["p"], ObjectRef::table("s", "parent"), &["id"]);

        let ctx = ModelContext::new(Some(&old), Some(&new));
        let found = ctx.referenced_table(&owner, &fk, true).unwrap();
        assert_eq!(found.comment, "new");
    }

    #[test]
    fn test_referenced_table_falls_back_to_owner() {
        let owner = Schema::new("s").table(Table::new("parent"));
        let fk = ForeignKey::new("fk", &["p"], ObjectRef::table("", "parent"), &["id"]);
        let ctx = ModelContext::default();
        assert!(ctx.referenced_table(&owner, &fk, true).is_some());

        let elsewhere = ForeignKey::new("fk", &["p"], ObjectRef::table("other", "parent"), &["id"]);
        assert!(ctx.referenced_table(&owner, &elsewhere, true).is_none());
    }

    #[test]
    fn test_pass_membership() {
        assert!(TablePass::Everything.includes_foreign_keys());
        assert!(TablePass::Everything.includes_other());
        assert!(!TablePass::AllButForeignKeys.includes_foreign_keys());
        assert!(!TablePass::ForeignKeysOnly.includes_other());
    }
}
