//! Table level walking: create, drop and the per-list alter policies.

use tracing::{debug, warn};

use super::{DiffSqlGenerator, ModelContext, TablePass};
use crate::change::{AttributeChange, Change, ListItemChange};
use crate::dialect::engine_supports_foreign_keys;
use crate::emit::{ColumnPosition, PartitionSpec, TableOption, TableScope};
use crate::error::Result;
use crate::identity::ObjectIdentity;
use crate::model::{Column, ForeignKey, Index, ObjectKind, Schema, Table, Trigger};

/// Table attributes that never translate into DDL.
const INERT_ATTRIBUTES: &[&str] = &[
    "old_name",
    "id",
    "is_stub",
    "model_only",
    "is_temporary",
    "inserts",
];

/// Attributes that force a rewrite of the whole partitioning clause.
const PARTITION_SET: &[&str] = &[
    "partition_type",
    "partition_expression",
    "subpartition_type",
    "subpartition_expression",
    "subpartition_count",
];

fn table_identity(schema: &Schema, table_name: &str) -> ObjectIdentity {
    ObjectIdentity::object(ObjectKind::Table, schema.previous_name(), table_name)
}

fn trigger_identity(schema: &Schema, trigger: &Trigger) -> ObjectIdentity {
    let name = if trigger.old_name.is_empty() {
        &trigger.name
    } else {
        &trigger.old_name
    };
    ObjectIdentity::object(ObjectKind::Trigger, schema.previous_name(), name)
}

/// Returns true when every change is a position-only move of an index or
/// foreign key, which needs no statement at all.
fn is_reorder_only(attributes: &[AttributeChange]) -> bool {
    !attributes.is_empty()
        && attributes.iter().all(|attr| {
            matches!(attr.name.as_str(), "indices" | "foreign_keys")
                && match &attr.change {
                    Change::ListModified { items } => {
                        items.iter().all(ListItemChange::is_reorder_only)
                    }
                    _ => false,
                }
        })
}

/// Position of a column in the new table.
///
/// The preceding column is taken from the new table, so a renamed `AFTER`
/// target already carries its post-rename name.
fn column_position<'x>(table: &'x Table, column: &Column) -> ColumnPosition<'x> {
    match table.columns.iter().position(|c| c.name == column.name) {
        Some(0) => ColumnPosition::First,
        Some(i) => ColumnPosition::After(table.columns[i - 1].name.as_str()),
        None => ColumnPosition::Keep,
    }
}

fn position_key<T>(list: &[T], matches: impl Fn(&T) -> bool) -> usize {
    list.iter().position(matches).unwrap_or(usize::MAX)
}

impl DiffSqlGenerator<'_> {
    /// Emits the full creation sequence of a table followed by its triggers.
    ///
    /// Triggers are created even when the table itself is filtered out.
    pub fn create_table(&mut self, ctx: &ModelContext<'_>, schema: &Schema, table: &Table) {
        if table.model_only || table.is_stub {
            debug!(table = %table.name, "skipping model-only table");
            return;
        }
        let scope = TableScope::new(schema, table);
        if self.allowed(&table_identity(schema, table.previous_name())) {
            self.emit_create_table(ctx, &scope);
        }
        for trigger in &table.triggers {
            self.create_trigger(&scope, trigger);
        }
    }

    fn emit_create_table(&mut self, ctx: &ModelContext<'_>, scope: &TableScope<'_>) {
        let table = scope.table;
        self.actions.create_table_props_begin(scope);

        self.actions.create_table_columns_begin(scope);
        for column in &table.columns {
            self.actions.create_table_column(scope, column);
        }
        self.actions.create_table_columns_end(scope);

        self.actions.create_table_indexes_begin(scope);
        let primary = table.indices.iter().filter(|i| i.is_primary);
        let secondary = table.indices.iter().filter(|i| !i.is_primary);
        for index in primary.chain(secondary) {
            if self.skip_index(table, index) {
                continue;
            }
            let separate = self.options.generate_create_index && !index.is_primary;
            self.actions.create_table_index(scope, index, separate);
        }
        self.actions.create_table_indexes_end(scope);

        if !self.options.skip_foreign_keys
            && engine_supports_foreign_keys(&table.table_engine) != Some(false)
        {
            self.actions.create_table_fks_begin(scope);
            for fk in &table.foreign_keys {
                if self.fk_is_emittable(ctx, scope.schema, fk) {
                    self.actions.create_table_fk(scope, fk);
                }
            }
            self.actions.create_table_fks_end(scope);
        }

        for option in TableOption::for_create(table) {
            self.actions.create_table_option(scope, option);
        }
        if !table.partition_type.is_empty() {
            self.actions
                .create_table_partitioning(scope, &PartitionSpec::of(table));
        }
        self.actions.create_table_props_end(scope);
    }

    /// Indexes backing foreign keys are left out when requested, and always
    /// when they only back model-only constraints.
    fn skip_index(&self, table: &Table, index: &Index) -> bool {
        if index.is_primary {
            return false;
        }
        if self.options.skip_fk_indexes
            && (index.index_type.eq_ignore_ascii_case("FOREIGN")
                || table.index_used_by_fk(&index.name))
        {
            return true;
        }
        table.index_used_only_by_model_fks(&index.name)
    }

    /// Drops a table after its triggers.
    pub fn drop_table(&mut self, schema: &Schema, table: &Table) {
        if table.model_only || table.is_stub {
            return;
        }
        if !self.allowed(&table_identity(schema, table.previous_name())) {
            return;
        }
        let scope = TableScope::new(schema, table);
        for trigger in &table.triggers {
            self.drop_trigger(&scope, trigger);
        }
        self.actions.drop_table(&scope);
    }

    fn create_trigger(&mut self, scope: &TableScope<'_>, trigger: &Trigger) {
        if trigger.model_only || !self.allowed(&trigger_identity(scope.schema, trigger)) {
            return;
        }
        self.actions.create_trigger(scope, trigger, self.for_alter);
    }

    fn drop_trigger(&mut self, scope: &TableScope<'_>, trigger: &Trigger) {
        if trigger.model_only || !self.allowed(&trigger_identity(scope.schema, trigger)) {
            return;
        }
        self.actions.drop_trigger(scope, trigger, self.for_alter);
    }

    /// Emits the `ALTER TABLE` for one modified table.
    ///
    /// Trigger changes are emitted first and are not subject to the table
    /// filter. `pass` selects whether foreign keys, everything else, or both
    /// are translated.
    ///
    /// # Errors
    ///
    /// Fails on contract violations in the change tree.
    pub fn alter_table(
        &mut self,
        ctx: &ModelContext<'_>,
        schema: &Schema,
        old: &Table,
        new: &Table,
        change: &Change,
        pass: TablePass,
    ) -> Result<()> {
        let attributes = change.attributes()?;
        if new.model_only || new.is_stub {
            return Ok(());
        }
        // The main pass has already applied any rename by the time the
        // foreign key pass runs.
        let scope = if pass == TablePass::ForeignKeysOnly {
            TableScope::altered(schema, new, new)
        } else {
            TableScope::altered(schema, old, new)
        };

        if pass.includes_other() {
            if let Some(triggers) = change.attribute("triggers")? {
                self.alter_triggers(&scope, triggers)?;
            }
        }
        if !self.allowed(&table_identity(schema, &old.name)) {
            return Ok(());
        }
        if is_reorder_only(attributes) {
            debug!(table = %new.name, "only reordered indexes or foreign keys, nothing to alter");
            return Ok(());
        }

        self.actions.alter_table_props_begin(&scope);
        let mut rewrite_partitioning = false;
        let mut count_changed = false;
        let mut definitions = None;
        for attr in attributes {
            let name = attr.name.as_str();
            match name {
                "name" => {
                    if pass.includes_other() {
                        self.actions.alter_table_name(&scope);
                    }
                }
                "columns" => {
                    if pass.includes_other() {
                        self.alter_columns(&scope, &attr.change)?;
                    }
                }
                "indices" => {
                    if pass.includes_other() {
                        self.alter_indices(&scope, &attr.change)?;
                    }
                }
                "foreign_keys" => {
                    if pass.includes_foreign_keys() && !self.options.skip_foreign_keys {
                        self.alter_foreign_keys(ctx, &scope, &attr.change)?;
                    }
                }
                "triggers" => {}
                "partition_count" => count_changed = true,
                "partition_definitions" => definitions = Some(&attr.change),
                _ if PARTITION_SET.contains(&name) => rewrite_partitioning = true,
                _ if INERT_ATTRIBUTES.contains(&name) => {}
                _ => {
                    if pass.includes_other() {
                        match TableOption::from_attribute(name, new) {
                            Some(TableOption::Engine("")) => {}
                            Some(option) => self.actions.alter_table_option(&scope, option),
                            None => warn!(attribute = name, table = %new.name, "unknown table attribute"),
                        }
                    }
                }
            }
        }
        if pass.includes_other() {
            self.alter_partitioning(&scope, rewrite_partitioning, count_changed, definitions)?;
        }
        self.actions.alter_table_props_end(&scope);
        Ok(())
    }

    /// Drops the foreign keys of a modified table that are removed or
    /// redefined, as one statement ahead of all other changes.
    ///
    /// # Errors
    ///
    /// Fails on contract violations in the change tree.
    pub fn drop_changed_foreign_keys(
        &mut self,
        ctx: &ModelContext<'_>,
        schema: &Schema,
        old: &Table,
        new: &Table,
        change: &Change,
    ) -> Result<()> {
        if self.options.skip_foreign_keys || new.model_only {
            return Ok(());
        }
        let Some(fks) = change.attribute("foreign_keys")? else {
            return Ok(());
        };
        let mut drops: Vec<&ForeignKey> = Vec::new();
        for item in fks.items()? {
            match item {
                ListItemChange::Removed { value } => drops.push(value.as_foreign_key()?),
                ListItemChange::Modified { old, .. } => drops.push(old.as_foreign_key()?),
                _ => {}
            }
        }
        drops.retain(|fk| self.fk_is_emittable(ctx, schema, fk));
        if drops.is_empty() || !self.allowed(&table_identity(schema, &old.name)) {
            return Ok(());
        }

        let scope = TableScope::altered(schema, old, new);
        self.actions.alter_table_props_begin(&scope);
        self.actions.alter_table_fks_begin(&scope);
        for fk in drops {
            self.actions.alter_table_drop_fk(&scope, fk);
        }
        self.actions.alter_table_fks_end(&scope);
        self.actions.alter_table_props_end(&scope);
        Ok(())
    }

    /// Column policy: drops, then adds, then moves, then in-place changes.
    ///
    /// `AFTER` targets use the new table's names, which are valid once the
    /// moves and renames of this statement are applied.
    fn alter_columns(&mut self, scope: &TableScope<'_>, change: &Change) -> Result<()> {
        let items = change.items()?;
        let mut drops = Vec::new();
        let mut adds = Vec::new();
        let mut moved = Vec::new();
        let mut changed = Vec::new();

        for item in items {
            match item {
                ListItemChange::Added { value } => adds.push(value.as_column()?),
                ListItemChange::Removed { value } => drops.push(value.as_column()?),
                ListItemChange::Modified { old, new, .. } => {
                    changed.push((old.as_column()?, new.as_column()?));
                }
                ListItemChange::OrderChanged {
                    old,
                    new,
                    change: Some(_),
                } => moved.push((old.as_column()?, new.as_column()?)),
                ListItemChange::OrderChanged { change: None, .. } => {}
            }
        }
        if drops.is_empty() && adds.is_empty() && moved.is_empty() && changed.is_empty() {
            return Ok(());
        }

        let table = scope.table;
        adds.sort_by_key(|c| position_key(&table.columns, |t| t.name == c.name));
        moved.sort_by_key(|(_, n)| position_key(&table.columns, |t| t.name == n.name));

        self.actions.alter_table_columns_begin(scope);
        for column in drops {
            self.actions.alter_table_drop_column(scope, column);
        }
        for column in adds {
            let position = column_position(table, column);
            self.actions.alter_table_add_column(scope, column, position);
        }
        for (old, new) in moved {
            let position = column_position(table, new);
            self.actions.alter_table_change_column(scope, old, new, position);
        }
        for (old, new) in changed {
            self.actions
                .alter_table_change_column(scope, old, new, ColumnPosition::Keep);
        }
        self.actions.alter_table_columns_end(scope);
        Ok(())
    }

    fn alter_indices(&mut self, scope: &TableScope<'_>, change: &Change) -> Result<()> {
        let items = change.items()?;
        self.actions.alter_table_indexes_begin(scope);
        for item in items {
            match item {
                ListItemChange::Added { value } => {
                    let index = value.as_index()?;
                    if !self.skip_index(scope.table, index) {
                        self.actions.alter_table_add_index(scope, index);
                    }
                }
                ListItemChange::Removed { value } => {
                    self.actions.alter_table_drop_index(scope, value.as_index()?);
                }
                ListItemChange::Modified { old, new, .. } => {
                    self.actions
                        .alter_table_change_index(scope, old.as_index()?, new.as_index()?);
                }
                ListItemChange::OrderChanged {
                    old,
                    new,
                    change: Some(_),
                } => {
                    self.actions.alter_table_drop_index(scope, old.as_index()?);
                    self.actions.alter_table_add_index(scope, new.as_index()?);
                }
                ListItemChange::OrderChanged { change: None, .. } => {}
            }
        }
        self.actions.alter_table_indexes_end(scope);
        Ok(())
    }

    /// Removed and redefined constraints were already dropped by
    /// [`Self::drop_changed_foreign_keys`]; only additions remain here.
    fn alter_foreign_keys(
        &mut self,
        ctx: &ModelContext<'_>,
        scope: &TableScope<'_>,
        change: &Change,
    ) -> Result<()> {
        let items = change.items()?;
        self.actions.alter_table_fks_begin(scope);
        for item in items {
            match item {
                ListItemChange::Added { value } | ListItemChange::Modified { new: value, .. } => {
                    let fk = value.as_foreign_key()?;
                    if self.fk_is_addable(ctx, scope.schema, fk) {
                        self.actions.alter_table_add_fk(scope, fk);
                    }
                }
                ListItemChange::OrderChanged {
                    old,
                    new,
                    change: Some(_),
                } => {
                    let old = old.as_foreign_key()?;
                    let new = new.as_foreign_key()?;
                    if self.fk_is_emittable(ctx, scope.schema, old) {
                        self.actions.alter_table_drop_fk(scope, old);
                    }
                    if self.fk_is_addable(ctx, scope.schema, new) {
                        self.actions.alter_table_add_fk(scope, new);
                    }
                }
                ListItemChange::Removed { .. } | ListItemChange::OrderChanged { change: None, .. } => {}
            }
        }
        self.actions.alter_table_fks_end(scope);
        Ok(())
    }

    fn alter_partitioning(
        &mut self,
        scope: &TableScope<'_>,
        rewrite: bool,
        count_changed: bool,
        definitions: Option<&Change>,
    ) -> Result<()> {
        let spec = PartitionSpec::of(scope.table);
        if rewrite || (count_changed && spec.count == 0) {
            self.actions.alter_table_partitioning(scope, &spec);
            return Ok(());
        }
        if count_changed {
            if spec.is_hash_or_key() {
                let old = scope.previous.map_or(0, |t| t.partition_count);
                self.actions.alter_table_partition_count(scope, old, spec.count);
            } else if definitions.is_none() {
                self.actions.alter_table_partitioning(scope, &spec);
                return Ok(());
            }
        }
        let Some(definitions) = definitions else {
            return Ok(());
        };
        if !spec.has_definitions() {
            return Ok(());
        }
        for item in definitions.items()? {
            match item {
                ListItemChange::Added { value } => {
                    self.actions
                        .alter_table_add_partition(scope, value.as_partition()?);
                }
                ListItemChange::Removed { value } => {
                    self.actions
                        .alter_table_drop_partition(scope, &value.as_partition()?.name);
                }
                ListItemChange::Modified { old, new, .. }
                | ListItemChange::OrderChanged {
                    old,
                    new,
                    change: Some(_),
                } => {
                    self.actions.alter_table_reorganize_partition(
                        scope,
                        old.as_partition()?,
                        new.as_partition()?,
                    );
                }
                ListItemChange::OrderChanged { change: None, .. } => {}
            }
        }
        Ok(())
    }

    /// Drops removed and redefined triggers, then creates new and redefined
    /// ones in the order they have on the new table.
    fn alter_triggers(&mut self, scope: &TableScope<'_>, change: &Change) -> Result<()> {
        let mut creates: Vec<&Trigger> = Vec::new();
        for item in change.items()? {
            match item {
                ListItemChange::Added { value } => creates.push(value.as_trigger()?),
                ListItemChange::Removed { value } => self.drop_trigger(scope, value.as_trigger()?),
                ListItemChange::Modified { old, new, .. }
                | ListItemChange::OrderChanged {
                    old,
                    new,
                    change: Some(_),
                } => {
                    self.drop_trigger(scope, old.as_trigger()?);
                    creates.push(new.as_trigger()?);
                }
                ListItemChange::OrderChanged { change: None, .. } => {}
            }
        }
        creates.sort_by_key(|t| position_key(&scope.table.triggers, |o| o.name == t.name));
        for trigger in creates {
            self.create_trigger(scope, trigger);
        }
        Ok(())
    }
}
