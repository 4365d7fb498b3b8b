//! Catalog and schema level walking, including views, routines and users.

use tracing::debug;

use super::{DiffSqlGenerator, ModelContext, TablePass};
use crate::change::{Change, ListItemChange};
use crate::error::Result;
use crate::identity::ObjectIdentity;
use crate::model::{Catalog, ObjectKind, Routine, Schema, User, View};

impl DiffSqlGenerator<'_> {
    pub(super) fn create_catalog(&mut self, ctx: &ModelContext<'_>, catalog: &Catalog) {
        for schema in &catalog.schemata {
            self.create_schema(ctx, schema);
        }
        for user in &catalog.users {
            self.create_user(catalog, user);
        }
    }

    pub(super) fn drop_catalog(&mut self, catalog: &Catalog) {
        for schema in &catalog.schemata {
            self.drop_schema(schema);
        }
        for user in &catalog.users {
            self.drop_user(user);
        }
    }

    /// Creates a schema and everything it owns.
    pub fn create_schema(&mut self, ctx: &ModelContext<'_>, schema: &Schema) {
        if schema.model_only {
            debug!(schema = %schema.name, "skipping model-only schema");
            return;
        }
        if self.allowed(&ObjectIdentity::schema(schema.previous_name())) {
            self.actions.create_schema(schema);
        }
        for table in &schema.tables {
            self.create_table(ctx, schema, table);
        }
        for view in &schema.views {
            self.create_view(schema, view);
        }
        for routine in &schema.routines {
            self.create_routine(schema, routine);
        }
    }

    /// Drops a schema. Its children are dropped too, but with list insertion
    /// suspended because the schema drop already removes them.
    pub fn drop_schema(&mut self, schema: &Schema) {
        if schema.model_only {
            return;
        }
        if !self.allowed(&ObjectIdentity::schema(schema.previous_name())) {
            return;
        }
        self.actions.drop_schema(schema);
        self.actions.disable_list_insert(true);
        for table in &schema.tables {
            self.drop_table(schema, table);
        }
        for view in &schema.views {
            self.drop_view(schema, view);
        }
        for routine in &schema.routines {
            self.drop_routine(schema, routine);
        }
        self.actions.disable_list_insert(false);
    }

    pub(super) fn alter_catalog(
        &mut self,
        ctx: &ModelContext<'_>,
        _old: &Catalog,
        new: &Catalog,
        change: &Change,
    ) -> Result<()> {
        if let Some(schemata) = change.attribute("schemata")? {
            for item in schemata.items()? {
                match item {
                    ListItemChange::Added { value } => self.create_schema(ctx, value.as_schema()?),
                    ListItemChange::Removed { value } => self.drop_schema(value.as_schema()?),
                    ListItemChange::Modified {
                        old,
                        new,
                        change: Some(change),
                    }
                    | ListItemChange::OrderChanged {
                        old,
                        new,
                        change: Some(change),
                    } => self.alter_schema(ctx, old.as_schema()?, new.as_schema()?, change)?,
                    ListItemChange::Modified { change: None, .. }
                    | ListItemChange::OrderChanged { change: None, .. } => {}
                }
            }
        }
        if let Some(users) = change.attribute("users")? {
            for item in users.items()? {
                match item {
                    ListItemChange::Added { value } => self.create_user(new, value.as_user()?),
                    ListItemChange::Removed { value } => self.drop_user(value.as_user()?),
                    ListItemChange::Modified { old, new: value, .. }
                    | ListItemChange::OrderChanged {
                        old,
                        new: value,
                        change: Some(_),
                    } => {
                        self.drop_user(old.as_user()?);
                        self.create_user(new, value.as_user()?);
                    }
                    ListItemChange::OrderChanged { change: None, .. } => {}
                }
            }
        }
        Ok(())
    }

    /// Emits the changes of one modified schema.
    ///
    /// # Errors
    ///
    /// Fails on contract violations in the change tree.
    pub fn alter_schema(
        &mut self,
        ctx: &ModelContext<'_>,
        old: &Schema,
        new: &Schema,
        change: &Change,
    ) -> Result<()> {
        let attributes = change.attributes()?;
        if new.model_only {
            return Ok(());
        }

        if self.allowed(&ObjectIdentity::schema(&old.name)) {
            self.actions.alter_schema_props_begin(new);
            for attr in attributes {
                match attr.name.as_str() {
                    "name" => self.actions.alter_schema_name(old, new),
                    "default_character_set_name" => self
                        .actions
                        .alter_schema_default_charset(new, &new.default_character_set_name),
                    "default_collation_name" => self
                        .actions
                        .alter_schema_default_collate(new, &new.default_collation_name),
                    _ => {}
                }
            }
            self.actions.alter_schema_props_end(new);
        }

        if let Some(tables) = change.attribute("tables")? {
            self.alter_schema_tables(ctx, new, tables)?;
        }
        if let Some(views) = change.attribute("views")? {
            self.alter_views(new, views)?;
        }
        if let Some(routines) = change.attribute("routines")? {
            self.alter_routines(new, routines)?;
        }
        Ok(())
    }

    fn alter_schema_tables(
        &mut self,
        ctx: &ModelContext<'_>,
        schema: &Schema,
        change: &Change,
    ) -> Result<()> {
        let items = change.items()?;

        for item in items {
            if let Some((old, new, Some(change))) = item.modification() {
                self.drop_changed_foreign_keys(ctx, schema, old.as_table()?, new.as_table()?, change)?;
            }
        }

        let main_pass = if self.options.separate_foreign_keys {
            TablePass::AllButForeignKeys
        } else {
            TablePass::Everything
        };
        for item in items {
            match item {
                ListItemChange::Added { value } => self.create_table(ctx, schema, value.as_table()?),
                ListItemChange::Removed { value } => self.drop_table(schema, value.as_table()?),
                _ => {
                    if let Some((old, new, Some(change))) = item.modification() {
                        self.alter_table(ctx, schema, old.as_table()?, new.as_table()?, change, main_pass)?;
                    }
                }
            }
        }

        if self.options.separate_foreign_keys && !self.options.skip_foreign_keys {
            for item in items {
                if let Some((old, new, Some(change))) = item.modification() {
                    self.alter_table(
                        ctx,
                        schema,
                        old.as_table()?,
                        new.as_table()?,
                        change,
                        TablePass::ForeignKeysOnly,
                    )?;
                }
            }
        }
        Ok(())
    }

    fn alter_views(&mut self, schema: &Schema, change: &Change) -> Result<()> {
        for item in change.items()? {
            match item {
                ListItemChange::Added { value } => self.create_view(schema, value.as_view()?),
                ListItemChange::Removed { value } => self.drop_view(schema, value.as_view()?),
                _ => {
                    if let Some((old, new, _)) = item.modification() {
                        let (old, new) = (old.as_view()?, new.as_view()?);
                        self.create_view(schema, new);
                        if !self.same_name(&old.name, &new.name) {
                            self.drop_view(schema, old);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn alter_routines(&mut self, schema: &Schema, change: &Change) -> Result<()> {
        for item in change.items()? {
            match item {
                ListItemChange::Added { value } => self.create_routine(schema, value.as_routine()?),
                ListItemChange::Removed { value } => self.drop_routine(schema, value.as_routine()?),
                _ => {
                    if let Some((old, new, _)) = item.modification() {
                        let (old, new) = (old.as_routine()?, new.as_routine()?);
                        if !self.allowed(&routine_identity(schema, old)) || new.model_only {
                            continue;
                        }
                        let dropped = if self.same_name(&old.name, &new.name) { new } else { old };
                        self.actions.drop_routine(schema, dropped, true);
                        self.actions.create_routine(schema, new, true);
                    }
                }
            }
        }
        Ok(())
    }

    fn same_name(&self, a: &str, b: &str) -> bool {
        if self.options.case_sensitive {
            a == b
        } else {
            a.eq_ignore_ascii_case(b)
        }
    }

    /// Creates a view if it is materialized and passes the filter.
    pub fn create_view(&mut self, schema: &Schema, view: &View) {
        if view.model_only || !self.allowed(&view_identity(schema, view)) {
            return;
        }
        self.actions.create_view(schema, view, self.for_alter);
    }

    fn drop_view(&mut self, schema: &Schema, view: &View) {
        if view.model_only || !self.allowed(&view_identity(schema, view)) {
            return;
        }
        self.actions.drop_view(schema, view);
    }

    /// Creates a routine if it is materialized and passes the filter.
    pub fn create_routine(&mut self, schema: &Schema, routine: &Routine) {
        if routine.model_only || !self.allowed(&routine_identity(schema, routine)) {
            return;
        }
        self.actions.create_routine(schema, routine, self.for_alter);
    }

    fn drop_routine(&mut self, schema: &Schema, routine: &Routine) {
        if routine.model_only || !self.allowed(&routine_identity(schema, routine)) {
            return;
        }
        self.actions.drop_routine(schema, routine, self.for_alter);
    }

    /// Creates a user with its grants.
    pub fn create_user(&mut self, catalog: &Catalog, user: &User) {
        if user.model_only || !self.allowed(&user_identity(user)) {
            return;
        }
        self.actions.create_user(catalog, user);
    }

    fn drop_user(&mut self, user: &User) {
        if user.model_only || !self.allowed(&user_identity(user)) {
            return;
        }
        self.actions.drop_user(user);
    }
}

fn view_identity(schema: &Schema, view: &View) -> ObjectIdentity {
    let name = if view.old_name.is_empty() { &view.name } else { &view.old_name };
    ObjectIdentity::object(ObjectKind::View, schema.previous_name(), name)
}

fn routine_identity(schema: &Schema, routine: &Routine) -> ObjectIdentity {
    let name = if routine.old_name.is_empty() {
        &routine.name
    } else {
        &routine.old_name
    };
    ObjectIdentity::object(ObjectKind::Routine, schema.previous_name(), name)
}

fn user_identity(user: &User) -> ObjectIdentity {
    let name = if user.old_name.is_empty() { &user.name } else { &user.old_name };
    ObjectIdentity::user(name)
}
