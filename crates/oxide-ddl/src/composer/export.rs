//! Forward engineering script assembled from create and drop fragment maps.

use tracing::{debug, info};

use super::script::{banner, sql_literal, ScriptWriter};
use super::sort::{sort_alphabetically, sort_by_foreign_keys};
use crate::dialect::quote;
use crate::error::Result;
use crate::grants::generate_grants;
use crate::identity::ObjectIdentity;
use crate::model::{Catalog, ObjectKind, Routine, Schema, ScriptPosition, Table, Trigger, View};
use crate::options::ComposerOptions;
use crate::store::FragmentStore;

/// Lays out the statements of a whole catalog as one runnable script.
///
/// Schemata come first, then each schema's tables (dependency ordered
/// unless sorted by name), then view placeholders, routines and views.
/// Triggers, users, data and attached scripts follow in the order the
/// options select.
pub struct ExportComposer<'a> {
    writer: ScriptWriter<'a>,
    create: &'a FragmentStore,
    drop: &'a FragmentStore,
}

impl<'a> ExportComposer<'a> {
    /// Creates a composer over keyed create and drop fragments.
    pub fn new(
        options: &'a ComposerOptions,
        delimiter: &'a str,
        create: &'a FragmentStore,
        drop: &'a FragmentStore,
    ) -> Self {
        Self {
            writer: ScriptWriter::new(options, delimiter),
            create,
            drop,
        }
    }

    fn key(&self, object: &ObjectIdentity) -> String {
        object.key(false, self.writer.options.case_sensitive)
    }

    fn created(&self, object: &ObjectIdentity) -> Result<Option<&'a str>> {
        self.create.get_single(&self.key(object))
    }

    fn dropped(&self, object: &ObjectIdentity) -> Result<Option<&'a str>> {
        self.drop.get_single(&self.key(object))
    }

    /// Builds the script.
    ///
    /// # Errors
    ///
    /// Fails if a fragment for an object holds more than one statement.
    pub fn compose(mut self, catalog: &Catalog) -> Result<String> {
        let options = self.writer.options;
        let scripts = Some(catalog);
        let mut out = self.writer.header("MySQL Forward Engineering", scripts);
        out.push_str(&self.writer.attached_scripts(scripts, ScriptPosition::TopFile));
        out.push_str(&self.writer.set_server_vars());
        out.push_str(&self.writer.attached_scripts(scripts, ScriptPosition::BeforeDdl));

        let schemata: Vec<&Schema> = catalog.schemata.iter().filter(|s| !s.model_only).collect();
        for schema in &schemata {
            out.push_str(&self.schema_sql(schema)?);
        }

        let mut inserts = String::new();
        let mut triggers = String::new();
        for schema in &schemata {
            if self.has_schema(schema) {
                out.push_str(&self.writer.use_schema(&schema.name, " ;"));
            }
            let tables = if options.sort_tables_alphabetically {
                sort_alphabetically(schema, options.case_sensitive)
            } else {
                sort_by_foreign_keys(schema, options.case_sensitive)
            };
            let mut schema_triggers = String::new();
            for table in tables {
                let Some(sql) = self.table_sql(schema, table)? else {
                    continue;
                };
                out.push_str(&sql);
                if options.generate_inserts {
                    inserts.push_str(&self.table_inserts(schema, table));
                }
                for trigger in &table.triggers {
                    schema_triggers.push_str(&self.trigger_sql(schema, trigger)?);
                }
            }
            if !schema_triggers.is_empty() {
                triggers.push_str(&format!(
                    "{}\nDELIMITER {d}\n{schema_triggers}\nDELIMITER ;\n",
                    self.writer.use_schema(&schema.name, ";"),
                    d = self.writer.delimiter
                ));
            }
        }

        for schema in &schemata {
            let mut objects = String::new();
            if !options.no_view_placeholders {
                for view in schema.views.iter().filter(|v| !v.model_only) {
                    let object = ObjectIdentity::object(ObjectKind::View, &schema.name, &view.name);
                    if self.created(&object)?.is_some() {
                        objects.push_str(&self.writer.view_placeholder(
                            &schema.name,
                            &view.name,
                            &view.columns,
                        ));
                    }
                }
            }
            for routine in &schema.routines {
                objects.push_str(&self.routine_sql(schema, routine)?);
            }
            for view in &schema.views {
                objects.push_str(&self.view_sql(schema, view)?);
            }
            if !objects.is_empty() && self.has_schema(schema) {
                out.push_str(&self.writer.use_schema(&schema.name, " ;"));
                out.push_str(&objects);
            }
        }

        if !options.triggers_after_inserts {
            out.push_str(&triggers);
        }
        out.push_str(&self.users_sql(catalog)?);
        if !options.no_fk_for_inserts {
            out.push_str(self.writer.restore_server_vars());
        }
        if !inserts.is_empty() {
            out.push_str(&self.writer.attached_scripts(scripts, ScriptPosition::BeforeInserts));
            out.push_str(&inserts);
            out.push_str(&self.writer.attached_scripts(scripts, ScriptPosition::AfterInserts));
        }
        if options.triggers_after_inserts {
            out.push_str(&triggers);
        }
        out.push_str(&self.writer.attached_scripts(scripts, ScriptPosition::AfterDdl));
        if options.no_fk_for_inserts {
            out.push_str(self.writer.restore_server_vars());
        }
        out.push_str(&self.writer.attached_scripts(scripts, ScriptPosition::BottomFile));
        Ok(out)
    }

    fn has_schema(&self, schema: &Schema) -> bool {
        let object = ObjectIdentity::schema(&schema.name);
        self.create.contains(&object, &self.key(&object))
    }

    fn schema_sql(&self, schema: &Schema) -> Result<String> {
        let options = self.writer.options;
        if options.omit_schemas && !options.generate_use {
            return Ok(String::new());
        }
        let Some(create) = self.created(&ObjectIdentity::schema(&schema.name))? else {
            return Ok(String::new());
        };
        let mut title = format!("Schema {}", schema.name);
        if !schema.comment.is_empty() {
            title.push_str(&format!("\n-- {}", schema.comment.replace('\n', "\n-- ")));
        }
        let mut out = format!("\n{}", banner(&title));
        if options.generate_schema_drops {
            out.push_str(&format!("DROP SCHEMA IF EXISTS {} ;\n", quote(&schema.name)));
        }
        out.push_str(&format!("{create};\n{}", self.writer.warnings()));
        Ok(out)
    }

    /// Table section, or `None` when the table has no create statement.
    fn table_sql(&self, schema: &Schema, table: &Table) -> Result<Option<String>> {
        let object = ObjectIdentity::object(ObjectKind::Table, &schema.name, &table.name);
        let Some(create) = self.created(&object)? else {
            debug!(table = %table.name, "no create statement for table");
            return Ok(None);
        };
        let name = self.writer.name(&schema.name, &table.name);
        info!(table = %name, "processing table");
        let warnings = self.writer.warnings();

        let mut out = format!("\n{}", banner(&format!("Table {name}")));
        if self.writer.options.generate_drops {
            if let Some(drop) = self.dropped(&object)? {
                out.push_str(&format!("{drop};\n\n{warnings}"));
            }
        }
        out.push_str(&format!("{create};\n\n{warnings}"));
        if self.writer.options.generate_create_index {
            for index in &table.indices {
                let object = ObjectIdentity::index(&schema.name, &table.name, &index.name);
                if let Some(sql) = self.created(&object)? {
                    out.push_str(&format!("{sql};\n\n{warnings}"));
                }
            }
        }
        Ok(Some(out))
    }

    fn table_inserts(&self, schema: &Schema, table: &Table) -> String {
        let Some(data) = table.inserts.as_ref().filter(|d| !d.rows.is_empty()) else {
            return String::new();
        };
        let name = self.writer.name(&schema.name, &table.name);
        let columns = data
            .columns
            .iter()
            .map(|c| quote(c))
            .collect::<Vec<_>>()
            .join(", ");
        let mut out = format!(
            "\n{}START TRANSACTION;\n{}",
            banner(&format!("Data for table {name}")),
            self.writer.use_schema(&schema.name, ";")
        );
        for row in &data.rows {
            let values = row.iter().map(sql_literal).collect::<Vec<_>>().join(", ");
            out.push_str(&format!("INSERT INTO {name} ({columns}) VALUES ({values});\n"));
        }
        out.push_str("\nCOMMIT;\n");
        out
    }

    fn trigger_sql(&self, schema: &Schema, trigger: &Trigger) -> Result<String> {
        if trigger.model_only {
            return Ok(String::new());
        }
        let object = ObjectIdentity::object(ObjectKind::Trigger, &schema.name, &trigger.name);
        let Some(create) = self.created(&object)? else {
            return Ok(String::new());
        };
        let delimiter = self.writer.delimiter;
        let mut out = String::new();
        if let Some(drop) = self.dropped(&object)? {
            out.push_str(&format!("\n{drop}{delimiter}\n"));
            if self.writer.options.generate_warnings {
                out.push_str(&format!("SHOW WARNINGS{delimiter}\n"));
            }
        }
        out.push_str(&format!("{create}{delimiter}\n\n"));
        if self.writer.options.generate_warnings {
            out.push_str(&format!("SHOW WARNINGS{delimiter}\n"));
        }
        Ok(out)
    }

    fn routine_sql(&self, schema: &Schema, routine: &Routine) -> Result<String> {
        if routine.model_only {
            return Ok(String::new());
        }
        let object = ObjectIdentity::object(ObjectKind::Routine, &schema.name, &routine.name);
        let Some(create) = self.created(&object)? else {
            return Ok(String::new());
        };
        let warnings = self.writer.warnings();
        let name = self.writer.name(&schema.name, &routine.name);
        let mut out = format!("\n{}", banner(&format!("{} {name}", routine.routine_type)));
        if let Some(drop) = self.dropped(&object)? {
            out.push_str(&format!("{drop}{warnings}"));
        }
        out.push_str(&format!("{create}{warnings}"));
        Ok(out)
    }

    fn view_sql(&self, schema: &Schema, view: &View) -> Result<String> {
        if view.model_only {
            return Ok(String::new());
        }
        let object = ObjectIdentity::object(ObjectKind::View, &schema.name, &view.name);
        let Some(create) = self.created(&object)? else {
            return Ok(String::new());
        };
        let drop = self.dropped(&object)?;
        Ok(self.writer.view_ddl(&schema.name, &view.name, create, drop))
    }

    fn users_sql(&self, catalog: &Catalog) -> Result<String> {
        let mut out = String::new();
        for user in catalog.users.iter().filter(|u| !u.model_only) {
            if self.writer.options.no_users_just_privileges {
                for grant in generate_grants(catalog, user) {
                    out.push_str(&format!("{grant};\n"));
                }
                continue;
            }
            let object = ObjectIdentity::user(&user.name);
            if let Some(drop) = self.dropped(&object)? {
                out.push_str(&self.writer.relaxed_mode(drop));
            }
            if let Some(create) = self.created(&object)? {
                out.push_str(&format!("{create}{}", self.writer.warnings()));
            }
        }
        Ok(out)
    }
}
