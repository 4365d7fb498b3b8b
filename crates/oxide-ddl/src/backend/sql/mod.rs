//! MySQL DDL backend.
//!
//! [`SqlGenerator`] turns emission calls into statements and commits them to
//! a caller-owned [`FragmentStore`]. Statements carry no `;` terminator; the
//! composers add terminators and `DELIMITER` wrapping.
//!
//! # Example
//!
//! ```
//! use oxide_ddl::backend::SqlGenerator;
//! use oxide_ddl::change::{Change, Value};
//! use oxide_ddl::model::{Catalog, Column, Index, Schema, Table};
//! use oxide_ddl::options::{DbTraits, GeneratorOptions};
//! use oxide_ddl::store::FragmentStore;
//! use oxide_ddl::walker::DiffSqlGenerator;
//!
//! let schema = Schema::new("shop").table(
//!     Table::new("users")
//!         .column(Column::new("id", "INT").not_null())
//!         .index(Index::primary(&["id"])),
//! );
//! let change = Change::ValueAdded { value: Value::Schema(Box::new(schema)) };
//!
//! let mut store = FragmentStore::list();
//! let mut backend = SqlGenerator::new(&mut store, DbTraits::default(), GeneratorOptions::default());
//! DiffSqlGenerator::new(&mut backend, GeneratorOptions::default())
//!     .process_diff_change(&change, None, None)
//!     .unwrap();
//!
//! assert!(store.statements()[1].starts_with("CREATE TABLE IF NOT EXISTS `shop`.`users`"));
//! ```

mod render;
mod statement;

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::dialect::{
    charset_for_collation, comment_text, is_default_collation, quote, quote_string, quote_user,
    strip_schema_qualifier,
};
use crate::emit::{ColumnPosition, EmitActions, PartitionSpec, TableOption, TableScope};
use crate::grants::generate_grants;
use crate::identity::ObjectIdentity;
use crate::model::{
    Catalog, Column, ForeignKey, Index, ObjectKind, PartitionDefinition, Routine, Schema, Trigger,
    User, View,
};
use crate::options::{DbTraits, GeneratorOptions, ServerVersion};
use crate::store::FragmentStore;

use self::render::{
    column_definition, foreign_key_definition, index_changes_in_place, index_definition,
    partition_by, partition_definition, trigger_with_order,
};
use self::statement::{AlterSchema, AlterTable, CreateTable};

static CREATE_OR_REPLACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*CREATE\s+OR\s+REPLACE\s+").expect("create or replace pattern")
});

static CREATE_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^(\s*CREATE\s+)").expect("create keyword pattern"));

/// Emission backend producing MySQL DDL.
pub struct SqlGenerator<'s> {
    store: &'s mut FragmentStore,
    traits: DbTraits,
    options: GeneratorOptions,
    create_table: Option<CreateTable>,
    alter_table: Option<AlterTable>,
    alter_schema: Option<AlterSchema>,
    list_insert_disabled: bool,
    /// Triggers created so far, for `FOLLOWS`/`PRECEDES` targets.
    created_triggers: HashSet<String>,
}

impl<'s> SqlGenerator<'s> {
    /// Creates a backend writing into `store`.
    pub fn new(store: &'s mut FragmentStore, traits: DbTraits, options: GeneratorOptions) -> Self {
        Self {
            store,
            traits,
            options,
            create_table: None,
            alter_table: None,
            alter_schema: None,
            list_insert_disabled: false,
            created_triggers: HashSet::new(),
        }
    }

    /// Server capabilities this backend targets.
    #[must_use]
    pub const fn traits(&self) -> &DbTraits {
        &self.traits
    }

    fn name(&self, schema: &str, object: &str) -> String {
        if self.options.omit_schemas {
            quote(object)
        } else {
            format!("{}.{}", quote(schema), quote(object))
        }
    }

    fn use_prefix(&self, schema: &str, terminator: &str) -> String {
        if self.options.omit_schemas && !self.options.generate_use {
            String::new()
        } else {
            format!("USE {}{}\n", quote(schema), terminator)
        }
    }

    fn key(&self, object: &ObjectIdentity) -> String {
        object.key(self.options.use_oid_as_key, self.options.case_sensitive)
    }

    fn skip_insert(&self) -> bool {
        self.list_insert_disabled && self.store.as_list().is_some()
    }

    fn remember(&mut self, object: ObjectIdentity, sql: String, front: bool) {
        if self.skip_insert() {
            return;
        }
        let key = self.key(&object);
        trace!(key = %key, "remember fragment");
        self.store.remember(object, key, sql, front);
    }

    fn remember_alter(&mut self, object: ObjectIdentity, sql: String) {
        if self.skip_insert() {
            return;
        }
        let key = self.key(&object);
        trace!(key = %key, "append fragment");
        self.store.remember_alter(object, key, sql);
    }

    fn table_identity(scope: &TableScope<'_>) -> ObjectIdentity {
        ObjectIdentity::object(ObjectKind::Table, &scope.schema.name, &scope.table.name)
            .with_id(&scope.table.id)
    }

    fn trigger_identity(schema: &Schema, trigger: &Trigger) -> ObjectIdentity {
        ObjectIdentity::object(ObjectKind::Trigger, &schema.name, &trigger.name)
            .with_id(&trigger.id)
    }

    fn schema_identity(schema: &Schema) -> ObjectIdentity {
        ObjectIdentity::schema(&schema.name).with_id(&schema.id)
    }

    fn view_identity(schema: &Schema, view: &View) -> ObjectIdentity {
        ObjectIdentity::object(ObjectKind::View, &schema.name, &view.name).with_id(&view.id)
    }

    fn routine_identity(schema: &Schema, routine: &Routine) -> ObjectIdentity {
        ObjectIdentity::object(ObjectKind::Routine, &schema.name, &routine.name)
            .with_id(&routine.id)
    }

    fn user_identity(user: &User) -> ObjectIdentity {
        ObjectIdentity::user(&user.name).with_id(&user.id)
    }

    fn create_option_text(&self, scope: &TableScope<'_>, option: TableOption<'_>) -> Option<String> {
        let sql = match option {
            TableOption::Engine(v) => format!("ENGINE = {v}"),
            TableOption::NextAutoInc(v) => format!("AUTO_INCREMENT = {v}"),
            TableOption::AvgRowLength(v) => format!("AVG_ROW_LENGTH = {v}"),
            TableOption::Checksum(v) => format!("CHECKSUM = {v}"),
            TableOption::DefaultCharset(v) => format!("DEFAULT CHARACTER SET = {v}"),
            TableOption::DefaultCollation(v) => {
                let charset = &scope.table.default_character_set_name;
                if !charset_for_collation(v).eq_ignore_ascii_case(charset)
                    || is_default_collation(charset, v)
                {
                    return None;
                }
                format!("COLLATE = {v}")
            }
            TableOption::Comment(v) => {
                let text = comment_text(v, self.traits.max_table_comment_length);
                if text.is_empty() {
                    return None;
                }
                format!("COMMENT = {text}")
            }
            TableOption::DataDirectory(v) => format!("DATA DIRECTORY = {}", quote_string(v)),
            TableOption::DelayKeyWrite(v) => format!("DELAY_KEY_WRITE = {v}"),
            TableOption::IndexDirectory(v) => format!("INDEX DIRECTORY = {}", quote_string(v)),
            TableOption::MergeInsert(v) => format!("INSERT_METHOD = {v}"),
            TableOption::MaxRows(v) => format!("MAX_ROWS = {v}"),
            TableOption::MinRows(v) => format!("MIN_ROWS = {v}"),
            TableOption::PackKeys(v) => format!("PACK_KEYS = {v}"),
            TableOption::Password(v) => format!("PASSWORD = {}", quote_string(v)),
            TableOption::RowFormat(v) => format!("ROW_FORMAT = {v}"),
            TableOption::KeyBlockSize(v) => format!("KEY_BLOCK_SIZE = {v}"),
            TableOption::MergeUnion(v) => format!("UNION = ({v})"),
            TableOption::Connection(v) => format!("CONNECTION = {}", quote_string(v)),
        };
        Some(sql)
    }

    fn alter_option_text(&self, option: TableOption<'_>) -> Option<String> {
        fn or<'v>(value: &'v str, fallback: &'v str) -> &'v str {
            if value.is_empty() {
                fallback
            } else {
                value
            }
        }
        let sql = match option {
            TableOption::Engine(v) => format!("ENGINE = {v} "),
            TableOption::NextAutoInc(v) => {
                if v.is_empty() {
                    return None;
                }
                format!("AUTO_INCREMENT = {v} ")
            }
            TableOption::AvgRowLength(v) => format!("AVG_ROW_LENGTH = {} ", or(v, "0")),
            TableOption::Checksum(v) => format!("CHECKSUM = {v} "),
            TableOption::DefaultCharset(v) => format!("CHARACTER SET = {} ", or(v, "DEFAULT")),
            TableOption::DefaultCollation(v) => format!("COLLATE = {} ", or(v, "DEFAULT")),
            TableOption::Comment(v) => {
                let text = comment_text(v, self.traits.max_table_comment_length);
                format!("COMMENT = {} ", or(&text, "''"))
            }
            TableOption::DataDirectory(v) => format!("DATA DIRECTORY = {} ", quote_string(v)),
            TableOption::DelayKeyWrite(v) => format!("DELAY_KEY_WRITE = {v} "),
            TableOption::IndexDirectory(v) => format!("INDEX DIRECTORY = {} ", quote_string(v)),
            TableOption::MergeInsert(v) => format!("INSERT_METHOD = {} ", or(v, "NO")),
            TableOption::MaxRows(v) => format!("MAX_ROWS = {} ", or(v, "0")),
            TableOption::MinRows(v) => format!("MIN_ROWS = {} ", or(v, "0")),
            TableOption::PackKeys(v) => format!("PACK_KEYS = {} ", or(v, "DEFAULT")),
            TableOption::Password(v) => format!("PASSWORD = {} ", quote_string(v)),
            TableOption::RowFormat(v) => format!("ROW_FORMAT = {} ", or(v, "DEFAULT")),
            TableOption::KeyBlockSize(v) => format!("KEY_BLOCK_SIZE = {} ", or(v, "0")),
            TableOption::MergeUnion(v) => format!("UNION = ({v}) "),
            TableOption::Connection(v) => format!("CONNECTION = {} ", quote_string(v)),
        };
        Some(sql)
    }

    fn column_position(position: ColumnPosition<'_>) -> String {
        match position {
            ColumnPosition::Keep => String::new(),
            ColumnPosition::First => " FIRST".to_string(),
            ColumnPosition::After(name) => format!(" AFTER {}", quote(name)),
        }
    }

    /// Picks the sibling a trigger is ordered against: the nearest preceding
    /// trigger of the same event and timing that exists at this point, else
    /// the nearest following one.
    fn trigger_order<'t>(
        &self,
        scope: &TableScope<'t>,
        trigger: &Trigger,
    ) -> Option<(&'static str, &'t str)> {
        let siblings = &scope.table.triggers;
        let position = siblings.iter().position(|t| t.name == trigger.name)?;
        let available = |other: &&'t Trigger| {
            other.same_slot(trigger)
                && !other.model_only
                && (self.created_triggers.contains(
                    &Self::trigger_identity(scope.schema, other).qualified(self.options.case_sensitive),
                ) || scope
                    .previous
                    .and_then(|p| p.find_trigger(&other.name))
                    .is_some_and(|old| {
                        old.sql_definition == other.sql_definition && old.sql_body == other.sql_body
                    }))
        };
        siblings[..position]
            .iter()
            .rev()
            .find(available)
            .map(|t| ("FOLLOWS", t.name.as_str()))
            .or_else(|| {
                siblings[position + 1..]
                    .iter()
                    .find(available)
                    .map(|t| ("PRECEDES", t.name.as_str()))
            })
    }

    fn view_definition(&self, schema: &Schema, view: &View) -> String {
        let definition = &view.sql_definition;
        let mut sql = if CREATE_OR_REPLACE.is_match(definition) {
            definition.clone()
        } else if CREATE_KEYWORD.is_match(definition) {
            CREATE_KEYWORD
                .replace(definition, "${1}OR REPLACE ")
                .into_owned()
        } else {
            format!(
                "CREATE OR REPLACE VIEW {} AS {}",
                self.name(&schema.name, &view.name),
                definition.trim()
            )
        };
        if self.options.omit_schemas {
            sql = strip_schema_qualifier(&sql, &schema.name);
        }
        format!("{}{}", self.use_prefix(&schema.name, ";"), sql)
    }
}

impl EmitActions for SqlGenerator<'_> {
    fn create_table_props_begin(&mut self, scope: &TableScope<'_>) {
        let table = scope.table;
        let head = format!(
            "CREATE{} TABLE{} {} (\n",
            if table.is_temporary { " TEMPORARY" } else { "" },
            if self.traits.put_if_exists { " IF NOT EXISTS" } else { "" },
            self.name(&scope.schema.name, &table.name)
        );
        self.create_table = Some(CreateTable::new(head));
    }

    fn create_table_props_end(&mut self, scope: &TableScope<'_>) {
        let Some(create) = self.create_table.take() else {
            return;
        };
        self.remember(Self::table_identity(scope), create.sql(), false);
        for (name, sql) in create.indexes {
            let object = ObjectIdentity::index(&scope.schema.name, &scope.table.name, &name);
            self.remember(object, sql, false);
        }
    }

    fn create_table_columns_begin(&mut self, _scope: &TableScope<'_>) {}

    fn create_table_column(&mut self, _scope: &TableScope<'_>, column: &Column) {
        let sql = column_definition(column, &self.traits);
        if let Some(create) = self.create_table.as_mut() {
            create.item(sql);
        }
    }

    fn create_table_columns_end(&mut self, _scope: &TableScope<'_>) {}

    fn create_table_indexes_begin(&mut self, _scope: &TableScope<'_>) {}

    fn create_table_index(&mut self, scope: &TableScope<'_>, index: &Index, separate: bool) {
        let table_name = self.name(&scope.schema.name, &scope.table.name);
        let Some(create) = self.create_table.as_mut() else {
            return;
        };
        if separate {
            let sql = index_definition(index, scope.table, Some(&table_name), &self.traits);
            create.indexes.push((index.name.clone(), format!("CREATE {sql}")));
        } else {
            create.item(index_definition(index, scope.table, None, &self.traits));
        }
    }

    fn create_table_indexes_end(&mut self, _scope: &TableScope<'_>) {}

    fn create_table_fks_begin(&mut self, _scope: &TableScope<'_>) {}

    fn create_table_fk(&mut self, scope: &TableScope<'_>, fk: &ForeignKey) {
        let sql = foreign_key_definition(fk, &scope.schema.name, self.options.omit_schemas);
        if let Some(create) = self.create_table.as_mut() {
            create.item(sql);
        }
    }

    fn create_table_fks_end(&mut self, _scope: &TableScope<'_>) {}

    fn create_table_option(&mut self, scope: &TableScope<'_>, option: TableOption<'_>) {
        let Some(sql) = self.create_option_text(scope, option) else {
            return;
        };
        if let Some(create) = self.create_table.as_mut() {
            create.option(&sql);
        }
    }

    fn create_table_partitioning(&mut self, _scope: &TableScope<'_>, spec: &PartitionSpec<'_>) {
        if let Some(create) = self.create_table.as_mut() {
            create.partitioning(&partition_by(spec));
        }
    }

    fn drop_table(&mut self, scope: &TableScope<'_>) {
        let sql = format!(
            "DROP TABLE IF EXISTS {} ",
            self.name(&scope.schema.name, &scope.table.name)
        );
        self.remember(Self::table_identity(scope), sql, false);
    }

    fn alter_table_props_begin(&mut self, scope: &TableScope<'_>) {
        let target = self.name(&scope.schema.name, scope.target_name());
        let current = self.name(&scope.schema.name, &scope.table.name);
        self.alter_table = Some(AlterTable::new(&target, &current));
    }

    fn alter_table_props_end(&mut self, scope: &TableScope<'_>) {
        let Some(alter) = self.alter_table.take() else {
            return;
        };
        let statements = alter.finish(&self.traits.alter_algorithm, &self.traits.alter_lock);
        for sql in statements {
            self.remember_alter(Self::table_identity(scope), sql);
        }
    }

    fn alter_table_name(&mut self, scope: &TableScope<'_>) {
        let sql = format!(
            "RENAME TO {} ",
            self.name(&scope.schema.name, &scope.table.name)
        );
        if let Some(alter) = self.alter_table.as_mut() {
            alter.option(&sql);
        }
    }

    fn alter_table_option(&mut self, _scope: &TableScope<'_>, option: TableOption<'_>) {
        let Some(sql) = self.alter_option_text(option) else {
            return;
        };
        if let Some(alter) = self.alter_table.as_mut() {
            alter.option(&sql);
        }
    }

    fn alter_table_columns_begin(&mut self, _scope: &TableScope<'_>) {}

    fn alter_table_add_column(
        &mut self,
        _scope: &TableScope<'_>,
        column: &Column,
        position: ColumnPosition<'_>,
    ) {
        let sql = format!(
            "ADD COLUMN {}{}",
            column_definition(column, &self.traits),
            Self::column_position(position)
        );
        if let Some(alter) = self.alter_table.as_mut() {
            alter.clause(&sql);
        }
    }

    fn alter_table_drop_column(&mut self, _scope: &TableScope<'_>, column: &Column) {
        if let Some(alter) = self.alter_table.as_mut() {
            alter.clause(&format!("DROP COLUMN {}", quote(&column.name)));
        }
    }

    fn alter_table_change_column(
        &mut self,
        _scope: &TableScope<'_>,
        old: &Column,
        new: &Column,
        position: ColumnPosition<'_>,
    ) {
        let sql = format!(
            "CHANGE COLUMN {} {}{}",
            quote(&old.name),
            column_definition(new, &self.traits),
            Self::column_position(position)
        );
        if let Some(alter) = self.alter_table.as_mut() {
            alter.clause(&sql);
        }
    }

    fn alter_table_columns_end(&mut self, _scope: &TableScope<'_>) {}

    fn alter_table_indexes_begin(&mut self, _scope: &TableScope<'_>) {}

    fn alter_table_add_index(&mut self, scope: &TableScope<'_>, index: &Index) {
        let sql = format!("ADD {}", index_definition(index, scope.table, None, &self.traits));
        if let Some(alter) = self.alter_table.as_mut() {
            alter.clause(&sql);
        }
    }

    fn alter_table_drop_index(&mut self, _scope: &TableScope<'_>, index: &Index) {
        let sql = if index.is_primary {
            "DROP PRIMARY KEY".to_string()
        } else {
            format!("DROP INDEX {}", quote(&index.name))
        };
        if let Some(alter) = self.alter_table.as_mut() {
            alter.clause(&sql);
        }
    }

    fn alter_table_change_index(&mut self, scope: &TableScope<'_>, old: &Index, new: &Index) {
        let in_place = self.traits.version.at_least(ServerVersion::INVISIBLE_INDEXES)
            && index_changes_in_place(old, new);
        if !in_place {
            self.alter_table_drop_index(scope, old);
            self.alter_table_add_index(scope, new);
            return;
        }
        let Some(alter) = self.alter_table.as_mut() else {
            return;
        };
        let table = alter.current().to_string();
        if old.name != new.name {
            alter.index_statements.push(format!(
                "ALTER TABLE {} RENAME INDEX {} TO {}",
                table,
                quote(&old.name),
                quote(&new.name)
            ));
        }
        if old.visible != new.visible {
            alter.index_statements.push(format!(
                "ALTER TABLE {} ALTER INDEX {} {}",
                table,
                quote(&new.name),
                if new.visible { "VISIBLE" } else { "INVISIBLE" }
            ));
        }
    }

    fn alter_table_indexes_end(&mut self, _scope: &TableScope<'_>) {}

    fn alter_table_fks_begin(&mut self, _scope: &TableScope<'_>) {}

    fn alter_table_add_fk(&mut self, scope: &TableScope<'_>, fk: &ForeignKey) {
        let sql = format!(
            "ADD {}",
            foreign_key_definition(fk, &scope.schema.name, self.options.omit_schemas)
        );
        if let Some(alter) = self.alter_table.as_mut() {
            alter.add_fk(sql);
        }
    }

    fn alter_table_drop_fk(&mut self, _scope: &TableScope<'_>, fk: &ForeignKey) {
        if let Some(alter) = self.alter_table.as_mut() {
            alter.drop_fk(format!("DROP FOREIGN KEY {}", quote(&fk.name)));
        }
    }

    fn alter_table_fks_end(&mut self, _scope: &TableScope<'_>) {
        if let Some(alter) = self.alter_table.as_mut() {
            alter.fks_end();
        }
    }

    fn alter_table_partitioning(&mut self, _scope: &TableScope<'_>, spec: &PartitionSpec<'_>) {
        let sql = if spec.part_type.is_empty() || (spec.count == 0 && spec.definitions.is_empty())
        {
            " REMOVE PARTITIONING ".to_string()
        } else {
            partition_by(spec)
        };
        if let Some(alter) = self.alter_table.as_mut() {
            alter.partitioning = Some(sql);
        }
    }

    fn alter_table_partition_count(&mut self, _scope: &TableScope<'_>, old: i64, new: i64) {
        let sql = match new.cmp(&old) {
            std::cmp::Ordering::Less => format!(" COALESCE PARTITION {}", old - new),
            std::cmp::Ordering::Greater => format!(" ADD PARTITION PARTITIONS {}", new - old),
            std::cmp::Ordering::Equal => return,
        };
        if let Some(alter) = self.alter_table.as_mut() {
            alter.partition_statements.push(sql);
        }
    }

    fn alter_table_add_partition(&mut self, scope: &TableScope<'_>, part: &PartitionDefinition) {
        let sql = format!(
            " ADD PARTITION ( PARTITION {}) ",
            partition_definition(part, &scope.table.partition_type)
        );
        if let Some(alter) = self.alter_table.as_mut() {
            alter.partition_statements.push(sql);
        }
    }

    fn alter_table_drop_partition(&mut self, _scope: &TableScope<'_>, name: &str) {
        if let Some(alter) = self.alter_table.as_mut() {
            alter.partition_drops.push(name.to_string());
        }
    }

    fn alter_table_reorganize_partition(
        &mut self,
        scope: &TableScope<'_>,
        old: &PartitionDefinition,
        new: &PartitionDefinition,
    ) {
        let sql = format!(
            " REORGANIZE PARTITION {} INTO ( PARTITION {})",
            old.name,
            partition_definition(new, &scope.table.partition_type)
        );
        if let Some(alter) = self.alter_table.as_mut() {
            alter.partition_statements.push(sql);
        }
    }

    fn create_trigger(&mut self, scope: &TableScope<'_>, trigger: &Trigger, for_alter: bool) {
        let schema = &scope.schema.name;
        let order = if self.traits.version.at_least(ServerVersion::TRIGGER_ORDER) {
            self.trigger_order(scope, trigger)
        } else {
            None
        };
        let definition = match order {
            None if !trigger.sql_definition.is_empty() => {
                if self.options.omit_schemas {
                    strip_schema_qualifier(&trigger.sql_definition, schema)
                } else {
                    trigger.sql_definition.clone()
                }
            }
            _ => trigger_with_order(
                trigger,
                &self.name(schema, &trigger.name),
                &quote(&scope.table.name),
                order,
            ),
        };

        let identity = Self::trigger_identity(scope.schema, trigger);
        self.created_triggers
            .insert(identity.qualified(self.options.case_sensitive));
        if for_alter {
            let sql = format!(
                "{}{}",
                self.use_prefix(schema, &self.traits.sql_delimiter),
                definition
            );
            self.remember_alter(identity, sql);
        } else {
            self.remember(identity, definition, false);
        }
    }

    fn drop_trigger(&mut self, scope: &TableScope<'_>, trigger: &Trigger, for_alter: bool) {
        let schema = &scope.schema.name;
        let sql = format!(
            "{}DROP TRIGGER IF EXISTS {} ",
            self.use_prefix(schema, &self.traits.sql_delimiter),
            self.name(schema, &trigger.name)
        );
        let identity = Self::trigger_identity(scope.schema, trigger);
        if for_alter {
            self.remember_alter(identity, sql);
        } else {
            self.remember(identity, sql, false);
        }
    }

    fn create_schema(&mut self, schema: &Schema) {
        let mut sql = format!("CREATE SCHEMA IF NOT EXISTS {} ", quote(&schema.name));
        let charset = &schema.default_character_set_name;
        if !charset.is_empty() {
            sql.push_str(&format!("DEFAULT CHARACTER SET {charset} "));
            let collation = &schema.default_collation_name;
            if !collation.is_empty()
                && charset_for_collation(collation).eq_ignore_ascii_case(charset)
                && !is_default_collation(charset, collation)
            {
                sql.push_str(&format!("COLLATE {collation} "));
            }
        }
        self.remember(Self::schema_identity(schema), sql, false);
    }

    fn drop_schema(&mut self, schema: &Schema) {
        let sql = format!("DROP SCHEMA IF EXISTS {} ", quote(&schema.name));
        self.remember(Self::schema_identity(schema), sql, true);
    }

    fn alter_schema_props_begin(&mut self, schema: &Schema) {
        self.alter_schema = Some(AlterSchema {
            name: schema.name.clone(),
            body: String::new(),
        });
    }

    fn alter_schema_name(&mut self, old: &Schema, new: &Schema) {
        let sql = format!(
            "RENAME SCHEMA {} TO {} ",
            quote(&old.name),
            quote(&new.name)
        );
        self.remember_alter(Self::schema_identity(new), sql);
    }

    fn alter_schema_default_charset(&mut self, _schema: &Schema, charset: &str) {
        if charset.is_empty() {
            return;
        }
        if let Some(alter) = self.alter_schema.as_mut() {
            alter.body.push_str(&format!(" DEFAULT CHARACTER SET {charset} "));
        }
    }

    fn alter_schema_default_collate(&mut self, _schema: &Schema, collation: &str) {
        if collation.is_empty() {
            return;
        }
        if let Some(alter) = self.alter_schema.as_mut() {
            alter.body.push_str(&format!(" DEFAULT COLLATE {collation} "));
        }
    }

    fn alter_schema_props_end(&mut self, schema: &Schema) {
        let Some(alter) = self.alter_schema.take() else {
            return;
        };
        if alter.body.is_empty() {
            return;
        }
        let sql = format!("ALTER SCHEMA {} {}", quote(&alter.name), alter.body);
        self.remember_alter(Self::schema_identity(schema), sql);
    }

    fn create_view(&mut self, schema: &Schema, view: &View, for_alter: bool) {
        let sql = self.view_definition(schema, view);
        let identity = Self::view_identity(schema, view);
        if for_alter {
            self.remember_alter(identity, sql);
        } else {
            self.remember(identity, sql, false);
        }
    }

    fn drop_view(&mut self, schema: &Schema, view: &View) {
        let sql = format!("DROP VIEW IF EXISTS {} ", self.name(&schema.name, &view.name));
        self.remember(Self::view_identity(schema, view), sql, false);
    }

    fn create_routine(&mut self, schema: &Schema, routine: &Routine, for_alter: bool) {
        let delimiter = &self.traits.sql_delimiter;
        let definition = if self.options.omit_schemas {
            strip_schema_qualifier(&routine.sql_definition, &schema.name)
        } else {
            routine.sql_definition.clone()
        };
        let sql = format!(
            "\nDELIMITER {delimiter}\n{}{}{delimiter}\n\nDELIMITER ;\n",
            self.use_prefix(&schema.name, delimiter),
            definition.trim_end()
        );
        let identity = Self::routine_identity(schema, routine);
        if for_alter {
            self.remember_alter(identity, sql);
        } else {
            self.remember(identity, sql, false);
        }
    }

    fn drop_routine(&mut self, schema: &Schema, routine: &Routine, for_alter: bool) {
        let sql = format!(
            "\n{}DROP {} IF EXISTS {};\n",
            self.use_prefix(&schema.name, ";"),
            routine.routine_type.to_ascii_uppercase(),
            self.name(&schema.name, &routine.name)
        );
        let identity = Self::routine_identity(schema, routine);
        if for_alter {
            self.remember_alter(identity, sql);
        } else {
            self.remember(identity, sql, false);
        }
    }

    fn create_user(&mut self, catalog: &Catalog, user: &User) {
        let mut sql = format!("CREATE USER {}", quote_user(&user.name));
        if !user.password.is_empty() {
            sql.push_str(&format!(" IDENTIFIED BY {}", quote_string(&user.password)));
        }
        sql.push_str(";\n\n");
        for grant in generate_grants(catalog, user) {
            sql.push_str(&grant);
            sql.push_str(";\n");
        }
        self.remember_alter(Self::user_identity(user), sql);
    }

    fn drop_user(&mut self, user: &User) {
        let name = quote_user(&user.name);
        let sql = if self.traits.version.at_least(ServerVersion::DROP_USER_IF_EXISTS) {
            format!("DROP USER IF EXISTS {name}")
        } else {
            format!("GRANT USAGE ON *.* TO {name};\n DROP USER {name}")
        };
        self.remember_alter(Self::user_identity(user), sql);
    }

    fn disable_list_insert(&mut self, disabled: bool) {
        self.list_insert_disabled = disabled;
    }
}
