//! The emission interface driven by the diff walker.
//!
//! The walker calls one method per discrete DDL concern. Multi-part
//! statements are bracketed by `*_begin`/`*_end` pairs so a backend can
//! buffer the pieces and finalize one statement per object. Calling the
//! pairs out of order is a caller error and is not guarded against.
//!
//! Two backends ship with the crate: [`crate::backend::SqlGenerator`]
//! produces MySQL DDL, [`crate::backend::ReportGenerator`] produces a plain
//! text description of the same changes.

use crate::model::{
    Catalog, Column, ForeignKey, Index, PartitionDefinition, Routine, Schema, Table, Trigger,
    User, View,
};

/// The table an emission call is about.
#[derive(Debug, Clone, Copy)]
pub struct TableScope<'a> {
    pub schema: &'a Schema,
    /// The table as it is after the change.
    pub table: &'a Table,
    /// The table as it was before the change, for alters.
    pub previous: Option<&'a Table>,
}

impl<'a> TableScope<'a> {
    /// Scope for a table being created or dropped.
    #[must_use]
    pub const fn new(schema: &'a Schema, table: &'a Table) -> Self {
        Self {
            schema,
            table,
            previous: None,
        }
    }

    /// Scope for a table being altered.
    #[must_use]
    pub const fn altered(schema: &'a Schema, previous: &'a Table, table: &'a Table) -> Self {
        Self {
            schema,
            table,
            previous: Some(previous),
        }
    }

    /// Name used to address the table in `ALTER`/`DROP` targets.
    #[must_use]
    pub fn target_name(&self) -> &'a str {
        match self.previous {
            Some(previous) => &previous.name,
            None => self.table.previous_name(),
        }
    }
}

/// Placement of an added or changed column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnPosition<'a> {
    /// Leave the column where it is.
    Keep,
    First,
    After(&'a str),
}

/// A table option set on create or changed on alter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableOption<'a> {
    Engine(&'a str),
    NextAutoInc(&'a str),
    AvgRowLength(&'a str),
    Checksum(i64),
    DefaultCharset(&'a str),
    DefaultCollation(&'a str),
    Comment(&'a str),
    DataDirectory(&'a str),
    DelayKeyWrite(i64),
    IndexDirectory(&'a str),
    MergeInsert(&'a str),
    MaxRows(&'a str),
    MinRows(&'a str),
    PackKeys(&'a str),
    Password(&'a str),
    RowFormat(&'a str),
    KeyBlockSize(&'a str),
    MergeUnion(&'a str),
    Connection(&'a str),
}

impl<'a> TableOption<'a> {
    /// Maps a table attribute name to the option carrying its new value.
    #[must_use]
    pub fn from_attribute(name: &str, table: &'a Table) -> Option<Self> {
        let option = match name {
            "table_engine" => Self::Engine(&table.table_engine),
            "next_auto_inc" => Self::NextAutoInc(&table.next_auto_inc),
            "avg_row_length" => Self::AvgRowLength(&table.avg_row_length),
            "checksum" => Self::Checksum(table.checksum),
            "default_character_set_name" => Self::DefaultCharset(&table.default_character_set_name),
            "default_collation_name" => Self::DefaultCollation(&table.default_collation_name),
            "comment" => Self::Comment(&table.comment),
            "table_data_dir" => Self::DataDirectory(&table.table_data_dir),
            "delay_key_write" => Self::DelayKeyWrite(table.delay_key_write),
            "table_index_dir" => Self::IndexDirectory(&table.table_index_dir),
            "merge_insert" => Self::MergeInsert(&table.merge_insert),
            "max_rows" => Self::MaxRows(&table.max_rows),
            "min_rows" => Self::MinRows(&table.min_rows),
            "pack_keys" => Self::PackKeys(&table.pack_keys),
            "password" => Self::Password(&table.password),
            "row_format" => Self::RowFormat(&table.row_format),
            "key_block_size" => Self::KeyBlockSize(&table.key_block_size),
            "merge_union" => Self::MergeUnion(&table.merge_union),
            "connection_string" => Self::Connection(&table.connection_string),
            _ => return None,
        };
        Some(option)
    }

    /// Options a newly created table sets, in emission order.
    ///
    /// Unset values are left out. The collation only follows a charset it
    /// belongs to.
    #[must_use]
    pub fn for_create(table: &'a Table) -> Vec<Self> {
        let mut options = Vec::new();
        push_str(&mut options, &table.table_engine, Self::Engine);
        push_str(&mut options, &table.next_auto_inc, Self::NextAutoInc);
        push_str(&mut options, &table.avg_row_length, Self::AvgRowLength);
        if table.checksum != 0 {
            options.push(Self::Checksum(table.checksum));
        }
        if !table.default_character_set_name.is_empty() {
            options.push(Self::DefaultCharset(&table.default_character_set_name));
            push_str(&mut options, &table.default_collation_name, Self::DefaultCollation);
        }
        push_str(&mut options, &table.comment, Self::Comment);
        push_str(&mut options, &table.table_data_dir, Self::DataDirectory);
        if table.delay_key_write != 0 {
            options.push(Self::DelayKeyWrite(table.delay_key_write));
        }
        push_str(&mut options, &table.table_index_dir, Self::IndexDirectory);
        push_str(&mut options, &table.merge_insert, Self::MergeInsert);
        push_str(&mut options, &table.max_rows, Self::MaxRows);
        push_str(&mut options, &table.min_rows, Self::MinRows);
        push_str(&mut options, &table.pack_keys, Self::PackKeys);
        push_str(&mut options, &table.password, Self::Password);
        push_str(&mut options, &table.row_format, Self::RowFormat);
        push_str(&mut options, &table.key_block_size, Self::KeyBlockSize);
        push_str(&mut options, &table.merge_union, Self::MergeUnion);
        push_str(&mut options, &table.connection_string, Self::Connection);
        options
    }

    /// Human readable option name.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Engine(_) => "storage engine",
            Self::NextAutoInc(_) => "auto increment",
            Self::AvgRowLength(_) => "average row length",
            Self::Checksum(_) => "checksum",
            Self::DefaultCharset(_) => "default character set",
            Self::DefaultCollation(_) => "default collation",
            Self::Comment(_) => "comment",
            Self::DataDirectory(_) => "data directory",
            Self::DelayKeyWrite(_) => "delay key write",
            Self::IndexDirectory(_) => "index directory",
            Self::MergeInsert(_) => "merge insert method",
            Self::MaxRows(_) => "max rows",
            Self::MinRows(_) => "min rows",
            Self::PackKeys(_) => "pack keys",
            Self::Password(_) => "password",
            Self::RowFormat(_) => "row format",
            Self::KeyBlockSize(_) => "key block size",
            Self::MergeUnion(_) => "merge union",
            Self::Connection(_) => "connection",
        }
    }
}

fn push_str<'a>(
    options: &mut Vec<TableOption<'a>>,
    value: &'a str,
    make: fn(&'a str) -> TableOption<'a>,
) {
    if !value.is_empty() {
        options.push(make(value));
    }
}

/// Partitioning of a table.
#[derive(Debug, Clone, Copy)]
pub struct PartitionSpec<'a> {
    pub part_type: &'a str,
    pub expression: &'a str,
    pub count: i64,
    pub subpart_type: &'a str,
    pub subpart_expression: &'a str,
    pub subpart_count: i64,
    pub definitions: &'a [PartitionDefinition],
}

impl<'a> PartitionSpec<'a> {
    /// The partitioning declared by a table.
    #[must_use]
    pub fn of(table: &'a Table) -> Self {
        Self {
            part_type: &table.partition_type,
            expression: &table.partition_expression,
            count: table.partition_count,
            subpart_type: &table.subpartition_type,
            subpart_expression: &table.subpartition_expression,
            subpart_count: table.subpartition_count,
            definitions: &table.partition_definitions,
        }
    }

    /// Returns true for `RANGE` and `LIST` methods, which list partitions.
    #[must_use]
    pub fn has_definitions(&self) -> bool {
        let kind = self.part_type.to_ascii_uppercase();
        kind.starts_with("RANGE") || kind.starts_with("LIST")
    }

    /// Returns true for `HASH` and `KEY` methods, which only count partitions.
    #[must_use]
    pub fn is_hash_or_key(&self) -> bool {
        let kind = self.part_type.to_ascii_uppercase();
        kind.contains("HASH") || kind.contains("KEY")
    }
}

/// Callbacks invoked by the diff walker.
///
/// Implementations only mutate their own buffers and the fragment store
/// they were given.
pub trait EmitActions {
    // Table creation.

    /// Starts a `CREATE TABLE` statement.
    fn create_table_props_begin(&mut self, scope: &TableScope<'_>);
    /// Finishes and commits the `CREATE TABLE` statement.
    fn create_table_props_end(&mut self, scope: &TableScope<'_>);
    fn create_table_columns_begin(&mut self, scope: &TableScope<'_>);
    fn create_table_column(&mut self, scope: &TableScope<'_>, column: &Column);
    fn create_table_columns_end(&mut self, scope: &TableScope<'_>);
    fn create_table_indexes_begin(&mut self, scope: &TableScope<'_>);
    /// Adds an index; with `separate` it becomes its own `CREATE INDEX`.
    fn create_table_index(&mut self, scope: &TableScope<'_>, index: &Index, separate: bool);
    fn create_table_indexes_end(&mut self, scope: &TableScope<'_>);
    fn create_table_fks_begin(&mut self, scope: &TableScope<'_>);
    fn create_table_fk(&mut self, scope: &TableScope<'_>, fk: &ForeignKey);
    fn create_table_fks_end(&mut self, scope: &TableScope<'_>);
    fn create_table_option(&mut self, scope: &TableScope<'_>, option: TableOption<'_>);
    fn create_table_partitioning(&mut self, scope: &TableScope<'_>, spec: &PartitionSpec<'_>);

    /// Emits `DROP TABLE`.
    fn drop_table(&mut self, scope: &TableScope<'_>);

    // Table alteration.

    /// Starts an `ALTER TABLE` statement addressing the pre-change name.
    fn alter_table_props_begin(&mut self, scope: &TableScope<'_>);
    /// Finishes the statement, committing it only if something changed.
    fn alter_table_props_end(&mut self, scope: &TableScope<'_>);
    fn alter_table_name(&mut self, scope: &TableScope<'_>);
    fn alter_table_option(&mut self, scope: &TableScope<'_>, option: TableOption<'_>);

    fn alter_table_columns_begin(&mut self, scope: &TableScope<'_>);
    fn alter_table_add_column(
        &mut self,
        scope: &TableScope<'_>,
        column: &Column,
        position: ColumnPosition<'_>,
    );
    fn alter_table_drop_column(&mut self, scope: &TableScope<'_>, column: &Column);
    /// Redefines `old` as `new`, optionally moving it.
    fn alter_table_change_column(
        &mut self,
        scope: &TableScope<'_>,
        old: &Column,
        new: &Column,
        position: ColumnPosition<'_>,
    );
    fn alter_table_columns_end(&mut self, scope: &TableScope<'_>);

    fn alter_table_indexes_begin(&mut self, scope: &TableScope<'_>);
    fn alter_table_add_index(&mut self, scope: &TableScope<'_>, index: &Index);
    fn alter_table_drop_index(&mut self, scope: &TableScope<'_>, index: &Index);
    /// Changes an index in place where the server allows it.
    fn alter_table_change_index(&mut self, scope: &TableScope<'_>, old: &Index, new: &Index);
    fn alter_table_indexes_end(&mut self, scope: &TableScope<'_>);

    fn alter_table_fks_begin(&mut self, scope: &TableScope<'_>);
    fn alter_table_add_fk(&mut self, scope: &TableScope<'_>, fk: &ForeignKey);
    fn alter_table_drop_fk(&mut self, scope: &TableScope<'_>, fk: &ForeignKey);
    fn alter_table_fks_end(&mut self, scope: &TableScope<'_>);

    /// Rewrites the whole partitioning clause.
    fn alter_table_partitioning(&mut self, scope: &TableScope<'_>, spec: &PartitionSpec<'_>);
    /// Changes the number of `HASH`/`KEY` partitions.
    fn alter_table_partition_count(&mut self, scope: &TableScope<'_>, old: i64, new: i64);
    fn alter_table_add_partition(&mut self, scope: &TableScope<'_>, part: &PartitionDefinition);
    fn alter_table_drop_partition(&mut self, scope: &TableScope<'_>, name: &str);
    fn alter_table_reorganize_partition(
        &mut self,
        scope: &TableScope<'_>,
        old: &PartitionDefinition,
        new: &PartitionDefinition,
    );

    // Triggers.

    /// Creates a trigger; `for_alter` marks re-creation inside an alter script.
    fn create_trigger(&mut self, scope: &TableScope<'_>, trigger: &Trigger, for_alter: bool);
    fn drop_trigger(&mut self, scope: &TableScope<'_>, trigger: &Trigger, for_alter: bool);

    // Schemata.

    fn create_schema(&mut self, schema: &Schema);
    fn drop_schema(&mut self, schema: &Schema);
    fn alter_schema_props_begin(&mut self, schema: &Schema);
    fn alter_schema_name(&mut self, old: &Schema, new: &Schema);
    fn alter_schema_default_charset(&mut self, schema: &Schema, charset: &str);
    fn alter_schema_default_collate(&mut self, schema: &Schema, collation: &str);
    fn alter_schema_props_end(&mut self, schema: &Schema);

    // Views and routines.

    fn create_view(&mut self, schema: &Schema, view: &View, for_alter: bool);
    fn drop_view(&mut self, schema: &Schema, view: &View);
    fn create_routine(&mut self, schema: &Schema, routine: &Routine, for_alter: bool);
    fn drop_routine(&mut self, schema: &Schema, routine: &Routine, for_alter: bool);

    // Users.

    fn create_user(&mut self, catalog: &Catalog, user: &User);
    fn drop_user(&mut self, user: &User);

    /// Suspends list insertion while a schema drop cascades to its children.
    fn disable_list_insert(&mut self, _disabled: bool) {}
}
