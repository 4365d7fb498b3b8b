//! Plain text change report.
//!
//! Driven by the same walker as the DDL backend, so the report describes
//! exactly the statements a script would contain.

use crate::dialect::{quote, quote_user};
use crate::emit::{ColumnPosition, EmitActions, PartitionSpec, TableOption, TableScope};
use crate::model::{
    Catalog, Column, ForeignKey, Index, PartitionDefinition, Routine, Schema, Trigger, User, View,
};

/// Emission backend describing changes in prose.
#[derive(Debug, Default)]
pub struct ReportGenerator {
    output: String,
    header: Option<String>,
    details: Vec<String>,
}

impl ReportGenerator {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The report so far.
    #[must_use]
    pub fn report(&self) -> &str {
        &self.output
    }

    /// Consumes the generator and returns the report.
    #[must_use]
    pub fn into_report(self) -> String {
        self.output
    }

    fn line(&mut self, text: &str) {
        self.output.push_str(text);
        self.output.push('\n');
    }

    fn detail(&mut self, text: String) {
        self.details.push(text);
    }

    fn begin(&mut self, header: String) {
        self.header = Some(header);
        self.details.clear();
    }

    /// Writes the buffered object; with `only_if_detailed` an object without
    /// detail lines is left out.
    fn flush(&mut self, only_if_detailed: bool) {
        let Some(header) = self.header.take() else {
            return;
        };
        if only_if_detailed && self.details.is_empty() {
            return;
        }
        self.line(&header);
        for detail in std::mem::take(&mut self.details) {
            self.line(&format!("  {detail}"));
        }
    }

    fn table_name(schema: &str, table: &str) -> String {
        format!("{}.{}", quote(schema), quote(table))
    }
}

fn option_value(option: TableOption<'_>) -> String {
    match option {
        TableOption::Checksum(v) | TableOption::DelayKeyWrite(v) => v.to_string(),
        TableOption::Engine(v)
        | TableOption::NextAutoInc(v)
        | TableOption::AvgRowLength(v)
        | TableOption::DefaultCharset(v)
        | TableOption::DefaultCollation(v)
        | TableOption::Comment(v)
        | TableOption::DataDirectory(v)
        | TableOption::IndexDirectory(v)
        | TableOption::MergeInsert(v)
        | TableOption::MaxRows(v)
        | TableOption::MinRows(v)
        | TableOption::PackKeys(v)
        | TableOption::RowFormat(v)
        | TableOption::KeyBlockSize(v)
        | TableOption::MergeUnion(v)
        | TableOption::Connection(v) => {
            if v.is_empty() {
                "(default)".to_string()
            } else {
                v.to_string()
            }
        }
        TableOption::Password(_) => "********".to_string(),
    }
}

fn position_text(position: ColumnPosition<'_>) -> String {
    match position {
        ColumnPosition::Keep => String::new(),
        ColumnPosition::First => " first".to_string(),
        ColumnPosition::After(name) => format!(" after {}", quote(name)),
    }
}

impl EmitActions for ReportGenerator {
    fn create_table_props_begin(&mut self, scope: &TableScope<'_>) {
        let name = Self::table_name(&scope.schema.name, &scope.table.name);
        self.begin(format!("Table {name} was created"));
    }

    fn create_table_props_end(&mut self, _scope: &TableScope<'_>) {
        self.flush(false);
    }

    fn create_table_columns_begin(&mut self, _scope: &TableScope<'_>) {}

    fn create_table_column(&mut self, _scope: &TableScope<'_>, column: &Column) {
        self.detail(format!(
            "Column {} {}",
            quote(&column.name),
            column.formatted_type
        ));
    }

    fn create_table_columns_end(&mut self, _scope: &TableScope<'_>) {}

    fn create_table_indexes_begin(&mut self, _scope: &TableScope<'_>) {}

    fn create_table_index(&mut self, _scope: &TableScope<'_>, index: &Index, _separate: bool) {
        if index.is_primary {
            self.detail("Primary key".to_string());
        } else {
            self.detail(format!("Index {}", quote(&index.name)));
        }
    }

    fn create_table_indexes_end(&mut self, _scope: &TableScope<'_>) {}

    fn create_table_fks_begin(&mut self, _scope: &TableScope<'_>) {}

    fn create_table_fk(&mut self, _scope: &TableScope<'_>, fk: &ForeignKey) {
        self.detail(format!("Foreign key {}", quote(&fk.name)));
    }

    fn create_table_fks_end(&mut self, _scope: &TableScope<'_>) {}

    fn create_table_option(&mut self, _scope: &TableScope<'_>, option: TableOption<'_>) {
        self.detail(format!("{}: {}", option.label(), option_value(option)));
    }

    fn create_table_partitioning(&mut self, _scope: &TableScope<'_>, spec: &PartitionSpec<'_>) {
        self.detail(format!(
            "Partitioned by {}({})",
            spec.part_type.to_ascii_uppercase(),
            spec.expression
        ));
    }

    fn drop_table(&mut self, scope: &TableScope<'_>) {
        let name = Self::table_name(&scope.schema.name, &scope.table.name);
        self.line(&format!("Table {name} was dropped"));
    }

    fn alter_table_props_begin(&mut self, scope: &TableScope<'_>) {
        let name = Self::table_name(&scope.schema.name, scope.target_name());
        self.begin(format!("Table {name} was modified"));
    }

    fn alter_table_props_end(&mut self, _scope: &TableScope<'_>) {
        self.flush(true);
    }

    fn alter_table_name(&mut self, scope: &TableScope<'_>) {
        self.detail(format!("Renamed to {}", quote(&scope.table.name)));
    }

    fn alter_table_option(&mut self, _scope: &TableScope<'_>, option: TableOption<'_>) {
        let label = option.label();
        let mut label = label.to_string();
        if let Some(first) = label.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        self.detail(format!("{label} was changed to {}", option_value(option)));
    }

    fn alter_table_columns_begin(&mut self, _scope: &TableScope<'_>) {}

    fn alter_table_add_column(
        &mut self,
        _scope: &TableScope<'_>,
        column: &Column,
        position: ColumnPosition<'_>,
    ) {
        self.detail(format!(
            "Column {} was added{}",
            quote(&column.name),
            position_text(position)
        ));
    }

    fn alter_table_drop_column(&mut self, _scope: &TableScope<'_>, column: &Column) {
        self.detail(format!("Column {} was dropped", quote(&column.name)));
    }

    fn alter_table_change_column(
        &mut self,
        _scope: &TableScope<'_>,
        old: &Column,
        new: &Column,
        position: ColumnPosition<'_>,
    ) {
        let text = if old.name == new.name {
            format!("Column {} was modified", quote(&new.name))
        } else {
            format!(
                "Column {} was renamed to {}",
                quote(&old.name),
                quote(&new.name)
            )
        };
        let moved = match position {
            ColumnPosition::Keep => String::new(),
            other => format!(" and moved{}", position_text(other)),
        };
        self.detail(format!("{text}{moved}"));
    }

    fn alter_table_columns_end(&mut self, _scope: &TableScope<'_>) {}

    fn alter_table_indexes_begin(&mut self, _scope: &TableScope<'_>) {}

    fn alter_table_add_index(&mut self, _scope: &TableScope<'_>, index: &Index) {
        self.detail(format!("Index {} was added", quote(&index.name)));
    }

    fn alter_table_drop_index(&mut self, _scope: &TableScope<'_>, index: &Index) {
        self.detail(format!("Index {} was dropped", quote(&index.name)));
    }

    fn alter_table_change_index(&mut self, _scope: &TableScope<'_>, old: &Index, new: &Index) {
        if old.name == new.name {
            self.detail(format!("Index {} was modified", quote(&new.name)));
        } else {
            self.detail(format!(
                "Index {} was renamed to {}",
                quote(&old.name),
                quote(&new.name)
            ));
        }
    }

    fn alter_table_indexes_end(&mut self, _scope: &TableScope<'_>) {}

    fn alter_table_fks_begin(&mut self, _scope: &TableScope<'_>) {}

    fn alter_table_add_fk(&mut self, _scope: &TableScope<'_>, fk: &ForeignKey) {
        self.detail(format!("Foreign key {} was added", quote(&fk.name)));
    }

    fn alter_table_drop_fk(&mut self, _scope: &TableScope<'_>, fk: &ForeignKey) {
        self.detail(format!("Foreign key {} was dropped", quote(&fk.name)));
    }

    fn alter_table_fks_end(&mut self, _scope: &TableScope<'_>) {}

    fn alter_table_partitioning(&mut self, _scope: &TableScope<'_>, spec: &PartitionSpec<'_>) {
        if spec.part_type.is_empty() || (spec.count == 0 && spec.definitions.is_empty()) {
            self.detail("Partitioning was removed".to_string());
        } else {
            self.detail(format!(
                "Partitioning was changed to {}({})",
                spec.part_type.to_ascii_uppercase(),
                spec.expression
            ));
        }
    }

    fn alter_table_partition_count(&mut self, _scope: &TableScope<'_>, old: i64, new: i64) {
        self.detail(format!("Partition count was changed from {old} to {new}"));
    }

    fn alter_table_add_partition(&mut self, _scope: &TableScope<'_>, part: &PartitionDefinition) {
        self.detail(format!("Partition {} was added", part.name));
    }

    fn alter_table_drop_partition(&mut self, _scope: &TableScope<'_>, name: &str) {
        self.detail(format!("Partition {name} was dropped"));
    }

    fn alter_table_reorganize_partition(
        &mut self,
        _scope: &TableScope<'_>,
        old: &PartitionDefinition,
        _new: &PartitionDefinition,
    ) {
        self.detail(format!("Partition {} was reorganized", old.name));
    }

    fn create_trigger(&mut self, scope: &TableScope<'_>, trigger: &Trigger, _for_alter: bool) {
        let name = Self::table_name(&scope.schema.name, &trigger.name);
        self.line(&format!("Trigger {name} was created"));
    }

    fn drop_trigger(&mut self, scope: &TableScope<'_>, trigger: &Trigger, _for_alter: bool) {
        let name = Self::table_name(&scope.schema.name, &trigger.name);
        self.line(&format!("Trigger {name} was dropped"));
    }

    fn create_schema(&mut self, schema: &Schema) {
        self.line(&format!("Schema {} was created", quote(&schema.name)));
    }

    fn drop_schema(&mut self, schema: &Schema) {
        self.line(&format!("Schema {} was dropped", quote(&schema.name)));
    }

    fn alter_schema_props_begin(&mut self, schema: &Schema) {
        self.begin(format!("Schema {} was modified", quote(&schema.name)));
    }

    fn alter_schema_name(&mut self, old: &Schema, _new: &Schema) {
        self.detail(format!("Renamed from {}", quote(&old.name)));
    }

    fn alter_schema_default_charset(&mut self, _schema: &Schema, charset: &str) {
        self.detail(format!("Default character set was changed to {charset}"));
    }

    fn alter_schema_default_collate(&mut self, _schema: &Schema, collation: &str) {
        self.detail(format!("Default collation was changed to {collation}"));
    }

    fn alter_schema_props_end(&mut self, _schema: &Schema) {
        self.flush(true);
    }

    fn create_view(&mut self, schema: &Schema, view: &View, for_alter: bool) {
        let verb = if for_alter { "replaced" } else { "created" };
        let name = Self::table_name(&schema.name, &view.name);
        self.line(&format!("View {name} was {verb}"));
    }

    fn drop_view(&mut self, schema: &Schema, view: &View) {
        let name = Self::table_name(&schema.name, &view.name);
        self.line(&format!("View {name} was dropped"));
    }

    fn create_routine(&mut self, schema: &Schema, routine: &Routine, _for_alter: bool) {
        let name = Self::table_name(&schema.name, &routine.name);
        self.line(&format!("Routine {name} was created"));
    }

    fn drop_routine(&mut self, schema: &Schema, routine: &Routine, _for_alter: bool) {
        let name = Self::table_name(&schema.name, &routine.name);
        self.line(&format!("Routine {name} was dropped"));
    }

    fn create_user(&mut self, _catalog: &Catalog, user: &User) {
        self.line(&format!("User {} was created", quote_user(&user.name)));
    }

    fn drop_user(&mut self, user: &User) {
        self.line(&format!("User {} was dropped", quote_user(&user.name)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Table;

    #[test]
    fn test_alter_lines_are_grouped_under_table() {
        let schema = Schema::new("shop");
        let old = Table::new("users")
            .column(Column::new("id", "INT"))
            .column(Column::new("email", "VARCHAR(100)"));
        let new = Table::new("users")
            .column(Column::new("id", "INT"))
            .column(Column::new("phone", "VARCHAR(20)"));
        let scope = TableScope::altered(&schema, &old, &new);

        let mut report = ReportGenerator::new();
        report.alter_table_props_begin(&scope);
        report.alter_table_drop_column(&scope, &old.columns[1]);
        report.alter_table_add_column(&scope, &new.columns[1], ColumnPosition::After("id"));
        report.alter_table_option(&scope, TableOption::Engine("MyISAM"));
        report.alter_table_props_end(&scope);

        assert_eq!(
            report.into_report(),
            "Table `shop`.`users` was modified\n  Column `email` was dropped\n  Column `phone` was added after `id`\n  Storage engine was changed to MyISAM\n"
        );
    }

    #[test]
    fn test_empty_alter_is_not_reported() {
        let schema = Schema::new("shop");
        let table = Table::new("users");
        let scope = TableScope::altered(&schema, &table, &table);
        let mut report = ReportGenerator::new();
        report.alter_table_props_begin(&scope);
        report.alter_table_props_end(&scope);
        report.alter_schema_props_begin(&schema);
        report.alter_schema_props_end(&schema);
        assert!(report.report().is_empty());
    }

    #[test]
    fn test_password_is_masked() {
        assert_eq!(option_value(TableOption::Password("secret")), "********");
        assert_eq!(option_value(TableOption::RowFormat("")), "(default)");
    }
}
