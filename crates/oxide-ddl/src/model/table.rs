//! Tables and the objects they own.

use serde::{Deserialize, Serialize};

use super::{old_or_current, ObjectRef};

/// A table with the full MySQL option set.
///
/// Numeric options that MySQL treats as "unset" when zero (`checksum`,
/// `delay_key_write`) are plain integers. String options are empty when
/// unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Table {
    pub name: String,
    pub old_name: String,
    pub id: String,
    /// Placeholder for a table defined outside the model.
    pub is_stub: bool,
    pub model_only: bool,
    pub is_temporary: bool,
    pub columns: Vec<Column>,
    pub indices: Vec<Index>,
    pub foreign_keys: Vec<ForeignKey>,
    pub triggers: Vec<Trigger>,
    pub table_engine: String,
    pub next_auto_inc: String,
    pub avg_row_length: String,
    pub checksum: i64,
    pub default_character_set_name: String,
    pub default_collation_name: String,
    pub comment: String,
    pub table_data_dir: String,
    pub table_index_dir: String,
    pub delay_key_write: i64,
    pub merge_insert: String,
    pub merge_union: String,
    pub max_rows: String,
    pub min_rows: String,
    pub pack_keys: String,
    pub password: String,
    pub row_format: String,
    pub key_block_size: String,
    pub connection_string: String,
    pub partition_type: String,
    pub partition_expression: String,
    pub partition_count: i64,
    pub subpartition_type: String,
    pub subpartition_expression: String,
    pub subpartition_count: i64,
    pub partition_definitions: Vec<PartitionDefinition>,
    /// Rows to load after the structure is created.
    pub inserts: Option<TableData>,
}

impl Table {
    /// Creates an empty table.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a column.
    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Adds an index.
    #[must_use]
    pub fn index(mut self, index: Index) -> Self {
        self.indices.push(index);
        self
    }

    /// Adds a foreign key.
    #[must_use]
    pub fn foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    /// Adds a trigger.
    #[must_use]
    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.triggers.push(trigger);
        self
    }

    /// Sets the storage engine.
    #[must_use]
    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.table_engine = engine.into();
        self
    }

    /// Records the pre-change name.
    #[must_use]
    pub fn renamed_from(mut self, old_name: impl Into<String>) -> Self {
        self.old_name = old_name.into();
        self
    }

    /// The name this table had before the change.
    #[must_use]
    pub fn previous_name(&self) -> &str {
        old_or_current(&self.old_name, &self.name)
    }

    /// Finds a column by name.
    #[must_use]
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Finds a trigger by name.
    #[must_use]
    pub fn find_trigger(&self, name: &str) -> Option<&Trigger> {
        self.triggers.iter().find(|t| t.name == name)
    }

    /// Returns true if any foreign key is backed by the named index.
    #[must_use]
    pub fn index_used_by_fk(&self, index: &str) -> bool {
        self.foreign_keys.iter().any(|fk| fk.index == index)
    }

    /// Returns true if the index backs foreign keys that are all model only.
    #[must_use]
    pub fn index_used_only_by_model_fks(&self, index: &str) -> bool {
        let mut users = self.foreign_keys.iter().filter(|fk| fk.index == index).peekable();
        users.peek().is_some() && users.all(|fk| fk.model_only)
    }
}

/// Broad category of a column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeGroup {
    Numeric,
    String,
    Text,
    Blob,
    Datetime,
    Gis,
    Json,
    Various,
    UserDefined,
}

impl TypeGroup {
    /// Guesses the group from a formatted type such as `VARCHAR(45)`.
    #[must_use]
    pub fn infer(formatted_type: &str) -> Self {
        let base = formatted_type
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase();
        match base.as_str() {
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "INTEGER" | "BIGINT" | "DECIMAL"
            | "DEC" | "NUMERIC" | "FLOAT" | "DOUBLE" | "REAL" | "BIT" | "BOOL" | "BOOLEAN" => {
                Self::Numeric
            }
            "CHAR" | "VARCHAR" | "NCHAR" | "NVARCHAR" | "BINARY" | "VARBINARY" => Self::String,
            "TINYTEXT" | "TEXT" | "MEDIUMTEXT" | "LONGTEXT" => Self::Text,
            "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => Self::Blob,
            "DATE" | "DATETIME" | "TIMESTAMP" | "TIME" | "YEAR" => Self::Datetime,
            "GEOMETRY" | "POINT" | "LINESTRING" | "POLYGON" | "MULTIPOINT"
            | "MULTILINESTRING" | "MULTIPOLYGON" | "GEOMETRYCOLLECTION" => Self::Gis,
            "JSON" => Self::Json,
            _ => Self::Various,
        }
    }
}

/// Simple (base) type of a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleType {
    pub name: String,
    pub group: Option<TypeGroup>,
}

/// A table column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Column {
    pub name: String,
    pub old_name: String,
    /// Type as written in DDL, e.g. `VARCHAR(45)`.
    pub formatted_type: String,
    pub simple_type: Option<SimpleType>,
    pub character_set_name: String,
    pub collation_name: String,
    /// Type flags such as `UNSIGNED` or `ZEROFILL`.
    pub flags: Vec<String>,
    pub is_not_null: bool,
    pub default_value_is_null: bool,
    pub default_value: String,
    pub auto_increment: bool,
    pub comment: String,
    pub generated: bool,
    pub expression: String,
    /// `VIRTUAL` or `STORED`.
    pub generated_storage: String,
}

impl Column {
    /// Creates a nullable column of the given type.
    #[must_use]
    pub fn new(name: impl Into<String>, formatted_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            formatted_type: formatted_type.into(),
            ..Self::default()
        }
    }

    /// Marks the column `NOT NULL`.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.is_not_null = true;
        self
    }

    /// Sets a literal default value.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = value.into();
        self
    }

    /// Marks the column `AUTO_INCREMENT`.
    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Records the pre-change name.
    #[must_use]
    pub fn renamed_from(mut self, old_name: impl Into<String>) -> Self {
        self.old_name = old_name.into();
        self
    }

    /// Type group, taken from the simple type or inferred from the text.
    #[must_use]
    pub fn type_group(&self) -> TypeGroup {
        self.simple_type
            .as_ref()
            .and_then(|t| t.group)
            .unwrap_or_else(|| TypeGroup::infer(&self.formatted_type))
    }

    /// The name this column had before the change.
    #[must_use]
    pub fn previous_name(&self) -> &str {
        old_or_current(&self.old_name, &self.name)
    }
}

/// One column of an index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexColumn {
    pub column: String,
    /// Prefix length, zero for the whole value.
    pub length: u32,
    pub descend: bool,
}

/// A table index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Index {
    pub name: String,
    pub old_name: String,
    pub is_primary: bool,
    pub unique: bool,
    /// `INDEX`, `UNIQUE`, `FULLTEXT`, `SPATIAL`, `PRIMARY` or `FOREIGN`.
    pub index_type: String,
    /// Storage kind such as `BTREE` or `HASH`.
    pub index_kind: String,
    pub columns: Vec<IndexColumn>,
    pub key_block_size: u32,
    pub with_parser: String,
    pub comment: String,
    pub visible: bool,
    pub algorithm: String,
    pub lock_option: String,
}

impl Default for Index {
    fn default() -> Self {
        Self {
            name: String::new(),
            old_name: String::new(),
            is_primary: false,
            unique: false,
            index_type: String::new(),
            index_kind: String::new(),
            columns: Vec::new(),
            key_block_size: 0,
            with_parser: String::new(),
            comment: String::new(),
            visible: true,
            algorithm: String::new(),
            lock_option: String::new(),
        }
    }
}

impl Index {
    /// A plain secondary index over the given columns.
    #[must_use]
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            index_type: "INDEX".to_string(),
            columns: columns
                .iter()
                .map(|c| IndexColumn {
                    column: (*c).to_string(),
                    ..IndexColumn::default()
                })
                .collect(),
            ..Self::default()
        }
    }

    /// The primary key over the given columns.
    #[must_use]
    pub fn primary(columns: &[&str]) -> Self {
        let mut index = Self::new("PRIMARY", columns);
        index.is_primary = true;
        index.unique = true;
        index.index_type = "PRIMARY".to_string();
        index
    }

    /// A unique index over the given columns.
    #[must_use]
    pub fn unique(name: impl Into<String>, columns: &[&str]) -> Self {
        let mut index = Self::new(name, columns);
        index.unique = true;
        index.index_type = "UNIQUE".to_string();
        index
    }

    /// Sets visibility.
    #[must_use]
    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// The name this index had before the change.
    #[must_use]
    pub fn previous_name(&self) -> &str {
        old_or_current(&self.old_name, &self.name)
    }
}

/// A foreign key constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForeignKey {
    pub name: String,
    pub columns: Vec<String>,
    pub referenced_table: Option<ObjectRef>,
    pub referenced_columns: Vec<String>,
    pub delete_rule: String,
    pub update_rule: String,
    pub model_only: bool,
    /// Name of the index backing this constraint.
    pub index: String,
}

impl ForeignKey {
    /// A foreign key from `columns` to `referenced_columns` of a table.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        columns: &[&str],
        referenced_table: ObjectRef,
        referenced_columns: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(ToString::to_string).collect(),
            referenced_table: Some(referenced_table),
            referenced_columns: referenced_columns.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }

    /// Sets the backing index name.
    #[must_use]
    pub fn backed_by(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }
}

/// A table trigger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Trigger {
    pub name: String,
    pub old_name: String,
    pub id: String,
    /// `INSERT`, `UPDATE` or `DELETE`.
    pub event: String,
    /// `BEFORE` or `AFTER`.
    pub timing: String,
    pub definer: String,
    /// Full `CREATE TRIGGER` statement.
    pub sql_definition: String,
    /// Statement executed for each row.
    pub sql_body: String,
    pub model_only: bool,
}

impl Trigger {
    /// Creates a trigger from its parts.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        timing: impl Into<String>,
        event: impl Into<String>,
        sql_body: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            timing: timing.into(),
            event: event.into(),
            sql_body: sql_body.into(),
            ..Self::default()
        }
    }

    /// Returns true if both triggers fire on the same event and timing.
    #[must_use]
    pub fn same_slot(&self, other: &Self) -> bool {
        self.event.eq_ignore_ascii_case(&other.event)
            && self.timing.eq_ignore_ascii_case(&other.timing)
    }
}

/// One partition of a partitioned table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionDefinition {
    pub name: String,
    /// Bound for `RANGE` or value list for `LIST` partitioning.
    pub value: String,
    pub comment: String,
    pub data_directory: String,
    pub index_directory: String,
    pub max_rows: String,
    pub min_rows: String,
    pub subpartition_definitions: Vec<PartitionDefinition>,
}

impl PartitionDefinition {
    /// A partition with a bound value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Self::default()
        }
    }
}

/// Rows attached to a table for data load scripts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableData {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_group_inference() {
        assert_eq!(TypeGroup::infer("INT(11)"), TypeGroup::Numeric);
        assert_eq!(TypeGroup::infer("varchar(45)"), TypeGroup::String);
        assert_eq!(TypeGroup::infer("LONGTEXT"), TypeGroup::Text);
        assert_eq!(TypeGroup::infer("TIMESTAMP"), TypeGroup::Datetime);
        assert_eq!(TypeGroup::infer("JSON"), TypeGroup::Json);
        assert_eq!(TypeGroup::infer("ENUM('a','b')"), TypeGroup::Various);
    }

    #[test]
    fn test_explicit_simple_type_wins() {
        let mut column = Column::new("flag", "ENUM('y','n')");
        column.simple_type = Some(SimpleType {
            name: "ENUM".into(),
            group: Some(TypeGroup::String),
        });
        assert_eq!(column.type_group(), TypeGroup::String);
    }

    #[test]
    fn test_index_defaults_visible() {
        assert!(Index::new("idx", &["a"]).visible);
        let parsed: Index = serde_json::from_str(r#"{"name":"i"}"#).unwrap();
        assert!(parsed.visible);
    }

    #[test]
    fn test_index_used_only_by_model_fks() {
        let mut model_fk = ForeignKey::new("fk1", &["a"], ObjectRef::table("s", "p"), &["id"])
            .backed_by("fk1_idx");
        model_fk.model_only = true;
        let table = Table::new("c").foreign_key(model_fk);
        assert!(table.index_used_only_by_model_fks("fk1_idx"));
        assert!(!table.index_used_only_by_model_fks("other"));

        let table = table.foreign_key(
            ForeignKey::new("fk2", &["a"], ObjectRef::table("s", "p"), &["id"])
                .backed_by("fk1_idx"),
        );
        assert!(!table.index_used_only_by_model_fks("fk1_idx"));
    }
}
