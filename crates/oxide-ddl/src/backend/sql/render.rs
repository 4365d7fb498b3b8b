//! Text of column, index, foreign key, partition and trigger clauses.

use std::sync::LazyLock;

use regex::Regex;

use crate::dialect::{charset_for_collation, comment_text, quote, quote_string};
use crate::emit::PartitionSpec;
use crate::model::{Column, ForeignKey, Index, PartitionDefinition, Table, Trigger, TypeGroup};
use crate::options::{DbTraits, ServerVersion};

static TRIGGER_BODY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\bFOR\s+EACH\s+ROW\s+(?:(?:FOLLOWS|PRECEDES)\s+\S+\s+)?(.*)$")
        .expect("trigger body pattern")
});

/// Column definition as used by `CREATE TABLE`, `ADD COLUMN` and
/// `CHANGE COLUMN`.
pub fn column_definition(column: &Column, traits: &DbTraits) -> String {
    let group = column.type_group();
    let mut parts = vec![quote(&column.name), column.formatted_type.clone()];
    parts.extend(column.flags.iter().cloned());

    if matches!(group, TypeGroup::String | TypeGroup::Text) {
        if !column.character_set_name.is_empty() {
            parts.push(format!("CHARACTER SET {}", quote_string(&column.character_set_name)));
        }
        if !column.collation_name.is_empty()
            && charset_for_collation(&column.collation_name)
                .eq_ignore_ascii_case(&column.character_set_name)
        {
            parts.push(format!("COLLATE {}", quote_string(&column.collation_name)));
        }
    }

    if column.generated {
        parts.push(format!("GENERATED ALWAYS AS ({})", column.expression));
        if !column.generated_storage.is_empty() {
            parts.push(column.generated_storage.to_ascii_uppercase());
        }
        if column.is_not_null {
            parts.push("NOT NULL".to_string());
        }
    } else {
        parts.push(if column.is_not_null { "NOT NULL" } else { "NULL" }.to_string());
        if column.default_value_is_null && !column.is_not_null {
            parts.push("DEFAULT NULL".to_string());
        } else if !column.default_value.is_empty() {
            let on_update = group == TypeGroup::Datetime
                && column
                    .default_value
                    .trim_start()
                    .to_ascii_uppercase()
                    .starts_with("ON UPDATE");
            if on_update {
                parts.push(column.default_value.clone());
            } else {
                parts.push(format!("DEFAULT {}", column.default_value));
            }
        }
        if column.auto_increment && group == TypeGroup::Numeric {
            parts.push("AUTO_INCREMENT".to_string());
        }
    }

    if !column.comment.is_empty() {
        let text = comment_text(&column.comment, traits.max_column_comment_length);
        if !text.is_empty() {
            parts.push(format!("COMMENT {text}"));
        }
    }
    parts.retain(|p| !p.is_empty());
    parts.join(" ").trim().to_string()
}

/// Index definition. With `on_table` it is shaped for `CREATE INDEX`.
pub fn index_definition(
    index: &Index,
    table: &Table,
    on_table: Option<&str>,
    traits: &DbTraits,
) -> String {
    let kind = index.index_type.to_ascii_uppercase();
    let mut sql = if index.is_primary {
        "PRIMARY KEY".to_string()
    } else if index.unique || kind == "UNIQUE" {
        "UNIQUE INDEX".to_string()
    } else if kind.is_empty() || kind == "INDEX" || kind == "FOREIGN" {
        "INDEX".to_string()
    } else if kind.ends_with("KEY") || kind.ends_with("INDEX") {
        kind.clone()
    } else {
        format!("{kind} INDEX")
    };

    if !index.is_primary {
        sql.push(' ');
        sql.push_str(&quote(&index.name));
    }
    if !index.index_kind.is_empty() {
        sql.push_str(" USING ");
        sql.push_str(&index.index_kind.to_ascii_uppercase());
    }
    if let Some(table_name) = on_table {
        sql.push_str(" ON ");
        sql.push_str(table_name);
    }

    let show_direction = !index.is_primary && kind != "FULLTEXT" && kind != "SPATIAL";
    let columns: Vec<String> = index
        .columns
        .iter()
        .map(|c| {
            let mut part = quote(&c.column);
            if c.length > 0 {
                part.push_str(&format!("({})", c.length));
            }
            if show_direction {
                part.push_str(if c.descend { " DESC" } else { " ASC" });
            }
            part
        })
        .collect();
    sql.push_str(&format!(" ({})", columns.join(", ")));

    if index.key_block_size > 0 {
        sql.push_str(&format!(" KEY_BLOCK_SIZE = {}", index.key_block_size));
    }
    if !index.with_parser.is_empty() {
        sql.push_str(&format!(" WITH PARSER {}", index.with_parser));
    }
    if !index.comment.is_empty() {
        let text = comment_text(&index.comment, traits.max_index_comment_length);
        if !text.is_empty() {
            sql.push_str(&format!(" COMMENT {text}"));
        }
    }
    // A lone unique index may become the implicit primary key, which cannot
    // be invisible.
    if traits.version.at_least(ServerVersion::INVISIBLE_INDEXES)
        && !index.is_primary
        && (!index.unique || table.indices.len() > 1)
    {
        sql.push_str(if index.visible { " VISIBLE" } else { " INVISIBLE" });
    }
    sql
}

/// Returns true if an index change can be applied with `RENAME INDEX` and
/// `ALTER INDEX ... VISIBLE`, i.e. only its name or visibility changed.
pub fn index_changes_in_place(old: &Index, new: &Index) -> bool {
    old.columns == new.columns
        && old.is_primary == new.is_primary
        && old.unique == new.unique
        && old.index_type.eq_ignore_ascii_case(&new.index_type)
        && old.index_kind.eq_ignore_ascii_case(&new.index_kind)
        && old.algorithm == new.algorithm
        && old.key_block_size == new.key_block_size
        && old.lock_option == new.lock_option
        && old.with_parser == new.with_parser
        && old.comment == new.comment
}

/// `CONSTRAINT ... FOREIGN KEY ... REFERENCES ...` clause.
pub fn foreign_key_definition(fk: &ForeignKey, owner_schema: &str, omit_schemas: bool) -> String {
    let columns = quote_list(&fk.columns);
    let referenced_columns = quote_list(&fk.referenced_columns);
    let target = fk.referenced_table.as_ref().map_or_else(String::new, |r| {
        let schema = if r.schema.is_empty() { owner_schema } else { &r.schema };
        if omit_schemas && schema == owner_schema {
            quote(&r.name)
        } else {
            format!("{}.{}", quote(schema), quote(&r.name))
        }
    });
    format!(
        "CONSTRAINT {}\n    FOREIGN KEY ({})\n    REFERENCES {} ({})\n    ON DELETE {}\n    ON UPDATE {}",
        quote(&fk.name),
        columns,
        target,
        referenced_columns,
        rule(&fk.delete_rule),
        rule(&fk.update_rule),
    )
}

fn rule(rule: &str) -> &str {
    if rule.is_empty() {
        "NO ACTION"
    } else {
        rule
    }
}

fn quote_list(names: &[String]) -> String {
    names.iter().map(|n| quote(n)).collect::<Vec<_>>().join(", ")
}

/// ` PARTITION BY ...` clause with its partition list.
pub fn partition_by(spec: &PartitionSpec<'_>) -> String {
    let mut sql = format!(
        " PARTITION BY {}({})",
        spec.part_type.to_ascii_uppercase(),
        spec.expression
    );
    if spec.count > 0 {
        sql.push_str(&format!(" PARTITIONS {}", spec.count));
    }
    if spec.has_definitions() {
        if !spec.subpart_type.is_empty() {
            sql.push_str(&format!(
                " SUBPARTITION BY {}({})",
                spec.subpart_type.to_ascii_uppercase(),
                spec.subpart_expression
            ));
            if spec.subpart_count > 0 {
                sql.push_str(&format!(" SUBPARTITIONS {}", spec.subpart_count));
            }
        }
        if !spec.definitions.is_empty() {
            let parts: Vec<String> = spec
                .definitions
                .iter()
                .map(|d| format!(" PARTITION {}", partition_definition(d, spec.part_type)))
                .collect();
            sql.push_str(&format!(" ({})", parts.join(",")));
        }
    }
    sql.push(' ');
    sql
}

/// Name, bound and options of one partition.
pub fn partition_definition(part: &PartitionDefinition, part_type: &str) -> String {
    let mut sql = part.name.clone();
    if !part.value.is_empty() {
        let kind = part_type.to_ascii_uppercase();
        if kind.starts_with("RANGE") {
            sql.push_str(&format!(" VALUES LESS THAN ({})", part.value));
        } else if kind.starts_with("LIST") {
            sql.push_str(&format!(" VALUES IN ({})", part.value));
        }
    }
    sql.push_str(&partition_options(part));
    if !part.subpartition_definitions.is_empty() {
        let subs: Vec<String> = part
            .subpartition_definitions
            .iter()
            .map(|s| format!(" SUBPARTITION {}{}", s.name, partition_options(s)))
            .collect();
        sql.push_str(&format!(" ({})", subs.join(",")));
    }
    sql
}

fn partition_options(part: &PartitionDefinition) -> String {
    let mut sql = String::new();
    if !part.comment.is_empty() {
        sql.push_str(&format!(" COMMENT = {}", quote_string(&part.comment)));
    }
    if !part.data_directory.is_empty() {
        sql.push_str(&format!(" DATA DIRECTORY = {}", quote_string(&part.data_directory)));
    }
    if !part.index_directory.is_empty() {
        sql.push_str(&format!(" INDEX DIRECTORY = {}", quote_string(&part.index_directory)));
    }
    if !part.max_rows.is_empty() {
        sql.push_str(&format!(" MAX_ROWS = {}", part.max_rows));
    }
    if !part.min_rows.is_empty() {
        sql.push_str(&format!(" MIN_ROWS = {}", part.min_rows));
    }
    sql
}

/// Rebuilds a `CREATE TRIGGER` statement with an ordering clause.
///
/// `trigger_name` and `table_name` are already quoted and qualified as the
/// caller wants them.
pub fn trigger_with_order(
    trigger: &Trigger,
    trigger_name: &str,
    table_name: &str,
    order: Option<(&str, &str)>,
) -> String {
    let mut sql = String::from("CREATE ");
    if !trigger.definer.is_empty() {
        sql.push_str(&format!("DEFINER = {} ", trigger.definer));
    }
    sql.push_str(&format!(
        "TRIGGER {} {} {} ON {} FOR EACH ROW",
        trigger_name,
        trigger.timing.to_ascii_uppercase(),
        trigger.event.to_ascii_uppercase(),
        table_name
    ));
    if let Some((keyword, other)) = order {
        sql.push_str(&format!(" {} {}", keyword, quote(other)));
    }
    sql.push('\n');
    sql.push_str(&trigger_body(trigger));
    sql
}

fn trigger_body(trigger: &Trigger) -> String {
    if !trigger.sql_body.is_empty() {
        return trigger.sql_body.clone();
    }
    TRIGGER_BODY
        .captures(&trigger.sql_definition)
        .and_then(|caps| caps.get(1))
        .map_or_else(String::new, |m| m.as_str().to_string())
}
