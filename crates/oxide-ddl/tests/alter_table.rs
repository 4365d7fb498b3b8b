//! Integration tests for table alters driven by catalog changes.

mod common;

use common::{
    alter_statements, alter_statements_with, attribute, catalog_change, column, index, list,
    modified_table, mydb, table, table1,
};
use oxide_ddl::prelude::*;

// =============================================================================
// Columns
// =============================================================================

#[test]
fn test_drop_and_add_column_in_one_statement() {
    let old_table = table1();
    let mut new_table = table1();
    new_table.columns.pop();
    new_table = new_table.column(Column::new("phone", "VARCHAR(45)"));
    let old = mydb(vec![old_table.clone()]);
    let new = mydb(vec![new_table.clone()]);

    let change = catalog_change(
        &old,
        &new,
        vec![modified_table(
            &old_table,
            &new_table,
            vec![list(
                "columns",
                vec![
                    ListItemChange::Removed {
                        value: column(&old_table.columns[2]),
                    },
                    ListItemChange::Added {
                        value: column(&new_table.columns[2]),
                    },
                ],
            )],
        )],
    );

    let statements = alter_statements(&old, &new, &change, DbTraits::default());
    assert_eq!(
        statements,
        vec![
            "ALTER TABLE `mydb`.`table1` \n\
             DROP COLUMN `email`,\n\
             ADD COLUMN `phone` VARCHAR(45) NULL AFTER `name`"
                .to_string()
        ]
    );
}

#[test]
fn test_after_target_uses_renamed_column() {
    let old_table = table1();
    let new_table = Table::new("table1")
        .column(Column::new("idtable1", "INT").not_null())
        .column(Column::new("full_name", "VARCHAR(45)").renamed_from("name"))
        .column(Column::new("phone", "VARCHAR(20)"))
        .column(Column::new("email", "VARCHAR(45)"))
        .index(Index::primary(&["idtable1"]));
    let old = mydb(vec![old_table.clone()]);
    let new = mydb(vec![new_table.clone()]);

    let change = catalog_change(
        &old,
        &new,
        vec![modified_table(
            &old_table,
            &new_table,
            vec![list(
                "columns",
                vec![
                    ListItemChange::Modified {
                        old: column(&old_table.columns[1]),
                        new: column(&new_table.columns[1]),
                        change: Some(Box::new(Change::modified(vec![AttributeChange::new(
                            "name",
                            Change::text("name", "full_name"),
                        )]))),
                    },
                    ListItemChange::Added {
                        value: column(&new_table.columns[2]),
                    },
                ],
            )],
        )],
    );

    let statements = alter_statements(&old, &new, &change, DbTraits::default());
    assert_eq!(statements.len(), 1);
    let sql = &statements[0];
    assert!(sql.contains("ADD COLUMN `phone` VARCHAR(20) NULL AFTER `full_name`"));
    assert!(sql.contains("CHANGE COLUMN `name` `full_name` VARCHAR(45) NULL"));
    assert!(sql.find("ADD COLUMN").unwrap() < sql.find("CHANGE COLUMN").unwrap());
}

#[test]
fn test_reorder_only_changes_emit_nothing() {
    let old_table = table1().index(Index::new("idx_name", &["name"]));
    let new_table = old_table.clone();
    let old = mydb(vec![old_table.clone()]);
    let new = mydb(vec![new_table.clone()]);

    let change = catalog_change(
        &old,
        &new,
        vec![modified_table(
            &old_table,
            &new_table,
            vec![list(
                "indices",
                vec![ListItemChange::OrderChanged {
                    old: index(&old_table.indices[1]),
                    new: index(&new_table.indices[1]),
                    change: None,
                }],
            )],
        )],
    );

    assert!(alter_statements(&old, &new, &change, DbTraits::default()).is_empty());
}

// =============================================================================
// Indexes
// =============================================================================

fn visibility_change() -> (Catalog, Catalog, Change) {
    let old_table = table1().index(Index::new("idx_name", &["name"]));
    let mut new_table = old_table.clone();
    new_table.indices[1] = new_table.indices[1].clone().visible(false);
    let old = mydb(vec![old_table.clone()]);
    let new = mydb(vec![new_table.clone()]);
    let change = catalog_change(
        &old,
        &new,
        vec![modified_table(
            &old_table,
            &new_table,
            vec![list(
                "indices",
                vec![ListItemChange::Modified {
                    old: index(&old_table.indices[1]),
                    new: index(&new_table.indices[1]),
                    change: None,
                }],
            )],
        )],
    );
    (old, new, change)
}

#[test]
fn test_visibility_change_alters_index_in_place() {
    let (old, new, change) = visibility_change();
    let traits = DbTraits::for_server_version(ServerVersion::new(8, 0, 0));
    assert_eq!(
        alter_statements(&old, &new, &change, traits),
        vec!["ALTER TABLE `mydb`.`table1` ALTER INDEX `idx_name` INVISIBLE".to_string()]
    );
}

#[test]
fn test_visibility_change_recreates_index_before_8() {
    let (old, new, change) = visibility_change();
    let traits = DbTraits::for_server_version(ServerVersion::new(5, 7, 30));
    let statements = alter_statements(&old, &new, &change, traits);
    assert_eq!(statements.len(), 1);
    let sql = &statements[0];
    assert!(!sql.contains("ALTER INDEX"));
    let drop = sql.find("DROP INDEX `idx_name`").unwrap();
    let add = sql.find("ADD INDEX `idx_name`").unwrap();
    assert!(drop < add);
}

// =============================================================================
// Foreign keys
// =============================================================================

#[test]
fn test_dropped_table_loses_incoming_foreign_key_first() {
    let parent = Table::new("parent")
        .column(Column::new("id", "INT").not_null())
        .index(Index::primary(&["id"]));
    let fk = ForeignKey::new(
        "fk_child_parent",
        &["parent_id"],
        ObjectRef::table("mydb", "parent"),
        &["id"],
    );
    let old_child = Table::new("child")
        .column(Column::new("id", "INT").not_null())
        .column(Column::new("parent_id", "INT"))
        .index(Index::primary(&["id"]))
        .foreign_key(fk.clone());
    let mut new_child = old_child.clone();
    new_child.foreign_keys.clear();

    let old = mydb(vec![parent.clone(), old_child.clone()]);
    let new = mydb(vec![new_child.clone()]);
    let change = catalog_change(
        &old,
        &new,
        vec![
            ListItemChange::Removed {
                value: table(&parent),
            },
            modified_table(
                &old_child,
                &new_child,
                vec![list(
                    "foreign_keys",
                    vec![ListItemChange::Removed {
                        value: Value::ForeignKey(Box::new(fk)),
                    }],
                )],
            ),
        ],
    );

    let statements = alter_statements(&old, &new, &change, DbTraits::default());
    assert_eq!(
        statements,
        vec![
            "ALTER TABLE `mydb`.`child` \nDROP FOREIGN KEY `fk_child_parent`".to_string(),
            "DROP TABLE IF EXISTS `mydb`.`parent` ".to_string(),
        ]
    );
}

#[test]
fn test_no_foreign_key_added_towards_dropped_table() {
    let parent = Table::new("parent")
        .column(Column::new("id", "INT").not_null())
        .index(Index::primary(&["id"]));
    let old_child = Table::new("child")
        .column(Column::new("id", "INT").not_null())
        .column(Column::new("parent_id", "INT"))
        .index(Index::primary(&["id"]));
    let fk = ForeignKey::new(
        "fk_child_parent",
        &["parent_id"],
        ObjectRef::table("mydb", "parent"),
        &["id"],
    );
    let new_child = old_child.clone().foreign_key(fk.clone());

    let old = mydb(vec![parent.clone(), old_child.clone()]);
    let new = mydb(vec![new_child.clone()]);
    let change = catalog_change(
        &old,
        &new,
        vec![
            ListItemChange::Removed {
                value: table(&parent),
            },
            modified_table(
                &old_child,
                &new_child,
                vec![list(
                    "foreign_keys",
                    vec![ListItemChange::Added {
                        value: Value::ForeignKey(Box::new(fk)),
                    }],
                )],
            ),
        ],
    );

    let statements = alter_statements(&old, &new, &change, DbTraits::default());
    assert_eq!(
        statements,
        vec!["DROP TABLE IF EXISTS `mydb`.`parent` ".to_string()]
    );
}

// =============================================================================
// Foreign key modes
// =============================================================================

fn child_with_note() -> Table {
    Table::new("child")
        .column(Column::new("id", "INT").not_null())
        .column(Column::new("parent_id", "INT"))
        .column(Column::new("note", "TEXT"))
        .index(Index::primary(&["id"]))
}

/// `child` drops its `note` column and gains a foreign key to `parent`.
fn note_dropped_fk_added() -> (Catalog, Catalog, Change) {
    let parent = Table::new("parent")
        .column(Column::new("id", "INT").not_null())
        .index(Index::primary(&["id"]));
    let old_child = child_with_note();
    let fk = ForeignKey::new(
        "fk_child_parent",
        &["parent_id"],
        ObjectRef::table("mydb", "parent"),
        &["id"],
    );
    let mut new_child = old_child.clone().foreign_key(fk.clone());
    new_child.columns.pop();

    let old = mydb(vec![parent.clone(), old_child.clone()]);
    let new = mydb(vec![parent, new_child.clone()]);
    let change = catalog_change(
        &old,
        &new,
        vec![modified_table(
            &old_child,
            &new_child,
            vec![
                list(
                    "columns",
                    vec![ListItemChange::Removed {
                        value: column(&old_child.columns[2]),
                    }],
                ),
                list(
                    "foreign_keys",
                    vec![ListItemChange::Added {
                        value: Value::ForeignKey(Box::new(fk)),
                    }],
                ),
            ],
        )],
    );
    (old, new, change)
}

const ADD_FK: &str = "ADD CONSTRAINT `fk_child_parent`\n    FOREIGN KEY (`parent_id`)\n    \
                      REFERENCES `mydb`.`parent` (`id`)\n    ON DELETE NO ACTION\n    \
                      ON UPDATE NO ACTION";

#[test]
fn test_foreign_keys_added_in_second_statement_by_default() {
    let (old, new, change) = note_dropped_fk_added();
    assert_eq!(
        alter_statements(&old, &new, &change, DbTraits::default()),
        vec![
            "ALTER TABLE `mydb`.`child` \nDROP COLUMN `note`".to_string(),
            format!("ALTER TABLE `mydb`.`child` \n{ADD_FK}"),
        ]
    );
}

#[test]
fn test_foreign_keys_share_the_alter_without_separate_pass() {
    let (old, new, change) = note_dropped_fk_added();
    let options = GeneratorOptions::default().with_separate_foreign_keys(false);
    assert_eq!(
        alter_statements_with(&old, &new, &change, DbTraits::default(), options),
        vec![format!(
            "ALTER TABLE `mydb`.`child` \nDROP COLUMN `note`,\n{ADD_FK}"
        )]
    );
}

#[test]
fn test_skip_foreign_keys_emits_no_constraint() {
    let (old, new, change) = note_dropped_fk_added();
    let options = GeneratorOptions::default().with_skip_foreign_keys(true);
    assert_eq!(
        alter_statements_with(&old, &new, &change, DbTraits::default(), options),
        vec!["ALTER TABLE `mydb`.`child` \nDROP COLUMN `note`".to_string()]
    );
}

// =============================================================================
// Partitioning
// =============================================================================

fn hash_partitioned(count: i64) -> Table {
    let mut table = table1();
    table.partition_type = "HASH".into();
    table.partition_expression = "idtable1".into();
    table.partition_count = count;
    table
}

fn range_partitioned(parts: &[PartitionDefinition]) -> Table {
    let mut table = table1();
    table.partition_type = "RANGE".into();
    table.partition_expression = "idtable1".into();
    table.partition_count = i64::try_from(parts.len()).unwrap();
    table.partition_definitions = parts.to_vec();
    table
}

fn range_parts() -> Vec<PartitionDefinition> {
    vec![
        PartitionDefinition::new("p0", "10"),
        PartitionDefinition::new("p1", "20"),
        PartitionDefinition::new("p2", "30"),
        PartitionDefinition::new("p3", "MAXVALUE"),
    ]
}

fn partition(part: &PartitionDefinition) -> Value {
    Value::PartitionDefinition(Box::new(part.clone()))
}

fn partition_statements(
    old_table: &Table,
    new_table: &Table,
    attributes: Vec<AttributeChange>,
) -> Vec<String> {
    let old = mydb(vec![old_table.clone()]);
    let new = mydb(vec![new_table.clone()]);
    let change = catalog_change(
        &old,
        &new,
        vec![modified_table(old_table, new_table, attributes)],
    );
    alter_statements(&old, &new, &change, DbTraits::default())
}

#[test]
fn test_partition_count_zero_removes_partitioning() {
    let statements = partition_statements(
        &hash_partitioned(4),
        &hash_partitioned(0),
        vec![attribute("partition_count", "4", "0")],
    );
    assert_eq!(
        statements,
        vec!["ALTER TABLE `mydb`.`table1` \n REMOVE PARTITIONING ".to_string()]
    );
}

#[test]
fn test_hash_partition_count_changes_by_difference() {
    let grown = partition_statements(
        &hash_partitioned(4),
        &hash_partitioned(6),
        vec![attribute("partition_count", "4", "6")],
    );
    assert_eq!(
        grown,
        vec!["ALTER TABLE `mydb`.`table1` \n ADD PARTITION PARTITIONS 2".to_string()]
    );

    let shrunk = partition_statements(
        &hash_partitioned(6),
        &hash_partitioned(3),
        vec![attribute("partition_count", "6", "3")],
    );
    assert_eq!(
        shrunk,
        vec!["ALTER TABLE `mydb`.`table1` \n COALESCE PARTITION 3".to_string()]
    );
}

#[test]
fn test_dropped_range_partitions_share_one_clause() {
    let parts = range_parts();
    let statements = partition_statements(
        &range_partitioned(&parts),
        &range_partitioned(&parts[2..]),
        vec![
            attribute("partition_count", "4", "2"),
            list(
                "partition_definitions",
                vec![
                    ListItemChange::Removed {
                        value: partition(&parts[0]),
                    },
                    ListItemChange::Removed {
                        value: partition(&parts[1]),
                    },
                ],
            ),
        ],
    );
    assert_eq!(
        statements,
        vec!["ALTER TABLE `mydb`.`table1` \n DROP PARTITION p0, p1".to_string()]
    );
}

#[test]
fn test_redefined_partition_is_reorganized_separately() {
    let parts = range_parts();
    let mut new_parts = parts.clone();
    new_parts[1].value = "25".into();
    let old_table = range_partitioned(&parts);
    let mut new_table = range_partitioned(&new_parts);
    new_table.columns.pop();

    let statements = partition_statements(
        &old_table,
        &new_table,
        vec![
            list(
                "columns",
                vec![ListItemChange::Removed {
                    value: column(&old_table.columns[2]),
                }],
            ),
            list(
                "partition_definitions",
                vec![ListItemChange::Modified {
                    old: partition(&parts[1]),
                    new: partition(&new_parts[1]),
                    change: None,
                }],
            ),
        ],
    );
    assert_eq!(
        statements,
        vec![
            "ALTER TABLE `mydb`.`table1` \nDROP COLUMN `email`".to_string(),
            "ALTER TABLE `mydb`.`table1` \n REORGANIZE PARTITION p1 INTO \
             ( PARTITION p1 VALUES LESS THAN (25))"
                .to_string(),
        ]
    );
}

// =============================================================================
// Allow-lists
// =============================================================================

fn only_tables(names: &[&str]) -> GeneratorOptions {
    GeneratorOptions::default().with_filters(ObjectFilters::new().tables(names.iter().copied()))
}

#[test]
fn test_filtered_table_still_gets_its_triggers() {
    let old_table = table1();
    let mut new_table = table1().trigger(Trigger::new(
        "table1_bi",
        "BEFORE",
        "INSERT",
        "SET NEW.name = TRIM(NEW.name)",
    ));
    new_table.columns.pop();
    let old = mydb(vec![old_table.clone()]);
    let new = mydb(vec![new_table.clone()]);
    let change = catalog_change(
        &old,
        &new,
        vec![modified_table(
            &old_table,
            &new_table,
            vec![
                list(
                    "columns",
                    vec![ListItemChange::Removed {
                        value: column(&old_table.columns[2]),
                    }],
                ),
                list(
                    "triggers",
                    vec![ListItemChange::Added {
                        value: Value::Trigger(Box::new(new_table.triggers[0].clone())),
                    }],
                ),
            ],
        )],
    );

    let statements = alter_statements_with(
        &old,
        &new,
        &change,
        DbTraits::default(),
        only_tables(&["`mydb`.`other`"]),
    );
    assert_eq!(statements.len(), 1);
    assert!(statements[0].starts_with("USE `mydb`$$\nCREATE TRIGGER `mydb`.`table1_bi`"));
}

#[test]
fn test_renamed_table_matches_filter_by_old_name() {
    let old_table = table1();
    let mut new_table = table1().renamed_from("table1");
    new_table.name = "customers".into();
    let old = mydb(vec![old_table.clone()]);
    let new = mydb(vec![new_table.clone()]);
    let change = catalog_change(
        &old,
        &new,
        vec![modified_table(
            &old_table,
            &new_table,
            vec![attribute("name", "table1", "customers")],
        )],
    );

    let by_old = alter_statements_with(
        &old,
        &new,
        &change,
        DbTraits::default(),
        only_tables(&["`mydb`.`table1`"]),
    );
    assert_eq!(
        by_old,
        vec!["ALTER TABLE `mydb`.`table1` \nRENAME TO `mydb`.`customers` ".to_string()]
    );

    let by_new = alter_statements_with(
        &old,
        &new,
        &change,
        DbTraits::default(),
        only_tables(&["`mydb`.`customers`"]),
    );
    assert!(by_new.is_empty());
}
