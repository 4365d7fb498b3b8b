//! Integration tests for trigger ordering.

mod common;

use common::{catalog_change, list, modified_table, mydb, table1};
use oxide_ddl::prelude::*;

fn audit_triggers(table: Table) -> Table {
    table
        .trigger(Trigger::new("table1_bi_a", "BEFORE", "INSERT", "SET NEW.name = TRIM(NEW.name)"))
        .trigger(Trigger::new("table1_bi_b", "BEFORE", "INSERT", "SET NEW.email = LOWER(NEW.email)"))
}

#[test]
fn test_second_trigger_follows_first_on_create() {
    let catalog = mydb(vec![audit_triggers(table1())]);
    let change = Change::ValueAdded {
        value: Value::Schema(Box::new(catalog.schemata[0].clone())),
    };
    let mut store = FragmentStore::list();
    let options = GeneratorOptions::default();
    let mut backend = SqlGenerator::new(&mut store, DbTraits::default(), options.clone());
    DiffSqlGenerator::new(&mut backend, options)
        .process_diff_change(&change, None, Some(&catalog))
        .unwrap();

    let triggers: Vec<&str> = store
        .as_list()
        .unwrap()
        .iter()
        .filter(|(object, _)| object.kind == ObjectKind::Trigger)
        .map(|(_, sql)| sql)
        .collect();
    assert_eq!(triggers.len(), 2);
    assert!(!triggers[0].contains("FOLLOWS"));
    assert!(!triggers[0].contains("PRECEDES"));
    assert!(triggers[1].starts_with(
        "CREATE TRIGGER `mydb`.`table1_bi_b` BEFORE INSERT ON `table1` FOR EACH ROW FOLLOWS `table1_bi_a`\n"
    ));
}

#[test]
fn test_triggers_added_together_are_chained() {
    let old_table = table1();
    let new_table = audit_triggers(table1());
    let old = mydb(vec![old_table.clone()]);
    let new = mydb(vec![new_table.clone()]);
    let trigger = |t: &Trigger| ListItemChange::Added {
        value: Value::Trigger(Box::new(t.clone())),
    };
    let change = catalog_change(
        &old,
        &new,
        vec![modified_table(
            &old_table,
            &new_table,
            vec![list(
                "triggers",
                vec![trigger(&new_table.triggers[1]), trigger(&new_table.triggers[0])],
            )],
        )],
    );

    let statements = common::alter_statements(&old, &new, &change, DbTraits::default());
    assert_eq!(statements.len(), 2);
    assert!(statements[0].starts_with("USE `mydb`$$\nCREATE TRIGGER `mydb`.`table1_bi_a`"));
    assert!(statements[1].contains("FOR EACH ROW FOLLOWS `table1_bi_a`\n"));
}

#[test]
fn test_trigger_order_needs_5_7() {
    let catalog = mydb(vec![audit_triggers(table1())]);
    let change = Change::ValueAdded {
        value: Value::Schema(Box::new(catalog.schemata[0].clone())),
    };
    let traits = DbTraits::for_server_version(ServerVersion::new(5, 6, 40));
    let store = generate_sql(None, Some(&catalog), &change, &GeneratorOptions::default(), &traits)
        .unwrap();
    let second = store.get("trigger::`MYDB`.`TABLE1_BI_B`").unwrap();
    assert!(!second.statements()[0].contains("FOLLOWS"));
}
