//! Integration tests for the export and synchronization scripts.

mod common;

use common::{
    alter_statements_with, catalog_change, column, list, modified_table, mydb, offset, table,
    table1,
};
use oxide_ddl::prelude::*;

fn fk(name: &str, column: &str, target: &str) -> ForeignKey {
    ForeignKey::new(name, &[column], ObjectRef::table("mydb", target), &["id"])
}

fn keyed(name: &str) -> Table {
    Table::new(name)
        .column(Column::new("id", "INT").not_null())
        .index(Index::primary(&["id"]))
}

// =============================================================================
// Export
// =============================================================================

#[test]
fn test_export_places_referenced_tables_first() {
    let catalog = mydb(vec![
        keyed("invoice_lines")
            .column(Column::new("invoice_id", "INT"))
            .foreign_key(fk("fk_line_invoice", "invoice_id", "invoices")),
        keyed("employees")
            .column(Column::new("manager_id", "INT"))
            .foreign_key(fk("fk_manager", "manager_id", "employees")),
        keyed("invoices")
            .column(Column::new("customer_id", "INT"))
            .foreign_key(fk("fk_invoice_customer", "customer_id", "customers")),
        keyed("customers"),
    ]);

    let script = make_export_script(
        &catalog,
        None,
        None,
        &ComposerOptions::default(),
        &DbTraits::default(),
    )
    .unwrap();

    let customers = offset(&script, "-- Table `mydb`.`customers`");
    let invoices = offset(&script, "-- Table `mydb`.`invoices`");
    let lines = offset(&script, "-- Table `mydb`.`invoice_lines`");
    let employees = offset(&script, "-- Table `mydb`.`employees`");
    assert!(customers < invoices);
    assert!(invoices < lines);
    assert!(lines < employees);
    assert_eq!(script.matches("-- Table `mydb`.`employees`").count(), 1);
}

#[test]
fn test_export_session_variables_wrap_the_script() {
    let catalog = mydb(vec![table1()]);
    let script = make_export_script(
        &catalog,
        None,
        None,
        &ComposerOptions::default(),
        &DbTraits::default(),
    )
    .unwrap();

    let set = offset(&script, "SET @OLD_FOREIGN_KEY_CHECKS=@@FOREIGN_KEY_CHECKS, FOREIGN_KEY_CHECKS=0;");
    let schema = offset(&script, "CREATE SCHEMA IF NOT EXISTS `mydb` ;\n");
    let using = offset(&script, "USE `mydb` ;\n");
    let create = offset(&script, "CREATE TABLE IF NOT EXISTS `mydb`.`table1` (");
    let restore = offset(&script, "SET FOREIGN_KEY_CHECKS=@OLD_FOREIGN_KEY_CHECKS;");
    assert!(set < schema && schema < using && using < create && create < restore);
}

#[test]
fn test_export_triggers_after_inserts() {
    let mut users = table1().trigger(Trigger::new(
        "table1_bi",
        "BEFORE",
        "INSERT",
        "SET NEW.name = TRIM(NEW.name)",
    ));
    users.inserts = Some(TableData {
        columns: vec!["idtable1".into(), "name".into()],
        rows: vec![vec![serde_json::json!(1), serde_json::json!(null)]],
    });
    let catalog = mydb(vec![users]);
    let mut options = ComposerOptions::default().with_inserts(true);
    options.triggers_after_inserts = true;
    options.no_fk_for_inserts = true;

    let script = make_export_script(&catalog, None, None, &options, &DbTraits::default()).unwrap();
    let insert = offset(&script, "INSERT INTO `mydb`.`table1` (`idtable1`, `name`) VALUES (1, NULL);");
    let trigger = offset(&script, "CREATE TRIGGER `mydb`.`table1_bi`");
    let restore = offset(&script, "SET SQL_MODE=@OLD_SQL_MODE;");
    assert!(insert < trigger);
    assert!(trigger < restore);
}

#[test]
fn test_export_privileges_only() {
    let mut catalog = mydb(vec![table1()]);
    catalog.roles.push(
        Role::new("reader").privilege(RolePrivilege::on_object(
            ObjectRef::table("mydb", "table1"),
            &["SELECT"],
        )),
    );
    catalog.users.push(User::new("app").with_role("reader"));
    let mut options = ComposerOptions::default();
    options.no_users_just_privileges = true;

    let script = make_export_script(&catalog, None, None, &options, &DbTraits::default()).unwrap();
    assert!(script.contains("GRANT SELECT ON TABLE `mydb`.`table1` TO 'app';\n"));
    assert!(!script.contains("CREATE USER"));
}

// =============================================================================
// Synchronization
// =============================================================================

#[test]
fn test_sync_script_for_table_changes() {
    let old_table = table1();
    let mut new_table = table1();
    new_table.columns.pop();
    let added = keyed("audit_log");
    let old = mydb(vec![old_table.clone()]);
    let new = mydb(vec![new_table.clone(), added.clone()]);
    let change = catalog_change(
        &old,
        &new,
        vec![
            modified_table(
                &old_table,
                &new_table,
                vec![list(
                    "columns",
                    vec![ListItemChange::Removed {
                        value: column(&old_table.columns[2]),
                    }],
                )],
            ),
            ListItemChange::Added {
                value: table(&added),
            },
        ],
    );

    let script = make_alter_script(
        &old,
        &new,
        &change,
        &ComposerOptions::default(),
        &DbTraits::default(),
    )
    .unwrap();
    let alter = offset(&script, "ALTER TABLE `mydb`.`table1` \nDROP COLUMN `email`;\n\n");
    let create = offset(&script, "CREATE TABLE IF NOT EXISTS `mydb`.`audit_log` (");
    let restore = offset(&script, "SET UNIQUE_CHECKS=@OLD_UNIQUE_CHECKS;");
    assert!(alter < create && create < restore);

    let report = generate_report(Some(&old), Some(&new), &change, &GeneratorOptions::default())
        .unwrap();
    assert!(report.contains("Column `email` was dropped"));
    assert!(report.contains("Table `mydb`.`audit_log` was created"));
}

#[test]
fn test_sync_script_ignores_allow_lists() {
    let old_table = table1();
    let mut new_table = table1();
    new_table.columns.pop();
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
                vec![ListItemChange::Removed {
                    value: column(&old_table.columns[2]),
                }],
            )],
        )],
    );
    let filtered = GeneratorOptions::default()
        .with_filters(ObjectFilters::new().tables(["`mydb`.`other`"]));
    assert!(alter_statements_with(&old, &new, &change, DbTraits::default(), filtered).is_empty());

    let script = make_alter_script(
        &old,
        &new,
        &change,
        &ComposerOptions::default(),
        &DbTraits::default(),
    )
    .unwrap();
    assert!(script.contains("ALTER TABLE `mydb`.`table1` \nDROP COLUMN `email`;\n"));
}
