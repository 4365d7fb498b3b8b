//! Synchronization script assembled from an ordered fragment list.

use tracing::debug;

use super::script::ScriptWriter;
use crate::identity::ObjectIdentity;
use crate::model::{Catalog, ObjectKind, ScriptPosition};
use crate::options::ComposerOptions;
use crate::store::FragmentList;

/// Turns the ordered output of an alter walk into a runnable script.
///
/// Plain statements keep their order. View placeholders, views, routines
/// and triggers are collected and appended in that order, triggers inside
/// a single `DELIMITER` block.
pub struct SyncComposer<'a> {
    writer: ScriptWriter<'a>,
}

impl<'a> SyncComposer<'a> {
    pub fn new(options: &'a ComposerOptions, delimiter: &'a str) -> Self {
        Self {
            writer: ScriptWriter::new(options, delimiter),
        }
    }

    fn view_columns(&self, catalog: Option<&Catalog>, object: &ObjectIdentity) -> Vec<String> {
        let case_sensitive = self.writer.options.case_sensitive;
        catalog
            .and_then(|c| c.find_schema(&object.schema, case_sensitive))
            .and_then(|s| s.find_view(&object.name, case_sensitive))
            .map(|v| v.columns.clone())
            .unwrap_or_default()
    }

    /// Builds the script; `catalog` is the target model, used for view
    /// columns, document properties and attached scripts.
    pub fn compose(mut self, catalog: Option<&Catalog>, fragments: &FragmentList) -> String {
        let delimiter = self.writer.delimiter;
        let mut out = self.writer.header("MySQL Synchronization", catalog);
        out.push_str(&self.writer.attached_scripts(catalog, ScriptPosition::TopFile));
        out.push_str(&self.writer.set_server_vars());
        out.push_str(&self.writer.attached_scripts(catalog, ScriptPosition::BeforeDdl));

        let mut placeholders = String::new();
        let mut views = Vec::new();
        let mut routines = String::new();
        let mut triggers = String::new();
        for (object, sql) in fragments.iter() {
            match object.kind {
                ObjectKind::Trigger => {
                    triggers.push_str(&format!("{sql}{delimiter}\n\n"));
                }
                ObjectKind::Routine => routines.push_str(sql),
                ObjectKind::View if !is_view_drop(sql) => {
                    if !self.writer.options.no_view_placeholders {
                        let columns = self.view_columns(catalog, object);
                        placeholders.push_str(&self.writer.view_placeholder(
                            &object.schema,
                            &object.name,
                            &columns,
                        ));
                    }
                    views.push((object, sql));
                }
                _ => {
                    out.push_str(sql);
                    if sql.trim_end().ends_with(';') {
                        out.push('\n');
                    } else {
                        out.push_str(";\n\n");
                    }
                    out.push_str(self.writer.warnings());
                }
            }
        }
        debug!(
            views = views.len(),
            statements = fragments.statements.len(),
            "composed synchronization body"
        );

        out.push_str(&placeholders);
        for (object, sql) in views {
            out.push_str(&self.writer.view_ddl(&object.schema, &object.name, sql, None));
        }
        out.push_str(&routines);
        if !triggers.is_empty() {
            out.push_str(&format!(
                "\nDELIMITER {delimiter}\n\n{triggers}\nDELIMITER ;\n\n"
            ));
        }
        out.push_str(&self.writer.attached_scripts(catalog, ScriptPosition::AfterDdl));
        out.push_str(self.writer.restore_server_vars());
        out.push_str(&self.writer.attached_scripts(catalog, ScriptPosition::BottomFile));
        out
    }
}

fn is_view_drop(sql: &str) -> bool {
    sql.trim_start()
        .get(..9)
        .is_some_and(|head| head.eq_ignore_ascii_case("DROP VIEW"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(entries: &[(ObjectIdentity, &str)]) -> FragmentList {
        FragmentList {
            statements: entries.iter().map(|(_, s)| (*s).to_string()).collect(),
            objects: entries.iter().map(|(o, _)| o.clone()).collect(),
        }
    }

    #[test]
    fn test_statements_keep_order_and_get_terminated() {
        let options = ComposerOptions::default();
        let fragments = list(&[
            (
                ObjectIdentity::object(ObjectKind::Table, "shop", "a"),
                "ALTER TABLE `shop`.`a` DROP COLUMN `x`",
            ),
            (
                ObjectIdentity::object(ObjectKind::Table, "shop", "b"),
                "DROP TABLE IF EXISTS `shop`.`b` ",
            ),
        ]);
        let script = SyncComposer::new(&options, "$$").compose(None, &fragments);
        let first = script.find("ALTER TABLE `shop`.`a` DROP COLUMN `x`;\n\n").unwrap();
        let second = script.find("DROP TABLE IF EXISTS `shop`.`b` ;\n\n").unwrap();
        assert!(first < second);
        assert!(script.starts_with("-- MySQL Synchronization\n"));
        assert!(script.ends_with("SET UNIQUE_CHECKS=@OLD_UNIQUE_CHECKS;\n"));
    }

    #[test]
    fn test_triggers_are_wrapped_in_one_delimiter_block() {
        let options = ComposerOptions::default();
        let fragments = list(&[
            (
                ObjectIdentity::object(ObjectKind::Trigger, "shop", "t1"),
                "USE `shop`$$\nCREATE TRIGGER t1 BEFORE INSERT ON `a` FOR EACH ROW SET @x = 1",
            ),
            (
                ObjectIdentity::object(ObjectKind::Table, "shop", "a"),
                "ALTER TABLE `shop`.`a` ENGINE = InnoDB ",
            ),
        ]);
        let script = SyncComposer::new(&options, "$$").compose(None, &fragments);
        let table = script.find("ALTER TABLE").unwrap();
        let block = script.find("\nDELIMITER $$\n\nUSE `shop`$$\nCREATE TRIGGER t1").unwrap();
        assert!(table < block);
        assert!(script.contains("SET @x = 1$$\n\n\nDELIMITER ;\n"));
    }

    #[test]
    fn test_views_get_placeholders_from_target_columns() {
        let options = ComposerOptions::default();
        let catalog = Catalog::new().schema(
            crate::model::Schema::new("shop")
                .view(crate::model::View::new("v", "SELECT 1").columns(&["a", "b"])),
        );
        let fragments = list(&[
            (
                ObjectIdentity::object(ObjectKind::View, "shop", "old_v"),
                "DROP VIEW IF EXISTS `shop`.`old_v` ",
            ),
            (
                ObjectIdentity::object(ObjectKind::View, "shop", "v"),
                "USE `shop`;\nCREATE OR REPLACE VIEW `shop`.`v` AS SELECT 1 AS a, 2 AS b",
            ),
        ]);
        let script = SyncComposer::new(&options, "$$").compose(Some(&catalog), &fragments);
        assert!(script.contains("DROP VIEW IF EXISTS `shop`.`old_v` ;\n\n"));
        let placeholder = script
            .find("CREATE TABLE IF NOT EXISTS `shop`.`v` (`a` INT, `b` INT);")
            .unwrap();
        let view = script.find("DROP TABLE IF EXISTS `shop`.`v`;\nUSE `shop`;").unwrap();
        assert!(placeholder < view);
        assert!(script.contains("AS SELECT 1 AS a, 2 AS b;\n"));
    }

    #[test]
    fn test_user_fragment_terminated_once() {
        let options = ComposerOptions::default();
        let fragments = list(&[(
            ObjectIdentity::user("app"),
            "CREATE USER 'app';\n\nGRANT SELECT ON `shop`.* TO 'app';\n",
        )]);
        let script = SyncComposer::new(&options, "$$").compose(None, &fragments);
        assert!(script.contains("TO 'app';\n\n"));
        assert!(!script.contains(";\n;"));
    }
}
