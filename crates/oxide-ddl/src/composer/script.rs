//! Pieces shared by the export and synchronization scripts.

use std::collections::{HashMap, HashSet};

use chrono::Local;

use crate::dialect::{escape_sql_string, quote, quote_string};
use crate::model::{Catalog, ScriptPosition};
use crate::options::ComposerOptions;

/// Identifiers longer than this cannot name a placeholder column.
const MAX_IDENTIFIER_LENGTH: usize = 64;

const BANNER_RULE: &str = "-- -----------------------------------------------------";

/// A three line comment banner around `title`.
pub fn banner(title: &str) -> String {
    format!("{BANNER_RULE}\n-- {title}\n{BANNER_RULE}\n")
}

/// Renders a data value as a SQL literal.
pub fn sql_literal(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "NULL".to_string(),
        serde_json::Value::Bool(b) => String::from(if *b { "1" } else { "0" }),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => quote_string(s),
        other => format!("'{}'", escape_sql_string(&other.to_string())),
    }
}

/// Shared script state: options and placeholder column aliases.
pub struct ScriptWriter<'a> {
    pub options: &'a ComposerOptions,
    pub delimiter: &'a str,
    /// Long view column names replaced in placeholders, keyed by view.
    aliases: HashMap<String, Vec<(String, String)>>,
}

impl<'a> ScriptWriter<'a> {
    pub fn new(options: &'a ComposerOptions, delimiter: &'a str) -> Self {
        Self {
            options,
            delimiter,
            aliases: HashMap::new(),
        }
    }

    /// `SHOW WARNINGS;` when requested.
    pub fn warnings(&self) -> &'static str {
        if self.options.generate_warnings {
            "SHOW WARNINGS;\n"
        } else {
            ""
        }
    }

    /// Display name of an object, honoring `omit_schemas`.
    pub fn name(&self, schema: &str, object: &str) -> String {
        if self.options.omit_schemas {
            quote(object)
        } else {
            format!("{}.{}", quote(schema), quote(object))
        }
    }

    /// `USE` line for a schema unless schemas are omitted without `USE`.
    pub fn use_schema(&self, schema: &str, terminator: &str) -> String {
        if self.options.omit_schemas && !self.options.generate_use {
            String::new()
        } else {
            format!("USE {}{terminator}\n", quote(schema))
        }
    }

    /// Script title followed by the document properties.
    pub fn header(&self, title: &str, catalog: Option<&Catalog>) -> String {
        let mut out = format!("-- {title}\n");
        let document = catalog.and_then(|c| c.document.as_ref());
        if let Some(doc) = document.filter(|_| self.options.include_document_properties) {
            out.push_str(&format!(
                "-- Generated: {}\n",
                Local::now().format("%a %b %e %H:%M:%S %Y")
            ));
            for (label, value) in [
                ("Model", &doc.title),
                ("Version", &doc.version),
                ("Project", &doc.project),
                ("Author", &doc.author),
            ] {
                if !value.is_empty() {
                    out.push_str(&format!("-- {label}: {value}\n"));
                }
            }
            if !doc.description.is_empty() {
                out.push_str(&format!("-- {}\n", doc.description.replace('\n', "\n-- ")));
            }
        }
        out.push('\n');
        out
    }

    /// Attached scripts placed at `position`, each wrapped in markers.
    pub fn attached_scripts(&self, catalog: Option<&Catalog>, position: ScriptPosition) -> String {
        let Some(catalog) = catalog.filter(|_| self.options.include_attached_scripts) else {
            return String::new();
        };
        catalog
            .scripts_at(position)
            .map(|script| {
                format!(
                    "-- begin attached script '{name}'\n{}\n-- end attached script '{name}'\n",
                    script.text,
                    name = script.name
                )
            })
            .collect()
    }

    /// Saves and relaxes the session checks for the script.
    pub fn set_server_vars(&self) -> String {
        format!(
            "SET @OLD_UNIQUE_CHECKS=@@UNIQUE_CHECKS, UNIQUE_CHECKS=0;\n\
             SET @OLD_FOREIGN_KEY_CHECKS=@@FOREIGN_KEY_CHECKS, FOREIGN_KEY_CHECKS=0;\n\
             SET @OLD_SQL_MODE=@@SQL_MODE, SQL_MODE='{}';\n\n",
            self.options.sql_mode
        )
    }

    pub fn restore_server_vars(&self) -> &'static str {
        "\nSET SQL_MODE=@OLD_SQL_MODE;\n\
         SET FOREIGN_KEY_CHECKS=@OLD_FOREIGN_KEY_CHECKS;\n\
         SET UNIQUE_CHECKS=@OLD_UNIQUE_CHECKS;\n"
    }

    /// A user statement run with an empty `SQL_MODE`.
    pub fn relaxed_mode(&self, sql: &str) -> String {
        format!(
            "SET SQL_MODE = '';\n{sql};\nSET SQL_MODE='{}';\n{}",
            self.options.sql_mode,
            self.warnings()
        )
    }

    /// A throwaway table with the view's columns, so that objects created
    /// before the view can already reference it.
    ///
    /// Column names too long for a table get `Col_placeholder` aliases,
    /// which [`Self::view_ddl`] later applies to the view definition.
    /// Repeated names are listed once.
    pub fn view_placeholder(&mut self, schema: &str, view: &str, columns: &[String]) -> String {
        let name = self.name(schema, view);
        let mut aliases = Vec::new();
        let mut defs = Vec::new();
        let mut used = HashSet::new();
        for column in columns {
            // Column names are case insensitive; a repeat would break the table.
            if !used.insert(column.to_lowercase()) {
                continue;
            }
            if column.chars().count() > MAX_IDENTIFIER_LENGTH {
                let alias = if aliases.is_empty() {
                    "Col_placeholder".to_string()
                } else {
                    format!("Col_placeholder{}", aliases.len())
                };
                defs.push(format!("{} INT", quote(&alias)));
                aliases.push((alias, column.clone()));
            } else {
                defs.push(format!("{} INT", quote(column)));
            }
        }
        if defs.is_empty() {
            defs.push("`id` INT".to_string());
        }
        if !aliases.is_empty() {
            self.aliases.insert(name.clone(), aliases);
        }
        format!(
            "\n{}CREATE TABLE IF NOT EXISTS {name} ({});\n{}",
            banner(&format!("Placeholder table for view {name}")),
            defs.join(", "),
            self.warnings()
        )
    }

    /// The view section: placeholder removal, optional drop and the create.
    pub fn view_ddl(&self, schema: &str, view: &str, create: &str, drop: Option<&str>) -> String {
        let name = self.name(schema, view);
        let mut out = format!("\n{}", banner(&format!("View {name}")));
        if !self.options.no_view_placeholders {
            out.push_str(&format!("DROP TABLE IF EXISTS {name};\n{}", self.warnings()));
        }
        if let Some(drop) = drop.filter(|d| !d.is_empty()) {
            out.push_str(&format!("{drop};\n{}", self.warnings()));
        }
        let create = match self.aliases.get(&name) {
            Some(aliases) => apply_aliases(create, aliases),
            None => create.to_string(),
        };
        out.push_str(&create);
        if !create.trim_end().ends_with(';') {
            out.push(';');
        }
        out.push('\n');
        out.push_str(self.warnings());
        out
    }
}

/// Adds `AS alias` after each long column name, scanning forward.
fn apply_aliases(sql: &str, aliases: &[(String, String)]) -> String {
    let mut sql = sql.to_string();
    let mut from = 0;
    for (alias, original) in aliases {
        let quoted = quote(original);
        let found = sql[from..]
            .find(&quoted)
            .map(|pos| from + pos + quoted.len())
            .or_else(|| sql[from..].find(original.as_str()).map(|pos| from + pos + original.len()));
        if let Some(end) = found {
            let clause = format!(" AS {}", quote(alias));
            sql.insert_str(end, &clause);
            from = end + clause.len();
        }
    }
    sql
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttachedScript, DocumentInfo};

    #[test]
    fn test_sql_literal() {
        assert_eq!(sql_literal(&serde_json::json!(null)), "NULL");
        assert_eq!(sql_literal(&serde_json::json!(42)), "42");
        assert_eq!(sql_literal(&serde_json::json!(true)), "1");
        assert_eq!(sql_literal(&serde_json::json!("O'Brien")), "'O\\'Brien'");
    }

    #[test]
    fn test_placeholder_aliases_long_columns() {
        let options = ComposerOptions::default();
        let mut writer = ScriptWriter::new(&options, "$$");
        let long = "c".repeat(70);
        let sql = writer.view_placeholder("shop", "v", &["id".to_string(), long.clone()]);
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS `shop`.`v` (`id` INT, `Col_placeholder` INT);"));

        let create = format!("CREATE OR REPLACE VIEW `shop`.`v` AS SELECT id, `{long}` FROM t");
        let ddl = writer.view_ddl("shop", "v", &create, None);
        assert!(ddl.contains(&format!("`{long}` AS `Col_placeholder` FROM t;")));
        assert!(ddl.contains("DROP TABLE IF EXISTS `shop`.`v`;"));
    }

    #[test]
    fn test_placeholder_lists_repeated_columns_once() {
        let options = ComposerOptions::default();
        let mut writer = ScriptWriter::new(&options, "$$");
        let columns = ["a", "b", "a", "B"].map(String::from);
        let sql = writer.view_placeholder("shop", "v", &columns);
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS `shop`.`v` (`a` INT, `b` INT);"));
    }

    #[test]
    fn test_placeholder_without_columns() {
        let options = ComposerOptions::default();
        let mut writer = ScriptWriter::new(&options, "$$");
        assert!(writer.view_placeholder("shop", "v", &[]).contains("(`id` INT);"));
    }

    #[test]
    fn test_header_with_document_properties() {
        let options = ComposerOptions::default();
        let writer = ScriptWriter::new(&options, "$$");
        let mut catalog = Catalog::new();
        catalog.document = Some(DocumentInfo {
            title: "Shop".into(),
            author: "Ops".into(),
            description: "line one\nline two".into(),
            ..DocumentInfo::default()
        });
        let header = writer.header("MySQL Forward Engineering", Some(&catalog));
        assert!(header.starts_with("-- MySQL Forward Engineering\n-- Generated: "));
        assert!(header.contains("-- Model: Shop\n-- Author: Ops\n"));
        assert!(header.contains("-- line one\n-- line two\n"));
        assert!(!header.contains("-- Version:"));
    }

    #[test]
    fn test_attached_scripts_need_opt_in() {
        let mut catalog = Catalog::new();
        catalog.scripts.push(AttachedScript {
            name: "seed".into(),
            position: ScriptPosition::BottomFile,
            text: "SELECT 1;".into(),
        });
        let mut options = ComposerOptions::default();
        assert!(ScriptWriter::new(&options, "$$")
            .attached_scripts(Some(&catalog), ScriptPosition::BottomFile)
            .is_empty());
        options.include_attached_scripts = true;
        assert_eq!(
            ScriptWriter::new(&options, "$$")
                .attached_scripts(Some(&catalog), ScriptPosition::BottomFile),
            "-- begin attached script 'seed'\nSELECT 1;\n-- end attached script 'seed'\n"
        );
    }
}
