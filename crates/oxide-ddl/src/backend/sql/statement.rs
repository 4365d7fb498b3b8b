//! Buffers for statements assembled from several emission calls.

use std::mem;

/// A `CREATE TABLE` statement under construction.
#[derive(Debug, Default)]
pub(super) struct CreateTable {
    head: String,
    items: Vec<String>,
    options: String,
    partitioning: String,
    /// `CREATE INDEX` statements committed after the table, with index names.
    pub indexes: Vec<(String, String)>,
}

impl CreateTable {
    pub fn new(head: String) -> Self {
        Self {
            head,
            ..Self::default()
        }
    }

    /// Adds a column, index or constraint line to the body.
    pub fn item(&mut self, sql: String) {
        self.items.push(sql);
    }

    pub fn option(&mut self, sql: &str) {
        self.options.push('\n');
        self.options.push_str(sql);
    }

    pub fn partitioning(&mut self, sql: &str) {
        self.partitioning = format!("\n{}", sql.trim());
    }

    pub fn sql(&self) -> String {
        let body = self
            .items
            .iter()
            .map(|item| format!("  {item}"))
            .collect::<Vec<_>>()
            .join(",\n");
        format!("{}{}){}{}", self.head, body, self.options, self.partitioning)
    }
}

/// An `ALTER TABLE` statement under construction, plus the statements that
/// must run after it.
#[derive(Debug, Default)]
pub(super) struct AlterTable {
    header: String,
    /// Name of the table once the main statement ran.
    current: String,
    body: String,
    has_changes: bool,
    fk_drops: Vec<String>,
    fk_adds: Vec<String>,
    pub partitioning: Option<String>,
    pub partition_drops: Vec<String>,
    pub partition_statements: Vec<String>,
    pub index_statements: Vec<String>,
    committed: Vec<String>,
}

impl AlterTable {
    /// `target` addresses the table before the change, `current` after it.
    pub fn new(target: &str, current: &str) -> Self {
        Self {
            header: format!("ALTER TABLE {target} \n"),
            current: current.to_string(),
            ..Self::default()
        }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    /// Appends a table option, comma separated.
    pub fn option(&mut self, sql: &str) {
        if self.has_changes {
            self.body.push_str(", ");
        }
        self.body.push_str(sql);
        self.has_changes = true;
    }

    /// Appends a column, index or constraint clause on its own line.
    pub fn clause(&mut self, sql: &str) {
        if self.has_changes {
            self.body.push_str(",\n");
        }
        self.body.push_str(sql);
        self.has_changes = true;
    }

    pub fn drop_fk(&mut self, sql: String) {
        self.fk_drops.push(sql);
    }

    pub fn add_fk(&mut self, sql: String) {
        self.fk_adds.push(sql);
    }

    /// Flushes pending constraint clauses.
    ///
    /// MySQL rejects dropping and re-adding a constraint of the same name in
    /// one statement, so when both are present the drops close the current
    /// statement and the additions start a new one.
    pub fn fks_end(&mut self) {
        let drops = mem::take(&mut self.fk_drops);
        let adds = mem::take(&mut self.fk_adds);
        if !drops.is_empty() && !adds.is_empty() {
            for sql in &drops {
                self.clause(sql);
            }
            self.committed
                .push(format!("{}{}", self.header, mem::take(&mut self.body)));
            self.has_changes = false;
            self.header = format!("ALTER TABLE {} \n", self.current);
            for sql in &adds {
                self.clause(sql);
            }
        } else {
            for sql in drops.iter().chain(adds.iter()) {
                self.clause(sql);
            }
        }
    }

    /// All statements in execution order.
    pub fn finish(self, algorithm: &str, lock: &str) -> Vec<String> {
        let mut statements = self.committed;
        if self.has_changes || self.partitioning.is_some() {
            let mut sql = format!("{}{}", self.header, self.body);
            if self.has_changes {
                if !algorithm.is_empty() {
                    sql.push_str(&format!(", ALGORITHM = {algorithm}"));
                }
                if !lock.is_empty() {
                    sql.push_str(&format!(", LOCK = {lock}"));
                }
            }
            if let Some(partitioning) = &self.partitioning {
                sql.push_str(partitioning);
            }
            statements.push(sql);
        }
        let trailing = format!("ALTER TABLE {} \n", self.current);
        if !self.partition_drops.is_empty() {
            statements.push(format!(
                "{trailing} DROP PARTITION {}",
                self.partition_drops.join(", ")
            ));
        }
        statements.extend(
            self.partition_statements
                .iter()
                .map(|sql| format!("{trailing}{sql}")),
        );
        statements.extend(self.index_statements);
        statements
    }
}

/// An `ALTER SCHEMA` statement under construction.
#[derive(Debug)]
pub(super) struct AlterSchema {
    pub name: String,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_table_layout() {
        let mut create = CreateTable::new("CREATE TABLE `t` (\n".to_string());
        create.item("`id` INT NOT NULL".into());
        create.item("PRIMARY KEY (`id`)".into());
        create.option("ENGINE = InnoDB");
        assert_eq!(
            create.sql(),
            "CREATE TABLE `t` (\n  `id` INT NOT NULL,\n  PRIMARY KEY (`id`))\nENGINE = InnoDB"
        );
    }

    #[test]
    fn test_unchanged_alter_yields_nothing() {
        let alter = AlterTable::new("`t`", "`t`");
        assert!(alter.finish("INPLACE", "NONE").is_empty());
    }

    #[test]
    fn test_alter_options_and_clauses() {
        let mut alter = AlterTable::new("`s`.`t`", "`s`.`t`");
        alter.option("ENGINE = MyISAM ");
        alter.clause("DROP COLUMN `a`");
        assert_eq!(
            alter.finish("INPLACE", ""),
            vec!["ALTER TABLE `s`.`t` \nENGINE = MyISAM ,\nDROP COLUMN `a`, ALGORITHM = INPLACE"]
        );
    }

    #[test]
    fn test_fk_drop_and_add_split() {
        let mut alter = AlterTable::new("`s`.`old`", "`s`.`new`");
        alter.option("RENAME TO `s`.`new` ");
        alter.drop_fk("DROP FOREIGN KEY `fk`".into());
        alter.add_fk("ADD CONSTRAINT `fk` ...".into());
        alter.fks_end();
        let statements = alter.finish("", "");
        assert_eq!(
            statements,
            vec![
                "ALTER TABLE `s`.`old` \nRENAME TO `s`.`new` ,\nDROP FOREIGN KEY `fk`",
                "ALTER TABLE `s`.`new` \nADD CONSTRAINT `fk` ...",
            ]
        );
    }

    #[test]
    fn test_trailing_statements_follow_main() {
        let mut alter = AlterTable::new("`t`", "`t`");
        alter.partition_drops.push("p0".into());
        alter.partition_drops.push("p1".into());
        alter.index_statements.push("ALTER TABLE `t` ALTER INDEX `i` INVISIBLE".into());
        assert_eq!(
            alter.finish("", ""),
            vec![
                "ALTER TABLE `t` \n DROP PARTITION p0, p1",
                "ALTER TABLE `t` ALTER INDEX `i` INVISIBLE",
            ]
        );
    }
}
