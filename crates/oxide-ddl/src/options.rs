//! Generator configuration and target server capabilities.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::identity::ObjectFilters;

/// A MySQL server version used to gate DDL forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub revision: u32,
}

impl ServerVersion {
    /// First version with the long comment limits.
    pub const LONG_COMMENTS: Self = Self::new(5, 5, 3);
    /// First version supporting `DROP USER IF EXISTS`.
    pub const DROP_USER_IF_EXISTS: Self = Self::new(5, 7, 0);
    /// First version accepting `FOLLOWS`/`PRECEDES` on triggers.
    pub const TRIGGER_ORDER: Self = Self::new(5, 7, 0);
    /// First version supporting invisible indexes and `RENAME INDEX` in place.
    pub const INVISIBLE_INDEXES: Self = Self::new(8, 0, 0);

    /// Creates a version triple.
    #[must_use]
    pub const fn new(major: u32, minor: u32, revision: u32) -> Self {
        Self {
            major,
            minor,
            revision,
        }
    }

    /// Returns true if this version is the same as or newer than `other`.
    #[must_use]
    pub fn at_least(&self, other: Self) -> bool {
        *self >= other
    }
}

impl Default for ServerVersion {
    fn default() -> Self {
        Self::new(8, 0, 5)
    }
}

impl PartialOrd for ServerVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ServerVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.revision).cmp(&(other.major, other.minor, other.revision))
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.revision)
    }
}

/// Error returned when a version string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid server version: {0}")]
pub struct ParseVersionError(String);

impl FromStr for ServerVersion {
    type Err = ParseVersionError;

    /// Parses `8`, `8.0` or `8.0.5`. Missing parts default to zero and a
    /// trailing suffix such as `-log` is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let numeric = s.trim().split(['-', ' ']).next().unwrap_or_default();
        let mut parts = [0u32; 3];
        let mut count = 0;
        for (slot, piece) in parts.iter_mut().zip(numeric.split('.')) {
            *slot = piece
                .parse()
                .map_err(|_| ParseVersionError(s.to_string()))?;
            count += 1;
        }
        if count == 0 || numeric.split('.').count() > 3 {
            return Err(ParseVersionError(s.to_string()));
        }
        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}

/// Capability traits of the target server.
///
/// Built once per invocation and passed to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbTraits {
    pub version: ServerVersion,
    pub max_table_comment_length: usize,
    pub max_column_comment_length: usize,
    pub max_index_comment_length: usize,
    /// Value for `ALGORITHM =` on table alters, empty to omit.
    pub alter_algorithm: String,
    /// Value for `LOCK =` on table alters, empty to omit.
    pub alter_lock: String,
    pub sql_delimiter: String,
    /// Emit `IF NOT EXISTS` on table creation.
    pub put_if_exists: bool,
}

impl Default for DbTraits {
    fn default() -> Self {
        Self::for_server_version(ServerVersion::default())
    }
}

impl DbTraits {
    /// Traits for a given server version.
    #[must_use]
    pub fn for_server_version(version: ServerVersion) -> Self {
        let (table, column, index) = if version.at_least(ServerVersion::LONG_COMMENTS) {
            (2048, 1024, 1024)
        } else {
            (60, 0, 255)
        };
        Self {
            version,
            max_table_comment_length: table,
            max_column_comment_length: column,
            max_index_comment_length: index,
            alter_algorithm: String::new(),
            alter_lock: String::new(),
            sql_delimiter: "$$".to_string(),
            put_if_exists: true,
        }
    }

    /// Sets the table alter algorithm.
    #[must_use]
    pub fn with_alter_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.alter_algorithm = algorithm.into();
        self
    }

    /// Sets the table alter lock option.
    #[must_use]
    pub fn with_alter_lock(mut self, lock: impl Into<String>) -> Self {
        self.alter_lock = lock.into();
        self
    }
}

/// Flags controlling the diff walker and DDL backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct GeneratorOptions {
    /// Compare and key identifiers case sensitively.
    pub case_sensitive: bool,
    /// Apply the allow-lists in `filters`.
    pub use_filtered_lists: bool,
    /// Never emit foreign keys.
    pub skip_foreign_keys: bool,
    /// Never emit indexes that back foreign keys.
    pub skip_fk_indexes: bool,
    /// Emit foreign key changes in a second pass after all other table changes.
    pub separate_foreign_keys: bool,
    /// Emit secondary indexes as standalone `CREATE INDEX` fragments.
    pub generate_create_index: bool,
    /// Leave identifiers unqualified by schema.
    pub omit_schemas: bool,
    /// Emit `USE` statements even when schemas are omitted.
    pub generate_use: bool,
    /// Key map fragments by object id instead of qualified name.
    pub use_oid_as_key: bool,
    /// Per-kind allow-lists.
    pub filters: ObjectFilters,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            use_filtered_lists: true,
            skip_foreign_keys: false,
            skip_fk_indexes: false,
            separate_foreign_keys: true,
            generate_create_index: false,
            omit_schemas: false,
            generate_use: false,
            use_oid_as_key: false,
            filters: ObjectFilters::default(),
        }
    }
}

impl GeneratorOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Leave identifiers unqualified.
    #[must_use]
    pub const fn with_omit_schemas(mut self, omit: bool) -> Self {
        self.omit_schemas = omit;
        self
    }

    /// Emit standalone `CREATE INDEX` fragments.
    #[must_use]
    pub const fn with_create_index(mut self, enabled: bool) -> Self {
        self.generate_create_index = enabled;
        self
    }

    /// Toggle case sensitive comparisons.
    #[must_use]
    pub const fn with_case_sensitive(mut self, enabled: bool) -> Self {
        self.case_sensitive = enabled;
        self
    }

    /// Toggle the separate foreign key pass.
    #[must_use]
    pub const fn with_separate_foreign_keys(mut self, enabled: bool) -> Self {
        self.separate_foreign_keys = enabled;
        self
    }

    /// Skip all foreign keys.
    #[must_use]
    pub const fn with_skip_foreign_keys(mut self, enabled: bool) -> Self {
        self.skip_foreign_keys = enabled;
        self
    }

    /// Install allow-lists.
    #[must_use]
    pub fn with_filters(mut self, filters: ObjectFilters) -> Self {
        self.filters = filters;
        self
    }
}

/// Default SQL mode pinned by generated scripts.
pub const DEFAULT_SQL_MODE: &str = "ONLY_FULL_GROUP_BY,STRICT_TRANS_TABLES,NO_ZERO_IN_DATE,NO_ZERO_DATE,ERROR_FOR_DIVISION_BY_ZERO,NO_ENGINE_SUBSTITUTION";

/// Flags controlling how fragments are assembled into a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct ComposerOptions {
    pub generate_drops: bool,
    pub generate_schema_drops: bool,
    /// Emit only `GRANT` statements instead of creating users.
    pub no_users_just_privileges: bool,
    pub no_view_placeholders: bool,
    pub generate_inserts: bool,
    /// Keep foreign key checks disabled until the data load finished.
    pub no_fk_for_inserts: bool,
    pub triggers_after_inserts: bool,
    pub sort_tables_alphabetically: bool,
    /// Emit `SHOW WARNINGS;` after each statement.
    pub generate_warnings: bool,
    pub omit_schemas: bool,
    pub generate_use: bool,
    pub generate_create_index: bool,
    pub case_sensitive: bool,
    pub include_document_properties: bool,
    pub include_attached_scripts: bool,
    pub sql_mode: String,
}

impl Default for ComposerOptions {
    fn default() -> Self {
        Self {
            generate_drops: false,
            generate_schema_drops: false,
            no_users_just_privileges: false,
            no_view_placeholders: false,
            generate_inserts: false,
            no_fk_for_inserts: false,
            triggers_after_inserts: false,
            sort_tables_alphabetically: false,
            generate_warnings: false,
            omit_schemas: false,
            generate_use: false,
            generate_create_index: false,
            case_sensitive: false,
            include_document_properties: true,
            include_attached_scripts: false,
            sql_mode: DEFAULT_SQL_MODE.to_string(),
        }
    }
}

impl ComposerOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit drops before creates.
    #[must_use]
    pub const fn with_drops(mut self, enabled: bool) -> Self {
        self.generate_drops = enabled;
        self
    }

    /// Emit data load statements.
    #[must_use]
    pub const fn with_inserts(mut self, enabled: bool) -> Self {
        self.generate_inserts = enabled;
        self
    }

    /// Sort tables by name instead of by foreign key dependency.
    #[must_use]
    pub const fn with_alphabetical_sort(mut self, enabled: bool) -> Self {
        self.sort_tables_alphabetically = enabled;
        self
    }

    /// Leave identifiers unqualified.
    #[must_use]
    pub const fn with_omit_schemas(mut self, omit: bool) -> Self {
        self.omit_schemas = omit;
        self
    }

    /// Walker options consistent with these composer options.
    #[must_use]
    pub fn generator_options(&self) -> GeneratorOptions {
        GeneratorOptions {
            case_sensitive: self.case_sensitive,
            omit_schemas: self.omit_schemas,
            generate_use: self.generate_use,
            generate_create_index: self.generate_create_index,
            use_oid_as_key: false,
            ..GeneratorOptions::default()
        }
    }
}
