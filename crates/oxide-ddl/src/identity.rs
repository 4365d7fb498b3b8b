//! Object identity and allow-list filtering.
//!
//! Fragments are keyed by `kind::qualified-name`, for example
//! ``table::`mydb`.`users` ``. When identifiers are compared case
//! insensitively, the qualified part is uppercased so that keys produced by
//! the backend and looked up by the composer always agree.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::dialect::quote;
use crate::model::ObjectKind;

/// Builds a backtick-quoted qualified name from its parts.
#[must_use]
pub fn qualified_name(parts: &[&str], case_sensitive: bool) -> String {
    let name = parts
        .iter()
        .filter(|p| !p.is_empty())
        .map(|p| quote(p))
        .collect::<Vec<_>>()
        .join(".");
    if case_sensitive {
        name
    } else {
        name.to_uppercase()
    }
}

/// Identity of an object owning a fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectIdentity {
    pub kind: ObjectKind,
    pub schema: String,
    /// Owning table, for indexes.
    pub table: Option<String>,
    pub name: String,
    /// Opaque object id, used as key when requested.
    pub id: String,
}

impl ObjectIdentity {
    /// Identity of a schema.
    #[must_use]
    pub fn schema(name: &str) -> Self {
        Self {
            kind: ObjectKind::Schema,
            schema: name.to_string(),
            ..Self::default()
        }
    }

    /// Identity of a schema-scoped object (table, view, routine, trigger).
    #[must_use]
    pub fn object(kind: ObjectKind, schema: &str, name: &str) -> Self {
        Self {
            kind,
            schema: schema.to_string(),
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Identity of an index of a table.
    #[must_use]
    pub fn index(schema: &str, table: &str, name: &str) -> Self {
        Self {
            kind: ObjectKind::Index,
            schema: schema.to_string(),
            table: Some(table.to_string()),
            name: name.to_string(),
            id: String::new(),
        }
    }

    /// Identity of a user account.
    #[must_use]
    pub fn user(name: &str) -> Self {
        Self {
            kind: ObjectKind::User,
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Attaches an object id.
    #[must_use]
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    /// Qualified, quoted name of the object.
    #[must_use]
    pub fn qualified(&self, case_sensitive: bool) -> String {
        match self.kind {
            ObjectKind::Schema => qualified_name(&[&self.schema], case_sensitive),
            ObjectKind::User => qualified_name(&[&self.name], case_sensitive),
            _ => {
                let table = self.table.as_deref().unwrap_or_default();
                qualified_name(&[&self.schema, table, &self.name], case_sensitive)
            }
        }
    }

    /// Key under which this object's fragments are stored.
    ///
    /// With `use_oid` the object id is used when present.
    #[must_use]
    pub fn key(&self, use_oid: bool, case_sensitive: bool) -> String {
        if use_oid && !self.id.is_empty() {
            return self.id.clone();
        }
        format!("{}::{}", self.kind.as_str(), self.qualified(case_sensitive))
    }
}

/// Optional allow-lists, one per object kind.
///
/// A kind without a list accepts every object. Entries are qualified names
/// such as `` `mydb`.`users` `` (or `` `mydb` `` for schemas and `` `alice` ``
/// for users).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectFilters {
    pub schemata: Option<HashSet<String>>,
    pub tables: Option<HashSet<String>>,
    pub views: Option<HashSet<String>>,
    pub routines: Option<HashSet<String>>,
    pub triggers: Option<HashSet<String>>,
    pub users: Option<HashSet<String>>,
}

impl ObjectFilters {
    /// Creates filters accepting everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts tables to the given qualified names.
    #[must_use]
    pub fn tables<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Restricts schemata to the given quoted names.
    #[must_use]
    pub fn schemata<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schemata = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Restricts triggers to the given qualified names.
    #[must_use]
    pub fn triggers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.triggers = Some(names.into_iter().map(Into::into).collect());
        self
    }

    fn list(&self, kind: ObjectKind) -> Option<&HashSet<String>> {
        match kind {
            ObjectKind::Schema => self.schemata.as_ref(),
            ObjectKind::Table | ObjectKind::Index => self.tables.as_ref(),
            ObjectKind::View => self.views.as_ref(),
            ObjectKind::Routine => self.routines.as_ref(),
            ObjectKind::Trigger => self.triggers.as_ref(),
            ObjectKind::User => self.users.as_ref(),
        }
    }

    /// Returns true if the object passes the allow-list for its kind.
    ///
    /// `identity` should carry the object's pre-change names.
    #[must_use]
    pub fn allows(&self, identity: &ObjectIdentity, case_sensitive: bool) -> bool {
        let Some(list) = self.list(identity.kind) else {
            return true;
        };
        let key = identity.qualified(case_sensitive);
        if case_sensitive {
            list.contains(&key)
        } else {
            list.iter().any(|entry| entry.to_uppercase() == key)
        }
    }
}
