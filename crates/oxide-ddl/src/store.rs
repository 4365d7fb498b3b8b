//! Caller-owned container accumulating generated statements.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{DdlError, Result};
use crate::identity::ObjectIdentity;

/// Statements stored for one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Fragment {
    Single(String),
    Many(Vec<String>),
}

impl Fragment {
    /// All statements in order.
    #[must_use]
    pub fn statements(&self) -> Vec<&str> {
        match self {
            Self::Single(s) => vec![s.as_str()],
            Self::Many(list) => list.iter().map(String::as_str).collect(),
        }
    }
}

/// Ordered statements with the object each one belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentList {
    pub statements: Vec<String>,
    pub objects: Vec<ObjectIdentity>,
}

impl FragmentList {
    /// Iterates `(object, statement)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&ObjectIdentity, &str)> {
        self.objects
            .iter()
            .zip(self.statements.iter().map(String::as_str))
    }
}

/// Either an ordered list or a keyed map of statements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentStore {
    List(FragmentList),
    Map(BTreeMap<String, Fragment>),
}

impl FragmentStore {
    /// An empty ordered list store.
    #[must_use]
    pub fn list() -> Self {
        Self::List(FragmentList::default())
    }

    /// An empty keyed map store.
    #[must_use]
    pub fn map() -> Self {
        Self::Map(BTreeMap::new())
    }

    /// Commits a fresh statement for an object.
    ///
    /// In a map this replaces any earlier entry. With `front` the statement
    /// is placed before everything already in a list.
    pub fn remember(&mut self, object: ObjectIdentity, key: String, sql: String, front: bool) {
        match self {
            Self::List(list) => {
                if front {
                    list.statements.insert(0, sql);
                    list.objects.insert(0, object);
                } else {
                    list.statements.push(sql);
                    list.objects.push(object);
                }
            }
            Self::Map(map) => {
                map.insert(key, Fragment::Single(sql));
            }
        }
    }

    /// Appends a statement to an object's entry, turning a single entry into
    /// a list when needed.
    pub fn remember_alter(&mut self, object: ObjectIdentity, key: String, sql: String) {
        match self {
            Self::List(list) => {
                list.statements.push(sql);
                list.objects.push(object);
            }
            Self::Map(map) => match map.remove(&key) {
                None => {
                    map.insert(key, Fragment::Single(sql));
                }
                Some(Fragment::Single(first)) => {
                    map.insert(key, Fragment::Many(vec![first, sql]));
                }
                Some(Fragment::Many(mut list)) => {
                    list.push(sql);
                    map.insert(key, Fragment::Many(list));
                }
            },
        }
    }

    /// Returns true if anything was stored for the object.
    #[must_use]
    pub fn contains(&self, object: &ObjectIdentity, key: &str) -> bool {
        match self {
            Self::List(list) => list.objects.contains(object),
            Self::Map(map) => map.contains_key(key),
        }
    }

    /// Looks up a map entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Fragment> {
        match self {
            Self::List(_) => None,
            Self::Map(map) => map.get(key),
        }
    }

    /// Looks up a map entry that must hold exactly one statement.
    ///
    /// # Errors
    ///
    /// Returns [`DdlError::FragmentShape`] if the entry holds a list.
    pub fn get_single(&self, key: &str) -> Result<Option<&str>> {
        match self.get(key) {
            None => Ok(None),
            Some(Fragment::Single(s)) => Ok(Some(s)),
            Some(Fragment::Many(_)) => Err(DdlError::FragmentShape {
                key: key.to_string(),
                expected: "single statement",
            }),
        }
    }

    /// Looks up a map entry that must hold a statement list.
    ///
    /// # Errors
    ///
    /// Returns [`DdlError::FragmentShape`] if the entry holds one statement.
    pub fn get_many(&self, key: &str) -> Result<Option<&[String]>> {
        match self.get(key) {
            None => Ok(None),
            Some(Fragment::Many(list)) => Ok(Some(list)),
            Some(Fragment::Single(_)) => Err(DdlError::FragmentShape {
                key: key.to_string(),
                expected: "statement list",
            }),
        }
    }

    /// The ordered list, if this is a list store.
    #[must_use]
    pub const fn as_list(&self) -> Option<&FragmentList> {
        match self {
            Self::List(list) => Some(list),
            Self::Map(_) => None,
        }
    }

    /// All statements, in list order or key order.
    #[must_use]
    pub fn statements(&self) -> Vec<&str> {
        match self {
            Self::List(list) => list.statements.iter().map(String::as_str).collect(),
            Self::Map(map) => map.values().flat_map(Fragment::statements).collect(),
        }
    }

    /// Returns true if nothing was stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::List(list) => list.statements.is_empty(),
            Self::Map(map) => map.is_empty(),
        }
    }
}
