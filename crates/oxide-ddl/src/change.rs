//! The change tree describing the difference between two model versions.
//!
//! A change tree is produced by an external diff engine and consumed here as
//! a closed sum type. Each node kind determines which accessors are valid;
//! calling an accessor on the wrong kind returns
//! [`DdlError::UnexpectedChange`], which callers propagate as a fatal
//! contract violation.
//!
//! Attribute names match the snake_case field names of the [`crate::model`]
//! types (`columns`, `indices`, `foreign_keys`, `table_engine`, ...).

use serde::{Deserialize, Serialize};

use crate::error::{DdlError, Result};
use crate::model::{
    Catalog, Column, ForeignKey, Index, PartitionDefinition, Role, Routine, Schema, Table,
    Trigger, User, View,
};

/// A node of the change tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Change {
    /// A whole object was added.
    ValueAdded { value: Value },
    /// A whole object was removed.
    ValueRemoved { value: Value },
    /// Some attributes of an object changed.
    ObjectModified { attributes: Vec<AttributeChange> },
    /// Items of a list attribute changed.
    ListModified { items: Vec<ListItemChange> },
    /// A scalar attribute changed.
    SimpleValue { old: Value, new: Value },
}

/// A change to one named attribute of an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeChange {
    pub name: String,
    pub change: Change,
}

impl AttributeChange {
    /// Creates an attribute change.
    #[must_use]
    pub fn new(name: impl Into<String>, change: Change) -> Self {
        Self {
            name: name.into(),
            change,
        }
    }
}

/// A change to one item of a list attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ListItemChange {
    Added {
        value: Value,
    },
    Removed {
        value: Value,
    },
    /// The item stayed in place but its content changed.
    Modified {
        old: Value,
        new: Value,
        #[serde(default)]
        change: Option<Box<Change>>,
    },
    /// The item moved; `change` is set when its content changed as well.
    OrderChanged {
        old: Value,
        new: Value,
        #[serde(default)]
        change: Option<Box<Change>>,
    },
}

impl ListItemChange {
    /// Returns true for a position-only move carrying no content change.
    #[must_use]
    pub const fn is_reorder_only(&self) -> bool {
        matches!(self, Self::OrderChanged { change: None, .. })
    }

    /// Returns `(old, new, nested change)` for items present on both sides.
    ///
    /// Position-only moves yield `None`.
    #[must_use]
    pub fn modification(&self) -> Option<(&Value, &Value, Option<&Change>)> {
        match self {
            Self::Modified { old, new, change } => Some((old, new, change.as_deref())),
            Self::OrderChanged {
                old,
                new,
                change: Some(change),
            } => Some((old, new, Some(change.as_ref()))),
            _ => None,
        }
    }
}

/// A value carried by a change node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "object", rename_all = "snake_case")]
pub enum Value {
    Catalog(Box<Catalog>),
    Schema(Box<Schema>),
    Table(Box<Table>),
    Column(Box<Column>),
    Index(Box<Index>),
    ForeignKey(Box<ForeignKey>),
    Trigger(Box<Trigger>),
    View(Box<View>),
    Routine(Box<Routine>),
    User(Box<User>),
    Role(Box<Role>),
    PartitionDefinition(Box<PartitionDefinition>),
    Text(String),
    Integer(i64),
    Null,
}

macro_rules! value_accessor {
    ($fn_name:ident, $variant:ident, $ty:ty) => {
        #[doc = concat!("Returns the ", stringify!($variant), " carried by this value.")]
        ///
        /// # Errors
        ///
        /// Returns [`DdlError::UnexpectedValue`] for any other kind.
        pub fn $fn_name(&self) -> Result<&$ty> {
            match self {
                Self::$variant(inner) => Ok(inner),
                other => Err(DdlError::UnexpectedValue {
                    expected: stringify!($variant),
                    found: other.kind_name(),
                }),
            }
        }
    };
}

impl Value {
    value_accessor!(as_catalog, Catalog, Catalog);
    value_accessor!(as_schema, Schema, Schema);
    value_accessor!(as_table, Table, Table);
    value_accessor!(as_column, Column, Column);
    value_accessor!(as_index, Index, Index);
    value_accessor!(as_foreign_key, ForeignKey, ForeignKey);
    value_accessor!(as_trigger, Trigger, Trigger);
    value_accessor!(as_view, View, View);
    value_accessor!(as_routine, Routine, Routine);
    value_accessor!(as_user, User, User);
    value_accessor!(as_partition, PartitionDefinition, PartitionDefinition);

    /// Name of the variant, for error messages.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Catalog(_) => "Catalog",
            Self::Schema(_) => "Schema",
            Self::Table(_) => "Table",
            Self::Column(_) => "Column",
            Self::Index(_) => "Index",
            Self::ForeignKey(_) => "ForeignKey",
            Self::Trigger(_) => "Trigger",
            Self::View(_) => "View",
            Self::Routine(_) => "Routine",
            Self::User(_) => "User",
            Self::Role(_) => "Role",
            Self::PartitionDefinition(_) => "PartitionDefinition",
            Self::Text(_) => "Text",
            Self::Integer(_) => "Integer",
            Self::Null => "Null",
        }
    }
}

impl Change {
    /// Name of the variant, for error messages.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::ValueAdded { .. } => "ValueAdded",
            Self::ValueRemoved { .. } => "ValueRemoved",
            Self::ObjectModified { .. } => "ObjectModified",
            Self::ListModified { .. } => "ListModified",
            Self::SimpleValue { .. } => "SimpleValue",
        }
    }

    fn unexpected<T>(&self, expected: &'static str) -> Result<T> {
        Err(DdlError::UnexpectedChange {
            expected,
            found: self.kind_name(),
        })
    }

    /// Value of a `ValueAdded` node.
    ///
    /// # Errors
    ///
    /// Fails on any other node kind.
    pub fn added_value(&self) -> Result<&Value> {
        match self {
            Self::ValueAdded { value } => Ok(value),
            _ => self.unexpected("ValueAdded"),
        }
    }

    /// Value of a `ValueRemoved` node.
    ///
    /// # Errors
    ///
    /// Fails on any other node kind.
    pub fn removed_value(&self) -> Result<&Value> {
        match self {
            Self::ValueRemoved { value } => Ok(value),
            _ => self.unexpected("ValueRemoved"),
        }
    }

    /// Attribute changes of an `ObjectModified` node.
    ///
    /// # Errors
    ///
    /// Fails on any other node kind.
    pub fn attributes(&self) -> Result<&[AttributeChange]> {
        match self {
            Self::ObjectModified { attributes } => Ok(attributes),
            _ => self.unexpected("ObjectModified"),
        }
    }

    /// Item changes of a `ListModified` node.
    ///
    /// # Errors
    ///
    /// Fails on any other node kind.
    pub fn items(&self) -> Result<&[ListItemChange]> {
        match self {
            Self::ListModified { items } => Ok(items),
            _ => self.unexpected("ListModified"),
        }
    }

    /// Old and new values of a `SimpleValue` node.
    ///
    /// # Errors
    ///
    /// Fails on any other node kind.
    pub fn simple_values(&self) -> Result<(&Value, &Value)> {
        match self {
            Self::SimpleValue { old, new } => Ok((old, new)),
            _ => self.unexpected("SimpleValue"),
        }
    }

    /// Finds the nested change for a named attribute of an `ObjectModified`.
    ///
    /// # Errors
    ///
    /// Fails if this node is not an `ObjectModified`.
    pub fn attribute(&self, name: &str) -> Result<Option<&Self>> {
        Ok(self
            .attributes()?
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.change))
    }

    /// Convenience constructor for an `ObjectModified` node.
    #[must_use]
    pub fn modified(attributes: Vec<AttributeChange>) -> Self {
        Self::ObjectModified { attributes }
    }

    /// Convenience constructor for a `ListModified` node.
    #[must_use]
    pub fn list(items: Vec<ListItemChange>) -> Self {
        Self::ListModified { items }
    }

    /// Convenience constructor for a text `SimpleValue` node.
    #[must_use]
    pub fn text(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self::SimpleValue {
            old: Value::Text(old.into()),
            new: Value::Text(new.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_accessor_is_contract_violation() {
        let change = Change::text("InnoDB", "MyISAM");
        let err = change.items().unwrap_err();
        assert!(matches!(
            err,
            DdlError::UnexpectedChange {
                expected: "ListModified",
                found: "SimpleValue"
            }
        ));
        assert!(change.simple_values().is_ok());
    }

    #[test]
    fn test_wrong_value_kind() {
        let value = Value::Column(Box::new(Column::new("id", "INT")));
        assert!(value.as_column().is_ok());
        let err = value.as_table().unwrap_err();
        assert!(matches!(
            err,
            DdlError::UnexpectedValue {
                expected: "Table",
                found: "Column"
            }
        ));
    }

    #[test]
    fn test_reorder_only_detection() {
        let col = || Value::Column(Box::new(Column::new("a", "INT")));
        let reorder = ListItemChange::OrderChanged {
            old: col(),
            new: col(),
            change: None,
        };
        assert!(reorder.is_reorder_only());
        assert!(reorder.modification().is_none());

        let moved_and_changed = ListItemChange::OrderChanged {
            old: col(),
            new: col(),
            change: Some(Box::new(Change::modified(vec![]))),
        };
        assert!(!moved_and_changed.is_reorder_only());
        assert!(moved_and_changed.modification().is_some());
    }

    #[test]
    fn test_change_tree_from_json() {
        let json = r#"{
            "type": "object_modified",
            "attributes": [
                {"name": "table_engine", "change": {
                    "type": "simple_value",
                    "old": {"kind": "text", "object": "MyISAM"},
                    "new": {"kind": "text", "object": "InnoDB"}
                }},
                {"name": "columns", "change": {
                    "type": "list_modified",
                    "items": [
                        {"type": "removed", "value": {"kind": "column", "object": {"name": "email"}}}
                    ]
                }}
            ]
        }"#;
        let change: Change = serde_json::from_str(json).unwrap();
        let columns = change.attribute("columns").unwrap().unwrap();
        assert_eq!(columns.items().unwrap().len(), 1);
        assert!(change.attribute("comment").unwrap().is_none());
    }
}
