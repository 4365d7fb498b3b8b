//! Catalog level objects: schemata, views, routines, users and roles.

use serde::{Deserialize, Serialize};

use super::{old_or_current, Table};

/// Root of the schema object graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    /// Schemata in model order.
    pub schemata: Vec<Schema>,
    /// Users, each referencing roles by name.
    pub users: Vec<User>,
    /// Roles, each optionally inheriting from a parent role.
    pub roles: Vec<Role>,
    /// Optional document properties written into script headers.
    pub document: Option<DocumentInfo>,
    /// Hand written scripts spliced into exported scripts.
    pub scripts: Vec<AttachedScript>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a schema.
    #[must_use]
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schemata.push(schema);
        self
    }

    /// Adds a user.
    #[must_use]
    pub fn user(mut self, user: User) -> Self {
        self.users.push(user);
        self
    }

    /// Adds a role.
    #[must_use]
    pub fn role(mut self, role: Role) -> Self {
        self.roles.push(role);
        self
    }

    /// Finds a schema by name.
    #[must_use]
    pub fn find_schema(&self, name: &str, case_sensitive: bool) -> Option<&Schema> {
        self.schemata
            .iter()
            .find(|s| names_equal(&s.name, name, case_sensitive))
    }

    /// Finds a table by schema and table name.
    #[must_use]
    pub fn find_table(&self, schema: &str, table: &str, case_sensitive: bool) -> Option<&Table> {
        self.find_schema(schema, case_sensitive)
            .and_then(|s| s.find_table(table, case_sensitive))
    }

    /// Finds a role by name.
    #[must_use]
    pub fn find_role(&self, name: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.name == name)
    }

    /// Returns the attached scripts for one position, in model order.
    pub fn scripts_at(&self, position: ScriptPosition) -> impl Iterator<Item = &AttachedScript> {
        self.scripts.iter().filter(move |s| s.position == position)
    }
}

/// A database schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schema {
    pub name: String,
    pub old_name: String,
    pub id: String,
    /// Exists in the model only and is never materialized.
    pub model_only: bool,
    pub comment: String,
    pub default_character_set_name: String,
    pub default_collation_name: String,
    pub tables: Vec<Table>,
    pub views: Vec<View>,
    pub routines: Vec<Routine>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a table.
    #[must_use]
    pub fn table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }

    /// Adds a view.
    #[must_use]
    pub fn view(mut self, view: View) -> Self {
        self.views.push(view);
        self
    }

    /// Adds a routine.
    #[must_use]
    pub fn routine(mut self, routine: Routine) -> Self {
        self.routines.push(routine);
        self
    }

    /// Sets the default character set and collation.
    #[must_use]
    pub fn charset(mut self, charset: &str, collation: &str) -> Self {
        self.default_character_set_name = charset.to_string();
        self.default_collation_name = collation.to_string();
        self
    }

    /// Finds a table by name.
    #[must_use]
    pub fn find_table(&self, name: &str, case_sensitive: bool) -> Option<&Table> {
        self.tables
            .iter()
            .find(|t| names_equal(&t.name, name, case_sensitive))
    }

    /// Finds a view by name.
    #[must_use]
    pub fn find_view(&self, name: &str, case_sensitive: bool) -> Option<&View> {
        self.views
            .iter()
            .find(|v| names_equal(&v.name, name, case_sensitive))
    }

    /// Finds a routine by name.
    #[must_use]
    pub fn find_routine(&self, name: &str, case_sensitive: bool) -> Option<&Routine> {
        self.routines
            .iter()
            .find(|r| names_equal(&r.name, name, case_sensitive))
    }

    /// The name this schema had before the change.
    #[must_use]
    pub fn previous_name(&self) -> &str {
        old_or_current(&self.old_name, &self.name)
    }
}

/// A view with its captured definition text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct View {
    pub name: String,
    pub old_name: String,
    pub id: String,
    pub model_only: bool,
    /// Full `CREATE VIEW` statement.
    pub sql_definition: String,
    /// Projected column names, as reported by the statement decomposer.
    pub columns: Vec<String>,
}

impl View {
    /// Creates a view from its definition.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_definition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_definition: sql_definition.into(),
            ..Self::default()
        }
    }

    /// Sets the projected column names.
    #[must_use]
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(ToString::to_string).collect();
        self
    }
}

/// A stored procedure or function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Routine {
    pub name: String,
    pub old_name: String,
    pub id: String,
    pub model_only: bool,
    /// `PROCEDURE` or `FUNCTION`.
    pub routine_type: String,
    /// Full `CREATE PROCEDURE`/`CREATE FUNCTION` statement.
    pub sql_definition: String,
}

impl Routine {
    /// Creates a routine.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        routine_type: impl Into<String>,
        sql_definition: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            routine_type: routine_type.into(),
            sql_definition: sql_definition.into(),
            ..Self::default()
        }
    }
}

/// A database account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    /// Account name, optionally with a `@host` suffix.
    pub name: String,
    pub old_name: String,
    pub id: String,
    pub model_only: bool,
    pub password: String,
    /// Names of the roles granted to this user.
    pub roles: Vec<String>,
}

impl User {
    /// Creates a user without roles.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Grants a role by name.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Sets the password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }
}

/// A named set of privileges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Role {
    pub name: String,
    /// Role whose privileges are inherited and granted first.
    pub parent_role: Option<String>,
    pub privileges: Vec<RolePrivilege>,
}

impl Role {
    /// Creates a role without privileges.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the parent role.
    #[must_use]
    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_role = Some(parent.into());
        self
    }

    /// Adds a privilege entry.
    #[must_use]
    pub fn privilege(mut self, privilege: RolePrivilege) -> Self {
        self.privileges.push(privilege);
        self
    }
}

/// Privileges a role holds on one object.
///
/// The object is either referenced structurally or named by free text
/// (`object_type` plus `object_name`, e.g. `*.*`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RolePrivilege {
    pub object: Option<ObjectRef>,
    pub object_type: String,
    pub object_name: String,
    pub privileges: Vec<String>,
}

impl RolePrivilege {
    /// Privileges on a referenced object.
    #[must_use]
    pub fn on_object(object: ObjectRef, privileges: &[&str]) -> Self {
        Self {
            object: Some(object),
            privileges: privileges.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }

    /// Privileges on a free text target.
    #[must_use]
    pub fn on_name(object_type: &str, object_name: &str, privileges: &[&str]) -> Self {
        Self {
            object: None,
            object_type: object_type.to_string(),
            object_name: object_name.to_string(),
            privileges: privileges.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Kind of a schema object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Schema,
    #[default]
    Table,
    Index,
    Trigger,
    View,
    Routine,
    User,
}

impl ObjectKind {
    /// Lowercase name used in fragment keys and reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Table => "table",
            Self::Index => "index",
            Self::Trigger => "trigger",
            Self::View => "view",
            Self::Routine => "routine",
            Self::User => "user",
        }
    }
}

/// Reference to an object by kind, schema and name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectRef {
    pub kind: ObjectKind,
    /// Owning schema; empty means the schema of the referencing object.
    pub schema: String,
    pub name: String,
}

impl ObjectRef {
    /// Reference to a table.
    #[must_use]
    pub fn table(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: ObjectKind::Table,
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Reference to an arbitrary object kind.
    #[must_use]
    pub fn new(kind: ObjectKind, schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            schema: schema.into(),
            name: name.into(),
        }
    }
}

/// Descriptive properties of the modelled document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentInfo {
    pub title: String,
    pub version: String,
    pub project: String,
    pub author: String,
    pub description: String,
}

/// Where an attached script is spliced into an export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptPosition {
    TopFile,
    #[default]
    BeforeDdl,
    AfterDdl,
    BeforeInserts,
    AfterInserts,
    BottomFile,
}

/// A hand written script attached to the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachedScript {
    pub name: String,
    pub position: ScriptPosition,
    pub text: String,
}

fn names_equal(a: &str, b: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        a == b
    } else {
        a.eq_ignore_ascii_case(b)
    }
}
