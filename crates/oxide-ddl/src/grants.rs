//! `GRANT` statements for a user's role graph.
//!
//! Roles are expanded parent first so inherited privileges precede a role's
//! own. All distinct privileges on one target are merged into a single
//! statement. The wildcard target `**.*` stands for "every schema of the
//! catalog" and expands into one statement per schema.

use std::collections::HashSet;

use tracing::debug;

use crate::dialect::{quote, quote_user};
use crate::model::{Catalog, ObjectKind, RolePrivilege, User};

/// Wildcard object name expanding to every schema.
const ALL_SCHEMATA: &str = "**.*";

/// Builds the ordered `GRANT` statements for a user (without terminators).
///
/// Privileges on objects that cannot be resolved in `catalog` are skipped.
#[must_use]
pub fn generate_grants(catalog: &Catalog, user: &User) -> Vec<String> {
    let mut grants: Vec<(String, Vec<String>)> = Vec::new();
    let mut visited = HashSet::new();
    for role in &user.roles {
        collect_role(catalog, role, &mut visited, &mut grants);
    }
    let grantee = quote_user(&user.name);
    grants
        .into_iter()
        .filter(|(_, privileges)| !privileges.is_empty())
        .map(|(target, privileges)| {
            format!("GRANT {} ON {} TO {}", privileges.join(", "), target, grantee)
        })
        .collect()
}

fn collect_role<'c>(
    catalog: &'c Catalog,
    name: &'c str,
    visited: &mut HashSet<&'c str>,
    grants: &mut Vec<(String, Vec<String>)>,
) {
    if !visited.insert(name) {
        return;
    }
    let Some(role) = catalog.find_role(name) else {
        debug!(role = name, "skipping unknown role");
        return;
    };
    if let Some(parent) = &role.parent_role {
        collect_role(catalog, parent, visited, grants);
    }
    for privilege in &role.privileges {
        for target in privilege_targets(catalog, privilege) {
            let index = match grants.iter().position(|(t, _)| *t == target) {
                Some(index) => index,
                None => {
                    grants.push((target, Vec::new()));
                    grants.len() - 1
                }
            };
            let merged = &mut grants[index].1;
            for p in &privilege.privileges {
                if !merged.contains(p) {
                    merged.push(p.clone());
                }
            }
        }
    }
}

fn privilege_targets(catalog: &Catalog, privilege: &RolePrivilege) -> Vec<String> {
    if let Some(object) = &privilege.object {
        let schema = catalog.find_schema(&object.schema, false);
        let target = match object.kind {
            ObjectKind::Table => schema
                .and_then(|s| s.find_table(&object.name, false))
                .map(|t| format!("TABLE {}.{}", quote(&object.schema), quote(&t.name))),
            ObjectKind::View => schema
                .and_then(|s| s.find_view(&object.name, false))
                .map(|v| format!("TABLE {}.{}", quote(&object.schema), quote(&v.name))),
            ObjectKind::Routine => schema
                .and_then(|s| s.find_routine(&object.name, false))
                .map(|r| {
                    format!(
                        "{} {}.{}",
                        r.routine_type.to_ascii_uppercase(),
                        quote(&object.schema),
                        quote(&r.name)
                    )
                }),
            ObjectKind::Schema => catalog
                .find_schema(&object.name, false)
                .map(|s| format!("{}.*", quote(&s.name))),
            ObjectKind::Index | ObjectKind::Trigger | ObjectKind::User => None,
        };
        if target.is_none() {
            debug!(object = %object.name, "skipping privilege on unresolved object");
        }
        return target.into_iter().collect();
    }

    match privilege.object_name.as_str() {
        "" => Vec::new(),
        ALL_SCHEMATA => catalog
            .schemata
            .iter()
            .filter(|s| !s.model_only)
            .map(|s| format!("{}.*", quote(&s.name)))
            .collect(),
        name if privilege.object_type.is_empty() || name == "*.*" => vec![name.to_string()],
        name => vec![format!("{} {}", privilege.object_type, name)],
    }
}
