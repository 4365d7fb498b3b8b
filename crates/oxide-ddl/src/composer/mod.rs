//! Script composition.
//!
//! The functions here run the diff walker over a backend and lay the
//! resulting fragments out as complete scripts:
//!
//! - [`generate_sql`] walks a change into a keyed fragment map.
//! - [`make_export_script`] forward-engineers a whole catalog.
//! - [`make_alter_script`] turns a catalog change into a synchronization
//!   script.
//! - [`generate_report`] describes a change in prose.

mod export;
mod script;
mod sort;
mod sync;

pub use export::ExportComposer;
pub use sort::{sort_alphabetically, sort_by_foreign_keys};
pub use sync::SyncComposer;

use tracing::info;

use crate::backend::{ReportGenerator, SqlGenerator};
use crate::change::{Change, Value};
use crate::error::Result;
use crate::identity::ObjectIdentity;
use crate::model::Catalog;
use crate::options::{ComposerOptions, DbTraits, GeneratorOptions};
use crate::store::FragmentStore;
use crate::walker::DiffSqlGenerator;

fn walk(
    store: &mut FragmentStore,
    source: Option<&Catalog>,
    target: Option<&Catalog>,
    change: &Change,
    options: &GeneratorOptions,
    traits: &DbTraits,
) -> Result<()> {
    let mut backend = SqlGenerator::new(store, traits.clone(), options.clone());
    DiffSqlGenerator::new(&mut backend, options.clone()).process_diff_change(change, source, target)
}

/// Walks a change into a map keyed by object identity.
///
/// # Errors
///
/// Fails on contract violations in the change tree.
pub fn generate_sql(
    source: Option<&Catalog>,
    target: Option<&Catalog>,
    change: &Change,
    options: &GeneratorOptions,
    traits: &DbTraits,
) -> Result<FragmentStore> {
    let mut store = FragmentStore::map();
    walk(&mut store, source, target, change, options, traits)?;
    Ok(store)
}

/// Builds a forward engineering script for `catalog`.
///
/// The create fragments come from `create_change`, or from the whole
/// catalog being added. Drop fragments come from `drop_change`, or from
/// the whole catalog being removed when drops are enabled.
///
/// # Errors
///
/// Fails on contract violations in either change tree.
pub fn make_export_script(
    catalog: &Catalog,
    create_change: Option<&Change>,
    drop_change: Option<&Change>,
    options: &ComposerOptions,
    traits: &DbTraits,
) -> Result<String> {
    let generator = options.generator_options();
    let create = match create_change {
        Some(change) => generate_sql(None, Some(catalog), change, &generator, traits)?,
        None => {
            let added = Change::ValueAdded {
                value: Value::Catalog(Box::new(catalog.clone())),
            };
            generate_sql(None, Some(catalog), &added, &generator, traits)?
        }
    };
    let drop = match drop_change {
        Some(change) => generate_sql(Some(catalog), None, change, &generator, traits)?,
        None if options.generate_drops => {
            let removed = Change::ValueRemoved {
                value: Value::Catalog(Box::new(catalog.clone())),
            };
            generate_sql(Some(catalog), None, &removed, &generator, traits)?
        }
        None => FragmentStore::map(),
    };
    info!(schemata = catalog.schemata.len(), "composing export script");
    ExportComposer::new(options, &traits.sql_delimiter, &create, &drop).compose(catalog)
}

/// Builds a synchronization script taking `source` to `target`.
///
/// Allow-lists are not applied; every change in the tree is scripted.
///
/// # Errors
///
/// Fails on contract violations in the change tree.
pub fn make_alter_script(
    source: &Catalog,
    target: &Catalog,
    change: &Change,
    options: &ComposerOptions,
    traits: &DbTraits,
) -> Result<String> {
    let mut generator = options.generator_options();
    generator.use_filtered_lists = false;
    let mut store = FragmentStore::list();
    walk(&mut store, Some(source), Some(target), change, &generator, traits)?;
    let fragments = store.as_list().cloned().unwrap_or_default();
    info!(statements = fragments.statements.len(), "composing synchronization script");
    Ok(SyncComposer::new(options, &traits.sql_delimiter).compose(Some(target), &fragments))
}

fn same_object(a: &ObjectIdentity, b: &ObjectIdentity, case_sensitive: bool) -> bool {
    a.kind == b.kind && a.qualified(case_sensitive) == b.qualified(case_sensitive)
}

/// Statements a catalog change produces for one object, in order.
///
/// # Errors
///
/// Fails on contract violations in the change tree.
pub fn alter_script_for_object(
    source: &Catalog,
    target: &Catalog,
    change: &Change,
    object: &ObjectIdentity,
    options: &GeneratorOptions,
    traits: &DbTraits,
) -> Result<Vec<String>> {
    let mut store = FragmentStore::list();
    walk(&mut store, Some(source), Some(target), change, options, traits)?;
    Ok(store
        .as_list()
        .map(|list| {
            list.iter()
                .filter(|(owner, _)| same_object(owner, object, options.case_sensitive))
                .map(|(_, sql)| sql.to_string())
                .collect()
        })
        .unwrap_or_default())
}

/// The create statements of one object of `catalog`.
///
/// Returns an empty list when the object does not exist, is model-only or
/// is filtered out.
///
/// # Errors
///
/// Fails on contract violations while walking the catalog.
pub fn create_script_for_object(
    catalog: &Catalog,
    object: &ObjectIdentity,
    options: &GeneratorOptions,
    traits: &DbTraits,
) -> Result<Vec<String>> {
    let added = Change::ValueAdded {
        value: Value::Catalog(Box::new(catalog.clone())),
    };
    let store = generate_sql(None, Some(catalog), &added, options, traits)?;
    let key = object.key(options.use_oid_as_key, options.case_sensitive);
    Ok(store
        .get(&key)
        .map(|fragment| fragment.statements().into_iter().map(str::to_string).collect())
        .unwrap_or_default())
}

/// Describes a change in prose.
///
/// # Errors
///
/// Fails on contract violations in the change tree.
pub fn generate_report(
    source: Option<&Catalog>,
    target: Option<&Catalog>,
    change: &Change,
    options: &GeneratorOptions,
) -> Result<String> {
    let mut report = ReportGenerator::new();
    DiffSqlGenerator::new(&mut report, options.clone()).process_diff_change(change, source, target)?;
    Ok(report.into_report())
}
