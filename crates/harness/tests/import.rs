use std::collections::{BTreeMap, HashSet};

use catmerge_core::{
    conflict::{ConflictKind, Resolution, SkipReason},
    ids::StandardItemId,
    item::{CatalogFilter, ItemType, SubKind},
};
use catmerge_engine::ImportEngine;
use catmerge_harness::TestTenant;
use catmerge_harness::fixtures::{
    itil_priorities, itil_statuses, standard_default_status, standard_priority, standard_status,
};
use catmerge_storage::{CatalogStore, SqliteStore};

fn resolutions(
    entries: Vec<(StandardItemId, Resolution)>,
) -> BTreeMap<StandardItemId, Resolution> {
    entries.into_iter().collect()
}

// The full flow: tenant has {"Low": 10, "High": 20}, the standard catalog
// offers {"High": 15}; detect, rename, execute.
#[test]
fn detect_resolve_execute_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let mut tenant = TestTenant::new()?;
    tenant.add_priority("Low", 10, SubKind::Ticket)?;
    tenant.add_priority("High", 20, SubKind::Ticket)?;
    let id = tenant.seed_standard(standard_priority("High", 15, SubKind::Ticket))?;

    let conflicts = tenant.engine.detect_conflicts(
        tenant.tenant_id,
        ItemType::Priority,
        &[id],
        &CatalogFilter::none(),
    )?;
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].kind, ConflictKind::Name);

    let result = tenant.engine.import(
        tenant.tenant_id,
        ItemType::Priority,
        &[id],
        &resolutions(vec![(id, Resolution::rename("High (Imported)"))]),
        &CatalogFilter::none(),
    )?;

    assert_eq!(result.imported.len(), 1);
    assert!(result.skipped.is_empty());
    let imported = &result.imported[0];
    assert_eq!(imported.name, "High (Imported)");
    assert_eq!(imported.order_value, 15);
    assert_eq!(imported.reference_id, Some(id));
    assert!(!imported.is_protected);
    Ok(())
}

#[test]
fn reimport_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let mut tenant = TestTenant::new()?;
    let ids = tenant.seed_catalog(itil_statuses())?;

    let first = tenant.engine.import(
        tenant.tenant_id,
        ItemType::Status,
        &ids,
        &BTreeMap::new(),
        &CatalogFilter::none(),
    )?;
    assert_eq!(first.imported.len(), ids.len());
    let state_after_first = tenant.items(ItemType::Status)?;

    let second = tenant.engine.import(
        tenant.tenant_id,
        ItemType::Status,
        &ids,
        &BTreeMap::new(),
        &CatalogFilter::none(),
    )?;
    assert!(second.imported.is_empty());
    assert_eq!(second.skipped.len(), ids.len());
    for id in &ids {
        assert_eq!(second.skipped_for(*id), Some(SkipReason::AlreadyImported));
    }

    assert_eq!(tenant.items(ItemType::Status)?, state_after_first);
    Ok(())
}

// A concurrent import between plan and execute: the lost item degrades to a
// commit-time skip, the rest of the batch still lands.
#[test]
fn commit_time_race_degrades_to_partial_result() -> Result<(), Box<dyn std::error::Error>> {
    let mut tenant = TestTenant::new()?;
    let a = tenant.seed_standard(standard_priority("Critical", 10, SubKind::Ticket))?;
    let b = tenant.seed_standard(standard_priority("High", 20, SubKind::Ticket))?;

    let plan = tenant.engine.plan(
        tenant.tenant_id,
        ItemType::Priority,
        &[a, b],
        &BTreeMap::new(),
        &CatalogFilter::none(),
    )?;

    // Another session grabs order 20 after planning.
    tenant.add_priority("Urgent", 20, SubKind::Ticket)?;

    let result = tenant.engine.execute(&plan)?;
    assert_eq!(result.imported.len(), 1);
    assert_eq!(result.imported[0].name, "Critical");
    assert_eq!(result.skipped_for(b), Some(SkipReason::CommitConflict));
    assert_eq!(
        result.skipped[0].reason.as_str(),
        "conflict at commit time"
    );

    // The committed item stands despite the skip.
    let names: Vec<String> = tenant
        .items(ItemType::Priority)?
        .into_iter()
        .map(|i| i.name)
        .collect();
    assert!(names.contains(&"Critical".to_string()));
    Ok(())
}

#[test]
fn invariants_hold_after_a_sequence_of_imports() -> Result<(), Box<dyn std::error::Error>> {
    let mut tenant = TestTenant::new()?;
    tenant.add_status("Triage", 10, false)?;
    tenant.add_status("Done", 50, true)?;
    let ids = tenant.seed_catalog(itil_statuses())?;

    // First pass with no resolutions: collisions abort planning, so import
    // one conflict-free subset, then resolve the rest.
    let clean: Vec<StandardItemId> = ids[1..4].to_vec(); // In Progress, On Hold, Resolved
    tenant.engine.import(
        tenant.tenant_id,
        ItemType::Status,
        &clean,
        &BTreeMap::new(),
        &CatalogFilter::none(),
    )?;

    let conflicts = tenant.engine.detect_conflicts(
        tenant.tenant_id,
        ItemType::Status,
        &ids,
        &CatalogFilter::none(),
    )?;
    // "New" at 10 collides with Triage; "Closed" at 50 collides with Done.
    assert_eq!(conflicts.len(), 2);

    let res = resolutions(
        conflicts
            .iter()
            .map(|c| {
                (
                    c.standard_item.id,
                    Resolution::reorder(c.suggested_order),
                )
            })
            .collect(),
    );
    tenant.engine.import(
        tenant.tenant_id,
        ItemType::Status,
        &ids,
        &res,
        &CatalogFilter::none(),
    )?;

    let items = tenant.items(ItemType::Status)?;
    assert_eq!(items.len(), 7);
    let names: HashSet<String> = items.iter().map(|i| i.normalized_name()).collect();
    let orders: HashSet<i64> = items.iter().map(|i| i.order_value).collect();
    assert_eq!(names.len(), items.len());
    assert_eq!(orders.len(), items.len());
    Ok(())
}

// The at-least-one-closed rule is advisory here: an import never removes a
// closed status, so a batch of open-only statuses lands without error even
// when the partition ends up with no closed entry.
#[test]
fn open_only_status_import_is_accepted() -> Result<(), Box<dyn std::error::Error>> {
    let mut tenant = TestTenant::new()?;
    let ids = vec![
        tenant.seed_standard(standard_status("New", 10, false))?,
        tenant.seed_standard(standard_status("In Progress", 20, false))?,
    ];

    let result = tenant.engine.import(
        tenant.tenant_id,
        ItemType::Status,
        &ids,
        &BTreeMap::new(),
        &CatalogFilter::none(),
    )?;

    assert_eq!(result.imported.len(), 2);
    assert!(result.skipped.is_empty());
    let items = tenant.items(ItemType::Status)?;
    assert!(items.iter().all(|i| !i.fields.is_closed()));
    Ok(())
}

#[test]
fn imported_default_lands_demoted() -> Result<(), Box<dyn std::error::Error>> {
    let mut tenant = TestTenant::new()?;
    tenant.add_item(
        "New",
        10,
        catmerge_core::item::TypeFields::Status {
            is_closed: false,
            is_default: true,
        },
    )?;
    let id = tenant.seed_standard(standard_default_status("Incoming", 15))?;

    tenant.engine.import(
        tenant.tenant_id,
        ItemType::Status,
        &[id],
        &BTreeMap::new(),
        &CatalogFilter::none(),
    )?;

    let items = tenant.items(ItemType::Status)?;
    let defaults: Vec<_> = items.iter().filter(|i| i.fields.is_default()).collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0].name, "New");
    Ok(())
}

#[test]
fn sub_kind_partitions_import_independently() -> Result<(), Box<dyn std::error::Error>> {
    let mut tenant = TestTenant::new()?;
    tenant.add_priority("High", 20, SubKind::Ticket)?;
    let ids = tenant.seed_catalog(itil_priorities(SubKind::ProjectTask))?;

    // "High" exists for tickets but project-task priorities are a separate
    // partition; the whole set imports unmodified.
    let result = tenant.engine.import(
        tenant.tenant_id,
        ItemType::Priority,
        &ids,
        &BTreeMap::new(),
        &CatalogFilter::for_sub_kind(SubKind::ProjectTask),
    )?;
    assert_eq!(result.imported.len(), 4);
    assert!(result.skipped.is_empty());
    Ok(())
}

#[test]
fn imports_survive_reopen() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("catalog.db");
    let path = path.to_str().unwrap();

    let tenant_id;
    let ids;
    {
        let mut storage = SqliteStore::open(path)?;
        tenant_id = catmerge_core::ids::TenantId::new();
        storage.insert_tenant(tenant_id, "Acme")?;
        let mut engine = ImportEngine::new(storage);
        ids = itil_statuses()
            .into_iter()
            .map(|item| {
                let id = item.id;
                engine.storage_mut().insert_standard(&item).map(|_| id)
            })
            .collect::<Result<Vec<_>, _>>()?;
        engine.import(
            tenant_id,
            ItemType::Status,
            &ids,
            &BTreeMap::new(),
            &CatalogFilter::none(),
        )?;
    }

    let engine = ImportEngine::new(SqliteStore::open(path)?);
    let items =
        engine
            .storage()
            .list_tenant_items(tenant_id, ItemType::Status, &CatalogFilter::none())?;
    assert_eq!(items.len(), ids.len());

    // Re-running against the reopened store is still idempotent.
    let mut engine = engine;
    let rerun = engine.import(
        tenant_id,
        ItemType::Status,
        &ids,
        &BTreeMap::new(),
        &CatalogFilter::none(),
    )?;
    assert!(rerun.imported.is_empty());
    assert_eq!(rerun.skipped.len(), ids.len());
    Ok(())
}
