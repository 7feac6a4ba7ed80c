use std::collections::BTreeMap;

use catmerge_core::{
    ids::{StandardItemId, TenantId},
    item::{CatalogFilter, ItemType, SubKind},
};
use catmerge_engine::EngineError;
use catmerge_harness::TestTenant;
use catmerge_harness::fixtures::{itil_priorities, itil_statuses};

#[test]
fn full_catalog_is_available_to_a_fresh_tenant() -> Result<(), Box<dyn std::error::Error>> {
    let mut tenant = TestTenant::new()?;
    let ids = tenant.seed_catalog(itil_statuses())?;

    let available =
        tenant
            .engine
            .list_available(tenant.tenant_id, ItemType::Status, &CatalogFilter::none())?;

    assert_eq!(available.len(), ids.len());
    // Ordered by order_value.
    let orders: Vec<i64> = available.iter().map(|i| i.order_value).collect();
    assert_eq!(orders, vec![10, 20, 30, 40, 50]);
    Ok(())
}

#[test]
fn availability_shrinks_by_exactly_the_imported_set() -> Result<(), Box<dyn std::error::Error>> {
    let mut tenant = TestTenant::new()?;
    let ids = tenant.seed_catalog(itil_statuses())?;

    let result = tenant.engine.import(
        tenant.tenant_id,
        ItemType::Status,
        &ids[..2],
        &BTreeMap::new(),
        &CatalogFilter::none(),
    )?;
    assert_eq!(result.imported.len(), 2);

    let available =
        tenant
            .engine
            .list_available(tenant.tenant_id, ItemType::Status, &CatalogFilter::none())?;
    assert_eq!(available.len(), ids.len() - 2);
    assert!(available.iter().all(|item| !ids[..2].contains(&item.id)));
    Ok(())
}

#[test]
fn sub_kind_filter_partitions_availability() -> Result<(), Box<dyn std::error::Error>> {
    let mut tenant = TestTenant::new()?;
    tenant.seed_catalog(itil_priorities(SubKind::Ticket))?;
    tenant.seed_catalog(itil_priorities(SubKind::ProjectTask))?;

    let ticket = tenant.engine.list_available(
        tenant.tenant_id,
        ItemType::Priority,
        &CatalogFilter::for_sub_kind(SubKind::Ticket),
    )?;
    assert_eq!(ticket.len(), 4);
    assert!(ticket.iter().all(|i| i.sub_kind() == Some(SubKind::Ticket)));

    let all = tenant.engine.list_available(
        tenant.tenant_id,
        ItemType::Priority,
        &CatalogFilter::none(),
    )?;
    assert_eq!(all.len(), 8);
    Ok(())
}

#[test]
fn unknown_tenant_is_fatal() -> Result<(), Box<dyn std::error::Error>> {
    let tenant = TestTenant::new()?;
    let err = tenant
        .engine
        .list_available(TenantId::new(), ItemType::Status, &CatalogFilter::none())
        .unwrap_err();
    assert!(matches!(err, EngineError::TenantNotFound(_)));
    Ok(())
}

#[test]
fn unknown_standard_id_is_fatal_to_detection() -> Result<(), Box<dyn std::error::Error>> {
    let tenant = TestTenant::new()?;
    let err = tenant
        .engine
        .detect_conflicts(
            tenant.tenant_id,
            ItemType::Status,
            &[StandardItemId::new()],
            &CatalogFilter::none(),
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::StandardItemNotFound(_)));
    Ok(())
}
