use std::collections::{BTreeMap, HashMap, HashSet};

use catmerge_core::{
    conflict::{ImportPlan, PlannedImport, Resolution, ResolutionAction, SkipReason, SkippedItem},
    ids::{StandardItemId, TenantId},
    item::{CatalogFilter, ItemType, StandardItem, SubKind, TenantItem, normalize_name},
};
use tracing::warn;

use crate::descriptor::TypeDescriptor;
use crate::error::ValidationError;

/// Turn detected conflicts plus caller-supplied resolutions into a concrete,
/// validated import plan.
///
/// Validation is batch-and-tenant wide: after applying every resolution, the
/// final name and order sets over existing plus planned rows must contain no
/// duplicate per sub-partition. This re-runs even for items the caller
/// already resolved, because the tenant catalog may have changed between the
/// detect call and this one.
pub(crate) fn build_plan(
    tenant_id: TenantId,
    item_type: ItemType,
    filter: CatalogFilter,
    existing: &[TenantItem],
    requested: &[StandardItem],
    resolutions: &BTreeMap<StandardItemId, Resolution>,
    descriptor: &TypeDescriptor,
) -> Result<ImportPlan, ValidationError> {
    let requested_ids: HashSet<StandardItemId> = requested.iter().map(|s| s.id).collect();

    let mut names: HashSet<(Option<SubKind>, String)> = HashSet::new();
    let mut orders: HashSet<(Option<SubKind>, i64)> = HashSet::new();
    let mut default_taken: HashSet<Option<SubKind>> = HashSet::new();

    for item in existing {
        let key = item.sub_kind();
        if item.fields.is_default() {
            default_taken.insert(key);
        }
        // Copies of requested items resolve to "already imported" skips at
        // execute time; their names and orders are not collisions here.
        if item
            .reference_id
            .is_some_and(|reference| requested_ids.contains(&reference))
        {
            continue;
        }
        names.insert((key, item.normalized_name()));
        orders.insert((key, item.order_value));
    }

    let mut entries: Vec<PlannedImport> = Vec::new();
    let mut skipped: Vec<SkippedItem> = Vec::new();

    for standard in requested {
        let resolution = resolutions.get(&standard.id);

        let (final_name, final_order) = match resolution {
            Some(res) if res.action == ResolutionAction::Skip => {
                skipped.push(SkippedItem {
                    standard_item_id: standard.id,
                    name: standard.name.clone(),
                    reason: SkipReason::UserSkipped,
                });
                continue;
            }
            Some(res) => {
                match res.action {
                    ResolutionAction::Rename if res.new_name.is_none() => {
                        return Err(ValidationError::MissingNewName { id: standard.id });
                    }
                    ResolutionAction::Reorder if res.new_order.is_none() => {
                        return Err(ValidationError::MissingNewOrder { id: standard.id });
                    }
                    _ => {}
                }
                (
                    res.new_name.clone().unwrap_or_else(|| standard.name.clone()),
                    res.new_order.unwrap_or(standard.order_value),
                )
            }
            // Unresolved items pass through with their original values and
            // must survive the same collision checks.
            None => (standard.name.clone(), standard.order_value),
        };

        let key = standard.sub_kind();
        if !names.insert((key, normalize_name(&final_name))) {
            return Err(ValidationError::DuplicateName { name: final_name });
        }
        if !orders.insert((key, final_order)) {
            return Err(ValidationError::DuplicateOrder { order: final_order });
        }

        let wants_default = standard.fields.is_default();
        let demote_default = wants_default
            && (!descriptor.allows_default(key) || !default_taken.insert(key));

        entries.push(PlannedImport {
            standard: standard.clone(),
            name: final_name,
            order_value: final_order,
            demote_default,
        });
    }

    let plan = ImportPlan {
        tenant_id,
        item_type,
        filter,
        entries,
        skipped,
    };

    check_plan_partition(existing, &plan, descriptor)?;
    Ok(plan)
}

/// Materialize the planned rows alongside the existing partition and run the
/// descriptor's extra invariants over the union.
fn check_plan_partition(
    existing: &[TenantItem],
    plan: &ImportPlan,
    descriptor: &TypeDescriptor,
) -> Result<(), ValidationError> {
    let mut combined: Vec<TenantItem> = existing.to_vec();
    for entry in &plan.entries {
        let mut item = TenantItem::from_standard(plan.tenant_id, &entry.standard);
        item.name = entry.name.clone();
        item.order_value = entry.order_value;
        if entry.demote_default {
            item.fields.clear_default();
        }
        combined.push(item);
    }
    descriptor.check_partition(&combined)?;

    if descriptor.requires_closed() && !combined.is_empty() {
        let mut closed_by_sub: HashMap<Option<SubKind>, bool> = HashMap::new();
        for item in &combined {
            let entry = closed_by_sub.entry(item.sub_kind()).or_insert(false);
            *entry |= item.fields.is_closed();
        }
        // An import can add closed statuses but never remove one, so this
        // flags partitions that were already incomplete.
        if closed_by_sub.values().any(|&has_closed| !has_closed) {
            warn!(
                tenant = %plan.tenant_id,
                item_type = %plan.item_type,
                "status partition has no closed status after import"
            );
        }
    }

    Ok(())
}
