use std::collections::{HashMap, HashSet};

use catmerge_core::{
    conflict::{Conflict, ConflictKind},
    ids::StandardItemId,
    item::{StandardItem, SubKind, TenantItem},
};
use tracing::debug;

/// Compute every collision between the requested standard items and the
/// tenant's existing rows. Pure: operates on snapshots, no side effects,
/// safe to call repeatedly.
///
/// Tenant rows already imported from one of the requested ids are excluded
/// from the collision indexes; those requests resolve to "already imported"
/// at execute time rather than to a conflict here.
pub(crate) fn detect(existing: &[TenantItem], requested: &[StandardItem]) -> Vec<Conflict> {
    let requested_ids: HashSet<StandardItemId> = requested.iter().map(|s| s.id).collect();

    let mut names: HashMap<(Option<SubKind>, String), &TenantItem> = HashMap::new();
    let mut orders: HashMap<(Option<SubKind>, i64), &TenantItem> = HashMap::new();
    let mut next_order: HashMap<Option<SubKind>, i64> = HashMap::new();

    for item in existing {
        let key = item.sub_kind();
        // suggested_order is appended past every existing order, including
        // rows slated for replacement, so suggestions never reuse a slot.
        let next = next_order.entry(key).or_insert(1);
        if item.order_value >= *next {
            *next = item.order_value + 1;
        }
        if item
            .reference_id
            .is_some_and(|reference| requested_ids.contains(&reference))
        {
            continue;
        }
        names.insert((key, item.normalized_name()), item);
        orders.insert((key, item.order_value), item);
    }

    let mut conflicts = Vec::new();
    for standard in requested {
        let key = standard.sub_kind();
        if existing
            .iter()
            .any(|t| t.reference_id == Some(standard.id))
        {
            continue;
        }

        let name_hit = names.get(&(key, standard.normalized_name())).copied();
        let order_hit = orders.get(&(key, standard.order_value)).copied();

        let kind = match (name_hit, order_hit) {
            (Some(_), Some(_)) => ConflictKind::Both,
            (Some(_), None) => ConflictKind::Name,
            (None, Some(_)) => ConflictKind::Order,
            (None, None) => continue,
        };

        let suggested_order = if kind.involves_order() {
            let next = next_order.entry(key).or_insert(1);
            let suggestion = *next;
            *next += 1;
            suggestion
        } else {
            standard.order_value
        };

        debug!(
            standard = %standard.id,
            name = %standard.name,
            kind = kind.as_str(),
            suggested_order,
            "conflict detected"
        );

        // For a Both conflict the name collision names the colliding row.
        let colliding = name_hit.or(order_hit).cloned();
        if let Some(existing_item) = colliding {
            conflicts.push(Conflict {
                standard_item: standard.clone(),
                kind,
                existing: existing_item,
                suggested_order,
            });
        }
    }

    conflicts
}
