pub mod descriptor;
pub mod error;

mod detect;
mod plan;

pub use descriptor::TypeDescriptor;
pub use error::{EngineError, ValidationError};

use std::collections::BTreeMap;

use catmerge_core::{
    conflict::{Conflict, ImportPlan, ImportResult, Resolution, SkipReason, SkippedItem},
    ids::{StandardItemId, TenantId},
    item::{CatalogFilter, ItemType, StandardItem, TenantItem},
};
use catmerge_storage::{CatalogStore, SqliteStore, StorageError};
use tracing::{debug, info, warn};

/// The import/merge engine. Stateless between calls; all state lives in the
/// catalog store. The four public operations follow the control flow
/// availability, detect, plan, execute, with the human resolution steps
/// happening outside, between calls.
pub struct ImportEngine {
    storage: SqliteStore,
}

impl ImportEngine {
    pub fn new(storage: SqliteStore) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &SqliteStore {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut SqliteStore {
        &mut self.storage
    }

    /// Every operation is tenant-scoped; an unknown tenant is fatal with
    /// nothing attempted.
    fn require_tenant(&self, tenant_id: TenantId) -> Result<(), EngineError> {
        if !self.storage.tenant_exists(tenant_id)? {
            return Err(EngineError::TenantNotFound(tenant_id.to_string()));
        }
        Ok(())
    }

    /// Resolve requested ids to standard items, preserving request order.
    /// Any unknown id aborts the whole call.
    fn load_requested(
        &self,
        standard_item_ids: &[StandardItemId],
    ) -> Result<Vec<StandardItem>, EngineError> {
        let mut items = Vec::with_capacity(standard_item_ids.len());
        for &id in standard_item_ids {
            let item = self
                .storage
                .get_standard(id)?
                .ok_or_else(|| EngineError::StandardItemNotFound(id.to_string()))?;
            items.push(item);
        }
        Ok(items)
    }

    /// Standard items of the given type the tenant has not yet imported.
    /// Read-only; feeds the candidate-selection step.
    pub fn list_available(
        &self,
        tenant_id: TenantId,
        item_type: ItemType,
        filter: &CatalogFilter,
    ) -> Result<Vec<StandardItem>, EngineError> {
        self.require_tenant(tenant_id)?;
        let imported: std::collections::HashSet<StandardItemId> = self
            .storage
            .imported_references(tenant_id, item_type)?
            .into_iter()
            .collect();
        let mut items = self.storage.list_standard(item_type, filter)?;
        items.retain(|item| !imported.contains(&item.id));
        Ok(items)
    }

    /// Compute collisions between the requested standard items and the
    /// tenant's existing rows. Pure and repeatable; detection has no side
    /// effects to undo.
    pub fn detect_conflicts(
        &self,
        tenant_id: TenantId,
        item_type: ItemType,
        standard_item_ids: &[StandardItemId],
        filter: &CatalogFilter,
    ) -> Result<Vec<Conflict>, EngineError> {
        self.require_tenant(tenant_id)?;
        let requested = self.load_requested(standard_item_ids)?;
        let existing = self
            .storage
            .list_tenant_items(tenant_id, item_type, filter)?;
        let conflicts = detect::detect(&existing, &requested);
        debug!(
            tenant = %tenant_id,
            item_type = %item_type,
            requested = requested.len(),
            conflicts = conflicts.len(),
            "conflict detection"
        );
        Ok(conflicts)
    }

    /// Validate resolutions into a concrete plan. Fails with a
    /// `ValidationError` if any resolved or unresolved item still collides,
    /// within the batch or against the tenant; nothing is committed.
    pub fn plan(
        &self,
        tenant_id: TenantId,
        item_type: ItemType,
        standard_item_ids: &[StandardItemId],
        resolutions: &BTreeMap<StandardItemId, Resolution>,
        filter: &CatalogFilter,
    ) -> Result<ImportPlan, EngineError> {
        self.require_tenant(tenant_id)?;
        let requested = self.load_requested(standard_item_ids)?;
        let existing = self
            .storage
            .list_tenant_items(tenant_id, item_type, filter)?;
        let descriptor = TypeDescriptor::for_type(item_type);
        let plan = plan::build_plan(
            tenant_id,
            item_type,
            *filter,
            &existing,
            &requested,
            resolutions,
            &descriptor,
        )?;
        Ok(plan)
    }

    /// Apply a validated plan. Each item commits independently: a row whose
    /// reference already exists is skipped as already imported, a uniqueness
    /// violation lost to a concurrent import is skipped as a commit-time
    /// conflict, and committed items are never rolled back because a later
    /// item failed.
    pub fn execute(&mut self, plan: &ImportPlan) -> Result<ImportResult, EngineError> {
        self.require_tenant(plan.tenant_id)?;

        let mut result = ImportResult {
            imported: Vec::new(),
            skipped: plan.skipped.clone(),
        };

        for entry in &plan.entries {
            if self
                .storage
                .find_by_reference(plan.tenant_id, entry.standard.id)?
                .is_some()
            {
                result.skipped.push(SkippedItem {
                    standard_item_id: entry.standard.id,
                    name: entry.name.clone(),
                    reason: SkipReason::AlreadyImported,
                });
                continue;
            }

            let mut item = TenantItem::from_standard(plan.tenant_id, &entry.standard);
            item.name = entry.name.clone();
            item.order_value = entry.order_value;
            if entry.demote_default {
                item.fields.clear_default();
            }

            match self.storage.insert_tenant_item(&item) {
                Ok(()) => {
                    info!(
                        tenant = %plan.tenant_id,
                        item_type = %plan.item_type,
                        name = %item.name,
                        order = item.order_value,
                        "imported catalog item"
                    );
                    result.imported.push(item);
                }
                Err(StorageError::UniqueViolation { detail }) => {
                    warn!(
                        tenant = %plan.tenant_id,
                        name = %entry.name,
                        detail = %detail,
                        "import lost a commit-time race"
                    );
                    result.skipped.push(SkippedItem {
                        standard_item_id: entry.standard.id,
                        name: entry.name.clone(),
                        reason: SkipReason::CommitConflict,
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(result)
    }

    /// Plan and execute in one call, for callers that already gathered
    /// resolutions.
    pub fn import(
        &mut self,
        tenant_id: TenantId,
        item_type: ItemType,
        standard_item_ids: &[StandardItemId],
        resolutions: &BTreeMap<StandardItemId, Resolution>,
        filter: &CatalogFilter,
    ) -> Result<ImportResult, EngineError> {
        let plan = self.plan(tenant_id, item_type, standard_item_ids, resolutions, filter)?;
        self.execute(&plan)
    }
}
