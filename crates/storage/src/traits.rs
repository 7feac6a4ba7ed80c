use catmerge_core::{
    ids::{StandardItemId, TenantId, TenantItemId},
    item::{CatalogFilter, ItemType, StandardItem, TenantItem},
};

use crate::error::StorageError;

/// The Catalog Store: two parallel tables per item type, a shared read-only
/// standard catalog and a writable tenant-scoped catalog.
pub trait CatalogStore {
    fn insert_tenant(&mut self, tenant_id: TenantId, display_name: &str)
    -> Result<(), StorageError>;

    fn tenant_exists(&self, tenant_id: TenantId) -> Result<bool, StorageError>;

    /// Seed one standard-catalog entry. Operator/test surface; the import
    /// engine never writes the standard tables.
    fn insert_standard(&mut self, item: &StandardItem) -> Result<(), StorageError>;

    fn get_standard(&self, id: StandardItemId) -> Result<Option<StandardItem>, StorageError>;

    fn list_standard(
        &self,
        item_type: ItemType,
        filter: &CatalogFilter,
    ) -> Result<Vec<StandardItem>, StorageError>;

    fn get_tenant_item(&self, id: TenantItemId) -> Result<Option<TenantItem>, StorageError>;

    fn list_tenant_items(
        &self,
        tenant_id: TenantId,
        item_type: ItemType,
        filter: &CatalogFilter,
    ) -> Result<Vec<TenantItem>, StorageError>;

    /// Standard ids a tenant has already imported for one item type.
    fn imported_references(
        &self,
        tenant_id: TenantId,
        item_type: ItemType,
    ) -> Result<Vec<StandardItemId>, StorageError>;

    fn find_by_reference(
        &self,
        tenant_id: TenantId,
        reference_id: StandardItemId,
    ) -> Result<Option<TenantItem>, StorageError>;

    /// Insert one tenant row. A violated UNIQUE index surfaces as
    /// `StorageError::UniqueViolation`; the single statement is its own
    /// transaction, which is what gives the executor per-item commit
    /// semantics.
    fn insert_tenant_item(&mut self, item: &TenantItem) -> Result<(), StorageError>;

    /// Remove one tenant row. Refuses protected rows.
    fn delete_tenant_item(&mut self, id: TenantItemId) -> Result<(), StorageError>;
}
