use catmerge_core::{
    ids::{StandardItemId, TenantId, TenantItemId},
    item::{CatalogFilter, ItemType, StandardItem, SubKind, TenantItem, TypeFields},
};
use catmerge_engine::ImportEngine;
use catmerge_storage::{CatalogStore, SqliteStore, StorageError};

/// One tenant over an in-memory catalog store, for integration tests.
pub struct TestTenant {
    pub tenant_id: TenantId,
    pub engine: ImportEngine,
}

impl TestTenant {
    pub fn new() -> Result<Self, StorageError> {
        let mut storage = SqliteStore::open_in_memory()?;
        let tenant_id = TenantId::new();
        storage.insert_tenant(tenant_id, "Test Tenant")?;
        Ok(Self {
            tenant_id,
            engine: ImportEngine::new(storage),
        })
    }

    /// Seed one standard-catalog entry, returning its id.
    pub fn seed_standard(
        &mut self,
        item: StandardItem,
    ) -> Result<StandardItemId, Box<dyn std::error::Error>> {
        let id = item.id;
        self.engine.storage_mut().insert_standard(&item)?;
        Ok(id)
    }

    /// Seed a whole standard catalog, returning ids in input order.
    pub fn seed_catalog(
        &mut self,
        items: Vec<StandardItem>,
    ) -> Result<Vec<StandardItemId>, Box<dyn std::error::Error>> {
        let mut ids = Vec::with_capacity(items.len());
        for item in items {
            ids.push(self.seed_standard(item)?);
        }
        Ok(ids)
    }

    /// Create a tenant-owned status directly, as tenant CRUD outside the
    /// engine would.
    pub fn add_status(
        &mut self,
        name: &str,
        order_value: i64,
        is_closed: bool,
    ) -> Result<TenantItemId, Box<dyn std::error::Error>> {
        self.add_item(
            name,
            order_value,
            TypeFields::Status {
                is_closed,
                is_default: false,
            },
        )
    }

    /// Create a tenant-owned priority directly.
    pub fn add_priority(
        &mut self,
        name: &str,
        order_value: i64,
        sub_kind: SubKind,
    ) -> Result<TenantItemId, Box<dyn std::error::Error>> {
        self.add_item(name, order_value, TypeFields::Priority { sub_kind })
    }

    pub fn add_item(
        &mut self,
        name: &str,
        order_value: i64,
        fields: TypeFields,
    ) -> Result<TenantItemId, Box<dyn std::error::Error>> {
        let item = TenantItem {
            id: TenantItemId::new(),
            tenant_id: self.tenant_id,
            item_type: fields.item_type(),
            name: name.into(),
            order_value,
            color: None,
            fields,
            reference_id: None,
            is_protected: false,
        };
        let id = item.id;
        self.engine.storage_mut().insert_tenant_item(&item)?;
        Ok(id)
    }

    /// The tenant's rows for one item type, ordered by order_value.
    pub fn items(
        &self,
        item_type: ItemType,
    ) -> Result<Vec<TenantItem>, Box<dyn std::error::Error>> {
        Ok(self.engine.storage().list_tenant_items(
            self.tenant_id,
            item_type,
            &CatalogFilter::none(),
        )?)
    }
}
