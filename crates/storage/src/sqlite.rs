use rusqlite::Connection;

use catmerge_core::{
    ids::{StandardItemId, TenantId, TenantItemId},
    item::{CatalogFilter, ItemType, StandardItem, SubKind, TenantItem, TypeFields, normalize_name},
};

use crate::error::StorageError;
use crate::traits::CatalogStore;

/// Convert Vec<u8> to fixed-size array with proper error handling.
fn to_array<const N: usize>(v: Vec<u8>, label: &str) -> Result<[u8; N], StorageError> {
    v.try_into()
        .map_err(|_| StorageError::Serialization(format!("invalid {label} length")))
}

/// '' in the sub_kind column means "no sub-partition"; NULL would exempt the
/// row from the UNIQUE indexes.
fn sub_kind_to_sql(sub_kind: Option<SubKind>) -> &'static str {
    sub_kind.map(|k| k.as_str()).unwrap_or("")
}

fn sub_kind_from_sql(s: &str) -> Result<Option<SubKind>, StorageError> {
    if s.is_empty() {
        Ok(None)
    } else {
        Ok(Some(SubKind::parse(s)?))
    }
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        crate::schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        crate::schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

fn read_standard(row: &rusqlite::Row) -> Result<StandardItem, StorageError> {
    let id_bytes: Vec<u8> = row.get(0)?;
    let item_type_str: String = row.get(1)?;
    let name: String = row.get(2)?;
    let order_value: i64 = row.get(3)?;
    let color: Option<String> = row.get(4)?;
    let fields_bytes: Vec<u8> = row.get(5)?;

    let id = StandardItemId::from_bytes(to_array::<16>(id_bytes, "standard_item_id")?);
    let item_type = ItemType::parse(&item_type_str)?;
    let fields = TypeFields::from_msgpack(&fields_bytes)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;

    Ok(StandardItem {
        id,
        item_type,
        name,
        order_value,
        color,
        fields,
    })
}

fn read_tenant_item(row: &rusqlite::Row) -> Result<TenantItem, StorageError> {
    let id_bytes: Vec<u8> = row.get(0)?;
    let tenant_id_bytes: Vec<u8> = row.get(1)?;
    let item_type_str: String = row.get(2)?;
    let name: String = row.get(3)?;
    let order_value: i64 = row.get(4)?;
    let color: Option<String> = row.get(5)?;
    let fields_bytes: Vec<u8> = row.get(6)?;
    let reference_bytes: Option<Vec<u8>> = row.get(7)?;
    let is_protected: bool = row.get(8)?;

    let id = TenantItemId::from_bytes(to_array::<16>(id_bytes, "tenant_item_id")?);
    let tenant_id = TenantId::from_bytes(to_array::<16>(tenant_id_bytes, "tenant_id")?);
    let item_type = ItemType::parse(&item_type_str)?;
    let fields = TypeFields::from_msgpack(&fields_bytes)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    let reference_id = match reference_bytes {
        Some(bytes) => Some(StandardItemId::from_bytes(to_array::<16>(
            bytes,
            "reference_id",
        )?)),
        None => None,
    };

    Ok(TenantItem {
        id,
        tenant_id,
        item_type,
        name,
        order_value,
        color,
        fields,
        reference_id,
        is_protected,
    })
}

const STANDARD_COLUMNS: &str = "standard_item_id, item_type, name, order_value, color, type_fields";
const TENANT_COLUMNS: &str =
    "tenant_item_id, tenant_id, item_type, name, order_value, color, type_fields, reference_id, is_protected";

impl CatalogStore for SqliteStore {
    fn insert_tenant(
        &mut self,
        tenant_id: TenantId,
        display_name: &str,
    ) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO tenants (tenant_id, display_name) VALUES (?1, ?2)",
            rusqlite::params![tenant_id.as_bytes().as_slice(), display_name],
        )?;
        Ok(())
    }

    fn tenant_exists(&self, tenant_id: TenantId) -> Result<bool, StorageError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tenants WHERE tenant_id = ?1",
            rusqlite::params![tenant_id.as_bytes().as_slice()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn insert_standard(&mut self, item: &StandardItem) -> Result<(), StorageError> {
        let fields_bytes = item
            .fields
            .to_msgpack()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.conn.execute(
            "INSERT INTO standard_items (standard_item_id, item_type, sub_kind, name, order_value, color, type_fields) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                item.id.as_bytes().as_slice(),
                item.item_type.as_str(),
                sub_kind_to_sql(item.sub_kind()),
                item.name,
                item.order_value,
                item.color,
                fields_bytes,
            ],
        )?;
        Ok(())
    }

    fn get_standard(&self, id: StandardItemId) -> Result<Option<StandardItem>, StorageError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {STANDARD_COLUMNS} FROM standard_items WHERE standard_item_id = ?1"
        ))?;
        let mut rows = stmt.query(rusqlite::params![id.as_bytes().as_slice()])?;
        match rows.next()? {
            Some(row) => Ok(Some(read_standard(row)?)),
            None => Ok(None),
        }
    }

    fn list_standard(
        &self,
        item_type: ItemType,
        filter: &CatalogFilter,
    ) -> Result<Vec<StandardItem>, StorageError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {STANDARD_COLUMNS} FROM standard_items WHERE item_type = ?1 ORDER BY order_value, name"
        ))?;
        let mut rows = stmt.query(rusqlite::params![item_type.as_str()])?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            let item = read_standard(row)?;
            if filter.matches(item.sub_kind()) {
                result.push(item);
            }
        }
        Ok(result)
    }

    fn get_tenant_item(&self, id: TenantItemId) -> Result<Option<TenantItem>, StorageError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TENANT_COLUMNS} FROM tenant_items WHERE tenant_item_id = ?1"
        ))?;
        let mut rows = stmt.query(rusqlite::params![id.as_bytes().as_slice()])?;
        match rows.next()? {
            Some(row) => Ok(Some(read_tenant_item(row)?)),
            None => Ok(None),
        }
    }

    fn list_tenant_items(
        &self,
        tenant_id: TenantId,
        item_type: ItemType,
        filter: &CatalogFilter,
    ) -> Result<Vec<TenantItem>, StorageError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TENANT_COLUMNS} FROM tenant_items WHERE tenant_id = ?1 AND item_type = ?2 ORDER BY order_value, name"
        ))?;
        let mut rows = stmt.query(rusqlite::params![
            tenant_id.as_bytes().as_slice(),
            item_type.as_str()
        ])?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            let item = read_tenant_item(row)?;
            if filter.matches(item.sub_kind()) {
                result.push(item);
            }
        }
        Ok(result)
    }

    fn imported_references(
        &self,
        tenant_id: TenantId,
        item_type: ItemType,
    ) -> Result<Vec<StandardItemId>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT reference_id FROM tenant_items WHERE tenant_id = ?1 AND item_type = ?2 AND reference_id IS NOT NULL",
        )?;
        let mut rows = stmt.query(rusqlite::params![
            tenant_id.as_bytes().as_slice(),
            item_type.as_str()
        ])?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            let bytes: Vec<u8> = row.get(0)?;
            result.push(StandardItemId::from_bytes(to_array::<16>(
                bytes,
                "reference_id",
            )?));
        }
        Ok(result)
    }

    fn find_by_reference(
        &self,
        tenant_id: TenantId,
        reference_id: StandardItemId,
    ) -> Result<Option<TenantItem>, StorageError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TENANT_COLUMNS} FROM tenant_items WHERE tenant_id = ?1 AND reference_id = ?2"
        ))?;
        let mut rows = stmt.query(rusqlite::params![
            tenant_id.as_bytes().as_slice(),
            reference_id.as_bytes().as_slice()
        ])?;
        match rows.next()? {
            Some(row) => Ok(Some(read_tenant_item(row)?)),
            None => Ok(None),
        }
    }

    fn insert_tenant_item(&mut self, item: &TenantItem) -> Result<(), StorageError> {
        let fields_bytes = item
            .fields
            .to_msgpack()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let result = self.conn.execute(
            "INSERT INTO tenant_items (tenant_item_id, tenant_id, item_type, sub_kind, name, name_norm, order_value, color, type_fields, reference_id, is_protected) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            rusqlite::params![
                item.id.as_bytes().as_slice(),
                item.tenant_id.as_bytes().as_slice(),
                item.item_type.as_str(),
                sub_kind_to_sql(item.sub_kind()),
                item.name,
                normalize_name(&item.name),
                item.order_value,
                item.color,
                fields_bytes,
                item.reference_id.as_ref().map(|r| r.as_bytes().to_vec()),
                item.is_protected,
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, detail))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StorageError::UniqueViolation {
                    detail: detail.unwrap_or_else(|| item.name.clone()),
                })
            }
            Err(e) => Err(StorageError::Sqlite(e)),
        }
    }

    fn delete_tenant_item(&mut self, id: TenantItemId) -> Result<(), StorageError> {
        let item = self
            .get_tenant_item(id)?
            .ok_or_else(|| StorageError::NotFound(format!("tenant item {id}")))?;
        if item.is_protected {
            return Err(StorageError::ProtectedItem(item.name));
        }
        self.conn.execute(
            "DELETE FROM tenant_items WHERE tenant_item_id = ?1",
            rusqlite::params![id.as_bytes().as_slice()],
        )?;
        Ok(())
    }
}
