use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::ids::{StandardItemId, TenantId, TenantItemId};

/// The kind of categorical configuration data being managed. Uniqueness
/// invariants are evaluated within one `(tenant, item type, sub-kind)`
/// partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ItemType {
    Status,
    Priority,
    Board,
    Category,
}

impl ItemType {
    pub const ALL: [ItemType; 4] = [Self::Status, Self::Priority, Self::Board, Self::Category];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Priority => "priority",
            Self::Board => "board",
            Self::Category => "category",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "status" => Ok(Self::Status),
            "priority" => Ok(Self::Priority),
            "board" => Ok(Self::Board),
            "category" => Ok(Self::Category),
            _ => Err(CoreError::InvalidData(format!("unknown item type: {s}"))),
        }
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Type-specific sub-partition. Priorities and boards exist separately for
/// tickets and project tasks; the other item types carry no sub-kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SubKind {
    Ticket,
    ProjectTask,
}

impl SubKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ticket => "ticket",
            Self::ProjectTask => "project_task",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "ticket" => Ok(Self::Ticket),
            "project_task" => Ok(Self::ProjectTask),
            _ => Err(CoreError::InvalidData(format!("unknown sub-kind: {s}"))),
        }
    }
}

/// Optional narrowing applied by every engine operation. A filter with a
/// sub-kind restricts queries and invariant checks to that sub-partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub sub_kind: Option<SubKind>,
}

impl CatalogFilter {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn for_sub_kind(sub_kind: SubKind) -> Self {
        Self {
            sub_kind: Some(sub_kind),
        }
    }

    pub fn matches(&self, sub_kind: Option<SubKind>) -> bool {
        match self.sub_kind {
            None => true,
            Some(wanted) => sub_kind == Some(wanted),
        }
    }
}

/// Per-type extra fields carried by both standard and tenant items.
/// Persisted as a msgpack blob alongside the typed columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeFields {
    Status { is_closed: bool, is_default: bool },
    Priority { sub_kind: SubKind },
    Board { sub_kind: SubKind, is_default: bool },
    Category,
}

impl TypeFields {
    pub fn item_type(&self) -> ItemType {
        match self {
            Self::Status { .. } => ItemType::Status,
            Self::Priority { .. } => ItemType::Priority,
            Self::Board { .. } => ItemType::Board,
            Self::Category => ItemType::Category,
        }
    }

    pub fn sub_kind(&self) -> Option<SubKind> {
        match self {
            Self::Priority { sub_kind } | Self::Board { sub_kind, .. } => Some(*sub_kind),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Status { is_closed: true, .. })
    }

    pub fn is_default(&self) -> bool {
        matches!(
            self,
            Self::Status {
                is_default: true,
                ..
            } | Self::Board {
                is_default: true,
                ..
            }
        )
    }

    pub fn clear_default(&mut self) {
        match self {
            Self::Status { is_default, .. } | Self::Board { is_default, .. } => {
                *is_default = false;
            }
            _ => {}
        }
    }

    pub fn to_msgpack(&self) -> Result<Vec<u8>, rmp_serde::encode::Error> {
        rmp_serde::to_vec(self)
    }

    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, rmp_serde::decode::Error> {
        rmp_serde::from_slice(bytes)
    }
}

/// An immutable, tenant-independent catalog entry. Seeded by platform
/// operators; never mutated by the import engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardItem {
    pub id: StandardItemId,
    pub item_type: ItemType,
    pub name: String,
    pub order_value: i64,
    pub color: Option<String>,
    pub fields: TypeFields,
}

impl StandardItem {
    pub fn sub_kind(&self) -> Option<SubKind> {
        self.fields.sub_kind()
    }

    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }
}

/// A tenant-owned catalog row. `reference_id` points back at the standard
/// item it was imported from, for traceability only; identity is `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantItem {
    pub id: TenantItemId,
    pub tenant_id: TenantId,
    pub item_type: ItemType,
    pub name: String,
    pub order_value: i64,
    pub color: Option<String>,
    pub fields: TypeFields,
    pub reference_id: Option<StandardItemId>,
    pub is_protected: bool,
}

impl TenantItem {
    /// Copy a standard item into a tenant's namespace. Name and order can be
    /// overridden afterwards by a resolution; type-specific fields are copied
    /// verbatim.
    pub fn from_standard(tenant_id: TenantId, standard: &StandardItem) -> Self {
        Self {
            id: TenantItemId::new(),
            tenant_id,
            item_type: standard.item_type,
            name: standard.name.clone(),
            order_value: standard.order_value,
            color: standard.color.clone(),
            fields: standard.fields.clone(),
            reference_id: Some(standard.id),
            is_protected: false,
        }
    }

    pub fn sub_kind(&self) -> Option<SubKind> {
        self.fields.sub_kind()
    }

    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }
}

/// Case normalization used for the name-uniqueness invariant.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_type_roundtrip() {
        for ty in ItemType::ALL {
            assert_eq!(ItemType::parse(ty.as_str()).unwrap(), ty);
        }
        assert!(ItemType::parse("widget").is_err());
    }

    #[test]
    fn type_fields_msgpack_roundtrip() {
        let fields = TypeFields::Board {
            sub_kind: SubKind::Ticket,
            is_default: true,
        };
        let bytes = fields.to_msgpack().unwrap();
        assert_eq!(TypeFields::from_msgpack(&bytes).unwrap(), fields);
    }

    #[test]
    fn from_standard_copies_fields_and_reference() {
        let standard = StandardItem {
            id: StandardItemId::new(),
            item_type: ItemType::Status,
            name: "Resolved".into(),
            order_value: 40,
            color: Some("#2da44e".into()),
            fields: TypeFields::Status {
                is_closed: true,
                is_default: false,
            },
        };
        let tenant_id = TenantId::new();
        let item = TenantItem::from_standard(tenant_id, &standard);
        assert_eq!(item.tenant_id, tenant_id);
        assert_eq!(item.name, "Resolved");
        assert_eq!(item.order_value, 40);
        assert_eq!(item.reference_id, Some(standard.id));
        assert!(!item.is_protected);
        assert!(item.fields.is_closed());
    }

    #[test]
    fn name_normalization_ignores_case_and_outer_whitespace() {
        assert_eq!(normalize_name("  In Progress "), "in progress");
        assert_eq!(normalize_name("IN PROGRESS"), "in progress");
    }
}
