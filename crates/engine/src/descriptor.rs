use std::collections::HashMap;

use catmerge_core::item::{ItemType, SubKind, TenantItem};

use crate::error::ValidationError;

/// Per-type strategy for the extra invariants an item type carries beyond
/// name and order uniqueness. One generic engine path consults this instead
/// of branching per entity kind.
#[derive(Debug, Clone, Copy)]
pub struct TypeDescriptor {
    item_type: ItemType,
}

impl TypeDescriptor {
    pub fn for_type(item_type: ItemType) -> Self {
        Self { item_type }
    }

    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    /// Whether a sub-partition of this type carries a default flag at all.
    /// Statuses always do; boards only for the ticket sub-kind.
    pub fn allows_default(&self, sub_kind: Option<SubKind>) -> bool {
        match self.item_type {
            ItemType::Status => true,
            ItemType::Board => sub_kind == Some(SubKind::Ticket),
            ItemType::Priority | ItemType::Category => false,
        }
    }

    /// Statuses must keep at least one closed entry. Imports can only add
    /// closed statuses, so this is advisory for the import path and binding
    /// for deletion paths.
    pub fn requires_closed(&self) -> bool {
        self.item_type == ItemType::Status
    }

    /// Validate the default-flag invariant over a full partition, planned
    /// rows included: at most one default per sub-partition.
    pub fn check_partition(&self, items: &[TenantItem]) -> Result<(), ValidationError> {
        let mut defaults: HashMap<Option<SubKind>, u32> = HashMap::new();
        for item in items {
            if item.fields.is_default() {
                *defaults.entry(item.sub_kind()).or_insert(0) += 1;
            }
        }
        if defaults.values().any(|&count| count > 1) {
            return Err(ValidationError::MultipleDefaults);
        }
        Ok(())
    }
}
