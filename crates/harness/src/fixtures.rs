//! ITIL-style standard-catalog seed data shared by the test suites.

use catmerge_core::{
    ids::StandardItemId,
    item::{ItemType, StandardItem, SubKind, TypeFields},
};

pub fn standard_status(name: &str, order_value: i64, is_closed: bool) -> StandardItem {
    StandardItem {
        id: StandardItemId::new(),
        item_type: ItemType::Status,
        name: name.into(),
        order_value,
        color: None,
        fields: TypeFields::Status {
            is_closed,
            is_default: false,
        },
    }
}

pub fn standard_default_status(name: &str, order_value: i64) -> StandardItem {
    StandardItem {
        id: StandardItemId::new(),
        item_type: ItemType::Status,
        name: name.into(),
        order_value,
        color: None,
        fields: TypeFields::Status {
            is_closed: false,
            is_default: true,
        },
    }
}

pub fn standard_priority(name: &str, order_value: i64, sub_kind: SubKind) -> StandardItem {
    StandardItem {
        id: StandardItemId::new(),
        item_type: ItemType::Priority,
        name: name.into(),
        order_value,
        color: None,
        fields: TypeFields::Priority { sub_kind },
    }
}

pub fn standard_board(name: &str, order_value: i64, sub_kind: SubKind) -> StandardItem {
    StandardItem {
        id: StandardItemId::new(),
        item_type: ItemType::Board,
        name: name.into(),
        order_value,
        color: None,
        fields: TypeFields::Board {
            sub_kind,
            is_default: false,
        },
    }
}

/// The ITIL incident lifecycle: New, In Progress, On Hold, Resolved, Closed.
pub fn itil_statuses() -> Vec<StandardItem> {
    vec![
        standard_default_status("New", 10),
        standard_status("In Progress", 20, false),
        standard_status("On Hold", 30, false),
        standard_status("Resolved", 40, true),
        standard_status("Closed", 50, true),
    ]
}

/// Critical through Low for one sub-kind.
pub fn itil_priorities(sub_kind: SubKind) -> Vec<StandardItem> {
    vec![
        standard_priority("Critical", 10, sub_kind),
        standard_priority("High", 20, sub_kind),
        standard_priority("Medium", 30, sub_kind),
        standard_priority("Low", 40, sub_kind),
    ]
}
