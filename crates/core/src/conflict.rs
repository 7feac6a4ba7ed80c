use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::ids::{StandardItemId, TenantId};
use crate::item::{CatalogFilter, ItemType, StandardItem, TenantItem};

/// Which uniqueness invariant a candidate import would violate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictKind {
    Name,
    Order,
    Both,
}

impl ConflictKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Order => "order",
            Self::Both => "both",
        }
    }

    pub fn involves_name(&self) -> bool {
        matches!(self, Self::Name | Self::Both)
    }

    pub fn involves_order(&self) -> bool {
        matches!(self, Self::Order | Self::Both)
    }
}

/// One detected collision between a candidate import and the tenant's
/// existing rows. Transient: produced by detection, consumed by planning,
/// discarded after the import completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conflict {
    pub standard_item: StandardItem,
    pub kind: ConflictKind,
    pub existing: TenantItem,
    /// Unused order value strictly greater than everything in the partition
    /// at detection time. Accepting every suggestion verbatim yields a valid
    /// plan.
    pub suggested_order: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionAction {
    Skip,
    Rename,
    Reorder,
}

impl ResolutionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Rename => "rename",
            Self::Reorder => "reorder",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "skip" => Ok(Self::Skip),
            "rename" => Ok(Self::Rename),
            "reorder" => Ok(Self::Reorder),
            _ => Err(CoreError::InvalidData(format!(
                "unknown resolution action: {s}"
            ))),
        }
    }
}

/// A caller-supplied decision for one conflicting item. `Rename` requires
/// `new_name`, `Reorder` requires `new_order`; whichever optional field is
/// present is applied, so a `Both` conflict can be cleared with a single
/// resolution carrying both fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub action: ResolutionAction,
    pub new_name: Option<String>,
    pub new_order: Option<i64>,
}

impl Resolution {
    pub fn skip() -> Self {
        Self {
            action: ResolutionAction::Skip,
            new_name: None,
            new_order: None,
        }
    }

    pub fn rename(new_name: impl Into<String>) -> Self {
        Self {
            action: ResolutionAction::Rename,
            new_name: Some(new_name.into()),
            new_order: None,
        }
    }

    pub fn reorder(new_order: i64) -> Self {
        Self {
            action: ResolutionAction::Reorder,
            new_name: None,
            new_order: Some(new_order),
        }
    }

    pub fn rename_and_reorder(new_name: impl Into<String>, new_order: i64) -> Self {
        Self {
            action: ResolutionAction::Rename,
            new_name: Some(new_name.into()),
            new_order: Some(new_order),
        }
    }
}

/// One accepted item with its final values, ready to commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedImport {
    pub standard: StandardItem,
    pub name: String,
    pub order_value: i64,
    /// Set when the partition already has a default item; the copy is created
    /// with its default flag cleared.
    pub demote_default: bool,
}

/// A validated, concrete import plan. Applying it cannot violate the name or
/// order invariants barring a concurrent write between plan and execute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportPlan {
    pub tenant_id: TenantId,
    pub item_type: ItemType,
    #[serde(skip)]
    pub filter: CatalogFilter,
    pub entries: Vec<PlannedImport>,
    pub skipped: Vec<SkippedItem>,
}

/// Fixed vocabulary of skip reasons surfaced to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    UserSkipped,
    AlreadyImported,
    CommitConflict,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserSkipped => "user skipped",
            Self::AlreadyImported => "already imported",
            Self::CommitConflict => "conflict at commit time",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedItem {
    pub standard_item_id: StandardItemId,
    pub name: String,
    pub reason: SkipReason,
}

/// Outcome of one execute call. Committed items stand even when others were
/// skipped; the caller re-runs for the skipped subset after adjusting
/// resolutions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportResult {
    pub imported: Vec<TenantItem>,
    pub skipped: Vec<SkippedItem>,
}

impl ImportResult {
    pub fn skipped_for(&self, id: StandardItemId) -> Option<SkipReason> {
        self.skipped
            .iter()
            .find(|s| s.standard_item_id == id)
            .map(|s| s.reason)
    }
}
