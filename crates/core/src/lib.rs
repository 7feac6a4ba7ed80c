pub mod conflict;
pub mod error;
pub mod ids;
pub mod item;

pub use conflict::{
    Conflict, ConflictKind, ImportPlan, ImportResult, PlannedImport, Resolution, ResolutionAction,
    SkipReason, SkippedItem,
};
pub use error::CoreError;
pub use ids::*;
pub use item::{CatalogFilter, ItemType, StandardItem, SubKind, TenantItem, TypeFields};
