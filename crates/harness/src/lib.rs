pub mod fixtures;
pub mod tenant;

pub use tenant::TestTenant;
