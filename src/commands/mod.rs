pub mod analyze;
pub mod inventory;
