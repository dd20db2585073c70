pub mod memory_store;
pub mod report_store;
pub mod user_store;
