pub mod db;
pub mod memory;
pub mod propertydb;
pub mod retry;
