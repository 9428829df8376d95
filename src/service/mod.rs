pub mod property_validator;
pub mod roles;
pub mod storage;
