pub mod auth;
pub mod lease;
pub mod selector;
pub mod storage;
