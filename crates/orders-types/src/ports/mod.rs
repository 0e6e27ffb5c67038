pub mod kv_store;
pub mod order_repository;
