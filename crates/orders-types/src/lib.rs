//! orders-types: order domain model plus the ports the adapters implement.

pub mod domain;
pub mod ports;
