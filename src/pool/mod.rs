//! Connection lifecycle management
//!
//! This module handles:
//! * The driver seam the pool orchestrates
//! * Driver configuration assembly
//! * Create / validate / destroy of pooled connection resources
//! * Exactly-once settlement of creation outcomes

mod config;
mod driver;
mod manager;
mod resource;
mod settlement;

pub use config::{AuthMode, DriverConfig, PoolConfig, ProxyRoutingConfig};
pub use driver::{ConnectEvent, Connector, Driver, DriverConnection};
pub use manager::{BeforeConnect, ConnectionPoolManager};
pub use resource::ConnectionResource;
pub use settlement::Settlement;
