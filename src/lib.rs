//! # tunnel-wire
//!
//! Bearer-authenticated proxy tunnel and connection lifecycle for async
//! database drivers.
//!
//! The crate establishes a routed byte stream to a private database host
//! through an intermediary proxy, presenting a short-lived bearer credential
//! instead of a password, and hands that stream to a pooled-connection
//! manager that creates, validates, and disposes of logical database
//! connections built on top of it.
//!
//! ## Architecture
//!
//! * [`protocol`] — wire message layouts for the three-stage handshake
//! * [`tunnel`] — the negotiation state machine and [`tunnel::TunnelNegotiator`]
//! * [`auth`] — the [`auth::TokenProvider`] seam and the HTTP
//!   client-credentials implementation
//! * [`pool`] — driver abstraction, connection resources, and the
//!   [`pool::ConnectionPoolManager`] lifecycle
//!
//! ## Example
//!
//! ```no_run
//! # async fn example() -> tunnel_wire::Result<()> {
//! use tunnel_wire::tunnel::{TunnelNegotiator, TunnelTarget};
//!
//! let target = TunnelTarget::new("db.internal", 1433)
//!     .credential("eyJhbGciOi...")
//!     .location_id("");
//!
//! let stream = TunnelNegotiator::through_proxy("proxy.internal", 20004, target).await?;
//! # let _ = stream;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod error;
pub mod pool;
pub mod protocol;
pub mod tunnel;

pub use error::{Error, Result};
pub use pool::{ConnectionPoolManager, ConnectionResource, PoolConfig};
pub use tunnel::{TunnelNegotiator, TunnelTarget};
