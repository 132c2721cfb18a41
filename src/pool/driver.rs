//! Database driver seam

use super::config::DriverConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio::net::TcpStream;
use tokio::sync::mpsc;

/// Zero-argument stream factory the driver must use in place of its own
/// TCP dial
///
/// When proxy routing is configured the pool establishes the tunnel first and
/// hands the driver a connector yielding the ready stream.
pub type Connector = Box<dyn FnOnce() -> BoxFuture<'static, Result<TcpStream>> + Send>;

/// Terminal signal emitted by a connecting driver
///
/// A driver may emit more than one signal for the same failure (an error
/// followed by a stream end); the pool settles on the first.
#[derive(Debug)]
pub enum ConnectEvent {
    /// Connect sequence completed; carries the negotiated collation
    Connected {
        /// Collation/metadata negotiated with the database
        collation: Option<String>,
    },

    /// Connection-level error
    Errored(Error),

    /// The stream ended
    Ended,
}

/// A database driver the pool can build connections with
#[async_trait]
pub trait Driver: Send + Sync + 'static {
    /// Connection type produced by this driver
    type Conn: DriverConnection;

    /// Construct a connection and begin its connect sequence
    ///
    /// Terminal connect-phase signals (and any later connection-level
    /// signals) arrive on the returned receiver. When `connector` is present
    /// the driver must obtain its transport from it instead of dialing.
    async fn open(
        &self,
        config: &DriverConfig,
        connector: Option<Connector>,
    ) -> Result<(Self::Conn, mpsc::UnboundedReceiver<ConnectEvent>)>;
}

/// One live driver connection
#[async_trait]
pub trait DriverConnection: Send + 'static {
    /// Trivial round-trip query used by pool validation
    async fn ping(&mut self) -> Result<()>;

    /// Request a graceful close and wait for the driver's own closed signal
    async fn close(&mut self) -> Result<()>;
}
