//! Pooled connection resource

use super::driver::{ConnectEvent, DriverConnection};
use crate::Error;
use tokio::sync::mpsc;

/// One pooled database connection
///
/// Wraps the driver connection together with the lifecycle flags the pool
/// maintains. The pool is the sole mutator of `closed` and `has_error`;
/// validation reads them to route disposal decisions.
#[derive(Debug)]
pub struct ConnectionResource<C> {
    conn: C,
    closed: bool,
    has_error: bool,
    collation: Option<String>,
    events: mpsc::UnboundedReceiver<ConnectEvent>,
    fault_reported: bool,
}

impl<C: DriverConnection> ConnectionResource<C> {
    pub(crate) fn new(
        conn: C,
        events: mpsc::UnboundedReceiver<ConnectEvent>,
        collation: Option<String>,
    ) -> Self {
        Self {
            conn,
            closed: false,
            has_error: false,
            collation,
            events,
            fault_reported: false,
        }
    }

    /// Collation/metadata captured when the connection was established
    pub fn collation(&self) -> Option<&str> {
        self.collation.as_deref()
    }

    /// Whether the connection has been closed
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether a transport error has been recorded on the connection
    pub fn has_error(&self) -> bool {
        self.has_error
    }

    /// Access the underlying driver connection
    pub fn conn_mut(&mut self) -> &mut C {
        &mut self.conn
    }

    /// Drain driver signals buffered since the last check
    ///
    /// Transport churn marks the resource errored so validation recycles it
    /// quietly. Any other error class is returned, once, for upward
    /// reporting. A stream end marks the resource closed.
    pub(crate) fn absorb_events(&mut self) -> Option<Error> {
        let mut fault = None;

        while let Ok(event) = self.events.try_recv() {
            match event {
                ConnectEvent::Errored(err) if err.is_transport_churn() => {
                    self.has_error = true;
                }
                ConnectEvent::Errored(err) => {
                    if !self.fault_reported {
                        self.fault_reported = true;
                        fault = Some(err);
                    }
                }
                ConnectEvent::Ended => {
                    self.closed = true;
                }
                // Duplicate connect signal after settlement, ignored
                ConnectEvent::Connected { .. } => {}
            }
        }

        fault
    }

    pub(crate) fn mark_closed(&mut self) {
        self.closed = true;
    }
}
