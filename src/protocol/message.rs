//! Protocol message types

/// Client message (client → proxy)
#[derive(Debug, Clone)]
pub enum TunnelMessage {
    /// Announce protocol version 5 with bearer-token auth as the single
    /// offered method
    MethodOffer,

    /// Present the bearer credential and an optional routing location
    AuthRequest {
        /// Opaque bearer credential
        credential: String,
        /// Routing/location identifier (may be empty)
        location_id: String,
    },

    /// Ask the proxy to open the tunnel to the target host
    ConnectRequest {
        /// Target host name
        host: String,
        /// Target port
        port: u16,
    },
}

/// Proxy reply (proxy → client)
///
/// Every stage answers with two bytes; only the second is inspected. Bytes
/// beyond the second are not interpreted by this protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageReply {
    /// First reply byte (version or sub-protocol echo)
    pub version: u8,
    /// Second reply byte, the stage outcome code
    pub code: u8,
}
