//! Tunnel handshake protocol
//!
//! This module handles:
//! * Message layouts for the three-stage handshake
//! * Encoding of client messages
//! * Decoding of proxy replies
//! * Protocol constants

pub mod constants;
mod decode;
mod encode;
mod message;

pub use decode::decode_reply;
pub use encode::encode_message;
pub use message::{StageReply, TunnelMessage};
