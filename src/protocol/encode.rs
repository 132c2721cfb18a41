//! Protocol message encoding

use super::constants::{addr, command, AUTH_VERSION, METHOD_BEARER_TOKEN, PROTOCOL_VERSION, RESERVED};
use super::message::TunnelMessage;
use bytes::{BufMut, BytesMut};
use std::io;

/// Encode a client message into bytes
pub fn encode_message(msg: &TunnelMessage) -> io::Result<BytesMut> {
    let mut buf = BytesMut::new();

    match msg {
        TunnelMessage::MethodOffer => {
            encode_method_offer(&mut buf);
        }
        TunnelMessage::AuthRequest {
            credential,
            location_id,
        } => {
            encode_auth_request(&mut buf, credential, location_id)?;
        }
        TunnelMessage::ConnectRequest { host, port } => {
            encode_connect_request(&mut buf, host, *port)?;
        }
    }

    Ok(buf)
}

fn encode_method_offer(buf: &mut BytesMut) {
    // Version 5, one method, bearer-token auth
    buf.put_u8(PROTOCOL_VERSION);
    buf.put_u8(0x01);
    buf.put_u8(METHOD_BEARER_TOKEN);
}

fn encode_auth_request(buf: &mut BytesMut, credential: &str, location_id: &str) -> io::Result<()> {
    let cred = credential.as_bytes();
    let location = location_id.as_bytes();

    if cred.len() > u32::MAX as usize {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "credential too long for 4-byte length field",
        ));
    }
    if location.len() > u8::MAX as usize {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "location identifier is {} bytes, limit is {}",
                location.len(),
                u8::MAX
            ),
        ));
    }

    buf.put_u8(AUTH_VERSION);
    buf.put_u32(cred.len() as u32);
    buf.put_slice(cred);
    buf.put_u8(location.len() as u8);
    buf.put_slice(location);

    Ok(())
}

fn encode_connect_request(buf: &mut BytesMut, host: &str, port: u16) -> io::Result<()> {
    let host_bytes = host.as_bytes();

    if host_bytes.is_empty() || host_bytes.len() > u8::MAX as usize {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "host name must be 1..={} bytes, got {}",
                u8::MAX,
                host_bytes.len()
            ),
        ));
    }

    buf.put_u8(PROTOCOL_VERSION);
    buf.put_u8(command::CONNECT);
    buf.put_u8(RESERVED);
    buf.put_u8(addr::DOMAIN_NAME);
    buf.put_u8(host_bytes.len() as u8);
    buf.put_slice(host_bytes);
    buf.put_u16(port);

    Ok(())
}
