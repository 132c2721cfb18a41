//! Proxy reply decoding

use super::message::StageReply;
use bytes::BytesMut;
use std::io;

/// Decode a stage reply from the read buffer without cloning
///
/// Replies may arrive fragmented; the caller accumulates received bytes and
/// retries until two are available. Returns the reply and the number of bytes
/// consumed; the caller must advance the buffer afterwards.
///
/// # Returns
/// `Ok((reply, consumed))` - Reply and number of bytes consumed
/// `Err(e)` - IO error if the reply is still incomplete
pub fn decode_reply(data: &BytesMut) -> io::Result<(StageReply, usize)> {
    if data.len() < 2 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "incomplete stage reply",
        ));
    }

    let reply = StageReply {
        version: data[0],
        code: data[1],
    };

    Ok((reply, 2))
}
