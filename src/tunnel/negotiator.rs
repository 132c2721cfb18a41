//! Core negotiator type

use super::stage::NegotiationStage;
use crate::protocol::{constants, decode_reply, encode_message, StageReply, TunnelMessage};
use crate::{Error, Result};
use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::Instrument;

/// Target coordinates and credential for one tunnel attempt
#[derive(Debug, Clone)]
pub struct TunnelTarget {
    /// Target host name
    pub host: String,
    /// Target port
    pub port: u16,
    /// Opaque bearer credential presented during authentication
    pub credential: String,
    /// Routing/location identifier (may be empty)
    pub location_id: String,
}

impl TunnelTarget {
    /// Create a target with an empty credential and location
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            credential: String::new(),
            location_id: String::new(),
        }
    }

    /// Set the bearer credential
    pub fn credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = credential.into();
        self
    }

    /// Set the routing/location identifier
    pub fn location_id(mut self, location_id: impl Into<String>) -> Self {
        self.location_id = location_id.into();
        self
    }
}

/// Drives the three-stage handshake over a raw stream
///
/// One negotiator per tunnel attempt: `negotiate` consumes it and yields the
/// original stream once the tunnel is established. Each stage writes exactly
/// one message and waits for exactly one two-byte reply; a failed session
/// releases the stream.
pub struct TunnelNegotiator<S> {
    stream: Option<S>,
    stage: NegotiationStage,
    read_buf: BytesMut,
    target: TunnelTarget,
}

impl<S> TunnelNegotiator<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Create a negotiator over a freshly opened stream
    pub fn new(stream: S, target: TunnelTarget) -> Self {
        Self {
            stream: Some(stream),
            stage: NegotiationStage::MethodNegotiation,
            read_buf: BytesMut::with_capacity(64),
            target,
        }
    }

    /// Get the current negotiation stage
    pub fn stage(&self) -> NegotiationStage {
        self.stage
    }

    /// Run the handshake to completion
    ///
    /// Resolves with the stream once the tunnel is established. On any
    /// rejection or stream error the session moves to `Failed` and the stream
    /// is dropped.
    pub async fn negotiate(mut self) -> Result<S> {
        let span = tracing::info_span!(
            "tunnel",
            host = %self.target.host,
            port = self.target.port
        );

        match self.run().instrument(span).await {
            Ok(()) => {
                self.stage.transition(NegotiationStage::Established)?;
                tracing::debug!("tunnel established");
                Ok(self.stream.take().expect("stream held until established"))
            }
            Err(err) => {
                // Terminal stages never transition again; only mark active ones
                if !self.stage.is_terminal() {
                    let _ = self.stage.transition(NegotiationStage::Failed);
                }
                self.stream = None;
                Err(err)
            }
        }
    }

    async fn run(&mut self) -> Result<()> {
        // Stage 1: offer bearer-token auth
        self.send(&TunnelMessage::MethodOffer).await?;
        let reply = self.receive_reply().await?;
        if reply.code != constants::METHOD_BEARER_TOKEN {
            tracing::debug!(code = reply.code, "method offer rejected");
            return Err(Error::AuthMethodRejected);
        }
        self.stage.transition(NegotiationStage::Authentication)?;

        // Stage 2: present the credential
        self.send(&TunnelMessage::AuthRequest {
            credential: self.target.credential.clone(),
            location_id: self.target.location_id.clone(),
        })
        .await?;
        let reply = self.receive_reply().await?;
        if reply.code != constants::reply::SUCCEEDED {
            tracing::debug!(code = reply.code, "credential rejected");
            return Err(Error::ProxyAuthenticationFailed);
        }
        self.stage.transition(NegotiationStage::Connecting)?;

        // Stage 3: open the tunnel to the target
        self.send(&TunnelMessage::ConnectRequest {
            host: self.target.host.clone(),
            port: self.target.port,
        })
        .await?;
        let reply = self.receive_reply().await?;
        if reply.code != constants::reply::SUCCEEDED {
            tracing::debug!(code = reply.code, "connect command rejected");
            return Err(Error::ProxyConnectFailed);
        }

        Ok(())
    }

    /// Send one handshake message
    async fn send(&mut self, msg: &TunnelMessage) -> Result<()> {
        let buf = encode_message(msg)?;
        let stream = self.stream.as_mut().expect("stream not available");
        stream.write_all(&buf).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Receive one two-byte stage reply
    ///
    /// Replies may arrive fragmented across reads; bytes are accumulated
    /// until the reply is complete. Any bytes beyond the second are not
    /// interpreted and are discarded before the next stage's message.
    async fn receive_reply(&mut self) -> Result<StageReply> {
        loop {
            if let Ok((reply, consumed)) = decode_reply(&self.read_buf) {
                self.read_buf.advance(consumed);
                self.read_buf.clear();
                return Ok(reply);
            }

            // Need more data
            let stream = self.stream.as_mut().expect("stream not available");
            let n = stream.read_buf(&mut self.read_buf).await?;
            if n == 0 {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "stream closed during negotiation",
                )));
            }
        }
    }
}

impl TunnelNegotiator<TcpStream> {
    /// Dial the proxy and run the handshake in one step
    pub async fn through_proxy(
        proxy_host: &str,
        proxy_port: u16,
        target: TunnelTarget,
    ) -> Result<TcpStream> {
        let stream = TcpStream::connect((proxy_host, proxy_port)).await?;
        Self::new(stream, target).negotiate().await
    }
}
