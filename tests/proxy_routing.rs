//! End-to-end creation through a fake proxy
//!
//! A local TCP listener plays the proxy; a driver built for the test obtains
//! its transport from the injected connector and echoes what it reads.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tunnel_wire::auth::TokenProvider;
use tunnel_wire::pool::{
    ConnectEvent, ConnectionPoolManager, Connector, Driver, DriverConfig, DriverConnection,
    PoolConfig, ProxyRoutingConfig,
};
use tunnel_wire::{Error, Result};

struct StaticToken(&'static str);

#[async_trait]
impl TokenProvider for StaticToken {
    async fn fetch_token(&self) -> Result<String> {
        Ok(self.0.to_string())
    }
}

struct FailingToken;

#[async_trait]
impl TokenProvider for FailingToken {
    async fn fetch_token(&self) -> Result<String> {
        Err(Error::CredentialAcquisition("endpoint unreachable".into()))
    }
}

#[derive(Debug)]
struct TunnelConn;

#[async_trait]
impl DriverConnection for TunnelConn {
    async fn ping(&mut self) -> Result<()> {
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Driver that consumes the connector and reports the greeting it reads over
/// the tunnel as the connection's collation
struct TunnelDriver;

#[async_trait]
impl Driver for TunnelDriver {
    type Conn = TunnelConn;

    async fn open(
        &self,
        _config: &DriverConfig,
        connector: Option<Connector>,
    ) -> Result<(Self::Conn, mpsc::UnboundedReceiver<ConnectEvent>)> {
        let connector = connector.expect("proxy routing configured");
        let mut stream = connector().await?;

        let (tx, rx) = mpsc::unbounded_channel();
        let mut greeting = [0u8; 2];
        match stream.read_exact(&mut greeting).await {
            Ok(_) => {
                let _ = tx.send(ConnectEvent::Connected {
                    collation: Some(String::from_utf8_lossy(&greeting).to_string()),
                });
            }
            Err(e) => {
                let _ = tx.send(ConnectEvent::Errored(e.into()));
            }
        }
        Ok((TunnelConn, rx))
    }
}

/// Serve one proxy handshake and greet the tunneled client
async fn serve_proxy(listener: TcpListener) {
    let (mut conn, _) = listener.accept().await.expect("accept");

    let mut offer = [0u8; 3];
    conn.read_exact(&mut offer).await.expect("offer");
    assert_eq!(offer, [0x05, 0x01, 0x80]);
    conn.write_all(&[0x05, 0x80]).await.unwrap();

    let mut header = [0u8; 5];
    conn.read_exact(&mut header).await.expect("auth header");
    assert_eq!(header[0], 0x01);
    let cred_len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]) as usize;
    let mut credential = vec![0u8; cred_len];
    conn.read_exact(&mut credential).await.expect("credential");
    assert_eq!(credential, b"tok-123");
    let mut loc_len = [0u8; 1];
    conn.read_exact(&mut loc_len).await.expect("loc len");
    let mut location = vec![0u8; loc_len[0] as usize];
    conn.read_exact(&mut location).await.expect("location");
    assert_eq!(location, b"loc-1");
    conn.write_all(&[0x01, 0x00]).await.unwrap();

    let mut connect_header = [0u8; 5];
    conn.read_exact(&mut connect_header).await.expect("connect");
    assert_eq!(&connect_header[..4], &[0x05, 0x01, 0x00, 0x03]);
    let mut host = vec![0u8; connect_header[4] as usize];
    conn.read_exact(&mut host).await.expect("host");
    assert_eq!(host, b"db.internal");
    let mut port = [0u8; 2];
    conn.read_exact(&mut port).await.expect("port");
    assert_eq!(u16::from_be_bytes(port), 1433);
    conn.write_all(&[0x05, 0x00]).await.unwrap();

    // Greeting travels over the established tunnel untouched
    conn.write_all(b"ok").await.unwrap();
}

fn proxied_config(proxy_port: u16) -> PoolConfig {
    PoolConfig::new("db.internal")
        .credentials("svc", "pw")
        .proxy(ProxyRoutingConfig {
            proxy_host: "127.0.0.1".to_string(),
            proxy_port,
            location_id: "loc-1".to_string(),
            token_url: "http://127.0.0.1:9/oauth/token".to_string(),
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
        })
}

#[tokio::test]
async fn test_create_tunnels_through_the_proxy() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let proxy_port = listener.local_addr().unwrap().port();
    let proxy = tokio::spawn(serve_proxy(listener));

    let manager = ConnectionPoolManager::new(TunnelDriver, proxied_config(proxy_port))
        .with_token_provider(Arc::new(StaticToken("tok-123")));

    let resource = manager.create().await.expect("create");
    assert_eq!(resource.collation(), Some("ok"));

    proxy.await.unwrap();
}

#[tokio::test]
async fn test_credential_failure_aborts_before_dialing() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let proxy_port = listener.local_addr().unwrap().port();

    let manager = ConnectionPoolManager::new(TunnelDriver, proxied_config(proxy_port))
        .with_token_provider(Arc::new(FailingToken));

    let err = manager.create().await.unwrap_err();
    assert!(matches!(err, Error::CredentialAcquisition(_)));

    // The proxy never saw a connection
    let accepted = tokio::time::timeout(
        std::time::Duration::from_millis(50),
        listener.accept(),
    )
    .await;
    assert!(accepted.is_err());
}

/// Driver used to observe whether a connector was injected
struct RecordingDriver {
    saw_connector: std::sync::Mutex<Option<bool>>,
}

#[async_trait]
impl Driver for RecordingDriver {
    type Conn = TunnelConn;

    async fn open(
        &self,
        _config: &DriverConfig,
        connector: Option<Connector>,
    ) -> Result<(Self::Conn, mpsc::UnboundedReceiver<ConnectEvent>)> {
        *self.saw_connector.lock().unwrap() = Some(connector.is_some());
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(ConnectEvent::Connected { collation: None });
        Ok((TunnelConn, rx))
    }
}

#[tokio::test]
async fn test_direct_connection_gets_no_connector() {
    let driver = RecordingDriver {
        saw_connector: std::sync::Mutex::new(None),
    };
    let manager =
        ConnectionPoolManager::new(driver, PoolConfig::new("db.internal").credentials("svc", "pw"));

    manager.create().await.expect("create");
    assert_eq!(*manager.driver().saw_connector.lock().unwrap(), Some(false));
}

#[tokio::test]
async fn test_proxy_rejection_fails_creation() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let proxy_port = listener.local_addr().unwrap().port();

    let proxy = tokio::spawn(async move {
        let (mut conn, _) = listener.accept().await.expect("accept");
        let mut offer = [0u8; 3];
        conn.read_exact(&mut offer).await.expect("offer");
        // Refuse bearer-token auth
        conn.write_all(&[0x05, 0xFF]).await.unwrap();
    });

    let manager = ConnectionPoolManager::new(TunnelDriver, proxied_config(proxy_port))
        .with_token_provider(Arc::new(StaticToken("tok-123")));

    let err = manager.create().await.unwrap_err();
    assert!(matches!(err, Error::AuthMethodRejected));

    proxy.await.unwrap();
}

#[allow(dead_code)]
fn assert_send<T: Send>() {}

#[test]
fn test_driver_stream_types_are_send() {
    assert_send::<TcpStream>();
    assert_send::<Connector>();
}
