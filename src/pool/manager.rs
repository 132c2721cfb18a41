//! Connection lifecycle orchestration

use super::config::{PoolConfig, ProxyRoutingConfig};
use super::driver::{ConnectEvent, Connector, Driver, DriverConnection};
use super::resource::ConnectionResource;
use super::settlement::Settlement;
use crate::auth::{ClientCredentialsProvider, TokenProvider};
use crate::tunnel::{TunnelNegotiator, TunnelTarget};
use crate::{Error, Result};
use std::sync::Arc;
use tracing::Instrument;

/// Pre-connect hook invoked with the raw driver connection
///
/// Runs before the connect sequence settles, for side-effecting setup such as
/// attaching diagnostic observers. It cannot settle the creation outcome.
pub type BeforeConnect<C> = Box<dyn Fn(&mut C) + Send + Sync>;

/// Orchestrates create / validate / destroy of pooled connections
///
/// Creation produces a ready [`ConnectionResource`] or a typed error, never
/// both; validation reports fitness as a boolean; destruction is idempotent
/// and never fails. When proxy routing is configured, creation first obtains
/// a bearer credential and negotiates a tunnel, then hands the driver the
/// established stream as its transport.
pub struct ConnectionPoolManager<D: Driver> {
    driver: D,
    config: PoolConfig,
    token_provider: Option<Arc<dyn TokenProvider>>,
    before_connect: Option<BeforeConnect<D::Conn>>,
}

impl<D: Driver> ConnectionPoolManager<D> {
    /// Create a manager for the given driver and configuration
    pub fn new(driver: D, config: PoolConfig) -> Self {
        Self {
            driver,
            config,
            token_provider: None,
            before_connect: None,
        }
    }

    /// Override the token provider
    ///
    /// Without an override, a [`ClientCredentialsProvider`] is built from the
    /// proxy routing configuration.
    pub fn with_token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    /// Install a pre-connect hook
    pub fn with_before_connect(
        mut self,
        hook: impl Fn(&mut D::Conn) + Send + Sync + 'static,
    ) -> Self {
        self.before_connect = Some(Box::new(hook));
        self
    }

    /// Access the underlying driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Create a ready connection resource
    ///
    /// Settles on the first terminal signal the driver emits; later signals
    /// for the same attempt are ignored.
    pub async fn create(&self) -> Result<ConnectionResource<D::Conn>> {
        let span = tracing::info_span!("create", server = %self.config.server);

        async {
            let driver_config = self.config.driver_config()?;

            let connector = match &self.config.proxy {
                Some(proxy) => Some(self.tunnel_connector(proxy).await?),
                None => None,
            };

            let (mut conn, mut events) =
                self.driver.open(&driver_config, connector).await?;

            if let Some(hook) = &self.before_connect {
                hook(&mut conn);
            }

            tracing::debug!("connection establishing");

            // First terminal signal wins; the guard drops the rest
            let mut outcome: Settlement<Result<Option<String>>> = Settlement::new();
            while !outcome.is_settled() {
                match events.recv().await {
                    Some(ConnectEvent::Connected { collation }) => {
                        outcome.settle(Ok(collation));
                    }
                    Some(ConnectEvent::Errored(err)) => {
                        outcome.settle(Err(Error::ConnectionFault(err.to_string())));
                    }
                    Some(ConnectEvent::Ended) | None => {
                        outcome.settle(Err(Error::ConnectionAborted));
                    }
                }
            }

            let collation = outcome.into_outcome().expect("settled outcome")?;
            tracing::debug!("connection established");

            Ok(ConnectionResource::new(conn, events, collation))
        }
        .instrument(span)
        .await
    }

    /// Obtain a credential, negotiate the tunnel, and wrap the established
    /// stream as the driver's connector
    async fn tunnel_connector(&self, proxy: &ProxyRoutingConfig) -> Result<Connector> {
        let credential = match &self.token_provider {
            Some(provider) => provider.fetch_token().await?,
            None => {
                ClientCredentialsProvider::new(
                    &proxy.token_url,
                    &proxy.client_id,
                    &proxy.client_secret,
                )
                .fetch_token()
                .await?
            }
        };

        let target = TunnelTarget::new(&self.config.server, self.config.port)
            .credential(credential)
            .location_id(&proxy.location_id);

        let stream =
            TunnelNegotiator::through_proxy(&proxy.proxy_host, proxy.proxy_port, target).await?;

        let connector: Connector = Box::new(move || {
            Box::pin(async move { Ok::<_, Error>(stream) })
        });
        Ok(connector)
    }

    /// Determine fitness of a resource for reuse
    ///
    /// Never fails: an invalid resource is a normal outcome requiring
    /// disposal, not a fault. Closed or errored resources are invalid without
    /// a round trip; otherwise a trivial ping decides, unless validation is
    /// disabled by configuration.
    pub async fn validate(&self, resource: &mut ConnectionResource<D::Conn>) -> bool {
        if let Some(fault) = resource.absorb_events() {
            tracing::warn!(error = %fault, "connection fault");
        }

        if resource.is_closed() || resource.has_error() {
            return false;
        }

        if !self.config.validate_connection {
            return true;
        }

        resource.conn_mut().ping().await.is_ok()
    }

    /// Release a resource, idempotently
    ///
    /// Disposing an already-closed resource is a no-op. Close errors are
    /// discarded; the resource is being abandoned regardless.
    pub async fn destroy(&self, mut resource: ConnectionResource<D::Conn>) {
        if resource.is_closed() {
            tracing::debug!("connection already closed");
            return;
        }

        tracing::debug!("connection destroying");
        if let Err(err) = resource.conn_mut().close().await {
            tracing::debug!(error = %err, "close error discarded");
        }
        resource.mark_closed();
        tracing::debug!("connection destroyed");
    }
}
