//! Pool and driver configuration

use crate::{Error, Result};
use std::time::Duration;

/// Default connect and request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default application name reported to the database
const DEFAULT_APP_NAME: &str = "tunnel-wire";

/// Default database port
const DEFAULT_PORT: u16 = 1433;

/// Proxy routing credentials bundle
///
/// Setting this on [`PoolConfig`] is what turns tunneling on; nothing is
/// read from the environment.
#[derive(Debug, Clone)]
pub struct ProxyRoutingConfig {
    /// Proxy host to dial
    pub proxy_host: String,
    /// Proxy port to dial
    pub proxy_port: u16,
    /// Routing/location identifier presented during authentication
    /// (may be empty)
    pub location_id: String,
    /// OAuth token endpoint URL
    pub token_url: String,
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
}

/// Authentication mode handed to the driver
///
/// Picked from which credential fields the caller supplied; pure data,
/// no negotiation happens here.
#[derive(Debug, Clone)]
pub enum AuthMode {
    /// Username/password authentication
    Default {
        /// Login name
        user: Option<String>,
        /// Login password
        password: Option<String>,
    },

    /// NTLM authentication against a Windows domain
    Ntlm {
        /// Login name
        user: Option<String>,
        /// Login password
        password: Option<String>,
        /// Windows domain
        domain: String,
    },

    /// Pre-acquired bearer token authentication
    BearerToken {
        /// Access token
        token: String,
    },
}

/// Assembled configuration handed to the driver
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Database host name
    pub server: String,
    /// Database port; absent when an instance name routes the connection
    pub port: Option<u16>,
    /// Database name
    pub database: Option<String>,
    /// Named instance
    pub instance_name: Option<String>,
    /// Authentication mode
    pub auth: AuthMode,
    /// Encrypt the database session
    pub encrypt: bool,
    /// Skip server certificate verification
    pub trust_server_certificate: bool,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Per-request timeout; `None` means unlimited
    pub request_timeout: Option<Duration>,
    /// Key result rows by column name instead of position
    pub use_column_names: bool,
    /// Application name reported to the database
    pub app_name: String,
}

/// Pool configuration
///
/// Use [`PoolConfig::new`] and the setter methods; [`ConnectionPoolManager`]
/// assembles the [`DriverConfig`] from it at creation time.
///
/// [`ConnectionPoolManager`]: super::ConnectionPoolManager
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Database host name
    pub server: String,
    /// Database port
    pub port: u16,
    /// Database name
    pub database: Option<String>,
    /// Named instance; suppresses the explicit port when set
    pub instance_name: Option<String>,
    /// Login name
    pub user: Option<String>,
    /// Login password
    pub password: Option<String>,
    /// Windows domain; selects NTLM authentication when set
    pub domain: Option<String>,
    /// Pre-acquired access token; selects token authentication when set
    pub token: Option<String>,
    /// Encrypt the database session (default true)
    pub encrypt: Option<bool>,
    /// Skip server certificate verification (default false)
    pub trust_server_certificate: Option<bool>,
    /// Connect timeout (default 15 s)
    pub connect_timeout: Option<Duration>,
    /// Per-request timeout (default 15 s; zero means unlimited)
    pub request_timeout: Option<Duration>,
    /// Key result rows by column name instead of position
    pub use_column_names: bool,
    /// Application name reported to the database
    pub app_name: Option<String>,
    /// Run a round-trip query during validation (default true)
    pub validate_connection: bool,
    /// Optional proxy routing; presence turns on tunneling
    pub proxy: Option<ProxyRoutingConfig>,
}

impl PoolConfig {
    /// Create a configuration for the given server with defaults
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            port: DEFAULT_PORT,
            database: None,
            instance_name: None,
            user: None,
            password: None,
            domain: None,
            token: None,
            encrypt: None,
            trust_server_certificate: None,
            connect_timeout: None,
            request_timeout: None,
            use_column_names: false,
            app_name: None,
            validate_connection: true,
            proxy: None,
        }
    }

    /// Set the database port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the database name
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set login credentials
    pub fn credentials(
        mut self,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    /// Set the Windows domain (selects NTLM authentication)
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Set the connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the per-request timeout; zero means unlimited
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Disable the validation round trip
    pub fn skip_validation(mut self) -> Self {
        self.validate_connection = false;
        self
    }

    /// Route connections through the proxy
    pub fn proxy(mut self, proxy: ProxyRoutingConfig) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Assemble the driver configuration
    pub(crate) fn driver_config(&self) -> Result<DriverConfig> {
        if self.server.is_empty() {
            return Err(Error::Config("server must not be empty".into()));
        }

        let auth = if let Some(domain) = &self.domain {
            AuthMode::Ntlm {
                user: self.user.clone(),
                password: self.password.clone(),
                domain: domain.clone(),
            }
        } else if let Some(token) = &self.token {
            AuthMode::BearerToken {
                token: token.clone(),
            }
        } else {
            AuthMode::Default {
                user: self.user.clone(),
                password: self.password.clone(),
            }
        };

        // An instance name routes the connection; the explicit port is dropped
        let port = if self.instance_name.is_some() {
            None
        } else {
            Some(self.port)
        };

        // A zero request timeout means unlimited
        let request_timeout = match self.request_timeout {
            Some(t) if t.is_zero() => None,
            Some(t) => Some(t),
            None => Some(DEFAULT_TIMEOUT),
        };

        Ok(DriverConfig {
            server: self.server.clone(),
            port,
            database: self.database.clone(),
            instance_name: self.instance_name.clone(),
            auth,
            encrypt: self.encrypt.unwrap_or(true),
            trust_server_certificate: self.trust_server_certificate.unwrap_or(false),
            connect_timeout: self.connect_timeout.unwrap_or(DEFAULT_TIMEOUT),
            request_timeout,
            use_column_names: self.use_column_names,
            app_name: self
                .app_name
                .clone()
                .unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
        })
    }
}
