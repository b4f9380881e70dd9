use std::time::Duration;

use tracing_subscriber::EnvFilter;

use crate::error::ClientError;

pub const DEVNET_RPC_URL: &str = "https://api.devnet.solana.com";
pub const MAINNET_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Devnet,
    Mainnet,
}

impl Network {
    pub fn parse(value: &str) -> Result<Self, ClientError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "devnet" => Ok(Network::Devnet),
            "mainnet" | "mainnet-beta" => Ok(Network::Mainnet),
            other => Err(ClientError::Config(format!("unknown network {other:?}"))),
        }
    }

    pub fn default_rpc_url(self) -> &'static str {
        match self {
            Network::Devnet => DEVNET_RPC_URL,
            Network::Mainnet => MAINNET_RPC_URL,
        }
    }
}

impl Default for Network {
    #[cfg(feature = "mainnet")]
    fn default() -> Self {
        Network::Mainnet
    }

    #[cfg(not(feature = "mainnet"))]
    fn default() -> Self {
        Network::Devnet
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub network: Network,
    pub rpc_url: String,
    pub api_url: String,
    /// Winner feed socket; the feed polls only when unset.
    pub ws_url: Option<String>,
    pub api_key: Option<String>,
    pub dev_routes: bool,
    pub http_timeout: Duration,
}

impl Config {
    /// Reads `POOL_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let network = get("POOL_NETWORK").map(|v| Network::parse(&v)).transpose()?.unwrap_or_default();
        let http_timeout = match get("POOL_HTTP_TIMEOUT_SECS") {
            Some(secs) => Duration::from_secs(secs.parse().map_err(|_| {
                ClientError::Config(format!("POOL_HTTP_TIMEOUT_SECS must be whole seconds, got {secs:?}"))
            })?),
            None => DEFAULT_HTTP_TIMEOUT,
        };
        let dev_routes = match get("POOL_DEV_ROUTES").as_deref() {
            None | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => return Err(ClientError::Config(format!("POOL_DEV_ROUTES must be a boolean, got {other:?}"))),
        };

        let config = Self {
            network,
            rpc_url: get("POOL_RPC_URL").unwrap_or_else(|| network.default_rpc_url().to_string()),
            api_url: get("POOL_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            ws_url: get("POOL_WS_URL"),
            api_key: get("POOL_API_KEY"),
            dev_routes,
            http_timeout,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        require_scheme("POOL_RPC_URL", &self.rpc_url, &["http://", "https://"])?;
        require_scheme("POOL_API_URL", &self.api_url, &["http://", "https://"])?;
        if let Some(ws) = &self.ws_url {
            require_scheme("POOL_WS_URL", ws, &["ws://", "wss://"])?;
        }
        if self.http_timeout.is_zero() {
            return Err(ClientError::Config("POOL_HTTP_TIMEOUT_SECS must be positive".to_string()));
        }
        Ok(())
    }
}

fn require_scheme(key: &str, url: &str, schemes: &[&str]) -> Result<(), ClientError> {
    if schemes.iter().any(|s| url.starts_with(s)) {
        Ok(())
    } else {
        Err(ClientError::Config(format!("{key} must start with {}, got {url:?}", schemes.join(" or "))))
    }
}

/// Installs a fmt subscriber filtered by `RUST_LOG`, defaulting to
/// `pool_client=info`. Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pool_client=info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
