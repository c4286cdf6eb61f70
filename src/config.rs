// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values and the
//! [`ServerConfig`] loaded from the environment once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `3001` |
//! | `APP_ENV` | `production` enables `Secure` cookies | `development` |
//! | `FRONTEND_URL` | CORS origin and redirect base | `http://localhost:3000` |
//! | `GITHUB_CLIENT_ID` | GitHub OAuth app client id | Required for the OAuth flow |
//! | `GITHUB_CLIENT_SECRET` | GitHub OAuth app client secret | Required for the OAuth flow |
//! | `GITHUB_REDIRECT_URI` | Callback URL registered with GitHub | `http://localhost:3001/api/auth/github/callback` |
//! | `GITHUB_OAUTH_BASE_URL` | GitHub web endpoint | `https://github.com` |
//! | `GITHUB_API_BASE_URL` | GitHub REST endpoint | `https://api.github.com` |
//! | `SESSION_ENCRYPTION_KEY` | 64 hex chars, AES-256 key for the session cookie | Required |
//! | `ALLOW_INSECURE_SESSION_KEY` | `true` generates an ephemeral key when the key is unset | `false` |
//! | `RPC_URL` | EVM JSON-RPC endpoint of the verifier contract | Optional |
//! | `VERIFIER_CONTRACT_ADDRESS` | Verifier contract address | Optional |
//! | `VERIFIER_PRIVATE_KEY` | Hex key used to submit verifications | Optional (read-only ledger) |
//! | `LEDGER_CONFIRMATION_TIMEOUT_SECS` | Max wait for a verification receipt | `120` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files; both set enables HTTPS | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use alloy::{primitives::Address, signers::local::PrivateKeySigner};

use crate::models::parse_wallet_address;
use crate::session::SessionKey;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const APP_ENV_ENV: &str = "APP_ENV";
pub const FRONTEND_URL_ENV: &str = "FRONTEND_URL";
pub const GITHUB_CLIENT_ID_ENV: &str = "GITHUB_CLIENT_ID";
pub const GITHUB_CLIENT_SECRET_ENV: &str = "GITHUB_CLIENT_SECRET";
pub const GITHUB_REDIRECT_URI_ENV: &str = "GITHUB_REDIRECT_URI";
pub const GITHUB_OAUTH_BASE_URL_ENV: &str = "GITHUB_OAUTH_BASE_URL";
pub const GITHUB_API_BASE_URL_ENV: &str = "GITHUB_API_BASE_URL";

/// Environment variable holding the AES-256 session key (64 hex characters).
///
/// There is no compiled-in fallback. Without it the server refuses to start
/// unless [`ALLOW_INSECURE_SESSION_KEY_ENV`] is set.
pub const SESSION_KEY_ENV: &str = "SESSION_ENCRYPTION_KEY";

/// Explicit local-development opt-in for an ephemeral random session key.
pub const ALLOW_INSECURE_SESSION_KEY_ENV: &str = "ALLOW_INSECURE_SESSION_KEY";

pub const RPC_URL_ENV: &str = "RPC_URL";
pub const VERIFIER_CONTRACT_ENV: &str = "VERIFIER_CONTRACT_ADDRESS";
pub const VERIFIER_PRIVATE_KEY_ENV: &str = "VERIFIER_PRIVATE_KEY";
pub const LEDGER_TIMEOUT_ENV: &str = "LEDGER_CONFIRMATION_TIMEOUT_SECS";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
const DEFAULT_REDIRECT_URI: &str = "http://localhost:3001/api/auth/github/callback";
const DEFAULT_GITHUB_OAUTH_BASE_URL: &str = "https://github.com";
const DEFAULT_GITHUB_API_BASE_URL: &str = "https://api.github.com";
const DEFAULT_LEDGER_TIMEOUT: Duration = Duration::from_secs(120);

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::to_ascii_lowercase).as_deref() {
            Some("production" | "prod") => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

/// Where the session key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKeyMode {
    /// Loaded from `SESSION_ENCRYPTION_KEY`.
    Configured,
    /// Random key generated at startup; sessions die with the process.
    Ephemeral,
}

/// GitHub OAuth application settings.
#[derive(Clone)]
pub struct GitHubOAuthConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub oauth_base_url: String,
    pub api_base_url: String,
}

impl GitHubOAuthConfig {
    /// Both client credentials are present.
    pub fn is_configured(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }
}

impl fmt::Debug for GitHubOAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubOAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("redirect_uri", &self.redirect_uri)
            .field("oauth_base_url", &self.oauth_base_url)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

/// Verifier contract settings. Present only when both the RPC URL and the
/// contract address are configured.
#[derive(Clone)]
pub struct LedgerConfig {
    pub rpc_url: String,
    pub contract_address: Address,
    /// Signer for `verifyUserWallet`; `None` keeps the ledger read-only.
    pub signer: Option<PrivateKeySigner>,
    pub confirmation_timeout: Duration,
}

impl fmt::Debug for LedgerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerConfig")
            .field("rpc_url", &self.rpc_url)
            .field("contract_address", &self.contract_address)
            .field("signer", &self.signer.as_ref().map(|s| s.address()))
            .field("confirmation_timeout", &self.confirmation_timeout)
            .finish()
    }
}

/// PEM certificate and key for HTTPS.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// Complete server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    /// Redirect base, without trailing slash.
    pub frontend_url: String,
    /// Scheme + host + port of `frontend_url`, used as the CORS origin.
    pub frontend_origin: String,
    pub github: GitHubOAuthConfig,
    pub session_key: SessionKey,
    pub session_key_mode: SessionKeyMode,
    pub ledger: Option<LedgerConfig>,
    pub tls: Option<TlsConfig>,
}

/// Configuration errors. All of them abort startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "SESSION_ENCRYPTION_KEY is not set; provide 64 hex characters or opt into an \
         ephemeral development key with ALLOW_INSECURE_SESSION_KEY=true"
    )]
    MissingSessionKey,

    #[error("SESSION_ENCRYPTION_KEY must be exactly 64 hex characters (32 bytes)")]
    InvalidSessionKey,

    #[error("Failed to generate an ephemeral session key")]
    KeyGeneration,

    #[error("Invalid {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty or whitespace-only values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get(PORT_ENV) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                name: PORT_ENV,
                reason: format!("`{raw}` is not a valid port"),
            })?,
            None => DEFAULT_PORT,
        };
        let environment = Environment::parse(get(APP_ENV_ENV).as_deref());

        let frontend_url = get(FRONTEND_URL_ENV)
            .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let parsed_frontend = url::Url::parse(&frontend_url).map_err(|e| ConfigError::InvalidValue {
            name: FRONTEND_URL_ENV,
            reason: e.to_string(),
        })?;
        let frontend_origin = parsed_frontend.origin().ascii_serialization();

        let github = GitHubOAuthConfig {
            client_id: get(GITHUB_CLIENT_ID_ENV),
            client_secret: get(GITHUB_CLIENT_SECRET_ENV),
            redirect_uri: get(GITHUB_REDIRECT_URI_ENV)
                .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
            oauth_base_url: base_url(get(GITHUB_OAUTH_BASE_URL_ENV), DEFAULT_GITHUB_OAUTH_BASE_URL),
            api_base_url: base_url(get(GITHUB_API_BASE_URL_ENV), DEFAULT_GITHUB_API_BASE_URL),
        };

        let insecure_opt_in = get(ALLOW_INSECURE_SESSION_KEY_ENV)
            .is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"));
        let (session_key, session_key_mode) = match get(SESSION_KEY_ENV) {
            Some(hex) => (
                SessionKey::from_hex(&hex).ok_or(ConfigError::InvalidSessionKey)?,
                SessionKeyMode::Configured,
            ),
            None if insecure_opt_in => (
                SessionKey::generate().ok_or(ConfigError::KeyGeneration)?,
                SessionKeyMode::Ephemeral,
            ),
            None => return Err(ConfigError::MissingSessionKey),
        };

        let ledger = load_ledger(&get)?;

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsConfig {
                cert_path: cert.into(),
                key_path: key.into(),
            }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::InvalidValue {
                    name: TLS_CERT_PATH_ENV,
                    reason: "TLS_CERT_PATH and TLS_KEY_PATH must be set together".to_string(),
                })
            }
        };

        Ok(Self {
            host,
            port,
            environment,
            frontend_url,
            frontend_origin,
            github,
            session_key,
            session_key_mode,
            ledger,
            tls,
        })
    }

    /// Socket address to bind.
    pub fn bind_address(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::InvalidValue {
                name: HOST_ENV,
                reason: e.to_string(),
            })
    }

    /// Ledger signer is configured, so callbacks submit verifications.
    pub fn ledger_can_write(&self) -> bool {
        self.ledger.as_ref().is_some_and(|l| l.signer.is_some())
    }
}

fn base_url(value: Option<String>, default: &str) -> String {
    value
        .unwrap_or_else(|| default.to_string())
        .trim_end_matches('/')
        .to_string()
}

fn load_ledger<G>(get: &G) -> Result<Option<LedgerConfig>, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let (rpc_url, contract) = match (get(RPC_URL_ENV), get(VERIFIER_CONTRACT_ENV)) {
        (Some(rpc_url), Some(contract)) => (rpc_url, contract),
        _ => return Ok(None),
    };

    let contract_address = parse_wallet_address(&contract).map_err(|e| ConfigError::InvalidValue {
        name: VERIFIER_CONTRACT_ENV,
        reason: e.to_string(),
    })?;

    let signer = get(VERIFIER_PRIVATE_KEY_ENV)
        .map(|key| {
            let key_bytes = alloy::hex::decode(key.trim_start_matches("0x")).map_err(|e| {
                ConfigError::InvalidValue {
                    name: VERIFIER_PRIVATE_KEY_ENV,
                    reason: e.to_string(),
                }
            })?;
            PrivateKeySigner::from_slice(&key_bytes).map_err(|e| ConfigError::InvalidValue {
                name: VERIFIER_PRIVATE_KEY_ENV,
                reason: e.to_string(),
            })
        })
        .transpose()?;

    let confirmation_timeout = match get(LEDGER_TIMEOUT_ENV) {
        Some(raw) => raw
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .ok_or_else(|| ConfigError::InvalidValue {
                name: LEDGER_TIMEOUT_ENV,
                reason: format!("`{raw}` is not a positive number of seconds"),
            })?,
        None => DEFAULT_LEDGER_TIMEOUT,
    };

    Ok(Some(LedgerConfig {
        rpc_url,
        contract_address,
        signer,
        confirmation_timeout,
    }))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const KEY_HEX: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn missing_session_key_refuses_to_start() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingSessionKey));
    }

    #[test]
    fn insecure_opt_in_generates_ephemeral_key() {
        let config = load(&[(ALLOW_INSECURE_SESSION_KEY_ENV, "true")]).unwrap();
        assert_eq!(config.session_key_mode, SessionKeyMode::Ephemeral);
    }

    #[test]
    fn malformed_session_key_is_rejected_even_with_opt_in() {
        let err = load(&[
            (SESSION_KEY_ENV, "abcd"),
            (ALLOW_INSECURE_SESSION_KEY_ENV, "true"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSessionKey));
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[(SESSION_KEY_ENV, KEY_HEX)]).unwrap();
        assert_eq!(config.port, 3001);
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.frontend_url, "http://localhost:3000");
        assert_eq!(config.frontend_origin, "http://localhost:3000");
        assert_eq!(config.github.api_base_url, "https://api.github.com");
        assert!(!config.github.is_configured());
        assert!(config.ledger.is_none());
        assert!(config.tls.is_none());
        assert_eq!(config.session_key_mode, SessionKeyMode::Configured);
    }

    #[test]
    fn frontend_origin_drops_path_and_trailing_slash() {
        let config = load(&[
            (SESSION_KEY_ENV, KEY_HEX),
            (FRONTEND_URL_ENV, "https://bounty.example.org/app/"),
        ])
        .unwrap();
        assert_eq!(config.frontend_url, "https://bounty.example.org/app");
        assert_eq!(config.frontend_origin, "https://bounty.example.org");
    }

    #[test]
    fn ledger_requires_rpc_and_contract() {
        let only_rpc = load(&[(SESSION_KEY_ENV, KEY_HEX), (RPC_URL_ENV, "http://localhost:8545")])
            .unwrap();
        assert!(only_rpc.ledger.is_none());

        let config = load(&[
            (SESSION_KEY_ENV, KEY_HEX),
            (RPC_URL_ENV, "http://localhost:8545"),
            (VERIFIER_CONTRACT_ENV, "0x5FbDB2315678afecb367f032d93F642f64180aa3"),
        ])
        .unwrap();
        let ledger = config.ledger.as_ref().unwrap();
        assert!(ledger.signer.is_none());
        assert_eq!(ledger.confirmation_timeout, Duration::from_secs(120));
        assert!(!config.ledger_can_write());
    }

    #[test]
    fn ledger_signer_enables_writes() {
        let config = load(&[
            (SESSION_KEY_ENV, KEY_HEX),
            (RPC_URL_ENV, "http://localhost:8545"),
            (VERIFIER_CONTRACT_ENV, "0x5FbDB2315678afecb367f032d93F642f64180aa3"),
            (
                VERIFIER_PRIVATE_KEY_ENV,
                "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
            ),
            (LEDGER_TIMEOUT_ENV, "30"),
        ])
        .unwrap();
        assert!(config.ledger_can_write());
        assert_eq!(
            config.ledger.unwrap().confirmation_timeout,
            Duration::from_secs(30)
        );
    }

    #[test]
    fn invalid_port_is_an_error() {
        let err = load(&[(SESSION_KEY_ENV, KEY_HEX), (PORT_ENV, "http")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: PORT_ENV, .. }));
    }

    #[test]
    fn production_environment_is_recognized() {
        let config = load(&[(SESSION_KEY_ENV, KEY_HEX), (APP_ENV_ENV, "Production")]).unwrap();
        assert!(config.environment.is_production());
    }

    #[test]
    fn tls_paths_must_come_in_pairs() {
        let err = load(&[(SESSION_KEY_ENV, KEY_HEX), (TLS_CERT_PATH_ENV, "/tmp/cert.pem")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
