//! HTTP transport shared by both protocol versions

use crate::errors::{NotifyError, NotifyResult};
use reqwest::blocking::{Client, Response};
use reqwest::{NoProxy, Proxy};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Connect and read timeout for every room request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("hipchat-notify/", env!("CARGO_PKG_VERSION"));

/// Outbound proxy routing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ProxySettings {
    /// Honour `HTTP(S)_PROXY`/`NO_PROXY` from the process environment
    #[default]
    Environment,
    /// Always connect directly
    None,
    Manual {
        host: String,
        port: u16,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        username: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        password: Option<String>,
        /// Comma separated hosts that bypass the proxy
        #[serde(default, skip_serializing_if = "Option::is_none")]
        no_proxy: Option<String>,
    },
}

impl ProxySettings {
    /// Copy safe for display, with the proxy password masked
    pub fn redacted(&self) -> Self {
        match self {
            ProxySettings::Manual {
                host,
                port,
                username,
                password,
                no_proxy,
            } => ProxySettings::Manual {
                host: host.clone(),
                port: *port,
                username: username.clone(),
                password: password.as_ref().map(|_| "********".to_string()),
                no_proxy: no_proxy.clone(),
            },
            other => other.clone(),
        }
    }
}

/// Build a fresh blocking client.
///
/// Only TLS 1.2 and newer are negotiated. The environment proxy variables
/// are read at construction time, so every publish sees current values.
pub fn build_client(timeout: Duration, proxy: &ProxySettings) -> NotifyResult<Client> {
    let mut builder = Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(timeout)
        .timeout(timeout)
        .min_tls_version(reqwest::tls::Version::TLS_1_2);

    match proxy {
        ProxySettings::Environment => {}
        ProxySettings::None => {
            builder = builder.no_proxy();
        }
        ProxySettings::Manual {
            host,
            port,
            username,
            password,
            no_proxy,
        } => {
            let proxy_url = if host.contains("://") {
                format!("{host}:{port}")
            } else {
                format!("http://{host}:{port}")
            };
            debug!("Routing through proxy {}", proxy_url);

            let mut proxy = Proxy::all(&proxy_url).map_err(|e| {
                NotifyError::config_with_source(format!("Invalid proxy '{proxy_url}'"), e)
            })?;
            if let Some(username) = username.as_deref().filter(|u| !u.is_empty()) {
                proxy = proxy.basic_auth(username, password.as_deref().unwrap_or_default());
            }
            if let Some(no_proxy) = no_proxy {
                proxy = proxy.no_proxy(NoProxy::from_string(no_proxy));
            }
            builder = builder.proxy(proxy);
        }
    }

    builder
        .build()
        .map_err(|source| NotifyError::HttpClient { source })
}

/// Base URL for a configured server.
///
/// A bare host name gets `https://`; anything containing a scheme is used
/// as given.
pub fn server_base_url(server: &str) -> NotifyResult<Url> {
    let server = server.trim().trim_end_matches('/');
    if server.is_empty() {
        return Err(NotifyError::InvalidEndpoint {
            server: server.to_string(),
            reason: "server is empty".to_string(),
        });
    }

    let raw = if server.contains("://") {
        server.to_string()
    } else {
        format!("https://{server}")
    };
    let url = Url::parse(&raw).map_err(|e| NotifyError::InvalidEndpoint {
        server: server.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(NotifyError::InvalidEndpoint {
            server: server.to_string(),
            reason: "not a base URL".to_string(),
        });
    }
    Ok(url)
}

/// `base` with `segments` appended, each one percent-encoded
pub fn endpoint(base: &Url, segments: &[&str]) -> NotifyResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| NotifyError::InvalidEndpoint {
            server: base.to_string(),
            reason: "not a base URL".to_string(),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Status and fully drained body of a response
pub fn drain(room: &str, response: Response) -> NotifyResult<(u16, String)> {
    let status = response.status().as_u16();
    let body = response.text().map_err(|source| NotifyError::Transport {
        room: room.to_string(),
        source,
    })?;
    Ok((status, body))
}
