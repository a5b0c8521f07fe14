//! Shared HTTP client construction policy.
//!
//! Centralizes networking defaults so the DOI resolver and adapters stay
//! consistent on timeout, user-agent, compression, and proxy compatibility.

use std::panic::{AssertUnwindSafe, catch_unwind};

use reqwest::Client;
use reqwest::{ClientBuilder, Proxy};
use tracing::warn;

use crate::config::{ClientConfig, ConfigError};
use crate::user_agent;

/// Errors raised while building an HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum HttpClientError {
    /// Querying system proxy settings panicked on both attempts
    #[error("HTTP client construction panicked while initializing networking for {component}")]
    Panicked {
        /// Component that requested the client
        component: String,
    },

    /// reqwest rejected the builder configuration
    #[error("HTTP client construction failed for {component}: {source}")]
    Build {
        /// Component that requested the client
        component: String,
        /// The underlying builder error
        #[source]
        source: reqwest::Error,
    },

    /// The supplied settings failed validation
    #[error("HTTP client settings rejected: {0}")]
    InvalidConfig(#[from] ConfigError),
}

/// Builds an HTTP client using the shared project policy.
///
/// Redirects are followed with reqwest's default limit. `component` is used
/// only for error messages and logging.
///
/// # Errors
///
/// Returns [`HttpClientError::InvalidConfig`] when `config` fails
/// [`ClientConfig::validate`], or another [`HttpClientError`] when client
/// construction fails.
pub fn build_http_client(
    component: &str,
    config: &ClientConfig,
) -> Result<Client, HttpClientError> {
    config.validate()?;

    let user_agent = config
        .user_agent
        .clone()
        .unwrap_or_else(user_agent::default_user_agent);

    match try_build_client(config, &user_agent, false) {
        Ok(client) => Ok(client),
        Err(BuildClientFailure::Panic) => {
            // Some restricted sandbox environments panic when querying system
            // proxy settings. The fallback keeps env-proxy support.
            warn!(
                component,
                "HTTP client hit system proxy panic; using env-proxy fallback builder"
            );
            match try_build_client(config, &user_agent, true) {
                Ok(client) => Ok(client),
                Err(BuildClientFailure::Panic) => Err(HttpClientError::Panicked {
                    component: component.to_string(),
                }),
                Err(BuildClientFailure::Build(source)) => Err(HttpClientError::Build {
                    component: component.to_string(),
                    source,
                }),
            }
        }
        Err(BuildClientFailure::Build(source)) => Err(HttpClientError::Build {
            component: component.to_string(),
            source,
        }),
    }
}

enum BuildClientFailure {
    Panic,
    Build(reqwest::Error),
}

fn try_build_client(
    config: &ClientConfig,
    user_agent: &str,
    disable_system_proxy_lookup: bool,
) -> Result<Client, BuildClientFailure> {
    catch_unwind(AssertUnwindSafe(|| {
        let mut builder = base_builder(config, user_agent);
        if disable_system_proxy_lookup {
            builder = apply_env_proxy_fallback(builder.no_proxy());
        }
        builder.build().map_err(BuildClientFailure::Build)
    }))
    .map_err(|_| BuildClientFailure::Panic)?
}

fn base_builder(config: &ClientConfig, user_agent: &str) -> ClientBuilder {
    Client::builder()
        .connect_timeout(config.connect_timeout())
        .timeout(config.timeout())
        .user_agent(user_agent.to_string())
        .gzip(true)
}

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(proxy) = env_proxy_for_scheme("https")
        && let Ok(resolved) = Proxy::https(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    if let Some(proxy) = env_proxy_for_scheme("http")
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    builder
}

fn env_proxy_for_scheme(scheme: &str) -> Option<String> {
    match scheme {
        "https" => find_first_proxy_var(&["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"]),
        "http" => find_first_proxy_var(&["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"]),
        _ => None,
    }
}

fn find_first_proxy_var(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
