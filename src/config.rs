//! Application configuration loaded from environment variables.
//!
//! Credentials **must** be provided via environment variables:
//! - `OKX_API_KEY` — API key for the private connection login
//! - `OKX_API_SECRET` — API secret used to sign the login payload
//! - `OKX_API_PASSPHRASE` — passphrase bound to the API key
//!
//! Optional overrides: `OKX_PUBLIC_WS_URL`, `OKX_PRIVATE_WS_URL`, and
//! `OKX_CHECKSUM_WIDTH` (`signed` or `unsigned`).

use crate::checksum::ChecksumWidth;

/// Default public WebSocket endpoint.
const DEFAULT_PUBLIC_WS_URL: &str = "wss://ws.okx.com:8443/ws/v5/public";

/// Default private (authenticated) WebSocket endpoint.
const DEFAULT_PRIVATE_WS_URL: &str = "wss://ws.okx.com:8443/ws/v5/private";

/// Top-level application configuration.
#[derive(Debug)]
pub struct AppConfig {
    pub okx: OkxConfig,
}

/// OKX-specific configuration values.
#[derive(Debug)]
pub struct OkxConfig {
    pub public_ws_url: String,
    pub private_ws_url: String,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub passphrase: Option<String>,
    /// How the wire checksum integer is interpreted when compared to the
    /// local digest; feed-version dependent.
    pub checksum_width: ChecksumWidth,
}

impl OkxConfig {
    /// `true` when a complete credential set is configured.
    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some() && self.api_secret.is_some() && self.passphrase.is_some()
    }
}

/// Loads the application configuration from environment variables.
///
/// The endpoints default to the production OKX v5 URLs. Credentials are
/// optional (public-data-only mode) but when any credential variable is
/// set all three must be present.
///
/// # Errors
///
/// Returns [`BooksyncError::Config`](crate::BooksyncError::Config) if the
/// credential set is incomplete or `OKX_CHECKSUM_WIDTH` is unrecognized.
pub fn fetch_config() -> crate::Result<AppConfig> {
    let public_ws_url =
        non_empty_var("OKX_PUBLIC_WS_URL").unwrap_or_else(|| DEFAULT_PUBLIC_WS_URL.to_string());
    let private_ws_url =
        non_empty_var("OKX_PRIVATE_WS_URL").unwrap_or_else(|| DEFAULT_PRIVATE_WS_URL.to_string());

    let api_key = non_empty_var("OKX_API_KEY");
    let api_secret = non_empty_var("OKX_API_SECRET");
    let passphrase = non_empty_var("OKX_API_PASSPHRASE");

    let present = [&api_key, &api_secret, &passphrase]
        .iter()
        .filter(|v| v.is_some())
        .count();
    if present != 0 && present != 3 {
        return Err(crate::BooksyncError::Config(
            "incomplete credentials: OKX_API_KEY, OKX_API_SECRET and OKX_API_PASSPHRASE \
             must all be set together"
                .to_string(),
        ));
    }

    let checksum_width = match non_empty_var("OKX_CHECKSUM_WIDTH").as_deref() {
        None | Some("signed") => ChecksumWidth::Signed,
        Some("unsigned") => ChecksumWidth::Unsigned,
        Some(other) => {
            return Err(crate::BooksyncError::Config(format!(
                "OKX_CHECKSUM_WIDTH must be \"signed\" or \"unsigned\", got {other:?}"
            )));
        }
    };

    Ok(AppConfig {
        okx: OkxConfig {
            public_ws_url,
            private_ws_url,
            api_key,
            api_secret,
            passphrase,
            checksum_width,
        },
    })
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper that temporarily sets env vars, runs `f`, then restores originals.
    ///
    /// # Safety
    ///
    /// Tests using this helper must run with `--test-threads=1` or otherwise
    /// ensure no other threads read these env vars concurrently.
    fn with_env<F: FnOnce()>(vars: &[(&str, Option<&str>)], f: F) {
        let originals: Vec<(&str, Option<String>)> = vars
            .iter()
            .map(|(k, _)| (*k, std::env::var(k).ok()))
            .collect();

        for (k, v) in vars {
            // SAFETY: config tests run single-threaded (see test runner config).
            unsafe {
                match v {
                    Some(val) => std::env::set_var(k, val),
                    None => std::env::remove_var(k),
                }
            }
        }

        f();

        for (k, original) in originals {
            // SAFETY: restoring original values, same single-threaded context.
            unsafe {
                match original {
                    Some(val) => std::env::set_var(k, val),
                    None => std::env::remove_var(k),
                }
            }
        }
    }

    const ALL_VARS: [&str; 6] = [
        "OKX_PUBLIC_WS_URL",
        "OKX_PRIVATE_WS_URL",
        "OKX_API_KEY",
        "OKX_API_SECRET",
        "OKX_API_PASSPHRASE",
        "OKX_CHECKSUM_WIDTH",
    ];

    fn cleared() -> Vec<(&'static str, Option<&'static str>)> {
        ALL_VARS.iter().map(|k| (*k, None)).collect()
    }

    #[test]
    fn defaults_without_env_vars() {
        with_env(&cleared(), || {
            let config = fetch_config().unwrap();
            assert_eq!(config.okx.public_ws_url, DEFAULT_PUBLIC_WS_URL);
            assert_eq!(config.okx.private_ws_url, DEFAULT_PRIVATE_WS_URL);
            assert!(!config.okx.has_credentials());
            assert_eq!(config.okx.checksum_width, ChecksumWidth::Signed);
        });
    }

    #[test]
    fn loads_full_credential_set() {
        let mut vars = cleared();
        vars[2] = ("OKX_API_KEY", Some("test-key"));
        vars[3] = ("OKX_API_SECRET", Some("test-secret"));
        vars[4] = ("OKX_API_PASSPHRASE", Some("test-pass"));
        with_env(&vars, || {
            let config = fetch_config().unwrap();
            assert!(config.okx.has_credentials());
            assert_eq!(config.okx.api_key.as_deref(), Some("test-key"));
        });
    }

    #[test]
    fn rejects_partial_credentials() {
        let mut vars = cleared();
        vars[2] = ("OKX_API_KEY", Some("key-only"));
        with_env(&vars, || {
            let err = fetch_config().unwrap_err();
            assert!(err.to_string().contains("incomplete credentials"));
        });
    }

    #[test]
    fn custom_endpoints() {
        let mut vars = cleared();
        vars[0] = ("OKX_PUBLIC_WS_URL", Some("wss://custom.example.com/public"));
        vars[1] = (
            "OKX_PRIVATE_WS_URL",
            Some("wss://custom.example.com/private"),
        );
        with_env(&vars, || {
            let config = fetch_config().unwrap();
            assert_eq!(config.okx.public_ws_url, "wss://custom.example.com/public");
            assert_eq!(
                config.okx.private_ws_url,
                "wss://custom.example.com/private"
            );
        });
    }

    #[test]
    fn parses_unsigned_checksum_width() {
        let mut vars = cleared();
        vars[5] = ("OKX_CHECKSUM_WIDTH", Some("unsigned"));
        with_env(&vars, || {
            let config = fetch_config().unwrap();
            assert_eq!(config.okx.checksum_width, ChecksumWidth::Unsigned);
        });
    }

    #[test]
    fn rejects_unknown_checksum_width() {
        let mut vars = cleared();
        vars[5] = ("OKX_CHECKSUM_WIDTH", Some("64bit"));
        with_env(&vars, || {
            let err = fetch_config().unwrap_err();
            assert!(err.to_string().contains("OKX_CHECKSUM_WIDTH"));
        });
    }

    #[test]
    fn empty_values_treated_as_absent() {
        let vars: Vec<_> = ALL_VARS.iter().map(|k| (*k, Some(""))).collect();
        with_env(&vars, || {
            let config = fetch_config().unwrap();
            assert_eq!(config.okx.public_ws_url, DEFAULT_PUBLIC_WS_URL);
            assert!(!config.okx.has_credentials());
        });
    }
}
