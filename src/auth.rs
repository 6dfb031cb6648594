//! Login signing for the private WebSocket connection.
//!
//! Authenticated channels (account, orders) require an in-band `login`
//! operation on the private connection. The signature is an HMAC-SHA256
//! over `timestamp + "GET" + "/users/self/verify"`, base64-encoded, keyed
//! by the API secret.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::prelude::*;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::Result;
use crate::models::{LoginArg, LoginRequest};

/// Fixed verification path signed into every login payload.
const SIGN_PATH: &str = "/users/self/verify";

/// Builds a signed `login` request for the private connection.
///
/// # Errors
///
/// Returns a [`BooksyncError`](crate::BooksyncError) if the system clock
/// reads before the UNIX epoch or the secret cannot key the HMAC.
pub fn login_request(api_key: &str, api_secret: &str, passphrase: &str) -> Result<LoginRequest> {
    let timestamp = unix_timestamp()?;
    let sign = sign(api_secret, &timestamp)?;

    Ok(LoginRequest {
        op: "login".to_string(),
        args: vec![LoginArg {
            api_key: api_key.to_string(),
            passphrase: passphrase.to_string(),
            timestamp,
            sign,
        }],
    })
}

/// Current UNIX time in whole seconds, as the decimal string the login
/// payload expects.
fn unix_timestamp() -> Result<String> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| crate::BooksyncError::Config(format!("system clock before UNIX epoch: {e}")))?;
    Ok(now.as_secs().to_string())
}

/// Computes the login signature.
///
/// Algorithm: `Base64(HMAC-SHA256(secret, timestamp + "GET" + path))`
fn sign(api_secret: &str, timestamp: &str) -> Result<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(api_secret.as_bytes())
        .map_err(|e| crate::BooksyncError::Config(format!("invalid HMAC key: {e}")))?;
    mac.update(format!("{timestamp}GET{SIGN_PATH}").as_bytes());
    let result = mac.finalize().into_bytes();

    Ok(BASE64_STANDARD.encode(result))
}
