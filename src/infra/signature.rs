use crate::app::ports::{AuthenticatorPort, SignedRequest};
use chrono::{DateTime, Duration, Utc};
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 keyed by the client secret over method, path, timestamp and body.
fn request_mac(
    secret: &str,
    method: &str,
    path: &str,
    timestamp: &str,
    body: &[u8],
) -> Result<HmacSha256, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    for part in [method, path, timestamp] {
        mac.update(part.as_bytes());
        mac.update(b"\n");
    }
    mac.update(body);
    Ok(mac)
}

/// Lowercase hex signature a client sends for a request.
pub fn sign(
    secret: &str,
    method: &str,
    path: &str,
    timestamp: &str,
    body: &[u8],
) -> Result<String, InvalidLength> {
    let mac = request_mac(secret, method, path, timestamp, body)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Checks request signatures made with a per-client shared secret
pub struct SharedSecretAuthenticator {
    clients: HashMap<String, String>,
    max_skew: Duration,
}

impl SharedSecretAuthenticator {
    pub fn new(clients: HashMap<String, String>, max_skew_seconds: i64) -> Self {
        Self {
            clients,
            max_skew: Duration::seconds(max_skew_seconds),
        }
    }

    fn verify_at(&self, request: &SignedRequest<'_>, now: DateTime<Utc>) -> Result<(), &'static str> {
        let client_id = request.client_id.ok_or("missing client header")?;
        let timestamp = request.timestamp.ok_or("missing timestamp header")?;
        let signature = request.signature.ok_or("missing signature header")?;
        let secret = self.clients.get(client_id).ok_or("unknown client")?;

        let sent_at = DateTime::parse_from_rfc3339(timestamp)
            .map_err(|_| "malformed timestamp")?
            .with_timezone(&Utc);
        if (now - sent_at).num_seconds().abs() > self.max_skew.num_seconds() {
            return Err("timestamp outside allowed skew");
        }

        let signature = hex::decode(signature).map_err(|_| "malformed signature")?;
        request_mac(secret, request.method, request.path, timestamp, request.body)
            .map_err(|_| "unusable client secret")?
            .verify_slice(&signature)
            .map_err(|_| "signature mismatch")
    }
}

impl AuthenticatorPort for SharedSecretAuthenticator {
    fn verify(&self, request: &SignedRequest<'_>) -> bool {
        match self.verify_at(request, Utc::now()) {
            Ok(()) => true,
            Err(reason) => {
                debug!(path = %request.path, client = ?request.client_id, reason, "Rejected request signature");
                false
            }
        }
    }
}

/// Accepts everything; installed when `auth.enabled = false`
pub struct OpenAuthenticator;

impl AuthenticatorPort for OpenAuthenticator {
    fn verify(&self, _request: &SignedRequest<'_>) -> bool {
        true
    }
}
