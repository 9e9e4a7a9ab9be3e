/// Session token verification for tenant requests
///
/// Tokens are compact EdDSA JWS strings issued by the identity provider:
/// `base64url(header).base64url(claims).base64url(signature)`.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SESSION_COOKIE: &str = "__session";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Session token missing")]
    Missing,
    #[error("Malformed session token: {0}")]
    Malformed(String),
    #[error("Unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("Invalid public key: {0}")]
    InvalidKey(String),
    #[error("Invalid signature length: expected 64 bytes, got {0}")]
    InvalidSignatureLength(usize),
    #[error("Signature verification failed")]
    VerificationFailed,
    #[error("Session token expired")]
    Expired,
    #[error("Session token not yet valid")]
    NotYetValid,
}

impl AuthError {
    /// Stable code reported to clients in 401 bodies.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::Missing => "token_missing",
            AuthError::Malformed(_) | AuthError::InvalidSignatureLength(_) => "token_malformed",
            AuthError::UnsupportedAlgorithm(_) => "token_algorithm",
            AuthError::InvalidKey(_) => "verifier_misconfigured",
            AuthError::VerificationFailed => "token_invalid",
            AuthError::Expired => "token_expired",
            AuthError::NotYetValid => "token_not_yet_valid",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

/// Claims carried by a verified session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_role: Option<String>,
    #[serde(default)]
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    pub exp: i64,
    /// Factor verification age in minutes: `[first_factor, second_factor]`.
    /// A second factor of `-1` means MFA was not completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fva: Option<[i64; 2]>,
}

impl SessionClaims {
    pub fn mfa_verified(&self) -> bool {
        matches!(self.fva, Some([_, second]) if second >= 0)
    }

    pub fn org(&self) -> Option<&str> {
        self.org_id.as_deref().filter(|o| !o.is_empty())
    }
}

/// Decode a verifying key given as base58 or standard base64.
pub fn decode_verifying_key(encoded: &str) -> Result<VerifyingKey, AuthError> {
    let encoded = encoded.trim();
    let bytes = match bs58::decode(encoded).into_vec() {
        Ok(b) if b.len() == 32 => b,
        _ => STANDARD
            .decode(encoded)
            .map_err(|e| AuthError::InvalidKey(format!("neither base58 nor base64: {}", e)))?,
    };

    let bytes: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| AuthError::InvalidKey(format!("expected 32 bytes, got {}", bytes.len())))?;

    VerifyingKey::from_bytes(&bytes).map_err(|e| AuthError::InvalidKey(e.to_string()))
}

/// Decode a base64url signature segment
pub fn decode_sig_b64url(sig: &str) -> Result<[u8; 64], AuthError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(sig)
        .map_err(|e| AuthError::Malformed(format!("signature: {}", e)))?;

    if bytes.len() != 64 {
        return Err(AuthError::InvalidSignatureLength(bytes.len()));
    }

    let mut result = [0u8; 64];
    result.copy_from_slice(&bytes);
    Ok(result)
}

/// Verify Ed25519 signature
pub fn verify_ed25519(key: &VerifyingKey, message: &[u8], sig: &[u8; 64]) -> bool {
    let signature = Signature::from_bytes(sig);
    key.verify(message, &signature).is_ok()
}

/// Verify a session token and return its claims.
///
/// `now` is unix seconds; `leeway_secs` absorbs clock skew on `exp`/`nbf`.
pub fn verify_session_token(
    token: &str,
    key: &VerifyingKey,
    now: i64,
    leeway_secs: i64,
) -> Result<SessionClaims, AuthError> {
    let mut parts = token.trim().split('.');
    let (header_b64, claims_b64, sig_b64) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(c), Some(s), None) if !h.is_empty() && !c.is_empty() && !s.is_empty() => (h, c, s),
        _ => return Err(AuthError::Malformed("expected three segments".to_string())),
    };

    let header: TokenHeader = decode_segment(header_b64, "header")?;
    if header.alg != "EdDSA" {
        return Err(AuthError::UnsupportedAlgorithm(header.alg));
    }

    let sig = decode_sig_b64url(sig_b64)?;
    let signing_input = format!("{}.{}", header_b64, claims_b64);
    if !verify_ed25519(key, signing_input.as_bytes(), &sig) {
        return Err(AuthError::VerificationFailed);
    }

    let claims: SessionClaims = decode_segment(claims_b64, "claims")?;

    if now > claims.exp + leeway_secs {
        return Err(AuthError::Expired);
    }
    if let Some(nbf) = claims.nbf {
        if now + leeway_secs < nbf {
            return Err(AuthError::NotYetValid);
        }
    }

    Ok(claims)
}

/// Sign claims into a session token. Used for local development sessions
/// and test fixtures; production tokens come from the identity provider.
pub fn encode_session_token(claims: &SessionClaims, key: &SigningKey) -> String {
    let header = TokenHeader {
        alg: "EdDSA".to_string(),
        typ: Some("JWT".to_string()),
    };
    // Serializing plain structs of strings and integers cannot fail.
    let header_json = serde_json::to_vec(&header).unwrap_or_default();
    let claims_json = serde_json::to_vec(claims).unwrap_or_default();

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header_json),
        URL_SAFE_NO_PAD.encode(claims_json)
    );
    let sig = key.sign(signing_input.as_bytes());
    format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(sig.to_bytes()))
}

/// Extract the token from an `Authorization: Bearer <token>` value
pub fn bearer_token(authorization: &str) -> Option<&str> {
    let (scheme, token) = authorization.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Extract a named cookie from a `Cookie` header value
pub fn cookie_value<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str, what: &str) -> Result<T, AuthError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| AuthError::Malformed(format!("{}: {}", what, e)))?;
    serde_json::from_slice(&bytes).map_err(|e| AuthError::Malformed(format!("{}: {}", what, e)))
}
