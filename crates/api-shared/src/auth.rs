//! Webhook signature verification.
//!
//! Every delivery from the platform carries an HMAC of the raw request body keyed with the
//! app secret, formatted as `<method>=<hex digest>`. `X-Hub-Signature-256` carries `sha256=`,
//! the older `X-Hub-Signature` carries `sha1=`.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Header carrying the `sha256=` signature.
pub const SIGNATURE_256_HEADER: &str = "x-hub-signature-256";

/// Header carrying the legacy `sha1=` signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature header missing")]
    Missing,
    #[error("signature header malformed: {0}")]
    Malformed(String),
    #[error("unsupported signature method: {0}")]
    UnsupportedMethod(String),
    #[error("signature does not match request body")]
    Mismatch,
}

/// HMAC digest used for a signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignatureMethod {
    Sha1,
    Sha256,
}

impl SignatureMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sha1" => Some(Self::Sha1),
            "sha256" => Some(Self::Sha256),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
        }
    }
}

/// Check a signature header against the raw body.
///
/// # Arguments
/// * `raw_body` - Request body exactly as received
/// * `header` - Value of the signature header, if present
/// * `secret` - App secret
///
/// # Errors
/// Returns a [`SignatureError`] describing why the delivery must be rejected.
pub fn check_signature(
    raw_body: &[u8],
    header: Option<&str>,
    secret: &str,
) -> Result<(), SignatureError> {
    let header = header.ok_or(SignatureError::Missing)?;
    let (method, digest) = header
        .trim()
        .split_once('=')
        .ok_or_else(|| SignatureError::Malformed("expected <method>=<hex digest>".into()))?;

    let method = SignatureMethod::parse(method)
        .ok_or_else(|| SignatureError::UnsupportedMethod(method.to_owned()))?;
    let expected = hex::decode(digest)
        .map_err(|e| SignatureError::Malformed(format!("digest is not hex: {e}")))?;

    let actual = compute(method, raw_body, secret)?;
    if bool::from(actual.ct_eq(&expected)) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// `true` when `header` is a valid signature of `raw_body` under `secret`.
pub fn verify_signature(raw_body: &[u8], header: Option<&str>, secret: &str) -> bool {
    check_signature(raw_body, header, secret).is_ok()
}

/// Produce a signature header value for `raw_body`, e.g. `sha256=ab12...`.
///
/// # Errors
/// Returns [`SignatureError::Malformed`] if the secret cannot key the HMAC.
pub fn sign(
    method: SignatureMethod,
    raw_body: &[u8],
    secret: &str,
) -> Result<String, SignatureError> {
    let digest = compute(method, raw_body, secret)?;
    Ok(format!("{}={}", method.as_str(), hex::encode(digest)))
}

fn compute(
    method: SignatureMethod,
    raw_body: &[u8],
    secret: &str,
) -> Result<Vec<u8>, SignatureError> {
    let key_err = |e: hmac::digest::InvalidLength| SignatureError::Malformed(e.to_string());
    let digest = match method {
        SignatureMethod::Sha1 => {
            let mut mac = Hmac::<Sha1>::new_from_slice(secret.as_bytes()).map_err(key_err)?;
            mac.update(raw_body);
            mac.finalize().into_bytes().to_vec()
        }
        SignatureMethod::Sha256 => {
            let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(key_err)?;
            mac.update(raw_body);
            mac.finalize().into_bytes().to_vec()
        }
    };
    Ok(digest)
}
