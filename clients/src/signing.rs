//! Manager API request signing.
//!
//! Every Manager API request carries `X-Signature`: the lowercase hex
//! HMAC-SHA256 of the exact body bytes, keyed with the casino secret. The body
//! must therefore be serialized once and sent as-is; re-serializing after
//! signing may reorder keys and break the signature.

use crate::error::ClientError;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "X-Signature";

/// Signs request bodies with the casino secret.
#[derive(Clone)]
pub struct RequestSigner {
    secret: Vec<u8>,
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner").finish_non_exhaustive()
    }
}

impl RequestSigner {
    /// Create a signer.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] if the secret is empty.
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, ClientError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(ClientError::Configuration(
                "manager signing secret is empty".to_string(),
            ));
        }
        Ok(Self { secret })
    }

    /// Hex HMAC-SHA256 of `body`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] if the key is rejected by the MAC.
    pub fn sign(&self, body: &[u8]) -> Result<String, ClientError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| ClientError::Configuration(e.to_string()))?;
        mac.update(body);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Constant-time check of a signature, as the platform performs it.
    #[must_use]
    pub fn verify(&self, body: &[u8], signature: &str) -> bool {
        let Ok(expected) = hex::decode(signature) else {
            return false;
        };
        HmacSha256::new_from_slice(&self.secret).is_ok_and(|mut mac| {
            mac.update(body);
            mac.verify_slice(&expected).is_ok()
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn matches_rfc4231_vector() {
        // RFC 4231, test case 2
        let signer = RequestSigner::new("Jefe").unwrap();
        let signature = signer.sign(b"what do ya want for nothing?").unwrap();
        assert_eq!(
            signature,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn signature_depends_on_exact_bytes() {
        let signer = RequestSigner::new("secret").unwrap();
        let a = signer.sign(br#"{"a":1,"b":2}"#).unwrap();
        let b = signer.sign(br#"{"b":2,"a":1}"#).unwrap();
        assert_ne!(a, b);
        assert!(signer.verify(br#"{"a":1,"b":2}"#, &a));
        assert!(!signer.verify(br#"{"a":1,"b":2}"#, &b));
        assert!(!signer.verify(b"", "not-hex"));
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(
            RequestSigner::new(""),
            Err(ClientError::Configuration(_))
        ));
    }
}
