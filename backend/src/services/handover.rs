//! Handover codes
//!
//! A 4-digit code is issued to the donor once at creation. Only a keyed hash
//! bound to the donation id is stored, and verification is constant-time.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use rand::Rng;
use serde::Deserialize;
use sha2::Sha256;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

pub const MIN_CODE: u16 = 1000;
pub const MAX_CODE: u16 = 9999;

/// Issues and verifies handover codes with a server-side key
#[derive(Clone)]
pub struct HandoverCodes {
    secret: String,
}

/// A code as submitted by a volunteer, either a JSON number or a string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SubmittedCode {
    Number(u64),
    Text(String),
}

impl SubmittedCode {
    /// Numeric value of the submission, compared as a value rather than as text
    pub fn value(&self) -> Option<u64> {
        match self {
            SubmittedCode::Number(n) => Some(*n),
            SubmittedCode::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl HandoverCodes {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Uniformly sample a code in 1000..=9999
    pub fn generate(&self) -> u16 {
        rand::rng().random_range(MIN_CODE..=MAX_CODE)
    }

    fn mac(&self, donation_id: Uuid, code: u64) -> AppResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|_| AppError::Internal("Failed to create HMAC".to_string()))?;
        mac.update(donation_id.as_bytes());
        mac.update(code.to_string().as_bytes());
        Ok(mac)
    }

    /// Hash stored alongside the donation
    pub fn hash(&self, donation_id: Uuid, code: u16) -> AppResult<String> {
        let mac = self.mac(donation_id, u64::from(code))?;
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }

    /// Check a submission against the stored hash
    pub fn verify(&self, donation_id: Uuid, submitted: &SubmittedCode, stored_hash: &str) -> AppResult<bool> {
        let Some(value) = submitted.value() else {
            return Ok(false);
        };
        let Ok(expected) = BASE64.decode(stored_hash) else {
            return Err(AppError::Internal(format!(
                "Stored handover hash for {} is not valid base64",
                donation_id
            )));
        };

        Ok(self.mac(donation_id, value)?.verify_slice(&expected).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_are_four_digits() {
        let codes = HandoverCodes::new("secret");
        for _ in 0..1000 {
            let code = codes.generate();
            assert!((MIN_CODE..=MAX_CODE).contains(&code));
        }
    }

    #[test]
    fn test_verify_accepts_number_and_string() {
        let codes = HandoverCodes::new("secret");
        let id = Uuid::new_v4();
        let hash = codes.hash(id, 4821).unwrap();

        assert!(codes.verify(id, &SubmittedCode::Number(4821), &hash).unwrap());
        assert!(codes.verify(id, &SubmittedCode::Text(" 4821 ".to_string()), &hash).unwrap());
        assert!(!codes.verify(id, &SubmittedCode::Number(4822), &hash).unwrap());
        assert!(!codes.verify(id, &SubmittedCode::Text("abcd".to_string()), &hash).unwrap());
    }

    #[test]
    fn test_hash_is_bound_to_donation_and_key() {
        let codes = HandoverCodes::new("secret");
        let id = Uuid::new_v4();
        let hash = codes.hash(id, 1234).unwrap();

        assert!(!codes.verify(Uuid::new_v4(), &SubmittedCode::Number(1234), &hash).unwrap());
        let other_key = HandoverCodes::new("another-secret");
        assert!(!other_key.verify(id, &SubmittedCode::Number(1234), &hash).unwrap());
    }

    #[test]
    fn test_submitted_code_deserializes_both_shapes() {
        let n: SubmittedCode = serde_json::from_str("1234").unwrap();
        let s: SubmittedCode = serde_json::from_str("\"1234\"").unwrap();
        assert_eq!(n.value(), Some(1234));
        assert_eq!(s.value(), Some(1234));
    }
}
