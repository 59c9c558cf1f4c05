use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::error::AppError;

const ID_BYTES: usize = 12;
const ID_HEX_LEN: usize = ID_BYTES * 2;

static COUNTER: AtomicU32 = AtomicU32::new(0);

/// Opaque store-assigned identifier, rendered as 24 lowercase hex characters.
///
/// Layout: 4 bytes of big-endian creation seconds, 5 random bytes, then a
/// 3-byte counter so ids minted in the same second stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(try_from = "String", into = "String")]
#[sqlx(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn generate() -> Self {
        let mut bytes = [0u8; ID_BYTES];

        // Wraps in 2106, same as every 32-bit seconds field.
        let seconds = Utc::now().timestamp() as u32;
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());

        let random = Uuid::new_v4();
        bytes[4..9].copy_from_slice(&random.as_bytes()[..5]);

        let count = COUNTER.fetch_add(1, Ordering::Relaxed);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);

        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ObjectId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ID_HEX_LEN || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AppError::ValidationError(format!(
                "'{s}' is not a valid identifier, expected {ID_HEX_LEN} hex characters"
            )));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }
}

impl TryFrom<String> for ObjectId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ObjectId> for String {
    fn from(value: ObjectId) -> Self {
        value.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_ids_are_well_formed() {
        let id = ObjectId::generate();
        assert_eq!(id.as_str().len(), 24);
        assert!(id.as_str().parse::<ObjectId>().is_ok());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let ids: HashSet<ObjectId> = (0..1000).map(|_| ObjectId::generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_parse_normalizes_case() {
        let id: ObjectId = "5F1A2B3C4D5E6F7A8B9C0D1E".parse().unwrap();
        assert_eq!(id.as_str(), "5f1a2b3c4d5e6f7a8b9c0d1e");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "abc", "5f1a2b3c4d5e6f7a8b9c0d1", "zz1a2b3c4d5e6f7a8b9c0d1e", "R1"] {
            assert!(
                matches!(bad.parse::<ObjectId>(), Err(AppError::ValidationError(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_serde_uses_plain_string() {
        let id: ObjectId = "5f1a2b3c4d5e6f7a8b9c0d1e".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"5f1a2b3c4d5e6f7a8b9c0d1e\"");

        let bad: Result<ObjectId, _> = serde_json::from_str("\"nope\"");
        assert!(bad.is_err());
    }
}
