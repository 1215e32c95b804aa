//! Generated identifiers for new documents.
//!
//! A fresh ID is a random UUID written in bs58check (base58 plus a 4-byte
//! checksum): about 27 alphanumeric characters, never containing the `/`
//! path separator.

use std::fmt;

use uuid::Uuid;

/// Identifier minted for documents created by the diary (meal entries, sets,
/// recipes, foods and `dailyId` fields).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

/// New random ID string for a document about to be written.
pub fn create_id() -> String {
    DocumentId::random().to_string()
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0.as_bytes()).with_check().into_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(create_id(), create_id());
    }

    #[test]
    fn test_display_carries_the_uuid() {
        let id = DocumentId::random();
        let bytes = bs58::decode(id.to_string())
            .with_check(None)
            .into_vec()
            .unwrap();
        assert_eq!(bytes.as_slice(), id.0.as_bytes());
    }

    #[test]
    fn test_create_id_is_path_safe() {
        let id = create_id();
        assert!((20..=30).contains(&id.len()));
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_checksum_rejects_tampering() {
        let mut id = create_id().into_bytes();
        id[0] = if id[0] == b'2' { b'3' } else { b'2' };
        let tampered = String::from_utf8(id).unwrap();
        assert!(bs58::decode(tampered).with_check(None).into_vec().is_err());
    }
}
