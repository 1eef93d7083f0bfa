use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Store-assigned identifier of a document.
///
/// Every product, order and voucher gets one on insertion. Products also carry
/// an external stable id, so lookups accept either form; this type only
/// covers the internal one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Creates a new random document ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a document ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Parses a reference that may or may not be an internal id.
    ///
    /// Returns `None` for anything that is not a UUID, which callers treat as
    /// an external id.
    pub fn try_parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for DocumentId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<DocumentId> for Uuid {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

/// Error returned when a string is not a valid document ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDocumentIdError(String);

impl std::fmt::Display for ParseDocumentIdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid document id: {}", self.0)
    }
}

impl std::error::Error for ParseDocumentIdError {}

impl FromStr for DocumentId {
    type Err = ParseDocumentIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_parse(s).ok_or_else(|| ParseDocumentIdError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_id_new_creates_unique_ids() {
        let id1 = DocumentId::new();
        let id2 = DocumentId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn document_id_from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        let id = DocumentId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), uuid);
    }

    #[test]
    fn try_parse_rejects_external_ids() {
        assert!(DocumentId::try_parse("P1").is_none());
        assert!(DocumentId::try_parse("").is_none());

        let id = DocumentId::new();
        assert_eq!(DocumentId::try_parse(&id.to_string()), Some(id));
    }

    #[test]
    fn from_str_reports_bad_input() {
        let err = "not-a-uuid".parse::<DocumentId>().unwrap_err();
        assert_eq!(err.to_string(), "invalid document id: not-a-uuid");
    }

    #[test]
    fn document_id_serializes_as_plain_string() {
        let id = DocumentId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }
}
