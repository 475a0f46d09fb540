use std::collections::BTreeMap;
use std::fmt;

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::StoreError;

/// Partition key attribute: the analysis run UID.
pub const ATTR_RUN_ID: &str = "AnalysisRunUid";
/// Origin cluster attribute; also part of the key when non-empty.
pub const ATTR_CLUSTER_ID: &str = "ClusterID";
pub const ATTR_TEMPLATE: &str = "AnalysisTemplate";
pub const ATTR_NAMESPACE: &str = "Namespace";
pub const ATTR_TIMESTAMP: &str = "Timestamp";
/// Verdict attribute written by the external actor.
pub const ATTR_RESULT: &str = "Result";

/// A typed scalar attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    String(String),
    Null,
    Timestamp(OffsetDateTime),
}

impl AttributeValue {
    pub fn string(value: impl Into<String>) -> Self {
        AttributeValue::String(value.into())
    }

    /// The string payload, if this is a string attribute.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret the value as a timestamp. String attributes are parsed as
    /// RFC 3339, since backends without a native timestamp type store them
    /// that way.
    pub fn as_timestamp(&self) -> Option<OffsetDateTime> {
        match self {
            AttributeValue::Timestamp(ts) => Some(*ts),
            AttributeValue::String(s) => OffsetDateTime::parse(s, &Rfc3339).ok(),
            AttributeValue::Null => None,
        }
    }
}

/// Flat attribute map as stored under one key.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// Identity of a coordination record.
///
/// `cluster_id` is `None` when the caller supplied an empty cluster id, so
/// `("abc", "")` and `("abc", "eu-1")` are distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub run_id: String,
    pub cluster_id: Option<String>,
}

impl RecordKey {
    pub fn new(run_id: impl Into<String>, cluster_id: &str) -> Self {
        RecordKey {
            run_id: run_id.into(),
            cluster_id: if cluster_id.is_empty() {
                None
            } else {
                Some(cluster_id.to_string())
            },
        }
    }

    /// The key attributes as they appear inside a stored item.
    pub fn to_attributes(&self) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert(
            ATTR_RUN_ID.to_string(),
            AttributeValue::string(&self.run_id),
        );
        if let Some(cluster_id) = &self.cluster_id {
            attrs.insert(
                ATTR_CLUSTER_ID.to_string(),
                AttributeValue::string(cluster_id),
            );
        }
        attrs
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cluster_id {
            Some(cluster_id) => write!(f, "{}/{}", self.run_id, cluster_id),
            None => write!(f, "{}", self.run_id),
        }
    }
}

/// The single record type exchanged between the publishing cluster and the
/// external verdict writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinationRecord {
    pub run_id: String,
    pub template_name: String,
    /// May be empty; written as-is.
    pub namespace: String,
    /// May be empty; written as-is.
    pub origin_cluster_id: String,
    pub created_at: OffsetDateTime,
    /// `None` until the external actor sets a string verdict.
    pub result: Option<String>,
}

impl CoordinationRecord {
    pub fn key(&self) -> RecordKey {
        RecordKey::new(&self.run_id, &self.origin_cluster_id)
    }

    /// Identity attributes written by the publisher.
    ///
    /// The verdict attribute is never included, so a publish cannot clobber a
    /// verdict the external actor has already written.
    pub fn identity_attributes(&self) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert(
            ATTR_RUN_ID.to_string(),
            AttributeValue::string(&self.run_id),
        );
        attrs.insert(
            ATTR_TEMPLATE.to_string(),
            AttributeValue::string(&self.template_name),
        );
        attrs.insert(
            ATTR_CLUSTER_ID.to_string(),
            AttributeValue::string(&self.origin_cluster_id),
        );
        attrs.insert(
            ATTR_NAMESPACE.to_string(),
            AttributeValue::string(&self.namespace),
        );
        attrs.insert(
            ATTR_TIMESTAMP.to_string(),
            AttributeValue::Timestamp(self.created_at),
        );
        attrs
    }

    /// Decode a stored item. Missing optional attributes decode as empty
    /// strings; a missing run id or timestamp is a serialization error.
    pub fn from_attributes(attrs: &Attributes) -> Result<Self, StoreError> {
        let text = |name: &str| {
            attrs
                .get(name)
                .and_then(AttributeValue::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let run_id = text(ATTR_RUN_ID);
        if run_id.is_empty() {
            return Err(StoreError::Serialization {
                key: "<unknown>".to_string(),
                message: format!("missing string attribute '{}'", ATTR_RUN_ID),
            });
        }

        let created_at = attrs
            .get(ATTR_TIMESTAMP)
            .and_then(AttributeValue::as_timestamp)
            .ok_or_else(|| StoreError::Serialization {
                key: run_id.clone(),
                message: format!("missing or malformed '{}'", ATTR_TIMESTAMP),
            })?;

        Ok(CoordinationRecord {
            template_name: text(ATTR_TEMPLATE),
            namespace: text(ATTR_NAMESPACE),
            origin_cluster_id: text(ATTR_CLUSTER_ID),
            result: Self::verdict_of(attrs).map(str::to_string),
            run_id,
            created_at,
        })
    }

    /// The verdict carried by a stored item, if any.
    ///
    /// An absent `Result`, an explicit null, and a non-string value all mean
    /// "not ready yet".
    pub fn verdict_of(attrs: &Attributes) -> Option<&str> {
        attrs.get(ATTR_RESULT).and_then(AttributeValue::as_str)
    }
}

/// Format a timestamp the way string-typed backends store it.
pub fn format_timestamp(ts: OffsetDateTime) -> Result<String, time::error::Format> {
    ts.format(&Rfc3339)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn record() -> CoordinationRecord {
        CoordinationRecord {
            run_id: "abc-123".to_string(),
            template_name: "canary-check".to_string(),
            namespace: "payments".to_string(),
            origin_cluster_id: "eu-1".to_string(),
            created_at: datetime!(2025-03-01 12:00:00 UTC),
            result: None,
        }
    }

    #[test]
    fn empty_cluster_id_is_not_part_of_key() {
        let key = RecordKey::new("abc-123", "");
        assert_eq!(key.cluster_id, None);
        assert_eq!(key.to_string(), "abc-123");
        assert!(!key.to_attributes().contains_key(ATTR_CLUSTER_ID));

        let key = RecordKey::new("abc-123", "eu-1");
        assert_eq!(key.to_string(), "abc-123/eu-1");
        assert_eq!(
            key.to_attributes().get(ATTR_CLUSTER_ID),
            Some(&AttributeValue::string("eu-1"))
        );
    }

    #[test]
    fn identity_attributes_never_carry_result() {
        let mut rec = record();
        rec.result = Some("Passed".to_string());
        assert!(!rec.identity_attributes().contains_key(ATTR_RESULT));
    }

    #[test]
    fn decode_identity_attributes() {
        let rec = record();
        let decoded = CoordinationRecord::from_attributes(&rec.identity_attributes()).unwrap();
        assert_eq!(decoded, rec);
    }

    #[test]
    fn decode_accepts_rfc3339_string_timestamp() {
        let mut attrs = record().identity_attributes();
        attrs.insert(
            ATTR_TIMESTAMP.to_string(),
            AttributeValue::string("2025-03-01T12:00:00Z"),
        );
        let decoded = CoordinationRecord::from_attributes(&attrs).unwrap();
        assert_eq!(decoded.created_at, datetime!(2025-03-01 12:00:00 UTC));
    }

    #[test]
    fn decode_without_run_id_fails() {
        let mut attrs = record().identity_attributes();
        attrs.remove(ATTR_RUN_ID);
        assert!(matches!(
            CoordinationRecord::from_attributes(&attrs),
            Err(StoreError::Serialization { .. })
        ));
    }

    #[test]
    fn verdict_absent_null_and_string() {
        let mut attrs = record().identity_attributes();
        assert_eq!(CoordinationRecord::verdict_of(&attrs), None);

        attrs.insert(ATTR_RESULT.to_string(), AttributeValue::Null);
        assert_eq!(CoordinationRecord::verdict_of(&attrs), None);

        attrs.insert(ATTR_RESULT.to_string(), AttributeValue::string("Failed"));
        assert_eq!(CoordinationRecord::verdict_of(&attrs), Some("Failed"));
    }

    #[test]
    fn timestamp_formats_as_rfc3339() {
        let formatted = format_timestamp(datetime!(2025-03-01 12:00:00 UTC)).unwrap();
        assert_eq!(formatted, "2025-03-01T12:00:00Z");
    }
}
