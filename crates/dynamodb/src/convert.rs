//! Conversion between rendezvous attributes and DynamoDB item values.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue as DynamoValue;
use rendezvous_store::{format_timestamp, AttributeValue, Attributes, RecordKey, StoreError};

pub(crate) type Item = HashMap<String, DynamoValue>;

/// Timestamps are stored as RFC 3339 strings.
pub(crate) fn to_dynamo(
    key: &RecordKey,
    name: &str,
    value: &AttributeValue,
) -> Result<DynamoValue, StoreError> {
    match value {
        AttributeValue::String(s) => Ok(DynamoValue::S(s.clone())),
        AttributeValue::Null => Ok(DynamoValue::Null(true)),
        AttributeValue::Timestamp(ts) => format_timestamp(*ts).map(DynamoValue::S).map_err(|e| {
            StoreError::Serialization {
                key: key.to_string(),
                message: format!("attribute '{}': {}", name, e),
            }
        }),
    }
}

/// Decode an item. Attribute types other than string and null are not part
/// of the record schema and are dropped.
pub(crate) fn from_item(item: &Item) -> Attributes {
    let mut attrs = Attributes::new();
    for (name, value) in item {
        match value {
            DynamoValue::S(s) => {
                attrs.insert(name.clone(), AttributeValue::String(s.clone()));
            }
            DynamoValue::Null(_) => {
                attrs.insert(name.clone(), AttributeValue::Null);
            }
            other => {
                tracing::trace!(
                    attribute = %name,
                    value = ?other,
                    "ignoring unsupported attribute type"
                );
            }
        }
    }
    attrs
}

/// Key of a `GetItem` / `UpdateItem` request.
pub(crate) fn key_item(key: &RecordKey) -> Item {
    key.to_attributes()
        .into_iter()
        .filter_map(|(name, value)| value.as_str().map(|s| (name, DynamoValue::S(s.to_string()))))
        .collect()
}

/// An `UpdateItem` SET clause with its placeholder maps.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct UpdateClause {
    /// `None` when there is nothing to set beyond the key.
    pub expression: Option<String>,
    pub names: HashMap<String, String>,
    pub values: Item,
}

/// Build the SET clause for an upsert of `attributes` under `key`.
///
/// Key attributes cannot appear in an update expression, so they are
/// skipped; `UpdateItem` writes them from the request key.
pub(crate) fn update_clause(
    key: &RecordKey,
    attributes: &Attributes,
) -> Result<UpdateClause, StoreError> {
    let key_names = key.to_attributes();
    let mut clause = UpdateClause::default();
    let mut assignments = Vec::new();

    for (i, (name, value)) in attributes
        .iter()
        .filter(|(name, _)| !key_names.contains_key(*name))
        .enumerate()
    {
        let name_ph = format!("#a{}", i);
        let value_ph = format!(":v{}", i);
        assignments.push(format!("{} = {}", name_ph, value_ph));
        clause.names.insert(name_ph, name.clone());
        clause.values.insert(value_ph, to_dynamo(key, name, value)?);
    }

    if !assignments.is_empty() {
        clause.expression = Some(format!("SET {}", assignments.join(", ")));
    }
    Ok(clause)
}
