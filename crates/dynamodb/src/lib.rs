//! Amazon DynamoDB backend for `CoordinationStore`.
//!
//! Each coordination record is one item in a single table. The partition key
//! is `AnalysisRunUid`; `ClusterID` joins the key when the record key carries
//! a cluster id, so the table must be created with a matching key schema.
//! Credentials come from the default AWS provider chain (environment,
//! profile, IRSA web identity, instance metadata).
//!
//! Writes use `UpdateItem` with a `SET` clause rather than `PutItem`, so the
//! publisher's identity attributes and the external actor's `Result`
//! attribute never overwrite each other.

mod convert;
mod error;

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::Client;
use rendezvous_store::{
    Attributes, CoordinationStore, RecordKey, StoreConnector, StoreError, StoreSettings,
};

/// A `CoordinationStore` backed by one DynamoDB table.
#[derive(Debug, Clone)]
pub struct DynamoDbStore {
    client: Client,
    table_name: String,
}

impl DynamoDbStore {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        DynamoDbStore {
            client,
            table_name: table_name.into(),
        }
    }

    /// Load AWS configuration for `settings.region` (and optional endpoint
    /// override) and build a client for `settings.table_name`.
    pub async fn connect(settings: &StoreSettings) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()));
        if let Some(endpoint) = &settings.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let config = loader.load().await;
        tracing::debug!(
            table = %settings.table_name,
            region = %settings.region,
            endpoint = ?settings.endpoint_url,
            "created DynamoDB client"
        );
        Self::new(Client::new(&config), &settings.table_name)
    }
}

#[async_trait]
impl CoordinationStore for DynamoDbStore {
    async fn put(&self, key: &RecordKey, attributes: Attributes) -> Result<(), StoreError> {
        let clause = convert::update_clause(key, &attributes)?;

        let mut request = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(convert::key_item(key)));
        if let Some(expression) = clause.expression {
            request = request
                .update_expression(expression)
                .set_expression_attribute_names(Some(clause.names))
                .set_expression_attribute_values(Some(clause.values));
        }

        request.send().await.map_err(error::classify)?;
        tracing::debug!(table = %self.table_name, key = %key, "wrote item");
        Ok(())
    }

    async fn get(&self, key: &RecordKey) -> Result<Option<Attributes>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(convert::key_item(key)))
            .consistent_read(true)
            .send()
            .await
            .map_err(error::classify)?;

        Ok(output.item().map(convert::from_item))
    }
}

/// Connects to DynamoDB for each set of settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamoDbConnector;

#[async_trait]
impl StoreConnector for DynamoDbConnector {
    async fn connect(
        &self,
        settings: &StoreSettings,
    ) -> Result<Arc<dyn CoordinationStore>, StoreError> {
        Ok(Arc::new(DynamoDbStore::connect(settings).await))
    }
}
