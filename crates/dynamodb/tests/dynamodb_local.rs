//! Store conformance against DynamoDB Local.
//!
//! Run with `cargo test -p rendezvous-dynamodb -- --ignored` while DynamoDB
//! Local listens on `DYNAMODB_ENDPOINT` (default `http://localhost:8000`).
//!
//! A DynamoDB table has one key schema, so run-only keys and run+cluster
//! keys live in two tables; the test store routes each key to its table.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::config::{Credentials, Region};
use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType,
};
use aws_sdk_dynamodb::Client;
use rendezvous_dynamodb::DynamoDbStore;
use rendezvous_store::conformance::run_conformance_suite;
use rendezvous_store::{
    Attributes, CoordinationStore, RecordKey, StoreError, ATTR_CLUSTER_ID, ATTR_RUN_ID,
};

static TABLES: AtomicUsize = AtomicUsize::new(0);

async fn local_client() -> Client {
    let endpoint = std::env::var("DYNAMODB_ENDPOINT")
        .unwrap_or_else(|_| "http://localhost:8000".to_string());
    let config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .endpoint_url(endpoint)
        .credentials_provider(Credentials::new("local", "local", None, None, "dynamodb-local"))
        .load()
        .await;
    Client::new(&config)
}

fn key_element(name: &str, key_type: KeyType) -> (AttributeDefinition, KeySchemaElement) {
    (
        AttributeDefinition::builder()
            .attribute_name(name)
            .attribute_type(ScalarAttributeType::S)
            .build()
            .unwrap(),
        KeySchemaElement::builder()
            .attribute_name(name)
            .key_type(key_type)
            .build()
            .unwrap(),
    )
}

/// Create a fresh pay-per-request table keyed on the run id, plus the
/// cluster id as sort key when `clustered`.
async fn create_table(client: &Client, clustered: bool) -> String {
    let name = format!(
        "rendezvous-{}-{}",
        std::process::id(),
        TABLES.fetch_add(1, Ordering::SeqCst)
    );
    let mut elements = vec![key_element(ATTR_RUN_ID, KeyType::Hash)];
    if clustered {
        elements.push(key_element(ATTR_CLUSTER_ID, KeyType::Range));
    }

    let mut request = client
        .create_table()
        .table_name(&name)
        .billing_mode(BillingMode::PayPerRequest);
    for (definition, schema) in elements {
        request = request.attribute_definitions(definition).key_schema(schema);
    }
    request.send().await.unwrap();
    name
}

/// Routes run-only keys and run+cluster keys to their own tables.
struct SplitTableStore {
    bare: DynamoDbStore,
    clustered: DynamoDbStore,
}

impl SplitTableStore {
    async fn create() -> Self {
        let client = local_client().await;
        let bare = create_table(&client, false).await;
        let clustered = create_table(&client, true).await;
        SplitTableStore {
            bare: DynamoDbStore::new(client.clone(), bare),
            clustered: DynamoDbStore::new(client, clustered),
        }
    }

    fn table_for(&self, key: &RecordKey) -> &DynamoDbStore {
        if key.cluster_id.is_some() {
            &self.clustered
        } else {
            &self.bare
        }
    }
}

#[async_trait]
impl CoordinationStore for SplitTableStore {
    async fn put(&self, key: &RecordKey, attributes: Attributes) -> Result<(), StoreError> {
        self.table_for(key).put(key, attributes).await
    }

    async fn get(&self, key: &RecordKey) -> Result<Option<Attributes>, StoreError> {
        self.table_for(key).get(key).await
    }
}

#[tokio::test]
#[ignore = "requires DynamoDB Local"]
async fn dynamodb_local_passes_conformance_suite() {
    let report = run_conformance_suite(SplitTableStore::create).await;
    assert_eq!(report.failed, 0, "{report}");
    assert!(report.total > 0);
}
