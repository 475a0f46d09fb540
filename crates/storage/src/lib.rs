pub mod conformance;
mod connector;
mod error;
mod memory;
mod record;
mod traits;

pub use connector::{StoreConnector, StoreSettings};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use record::{
    format_timestamp, AttributeValue, Attributes, CoordinationRecord, RecordKey, ATTR_CLUSTER_ID,
    ATTR_NAMESPACE, ATTR_RESULT, ATTR_RUN_ID, ATTR_TEMPLATE, ATTR_TIMESTAMP,
};
pub use traits::CoordinationStore;
