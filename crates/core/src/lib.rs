//! rendezvous-core: the cross-cluster verdict handshake.
//!
//! One analysis attempt publishes a coordination record keyed by its run
//! identifier, then polls the same record at a fixed cadence until an
//! external actor writes a verdict or the poll deadline passes.
//!
//! - [`Publisher`] -- one unconditional upsert under a short deadline
//! - [`VerdictPoller`] -- constant-cadence point reads under its own deadline
//! - [`Verdict`] -- maps the verdict string onto pass / fail
//! - [`Coordinator`] -- sequences the two for a [`HandshakeRequest`]
//!
//! The store is injected as an `Arc<dyn CoordinationStore>`, so the whole
//! protocol runs against `rendezvous_store::MemoryStore` in tests.

pub mod clock;
pub mod coordinator;
pub mod error;
pub mod outcome;
pub mod poller;
pub mod publisher;

pub use clock::{Clock, SystemClock};
pub use coordinator::{Coordinator, HandshakeRequest};
pub use error::CoordinationError;
pub use outcome::{Verdict, PASSED};
pub use poller::{
    PollSettings, VerdictPoller, DEFAULT_POLL_INTERVAL, DEFAULT_POLL_TIMEOUT, MAX_POLL_SECS,
};
pub use publisher::{Publisher, PUBLISH_TIMEOUT};
