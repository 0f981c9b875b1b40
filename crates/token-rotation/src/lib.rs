//! Zero-downtime key rotation for stored OAuth tokens.
//!
//! Works against any persistence layer implementing [`ConnectionStore`]:
//! batches are scanned in stable id order, outdated ciphertext fields are
//! re-encrypted under the ring's current key, and progress converges across
//! repeated invocations — already-current records are skipped on every later
//! pass, so calling the job again is always safe.
//!
//! # Lifecycle
//!
//! 1. An operator ships a new `ENCRYPTION_KEY` + bumped version, demoting the
//!    old key to `ENCRYPTION_KEY_PREVIOUS`. Both generations are now live.
//! 2. [`run_full_key_rotation`] (or repeated [`migrate_batch`] calls from a
//!    scheduler) re-encrypts every stored token under the current key.
//! 3. [`verify_key_rotation`] confirms nothing outdated or unparseable
//!    remains before the previous key is retired.

pub mod error;
pub mod memory;
pub mod migrate;
pub mod store;
pub mod telemetry;
pub mod verify;

pub use error::MigrationError;
pub use memory::InMemoryConnectionStore;
pub use migrate::{
    migrate_batch, run_full_key_rotation, BatchReport, MigrationOptions, RecordFailure,
    DEFAULT_BATCH_SIZE,
};
pub use store::{ConnectionRecord, ConnectionStore, StoreError, TokenUpdate};
pub use verify::{verify_key_rotation, RecordStatus, VerificationReport};
