//! # EMG Feature Acquisition Library
//!
//! This crate acquires electromyography (EMG) feature data from an embedded
//! device over a serial byte-stream, decodes the fixed binary wire protocol,
//! assembles per-sample records across channels, and persists them into
//! versioned append-only tables in a single HDF5 dataset file for offline
//! analysis.
//!
//! ## Crate structure
//!
//! - **`config`**: the explicit [`config::AcquisitionConfig`] passed into
//!   the acquisition loop (port, baud, protocol variant, schedule, gesture
//!   names, dataset path), loadable from TOML.
//! - **`protocol`**: the frame codec. Two firmware revisions are supported
//!   as [`protocol::ProtocolVariant`]s: packed 30-byte frames (A) and
//!   alignment-padded 32-byte frames (B).
//! - **`assembler`**: collects one frame per channel into a complete
//!   [`record::FeatureRecord`], detecting channel misalignment under B.
//! - **`store`**: the append-only HDF5 session store — `fset_<id>` tables
//!   under `/features`, an explicit table-id index, flush checkpoints, and
//!   the union read interface consumers use.
//! - **`link`**: serial port open/reset policy per protocol variant and the
//!   exact-frame read primitive.
//! - **`acquisition`**: the synchronous gesture/repetition/channel loop
//!   tying everything together.
//! - **`error`**: the [`error::EmgError`] fault taxonomy. All faults are
//!   fatal to the run; flushed data survives.
//!
//! Classification and visualization are external consumers of
//! [`store::FeatureStore::read_all_records`] and are not part of this crate.

pub mod acquisition;
pub mod assembler;
pub mod config;
pub mod error;
pub mod link;
pub mod protocol;
pub mod record;
pub mod store;

pub use acquisition::{run_session, RunState, RunSummary};
pub use config::{AcquisitionConfig, BaudRate};
pub use error::{AcqResult, EmgError};
pub use protocol::{ChannelFrame, ProtocolVariant};
pub use record::{ChannelFeatures, FeatureRecord, NUM_CHANNELS};
pub use store::{FeatureStore, SessionTable};
