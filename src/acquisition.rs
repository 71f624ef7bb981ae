//! The acquisition loop.
//!
//! A run walks the configured `gesture x repetition x channel` schedule,
//! pulling exactly one frame per channel off the link, decoding it,
//! feeding it to the assembler, and appending completed records to the
//! session table. The table is flushed after every gesture, so a failure
//! loses at most one gesture's worth of buffered records.
//!
//! The pipeline is single-threaded and synchronous: each read blocks until
//! the device delivers the next frame, and decode/assemble/append happen
//! inline before the next read. Per-frame work is O(1) and dominated by
//! link latency.
//!
//! Any fault aborts the entire run. Retrying a failed read or a misaligned
//! channel mid-protocol risks writing mismatched records into a dataset
//! that is otherwise append-only and trusted, so none of it is retried.

use crate::assembler::{RecordAssembler, RecordState};
use crate::config::AcquisitionConfig;
use crate::error::AcqResult;
use crate::link::read_frame;
use crate::protocol::ChannelFrame;
use crate::record::NUM_CHANNELS;
use crate::store::{FeatureStore, SessionTable};
use chrono::Local;
use std::io::Read;
use tracing::{debug, error, info};

/// Lifecycle of one acquisition run, reported through logs at each
/// transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Nothing established yet.
    Idle,
    /// Link opened and reset, stale input discarded.
    LinkOpen,
    /// Walking the gesture/repetition/channel schedule.
    Acquiring,
    /// All gestures finished and the final flush succeeded.
    Completed,
    /// A codec, assembler, or store fault aborted the run.
    Faulted,
}

/// What a successful run produced.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    /// Identifier of the session table written during the run.
    pub table_id: u32,
    /// Complete records stored across all gestures.
    pub records_stored: usize,
}

/// Run one acquisition session against an open link and an open store.
///
/// Creates a fresh session table (identifier from the store's scan), runs
/// the nested schedule, and flushes on every exit path: on success the
/// final flush is part of completing, on fault the table is still flushed
/// before the error propagates so records from completed gestures survive.
/// The caller owns link and store teardown, which is scope-guaranteed.
pub fn run_session<R: Read + ?Sized>(
    config: &AcquisitionConfig,
    link: &mut R,
    store: &mut FeatureStore,
) -> AcqResult<RunSummary> {
    config.validate()?;

    let table_id = store.next_table_id();
    let session_time = Local::now().format("%d/%m/%Y, %H:%M:%S");
    let mut table = store.create_table(
        table_id,
        &format!("Feature data for session {session_time}"),
    )?;

    info!(table_id, state = ?RunState::Acquiring, "starting acquisition");
    let result = acquire(config, link, &mut table);

    // Flush whatever is buffered regardless of how the schedule ended; a
    // fault must not drop complete records from the current gesture.
    let final_flush = table.flush();

    match (result, final_flush) {
        (Ok(records_stored), Ok(_)) => {
            info!(
                table_id,
                records_stored,
                state = ?RunState::Completed,
                "acquisition completed"
            );
            Ok(RunSummary {
                table_id,
                records_stored,
            })
        }
        (Ok(_), Err(flush_err)) => {
            error!(table_id, state = ?RunState::Faulted, error = %flush_err, "final flush failed");
            Err(flush_err)
        }
        (Err(fault), flush) => {
            if let Err(flush_err) = flush {
                error!(table_id, error = %flush_err, "flush during fault unwind also failed");
            }
            error!(table_id, state = ?RunState::Faulted, error = %fault, "acquisition aborted");
            Err(fault)
        }
    }
}

fn acquire<R: Read + ?Sized>(
    config: &AcquisitionConfig,
    link: &mut R,
    table: &mut SessionTable,
) -> AcqResult<usize> {
    let mut assembler = RecordAssembler::new(config.variant);
    let mut frame_buf = vec![0u8; config.variant.frame_size()];
    let mut stored = 0usize;

    for gesture in 0..config.gestures {
        let label = gesture as u8;
        info!(gesture, name = %config.gesture_name(label), "recording gesture");

        for repetition in 0..config.repetitions {
            debug!(gesture, repetition, "recording repetition");

            for channel in 0..NUM_CHANNELS {
                read_frame(link, &mut frame_buf)?;
                let frame = ChannelFrame::decode(config.variant, &frame_buf)?;
                if let RecordState::Complete(record) = assembler.accept(channel, label, &frame)? {
                    table.append(record);
                    stored += 1;
                }
            }
        }

        // Durability checkpoint: one gesture's records at most are ever
        // lost to a later fault.
        table.flush()?;
    }

    Ok(stored)
}
