//! Partition/merge coordination.
//!
//! Two scheduling modes produce the same merged state for the same input
//! set:
//!
//! - **Parallel**: records are dealt round-robin to N scoped worker threads,
//!   each owning its own [`PartitionState`]. The states are joined and folded
//!   together once every worker has drained its channel.
//! - **Streaming**: one thread profiles fixed-size batches into a fresh
//!   state each, folds the batch into the running state and drops it. After
//!   every batch an optional [`CheckpointSink`] persists the running state.
//!
//! Sequence generalization is not done here; it runs exactly once on the
//! merged state when the specification is built.

use crate::accumulate::{AccumulateContext, FieldAccumulator};
use crate::decode::decode;
use crate::input::{InputFailure, Record};
use crate::logging::{event_names, Stage};
use crate::sequence::SequenceProfiler;
use hp_common::{DecodeErrorKind, Error, Result};
use hp_config::{ProfilerConfig, RunMode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

/// Records buffered per worker channel.
const CHANNEL_DEPTH: usize = 256;

/// Record and error counts of one partition.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PartitionCounters {
    pub records: u64,
    pub decoded: u64,
    pub decode_errors: BTreeMap<DecodeErrorKind, u64>,
    /// Lines inside decoded records whose name was not a segment code.
    pub skipped_lines: u64,
}

impl PartitionCounters {
    pub fn decode_error_total(&self) -> u64 {
        self.decode_errors.values().sum()
    }

    fn merge(&mut self, other: &PartitionCounters) {
        self.records += other.records;
        self.decoded += other.decoded;
        self.skipped_lines += other.skipped_lines;
        for (kind, n) in &other.decode_errors {
            *self.decode_errors.entry(*kind).or_insert(0) += n;
        }
    }
}

/// Everything one partition accumulates. Serializable for checkpoints.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PartitionState {
    pub fields: FieldAccumulator,
    pub sequences: SequenceProfiler,
    pub counters: PartitionCounters,
}

impl PartitionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one record and fold it in. Decode failures are counted and
    /// logged by locator and reason only.
    pub fn ingest(&mut self, record: &Record, ctx: &AccumulateContext<'_>) {
        self.counters.records += 1;
        match decode(&record.text, ctx.tables) {
            Ok(msg) => {
                self.counters.decoded += 1;
                self.counters.skipped_lines += msg.skipped_lines as u64;
                self.fields.update(&msg, ctx);
                self.sequences.observe(&msg);
            }
            Err(e) => {
                *self.counters.decode_errors.entry(e.kind).or_insert(0) += 1;
                tracing::debug!(
                    event = event_names::DECODE_FAILED,
                    stage = %Stage::Decode,
                    record = %record.locator(),
                    kind = %e.kind,
                    detail = %e.detail,
                    "record skipped"
                );
            }
        }
    }

    pub fn merge_from(&mut self, other: &PartitionState) {
        self.fields.merge_from(&other.fields);
        self.sequences.merge_from(&other.sequences);
        self.counters.merge(&other.counters);
    }

    /// `merge(a, b) -> c`
    pub fn merge(mut self, other: &PartitionState) -> PartitionState {
        self.merge_from(other);
        self
    }
}

/// Cooperative cancellation shared between the caller and a run.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Persisted streaming progress.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    pub records_consumed: u64,
    pub batches_completed: u64,
    pub state: PartitionState,
}

/// Receives the running state after every streaming batch.
pub trait CheckpointSink {
    fn save(&mut self, checkpoint: &Checkpoint) -> Result<()>;
}

/// Per-partition summary for the run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionSummary {
    pub index: usize,
    pub records: u64,
    pub decoded: u64,
    pub decode_errors: u64,
}

impl PartitionSummary {
    fn of(index: usize, counters: &PartitionCounters) -> Self {
        PartitionSummary {
            index,
            records: counters.records,
            decoded: counters.decoded,
            decode_errors: counters.decode_error_total(),
        }
    }
}

/// Result of driving the input through the partitions.
#[derive(Debug)]
pub struct RunOutcome {
    pub state: PartitionState,
    pub partitions: Vec<PartitionSummary>,
    pub input_errors: Vec<InputFailure>,
    pub batches_completed: u64,
    /// Records skipped because a checkpoint already covered them.
    pub resumed_from: Option<u64>,
    pub interrupted: bool,
}

/// Drives partitions over an input stream.
pub struct Coordinator<'a> {
    ctx: AccumulateContext<'a>,
    config: &'a ProfilerConfig,
    cancel: CancelToken,
}

impl<'a> Coordinator<'a> {
    pub fn new(ctx: AccumulateContext<'a>, config: &'a ProfilerConfig) -> Self {
        Coordinator {
            ctx,
            config,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run in the configured mode. `resume` and `sink` apply to streaming
    /// only.
    pub fn run<I>(
        &self,
        input: I,
        resume: Option<Checkpoint>,
        sink: Option<&mut dyn CheckpointSink>,
    ) -> Result<RunOutcome>
    where
        I: IntoIterator<Item = std::result::Result<Record, InputFailure>>,
    {
        match self.config.mode {
            RunMode::Parallel => self.run_parallel(input),
            RunMode::Streaming => self.run_streaming(input, resume, sink),
        }
    }

    /// Deal records round-robin to worker threads and fold their states.
    pub fn run_parallel<I>(&self, input: I) -> Result<RunOutcome>
    where
        I: IntoIterator<Item = std::result::Result<Record, InputFailure>>,
    {
        let workers = self.config.effective_workers().max(1);
        let ctx = self.ctx;
        tracing::info!(
            event = event_names::RUN_STARTED,
            stage = %Stage::Aggregate,
            mode = "parallel",
            workers,
            "profiling started"
        );

        let mut input_errors = Vec::new();
        let mut interrupted = false;

        let joined: Vec<std::result::Result<PartitionState, usize>> = thread::scope(|scope| {
            let mut senders = Vec::with_capacity(workers);
            let mut handles = Vec::with_capacity(workers);
            for index in 0..workers {
                let (tx, rx) = mpsc::sync_channel::<Record>(CHANNEL_DEPTH);
                senders.push(tx);
                handles.push(scope.spawn(move || {
                    let mut state = PartitionState::new();
                    for record in rx {
                        state.ingest(&record, &ctx);
                    }
                    tracing::debug!(
                        event = event_names::PARTITION_FINISHED,
                        stage = %Stage::Aggregate,
                        partition = index,
                        records = state.counters.records,
                        decoded = state.counters.decoded,
                        "partition finished"
                    );
                    state
                }));
            }

            let mut next = 0usize;
            for item in input {
                if self.cancel.is_cancelled() {
                    interrupted = true;
                    break;
                }
                match item {
                    Ok(record) => {
                        // A closed channel means the worker died; the join reports it.
                        if senders[next % workers].send(record).is_err() {
                            break;
                        }
                        next += 1;
                    }
                    Err(failure) => input_errors.push(failure),
                }
            }
            drop(senders);

            handles
                .into_iter()
                .enumerate()
                .map(|(index, h)| {
                    h.join().map_err(|_| {
                        tracing::error!(partition = index, "partition worker panicked");
                        index
                    })
                })
                .collect()
        });

        if interrupted {
            tracing::warn!(
                event = event_names::RUN_INTERRUPTED,
                stage = %Stage::Aggregate,
                "run interrupted; merging records already dispatched"
            );
        }

        let mut states = Vec::with_capacity(joined.len());
        for result in joined {
            states.push(result.map_err(|partition| Error::WorkerPanicked { partition })?);
        }

        let partitions = states
            .iter()
            .enumerate()
            .map(|(i, s)| PartitionSummary::of(i, &s.counters))
            .collect();
        let state = states
            .iter()
            .fold(PartitionState::new(), |acc, s| acc.merge(s));
        tracing::info!(
            event = event_names::MERGE_FINISHED,
            stage = %Stage::Merge,
            partitions = states.len(),
            records = state.counters.records,
            "partitions merged"
        );

        Ok(RunOutcome {
            state,
            partitions,
            input_errors,
            batches_completed: 0,
            resumed_from: None,
            interrupted,
        })
    }

    /// Profile fixed-size batches sequentially, checkpointing after each.
    pub fn run_streaming<I>(
        &self,
        input: I,
        resume: Option<Checkpoint>,
        mut sink: Option<&mut dyn CheckpointSink>,
    ) -> Result<RunOutcome>
    where
        I: IntoIterator<Item = std::result::Result<Record, InputFailure>>,
    {
        let batch_size = self.config.batch_size.max(1);
        let resumed_from = resume.as_ref().map(|c| c.records_consumed);
        let mut progress = resume.unwrap_or(Checkpoint {
            records_consumed: 0,
            batches_completed: 0,
            state: PartitionState::new(),
        });
        tracing::info!(
            event = event_names::RUN_STARTED,
            stage = %Stage::Aggregate,
            mode = "streaming",
            batch_size,
            resume_at = progress.records_consumed,
            "profiling started"
        );

        let mut input = input.into_iter();
        let mut input_errors = Vec::new();

        let mut skipped = 0u64;
        while skipped < progress.records_consumed {
            match input.next() {
                Some(Ok(_)) => skipped += 1,
                Some(Err(failure)) => input_errors.push(failure),
                None => break,
            }
        }

        let mut interrupted = false;
        loop {
            if self.cancel.is_cancelled() {
                interrupted = true;
                break;
            }

            let mut batch = PartitionState::new();
            let mut taken = 0usize;
            let mut exhausted = false;
            while taken < batch_size {
                match input.next() {
                    Some(Ok(record)) => {
                        batch.ingest(&record, &self.ctx);
                        taken += 1;
                    }
                    Some(Err(failure)) => input_errors.push(failure),
                    None => {
                        exhausted = true;
                        break;
                    }
                }
            }
            if taken == 0 {
                break;
            }

            progress.state.merge_from(&batch);
            progress.records_consumed += taken as u64;
            progress.batches_completed += 1;
            tracing::debug!(
                event = event_names::BATCH_FINISHED,
                stage = %Stage::Aggregate,
                batch = progress.batches_completed,
                records = taken,
                decoded = batch.counters.decoded,
                "batch finished"
            );

            if let Some(sink) = sink.as_deref_mut() {
                sink.save(&progress)?;
            }
            if exhausted {
                break;
            }
        }

        if interrupted {
            tracing::warn!(
                event = event_names::RUN_INTERRUPTED,
                stage = %Stage::Aggregate,
                records_consumed = progress.records_consumed,
                "run interrupted between batches"
            );
        }

        Ok(RunOutcome {
            partitions: vec![PartitionSummary::of(0, &progress.state.counters)],
            state: progress.state,
            input_errors,
            batches_completed: progress.batches_completed,
            resumed_from,
            interrupted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hp_config::SchemaTables;
    use hp_redact::{PhiClassifier, PhiPolicy};

    struct Env {
        tables: SchemaTables,
        phi: PhiClassifier,
    }

    impl Env {
        fn new() -> Self {
            Env {
                tables: SchemaTables::builtin(),
                phi: PhiClassifier::new(&PhiPolicy::default()).unwrap(),
            }
        }

        fn ctx(&self) -> AccumulateContext<'_> {
            AccumulateContext {
                tables: &self.tables,
                phi: &self.phi,
                unique_value_cap: 20,
            }
        }
    }

    fn records(n: usize) -> Vec<std::result::Result<Record, InputFailure>> {
        (0..n)
            .map(|i| {
                let text = if i % 7 == 3 {
                    format!("PID|{}", i)
                } else {
                    format!(
                        "MSH|^~\\&|||||||ADT^A0{}\rPID|{}||{}^^^MRN||Doe^J||19800101|{}",
                        i % 3 + 1,
                        i,
                        i,
                        if i % 2 == 0 { "F" } else { "M" }
                    )
                };
                Ok(Record::in_memory(i, text))
            })
            .collect()
    }

    struct Collect(Vec<Checkpoint>);

    impl CheckpointSink for Collect {
        fn save(&mut self, checkpoint: &Checkpoint) -> Result<()> {
            self.0.push(checkpoint.clone());
            Ok(())
        }
    }

    #[test]
    fn test_parallel_matches_streaming() {
        let env = Env::new();
        let parallel_cfg = ProfilerConfig {
            workers: 3,
            ..ProfilerConfig::default()
        };
        let streaming_cfg = ProfilerConfig {
            mode: RunMode::Streaming,
            batch_size: 4,
            ..ProfilerConfig::default()
        };
        let a = Coordinator::new(env.ctx(), &parallel_cfg)
            .run(records(40), None, None)
            .unwrap();
        let b = Coordinator::new(env.ctx(), &streaming_cfg)
            .run(records(40), None, None)
            .unwrap();
        assert_eq!(a.state, b.state);
        assert_eq!(a.partitions.len(), 3);
        assert_eq!(a.state.counters.records, 40);
        assert_eq!(
            a.state.counters.decode_errors[&DecodeErrorKind::MissingHeader],
            6
        );
        assert_eq!(b.batches_completed, 10);
    }

    #[test]
    fn test_input_errors_are_collected() {
        let env = Env::new();
        let cfg = ProfilerConfig {
            workers: 2,
            ..ProfilerConfig::default()
        };
        let mut input = records(5);
        input.insert(
            2,
            Err(InputFailure {
                path: "/data/broken.hl7".into(),
                message: "permission denied".into(),
            }),
        );
        let out = Coordinator::new(env.ctx(), &cfg).run(input, None, None).unwrap();
        assert_eq!(out.input_errors.len(), 1);
        assert_eq!(out.state.counters.records, 5);
    }

    #[test]
    fn test_streaming_resume_equals_full_run() {
        let env = Env::new();
        let cfg = ProfilerConfig {
            mode: RunMode::Streaming,
            batch_size: 5,
            ..ProfilerConfig::default()
        };
        let full = Coordinator::new(env.ctx(), &cfg)
            .run(records(23), None, None)
            .unwrap();

        let mut sink = Collect(Vec::new());
        Coordinator::new(env.ctx(), &cfg)
            .run(records(23), None, Some(&mut sink))
            .unwrap();
        assert_eq!(sink.0.len(), 5);
        let second = sink.0[1].clone();
        assert_eq!(second.records_consumed, 10);

        let resumed = Coordinator::new(env.ctx(), &cfg)
            .run(records(23), Some(second), None)
            .unwrap();
        assert_eq!(resumed.resumed_from, Some(10));
        assert_eq!(resumed.state, full.state);
        assert_eq!(resumed.batches_completed, 5);
    }

    #[test]
    fn test_cancel_before_start_is_interrupted() {
        let env = Env::new();
        let cancel = CancelToken::new();
        cancel.cancel();
        for mode in [RunMode::Parallel, RunMode::Streaming] {
            let cfg = ProfilerConfig {
                mode,
                workers: 2,
                ..ProfilerConfig::default()
            };
            let out = Coordinator::new(env.ctx(), &cfg)
                .with_cancel(cancel.clone())
                .run(records(10), None, None)
                .unwrap();
            assert!(out.interrupted);
            assert_eq!(out.state.counters.records, 0);
        }
    }

    #[test]
    fn test_partition_of_only_errors_is_valid() {
        let env = Env::new();
        let mut state = PartitionState::new();
        state.ingest(&Record::in_memory(0, "garbage"), &env.ctx());
        assert_eq!(state.counters.decoded, 0);
        assert!(state.fields.is_empty());
        let mut other = PartitionState::new();
        other.ingest(
            &Record::in_memory(1, "MSH|^~\\&|||||||ADT^A01\rPID|1"),
            &env.ctx(),
        );
        let merged = state.clone().merge(&other);
        assert_eq!(merged.fields, other.fields);
        assert_eq!(merged.counters.records, 2);
    }
}
