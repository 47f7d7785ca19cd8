//! Run report assembly and writing.
//!
//! The report wraps the [`Specification`] with everything that varies
//! between runs of the same input (identifiers, timing, scheduling), so the
//! specification itself stays a pure function of the input set.

use crate::coordinator::{PartitionSummary, RunOutcome};
use crate::input::InputFailure;
use crate::logging::{event_names, Stage};
use crate::spec::{SpecBuilder, Specification};
use chrono::{DateTime, Utc};
use hp_common::{DecodeErrorKind, Error, OutputFormat, Result, RunId};
use hp_config::RunMode;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

/// One profiling run, ready to serialize.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub generated_at: DateTime<Utc>,
    pub tool_version: String,
    pub mode: RunMode,
    pub config_hash: String,
    pub records: u64,
    pub decoded: u64,
    pub decode_errors: BTreeMap<DecodeErrorKind, u64>,
    pub skipped_lines: u64,
    pub input_errors: Vec<InputFailure>,
    pub partitions: Vec<PartitionSummary>,
    #[serde(skip_serializing_if = "is_zero")]
    pub batches_completed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resumed_from: Option<u64>,
    pub interrupted: bool,
    pub specification: Specification,
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

impl RunReport {
    /// Build the specification from a finished run. Fails with `NoData` when
    /// no record decoded.
    pub fn assemble(
        outcome: RunOutcome,
        builder: &SpecBuilder<'_>,
        run_id: RunId,
        mode: RunMode,
        config_hash: impl Into<String>,
    ) -> Result<RunReport> {
        let state = &outcome.state;
        let specification = builder
            .build(&state.fields, &state.sequences)
            .ok_or(Error::NoData {
                decode_errors: state.counters.decode_error_total(),
            })?;

        Ok(RunReport {
            run_id,
            generated_at: Utc::now(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            mode,
            config_hash: config_hash.into(),
            records: state.counters.records,
            decoded: state.counters.decoded,
            decode_errors: state.counters.decode_errors.clone(),
            skipped_lines: state.counters.skipped_lines,
            input_errors: outcome.input_errors,
            partitions: outcome.partitions,
            batches_completed: outcome.batches_completed,
            resumed_from: outcome.resumed_from,
            interrupted: outcome.interrupted,
            specification,
        })
    }

    pub fn decode_error_total(&self) -> u64 {
        self.decode_errors.values().sum()
    }

    /// Whether anything was skipped along the way.
    pub fn is_partial(&self) -> bool {
        self.decode_error_total() > 0 || !self.input_errors.is_empty()
    }

    /// One line for quick status checks.
    pub fn summary_line(&self) -> String {
        let mut line = format!(
            "[{}] {} records, {} decoded, {} decode errors, {} message types, {} input errors",
            self.run_id,
            self.records,
            self.decoded,
            self.decode_error_total(),
            self.specification.message_types.len(),
            self.input_errors.len()
        );
        if self.interrupted {
            line.push_str(" (interrupted)");
        }
        line
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {
        Ok(match format {
            OutputFormat::Json => serde_json::to_string_pretty(self)?,
            OutputFormat::Summary => self.summary_line(),
        })
    }
}

/// Write `contents` to a sibling temporary file and rename it into place.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(contents.as_bytes())?;
        file.write_all(b"\n")?;
        file.sync_all()?;
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

/// Write the report to `path`, or to stdout when `path` is `None`.
pub fn write_report(report: &RunReport, format: OutputFormat, path: Option<&Path>) -> Result<()> {
    let rendered = report.render(format)?;
    match path {
        Some(path) => {
            write_atomic(path, &rendered)?;
            tracing::info!(
                event = event_names::OUTPUT_WRITTEN,
                stage = %Stage::Write,
                path = %path.display(),
                format = %format,
                "report written"
            );
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            writeln!(out, "{}", rendered)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::PartitionState;
    use crate::input::Record;
    use crate::accumulate::AccumulateContext;
    use hp_config::{ProfilerConfig, SchemaTables};
    use hp_redact::{PhiClassifier, PhiPolicy};
    use tempfile::tempdir;

    fn outcome(texts: &[&str]) -> RunOutcome {
        let tables = SchemaTables::builtin();
        let phi = PhiClassifier::new(&PhiPolicy::default()).unwrap();
        let ctx = AccumulateContext {
            tables: &tables,
            phi: &phi,
            unique_value_cap: 10,
        };
        let mut state = PartitionState::new();
        for (i, text) in texts.iter().enumerate() {
            state.ingest(&Record::in_memory(i, *text), &ctx);
        }
        RunOutcome {
            partitions: vec![],
            state,
            input_errors: vec![],
            batches_completed: 0,
            resumed_from: None,
            interrupted: false,
        }
    }

    fn assemble(texts: &[&str]) -> Result<RunReport> {
        let tables = SchemaTables::builtin();
        let config = ProfilerConfig::default();
        RunReport::assemble(
            outcome(texts),
            &SpecBuilder::new(&tables, &config),
            RunId::new(),
            RunMode::Parallel,
            "hash",
        )
    }

    #[test]
    fn test_no_decoded_records_is_no_data() {
        let err = assemble(&["garbage", ""]).unwrap_err();
        assert!(matches!(err, Error::NoData { decode_errors: 2 }));
    }

    #[test]
    fn test_report_counts_and_summary() {
        let report = assemble(&["MSH|^~\\&|||||||ADT^A01\rPID|1", "PID|2"]).unwrap();
        assert_eq!(report.records, 2);
        assert_eq!(report.decoded, 1);
        assert!(report.is_partial());
        let line = report.summary_line();
        assert!(line.contains("2 records, 1 decoded, 1 decode errors, 1 message types"));
    }

    #[test]
    fn test_json_report_embeds_specification() {
        let report = assemble(&["MSH|^~\\&|||||||ADT^A01\rPID|1"]).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&report.render(OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["mode"], "parallel");
        assert_eq!(json["specification"]["messages"], 1);
        assert!(json.get("resumed_from").is_none());
    }

    #[test]
    fn test_write_atomic_replaces_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("spec.json");
        fs::write(&path, "old").unwrap();
        write_atomic(&path, "{}").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
