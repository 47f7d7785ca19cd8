//! hl7-profiler: infer a structural specification from a corpus of HL7 v2
//! messages.

use clap::{Args, Parser, Subcommand};
use hp_common::{Error, OutputFormat, RunId, SPEC_SCHEMA_VERSION};
use hp_config::RunMode;
use hp_core::checkpoint::{load_checkpoint, BundleCheckpoint};
use hp_core::context::ProfilerContext;
use hp_core::coordinator::{CancelToken, CheckpointSink, Coordinator};
use hp_core::decode::decode;
use hp_core::exit_codes::ExitCode;
use hp_core::input::{discover, split_records, RecordReader, DEFAULT_EXTENSION};
use hp_core::logging::{event_names, init_logging, LogConfig, LogFormat, LogLevel, Stage};
use hp_core::output::{write_report, RunReport};
use hp_core::spec::SpecBuilder;
use std::path::PathBuf;

/// HL7 v2 structural profiler
#[derive(Parser)]
#[command(name = "hl7-profiler")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr (human or jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Profile a file or directory of HL7 messages
    Run(RunArgs),

    /// Validate configuration and print the effective snapshot
    Check(ConfigArgs),

    /// Decode one file and print the message trees
    Decode(DecodeArgs),

    /// Print version information
    Version,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Tunables file (profiler.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the schema table files
    #[arg(long)]
    schema_dir: Option<PathBuf>,

    /// PHI policy file
    #[arg(long)]
    phi_policy: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Input file or directory
    input: PathBuf,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Sequential fixed-size batches
    #[arg(long, conflicts_with = "parallel")]
    streaming: bool,

    /// Independent worker threads
    #[arg(long)]
    parallel: bool,

    /// Worker threads (0 = available parallelism)
    #[arg(long)]
    workers: Option<usize>,

    /// Records per streaming batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// Only build the combined specification
    #[arg(long)]
    combined_only: bool,

    /// Persist streaming progress to this bundle after every batch
    #[arg(long)]
    checkpoint: Option<PathBuf>,

    /// Continue from the checkpoint instead of starting over
    #[arg(long, requires = "checkpoint")]
    resume: bool,

    /// Extension of input files when INPUT is a directory
    #[arg(long, default_value = DEFAULT_EXTENSION)]
    extension: String,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// File holding one or more messages
    file: PathBuf,

    /// Directory holding the schema table files
    #[arg(long)]
    schema_dir: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let cli_level = if cli.global.quiet {
        Some(LogLevel::Error)
    } else {
        match cli.global.verbose {
            0 => None,
            1 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    };
    init_logging(&LogConfig::from_env(cli_level, cli.global.log_format));

    let exit_code = match cli.command {
        Commands::Run(args) => run_profile(&cli.global, &args),
        Commands::Check(args) => run_check(&cli.global, &args),
        Commands::Decode(args) => run_decode(&cli.global, &args),
        Commands::Version => {
            print_version(&cli.global);
            ExitCode::Clean
        }
    };

    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Command implementations
// ============================================================================

fn run_profile(global: &GlobalOpts, args: &RunArgs) -> ExitCode {
    let ctx = match ProfilerContext::resolve(
        args.config.config.as_deref(),
        args.config.schema_dir.as_deref(),
        args.config.phi_policy.as_deref(),
        |config| {
            if args.streaming {
                config.mode = RunMode::Streaming;
            } else if args.parallel {
                config.mode = RunMode::Parallel;
            }
            if let Some(workers) = args.workers {
                config.workers = workers;
            }
            if let Some(batch_size) = args.batch_size {
                config.batch_size = batch_size;
            }
            if args.combined_only {
                config.combined_only = true;
            }
        },
    ) {
        Ok(ctx) => ctx,
        Err(e) => return output_error(global, &e),
    };

    if args.checkpoint.is_some() && ctx.config.mode != RunMode::Streaming {
        return output_error(
            global,
            &Error::Config("--checkpoint requires streaming mode".to_string()),
        );
    }

    let files = match discover(&args.input, &args.extension) {
        Ok(files) => files,
        Err(e) => return output_error(global, &e),
    };
    let resume = match (&args.checkpoint, args.resume) {
        (Some(path), true) if path.exists() => {
            match load_checkpoint(path, &ctx.snapshot.combined_hash) {
                Ok(checkpoint) => Some(checkpoint),
                Err(e) => return output_error(global, &e),
            }
        }
        (Some(path), true) => {
            tracing::warn!(
                path = %path.display(),
                "no checkpoint to resume from; starting fresh"
            );
            None
        }
        _ => None,
    };

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        if let Err(e) = ctrlc::set_handler(move || cancel.cancel()) {
            tracing::warn!(error = %e, "failed to install interrupt handler");
        }
    }

    let run_id = RunId::new();
    let mut sink = args
        .checkpoint
        .as_ref()
        .map(|path| BundleCheckpoint::new(path, run_id.as_str(), &ctx.snapshot.combined_hash));

    let outcome = match Coordinator::new(ctx.accumulate_context(), &ctx.config)
        .with_cancel(cancel)
        .run(
            RecordReader::new(files),
            resume,
            sink.as_mut().map(|s| s as &mut dyn CheckpointSink),
        ) {
        Ok(outcome) => outcome,
        Err(e) => return output_error(global, &e),
    };
    let interrupted = outcome.interrupted;

    let builder = SpecBuilder::new(&ctx.tables, &ctx.config);
    let report = match RunReport::assemble(
        outcome,
        &builder,
        run_id,
        ctx.config.mode,
        ctx.snapshot.combined_hash.clone(),
    ) {
        Ok(report) => report,
        Err(Error::NoData { .. }) if interrupted => return ExitCode::Interrupted,
        Err(e) => return output_error(global, &e),
    };

    if let Err(e) = write_report(&report, global.format, args.output.as_deref()) {
        return output_error(global, &e);
    }

    tracing::info!(
        event = event_names::RUN_FINISHED,
        stage = %Stage::Write,
        run_id = %report.run_id,
        records = report.records,
        decoded = report.decoded,
        decode_errors = report.decode_error_total(),
        input_errors = report.input_errors.len(),
        interrupted = report.interrupted,
        "run finished"
    );

    if report.interrupted {
        ExitCode::Interrupted
    } else if report.is_partial() {
        ExitCode::PartialDecode
    } else {
        ExitCode::Clean
    }
}

fn run_check(global: &GlobalOpts, args: &ConfigArgs) -> ExitCode {
    let ctx = match ProfilerContext::resolve(
        args.config.as_deref(),
        args.schema_dir.as_deref(),
        args.phi_policy.as_deref(),
        |_| {},
    ) {
        Ok(ctx) => ctx,
        Err(e) => return output_error(global, &e),
    };

    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "status": "ok",
                "effective_workers": ctx.config.effective_workers(),
                "snapshot": ctx.snapshot,
            });
            match serde_json::to_string_pretty(&response) {
                Ok(s) => println!("{}", s),
                Err(e) => return output_error(global, &e.into()),
            }
        }
        OutputFormat::Summary => {
            println!(
                "[{}] config ok: mode={} workers={} cap={} required={} rarity={} (config: {}, schema: {}, phi: {})",
                ctx.snapshot.short_id(),
                ctx.config.mode,
                ctx.config.effective_workers(),
                ctx.config.unique_value_cap,
                ctx.config.required_threshold,
                ctx.config.rarity_threshold,
                ctx.paths.config_source,
                ctx.paths.schema_source,
                ctx.paths.phi_policy_source,
            );
        }
    }
    ExitCode::Clean
}

fn run_decode(global: &GlobalOpts, args: &DecodeArgs) -> ExitCode {
    let ctx = match ProfilerContext::resolve(None, args.schema_dir.as_deref(), None, |_| {}) {
        Ok(ctx) => ctx,
        Err(e) => return output_error(global, &e),
    };
    let bytes = match std::fs::read(&args.file) {
        Ok(bytes) => bytes,
        Err(e) => {
            return output_error(
                global,
                &Error::InputRead {
                    path: args.file.display().to_string(),
                    message: e.to_string(),
                },
            )
        }
    };
    let text = String::from_utf8_lossy(&bytes);

    let mut failed = false;
    let mut decoded = Vec::new();
    for (index, record) in split_records(&text).iter().enumerate() {
        match decode(record, &ctx.tables) {
            Ok(msg) => {
                if global.format == OutputFormat::Summary {
                    println!(
                        "#{} {} ({} segments)",
                        index,
                        msg.message_type,
                        msg.segments.len()
                    );
                }
                decoded.push(serde_json::json!({ "record": index, "message": msg }));
            }
            Err(e) => {
                failed = true;
                if global.format == OutputFormat::Summary {
                    println!("#{} error {}: {}", index, e.kind, e.detail);
                }
                decoded.push(serde_json::json!({
                    "record": index,
                    "error": { "kind": e.kind, "detail": e.detail },
                }));
            }
        }
    }

    if global.format == OutputFormat::Json {
        match serde_json::to_string_pretty(&decoded) {
            Ok(s) => println!("{}", s),
            Err(e) => return output_error(global, &e.into()),
        }
    }

    if failed {
        ExitCode::PartialDecode
    } else {
        ExitCode::Clean
    }
}

fn output_error(global: &GlobalOpts, error: &Error) -> ExitCode {
    let exit_code = ExitCode::from(error);

    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "status": "error",
                "exit_code": exit_code.code_name(),
                "error": {
                    "code": error.code(),
                    "message": error.to_string(),
                    "recoverable": error.is_recoverable(),
                    "remediation": error.remediation(),
                }
            });
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&response).unwrap_or_else(|_| error.to_string())
            );
        }
        OutputFormat::Summary => {
            eprintln!("error {}: {}", error.code(), error);
        }
    }

    exit_code
}

fn print_version(global: &GlobalOpts) {
    match global.format {
        OutputFormat::Json => {
            let version_info = serde_json::json!({
                "hl7_profiler_version": env!("CARGO_PKG_VERSION"),
                "spec_schema_version": SPEC_SCHEMA_VERSION,
                "rust_version": env!("CARGO_PKG_RUST_VERSION"),
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&version_info).unwrap_or_default()
            );
        }
        OutputFormat::Summary => {
            println!("hl7-profiler {}", env!("CARGO_PKG_VERSION"));
            println!("spec schema version: {}", SPEC_SCHEMA_VERSION);
        }
    }
}
