use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use wipe_attest::audit::verify::parse_display_offset;
use wipe_attest::crypto::{hash_file, hash_tree, KeyProvider};
use wipe_attest::ui::PassProgress;
use wipe_attest::*;

#[derive(Parser)]
#[command(name = "wipe-attest")]
#[command(about = "Secure erase with a signed, verifiable audit trail")]
#[command(version = "1.0.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Configuration file (TOML)
    #[arg(long, global = true, env = "WIPE_ATTEST_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the SHA-256 content hash of a file, device or directory tree
    Hash {
        path: PathBuf,

        /// Hash a directory tree (sorted relative paths and file hashes)
        #[arg(long)]
        tree: bool,
    },

    /// Erase a target, then sign and record its destruction
    Wipe {
        path: PathBuf,

        /// What kind of target this is
        #[arg(short, long, value_enum, default_value = "file")]
        kind: KindArg,

        /// Content hash recorded for the target (computed when omitted)
        #[arg(long)]
        hash: Option<String>,

        /// Random passes for files before the final zero pass
        #[arg(short, long)]
        passes: Option<u32>,

        /// Check the target and plan passes without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Look up a content hash in the wipe ledger
    Verify {
        hash: String,

        /// Display offset for the deletion time, e.g. +05:30 or UTC
        #[arg(long, allow_hyphen_values = true)]
        offset: Option<String>,
    },

    /// Check the signature of a signed wipe artifact
    CheckArtifact { path: PathBuf },

    /// List every record in the wipe ledger
    History {
        /// Display offset for the deletion time
        #[arg(long, allow_hyphen_values = true)]
        offset: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    File,
    Tree,
    Device,
    Ssd,
}

impl From<KindArg> for TargetKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::File => TargetKind::File,
            KindArg::Tree => TargetKind::DirectoryTree,
            KindArg::Device => TargetKind::BlockDevice,
            KindArg::Ssd => TargetKind::SSD,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.debug);
    if !cfg!(feature = "color-output") {
        colored::control::set_override(false);
    }

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("wipe_attest=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wipe_attest=info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut loader = SettingsLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_config_path(path);
    }
    let mut settings = loader.load()?;

    match cli.command {
        Commands::Hash { path, tree } => {
            let digest = if tree {
                hash_tree(&path)
            } else {
                hash_file(&path)
            }
            .with_context(|| format!("Failed to hash {}", path.display()))?;
            println!("{}  {}", digest, path.display());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Wipe {
            path,
            kind,
            hash,
            passes,
            dry_run,
            yes,
        } => {
            if let Some(passes) = passes {
                settings.passes = passes;
            }
            settings.dry_run |= dry_run;
            settings.validate()?;

            let target = WipeTarget::new(path, kind.into());
            wipe(&settings, &target, hash, yes)
        }
        Commands::Verify { hash, offset } => {
            if let Some(offset) = offset {
                settings.display_offset = offset;
            }
            verify(&settings, &hash)
        }
        Commands::CheckArtifact { path } => check_artifact(&settings, &path),
        Commands::History { offset } => {
            if let Some(offset) = offset {
                settings.display_offset = offset;
            }
            history(&settings)
        }
    }
}

fn wipe(
    settings: &Settings,
    target: &WipeTarget,
    hash: Option<String>,
    yes: bool,
) -> Result<ExitCode> {
    let options = settings.erase_options();
    let dry_run = options.mode == EraseMode::DryRun;
    let raw_device = matches!(target.kind(), TargetKind::BlockDevice | TargetKind::SSD);

    if raw_device && !dry_run {
        if !is_root() {
            bail!("{} wipes require root privileges", target.kind());
        }
        if !yes {
            bail!(
                "refusing to wipe {} {} without --yes",
                target.kind(),
                target.path().display()
            );
        }
    }
    if !dry_run && !yes && !confirm_destruction(target)? {
        println!("Aborted; nothing was written.");
        return Ok(ExitCode::FAILURE);
    }

    let engine = EraseEngine::new();
    setup_signal_handlers(engine.cancel_token())?;

    if dry_run {
        let mut progress = PassProgress::hidden();
        let report = engine.erase_observed(target, &options, &mut progress)?;
        print_report(&report);
        println!(
            "{}",
            "Dry run: nothing was written and nothing was recorded.".yellow()
        );
        return Ok(ExitCode::SUCCESS);
    }

    let content_hash = match hash {
        Some(hash) => hash,
        None => compute_content_hash(target)?,
    };
    println!("Content hash: {}", content_hash);

    let orchestrator = WipeOrchestrator::new(settings, engine, settings.key_provider());
    let worker_target = target.clone();
    let started = Instant::now();

    // The signal thread only flips the cancel token; the wipe runs on this worker
    let worker = thread::Builder::new()
        .name("wipe-worker".to_string())
        .spawn(move || {
            let mut progress = PassProgress::new();
            let result = orchestrator.execute_observed(
                &worker_target,
                &content_hash,
                &options,
                &mut progress,
            );
            match &result {
                Ok(_) => progress.finish("done"),
                Err(_) => progress.abandon("stopped"),
            }
            result
        })
        .context("Failed to start wipe worker")?;

    let outcome = worker
        .join()
        .map_err(|_| anyhow!("wipe worker panicked"))??;

    let elapsed = Duration::from_secs(started.elapsed().as_secs());
    println!();
    println!("{}", "Wipe completed and attested".green().bold());
    print_report(&outcome.report);
    println!("  File name:    {}", outcome.record.file_name);
    println!("  File hash:    {}", outcome.record.file_hash);
    println!("  Deleted at:   {}", outcome.record.deleted_at);
    println!("  Ledger:       {} record(s)", outcome.ledger_len);
    println!("  Signed JSON:  {}", outcome.artifacts.signed_json.display());
    println!("  Report:       {}", outcome.artifacts.rendered.display());
    println!("  Elapsed:      {}", humantime::format_duration(elapsed));
    Ok(ExitCode::SUCCESS)
}

fn compute_content_hash(target: &WipeTarget) -> Result<String> {
    tracing::info!(path = %target.path().display(), "Computing content hash");
    let digest = match target.kind() {
        TargetKind::DirectoryTree => hash_tree(target.path()),
        _ => hash_file(target.path()),
    };
    digest.with_context(|| format!("Failed to hash {}", target.path().display()))
}

fn verify(settings: &Settings, hash: &str) -> Result<ExitCode> {
    let offset = settings.display_offset()?;
    let service = VerificationService::new(HistoryLedger::new(&settings.ledger_path));

    match service.verify(hash)? {
        Some(record) => {
            println!("{}", "MATCH: this content was wiped".green().bold());
            println!("  File name:  {}", record.file_name);
            println!("  File hash:  {}", record.file_hash);
            println!(
                "  Deleted at: {}",
                VerificationService::display_deleted_at(&record, &offset)
            );
            Ok(ExitCode::SUCCESS)
        }
        None => {
            println!("{}", "NO RECORD: hash not found in the wipe ledger".red().bold());
            Ok(ExitCode::FAILURE)
        }
    }
}

fn check_artifact(settings: &Settings, path: &Path) -> Result<ExitCode> {
    let record = VerificationService::load_artifact(path)
        .with_context(|| format!("Failed to read artifact {}", path.display()))?;
    let public_key = settings.key_provider().verifying_key()?;

    match VerificationService::verify_artifact(&record, &public_key) {
        Ok(()) => {
            println!("{}", "Signature valid".green().bold());
            println!("  File name:  {}", record.file_name);
            println!("  File hash:  {}", record.file_hash);
            println!("  Deleted at: {}", record.deleted_at);
            Ok(ExitCode::SUCCESS)
        }
        Err(AuditError::SignatureInvalid) => {
            println!(
                "{}",
                "Signature INVALID: the artifact was altered or signed by another key"
                    .red()
                    .bold()
            );
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}

fn history(settings: &Settings) -> Result<ExitCode> {
    let offset = settings.display_offset()?;
    let records = HistoryLedger::new(&settings.ledger_path).load_all()?;

    if records.is_empty() {
        println!("The wipe ledger is empty.");
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}", format!("{} wipe record(s)", records.len()).bold());
    for (index, record) in records.iter().enumerate() {
        println!(
            "{:>4}. {}  {}  {}",
            index + 1,
            VerificationService::display_deleted_at(record, &offset),
            record.file_hash,
            record.file_name
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn print_report(report: &EraseReport) {
    println!("  Target kind:  {}", report.kind);
    println!("  Passes:       {}", report.passes_completed);
    println!(
        "  Overwritten:  {}",
        indicatif::HumanBytes(report.bytes_overwritten)
    );
    if report.kind == TargetKind::DirectoryTree {
        println!("  Files:        {}", report.files_erased);
        println!("  Directories:  {}", report.directories_removed);
    }
}

fn confirm_destruction(target: &WipeTarget) -> Result<bool> {
    println!(
        "{} {} {} will be overwritten and removed. This cannot be undone.",
        "WARNING:".yellow().bold(),
        target.kind(),
        target.path().display()
    );
    print!("Type 'DESTROY' to confirm: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim() == "DESTROY")
}

fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

// SIGINT stops the wipe at its next pass boundary
fn setup_signal_handlers(cancel: CancelToken) -> Result<()> {
    use signal_hook::{consts::SIGINT, iterator::Signals};

    let mut signals = Signals::new([SIGINT])?;

    thread::spawn(move || {
        for sig in signals.forever() {
            if sig == SIGINT {
                eprintln!("\nInterrupt received; stopping after the current pass...");
                cancel.cancel();
            }
        }
    });

    Ok(())
}
