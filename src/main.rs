use anyhow::{Context, Result};
use bsdelta::output::{format_size, print_done, print_summary, print_summary_json};
use bsdelta::utils::progress::spinner;
use bsdelta::{Config, DeltaEncoder, PatchReader, apply_patch};
use clap::{Parser, Subcommand, ValueEnum};
use memmap2::Mmap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, IsTerminal, Write};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::time::Instant;
use termcolor::ColorChoice;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "bsdelta")]
#[command(about = "Compute and apply binary patches")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// When to color output
    #[arg(long, value_enum, default_value_t = ColorArg::Auto, global = true)]
    color: ColorArg,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a patch that turns OLD into NEW
    Diff {
        old: PathBuf,
        new: PathBuf,
        patch: PathBuf,

        /// Slack before a fresh match closes the current block
        #[arg(long)]
        slack: Option<u64>,
    },
    /// Rebuild NEW from OLD and PATCH
    Patch {
        old: PathBuf,
        new: PathBuf,
        patch: PathBuf,

        /// Refuse patches declaring a larger output (bytes)
        #[arg(long)]
        max_output: Option<u64>,
    },
    /// Show statistics about a patch
    Info {
        patch: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ColorArg {
    Auto,
    Always,
    Never,
}

impl ColorArg {
    fn choice(self) -> ColorChoice {
        match self {
            ColorArg::Auto if std::io::stdout().is_terminal() => ColorChoice::Auto,
            ColorArg::Auto => ColorChoice::Never,
            ColorArg::Always => ColorChoice::Always,
            ColorArg::Never => ColorChoice::Never,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    let color = cli.color.choice();

    match cli.command {
        Commands::Diff {
            old,
            new,
            patch,
            slack,
        } => {
            if let Some(slack) = slack {
                config.diff.match_slack = slack;
            }
            run_diff(&old, &new, &patch, &config, color)?;
        }
        Commands::Patch {
            old,
            new,
            patch,
            max_output,
        } => {
            if let Some(max_output) = max_output {
                config.patch.max_output_size = max_output;
            }
            run_patch(&old, &new, &patch, &config, color)?;
        }
        Commands::Info { patch, json } => {
            run_info(&patch, json, color)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("bsdelta=warn"),
        1 => EnvFilter::new("bsdelta=info"),
        2 => EnvFilter::new("bsdelta=debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn run_diff(
    old_path: &Path,
    new_path: &Path,
    patch_path: &Path,
    config: &Config,
    color: ColorChoice,
) -> Result<()> {
    let old = InputFile::open(old_path)?;
    let new = InputFile::open(new_path)?;
    tracing::info!(
        old = %old_path.display(),
        old_size = old.len(),
        new = %new_path.display(),
        new_size = new.len(),
        slack = config.diff.match_slack,
        "Computing delta"
    );

    let progress = spinner("Computing delta...", std::io::stderr().is_terminal());
    let start = Instant::now();

    let file = File::create(patch_path)
        .with_context(|| format!("Failed to create {}", patch_path.display()))?;
    let mut writer = BufWriter::with_capacity(65536, file);

    let result = DeltaEncoder::with_config(&old, &new, config.diff.clone())
        .write_patch(&mut writer)
        .map_err(anyhow::Error::from)
        .and_then(|()| writer.flush().map_err(anyhow::Error::from));
    progress.finish_and_clear();

    if let Err(e) = result {
        // A partial patch is useless; don't leave it behind
        drop(writer);
        if let Err(remove_err) = fs::remove_file(patch_path) {
            tracing::warn!(
                error = %remove_err,
                path = %patch_path.display(),
                "Failed to remove partial patch"
            );
        }
        return Err(e).with_context(|| {
            format!(
                "Failed to diff {} against {}",
                new_path.display(),
                old_path.display()
            )
        });
    }

    let patch_size = fs::metadata(patch_path)?.len();
    tracing::info!(
        patch_size,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Patch written"
    );
    print_done(
        "Wrote",
        &format!("{} ({})", patch_path.display(), format_size(patch_size)),
        color,
    )?;
    Ok(())
}

fn run_patch(
    old_path: &Path,
    new_path: &Path,
    patch_path: &Path,
    config: &Config,
    color: ColorChoice,
) -> Result<()> {
    let old = InputFile::open(old_path)?;
    let patch_file = File::open(patch_path)
        .with_context(|| format!("Failed to open {}", patch_path.display()))?;
    let mut source = BufReader::with_capacity(65536, patch_file);
    tracing::info!(
        old = %old_path.display(),
        old_size = old.len(),
        patch = %patch_path.display(),
        "Applying patch"
    );

    let progress = spinner("Applying patch...", std::io::stderr().is_terminal());
    let start = Instant::now();
    let result = apply_patch(&old, &mut source, &config.patch);
    progress.finish_and_clear();

    let rebuilt = result.with_context(|| format!("Failed to apply {}", patch_path.display()))?;
    tracing::info!(
        new_size = rebuilt.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Patch applied"
    );

    fs::write(new_path, &rebuilt)
        .with_context(|| format!("Failed to write {}", new_path.display()))?;

    // Keep the old file's mode on the rebuilt file
    let permissions = fs::metadata(old_path)?.permissions();
    if let Err(e) = fs::set_permissions(new_path, permissions) {
        tracing::warn!(error = %e, path = %new_path.display(), "Failed to copy permissions");
    }

    print_done(
        "Rebuilt",
        &format!("{} ({})", new_path.display(), format_size(rebuilt.len() as u64)),
        color,
    )?;
    Ok(())
}

fn run_info(patch_path: &Path, json: bool, color: ColorChoice) -> Result<()> {
    let file = File::open(patch_path)
        .with_context(|| format!("Failed to open {}", patch_path.display()))?;
    let reader = PatchReader::new(BufReader::with_capacity(65536, file))
        .with_context(|| format!("Failed to read header of {}", patch_path.display()))?;
    let summary = reader
        .summarize()
        .with_context(|| format!("Failed to read {}", patch_path.display()))?;

    if json {
        print_summary_json(&summary)?;
    } else {
        print_summary(&summary, color)?;
    }
    Ok(())
}

/// Read-only view of an input file
///
/// Empty files are not mapped.
enum InputFile {
    Mapped(Mmap),
    Empty,
}

impl InputFile {
    fn open(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let len = file.metadata()?.len();
        if len == 0 {
            return Ok(InputFile::Empty);
        }

        let mmap = unsafe { Mmap::map(&file) }
            .with_context(|| format!("Failed to map {}", path.display()))?;
        Ok(InputFile::Mapped(mmap))
    }
}

impl Deref for InputFile {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            InputFile::Mapped(mmap) => mmap,
            InputFile::Empty => &[],
        }
    }
}
