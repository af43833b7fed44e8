//! CLI parsing and orchestration. Validates arguments eagerly, merges the config
//! file, then builds each requested variant independently. Maps errors to exit codes.

use crate::config::{self, Options};
use crate::generator::{convert, Variant};
use crate::model::{has_extension, Screenplay};
use crate::reader::{self, DocumentError};
use clap::Parser;
use log::{error, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// CLI error carrying exit code and message.
#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Document(#[from] DocumentError),

    #[error("Cannot write {path}: {source}")]
    Dump {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Conversion failed for: {}", variant_list(.failed))]
    Incomplete { failed: Vec<Variant> },
}

fn variant_list(variants: &[Variant]) -> String {
    variants
        .iter()
        .map(|v| v.extension())
        .collect::<Vec<_>>()
        .join(", ")
}

impl CliRunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliRunError::InvalidInput(_) => 1,
            CliRunError::Document(_) => 2,
            CliRunError::Dump { .. } | CliRunError::Incomplete { .. } => 3,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "fdx2ebook")]
#[command(about = "Convert a Final Draft (.fdx) screenplay into .mobi and .epub ebooks")]
#[command(
    after_help = "Config file keys (output_dir, keep, kindlegen, language, publisher) are read from ./fdx2ebook.toml or ~/.config/fdx2ebook/config.toml. CLI flags override config."
)]
pub struct Args {
    /// Final Draft screenplay (.fdx).
    pub input: Option<PathBuf>,

    /// Title of the script.
    #[arg(short, long, default_value = "")]
    pub title: String,

    /// Author of the script.
    #[arg(short, long, default_value = "")]
    pub author: String,

    /// Cover image (.jpg or .jpeg).
    #[arg(short, long, value_name = "FILE.jpg")]
    pub cover: Option<PathBuf>,

    /// Keep the intermediate __mobi / __epub directories.
    #[arg(short, long)]
    pub keep: bool,

    /// Skip the .mobi file generation.
    #[arg(short = '1', long)]
    pub nomobi: bool,

    /// Skip the .epub file generation.
    #[arg(short = '2', long)]
    pub noepub: bool,

    /// Output more information: debug logs, converter output, error causes.
    #[arg(short, long)]
    pub verbose: bool,

    /// Errors only; no progress spinner.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Directory for scratch files and the generated ebooks (overrides config; default .).
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Kindle converter program (overrides config; default kindlegen).
    #[arg(long, value_name = "PROGRAM")]
    pub kindlegen: Option<PathBuf>,

    /// Parse the screenplay, print what would be generated, write nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Write the parsed screenplay elements as JSON to this path.
    #[arg(long, value_name = "PATH")]
    pub dump_elements: Option<PathBuf>,
}

/// Check arguments in the order a user is most likely to get them wrong and
/// build the screenplay description. Nothing is generated on failure.
pub fn validate_args(args: &Args) -> Result<Screenplay, CliRunError> {
    let input = args
        .input
        .as_ref()
        .ok_or_else(|| CliRunError::InvalidInput("missing fdx file name".to_string()))?;
    if !has_extension(input, "fdx") {
        return Err(CliRunError::InvalidInput(
            "Only .fdx extension are supported".to_string(),
        ));
    }
    if !input.exists() {
        return Err(CliRunError::InvalidInput(format!(
            "the fdx file ({}) does not exist",
            input.display()
        )));
    }
    if args.title.is_empty() {
        return Err(CliRunError::InvalidInput("missing title parameter".to_string()));
    }
    if args.author.is_empty() {
        return Err(CliRunError::InvalidInput("missing author parameter".to_string()));
    }
    let cover = match &args.cover {
        Some(c) if !c.as_os_str().is_empty() => c,
        _ => return Err(CliRunError::InvalidInput("missing cover parameter".to_string())),
    };
    if !cover.exists() {
        return Err(CliRunError::InvalidInput(format!(
            "the cover file ({}) does not exist",
            cover.display()
        )));
    }
    if !has_extension(cover, "jpg") && !has_extension(cover, "jpeg") {
        return Err(CliRunError::InvalidInput(
            "Only jpeg files are supported for cover images".to_string(),
        ));
    }
    Ok(Screenplay::new(
        input.clone(),
        args.title.as_str(),
        args.author.as_str(),
        cover.clone(),
    ))
}

/// Config file values overridden by command-line flags.
fn build_options(args: &Args, config: Option<&config::Config>) -> Options {
    let mut options = Options::from_config(config);
    if let Some(dir) = &args.output_dir {
        options.output_dir = dir.clone();
    }
    if let Some(program) = &args.kindlegen {
        options.kindlegen = program.clone();
    }
    options.keep_intermediate |= args.keep;
    options.verbose = args.verbose;
    options
}

/// Variants in generation order, minus the skipped ones.
fn requested_variants(args: &Args) -> Vec<Variant> {
    let mut variants = Vec::new();
    if !args.nomobi {
        variants.push(Variant::Mobi);
    }
    if !args.noepub {
        variants.push(Variant::Epub);
    }
    variants
}

fn validate_output_dir(path: &Path) -> Result<(), CliRunError> {
    if path.exists() && !path.is_dir() {
        return Err(CliRunError::InvalidInput(format!(
            "Cannot write output: {} is not a directory.",
            path.display()
        )));
    }
    Ok(())
}

fn spinner(message: String) -> indicatif::ProgressBar {
    let bar = indicatif::ProgressBar::new_spinner();
    bar.set_style(
        indicatif::ProgressStyle::default_spinner()
            .template("{spinner} {msg} ({elapsed})")
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "),
    );
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// `source()` chain below `err`, outermost first.
pub fn causes(err: &dyn std::error::Error) -> Vec<String> {
    let mut out = Vec::new();
    let mut source = err.source();
    while let Some(s) = source {
        out.push(s.to_string());
        source = s.source();
    }
    out
}

/// Entry point for the CLI. Returns Ok(()) on success; Err with exit code and message on failure.
pub fn run(args: &Args) -> Result<(), CliRunError> {
    let screenplay = validate_args(args)?;
    let config = config::load_config().map_err(CliRunError::InvalidInput)?;
    execute(args, screenplay, config.as_ref())
}

/// [`run`] with the config file already loaded (`None` when there is none).
pub fn run_with_config(args: &Args, config: Option<&config::Config>) -> Result<(), CliRunError> {
    let screenplay = validate_args(args)?;
    execute(args, screenplay, config)
}

fn execute(
    args: &Args,
    screenplay: Screenplay,
    config: Option<&config::Config>,
) -> Result<(), CliRunError> {
    let options = build_options(args, config);
    validate_output_dir(&options.output_dir)?;
    let variants = requested_variants(args);

    if args.dry_run || args.dump_elements.is_some() {
        let document = reader::read_document(&screenplay.source)?;
        if let Some(path) = &args.dump_elements {
            let f = std::fs::File::create(path).map_err(|e| CliRunError::Dump {
                path: path.clone(),
                source: e,
            })?;
            serde_json::to_writer_pretty(f, &document).map_err(|e| CliRunError::Dump {
                path: path.clone(),
                source: e.into(),
            })?;
            if !args.quiet {
                eprintln!("Wrote {}", path.display());
            }
        }
        if args.dry_run {
            eprintln!("Scenes: {}", document.scene_count());
            eprintln!("Elements: {}", document.elements.len());
            if !document.unrecognized.is_empty() {
                eprintln!("Skipped paragraphs: {}", document.unrecognized.len());
            }
            for variant in &variants {
                eprintln!(
                    "Output: {}",
                    options
                        .output_dir
                        .join(screenplay.artifact_name(variant.extension()))
                        .display()
                );
            }
            return Ok(());
        }
    }

    if variants.is_empty() {
        warn!("Both --nomobi and --noepub given; nothing to generate.");
        return Ok(());
    }

    let mut failed = Vec::new();
    for variant in variants {
        let progress = (!args.quiet && !args.verbose)
            .then(|| spinner(format!("Building {} file", variant.label())));
        let result = convert(variant, &screenplay, &options);
        if let Some(bar) = progress {
            bar.finish_and_clear();
        }
        match result {
            Ok(path) => {
                if !args.quiet {
                    println!("{} file available: {}", variant.label(), path.display());
                }
            }
            Err(e) => {
                error!("{} generation failed: {}", variant.label(), e);
                if args.verbose {
                    for cause in causes(&e) {
                        error!("  cause: {}", cause);
                    }
                }
                failed.push(variant);
            }
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(CliRunError::Incomplete { failed })
    }
}
