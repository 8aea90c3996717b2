//! overflow-guard - rewrite overflow-prone Java arithmetic into `Math.*Exact` calls
//!
//! Reads each FILE (or stdin when none is given) and prints the rewritten
//! source, or replaces the files with `--in-place`.

use anyhow::{Context, Result};
use clap::Parser;
use overflow_guard::{ClassUniverse, TransformOptions, Transformer, UnresolvedPolicy};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "overflow-guard", version)]
#[command(about = "Replace overflow-prone int/long arithmetic in Java sources with Math.*Exact calls")]
struct Cli {
    /// Java source files (stdin when omitted)
    files: Vec<PathBuf>,

    /// Overwrite each file with its rewritten source
    #[arg(short, long)]
    in_place: bool,

    /// Leave nodes with unresolvable operands unchanged instead of failing
    #[arg(long)]
    skip_unresolved: bool,

    /// Class providing the static *Exact methods
    #[arg(long, value_name = "NAME", default_value = "Math")]
    checked_class: String,

    /// Extra class declarations (JSON) merged into the built-in java.lang table
    #[arg(long, value_name = "FILE.json")]
    classpath: Vec<PathBuf>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let transformer = match build_transformer(&cli) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("{:#}", e);
            std::process::exit(1);
        }
    };

    if cli.files.is_empty() {
        if let Err(e) = transform_stdin(&transformer) {
            tracing::error!("{:#}", e);
            std::process::exit(1);
        }
        return;
    }

    let mut failed = 0;
    for path in &cli.files {
        if let Err(e) = transform_file(&transformer, path, cli.in_place) {
            tracing::error!("{:#}", e);
            failed += 1;
        }
    }

    if failed > 0 {
        tracing::error!("{} of {} inputs failed", failed, cli.files.len());
        std::process::exit(1);
    }
}

fn build_transformer(cli: &Cli) -> Result<Transformer> {
    let mut universe = ClassUniverse::java_lang();
    for path in &cli.classpath {
        let classes = ClassUniverse::load_json(path)
            .with_context(|| format!("Failed to load class declarations from {}", path.display()))?;
        tracing::debug!(path = %path.display(), classes = classes.len(), "loaded classpath file");
        universe.merge(classes);
    }

    let options = TransformOptions {
        checked_class: cli.checked_class.clone(),
        unresolved: if cli.skip_unresolved {
            UnresolvedPolicy::Skip
        } else {
            UnresolvedPolicy::Fail
        },
    };
    options.validate()?;

    Ok(Transformer::with_universe(universe, options))
}

fn transform_stdin(transformer: &Transformer) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let report = transformer
        .transform(stdin.lock(), stdout.lock())
        .context("Failed to transform <stdin>")?;
    tracing::info!(passes = report.passes, rewrites = report.rewrites, "transformed <stdin>");
    Ok(())
}

fn transform_file(transformer: &Transformer, path: &Path, in_place: bool) -> Result<()> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let output = transformer
        .transform_source(&source)
        .with_context(|| format!("Failed to transform {}", path.display()))?;

    tracing::info!(
        file = %path.display(),
        passes = output.report.passes,
        rewrites = output.report.rewrites,
        "transformed"
    );

    if in_place {
        write_in_place(path, &output.source)
            .with_context(|| format!("Failed to write {}", path.display()))
    } else {
        let mut stdout = io::stdout().lock();
        stdout.write_all(output.source.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

/// Replace `path` atomically through a temp file in the same directory
fn write_in_place(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path)?;
    Ok(())
}
