//! quire - Merge a rendered documentation site into printable HTML

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use quire::{BuildConfig, Document, FsOutput, Level, PdfBuilder, Site};

#[derive(Parser)]
#[command(name = "quire")]
#[command(version, about = "Merge documentation pages into one printable HTML stream per TOC", long_about = None)]
#[command(after_help = "EXAMPLES:
    quire --site _site --base-url https://docs.example.com/ --out _pdf guide/toc.json
    quire --site _site --base-url https://docs.example.com/ --out _pdf -v toc.json api/toc.json")]
struct Cli {
    /// TOC files to merge, relative to the site directory
    #[arg(value_name = "TOC", required = true)]
    tocs: Vec<String>,

    /// Directory containing the rendered site
    #[arg(long, value_name = "DIR")]
    site: PathBuf,

    /// URL the site is published under
    #[arg(long, value_name = "URL")]
    base_url: String,

    /// Directory to write merged artifacts into
    #[arg(long, value_name = "DIR")]
    out: PathBuf,

    /// JSON build configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Worker threads (defaults to one per core)
    #[arg(long, value_name = "N")]
    threads: Option<usize>,

    /// Element that marks the start of each page's content
    #[arg(long, value_name = "NAME")]
    landmark: Option<String>,

    /// Only report errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show debug output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let default = if cli.verbose {
        "quire=debug"
    } else if cli.quiet {
        "quire=error"
    } else {
        "quire=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> quire::Result<ExitCode> {
    let mut config = match &cli.config {
        Some(path) => BuildConfig::from_file(path)?,
        None => BuildConfig::default(),
    };
    if let Some(threads) = cli.threads {
        config = config.with_threads(threads);
    }
    if let Some(landmark) = &cli.landmark {
        config = config.with_landmark(landmark.as_str());
    }

    let site = Site::new(&cli.site, cli.base_url.as_str());
    let output = FsOutput::new(&cli.out);
    let roots: Vec<Document> = cli.tocs.iter().map(|toc| Document::new(toc.as_str())).collect();

    let report = PdfBuilder::new(&site, &site, &site, &output)
        .with_config(config)
        .build_artifacts(&roots)?;

    for diagnostic in &report.diagnostics {
        if !cli.quiet || diagnostic.level == Level::Error {
            println!("{diagnostic}");
        }
    }
    if !cli.quiet {
        for artifact in &report.artifacts {
            println!("wrote {}", output.root().join(artifact).display());
        }
    }

    Ok(if report.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
