use clap::Parser;
use declgen::{Config, Error, Severity};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Generate serde-ready Rust modules from TypeScript declaration files
#[derive(Parser, Debug)]
#[command(name = "declgen", version)]
struct Cli {
    /// Declaration file to read (`-` for stdin)
    input: PathBuf,

    /// Output .rs file (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Name of the root module when the input is not a single namespace
    #[arg(long)]
    root_module: Option<String>,

    /// Fail on type expressions that have no Rust translation
    #[arg(long)]
    strict: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_input(path: &Path) -> Result<String, Error> {
    let result = if path.as_os_str() == "-" {
        std::io::read_to_string(std::io::stdin())
    } else {
        std::fs::read_to_string(path)
    };
    result.map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn run(cli: Cli) -> Result<(), Error> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(name) = cli.root_module {
        config.root_module = name;
    }
    config.strict |= cli.strict;

    let source = read_input(&cli.input)?;
    let generated = declgen::generate(&source, &config)?;

    for diag in &generated.diagnostics {
        match diag.kind.severity() {
            Severity::Warning => tracing::warn!("{diag}"),
            Severity::Note => tracing::info!("{diag}"),
        }
    }

    match &cli.output {
        Some(path) => std::fs::write(path, &generated.code).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?,
        None => print!("{}", generated.code),
    }
    tracing::info!(
        diagnostics = generated.diagnostics.len(),
        warnings = generated.diagnostics.warnings(),
        "done"
    );
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
