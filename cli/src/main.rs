use std::path::{Component, Path, PathBuf};
use std::sync::Once;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use skem_core::{
    ExecMode, Session, SessionOptions,
    ast::{Node, VariableUses},
};
use tracing::debug;

static TRACE_INIT: Once = Once::new();
const DEFAULT_TRACE_FILTER: &str = "skem_core=warn,skem_cli=info";

#[derive(Debug, Parser)]
#[command(name = "skem", author, version, about = "Run serialized skem syntax trees", long_about = None)]
struct CliArgs {
    #[command(subcommand)]
    command: Commands,

    /// Session options file (TOML)
    #[arg(long, global = true, value_name = "FILE", value_parser = parse_sanitized_path)]
    config: Option<PathBuf>,

    /// Always emit the jump after a conditional clause
    #[arg(long, global = true)]
    no_elide: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Interpret,
    Compile,
    Both,
}

impl From<ModeArg> for ExecMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Interpret => ExecMode::Interpret,
            ModeArg::Compile => ExecMode::Compile,
            ModeArg::Both => ExecMode::Both,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve and run a tree, printing its value.
    Run {
        #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = ModeArg::Interpret)]
        mode: ModeArg,
    },
    /// Print the compiled stack code of a tree.
    Disasm {
        #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
        file: PathBuf,
    },
    /// Resolve a tree and report variable use counts.
    Check {
        #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
        file: PathBuf,
    },
}

fn sanitize_path(raw: &str) -> anyhow::Result<PathBuf> {
    let p = Path::new(raw);

    for comp in p.components() {
        if matches!(comp, Component::ParentDir) {
            return Err(anyhow::anyhow!(
                "Parent directory components ('..') are not allowed in file paths."
            ));
        }
    }

    Ok(p.to_path_buf())
}

fn parse_sanitized_path(raw: &str) -> Result<PathBuf, String> {
    sanitize_path(raw).map_err(|e| e.to_string())
}

fn filter_expr() -> Option<String> {
    ["SKEM_LOG", "RUST_LOG"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .map(|raw| raw.trim().to_string())
        .find(|raw| !raw.is_empty())
}

fn init_tracing() {
    TRACE_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        use tracing_subscriber::fmt;

        let builder = fmt().with_writer(std::io::stderr);

        let builder = match filter_expr().and_then(|expr| EnvFilter::try_new(expr).ok()) {
            Some(filter) => builder.with_env_filter(filter),
            None => builder.with_env_filter(DEFAULT_TRACE_FILTER),
        };

        let _ = builder.try_init();
    });
}

/// Load a tree from JSON, or from YAML for `.yaml`/`.yml` files.
fn load_tree(path: &Path) -> anyhow::Result<Node> {
    let src = std::fs::read_to_string(path).with_context(|| format!("Failed to read file '{}'", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let node = if is_yaml {
        serde_yaml::from_str(&src).with_context(|| format!("Invalid YAML tree in '{}'", path.display()))?
    } else {
        serde_json::from_str(&src).with_context(|| format!("Invalid JSON tree in '{}'", path.display()))?
    };
    Ok(node)
}

fn session_options(config: Option<&Path>, no_elide: bool) -> anyhow::Result<SessionOptions> {
    let mut options = match config {
        Some(path) => SessionOptions::load(path)?,
        None => SessionOptions::default(),
    };
    if no_elide {
        options.branch_elision = false;
    }
    Ok(options)
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let CliArgs {
        command,
        config,
        no_elide,
    } = CliArgs::parse();
    let options = session_options(config.as_deref(), no_elide)?;
    debug!(?options, "session options");
    let mut session = Session::new(options);

    match command {
        Commands::Run { file, mode } => {
            let tree = load_tree(&file)?;
            let value = session.run(tree, mode.into())?;
            println!("{}", value);
        }
        Commands::Disasm { file } => {
            let unit = session.resolve(load_tree(&file)?)?;
            let compiled = session.compile(&unit)?;
            print!("{}", compiled);
        }
        Commands::Check { file } => {
            let unit = session.resolve(load_tree(&file)?)?;
            for (variable, count) in VariableUses::collect(unit.body()).iter() {
                println!(
                    "{:<16} {:<18} reads={} writes={}",
                    variable.to_string(),
                    variable.kind().to_string(),
                    count.reads,
                    count.writes
                );
            }
            println!("ok: {} slot(s)", unit.layout().total_slots);
        }
    }

    Ok(())
}

#[cfg(test)]
mod main_test;
