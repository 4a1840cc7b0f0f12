//! Snippet Layout CLI
//!
//! Usage:
//!   snippet-layout [OPTIONS] <TEMPLATE>
//!
//! Options:
//!   -d, --dir <DIR>            Directory templates are loaded from
//!   -c, --config <FILE>        Engine configuration (TOML format)
//!   -l, --layout <NAME>        Layout used by {extends auto}
//!   -p, --param <KEY=VALUE>    Template parameter (repeatable)
//!       --partial              Print the snippet payload instead of the page
//!   -i, --invalidate <NAME>    Snippet of the root component to redraw (repeatable)
//!   -v, --verbose              Debug logging
//!   -h, --help                 Print help

use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

use snippet_layout::{
    ComponentNode, Engine, EngineConfig, FileLoader, RenderError, RenderRequest, TemplateLoader,
};

#[derive(Parser)]
#[command(name = "snippet-layout")]
#[command(about = "Render templates with block inheritance and partial snippet updates")]
struct Cli {
    /// Template to render, relative to --dir
    template: String,

    /// Directory templates are loaded from
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Engine configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Layout used by {extends auto}
    #[arg(short, long)]
    layout: Option<String>,

    /// Template parameter as KEY=VALUE
    #[arg(short, long = "param", value_parser = parse_param)]
    params: Vec<(String, String)>,

    /// Print the snippet payload (TOML) instead of the full output
    #[arg(long)]
    partial: bool,

    /// Snippet of the root component to mark invalid
    #[arg(short, long = "invalidate")]
    invalidate: Vec<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))
}

/// Source-annotated report for syntax and compile errors, plain text otherwise
fn report(loader: &FileLoader, error: &RenderError) -> String {
    let source = match error {
        RenderError::Parse { name, .. } | RenderError::Compile { name, .. } => {
            loader.load(name).ok()
        }
        _ => None,
    };
    match (error, source) {
        (RenderError::Parse { name, errors }, Some(source)) => errors
            .iter()
            .map(|e| e.format(&source, name))
            .collect::<Vec<_>>()
            .join("\n"),
        (RenderError::Compile { name, source: e }, Some(source)) => e.format(&source, name),
        _ => format!("Error: {}", error),
    }
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        })
        .init();

    // Load configuration
    let config = match &cli.config {
        Some(path) => match EngineConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };

    let loader = FileLoader::new(&cli.dir);
    let engine = Engine::new(loader.clone()).with_config(config);

    let root = ComponentNode::root();
    for snippet in &cli.invalidate {
        root.invalidate(Some(snippet));
    }

    let mut request = RenderRequest::new(&root)
        .with_params(cli.params.into_iter().collect())
        .partial(cli.partial);
    if let Some(layout) = cli.layout {
        request = request.with_layout(layout);
    }

    match engine.render(&cli.template, request) {
        Ok(rendered) if cli.partial => match toml::to_string(&rendered.payload) {
            Ok(payload) => print!("{}", payload),
            Err(e) => {
                eprintln!("Error serializing payload: {}", e);
                std::process::exit(1);
            }
        },
        Ok(rendered) => {
            print!("{}", rendered.output);
        }
        Err(e) => {
            eprintln!("{}", report(&loader, &e));
            std::process::exit(1);
        }
    }
}
