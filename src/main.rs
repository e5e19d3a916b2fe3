use clap::{ArgGroup, Parser, ValueEnum};
use codequery::{process_path, Builtin, ClassifierRules, Language, OutputFormat, ProcessOptions, QueryError, QuerySource, View};
use std::{fs, process};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "codequery")]
#[command(about = "Structural queries over source code using Tree-sitter", long_about = None, version)]
#[command(group(ArgGroup::new("source").required(true).args(["query", "builtin"])))]
struct Cli {
    /// File or directory to query
    #[arg(value_name = "PATH")]
    path: String,

    /// File holding the query
    #[arg(long, value_name = "FILE")]
    query: Option<String>,

    /// Built-in query: outline, runnables, textobjects, debugger or injections
    #[arg(long, value_name = "NAME")]
    builtin: Option<String>,

    /// Parse every file as this language instead of detecting it
    #[arg(long = "lang", value_name = "LANG")]
    language: Option<String>,

    /// What to print per file
    #[arg(long, value_enum, default_value_t = ViewArg::Captures)]
    view: ViewArg,

    /// Shorthand for --view classified
    #[arg(long, conflicts_with = "view")]
    classify: bool,

    /// Classifier rules as JSON (default: built-in rules)
    #[arg(long, value_name = "FILE")]
    rules: Option<String>,

    /// Maximum matches per file
    #[arg(long)]
    limit: Option<usize>,

    /// Directory recursion depth (default: unlimited)
    #[arg(long)]
    depth: Option<usize>,

    /// Only files with these extensions (repeatable)
    #[arg(long = "ext", value_name = "EXT")]
    ext: Vec<String>,

    /// JSON output instead of plain text
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ViewArg {
    Captures,
    Classified,
    Outline,
    Runnables,
}

impl From<ViewArg> for View {
    fn from(view: ViewArg) -> Self {
        match view {
            ViewArg::Captures => View::Captures,
            ViewArg::Classified => View::Classified,
            ViewArg::Outline => View::Outline,
            ViewArg::Runnables => View::Runnables,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = options_from(&cli).and_then(|options| process_path(&cli.path, options));
    match result {
        Ok(output) => {
            print!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn read(path: &str) -> Result<String, QueryError> {
    fs::read_to_string(path).map_err(|e| QueryError::ReadError {
        path: path.to_string(),
        source: e,
    })
}

fn options_from(cli: &Cli) -> Result<ProcessOptions, QueryError> {
    // clap guarantees exactly one of the two
    let query = match &cli.query {
        Some(file) => QuerySource::Text(read(file)?),
        None => QuerySource::Builtin(cli.builtin.as_deref().unwrap_or_default().parse::<Builtin>()?),
    };
    let language = cli.language.as_deref().map(str::parse::<Language>).transpose()?;
    let rules = match &cli.rules {
        Some(file) => Some(serde_json::from_str::<ClassifierRules>(&read(file)?)?),
        None => None,
    };
    let view = if cli.classify { View::Classified } else { cli.view.into() };
    let format = if cli.json { OutputFormat::Json } else { OutputFormat::Plain };

    Ok(ProcessOptions {
        query,
        language,
        view,
        format,
        limit: cli.limit,
        depth: cli.depth,
        ext: cli.ext.clone(),
        rules,
    })
}
