use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use tensorlang::{Session, Value};

fn main() {
    init_logging();
    if let Err(err) = Cli::parse().run() {
        if !err.is_empty() {
            eprintln!("{err}");
        }
        std::process::exit(1);
    }
}

// Log events go to stderr, filtered by RUST_LOG or TENSORLANG_LOG.
fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_from_env("TENSORLANG_LOG"))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("error"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}

/// Translate LaTeX tensor equations into symbolic component arrays.
///
/// Each input is parsed in order against one shared session,
///     so a tensor declared in the first file can be used in the second.
/// For every input the defined symbols are printed with their values.
///
/// Example:
///
///     $ echo '% define metric gUU (2); % define nosym wD (2); v^a = g^{ab} w_b' | tensorlang
#[derive(Debug, Parser)]
#[command(
    name = "tensorlang",
    author = "The Tensorlang Project",
    version = "0.1",
    about,
    long_about,
    max_term_width(100)
)]
struct Cli {
    /// Files to translate. Standard input is read when no file is given.
    files: Vec<PathBuf>,

    /// Parse a standalone expression and print it.
    #[arg(short = 'e', long, conflicts_with = "files")]
    expression: Option<String>,

    /// Output format.
    #[arg(short = 'f', long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Start every input from an empty namespace.
    #[arg(long)]
    no_retention: bool,

    /// Do not warn when a declaration names a symbol that already has storage.
    #[arg(long)]
    ignore_override: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum Format {
    /// One `symbol = value` line per defined symbol.
    Text,
    /// A JSON list of the defined symbols and their values.
    Json,
    /// The implied summations as host code.
    Code,
}

#[derive(serde::Serialize)]
struct Definition<'a> {
    symbol: &'a str,
    value: &'a Value,
}

impl Cli {
    fn run(self) -> Result<(), String> {
        let mut session = Session::new();
        session.set_retention(!self.no_retention);
        session.ignore_override(self.ignore_override);
        if let Some(expression) = &self.expression {
            let expr = session
                .parse_expression(expression)
                .map_err(|err| report("<expression>", &err))?;
            match self.format {
                Format::Json => println!("{}", to_json(&expr)?),
                Format::Text | Format::Code => println!("{expr}"),
            }
            return Ok(());
        }
        for (name, source) in self.inputs()? {
            let result = session.parse(&source);
            for notice in session.take_notices() {
                eprintln!("{}", notice.to_string().yellow());
            }
            let defined = result.map_err(|err| report(&name, &err))?;
            self.print(&session, &defined)?;
        }
        Ok(())
    }

    fn inputs(&self) -> Result<Vec<(String, String)>, String> {
        if self.files.is_empty() {
            let mut source = String::new();
            if let Err(err) = std::io::stdin().read_to_string(&mut source) {
                return Err(format!("Failed to read standard input: {err}"));
            }
            return Ok(vec![("<stdin>".to_string(), source)]);
        }
        let mut inputs = vec![];
        for path in &self.files {
            let source = match std::fs::read_to_string(path) {
                Ok(source) => source,
                Err(err) => return Err(format!("Failed to read `{}`: {}", path.display(), err)),
            };
            inputs.push((path.to_string_lossy().to_string(), source));
        }
        Ok(inputs)
    }

    fn print(&self, session: &Session, defined: &[String]) -> Result<(), String> {
        match self.format {
            Format::Text => {
                for symbol in defined {
                    if let Some(value) = session.get(symbol) {
                        println!("{symbol} = {value}");
                    }
                }
            }
            Format::Json => {
                let definitions: Vec<Definition> = defined
                    .iter()
                    .filter_map(|symbol| {
                        session.get(symbol).map(|value| Definition { symbol, value })
                    })
                    .collect();
                println!("{}", to_json(&definitions)?);
            }
            Format::Code => {
                for line in session.code() {
                    println!("{line}");
                }
            }
        }
        Ok(())
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|err| format!("Failed to write JSON: {err}"))
}

fn report(name: &str, err: &tensorlang::Error) -> String {
    let cache: (&str, _) = (name, ariadne::Source::from(err.source().to_string()));
    if err.ariadne_report(name).eprint(cache).is_err() {
        return format!("{err}");
    }
    format!("Failed to translate {name}")
}
