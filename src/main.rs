use clap::{Args, Parser, Subcommand};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use thicket::{
    ElementNode, FunctionRegistry, MathContext, NumericConfig, NumericKind, Query, QueryConfig,
    Selector, TreePrinter, outline, parse_with, walk,
};

#[derive(Parser, Debug)]
#[command(name = "thicket", version, about = "Inspect and validate thicket tree queries")]
struct Cli {
    #[command(flatten)]
    numeric: NumericArgs,

    /// JSON file holding a query configuration; flags override its values
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct NumericArgs {
    /// Parse number literals as doubles instead of decimals
    #[arg(long, global = true)]
    double: bool,

    /// Significant digits kept for decimal literals and arithmetic (0 = unlimited)
    #[arg(long, global = true, value_name = "N")]
    precision: Option<u32>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the syntax tree of a query
    Parse {
        query: String,

        /// Include whitespace tokens in the outline
        #[arg(long)]
        whitespace: bool,
    },

    /// Print the selector chain a query compiles to
    Explain { query: String },

    /// Check that every query compiles; exits with status 1 otherwise
    Check {
        #[arg(required = true)]
        queries: Vec<String>,
    },
}

fn load_config(cli: &Cli) -> Result<QueryConfig, String> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
            serde_json::from_str(&text).map_err(|e| format!("{}: {e}", path.display()))?
        }
        None => QueryConfig::default(),
    };
    if cli.numeric.double {
        config.numeric.kind = NumericKind::Double;
    }
    if let Some(precision) = cli.numeric.precision {
        config.numeric.math = MathContext::new(precision, config.numeric.math.rounding);
    }
    Ok(config)
}

fn print_outline(query: &str, numeric: &NumericConfig, whitespace: bool) -> Result<(), String> {
    let token = parse_with(query, numeric).map_err(|e| e.to_string())?;
    if whitespace {
        let mut printer = TreePrinter::new();
        walk(&token, &mut printer);
        print!("{}", printer.finish());
    } else {
        print!("{}", outline(&token));
    }
    Ok(())
}

fn explain(query: &str, config: &QueryConfig) -> Result<(), String> {
    let query: Query<ElementNode> =
        Query::compile_with(query, config, FunctionRegistry::with_builtins()).map_err(|e| e.to_string())?;
    let selector: &Selector<ElementNode> = query.selector();
    println!("{selector}");
    for (index, step) in selector.steps().iter().enumerate() {
        println!("{index:>3}  {step:?}");
    }
    Ok(())
}

fn check(queries: &[String], config: &QueryConfig) -> bool {
    let mut ok = true;
    for query in queries {
        match Query::<ElementNode>::compile_with(query, config, FunctionRegistry::with_builtins()) {
            Ok(_) => println!("ok     {query}"),
            Err(err) => {
                ok = false;
                println!("error  {query}\n       {err}");
            }
        }
    }
    ok
}

fn main() -> ExitCode {
    if env::var("RUST_LOG").is_err() {
        unsafe {
            env::set_var("RUST_LOG", "warn");
        }
    }
    env_logger::init();

    let cli = Cli::parse();
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("error: {message}");
            return ExitCode::from(2);
        }
    };
    log::debug!("using {config:?}");

    let result = match &cli.command {
        Command::Parse { query, whitespace } => print_outline(query, &config.numeric, *whitespace),
        Command::Explain { query } => explain(query, &config),
        Command::Check { queries } => {
            return if check(queries, &config) {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            };
        }
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}
