//! Courtside CLI - classify, expand and evaluate questions from the shell.

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use courtside_rag::rag::{evaluate_routing, format_report, load_labeled_set};
use courtside_rag::{ClassificationResult, CourtsideConfig, QueryClassifier, QueryExpander};

/// Courtside - question routing for a sports statistics assistant
#[derive(Parser, Debug)]
#[command(name = "courtside")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
struct CourtsideArgs {
    /// Config file (JSON). Defaults to the user config directory when present
    #[arg(short, long, global = true, env = "COURTSIDE_CONFIG")]
    config: Option<PathBuf>,

    /// Verbosity (-v info, -vv debug, -vvv trace). RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit JSON instead of human-readable output
    #[arg(long, global = true)]
    json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify a question
    Classify(QuestionArgs),

    /// Classify a question and show the query sent to the semantic store
    Expand(QuestionArgs),

    /// Score routing against a labeled question set
    Eval(EvalArgs),
}

#[derive(Args, Debug)]
struct QuestionArgs {
    /// Question text
    #[arg(required = true, trailing_var_arg = true)]
    question: Vec<String>,
}

#[derive(Args, Debug)]
struct EvalArgs {
    /// JSON array of {"question", "expected", "greeting"} objects
    file: PathBuf,

    /// Exit with an error when accuracy falls below this value
    #[arg(long)]
    min_accuracy: Option<f64>,
}

#[derive(Serialize)]
struct Expansion<'a> {
    classification: &'a ClassificationResult,
    semantic_query: Option<String>,
}

fn main() {
    let args = CourtsideArgs::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: CourtsideArgs) -> Result<()> {
    let config = CourtsideConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;
    let classifier = QueryClassifier::from_config(&config).context("Failed to compile rules")?;

    match &args.command {
        Command::Classify(q) => {
            let result = classifier.classify(&q.question.join(" "));
            if args.json {
                print_json(&result, args.pretty)?;
            } else {
                print_classification(&result);
            }
        }
        Command::Expand(q) => {
            let question = q.question.join(" ");
            let result = classifier.classify(&question);
            let semantic_query = (config.expansion.enabled && result.needs_semantic()).then(|| {
                QueryExpander::new().expand(&question, result.max_expansions, result.query_category)
            });
            if args.json {
                print_json(
                    &Expansion {
                        classification: &result,
                        semantic_query,
                    },
                    args.pretty,
                )?;
            } else {
                print_classification(&result);
                match semantic_query {
                    Some(query) => println!("semantic query:  {}", query),
                    None => println!("semantic query:  (not searched)"),
                }
            }
        }
        Command::Eval(e) => {
            let labeled = load_labeled_set(&e.file)?;
            let metrics = evaluate_routing(&classifier, &labeled);
            if args.json {
                print_json(&metrics, args.pretty)?;
            } else {
                print!("{}", format_report(&metrics));
            }
            if let Some(min) = e.min_accuracy {
                if metrics.accuracy < min {
                    anyhow::bail!(
                        "Routing accuracy {:.4} is below the required {:.4}",
                        metrics.accuracy,
                        min
                    );
                }
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", out);
    Ok(())
}

fn print_classification(result: &ClassificationResult) {
    if result.is_greeting {
        println!("greeting:        yes (no retrieval)");
        return;
    }
    println!("query type:      {}", result.query_type);
    println!("biographical:    {}", if result.is_biographical { "yes" } else { "no" });
    println!("complexity k:    {}", result.complexity_k);
    println!("category:        {}", result.query_category);
    println!("max expansions:  {}", result.max_expansions);
    println!(
        "tally:           statistical={} contextual={} hybrid={}",
        result.tally.statistical, result.tally.contextual, result.tally.hybrid
    );
    if !result.tally.matched.is_empty() {
        println!("matched rules:   {}", result.tally.matched.join(", "));
    }
    println!("reasoning:       {}", result.reasoning);
}
