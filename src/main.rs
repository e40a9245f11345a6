//! HodDB command-line interface
//!
//! Loads Turtle files into versioned graphs and runs JSON queries against them.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::error;

use hoddb::{HodConfig, HodDb, Result, SelectQuery};

#[derive(Parser)]
#[command(name = "hoddb", version, about = "Versioned Brick graph database")]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Insert a Turtle file into a graph as a new version
    Load {
        graph: String,
        file: PathBuf,
        /// Extra files loaded into the same version
        #[arg(long = "ontology")]
        ontologies: Vec<PathBuf>,
    },
    /// Run a JSON query file
    Query {
        file: PathBuf,
        /// Only report the number of rows
        #[arg(long)]
        count: bool,
        /// Print the operator plan instead of running the query
        #[arg(long)]
        explain: bool,
    },
    /// List graphs
    Graphs,
    /// List the versions of a graph
    Versions { graph: String },
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => HodConfig::from_file(path)?,
        None => HodConfig::in_memory(),
    };
    let db = HodDb::open(&config)?;

    match cli.command {
        Command::Load { graph, file, ontologies } => {
            let mut all = config.database.ontologies.clone();
            all.extend(ontologies);
            let version = db.load_file(&graph, &file, &all)?;
            println!("{} @ {}", graph, version);
        }
        Command::Query { file, count, explain } => {
            let text = std::fs::read_to_string(&file)?;
            let query = SelectQuery::from_json_str(&text)?;
            if explain {
                print!("{}", db.explain(&query)?);
            } else if count {
                let response = db.count(&query)?;
                println!("{}", response.count);
            } else {
                println!("{}", db.select(&query)?);
            }
        }
        Command::Graphs => {
            for graph in db.graphs() {
                println!("{}", graph);
            }
        }
        Command::Versions { graph } => {
            for version in db.versions(&graph)? {
                println!("{}", version);
            }
        }
    }
    db.close()
}

fn main() -> ExitCode {
    env_logger::init();
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
