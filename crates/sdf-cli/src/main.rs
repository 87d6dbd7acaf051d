//! `sdf` CLI — pretty-print, query, validate and export SDF files from the
//! command line.
//!
//! ## Usage
//!
//! ```sh
//! # Pretty-print a document (stdin → stdout)
//! echo '(book {year 1851} [(title "Moby-Dick")])' | sdf print
//!
//! # Pretty-print from file to file
//! sdf print -i data.sdf -o formatted.sdf
//!
//! # Query with a path selector, printing the matched paths
//! sdf query '/book/title' -i data.sdf
//!
//! # Query and print the matched values instead
//! sdf query '[@year>=1800]' --values -i data.sdf
//!
//! # Validate against a schema
//! sdf validate --schema book.schema.sdf -i data.sdf
//!
//! # Validate while parsing, stopping at the first unfixable prefix
//! sdf validate --schema book.schema.sdf --streaming -i data.sdf
//!
//! # Export to JSON
//! sdf export -i data.sdf
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Read};
use std::process;

#[derive(Parser)]
#[command(name = "sdf", version, about = "SDF (S-expression Data Format) CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a document and pretty-print it
    Print {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Find elements matching a path selector
    Query {
        /// The selector, e.g. "/html/body/p" or "[@src^=\"file\"]"
        selector: String,
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Print the matched values instead of their paths
        #[arg(long)]
        values: bool,
    },
    /// Check a document against a schema
    Validate {
        /// Schema file
        #[arg(short, long)]
        schema: String,
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Validate while parsing instead of after
        #[arg(long)]
        streaming: bool,
    },
    /// Convert a document to JSON
    Export {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Print { input, output } => {
            let text = read_input(input.as_deref())?;
            let document = sdf_core::parse(&text).context("Failed to parse document")?;
            write_output(output.as_deref(), &sdf_core::print(&document))?;
        }
        Commands::Query {
            selector,
            input,
            values,
        } => {
            let text = read_input(input.as_deref())?;
            let document = sdf_core::parse(&text).context("Failed to parse document")?;
            let matches = sdf_core::find(&document, &selector)?;
            for m in matches.iter() {
                if values {
                    println!("{}", sdf_core::print(m.value()));
                } else {
                    println!("{}", m.path());
                }
            }
        }
        Commands::Validate {
            schema,
            input,
            streaming,
        } => {
            let schema_text = std::fs::read_to_string(&schema)
                .with_context(|| format!("Failed to read schema file: {}", schema))?;
            let schema =
                sdf_core::Schema::parse(&schema_text).context("Failed to build schema")?;
            let text = read_input(input.as_deref())?;

            let outcome = if streaming {
                sdf_core::parse_validated(&text, &schema).map(|_| ())
            } else {
                let document = sdf_core::parse(&text).context("Failed to parse document")?;
                schema.validate(&document).map_err(Into::into)
            };
            match outcome {
                Ok(()) => println!("Document is valid."),
                Err(e) => {
                    eprintln!("{e}");
                    process::exit(1);
                }
            }
        }
        Commands::Export { input, output } => {
            let text = read_input(input.as_deref())?;
            let document = sdf_core::parse(&text).context("Failed to parse document")?;
            let json = serde_json::to_string_pretty(&sdf_core::to_json(&document))?;
            write_output(output.as_deref(), &json)?;
        }
    }

    Ok(())
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
