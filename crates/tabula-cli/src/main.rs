//! tabula CLI
//!
//! Interactive shell and script runner for the in-memory relational engine.

mod render;

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use tabula_engine::{Database, Outcome, Result as EngineResult};

/// In-memory relational database with a SQL-like command language.
#[derive(Parser)]
#[command(name = "tabula")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Script file of `;`-terminated commands; omit for the interactive prompt.
    script: Option<PathBuf>,

    /// Print query results as JSON objects instead of aligned tables.
    #[arg(long)]
    json: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut db = Database::new();
    match cli.script {
        Some(path) => {
            let input = fs::read_to_string(path)?;
            run_input(&mut db, &input, cli.json);
            Ok(())
        }
        None => repl(&mut db, cli.json),
    }
}

/// Reads commands from stdin until EOF or `exit;`. Input accumulates
/// across lines until a `;` completes a command.
fn repl(db: &mut Database, json: bool) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut buffer = String::new();

    loop {
        let prompt = if buffer.trim().is_empty() { "> " } else { ". " };
        print!("{prompt}");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        buffer.push_str(&line);

        while let Some(position) = find_command_end(&buffer) {
            let command: String = buffer.drain(..=position).collect();
            let trimmed = command.trim().trim_end_matches(';').trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.eq_ignore_ascii_case("exit") {
                return Ok(());
            }
            if let Some(table) = trimmed.strip_prefix("show ") {
                show_table(db, table.trim());
                continue;
            }
            run_input(db, trimmed, json);
        }
    }
    Ok(())
}

/// Finds the first `;` outside quoted literals.
fn find_command_end(input: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in input.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' => quote = Some(c),
                ';' => return Some(i),
                _ => {}
            },
        }
    }
    None
}

/// Executes a chunk of command text, reporting each command's result.
fn run_input(db: &mut Database, input: &str, json: bool) {
    for result in db.execute_script(input) {
        report(&result, json);
    }
}

/// Dumps a relation's contents (a shell nicety, not part of the command
/// language).
fn show_table(db: &Database, name: &str) {
    match db.catalog().get(name) {
        Ok(relation) => print!("{}", render::render_relation(relation)),
        Err(e) => println!("ERROR: {e}"),
    }
}

fn report(result: &EngineResult<Outcome>, json: bool) {
    match result {
        Ok(Outcome::Rows(output)) => {
            if json {
                match serde_json::to_string(output) {
                    Ok(rendered) => println!("{rendered}"),
                    Err(e) => println!("ERROR: {e}"),
                }
            } else {
                print!("{}", render::render_query(output));
            }
        }
        Ok(Outcome::TableCreated(table)) => info!("created table {table}"),
        Ok(Outcome::TableDropped(table)) => info!("dropped table {table}"),
        Ok(Outcome::Loaded { table, rows }) => info!("loaded {rows} rows into {table}"),
        Ok(Outcome::Inserted { table }) => info!("inserted 1 row into {table}"),
        Ok(Outcome::Updated { table, rows }) => info!("updated {rows} rows in {table}"),
        Ok(Outcome::Deleted { table, rows }) => info!("deleted {rows} rows from {table}"),
        Err(e) => println!("ERROR: {e}"),
    }
}
