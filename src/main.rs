// Main entry point for the csvql CLI
// Imports CSV files, then runs a statement, exports a table, or opens an interactive shell

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, ValueEnum};
use csvql::{Config, CsvSql, ExportQuoting, ImportSummary, QueryResult, TableNaming};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// csvql - query CSV files with SQL
#[derive(ClapParser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// CSV file to import (repeatable)
    #[arg(short, long = "import", value_name = "FILE")]
    import: Vec<PathBuf>,

    /// Table name for the first imported file (generated when absent)
    #[arg(short, long)]
    table: Option<String>,

    /// Execute a single SQL statement and exit
    #[arg(short, long)]
    execute: Option<String>,

    /// Export a table as CSV and exit
    #[arg(long, value_name = "TABLE")]
    export: Option<String>,

    /// Export destination (stdout when absent)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// How query results are printed
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// VARCHAR bound for inferred TEXT columns
    #[arg(long)]
    text_length: Option<usize>,

    /// Name tables after a hash of the imported file
    #[arg(long)]
    content_hash_names: bool,

    /// Quote exported cells that contain delimiters, quotes or newlines
    #[arg(long)]
    quote_export: bool,

    /// Also reject UPDATE statements without WHERE
    #[arg(long)]
    strict_updates: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Boxed table
    Table,
    /// Pretty-printed JSON
    Json,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(&args)?;
    let service = CsvSql::new(config)?;

    for (i, path) in args.import.iter().enumerate() {
        let name = if i == 0 { args.table.as_deref() } else { None };
        import_file(&service, path, name, args.format)?;
    }

    let one_shot = args.execute.is_some() || args.export.is_some();

    if let Some(sql) = &args.execute {
        execute_query(&service, sql, args.format)?;
    }

    if let Some(table) = &args.export {
        export_table(&service, table, args.output.as_deref())?;
    }

    if one_shot {
        return Ok(());
    }

    // Interactive REPL (Read-Eval-Print Loop)
    println!("╔════════════════════════════════════════════╗");
    println!("║           csvql Interactive Shell          ║");
    println!("║          Query CSV files with SQL          ║");
    println!("╚════════════════════════════════════════════╝");
    println!();
    println!("Type SQL statements or '.help' for help");
    println!("Type '.exit' to quit");
    println!();

    repl(&service, args.format)
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("csvql=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("csvql=warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .init();
}

/// Config file first, then command line flags on top
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(length) = args.text_length {
        config.text_length = length;
    }
    if args.content_hash_names {
        config.table_naming = TableNaming::ContentHash;
    }
    if args.quote_export {
        config.export_quoting = ExportQuoting::Necessary;
    }
    if args.strict_updates {
        config.reject_unqualified_update = true;
    }

    Ok(config)
}

/// REPL implementation: SQL statements plus dot-commands
fn repl(service: &CsvSql, format: OutputFormat) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("csvql> ");
        stdout.flush()?;

        let mut input = String::new();
        if stdin.read_line(&mut input)? == 0 {
            // EOF
            println!();
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if input.starts_with('.') {
            let mut parts = input.split_whitespace();
            let command = parts.next().unwrap_or_default();
            let params: Vec<&str> = parts.collect();

            let outcome = match (command, params.as_slice()) {
                (".exit" | ".quit", _) => {
                    println!("Goodbye!");
                    break;
                }
                (".help", _) => {
                    print_help();
                    Ok(())
                }
                (".tables", _) => list_tables(service),
                (".schema", [table]) => describe_table(service, table),
                (".import", [path]) => import_file(service, Path::new(path), None, format),
                (".import", [path, name]) => import_file(service, Path::new(path), Some(*name), format),
                (".export", [table]) => export_table(service, table, None),
                (".export", [table, path]) => export_table(service, table, Some(Path::new(path))),
                _ => {
                    println!("Unknown or malformed command: {}", input);
                    println!("Type '.help' for help");
                    Ok(())
                }
            };

            if let Err(e) = outcome {
                eprintln!("Error: {:#}", e);
            }
            continue;
        }

        if let Err(e) = execute_query(service, input, format) {
            eprintln!("Error: {:#}", e);
        }
    }

    Ok(())
}

fn import_file(
    service: &CsvSql,
    path: &Path,
    name: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    info!("Importing file: {}", path.display());

    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let summary = match name {
        Some(name) => service.import_as(file, name)?,
        None => service.import(file)?,
    };

    print_import(&summary, format)
}

fn execute_query(service: &CsvSql, sql: &str, format: OutputFormat) -> Result<()> {
    let result = service.execute(sql)?;
    print_result(&result, format)
}

fn export_table(service: &CsvSql, table: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let export = service.export_file(table)?;
            std::fs::write(path, &export.bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "Exported '{}' ({} bytes, {}) to {}",
                table,
                export.bytes.len(),
                export.content_type,
                path.display()
            );
        }
        None => {
            let bytes = service.export(table)?;
            let mut stdout = io::stdout();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn list_tables(service: &CsvSql) -> Result<()> {
    let tables = service.list_tables()?;
    if tables.is_empty() {
        println!("No tables");
    }
    for table in tables {
        println!("{}", table);
    }
    Ok(())
}

fn describe_table(service: &CsvSql, table: &str) -> Result<()> {
    for column in service.describe(table)? {
        let bound = column
            .max_length
            .map(|n| format!("({})", n))
            .unwrap_or_default();
        let key = if column.primary_key { " PRIMARY KEY" } else { "" };
        println!("  {} {}{}{}", column.name, column.data_type, bound, key);
    }
    Ok(())
}

fn print_import(summary: &ImportSummary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(summary)?),
        OutputFormat::Table => {
            let columns: Vec<String> = summary
                .headers
                .iter()
                .zip(&summary.column_types)
                .map(|(name, ty)| format!("{} {}", name, ty))
                .collect();
            println!(
                "Imported {} row(s) into '{}' ({})",
                summary.rows,
                summary.table_name,
                columns.join(", ")
            );
        }
    }
    Ok(())
}

fn print_result(result: &QueryResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
        OutputFormat::Table => println!("{}", result.format()),
    }
    Ok(())
}

/// Print help information
fn print_help() {
    println!("╔════════════════════════════════════════════╗");
    println!("║                csvql Help                  ║");
    println!("╚════════════════════════════════════════════╝");
    println!();
    println!("Special Commands:");
    println!("  .import FILE [NAME]    Import a CSV file (new table unless NAME is given)");
    println!("  .export TABLE [FILE]   Export a table as CSV (stdout unless FILE is given)");
    println!("  .tables                List tables");
    println!("  .schema TABLE          Show a table's columns");
    println!("  .help                  Show this help message");
    println!("  .exit, .quit           Exit the shell");
    println!();
    println!("Supported SQL Statements:");
    println!();
    println!("  SELECT:");
    println!("    SELECT * FROM csv_table_1");
    println!("    SELECT name, age AS years FROM csv_table_1 WHERE age >= 18 ORDER BY age DESC LIMIT 10");
    println!();
    println!("  INSERT:");
    println!("    INSERT INTO csv_table_1 (name, age) VALUES ('Alice', 30), ('Bob', 25)");
    println!();
    println!("  UPDATE:");
    println!("    UPDATE csv_table_1 SET age = 31 WHERE name = 'Alice'");
    println!();
    println!("  DELETE:");
    println!("    DELETE FROM csv_table_1 WHERE age < 18");
    println!();
    println!("Notes:");
    println!("  - SQL keywords and identifiers are case-insensitive");
    println!("  - String values must be in single quotes");
    println!("  - DROP, TRUNCATE and ALTER are rejected anywhere in a statement");
    println!("  - DELETE requires a WHERE clause");
    println!();
}
