//! lexmatrix CLI
//!
//! Moves cognate judgements between a relational wordlist (CSV tables plus
//! JSON metadata) and an editable cognate matrix (JSON sheet):
//! - `import-cognates` replaces the cognate tables with what a sheet says
//! - `export-cognates` writes the current tables as a sheet
//! - `add-singletons` gives every uncovered form its own cognateset
//! - `import-interleaved` turns a form/code sheet into a forms CSV

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use lexmatrix_cognates::cell_parser::CellSyntax;
use lexmatrix_cognates::export::{MatrixWriter, Order};
use lexmatrix_cognates::import::MatrixImporter;
use lexmatrix_cognates::interleaved::import_interleaved;
use lexmatrix_cognates::singletons::add_singleton_cognatesets;
use lexmatrix_cognates::{DiagnosticKind, Diagnostics, Snapshot};
use lexmatrix_dataset::Dataset;
use lexmatrix_grid::Grid;
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "lexmatrix")]
#[command(author, version, about = "Cognate matrix import/export for relational wordlists")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// JSON options file (see `import`, `export`, `singletons` sections)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace the Cognateset and Cognate tables with the contents of a sheet
    ImportCognates {
        /// Cognate matrix sheet (JSON)
        sheet: PathBuf,
        #[arg(long)]
        metadata: PathBuf,
        /// Regex with a named group `ID` applied to hyperlink targets
        #[arg(long)]
        formid_regex: Option<String>,
        /// Rows above the data band
        #[arg(long)]
        header_rows: Option<usize>,
        #[arg(long, value_enum)]
        parser: Option<ParserArg>,
    },

    /// Write the Cognateset and Cognate tables as a cognate matrix
    ExportCognates {
        /// Output sheet (JSON)
        out: PathBuf,
        #[arg(long)]
        metadata: PathBuf,
        /// Row order: `size`, `table`, or a cognateset column to sort by
        #[arg(long, value_parser = parse_order)]
        sort: Option<Order>,
        /// Column order: `size`, `table`, or a language column to sort by
        #[arg(long, value_parser = parse_order)]
        language_order: Option<Order>,
        /// Hyperlink target for forms; `{}` is replaced by the form id
        #[arg(long)]
        url_template: Option<String>,
    },

    /// Add a singleton cognateset for every form without a judgement
    AddSingletons {
        #[arg(long)]
        metadata: PathBuf,
    },

    /// Read a sheet with interleaved form and cognate-code rows
    ImportInterleaved {
        /// Interleaved sheet (JSON)
        sheet: PathBuf,
        /// Forms CSV to write
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ParserArg {
    Hyperlink,
    Plain,
    Multi,
}

impl From<ParserArg> for CellSyntax {
    fn from(arg: ParserArg) -> Self {
        match arg {
            ParserArg::Hyperlink => CellSyntax::Hyperlink,
            ParserArg::Plain => CellSyntax::PlainText,
            ParserArg::Multi => CellSyntax::MultiValue,
        }
    }
}

fn parse_order(s: &str) -> Result<Order, Infallible> {
    Ok(match s {
        "size" => Order::SizeDescending,
        "table" => Order::Table,
        property => Order::Alphabetical(property.to_string()),
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::ImportCognates {
            sheet,
            metadata,
            formid_regex,
            header_rows,
            parser,
        } => {
            if let Some(regex) = formid_regex {
                config.import.formid_regex = regex;
            }
            if let Some(rows) = header_rows {
                config.import.header_rows = rows;
            }
            if let Some(parser) = parser {
                config.import.syntax = parser.into();
            }
            cmd_import_cognates(&sheet, &metadata, config)
        }
        Commands::ExportCognates {
            out,
            metadata,
            sort,
            language_order,
            url_template,
        } => {
            if let Some(order) = sort {
                config.export.row_order = order;
            }
            if let Some(order) = language_order {
                config.export.language_order = order;
            }
            if let Some(template) = url_template {
                config.export.url_template = template;
            }
            cmd_export_cognates(&out, &metadata, config)
        }
        Commands::AddSingletons { metadata } => cmd_add_singletons(&metadata, config),
        Commands::ImportInterleaved { sheet, out } => cmd_import_interleaved(&sheet, &out),
    }
}

fn load_dataset(metadata: &Path) -> Result<Dataset> {
    Dataset::load(metadata).with_context(|| format!("loading dataset {}", metadata.display()))
}

fn cmd_import_cognates(sheet: &Path, metadata: &Path, config: Config) -> Result<()> {
    println!(
        "{} cognate matrix {}",
        "Importing".green().bold(),
        sheet.display()
    );
    let mut dataset = load_dataset(metadata)?;
    let grid = Grid::load_json(sheet)?;

    let snapshot = Snapshot::capture(&dataset)?;
    let outcome = MatrixImporter::new(&snapshot, config.import)?.import(&grid)?;
    let (sets, judgements) = (outcome.cognatesets.len(), outcome.judgements.len());
    let diagnostics = outcome.apply(&mut dataset)?;
    dataset.persist()?;

    println!(
        "  {} {} cognatesets, {} judgements",
        "✓".green(),
        sets,
        judgements
    );
    report(&diagnostics);
    Ok(())
}

fn cmd_export_cognates(out: &Path, metadata: &Path, config: Config) -> Result<()> {
    println!("{} cognate matrix to {}", "Exporting".green().bold(), out.display());
    let dataset = load_dataset(metadata)?;
    let snapshot = Snapshot::capture(&dataset)?;
    let outcome = MatrixWriter::new(&snapshot, config.export).write();
    outcome.grid.save_json(out)?;

    println!(
        "  {} {} rows × {} columns",
        "✓".green(),
        outcome.grid.height(),
        outcome.grid.width()
    );
    report(&outcome.diagnostics);
    Ok(())
}

fn cmd_add_singletons(metadata: &Path, config: Config) -> Result<()> {
    println!("{} singleton cognatesets", "Adding".green().bold());
    let mut dataset = load_dataset(metadata)?;
    let snapshot = Snapshot::capture(&dataset)?;
    let outcome = add_singleton_cognatesets(&snapshot, &config.singletons);
    let added = outcome.added;
    let diagnostics = outcome.apply(&mut dataset)?;
    dataset.persist()?;

    println!("  {} {} cognatesets added", "✓".green(), added);
    report(&diagnostics);
    Ok(())
}

fn cmd_import_interleaved(sheet: &Path, out: &Path) -> Result<()> {
    println!(
        "{} interleaved sheet {}",
        "Importing".green().bold(),
        sheet.display()
    );
    let grid = Grid::load_json(sheet)?;
    let mut diagnostics = Diagnostics::new();
    let records = import_interleaved(&grid, &mut diagnostics);

    let mut writer =
        csv::Writer::from_path(out).with_context(|| format!("creating {}", out.display()))?;
    for record in &records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    println!(
        "  {} {} forms written to {}",
        "✓".green(),
        records.len(),
        out.display()
    );
    report(&diagnostics);
    Ok(())
}

fn report(diagnostics: &Diagnostics) {
    if diagnostics.is_empty() {
        return;
    }
    for diagnostic in diagnostics.iter() {
        let line = diagnostic.to_string();
        match diagnostic.kind {
            DiagnosticKind::MissingStatusColumn => println!("  {}", line.dimmed()),
            _ => println!("  {}", line.yellow()),
        }
    }
    println!(
        "{} {} diagnostics ({} reference mismatches, {} parse ambiguities)",
        "Done with".yellow().bold(),
        diagnostics.len(),
        diagnostics.count(DiagnosticKind::ReferenceMismatch),
        diagnostics.count(DiagnosticKind::ParseAmbiguity),
    );
}
