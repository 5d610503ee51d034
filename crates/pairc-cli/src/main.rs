//! pairc CLI
//!
//! Command-line tool for pairing detail/supplement tables, compiling them, and
//! packaging one sorted master file per folder.

use clap::{Parser, Subcommand};
use pairc_core::{
    compile_tree, parse_csv, resolve, run_archive, scan_tree, Config, RunReport,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pairc")]
#[command(about = "Pair-based CSV compiler with PART_NO sorting", long_about = None)]
#[command(version)]
struct Cli {
    /// Log per-file detail
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a directory tree and count pairs per folder
    Scan {
        /// Root directory to scan
        #[arg(short, long)]
        root: PathBuf,

        /// Config file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List every group with its detail and supplement files
    Pairs {
        /// Root directory to scan
        #[arg(short, long)]
        root: PathBuf,

        /// Config file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Show file paths for each group
        #[arg(short, long)]
        paths: bool,
    },

    /// Parse and display a single CSV file
    Parse {
        /// Path to CSV file
        #[arg(short, long)]
        file: PathBuf,

        /// Number of rows to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Compile an on-disk tree into per-folder master files
    Compile {
        /// Root directory to scan
        #[arg(short, long)]
        root: PathBuf,

        /// Directory that receives the master files
        #[arg(short, long)]
        output: PathBuf,

        /// Config file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the sort column
        #[arg(long)]
        sort_column: Option<String>,

        /// Write the run report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Compile a zip archive into a clean zip of master files
    Run {
        /// Input zip archive
        #[arg(short, long)]
        archive: PathBuf,

        /// Output zip archive
        #[arg(short, long, default_value = "clean_compiled_folders.zip")]
        output: PathBuf,

        /// Config file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the sort column
        #[arg(long)]
        sort_column: Option<String>,

        /// Write the run report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Write a config file with the default settings
    InitConfig {
        /// Output path for the config file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_filter = if verbose {
        "pairc=debug,pairc_core=debug"
    } else if quiet {
        "pairc=warn,pairc_core=warn"
    } else {
        "pairc=info,pairc_core=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn run(command: Commands) -> pairc_core::Result<()> {
    match command {
        Commands::Scan { root, config } => cmd_scan(&root, config.as_deref()),
        Commands::Pairs {
            root,
            config,
            paths,
        } => cmd_pairs(&root, config.as_deref(), paths),
        Commands::Parse { file, limit } => cmd_parse(&file, limit),
        Commands::Compile {
            root,
            output,
            config,
            sort_column,
            report,
        } => {
            let config = load_config(config.as_deref(), sort_column)?;
            let result = compile_tree(&root, &output, &config)?;
            finish(&result, report.as_deref())?;
            println!("Master files written to {}", output.display());
            Ok(())
        }
        Commands::Run {
            archive,
            output,
            config,
            sort_column,
            report,
        } => {
            let config = load_config(config.as_deref(), sort_column)?;
            let result = run_archive(&archive, &output, &config)?;
            finish(&result, report.as_deref())?;
            println!("Download: {}", output.display());
            Ok(())
        }
        Commands::InitConfig { output } => cmd_init_config(&output),
    }
}

fn load_config(path: Option<&Path>, sort_column: Option<String>) -> pairc_core::Result<Config> {
    let mut config = match path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(column) = sort_column {
        config.sort_column = column;
    }
    Ok(config)
}

fn cmd_scan(root: &Path, config: Option<&Path>) -> pairc_core::Result<()> {
    let config = load_config(config, None)?;
    let scan = scan_tree(root, &config.pairing)?;
    let resolution = resolve(&scan);

    println!("Scanned {}", scan.root.display());
    println!(
        "Found {} candidate files in {} folders, {} complete pairs",
        scan.total_files,
        scan.directories.len(),
        resolution.total_pairs
    );
    println!();

    for plan in &resolution.directories {
        println!(
            "  {} ({} pairs, {} incomplete)",
            plan.name,
            plan.pairs.len(),
            plan.incomplete.len()
        );
    }

    Ok(())
}

fn cmd_pairs(root: &Path, config: Option<&Path>, show_paths: bool) -> pairc_core::Result<()> {
    let config = load_config(config, None)?;
    let scan = scan_tree(root, &config.pairing)?;

    for dir in &scan.directories {
        println!("{} ({})", dir.name, dir.path.display());
        for group in dir.groups.values() {
            let status = if group.is_complete() { "pair" } else { "incomplete" };
            println!("  {} [{}]", group.base, status);
            if show_paths {
                for (role, path) in [("detail", &group.detail), ("supplement", &group.supplement)] {
                    match path {
                        Some(path) => println!("    {}: {}", role, path.display()),
                        None => println!("    {}: (missing)", role),
                    }
                }
            }
        }
        println!();
    }

    Ok(())
}

fn cmd_parse(file: &Path, limit: usize) -> pairc_core::Result<()> {
    let table = parse_csv(file)?;

    println!("File: {}", file.display());
    println!("Columns: {}", table.column_count());
    println!("Rows: {}", table.row_count());
    println!();

    // Print header
    let header = table.column_names();
    println!("{}", header.join("\t"));
    println!("{}", "-".repeat(header.len() * 12));

    for row in table.rows.iter().take(limit) {
        let values: Vec<String> = row.cells.iter().map(|c| c.to_string_value()).collect();
        println!("{}", values.join("\t"));
    }

    if table.row_count() > limit {
        println!("... ({} more rows)", table.row_count() - limit);
    }

    Ok(())
}

fn cmd_init_config(output: &Path) -> pairc_core::Result<()> {
    Config::default().save(output)?;
    println!("Created config file: {}", output.display());
    println!();
    println!("Edit the file to change the naming convention or sort column, then run:");
    println!("  pairc run --archive <zip> --config {}", output.display());

    Ok(())
}

/// Print the summary table, metrics and warnings; optionally save the report
fn finish(report: &RunReport, report_path: Option<&Path>) -> pairc_core::Result<()> {
    println!();
    println!("Compilation Summary");
    println!();
    print!("{}", report.summary);
    println!();
    println!(
        "Total folders with pairs: {}",
        report.summary.directories_with_pairs()
    );
    println!(
        "Grand total rows in all master files: {}",
        report.summary.total_master_rows()
    );

    if !report.warnings.is_empty() {
        println!();
        println!("Warnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  {}", warning);
        }
    }

    if let Some(path) = report_path {
        report.save(path)?;
        println!();
        println!("Report written to {}", path.display());
    }

    println!();
    Ok(())
}
