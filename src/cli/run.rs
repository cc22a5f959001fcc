//! Run command implementation

use anyhow::Result;
use clap::Args;
use std::io::IsTerminal;
use std::path::PathBuf;

use super::utils::{format_with_commas, input_root, parse_csv, resolve_config};
use crate::config::CliOverrides;
use crate::pipeline::{Pipeline, RunReport};

#[derive(Args)]
pub struct RunArgs {
    /// Input root holding the category directories (defaults to `input_root` from config, then `.`)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Path to config file (docgate.toml or docgate.yml)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Include only these extensions (comma-separated, e.g., '.md,.json')
    #[arg(short = 'i', long, value_name = "EXTS")]
    pub include_ext: Option<String>,

    /// Exclude paths matching these globs (comma-separated)
    #[arg(short = 'e', long, value_name = "GLOBS")]
    pub exclude_glob: Option<String>,

    /// Follow symbolic links when scanning
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Directory for sql.jsonl, rag.jsonl and report.json
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Archive root for SQL-routed sources
    #[arg(long, value_name = "DIR")]
    pub sql_root: Option<PathBuf>,

    /// Archive root for RAG- and BOTH-routed sources
    #[arg(long, value_name = "DIR")]
    pub rag_root: Option<PathBuf>,

    /// Plan archive moves without touching source files
    #[arg(long)]
    pub dry_run: bool,

    /// Leave source files in place
    #[arg(long)]
    pub no_archive: bool,

    /// SQLite file for dedup across runs
    #[arg(long, value_name = "FILE")]
    pub dedup_db: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(short, long)]
    pub quiet: bool,
}

pub fn run(args: RunArgs) -> Result<()> {
    let config_root = match &args.path {
        Some(path) => input_root(path)?,
        None => input_root(&PathBuf::from("."))?,
    };

    let overrides = CliOverrides {
        input_root: args.path.clone(),
        output_dir: args.output_dir.clone(),
        extensions: parse_csv(&args.include_ext),
        exclude_globs: parse_csv(&args.exclude_glob),
        follow_symlinks: if args.follow_symlinks { Some(true) } else { None },
        dry_run: if args.dry_run { Some(true) } else { None },
        archive_enabled: if args.no_archive { Some(false) } else { None },
        sql_root: args.sql_root.clone(),
        rag_root: args.rag_root.clone(),
        dedup_persist_path: args.dedup_db.clone(),
    };
    let config = resolve_config(&config_root, args.config.as_deref(), overrides)?;

    let root = match (&args.path, &config.input_root) {
        (None, Some(from_file)) => input_root(&config_root.join(from_file))?,
        _ => config_root,
    };

    let show_progress = std::io::stderr().is_terminal() && !args.quiet;
    let pipeline = Pipeline::new(&root, config)?.show_progress(show_progress);
    let report = pipeline.run()?;

    print_summary(&report, pipeline.config().dry_run);
    Ok(())
}

fn print_summary(report: &RunReport, dry_run: bool) {
    let stats = &report.stats;
    println!("Files discovered: {}", format_with_commas(stats.discovery.files_included));
    println!(
        "Sanitize: {} passed, {} repaired, {} failed ({} duplicates)",
        stats.sanitize.passed, stats.sanitize.repaired, stats.sanitize.failed, stats.sanitize.duplicates
    );
    println!(
        "Units: {} ({} JSON repaired)",
        format_with_commas(stats.normalize.units_created),
        stats.normalize.json_repaired
    );
    println!(
        "Routes: SQL {}, RAG {}, BOTH {}, SKIP {}",
        stats.route.sql, stats.route.rag, stats.route.both, stats.route.skip
    );
    if dry_run {
        println!("Archive (dry run): {} planned, {} skipped", stats.cleanup.planned, stats.cleanup.skipped);
    } else {
        println!(
            "Archive: {} moved, {} skipped, {} failed",
            stats.cleanup.moved, stats.cleanup.skipped, stats.cleanup.failed
        );
    }
    for path in &report.output_files {
        println!("Wrote {}", path.display());
    }
    println!("Completed in {:.2}s", stats.processing_time_seconds);
}
