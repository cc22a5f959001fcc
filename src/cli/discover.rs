//! Discover command implementation

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use super::utils::{format_with_commas, input_root, parse_csv, resolve_config};
use crate::config::CliOverrides;
use crate::scan::discover;

#[derive(Args)]
pub struct DiscoverArgs {
    /// Input root holding the category directories
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Path to config file (docgate.toml or docgate.yml)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Include only these extensions (comma-separated)
    #[arg(short = 'i', long, value_name = "EXTS")]
    pub include_ext: Option<String>,

    /// Exclude paths matching these globs (comma-separated)
    #[arg(short = 'e', long, value_name = "GLOBS")]
    pub exclude_glob: Option<String>,

    /// Follow symbolic links when scanning
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Also list every discovered file
    #[arg(short, long)]
    pub list: bool,
}

pub fn run(args: DiscoverArgs) -> Result<()> {
    let root = input_root(&args.path)?;
    let overrides = CliOverrides {
        extensions: parse_csv(&args.include_ext),
        exclude_globs: parse_csv(&args.exclude_glob),
        follow_symlinks: if args.follow_symlinks { Some(true) } else { None },
        ..CliOverrides::default()
    };
    let config = resolve_config(&root, args.config.as_deref(), overrides)?;
    let (discovery, stats) = discover(&root, &config)?;

    println!("Input root: {}", root.display());
    println!(
        "Category directories: {} scanned, {} missing",
        stats.directories_scanned, stats.directories_missing
    );

    if discovery.is_empty() {
        println!("No files found.");
    }
    for (category, files) in &discovery {
        println!("  {}: {}", category.as_str(), format_with_commas(files.len()));
        if args.list {
            for file in files {
                println!("    {} ({})", file.relative_path, file.format.as_str());
            }
        }
    }

    println!("Files included: {}", format_with_commas(stats.files_included));
    let skipped = stats.files_skipped_extension + stats.files_skipped_hidden + stats.files_skipped_glob;
    if skipped > 0 {
        println!(
            "Files skipped: {} (extension {}, hidden {}, glob {})",
            skipped, stats.files_skipped_extension, stats.files_skipped_hidden, stats.files_skipped_glob
        );
    }
    Ok(())
}
