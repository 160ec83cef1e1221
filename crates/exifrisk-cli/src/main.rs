// File: crates/exifrisk-cli/src/main.rs

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use clap::builder::RangedU64ValueParser;
use exifrisk_core::config::IFD_DEPTH_CEILING;
use exifrisk_core::{DecodeLimits, ExtractionResult, RiskCategory, extract_metadata_with};
use log::{LevelFilter, debug};
use std::path::{Path, PathBuf};
use tokio::task::JoinSet;

/// A tool to see which metadata in your photos puts your privacy at risk.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// View classified metadata for one or more files
    View {
        /// The paths to the files
        #[arg(required = true)]
        file_paths: Vec<PathBuf>,

        /// Print a JSON array of {file, metadata} objects instead of a listing
        #[arg(long)]
        json: bool,

        /// MIME type hint (guessed from the extension by default)
        #[arg(long)]
        mime: Option<String>,

        /// Largest entry count accepted for a single directory
        #[arg(long, default_value_t = DecodeLimits::default().max_ifd_entries)]
        max_ifd_entries: usize,

        /// Deepest sub-directory nesting that is followed
        #[arg(
            long,
            default_value_t = DecodeLimits::default().max_ifd_depth,
            value_parser = RangedU64ValueParser::<usize>::new().range(0..=IFD_DEPTH_CEILING as u64),
        )]
        max_ifd_depth: usize,
    },
    /// Print the GPS position embedded in a file
    Gps {
        /// The path to the file
        #[arg(required = true)]
        file_path: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn guess_mime(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

async fn extract_file(
    file_path: PathBuf,
    mime: Option<String>,
    limits: DecodeLimits,
) -> Result<ExtractionResult> {
    let file_bytes = tokio::fs::read(&file_path)
        .await
        .with_context(|| format!("Failed to read file: {}", file_path.display()))?;
    let mime = mime.unwrap_or_else(|| guess_mime(&file_path));
    debug!("{}: {} bytes, hint {mime}", file_path.display(), file_bytes.len());

    // Decoding is CPU-bound; keep it off the async workers.
    tokio::task::spawn_blocking(move || extract_metadata_with(&file_bytes, &mime, &limits))
        .await
        .with_context(|| format!("Metadata extraction panicked for {}", file_path.display()))
}

fn print_listing(file_path: &Path, result: &ExtractionResult) {
    if result.tags.is_empty() {
        println!("No metadata found in {}.", file_path.display());
        return;
    }

    let format = result.image_format.as_deref().unwrap_or("unknown format");
    println!("Metadata for {} ({format}):", file_path.display());
    for entry in &result.tags {
        println!("  - {}: {} = {}", entry.category, entry.tag, entry.value);
        println!("      {}", entry.description);
    }

    let high = result
        .tags
        .iter()
        .filter(|t| t.category == RiskCategory::High)
        .count();
    if high > 0 {
        println!("{high} high-risk tag(s) found.");
    }
    if let Some(gps) = &result.gps {
        println!("Location: {:.6}, {:.6}", gps.latitude, gps.longitude);
    }
}

/// One `{file, metadata}` object per input, always as an array.
fn render_json(reports: &[(&Path, ExtractionResult)]) -> Result<String> {
    let reports: Vec<_> = reports
        .iter()
        .map(|(file_path, result)| {
            serde_json::json!({
                "file": file_path.display().to_string(),
                "metadata": result,
            })
        })
        .collect();
    Ok(serde_json::to_string_pretty(&reports)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::View {
            file_paths,
            json,
            mime,
            max_ifd_entries,
            max_ifd_depth,
        } => {
            let limits = DecodeLimits {
                max_ifd_entries,
                max_ifd_depth,
                ..DecodeLimits::default()
            };

            let mut tasks = JoinSet::new();
            for (index, file_path) in file_paths.iter().cloned().enumerate() {
                let mime = mime.clone();
                let limits = limits.clone();
                tasks.spawn(async move { (index, extract_file(file_path, mime, limits).await) });
            }

            let mut results: Vec<Option<Result<ExtractionResult>>> =
                file_paths.iter().map(|_| None).collect();
            while let Some(joined) = tasks.join_next().await {
                let (index, result) = joined.context("File task failed")?;
                results[index] = Some(result);
            }

            let mut reports = Vec::with_capacity(file_paths.len());
            for (file_path, result) in file_paths.iter().zip(results) {
                let result = result.context("File task did not report")??;
                if json {
                    reports.push((file_path.as_path(), result));
                } else {
                    print_listing(file_path, &result);
                }
            }

            if json {
                println!("{}", render_json(&reports)?);
            }
        }

        Commands::Gps { file_path } => {
            let result = extract_file(file_path.clone(), None, DecodeLimits::default()).await?;
            match result.gps {
                Some(gps) => {
                    print!("{:.6}, {:.6}", gps.latitude, gps.longitude);
                    if let Some(altitude) = gps.altitude {
                        print!(" ({altitude:.1} m)");
                    }
                    println!();
                }
                None => println!("No GPS data in {}.", file_path.display()),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use exifrisk_core::extract_metadata;

    #[test]
    fn max_ifd_depth_is_bounded() {
        let parse = |depth: &str| {
            Cli::try_parse_from(["exifrisk", "view", "a.jpg", "--max-ifd-depth", depth])
        };
        assert!(parse("8").is_ok());
        assert!(parse(&IFD_DEPTH_CEILING.to_string()).is_ok());
        assert!(parse(&(IFD_DEPTH_CEILING + 1).to_string()).is_err());
        assert!(parse("100000").is_err());
    }

    #[test]
    fn json_is_an_array_even_for_one_file() {
        let result = extract_metadata(b"not an image", "");
        let out = render_json(&[(Path::new("a.bin"), result)]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{ "file": "a.bin", "metadata": { "tags": [] } }])
        );
    }
}
