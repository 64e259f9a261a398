use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dialoguer::Select;
use dupecull::review::{self, HistoryLog};
use dupecull::{BlurDetector, DetectorConfig, DuplicateDetector, DuplicateGroup, ReviewDecision};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "dupecull", version, about = "Find and review visually similar photos")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct Tuning {
    /// Maximum Hamming distance for two images to count as similar
    #[arg(long, default_value_t = 5)]
    threshold: u32,

    /// Leading fingerprint bits used to bucket comparisons
    #[arg(long, default_value_t = 12)]
    prefix_bits: u32,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find and list groups of similar images
    Scan {
        /// Directory to scan
        #[arg(short, long, value_name = "DIR")]
        path: PathBuf,

        #[command(flatten)]
        tuning: Tuning,
    },

    /// Copy each group into a numbered folder under `<dir>/duplicates`
    Collect {
        /// Directory to scan
        #[arg(short, long, value_name = "DIR")]
        path: PathBuf,

        /// Destination for the review folders (default: `<dir>/duplicates`)
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,

        #[command(flatten)]
        tuning: Tuning,
    },

    /// Review groups one at a time, deleting on decision
    Review {
        /// Directory to scan
        #[arg(short, long, value_name = "DIR")]
        path: PathBuf,

        /// Do not record decisions to `.history.jsonl`
        #[arg(long)]
        no_history: bool,

        #[command(flatten)]
        tuning: Tuning,
    },

    /// Move blurry images into `<dir>/blurry_review`
    Blur {
        /// Directory to scan
        #[arg(short, long, value_name = "DIR")]
        path: PathBuf,

        /// Laplacian variance below which an image counts as blurry
        #[arg(long, default_value_t = BlurDetector::DEFAULT_THRESHOLD)]
        threshold: f64,

        /// Destination for flagged images (default: `<dir>/blurry_review`)
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { path, tuning } => {
            let groups = find_groups(&path, &tuning)?;
            if groups.is_empty() {
                println!("No similar images found.");
            } else {
                println!("Found {} group(s) of similar images:", groups.len());
                for (i, group) in groups.iter().enumerate() {
                    println!(" Group {}:", i + 1);
                    for file in &group.images {
                        println!("   ▶ {}", file.display());
                    }
                }
            }
        }

        Commands::Collect { path, out, tuning } => {
            let groups = find_groups(&path, &tuning)?;
            if groups.is_empty() {
                println!("No similar images found.");
                return Ok(());
            }

            let out_dir = out.unwrap_or_else(|| path.join("duplicates"));
            let manifest = review::copy_groups(&groups, &out_dir)
                .with_context(|| format!("failed to copy groups into {}", out_dir.display()))?;
            for group in &manifest.groups {
                println!(
                    "Group {}: {} images copied to {}",
                    group.number,
                    group.images.len(),
                    group.dir.display()
                );
            }
            println!("✅ Review the folders under {}", out_dir.display());
        }

        Commands::Review {
            path,
            no_history,
            tuning,
        } => {
            let groups = find_groups(&path, &tuning)?;
            if groups.is_empty() {
                println!("No similar images found.");
                return Ok(());
            }

            let mut session = review::ReviewSession::new(groups);
            if !no_history {
                session = session.with_history(HistoryLog::new(path.join(".history.jsonl")));
            }
            run_review(session)?;
        }

        Commands::Blur {
            path,
            threshold,
            out,
        } => {
            let review_dir = out.unwrap_or_else(|| path.join("blurry_review"));
            println!(
                "▶ Scanning {} for blur (threshold = {})…",
                path.display(),
                threshold
            );
            let moved = BlurDetector::new(threshold)
                .collect_blurry(&path, &review_dir)
                .with_context(|| format!("blur sweep of {} failed", path.display()))?;
            for file in &moved {
                println!("   ▶ flagged {}", file.display());
            }
            println!(
                "✅ {} blurry image(s) moved to {}",
                moved.len(),
                review_dir.display()
            );
        }
    }

    Ok(())
}

/// Run the detection pipeline with a spinner and a timing line.
fn find_groups(path: &PathBuf, tuning: &Tuning) -> Result<Vec<DuplicateGroup>> {
    let detector = DuplicateDetector::new(DetectorConfig {
        prefix_bits: tuning.prefix_bits,
        threshold: tuning.threshold,
        ..DetectorConfig::default()
    })?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
    spinner.set_message(format!("Hashing images in {}…", path.display()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let start = Instant::now();
    let groups = detector
        .find_duplicates_in_dir(path)
        .with_context(|| format!("failed to scan {}", path.display()))?;
    spinner.finish_with_message(format!("Grouping took {:.2?}", start.elapsed()));

    Ok(groups)
}

fn run_review(mut session: review::ReviewSession) -> Result<()> {
    let mut deleted_total = 0usize;

    loop {
        let (index, total) = session.position();
        let Some(group) = session.current() else { break };
        let images = group.images.clone();

        println!("\nGroup {} of {}:", index + 1, total);
        let mut items: Vec<String> = images
            .iter()
            .map(|p| format!("Keep {}", p.display()))
            .collect();
        items.push("Skip group".to_string());
        items.push("Delete all".to_string());

        let choice = Select::new()
            .with_prompt("Choose the image to keep")
            .items(&items)
            .default(0)
            .interact_opt()
            .context("selection prompt failed")?;

        let decision = match choice {
            None => {
                session.abort();
                println!("Aborted; remaining groups left untouched.");
                break;
            }
            Some(i) if i < images.len() => ReviewDecision::Keep(i),
            Some(i) if i == images.len() => ReviewDecision::Skip,
            Some(_) => ReviewDecision::DeleteAll,
        };

        let outcome = session.resolve(decision)?;
        deleted_total += outcome.deleted.len();
        for file in &outcome.deleted {
            println!("   🗑️  Deleted {}", file.display());
        }
    }

    println!("✅ Review finished; {} file(s) deleted.", deleted_total);
    Ok(())
}
