use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "deferred workspace automation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the lazy benchmarks with and without trace events compiled in
    Bench {
        /// Run quickly (lower sample size/time)
        #[arg(long, default_value_t = false)]
        quick: bool,

        /// Generate report only (skip running benchmarks)
        #[arg(long, default_value_t = false)]
        report_only: bool,
    },
    /// Model-check `SyncLazy` with loom
    Loom,
}

/// Baseline name and the cargo feature arguments that produce it.
const CONFIGURATIONS: &[(&str, &[&str])] = &[
    ("default", &[]),
    ("tracing", &["--features", "tracing"]),
];

const BENCH: &str = "lazy_benchmark";

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Bench { quick, report_only } => {
            if !report_only {
                run_benchmarks(quick)?;
            }
            generate_report()?;
        }
        Commands::Loom => run_loom()?,
    }

    Ok(())
}

fn run_benchmarks(quick: bool) -> Result<()> {
    println!("Running lazy benchmarks...");

    for (baseline, features) in CONFIGURATIONS {
        println!("\n>>> Benchmarking configuration: {baseline}");
        let start = Instant::now();

        let mut cmd = Command::new("cargo");
        cmd.env("CARGO_INCREMENTAL", "0");
        cmd.args(["bench", "--bench", BENCH]).args(*features);

        // Args for the test runner (Criterion) go after --
        cmd.arg("--").arg("--save-baseline").arg(baseline);

        if quick {
            cmd.args(["--measurement-time", "0.1", "--noplot", "--sample-size", "10"]);
        }

        let status = cmd
            .status()
            .with_context(|| format!("Failed to run bench for {baseline}"))?;

        if status.success() {
            println!("Finished {baseline} in {:.2?}", start.elapsed());
        } else {
            eprintln!("Warning: Benchmark failed for {baseline}");
        }
    }

    Ok(())
}

fn run_loom() -> Result<()> {
    let status = Command::new("cargo")
        .env("RUSTFLAGS", "--cfg loom")
        .args(["test", "--release", "--test", "loom_sync_lazy"])
        .status()
        .context("Failed to launch loom tests")?;
    if !status.success() {
        bail!("loom model check failed");
    }
    Ok(())
}

#[derive(Deserialize)]
struct Estimates {
    mean: Estimate,
}

#[derive(Deserialize)]
struct Estimate {
    point_estimate: f64,
}

#[derive(Deserialize)]
struct BenchmarkInfo {
    throughput: Option<BenchThroughput>,
}

#[derive(Deserialize)]
enum BenchThroughput {
    Elements(u64),
    Bytes(u64),
}

/// workload -> baseline -> ops/s
type Results = BTreeMap<String, BTreeMap<String, f64>>;

fn generate_report() -> Result<()> {
    println!("\n>>> Generating Report...");
    let mut results = Results::new();

    let criterion_dir = Path::new("target/criterion");
    if !criterion_dir.exists() {
        eprintln!("No criterion output found at {}", criterion_dir.display());
        return Ok(());
    }

    collect_results(criterion_dir, &mut results);

    let report_path = Path::new("benchmark_results/report.md");
    if let Some(parent) = report_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(report_path)
        .with_context(|| format!("Failed to create {}", report_path.display()))?;

    writeln!(file, "# Lazy Benchmark Report")?;

    write!(file, "| Workload |")?;
    for (baseline, _) in CONFIGURATIONS {
        write!(file, " {baseline} (Ops/s) | vs default |")?;
    }
    writeln!(file)?;

    write!(file, "|---|")?;
    for _ in CONFIGURATIONS {
        write!(file, "---|---|")?;
    }
    writeln!(file)?;

    for (workload, by_baseline) in &results {
        write!(file, "| {workload} |")?;
        let default_ops = by_baseline.get("default").copied().unwrap_or(0.0);

        for (baseline, _) in CONFIGURATIONS {
            if let Some(ops) = by_baseline.get(*baseline) {
                let rel = if default_ops > 0.0 { ops / default_ops } else { 0.0 };
                write!(file, " {} | **{rel:.2}x** |", format_ops(*ops))?;
            } else {
                write!(file, " N/A | - |")?;
            }
        }
        writeln!(file)?;
    }

    println!("Report written to {}", report_path.display());
    Ok(())
}

fn format_ops(ops: f64) -> String {
    if ops > 1_000_000.0 {
        format!("{:.2}M", ops / 1_000_000.0)
    } else if ops > 1_000.0 {
        format!("{:.2}K", ops / 1_000.0)
    } else {
        format!("{ops:.0}")
    }
}

fn collect_results(root: &Path, results: &mut Results) {
    walk_results(root, root, results);
}

fn walk_results(root: &Path, dir: &Path, results: &mut Results) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk_results(root, &path, results);
        } else if path.file_name().and_then(|s| s.to_str()) == Some("estimates.json") {
            // Structure: <root>/<group>/<function>[/<parameter>]/<baseline>/estimates.json
            if let Some((workload, baseline, ops)) = read_estimate(root, &path) {
                results.entry(workload).or_default().insert(baseline, ops);
            }
        }
    }
}

/// Names a benchmark by every directory between `root` and its baseline, so
/// parameterized ids such as `contended_read/std_lazy_lock/4` stay distinct.
fn workload_name(root: &Path, baseline_dir: &Path) -> Option<String> {
    let relative = baseline_dir.parent()?.strip_prefix(root).ok()?;
    let parts = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    if parts.is_empty() || parts.contains(&"report") {
        return None;
    }
    Some(parts.join("/"))
}

fn read_estimate(root: &Path, path: &Path) -> Option<(String, String, f64)> {
    let baseline_dir = path.parent()?;
    let baseline = baseline_dir.file_name()?.to_str()?.to_string();
    if baseline == "report" {
        return None;
    }
    let workload = workload_name(root, baseline_dir)?;

    let elements = fs::read_to_string(baseline_dir.join("benchmark.json"))
        .ok()
        .and_then(|content| serde_json::from_str::<BenchmarkInfo>(&content).ok())
        .and_then(|info| info.throughput)
        .map_or(1.0, |t| match t {
            BenchThroughput::Elements(n) | BenchThroughput::Bytes(n) => n as f64,
        });

    let estimates: Estimates = serde_json::from_str(&fs::read_to_string(path).ok()?).ok()?;
    let time_ns = estimates.mean.point_estimate;
    (time_ns > 0.0).then(|| (workload, baseline, elements * 1e9 / time_ns))
}
