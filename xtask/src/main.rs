use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::process::Command;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "coupled workspace automation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the list benchmarks and write a comparison report
    Bench {
        /// Run quickly (lower sample size/time)
        #[arg(long, default_value_t = false)]
        quick: bool,

        /// Generate report only (skip running benchmarks)
        #[arg(long, default_value_t = false)]
        report_only: bool,
    },
    /// Re-run the concurrency tests to shake out rare interleavings
    Stress {
        /// Number of rounds
        #[arg(long, default_value_t = 20)]
        rounds: u32,

        /// Also build with the `tracing` feature
        #[arg(long, default_value_t = false)]
        tracing: bool,
    },
}

const BENCH: &str = "lock_coupled_list_benchmark";
const STRESS_TESTS: &[&str] = &["lock_coupled_list_test", "lock_discipline"];
const IMPLEMENTATIONS: &[&str] = &["lock_coupled_list", "mutex_vec"];

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Bench { quick, report_only } => {
            if !report_only {
                run_benchmarks(quick)?;
            }
            generate_report()?;
        }
        Commands::Stress { rounds, tracing } => run_stress(rounds, tracing)?,
    }

    Ok(())
}

fn run_benchmarks(quick: bool) -> Result<()> {
    println!("Running {BENCH}...");
    let start = Instant::now();

    let mut cmd = Command::new("cargo");
    cmd.env("CARGO_INCREMENTAL", "0")
        .args(["bench", "--bench", BENCH]);

    // Args for the test runner (Criterion) go after --
    cmd.arg("--");
    if quick {
        cmd.arg("--measurement-time").arg("0.1");
        cmd.arg("--noplot");
        cmd.arg("--sample-size").arg("10");
    }

    let status = cmd.status().context("Failed to spawn cargo bench")?;
    if !status.success() {
        anyhow::bail!("Benchmark run failed");
    }
    println!("Finished in {:.2?}", start.elapsed());
    Ok(())
}

fn run_stress(rounds: u32, tracing: bool) -> Result<()> {
    for round in 1..=rounds {
        let start = Instant::now();
        let mut cmd = Command::new("cargo");
        cmd.args(["test", "--release"]);
        if tracing {
            cmd.args(["--features", "tracing"]);
        }
        for test in STRESS_TESTS {
            cmd.args(["--test", test]);
        }
        cmd.args(["--", "--quiet"]);

        let status = cmd
            .status()
            .with_context(|| format!("Failed to spawn stress round {round}"))?;
        if !status.success() {
            anyhow::bail!("Stress round {round}/{rounds} failed");
        }
        println!("Round {round}/{rounds} passed in {:.2?}", start.elapsed());
    }
    Ok(())
}

/// workload -> implementation -> elements per second
type Results = BTreeMap<String, BTreeMap<String, f64>>;

fn generate_report() -> Result<()> {
    println!("\n>>> Generating Report...");
    let criterion_dir = Path::new("target/criterion");
    if !criterion_dir.exists() {
        eprintln!("No criterion output found at {}", criterion_dir.display());
        return Ok(());
    }

    let mut results = Results::new();
    collect_results(criterion_dir, criterion_dir, &mut results);

    let report_path = Path::new("benchmark_results/report.md");
    if let Some(parent) = report_path.parent() {
        fs::create_dir_all(parent)?;
    }

    use std::io::Write;
    let mut file = fs::File::create(report_path)
        .with_context(|| format!("Failed to create {}", report_path.display()))?;

    writeln!(file, "# Lock-Coupled List Benchmark Report")?;
    writeln!(file)?;

    write!(file, "| Workload |")?;
    for name in IMPLEMENTATIONS {
        write!(file, " {name} (Elem/s) |")?;
    }
    writeln!(file, " coupled vs mutex |")?;

    write!(file, "|---|")?;
    for _ in IMPLEMENTATIONS {
        write!(file, "---|")?;
    }
    writeln!(file, "---|")?;

    for (workload, by_impl) in &results {
        write!(file, "| {workload} |")?;
        for name in IMPLEMENTATIONS {
            match by_impl.get(*name) {
                Some(ops) => write!(file, " {} |", format_ops(*ops))?,
                None => write!(file, " N/A |")?,
            }
        }
        match (by_impl.get("lock_coupled_list"), by_impl.get("mutex_vec")) {
            (Some(coupled), Some(mutex)) if *mutex > 0.0 => {
                writeln!(file, " **{:.2}x** |", coupled / mutex)?;
            }
            _ => writeln!(file, " - |")?,
        }
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

/// Walks `target/criterion/<group>/<impl>[/<param>]/new/estimates.json`.
fn collect_results(root: &Path, dir: &Path, results: &mut Results) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_results(root, &path, results);
            continue;
        }
        if path.file_name().and_then(|s| s.to_str()) != Some("estimates.json") {
            continue;
        }
        let Some(run_dir) = path.parent() else { continue };
        if run_dir.file_name().and_then(|s| s.to_str()) != Some("new") {
            continue;
        }
        let Some(bench_dir) = run_dir.parent() else { continue };
        let Ok(rel) = bench_dir.strip_prefix(root) else { continue };

        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let (workload, implementation) = match parts.as_slice() {
            [group, imp] => (group.clone(), imp.clone()),
            [group, imp, param] => (format!("{group}/{param}"), imp.clone()),
            _ => continue,
        };
        if workload.starts_with("report") {
            continue;
        }

        if let Some(metric) = read_metric(bench_dir, &path) {
            results.entry(workload).or_default().insert(implementation, metric);
        }
    }
}

#[derive(Deserialize)]
struct Estimates {
    mean: Estimate,
}

#[derive(Deserialize)]
struct Estimate {
    point_estimate: f64,
}

fn read_metric(bench_dir: &Path, estimates: &Path) -> Option<f64> {
    // Throughput lives next to the estimates, in benchmark.json
    let mut elements = 1.0;
    if let Ok(content) = fs::read_to_string(bench_dir.join("new/benchmark.json")) {
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(&content) {
            if let Some(t) = json.get("throughput").and_then(|t| t.get("Elements")) {
                elements = t.as_f64().unwrap_or(1.0);
            }
        }
    }

    let content = fs::read_to_string(estimates).ok()?;
    let estimates: Estimates = serde_json::from_str(&content).ok()?;
    let time_ns = estimates.mean.point_estimate;
    (time_ns > 0.0).then(|| elements * 1e9 / time_ns)
}
