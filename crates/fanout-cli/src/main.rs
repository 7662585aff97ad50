//! fanout CLI - run a batch of simulated tasks on a worker pool.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use fanout_core::impls::{SimulatedWorkload, TerminalSink, TracingSink};
use fanout_core::ports::NullSink;
use fanout_core::{AppBuilder, LogFormat, PoolConfig, TaskSpec, domain::generate_tasks};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Distribute tasks across concurrent workers with a live progress view
#[derive(Debug, Parser)]
#[command(name = "fanout")]
#[command(about = "Run a batch of tasks on a worker pool", long_about = None)]
struct Cli {
    /// Number of concurrent workers
    #[arg(short, long, default_value_t = 4)]
    workers: usize,

    /// Number of generated tasks (Task-1 .. Task-N, complexity 1-3)
    #[arg(short = 'n', long, default_value_t = 10)]
    tasks: usize,

    /// Explicit task as NAME:COMPLEXITY (repeatable; replaces generated tasks)
    #[arg(short = 't', long = "task")]
    task: Vec<TaskSpec>,

    /// Durable log destination
    #[arg(long, default_value = "system_log.json")]
    log_path: PathBuf,

    /// Durable log format: json or jsonl
    #[arg(long, default_value_t = LogFormat::Json)]
    log_format: LogFormat,

    /// Observer polling interval in milliseconds
    #[arg(long, default_value_t = 1000)]
    poll_interval_ms: u64,

    /// How long an idle worker waits for a task before exiting (ms)
    #[arg(long, default_value_t = 1000)]
    pop_timeout_ms: u64,

    /// Simulated work per unit of complexity, before the 1x-3x jitter (ms)
    #[arg(long, default_value_t = 1000)]
    time_unit_ms: u64,

    /// Seed for task generation and simulated durations
    #[arg(long)]
    seed: Option<u64>,

    /// Probability that a simulated task fails (0.0 - 1.0)
    #[arg(long, default_value_t = 0.0)]
    failure_rate: f64,

    /// Where progress snapshots are rendered
    #[arg(long, value_enum, default_value_t = Render::Terminal)]
    render: Render,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Render {
    /// Redraw a table on stdout
    Terminal,
    /// Emit one log event per tick
    Log,
    /// Do not render progress
    #[value(name = "none")]
    Quiet,
}

impl Cli {
    fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            workers: self.workers,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            pop_timeout: Duration::from_millis(self.pop_timeout_ms),
            queue_capacity: None,
        }
    }

    fn task_specs(&self) -> Vec<TaskSpec> {
        if !self.task.is_empty() {
            return self.task.clone();
        }
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        generate_tasks(self.tasks, &mut rng)
    }

    fn workload(&self) -> SimulatedWorkload {
        let workload = SimulatedWorkload::new(Duration::from_millis(self.time_unit_ms))
            .with_failure_rate(self.failure_rate);
        match self.seed {
            Some(seed) => workload.with_seed(seed),
            None => workload,
        }
    }
}

/// Filter used when `RUST_LOG` is unset.
fn default_level(render: Render) -> &'static str {
    // ターミナル描画中は info ログで表が崩れるので warn 以上だけ出す
    match render {
        Render::Terminal => "warn",
        Render::Log | Render::Quiet => "info",
    }
}

fn init_tracing(render: Render) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(render)));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.render);

    let tasks = cli.task_specs();
    let log = cli.log_format.open(&cli.log_path).await?;

    let builder = AppBuilder::new()
        .config(cli.pool_config())
        .workload(Arc::new(cli.workload()))
        .log(log);
    let builder = match cli.render {
        Render::Terminal => builder.sink(TerminalSink::stdout()),
        Render::Log => builder.sink(TracingSink::with_expected(tasks.len())),
        Render::Quiet => builder.sink(NullSink),
    };
    let app = builder.build()?;

    let summary = app.run(tasks).await?;
    let counts = summary.counts();

    if summary.persistence_failures() > 0 {
        error!(
            run = %summary.run,
            lost = summary.persistence_failures(),
            path = %cli.log_path.display(),
            "completion history is incomplete"
        );
        return Err(format!(
            "{} of {} completion events could not be written to {}",
            summary.persistence_failures(),
            summary.processed(),
            cli.log_path.display()
        )
        .into());
    }

    println!(
        "\nAll tasks finished: {} done, {} failed. Log file: {}",
        counts.done,
        counts.failed,
        cli.log_path.display()
    );
    Ok(())
}
