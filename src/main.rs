use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing_subscriber::EnvFilter;

use jobpool::dashboard::{run_dashboard, DashboardState};
use jobpool::scheduler::{JobStatus, JobView};
use jobpool::shutdown::install_shutdown_handler;
use jobpool::worker::WorkerStatsView;
use jobpool::{DispatchEvent, Dispatcher, DispatcherConfig, SignalPolicy, Summary, WorkConfig};

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "jobpool")]
#[command(version)]
#[command(about = "A work-dispatch engine with a fixed pool of workers")]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start a worker pool and feed it jobs from arguments and stdin
    Run(RunArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Job inputs to submit at startup
    jobs: Vec<String>,

    /// Number of workers in the pool
    #[arg(long, default_value = "4")]
    workers: usize,

    /// How workers are told that work is waiting
    #[arg(long, default_value = "periodic")]
    policy: PolicyArg,

    /// Queue monitor tick in milliseconds (periodic policy)
    #[arg(long, default_value = "500")]
    tick_ms: u64,

    /// Minimum simulated delay per input character
    #[arg(long, default_value = "0")]
    min_delay_ms: u64,

    /// Maximum simulated delay per input character
    #[arg(long, default_value = "999")]
    max_delay_ms: u64,

    /// Amount added to a job's result per input character
    #[arg(long, default_value = "10")]
    result_step: u64,

    /// Do not read job inputs from stdin
    #[arg(long)]
    no_stdin: bool,

    /// Exit once input is exhausted and every job has completed
    #[arg(long)]
    exit_when_done: bool,

    /// Print every job and worker event as it happens
    #[arg(long)]
    events: bool,

    /// Print the job and worker tables this often (0 disables)
    #[arg(long, default_value = "1000")]
    refresh_ms: u64,

    /// Port for the JSON dashboard (optional)
    #[arg(long)]
    dashboard_port: Option<u16>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table")]
    output: OutputFormat,
}

#[derive(Debug, Clone, ValueEnum)]
enum PolicyArg {
    Periodic,
    OnEnqueue,
}

impl From<PolicyArg> for SignalPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Periodic => SignalPolicy::Periodic,
            PolicyArg::OnEnqueue => SignalPolicy::OnEnqueue,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

// =============================================================================
// Output
// =============================================================================

fn print_jobs_table(jobs: &[JobView]) {
    if jobs.is_empty() {
        println!("No jobs submitted.");
        return;
    }
    println!(
        "{:<6} {:<7} {:<9} {:<13} {:<13} {:<13} {:<20} RESULT",
        "JOB", "WORKER", "STATUS", "CREATED", "STARTED", "COMPLETED", "INPUT"
    );
    println!("{}", "-".repeat(96));
    for job in jobs {
        let [id, worker, status, created, started, completed, input, result] = job.cells();
        let input = if input.chars().count() > 20 {
            format!("{}...", input.chars().take(17).collect::<String>())
        } else {
            input
        };
        println!(
            "{:<6} {:<7} {:<9} {:<13} {:<13} {:<13} {:<20} {}",
            id, worker, status, created, started, completed, input, result
        );
    }
}

fn print_workers_table(workers: &[WorkerStatsView]) {
    println!(
        "{:<7} {:<8} {:<10} {:<12} {:<12} HISTORY",
        "WORKER", "STATUS", "COMPLETED", "WORKING_MS", "IDLE_MS"
    );
    println!("{}", "-".repeat(64));
    for worker in workers {
        let history: Vec<String> = worker.history.iter().map(|j| j.id.to_string()).collect();
        println!(
            "{:<7} {:<8} {:<10} {:<12} {:<12} {}",
            worker.worker_id,
            worker.status.to_string(),
            worker.completed_count,
            worker.working_time_ms,
            worker.idle_time_ms,
            history.join(",")
        );
    }
}

fn print_summary(summary: &Summary) {
    println!(
        "Total: {}  Pending: {}  Running: {}  Completed: {}",
        summary.total_jobs, summary.pending_jobs, summary.running_jobs, summary.completed_jobs
    );
}

async fn print_state(
    dispatcher: &Dispatcher,
    output: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = dispatcher.snapshot().await;
    let summary = dispatcher.summary().await;
    match output {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "summary": summary,
                "jobs": snapshot.jobs,
                "workers": snapshot.workers,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Table => {
            print_jobs_table(&snapshot.jobs);
            println!();
            print_workers_table(&snapshot.workers);
            println!();
            print_summary(&summary);
            println!();
        }
    }
    Ok(())
}

fn describe_event(event: &DispatchEvent) -> String {
    match event {
        DispatchEvent::JobCreated { job } => {
            format!("[Job #{}] created with input [{}]", job.id, job.input_param)
        }
        DispatchEvent::JobStateChanged {
            job_id,
            status: JobStatus::Running,
            worker_id,
        } => format!(
            "[Job #{}] running on worker {}",
            job_id,
            worker_id.map_or_else(|| "-".to_string(), |id| id.to_string())
        ),
        DispatchEvent::JobStateChanged { job_id, status, .. } => {
            format!("[Job #{}] {}", job_id, status)
        }
        DispatchEvent::WorkerStatsUpdated {
            worker_id,
            status,
            completed_count,
            working_time_ms,
            idle_time_ms,
        } => format!(
            "[Worker {}] {} completed={} working_ms={} idle_ms={}",
            worker_id, status, completed_count, working_time_ms, idle_time_ms
        ),
    }
}

// =============================================================================
// Run
// =============================================================================

/// Ticker period for the main loop. With printing disabled (`0`) it only polls
/// for `--exit-when-done`.
fn refresh_period(refresh_ms: u64) -> Duration {
    if refresh_ms == 0 {
        EXIT_POLL_INTERVAL
    } else {
        Duration::from_millis(refresh_ms)
    }
}

async fn submit(dispatcher: &Dispatcher, input: &str) {
    if let Err(e) = dispatcher.submit_job(input).await {
        eprintln!("Error: {}", e);
    }
}

async fn run_pool(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = DispatcherConfig {
        worker_count: args.workers,
        queue_check_interval_ms: args.tick_ms,
        signal_policy: args.policy.into(),
        work: WorkConfig {
            step_delay_min_ms: args.min_delay_ms,
            step_delay_max_ms: args.max_delay_ms,
            result_step: args.result_step,
        },
        ..DispatcherConfig::default()
    };
    let dispatcher = Arc::new(Dispatcher::start(config)?);
    let shutdown = install_shutdown_handler();

    if let Some(port) = args.dashboard_port {
        let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;
        let state = DashboardState {
            dispatcher: dispatcher.clone(),
        };
        tokio::spawn(async move {
            run_dashboard(addr, state).await;
        });
    }

    if args.events {
        let mut stream = BroadcastStream::new(dispatcher.subscribe());
        let json = matches!(args.output, OutputFormat::Json);
        tokio::spawn(async move {
            while let Some(item) = stream.next().await {
                match item {
                    Ok(event) if json => match serde_json::to_string(&event) {
                        Ok(line) => println!("{}", line),
                        Err(e) => tracing::warn!(error = %e, "Failed to encode event"),
                    },
                    Ok(event) => println!("{}", describe_event(&event)),
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Event printer fell behind");
                    }
                }
            }
        });
    }

    for input in &args.jobs {
        submit(&dispatcher, input).await;
    }

    let input_task = if args.no_stdin {
        None
    } else {
        let dispatcher = dispatcher.clone();
        Some(tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => submit(&dispatcher, &line).await,
                    Ok(None) => break,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to read stdin");
                        break;
                    }
                }
            }
        }))
    };

    let mut ticker = tokio::time::interval(refresh_period(args.refresh_ms));
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                if args.refresh_ms > 0 {
                    print_state(&dispatcher, &args.output).await?;
                }

                let input_done = input_task.as_ref().map_or(true, |task| task.is_finished());
                if args.exit_when_done && input_done {
                    let summary = dispatcher.summary().await;
                    if summary.completed_jobs == summary.total_jobs as u64 {
                        break;
                    }
                }
            }
        }
    }

    print_state(&dispatcher, &args.output).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    match args.command {
        Commands::Run(run_args) => run_pool(run_args).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_refresh_polls_at_fixed_interval() {
        assert_eq!(refresh_period(0), EXIT_POLL_INTERVAL);
        assert_eq!(refresh_period(0), Duration::from_millis(100));
    }

    #[test]
    fn refresh_period_follows_flag() {
        assert_eq!(refresh_period(1), Duration::from_millis(1));
        assert_eq!(refresh_period(2500), Duration::from_millis(2500));
    }
}
