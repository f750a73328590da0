use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use orchestrate::aggregate::{self, RunSummary};
use orchestrate::cli::Cli;
use orchestrate::config::Config;
use orchestrate::runner::{CancelToken, Orchestrator, Plan};
use orchestrate::scheduler::{SbatchClient, SubmitThrottle};
use orchestrate::submit::{LocalRunner, SchedulerSubmitter};

fn setup_logging(level: &str) -> Result<PathBuf> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(env!("CARGO_PKG_NAME"))
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join(format!("{}.log", env!("CARGO_PKG_NAME")));

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // RUST_LOG wins over the configured level.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(log_file)
}

async fn run_application(cli: &Cli, config: &Config) -> Result<ExitCode> {
    let family = cli.command.family();
    let args = cli.command.run_args();
    let workers = args.workers.unwrap_or(config.scheduler.max_workers);

    let cancel = CancelToken::new();
    let orchestrator = Orchestrator::new(family, cli.command.settings(config))
        .with_input_pattern(config.input_pattern(family))
        .with_filter(cli.command.filter())
        .with_workers(workers)
        .with_cancel_token(cancel.clone());

    let plan = orchestrator.plan().context("Failed to plan run")?;

    if args.dry_run {
        print_plan(&plan);
        let summary = plan.summary();
        println!("{}", aggregate::render(&summary));
        write_summary(args.summary_json.as_deref(), &summary)?;
        return Ok(ExitCode::from(summary.exit_code()));
    }

    cancel.cancel_on_ctrl_c();

    let summary = if family.is_synchronous() {
        orchestrator.execute(plan, &LocalRunner::new()).await?
    } else {
        let client = Arc::new(SbatchClient::from_config(&config.scheduler));
        let submitter =
            SchedulerSubmitter::new(client).with_throttle(SubmitThrottle::from_millis(config.scheduler.submit_delay_ms));
        orchestrator.execute(plan, &submitter).await?
    };

    println!("{}", aggregate::render(&summary));
    write_summary(args.summary_json.as_deref(), &summary)?;

    info!(
        "{} finished: {} succeeded, {} failed of {} attempted",
        family, summary.totals.succeeded, summary.totals.failed, summary.totals.attempted
    );
    Ok(ExitCode::from(summary.exit_code()))
}

fn print_plan(plan: &Plan) {
    println!("{} {} {} job(s)", "Dry run:".cyan().bold(), plan.len(), plan.family());
    for job in plan.jobs() {
        let d = &job.descriptor;
        println!(
            "  {} cpus={} time={} partition={}",
            d.name.bold(),
            d.resources.cpus,
            d.resources.time_limit(),
            d.resources.partition
        );
        println!("    {}", d.command_line().dimmed());
    }
}

fn write_summary(path: Option<&Path>, summary: &RunSummary) -> Result<()> {
    if let Some(path) = path {
        summary
            .write_json(path)
            .context(format!("Failed to write summary to {}", path.display()))?;
        info!("Wrote summary to {}", path.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_ref()).context("Failed to load configuration") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    let level = if cli.is_verbose() {
        "debug"
    } else {
        config.log_level.as_deref().unwrap_or("info")
    };
    match setup_logging(level) {
        Ok(log_file) if cli.is_verbose() => {
            println!("{} {}", "Logging to".yellow(), log_file.display());
        }
        Ok(_) => {}
        Err(e) => eprintln!("{} {:#}", "Warning:".yellow(), e),
    }

    match run_application(&cli, &config).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
