//! Worker binary entry point (§4.6, §6): loads configuration, wires
//! concrete providers behind the domain ports, and either runs the dequeue
//! loop, enqueues a single task by hand, or prints a startup smoke check.

mod wiring;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cveval_domain::entities::EvaluateTask;
use cveval_domain::value_objects::JobId;
use cveval_infrastructure::logging::init_logging;
use tracing::info;

use wiring::Wiring;

/// CV/project evaluation worker.
#[derive(Parser)]
#[command(name = "cveval-worker")]
#[command(about = "Dequeues evaluation tasks and drives the chain orchestrator")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Path to the layered TOML configuration file.
    #[arg(short, long, global = true, default_value = "config/default.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bounded-concurrency dequeue loop; runs until `SIGINT`.
    Run,

    /// Submit a single evaluation task to the broker and print its id.
    Enqueue {
        /// Upload id for the candidate's CV.
        #[arg(long)]
        cv_id: String,
        /// Upload id for the candidate's project report.
        #[arg(long)]
        project_id: String,
        /// The job description text.
        #[arg(long)]
        job_description: String,
        /// The study case brief text.
        #[arg(long)]
        study_case_brief: String,
        /// The scoring rubric text.
        #[arg(long)]
        scoring_rubric: String,
    },

    /// Load configuration and construct every provider once, reporting
    /// which collaborators are reachable, without processing any task.
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = cveval_infrastructure::config::Settings::load(&cli.config)?;
    init_logging(&settings.logging);

    match cli.command {
        Commands::Run => run(settings).await,
        Commands::Enqueue {
            cv_id,
            project_id,
            job_description,
            study_case_brief,
            scoring_rubric,
        } => {
            enqueue(
                settings,
                EvaluateTask {
                    job_id: JobId::new(),
                    cv_id,
                    project_id,
                    job_description,
                    study_case_brief,
                    scoring_rubric,
                },
            )
            .await
        }
        Commands::Health => health(settings).await,
    }
}

async fn run(settings: cveval_infrastructure::config::Settings) -> anyhow::Result<()> {
    let wiring = Wiring::build(&settings).await?;
    let shutdown = wiring.runtime.shutdown_token();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received, draining in-flight jobs");
            shutdown.cancel();
        }
    });

    wiring.runtime.run().await;
    Ok(())
}

async fn enqueue(settings: cveval_infrastructure::config::Settings, task: EvaluateTask) -> anyhow::Result<()> {
    let wiring = Wiring::build(&settings).await?;
    let task_id = wiring.enqueue_client.enqueue(task).await?;
    println!("{task_id}");
    Ok(())
}

async fn health(settings: cveval_infrastructure::config::Settings) -> anyhow::Result<()> {
    let wiring = Wiring::build(&settings).await?;
    println!("configuration loaded and every provider constructed successfully");
    println!("{}", wiring.metrics.render());
    Ok(())
}
