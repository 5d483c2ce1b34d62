use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use interview_buddy::voice::{
    client::{HttpInterviewApi, InterviewLookup},
    console::{ConsoleRecognizer, ConsoleSynthesizer},
    practice::PracticeFlow,
    setup::SetupFlow,
    FlowError, FlowTimings, PracticeContext, PracticeStatus, SetupContext, SetupStatus, SpeechIo,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(
    name = "interview-cli",
    version,
    about = "Voice mock interviews in the terminal",
    disable_help_subcommand = true
)]
struct Cli {
    /// Base URL of the interview backend
    #[arg(long, global = true, default_value = "http://127.0.0.1:8080")]
    api_url: Url,

    #[arg(long, global = true, default_value = "guest")]
    user_id: String,

    #[arg(long, global = true, default_value = "there")]
    user_name: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer four questions and generate a personalised interview
    Setup {
        /// How many times a failed generation is retried
        #[arg(long, default_value_t = 1u32)]
        generation_retries: u32,
    },
    /// Practice a stored interview question by question
    Practice {
        #[arg(long)]
        interview_id: Uuid,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let api = Arc::new(HttpInterviewApi::new(reqwest::Client::new(), cli.api_url.clone()));
    let io = Arc::new(SpeechIo::new(
        Arc::new(ConsoleSynthesizer),
        Arc::new(ConsoleRecognizer::new()),
    ));
    if let Some(warning) = io.availability().warning() {
        warn!("{}", warning);
    }

    match cli.command {
        Commands::Setup { generation_retries } => {
            let flow = SetupFlow::new(
                io,
                api,
                SetupContext {
                    user_name: cli.user_name,
                    user_id: cli.user_id,
                },
                FlowTimings::default(),
            );
            tokio::select! {
                res = run_setup(&flow, generation_retries) => res,
                _ = tokio::signal::ctrl_c() => {
                    flow.stop();
                    info!("Setup interrupted");
                    Ok(())
                }
            }
        }
        Commands::Practice { interview_id } => {
            let interview = api
                .fetch(interview_id)
                .await
                .with_context(|| format!("failed to load interview {}", interview_id))?;
            let flow = PracticeFlow::new(
                io,
                api.clone(),
                api,
                PracticeContext {
                    interview_id,
                    user_id: cli.user_id,
                    user_name: cli.user_name,
                    role: interview.role,
                    level: interview.level,
                    questions: interview.questions,
                },
                FlowTimings::default(),
            );
            tokio::select! {
                res = run_practice(&flow) => res,
                _ = tokio::signal::ctrl_c() => {
                    flow.stop();
                    info!("Practice interrupted");
                    Ok(())
                }
            }
        }
    }
}

async fn run_setup(flow: &SetupFlow, generation_retries: u32) -> Result<()> {
    let mut retries_left = generation_retries;
    let mut status = flow.start().await?;

    loop {
        status = match status {
            SetupStatus::Completed(questions) => {
                println!("\nGenerated {} questions.", questions.len());
                return Ok(());
            }
            SetupStatus::AwaitingRetry(e) => {
                println!("({}; please answer again)", e);
                flow.listen().await?
            }
            SetupStatus::AlreadyListening => flow.listen().await?,
            SetupStatus::GenerationFailed if retries_left > 0 => {
                retries_left -= 1;
                flow.retry_generation().await?
            }
            SetupStatus::GenerationFailed => bail!("question generation failed"),
        };
    }
}

async fn run_practice(flow: &PracticeFlow) -> Result<()> {
    let mut status = match flow.start().await {
        Err(FlowError::NoQuestions) => bail!("this interview has no questions yet"),
        other => other?,
    };

    loop {
        status = match status {
            PracticeStatus::Complete(result) => {
                println!(
                    "\nFinal score: {} / 100. Results: {}",
                    result.total_score, result.results_path
                );
                if result.attempt_id.is_none() {
                    warn!("Attempt was not saved");
                }
                return Ok(());
            }
            PracticeStatus::AwaitingRetry(e) => {
                println!("({}; please answer again)", e);
                flow.listen().await?
            }
            PracticeStatus::ScoringFailed { index } => {
                println!("(could not score the answer to question {}; please answer again)", index + 1);
                flow.listen().await?
            }
            PracticeStatus::AwaitingAnswer { .. }
            | PracticeStatus::AlreadyListening
            | PracticeStatus::Discarded => flow.listen().await?,
        };
    }
}
