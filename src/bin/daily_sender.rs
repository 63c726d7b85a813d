//! Standalone daily reminder sender.
//!
//! Runs separately from the web relay so that web availability never affects
//! the scheduled message. Run a single instance per deployment: each process
//! owns its own timer and would send its own copy of the reminder.
//!
//! With `--run-once`: send the reminder immediately and exit.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use formrelay::config::Config;
use formrelay::platform::telegram::TelegramClient;
use formrelay::platform::MessageSender;
use formrelay::scheduler::daily::{self, Mode};
use formrelay::scheduler::Scheduler;

#[derive(Debug, Parser)]
#[command(name = "daily-sender", about = "Daily Telegram reminder scheduler")]
struct Args {
    /// Send a single Telegram message immediately and exit
    #[arg(long)]
    run_once: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    dotenvy::dotenv().ok();
    let _log_guard = formrelay::logging::init("scheduler.log")?;

    let config = Config::from_env().context("Failed to load configuration")?;
    let client = TelegramClient::new(config.telegram);
    let chat_id = client.default_chat_id().to_string();
    let sender: Arc<dyn MessageSender> = Arc::new(client);

    match Mode::select(args.run_once, config.scheduler.test_mode) {
        Mode::RunOnce => match daily::run_once(sender.as_ref(), &chat_id).await {
            Ok(()) => Ok(ExitCode::SUCCESS),
            Err(e) => {
                error!("Run-once send failed: {}", e);
                Ok(ExitCode::FAILURE)
            }
        },
        Mode::Continuous { test_mode } => {
            info!("Starting scheduler (test_mode={})", test_mode);
            let mut scheduler = Scheduler::new().await?;
            daily::register(&mut scheduler, sender, chat_id, test_mode).await?;
            scheduler.start().await?;

            formrelay::signal::shutdown().await;
            info!("Scheduler shutting down");
            scheduler.shutdown().await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
