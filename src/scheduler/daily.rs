//! Daily market-links reminder.
//!
//! The sender runs in one of three modes chosen at startup: a single immediate
//! send, a daily trigger at 08:20 Asia/Seoul, or the daily trigger plus a
//! one-off smoke-test firing shortly after startup.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use futures::FutureExt;
use tracing::{error, info};

use crate::error::DeliveryError;
use crate::message::Message;
use crate::platform::MessageSender;
use crate::scheduler::{Scheduler, Task, Trigger};

pub const TIMEZONE: Tz = chrono_tz::Asia::Seoul;
pub const SEND_HOUR: u32 = 8;
pub const SEND_MINUTE: u32 = 20;
pub const TEST_TRIGGER_DELAY: Duration = Duration::from_secs(30);

const DAILY_JOB: &str = "daily_telegram";
const TEST_JOB: &str = "daily_telegram_test";

/// How the sender process runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Send once now, then exit
    RunOnce,
    /// Block on the daily trigger; `test_mode` adds one near-term firing
    Continuous { test_mode: bool },
}

impl Mode {
    /// `--run-once` wins over the test flag.
    pub fn select(run_once: bool, test_mode: bool) -> Self {
        if run_once {
            Mode::RunOnce
        } else {
            Mode::Continuous { test_mode }
        }
    }
}

/// Triggers registered by continuous mode
pub fn triggers(test_mode: bool) -> Vec<(&'static str, Trigger)> {
    let mut triggers = vec![(
        DAILY_JOB,
        Trigger::Daily {
            hour: SEND_HOUR,
            minute: SEND_MINUTE,
            timezone: TIMEZONE,
        },
    )];
    if test_mode {
        triggers.push((
            TEST_JOB,
            Trigger::Once {
                delay: TEST_TRIGGER_DELAY,
            },
        ));
    }
    triggers
}

pub fn build_daily_message(now: DateTime<Tz>) -> String {
    let date_label = now.format("%Y-%m-%d (%a)");
    [
        format!("[자동 알림] {} 시장 링크", date_label),
        String::new(),
        "오늘의 경제 링크 모음".to_string(),
        "- 경제달력: https://kr.investing.com/economic-calendar/".to_string(),
        "- 중앙은행 기준금리: https://kr.investing.com/central-banks/".to_string(),
        String::new(),
        "#bot01 #daily".to_string(),
    ]
    .join("\n")
}

/// One delivery attempt of today's reminder. Failures are logged and returned.
pub async fn send_daily(sender: &dyn MessageSender, chat_id: &str) -> Result<(), DeliveryError> {
    let now = Utc::now().with_timezone(&TIMEZONE);
    let message = Message::new(chat_id, build_daily_message(now))?;

    info!("Dispatching daily Telegram message");
    match sender.send(&message).await {
        Ok(()) => {
            info!("Daily Telegram message sent successfully");
            Ok(())
        }
        Err(e) => {
            error!("Daily Telegram message failed to send: {}", e);
            Err(e)
        }
    }
}

/// Run-once mode: exactly one attempt, whatever the outcome
pub async fn run_once(sender: &dyn MessageSender, chat_id: &str) -> Result<(), DeliveryError> {
    info!("Running in run-once mode; no scheduler will start");
    send_daily(sender, chat_id).await
}

/// Scheduler action for the reminder. A failed send is logged and swallowed so
/// later firings still run.
pub fn daily_task(sender: Arc<dyn MessageSender>, chat_id: String) -> Task {
    let chat_id: Arc<str> = chat_id.into();
    Arc::new(move || {
        let sender = sender.clone();
        let chat_id = chat_id.clone();
        async move {
            let _ = send_daily(sender.as_ref(), &chat_id).await;
        }
        .boxed()
    })
}

/// Register the daily reminder (plus the test firing when asked) on `scheduler`.
pub async fn register(
    scheduler: &mut Scheduler,
    sender: Arc<dyn MessageSender>,
    chat_id: String,
    test_mode: bool,
) -> Result<()> {
    let task = daily_task(sender, chat_id);

    if test_mode {
        info!(
            "Scheduler test mode enabled; extra run in {}s",
            TEST_TRIGGER_DELAY.as_secs()
        );
    }

    for (name, trigger) in triggers(test_mode) {
        scheduler.add_job(name, &trigger, task.clone()).await?;
    }
    Ok(())
}
