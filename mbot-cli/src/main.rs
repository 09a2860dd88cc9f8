//! Demo bot with a REPL runner. Each stdin line becomes an event from a fixed
//! demo user: plain text is a message, `postback:PAYLOAD` is a button press,
//! and a line starting with `{` is handled as a raw webhook update body.
//!
//! `/signup` starts a three-step signup scene; `hi` answers with quick
//! replies whose payloads route to action handlers.

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use mbot_core::{
    init_tracing, Event, EventContext, EventHandler, EventKind, MbotError, Outbound, Outcome,
    OutgoingPayload, Result as MbotResult,
};
use mbot_messenger::{keyboard, Bot, BotConfig};
use middleware_chain::{ErrorHandler, LoggingMiddleware};
use scenes::{Scene, SceneStep, StepOutcome};
use session_store::{FileSessionStore, MemorySessionStore, SessionStore};
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tracing::info;

const DEMO_USER: &str = "demo-user";

#[derive(Parser)]
#[command(name = "mbot")]
#[command(about = "Messenger bot demo REPL", long_about = None)]
#[command(version)]
struct Cli {
    /// Session file path; overrides SESSION_FILE. In-memory store when
    /// neither is set.
    #[arg(short, long)]
    session_file: Option<String>,

    /// Deliver replies through the Graph API instead of the console.
    /// Requires PAGE_ACCESS_TOKEN.
    #[arg(long)]
    live: bool,
}

/// Prints outgoing messages instead of calling the provider.
struct ConsoleOutbound;

#[async_trait]
impl Outbound for ConsoleOutbound {
    async fn send_message(&self, recipient_id: &str, payload: &OutgoingPayload) -> MbotResult<()> {
        match payload {
            OutgoingPayload::Text(text) => println!("-> {}: {}", recipient_id, text),
            other => println!("-> {}: {:?}", recipient_id, other),
        }
        Ok(())
    }
}

struct AskName;

#[async_trait]
impl SceneStep for AskName {
    async fn run(&self, ctx: &Arc<EventContext>) -> MbotResult<StepOutcome> {
        ctx.reply("What is your name?").await;
        Ok(StepOutcome::Advance)
    }
}

struct CaptureName;

#[async_trait]
impl SceneStep for CaptureName {
    async fn run(&self, ctx: &Arc<EventContext>) -> MbotResult<StepOutcome> {
        let name = match ctx.text() {
            Some(text) if !text.trim().is_empty() => text.trim().to_string(),
            _ => {
                ctx.reply("A name, please.").await;
                return Ok(StepOutcome::Stay);
            }
        };
        ctx.session().insert("name", name);
        ctx.reply("How old are you?").await;
        Ok(StepOutcome::Advance)
    }
}

struct CaptureAge;

#[async_trait]
impl SceneStep for CaptureAge {
    async fn run(&self, ctx: &Arc<EventContext>) -> MbotResult<StepOutcome> {
        let age: u32 = match ctx.text().and_then(|t| t.trim().parse().ok()) {
            Some(age) => age,
            None => {
                ctx.reply("A number, please.").await;
                return Ok(StepOutcome::Stay);
            }
        };
        let name = ctx
            .session()
            .get("name")
            .and_then(|v| v.as_str().map(str::to_owned))
            .unwrap_or_else(|| "stranger".to_string());
        ctx.reply(format!("Welcome {}, {}!", name, age)).await;
        ctx.leave_scene();
        Ok(StepOutcome::Advance)
    }
}

/// Greets with quick replies whose payloads hit the action handlers.
struct Greeter;

#[async_trait]
impl EventHandler for Greeter {
    async fn handle(&self, ctx: &Arc<EventContext>) -> MbotResult<Outcome> {
        ctx.reply(keyboard::quick_replies(
            "Hi! Do you like this bot?",
            vec![
                keyboard::quick_reply("Yes", "LIKE_YES"),
                keyboard::quick_reply("No", "LIKE_NO"),
            ],
        ))
        .await;
        Ok(Outcome::Done)
    }
}

struct ReplyWith(&'static str);

#[async_trait]
impl EventHandler for ReplyWith {
    async fn handle(&self, ctx: &Arc<EventContext>) -> MbotResult<Outcome> {
        ctx.reply(self.0).await;
        Ok(Outcome::Done)
    }
}

/// Observer that logs every message it sees.
struct SeenLogger;

#[async_trait]
impl EventHandler for SeenLogger {
    async fn handle(&self, ctx: &Arc<EventContext>) -> MbotResult<Outcome> {
        info!(
            user_id = %ctx.user_id(),
            text = %ctx.text().unwrap_or(""),
            "Message observed"
        );
        Ok(Outcome::Done)
    }
}

struct ApologizeOnError;

#[async_trait]
impl ErrorHandler for ApologizeOnError {
    async fn handle(&self, ctx: &Arc<EventContext>, error: &MbotError) {
        tracing::error!(user_id = %ctx.user_id(), error = %error, "Event failed");
        ctx.reply("Something went wrong, please try again.").await;
    }
}

fn register_handlers(bot: Bot) -> Bot {
    let bot = bot
        .scene(
            Scene::new("signup")
                .step(Arc::new(AskName))
                .step(Arc::new(CaptureName))
                .step(Arc::new(CaptureAge)),
        )
        .use_middleware(Arc::new(LoggingMiddleware));
    let enter_signup = bot.enter_scene("signup");
    bot.command("/signup", enter_signup)
        .hears("hi", Arc::new(Greeter))
        .action("LIKE_YES", Arc::new(ReplyWith("Great to hear!")))
        .action("LIKE_NO", Arc::new(ReplyWith("Sorry about that.")))
        .on(EventKind::Message, Arc::new(SeenLogger))
        .catch(Arc::new(ApologizeOnError))
}

async fn run_repl(bot: &Bot) -> Result<()> {
    println!("mbot demo REPL. Text, `postback:PAYLOAD`, or a raw update JSON; Ctrl-D exits.");
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(payload) = line.strip_prefix("postback:") {
            if let Err(e) = bot.handle_event(Event::postback(DEMO_USER, payload.trim())).await {
                eprintln!("error: {}", e);
            }
        } else if line.starts_with('{') {
            match serde_json::from_str(line) {
                Ok(body) => {
                    let status = bot.handle_update(&body).await;
                    println!("(ack {})", status);
                }
                Err(e) => eprintln!("invalid JSON: {}", e),
            }
        } else if let Err(e) = bot.handle_event(Event::text_message(DEMO_USER, line)).await {
            eprintln!("error: {}", e);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(std::env::var("LOG_FILE").ok().as_deref())?;

    let session_file = cli
        .session_file
        .or_else(|| std::env::var("SESSION_FILE").ok());
    let store: Arc<dyn SessionStore> = match session_file {
        Some(path) => Arc::new(FileSessionStore::open(&path).await?),
        None => Arc::new(MemorySessionStore::new()),
    };

    let bot = if cli.live {
        let config = BotConfig::from_env()?;
        register_handlers(Bot::from_config(&config, store))
    } else {
        register_handlers(Bot::new(Arc::new(ConsoleOutbound), store))
    };
    run_repl(&bot).await
}
