//! End-to-end tests for [`mbot_messenger::Bot`]: webhook body to replies,
//! scene flows across events, acknowledgment codes, and the error trap.

use async_trait::async_trait;
use mbot_core::{
    EventContext, EventHandler, EventKind, HandlerError, MbotError, Outbound, Outcome,
    OutgoingPayload, Result,
};
use mbot_messenger::Bot;
use middleware_chain::ErrorHandler;
use scenes::{Scene, SceneStep, StepOutcome};
use serde_json::json;
use session_store::{MemorySessionStore, SessionStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Records every (recipient, text) pair instead of hitting the network.
#[derive(Default)]
struct RecordingOutbound {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingOutbound {
    fn texts(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
    }
}

#[async_trait]
impl Outbound for RecordingOutbound {
    async fn send_message(&self, recipient_id: &str, payload: &OutgoingPayload) -> Result<()> {
        let text = match payload {
            OutgoingPayload::Text(t) => t.clone(),
            other => format!("{:?}", other),
        };
        self.sent
            .lock()
            .unwrap()
            .push((recipient_id.to_string(), text));
        Ok(())
    }
}

fn message_body(sender: &str, text: &str) -> serde_json::Value {
    json!({
        "object": "page",
        "entry": [{"messaging": [{
            "sender": {"id": sender},
            "message": {"text": text}
        }]}]
    })
}

/// **Test: a command enters a two-step scene; following messages are consumed
/// by the scene and the session empties after the flow completes.**
#[tokio::test]
async fn test_signup_scene_over_webhook_updates() {
    struct PromptStep(&'static str);

    #[async_trait]
    impl SceneStep for PromptStep {
        async fn run(&self, ctx: &Arc<EventContext>) -> Result<StepOutcome> {
            ctx.reply(self.0).await;
            Ok(StepOutcome::Advance)
        }
    }

    let outbound = Arc::new(RecordingOutbound::default());
    let store = Arc::new(MemorySessionStore::new());

    let bot = Bot::new(
        outbound.clone() as Arc<dyn Outbound>,
        store.clone() as Arc<dyn SessionStore>,
    )
    .scene(
        Scene::new("signup")
            .step(Arc::new(PromptStep("What is your name?")))
            .step(Arc::new(PromptStep("How old are you?"))),
    );
    let enter = bot.enter_scene("signup");
    let bot = bot.command("/signup", enter);

    assert_eq!(bot.handle_update(&message_body("u1", "/signup")).await, 200);
    assert_eq!(store.get("u1").await.unwrap().step(), 1);

    assert_eq!(bot.handle_update(&message_body("u1", "Alice")).await, 200);
    assert_eq!(store.get("u1").await.unwrap().step(), 2);

    assert_eq!(bot.handle_update(&message_body("u1", "32")).await, 200);
    assert!(store.get("u1").await.unwrap().is_empty());

    assert_eq!(
        outbound.texts(),
        vec!["What is your name?", "How old are you?"]
    );
}

/// **Test: hears plus observer both fire through the full bot pipeline.**
#[tokio::test]
async fn test_bot_hears_and_observer() {
    struct ReplyHi;

    #[async_trait]
    impl EventHandler for ReplyHi {
        async fn handle(&self, ctx: &Arc<EventContext>) -> Result<Outcome> {
            ctx.reply("hello!").await;
            Ok(Outcome::Done)
        }
    }

    struct CountingObserver(Arc<AtomicUsize>);

    #[async_trait]
    impl EventHandler for CountingObserver {
        async fn handle(&self, _ctx: &Arc<EventContext>) -> Result<Outcome> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Outcome::Done)
        }
    }

    let outbound = Arc::new(RecordingOutbound::default());
    let observed = Arc::new(AtomicUsize::new(0));

    let bot = Bot::new(
        outbound.clone() as Arc<dyn Outbound>,
        Arc::new(MemorySessionStore::new()),
    )
    .hears("hi", Arc::new(ReplyHi))
    .on(EventKind::Message, Arc::new(CountingObserver(observed.clone())));

    bot.handle_update(&message_body("u1", "hi there")).await;

    assert_eq!(outbound.texts(), vec!["hello!"]);
    assert_eq!(observed.load(Ordering::SeqCst), 1);
}

/// **Test: malformed top-level containers acknowledge 404, good ones 200.**
#[tokio::test]
async fn test_update_ack_codes() {
    let bot = Bot::new(
        Arc::new(RecordingOutbound::default()),
        Arc::new(MemorySessionStore::new()),
    );

    assert_eq!(bot.handle_update(&json!({"object": "unknown"})).await, 404);
    assert_eq!(bot.handle_update(&json!([1, 2, 3])).await, 404);
    assert_eq!(bot.handle_update(&message_body("u1", "hi")).await, 200);
}

/// **Test: the verification handshake echoes the challenge only for a
/// matching subscribe request, and never without a configured token.**
#[tokio::test]
async fn test_verify_handshake() {
    let bot = Bot::new(
        Arc::new(RecordingOutbound::default()),
        Arc::new(MemorySessionStore::new()),
    )
    .verify_token("secret".to_string());

    assert_eq!(
        bot.verify("subscribe", "secret", "999"),
        Some("999".to_string())
    );
    assert_eq!(bot.verify("subscribe", "nope", "999"), None);

    let unconfigured = Bot::new(
        Arc::new(RecordingOutbound::default()),
        Arc::new(MemorySessionStore::new()),
    );
    assert_eq!(unconfigured.verify("subscribe", "secret", "999"), None);
}

/// **Test: a failing handler is routed to `catch`; the update is still
/// acknowledged with 200 and the process keeps serving.**
#[tokio::test]
async fn test_catch_receives_handler_error() {
    struct Failing;

    #[async_trait]
    impl EventHandler for Failing {
        async fn handle(&self, _ctx: &Arc<EventContext>) -> Result<Outcome> {
            Err(HandlerError::State("bad state".to_string()).into())
        }
    }

    struct CaptureError(Arc<AtomicUsize>);

    #[async_trait]
    impl ErrorHandler for CaptureError {
        async fn handle(&self, _ctx: &Arc<EventContext>, error: &MbotError) {
            assert!(matches!(error, MbotError::Handler(_)));
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let errors = Arc::new(AtomicUsize::new(0));
    let bot = Bot::new(
        Arc::new(RecordingOutbound::default()),
        Arc::new(MemorySessionStore::new()),
    )
    .command("/boom", Arc::new(Failing))
    .catch(Arc::new(CaptureError(errors.clone())));

    assert_eq!(bot.handle_update(&message_body("u1", "/boom")).await, 200);
    assert_eq!(errors.load(Ordering::SeqCst), 1);
}
