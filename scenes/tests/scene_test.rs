//! Integration tests for [`scenes::Scene`].
//!
//! Covers: enter running step 0 on a fresh cursor, the stay/advance rule, the
//! no-double-advance guard, mid-step leave, and full leave semantics.

use async_trait::async_trait;
use mbot_core::{Event, EventContext, Outbound, OutgoingPayload, Result};
use scenes::{Scene, SceneStep, StepOutcome};
use std::sync::{Arc, Mutex};

struct NullOutbound;

#[async_trait]
impl Outbound for NullOutbound {
    async fn send_message(&self, _recipient_id: &str, _payload: &OutgoingPayload) -> Result<()> {
        Ok(())
    }
}

fn text_context(text: &str) -> Arc<EventContext> {
    Arc::new(EventContext::new(
        Event::text_message("u1", text),
        Arc::new(NullOutbound),
    ))
}

fn postback_context(payload: &str) -> Arc<EventContext> {
    Arc::new(EventContext::new(
        Event::postback("u1", payload),
        Arc::new(NullOutbound),
    ))
}

/// Records the cursor value it ran at, then advances.
struct RecordingStep {
    seen: Arc<Mutex<Vec<usize>>>,
}

#[async_trait]
impl SceneStep for RecordingStep {
    async fn run(&self, ctx: &Arc<EventContext>) -> Result<StepOutcome> {
        self.seen.lock().unwrap().push(ctx.session().step());
        Ok(StepOutcome::Advance)
    }
}

/// **Test: enter sets the cursor to 0 and immediately runs step 0.**
///
/// **Setup:** Two-step scene; step 0 records the cursor it observes.
/// **Action:** `scene.enter(&ctx)` on a text event.
/// **Expected:** Step 0 observed cursor 0 with the scene name recorded;
/// afterwards the cursor auto-advanced to 1.
#[tokio::test]
async fn test_enter_runs_step_zero() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let scene = Arc::new(
        Scene::new("signup")
            .step(Arc::new(RecordingStep { seen: seen.clone() }))
            .step(Arc::new(RecordingStep { seen: seen.clone() })),
    );

    let ctx = text_context("go");
    scene.enter(&ctx).await.unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![0]);
    assert_eq!(ctx.session().scene_name().as_deref(), Some("signup"));
    assert_eq!(ctx.session().step(), 1);
    assert_eq!(ctx.scene().unwrap().name(), "signup");
}

/// **Test: a step returning Stay keeps the cursor in place even with text.**
#[tokio::test]
async fn test_stay_keeps_cursor() {
    struct StayStep;

    #[async_trait]
    impl SceneStep for StayStep {
        async fn run(&self, _ctx: &Arc<EventContext>) -> Result<StepOutcome> {
            Ok(StepOutcome::Stay)
        }
    }

    let scene = Arc::new(
        Scene::new("signup")
            .step(Arc::new(StayStep))
            .step(Arc::new(StayStep)),
    );

    let ctx = text_context("not valid input");
    scene.enter(&ctx).await.unwrap();

    assert_eq!(ctx.session().step(), 0);
    assert_eq!(ctx.session().scene_name().as_deref(), Some("signup"));
}

/// **Test: without text in the event the cursor does not auto-advance.**
#[tokio::test]
async fn test_no_advance_without_text() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let scene = Arc::new(
        Scene::new("signup")
            .step(Arc::new(RecordingStep { seen: seen.clone() }))
            .step(Arc::new(RecordingStep { seen })),
    );

    let ctx = postback_context("START");
    scene.enter(&ctx).await.unwrap();

    assert_eq!(ctx.session().step(), 0);
}

/// **Test: a step that moves the cursor itself is not advanced again.**
///
/// **Setup:** Three-step scene; step 0 jumps the cursor straight to 2.
/// **Action:** `scene.enter(&ctx)` on a text event.
/// **Expected:** Cursor is 2, not 3.
#[tokio::test]
async fn test_no_double_advance_when_step_moves_cursor() {
    struct JumpStep;

    #[async_trait]
    impl SceneStep for JumpStep {
        async fn run(&self, ctx: &Arc<EventContext>) -> Result<StepOutcome> {
            ctx.session().set_step(2);
            Ok(StepOutcome::Advance)
        }
    }

    let seen = Arc::new(Mutex::new(Vec::new()));
    let scene = Arc::new(
        Scene::new("wizard")
            .step(Arc::new(JumpStep))
            .step(Arc::new(RecordingStep { seen: seen.clone() }))
            .step(Arc::new(RecordingStep { seen })),
    );

    let ctx = text_context("go");
    scene.enter(&ctx).await.unwrap();

    assert_eq!(ctx.session().step(), 2);
}

/// **Test: a step that leaves mid-run ends with an empty session and no
/// cursor resurrected by the advance rule.**
#[tokio::test]
async fn test_step_leaving_mid_run() {
    struct CancelStep;

    #[async_trait]
    impl SceneStep for CancelStep {
        async fn run(&self, ctx: &Arc<EventContext>) -> Result<StepOutcome> {
            ctx.leave_scene();
            Ok(StepOutcome::Advance)
        }
    }

    let scene = Arc::new(
        Scene::new("signup")
            .step(Arc::new(CancelStep))
            .step(Arc::new(CancelStep)),
    );

    let ctx = text_context("cancel");
    scene.enter(&ctx).await.unwrap();

    assert!(ctx.session().is_empty());
    assert!(ctx.scene().is_none());
    assert!(ctx.scene_stopped());
}

/// **Test: leave empties the session no matter what it held.**
#[tokio::test]
async fn test_leave_clears_everything() {
    let scene = Arc::new(Scene::new("signup").step(Arc::new(RecordingStep {
        seen: Arc::new(Mutex::new(Vec::new())),
    })));

    let ctx = text_context("hi");
    {
        let mut session = ctx.session();
        session.insert("name", "Alice");
        session.insert("age", 30);
        session.set_scene_name("signup");
        session.set_step(1);
    }

    scene.leave(&ctx).await.unwrap();

    assert!(ctx.session().is_empty());
    assert!(ctx.scene().is_none());
}

/// **Test: two-step flow across three events.**
///
/// **Setup:** Scene with steps asking name then age; session carried between
/// contexts the way the manager middleware would.
/// **Action:** Enter on event 1, resume on events 2 and 3.
/// **Expected:** Cursor goes 1, then 2; event 3 finds the cursor out of
/// bounds and auto-leaves, leaving an empty session.
#[tokio::test]
async fn test_two_step_flow_auto_leaves() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let scene = Arc::new(
        Scene::new("signup")
            .step(Arc::new(RecordingStep { seen: seen.clone() }))
            .step(Arc::new(RecordingStep { seen: seen.clone() })),
    );

    let ctx1 = text_context("/signup");
    scene.enter(&ctx1).await.unwrap();
    assert_eq!(ctx1.session().step(), 1);

    let ctx2 = text_context("Alice");
    ctx2.replace_session(ctx1.session_snapshot());
    scene.handle(&ctx2).await.unwrap();
    assert_eq!(ctx2.session().step(), 2);
    assert_eq!(ctx2.session().scene_name().as_deref(), Some("signup"));

    let ctx3 = text_context("anything");
    ctx3.replace_session(ctx2.session_snapshot());
    scene.handle(&ctx3).await.unwrap();
    assert!(ctx3.session().is_empty());
    assert!(ctx3.scene_stopped());

    assert_eq!(*seen.lock().unwrap(), vec![0, 1]);
}
