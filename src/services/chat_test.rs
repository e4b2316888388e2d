use super::*;
use crate::chat::Sender;
use crate::config::ChatConfig;
use crate::state::test_helpers::{test_app_state, test_app_state_with_chat};

#[tokio::test]
async fn new_session_is_greeted_and_locked() {
    let state = test_app_state();
    let view = create_session(&state).await;

    assert_eq!(view.messages.len(), 1);
    assert_eq!(view.messages[0].sender, Sender::Assistant);
    assert_eq!(view.messages[0].text, state.responses.greeting);
    assert_eq!(view.ui_state, UiState::default());
}

#[tokio::test]
async fn submit_appends_both_messages_and_unlocks() {
    let state = test_app_state();
    let id = create_session(&state).await.id;

    let outcome = submit(&state, id, "Let's talk about the team").await.expect("submit");
    assert!(outcome.accepted);
    assert!(outcome.reply.as_deref().is_some_and(|r| r.starts_with("I've added your team members")));
    assert!(outcome.ui_state.team_setup);
    assert_eq!(outcome.unlocked, vec![Panel::ProjectSetup, Panel::TeamSetup]);

    let history = messages(&state, id).await.expect("messages");
    assert_eq!(history.len(), 3);
    assert_eq!(history[1], Message::user("Let's talk about the team"));
    assert_eq!(history[2].sender, Sender::Assistant);
}

#[tokio::test]
async fn repeated_signal_reports_nothing_new() {
    let state = test_app_state();
    let id = create_session(&state).await.id;

    submit(&state, id, "team").await.expect("first");
    let outcome = submit(&state, id, "more team members").await.expect("second");
    assert!(outcome.accepted);
    assert!(outcome.unlocked.is_empty());
    assert!(ui_state(&state, id).await.expect("ui").team_setup);
}

#[tokio::test]
async fn blank_input_is_not_accepted() {
    let state = test_app_state();
    let id = create_session(&state).await.id;

    let outcome = submit(&state, id, "   ").await.expect("submit");
    assert!(!outcome.accepted);
    assert!(outcome.reply.is_none());
    assert_eq!(messages(&state, id).await.expect("messages").len(), 1);
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let state = test_app_state();
    let id = Uuid::new_v4();

    assert_eq!(submit(&state, id, "hello").await.expect_err("missing"), ChatError::SessionNotFound(id));
    assert_eq!(get_session(&state, id).await.expect_err("missing"), ChatError::SessionNotFound(id));
    assert_eq!(end_session(&state, id).await.expect_err("missing"), ChatError::SessionNotFound(id));
    assert_eq!(ChatError::SessionNotFound(id).error_code(), E_NOT_FOUND);
}

#[tokio::test]
async fn ended_session_is_gone() {
    let state = test_app_state();
    let id = create_session(&state).await.id;

    end_session(&state, id).await.expect("end");
    assert!(get_session(&state, id).await.is_err());
}

#[tokio::test]
async fn sessions_are_independent() {
    let state = test_app_state();
    let a = create_session(&state).await.id;
    let b = create_session(&state).await.id;

    submit(&state, a, "compare tools").await.expect("submit");
    assert!(ui_state(&state, a).await.expect("a").tools_comparison);
    assert_eq!(ui_state(&state, b).await.expect("b"), UiState::default());
}

#[tokio::test(start_paused = true)]
async fn reply_waits_for_the_configured_delay() {
    let chat = ChatConfig { reply_delay: Duration::from_millis(700), ..ChatConfig::default() };
    let state = test_app_state_with_chat(chat);
    let id = create_session(&state).await.id;

    let task = tokio::spawn({
        let state = state.clone();
        async move { submit(&state, id, "milestones").await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    let during = messages(&state, id).await.expect("messages");
    assert_eq!(during.len(), 2, "user message is visible before the reply");

    let outcome = task.await.expect("join").expect("submit");
    assert!(outcome.ui_state.project_setup);
    assert_eq!(messages(&state, id).await.expect("messages").len(), 3);
}

#[tokio::test(start_paused = true)]
async fn session_ended_during_delay_is_not_found() {
    let chat = ChatConfig { reply_delay: Duration::from_millis(700), ..ChatConfig::default() };
    let state = test_app_state_with_chat(chat);
    let id = create_session(&state).await.id;

    let task = tokio::spawn({
        let state = state.clone();
        async move { submit(&state, id, "team").await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    end_session(&state, id).await.expect("end");

    assert_eq!(task.await.expect("join").expect_err("gone"), ChatError::SessionNotFound(id));
}

#[tokio::test]
async fn evict_idle_drops_only_stale_sessions() {
    let state = test_app_state();
    let stale = create_session(&state).await.id;
    let fresh = create_session(&state).await.id;

    let now = Instant::now();
    state.sessions.write().await.get_mut(&stale).expect("stale").last_active =
        now.checked_sub(Duration::from_secs(120)).expect("instant");

    let evicted = evict_idle(&state, Duration::from_secs(60), now).await;
    assert_eq!(evicted, 1);
    assert!(get_session(&state, stale).await.is_err());
    assert!(get_session(&state, fresh).await.is_ok());
}
