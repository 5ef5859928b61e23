mod common;

use common::{credential, summary, FakeBackend};
use std::sync::Arc;
use trace_client::{HistoryEntry, JournalBackend};
use trace_core::{ChatController, CoreError, SendOutcome, SkipReason};
use trace_types::{MessageStatus, Sender, APOLOGY_TEXT, DEFAULT_GREETING, DEFAULT_THREAD_TITLE};

fn controller(backend: &Arc<FakeBackend>) -> ChatController {
    let backend: Arc<dyn JournalBackend> = backend.clone();
    ChatController::new(backend, credential())
}

#[tokio::test]
async fn test_empty_listing_yields_one_default_thread() {
    let backend = FakeBackend::new().with_sessions(Vec::new()).into_arc();
    let chat = controller(&backend);

    let selected = chat.initialize().await;

    let threads = chat.threads();
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].id, selected);
    assert_eq!(threads[0].title, DEFAULT_THREAD_TITLE);
    assert!(threads[0].messages.is_empty());
    assert!(threads[0].messages_loaded);
    assert!(threads[0].session_id.starts_with("session_"));
}

#[tokio::test]
async fn test_listing_failure_yields_one_default_thread() {
    let backend = FakeBackend::new().into_arc();
    let chat = controller(&backend);

    chat.initialize().await;

    assert_eq!(chat.threads().len(), 1);
    assert!(chat.current().unwrap().messages_loaded);
}

#[tokio::test]
async fn test_remote_sessions_selected_first_and_loaded_lazily() {
    let backend = FakeBackend::new()
        .with_sessions(vec![summary("s-1", "Monday"), summary("s-2", "Tuesday")])
        .into_arc();
    let chat = controller(&backend);

    let selected = chat.initialize().await;

    assert_eq!(chat.selected(), Some(selected));
    assert_eq!(chat.current().unwrap().session_id, "s-1");
    assert!(chat.threads().iter().all(|t| !t.messages_loaded));
    assert_eq!(backend.calls_to("chat_history"), 0);
}

#[tokio::test]
async fn test_history_skips_blank_user_side() {
    let backend = FakeBackend::new()
        .with_sessions(vec![summary("s-1", "Monday")])
        .with_history("s-1", vec![HistoryEntry::new("", "Hi!")])
        .into_arc();
    let chat = controller(&backend);
    let id = chat.initialize().await;

    assert!(chat.ensure_messages_loaded(id).await.unwrap());

    let thread = chat.thread(id).unwrap();
    assert_eq!(thread.messages.len(), 1);
    assert_eq!(thread.messages[0].sender, Sender::Assistant);
    assert_eq!(thread.messages[0].text, "Hi!");
}

#[tokio::test]
async fn test_ensure_messages_loaded_fetches_once() {
    let backend = FakeBackend::new()
        .with_sessions(vec![summary("s-1", "Monday")])
        .with_history("s-1", Vec::new())
        .into_arc();
    let chat = controller(&backend);
    let id = chat.initialize().await;

    assert!(chat.ensure_messages_loaded(id).await.unwrap());
    assert!(!chat.ensure_messages_loaded(id).await.unwrap());

    assert_eq!(backend.calls_to("chat_history"), 1);
    assert!(chat.thread(id).unwrap().messages_loaded);
}

#[tokio::test]
async fn test_history_preserves_server_order() {
    let backend = FakeBackend::new()
        .with_sessions(vec![summary("s-1", "Monday")])
        .with_history(
            "s-1",
            vec![
                HistoryEntry::new("", "Hi!"),
                HistoryEntry::new("Rough day", "What happened?"),
                HistoryEntry::new("Work stuff", "That sounds hard"),
            ],
        )
        .into_arc();
    let chat = controller(&backend);
    let id = chat.initialize().await;
    chat.ensure_messages_loaded(id).await.unwrap();

    let texts: Vec<_> = chat
        .thread(id)
        .unwrap()
        .messages
        .into_iter()
        .map(|m| m.text)
        .collect();
    assert_eq!(
        texts,
        ["Hi!", "Rough day", "What happened?", "Work stuff", "That sounds hard"]
    );
}

#[tokio::test]
async fn test_create_thread_uses_backend_greeting() {
    let backend = FakeBackend::new()
        .with_sessions(vec![summary("s-1", "Monday")])
        .with_created_session("s-new")
        .with_history("s-new", vec![HistoryEntry::new("", "Welcome back!")])
        .into_arc();
    let chat = controller(&backend);
    chat.initialize().await;

    let id = chat.create_thread().await;

    let threads = chat.threads();
    assert_eq!(threads[0].id, id);
    assert_eq!(chat.selected(), Some(id));
    assert_eq!(threads[0].session_id, "s-new");
    assert_eq!(threads[0].messages.len(), 1);
    assert_eq!(threads[0].messages[0].text, "Welcome back!");
    assert!(threads[0].messages_loaded);
}

#[tokio::test]
async fn test_create_thread_empty_history_gets_default_greeting() {
    let backend = FakeBackend::new()
        .with_sessions(Vec::new())
        .with_created_session("s-new")
        .with_history("s-new", Vec::new())
        .into_arc();
    let chat = controller(&backend);
    chat.initialize().await;

    let id = chat.create_thread().await;

    let thread = chat.thread(id).unwrap();
    assert_eq!(thread.messages.len(), 1);
    assert_eq!(thread.messages[0].text, DEFAULT_GREETING);
}

#[tokio::test]
async fn test_create_thread_failure_falls_back_to_local() {
    let backend = FakeBackend::new()
        .with_sessions(vec![summary("s-1", "Monday")])
        .into_arc();
    let chat = controller(&backend);
    chat.initialize().await;

    let id = chat.create_thread().await;

    let threads = chat.threads();
    assert_eq!(threads.len(), 2);
    assert_eq!(threads[0].id, id);
    assert!(threads[0].messages.is_empty());
    assert!(threads[0].session_id.starts_with("session_"));
}

#[tokio::test]
async fn test_create_thread_history_failure_falls_back_to_local() {
    // Creation succeeds but the greeting cannot be fetched
    let backend = FakeBackend::new()
        .with_sessions(Vec::new())
        .with_created_session("s-new")
        .into_arc();
    let chat = controller(&backend);
    chat.initialize().await;

    let id = chat.create_thread().await;

    let thread = chat.thread(id).unwrap();
    assert_ne!(thread.session_id, "s-new");
    assert!(thread.messages.is_empty());
}

#[tokio::test]
async fn test_delete_only_thread_leaves_fresh_default() {
    let backend = FakeBackend::new()
        .with_sessions(vec![summary("s-1", "Monday")])
        .with_deletable("s-1")
        .into_arc();
    let chat = controller(&backend);
    let id = chat.initialize().await;

    chat.delete_thread(id).await.unwrap();

    let threads = chat.threads();
    assert_eq!(threads.len(), 1);
    assert_ne!(threads[0].session_id, "s-1");
    assert_eq!(chat.selected(), Some(threads[0].id));
}

#[tokio::test]
async fn test_delete_selected_selects_new_first() {
    let backend = FakeBackend::new()
        .with_sessions(vec![
            summary("s-1", "Monday"),
            summary("s-2", "Tuesday"),
            summary("s-3", "Wednesday"),
        ])
        .with_deletable("s-1")
        .into_arc();
    let chat = controller(&backend);
    let first = chat.initialize().await;

    chat.delete_thread(first).await.unwrap();

    assert_eq!(chat.threads().len(), 2);
    assert_eq!(chat.current().unwrap().session_id, "s-2");
}

#[tokio::test]
async fn test_rejected_delete_leaves_state_untouched() {
    let backend = FakeBackend::new()
        .with_sessions(vec![summary("s-1", "Monday"), summary("s-2", "Tuesday")])
        .into_arc();
    let chat = controller(&backend);
    let first = chat.initialize().await;
    let before = chat.threads();

    let err = chat.delete_thread(first).await.unwrap_err();

    assert!(matches!(err, CoreError::DeleteRejected { ref session_id, .. } if session_id == "s-1"));
    assert_eq!(chat.threads(), before);
    assert_eq!(chat.selected(), Some(first));
}

#[tokio::test]
async fn test_send_success_adds_two_messages() {
    let backend = FakeBackend::new()
        .with_sessions(Vec::new())
        .with_chat_reply("Tell me more about that.")
        .into_arc();
    let chat = controller(&backend);
    let id = chat.initialize().await;

    let outcome = chat.send_message(id, "I feel okay today").await;

    assert_eq!(outcome, SendOutcome::Delivered);
    let thread = chat.thread(id).unwrap();
    assert_eq!(thread.messages.len(), 2);
    assert_eq!(thread.messages[0].text, "I feel okay today");
    assert_eq!(thread.messages[1].text, "Tell me more about that.");
    assert_eq!(thread.messages[1].status, MessageStatus::Resolved);
    assert_eq!(thread.title, "I feel okay today");
    assert!(!chat.is_sending(id));

    let requests = backend.chat_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].message, "I feel okay today");
    assert_eq!(requests[0].session_id, thread.session_id);
}

#[tokio::test]
async fn test_send_failure_adds_apology() {
    let backend = FakeBackend::new().with_sessions(Vec::new()).into_arc();
    let chat = controller(&backend);
    let id = chat.initialize().await;

    let outcome = chat.send_message(id, "Hello?").await;

    assert_eq!(outcome, SendOutcome::Failed);
    let thread = chat.thread(id).unwrap();
    assert_eq!(thread.messages.len(), 2);
    assert_eq!(thread.messages[1].text, APOLOGY_TEXT);
    assert!(!thread.has_pending());
}

#[tokio::test]
async fn test_blank_send_never_reaches_backend() {
    let backend = FakeBackend::new()
        .with_sessions(Vec::new())
        .with_chat_reply("unused")
        .into_arc();
    let chat = controller(&backend);
    let id = chat.initialize().await;

    let outcome = chat.send_message(id, "  \t ").await;

    assert_eq!(outcome, SendOutcome::Skipped(SkipReason::BlankMessage));
    assert!(chat.thread(id).unwrap().messages.is_empty());
    assert_eq!(backend.calls_to("chat "), 0);
}

#[tokio::test]
async fn test_second_message_keeps_title() {
    let backend = FakeBackend::new()
        .with_sessions(Vec::new())
        .with_chat_reply("ok")
        .into_arc();
    let chat = controller(&backend);
    let id = chat.initialize().await;

    chat.send_message(id, "Gratitude list").await;
    chat.send_message(id, "Something else entirely").await;

    let thread = chat.thread(id).unwrap();
    assert_eq!(thread.title, "Gratitude list");
    assert_eq!(thread.messages.len(), 4);
}

#[tokio::test]
async fn test_concurrent_send_in_same_thread_is_skipped() {
    let backend = FakeBackend::new()
        .with_sessions(Vec::new())
        .with_chat_reply("reply")
        .into_arc();
    let chat = controller(&backend);
    let id = chat.initialize().await;
    let release = backend.hold_next_chat();

    let first = chat.send_message(id, "first");
    let probe = async {
        backend.chat_started().await;
        assert!(chat.is_sending(id));
        let second = chat.send_message(id, "second").await;
        release.send(()).unwrap();
        second
    };
    let (first, second) = tokio::join!(first, probe);

    assert_eq!(first, SendOutcome::Delivered);
    assert_eq!(second, SendOutcome::Skipped(SkipReason::AlreadySending));
    assert_eq!(chat.thread(id).unwrap().messages.len(), 2);
}

#[tokio::test]
async fn test_send_in_other_thread_not_blocked() {
    let backend = FakeBackend::new()
        .with_sessions(Vec::new())
        .with_chat_reply("reply")
        .into_arc();
    let chat = controller(&backend);
    let a = chat.initialize().await;
    let b = chat.create_thread().await;
    let release = backend.hold_next_chat();

    let first = chat.send_message(a, "in a");
    let probe = async {
        backend.chat_started().await;
        let other = chat.send_message(b, "in b").await;
        release.send(()).unwrap();
        other
    };
    let (first, other) = tokio::join!(first, probe);

    assert_eq!(first, SendOutcome::Delivered);
    assert_eq!(other, SendOutcome::Delivered);
    assert_eq!(chat.thread(b).unwrap().messages.len(), 2);
}

#[tokio::test]
async fn test_shutdown_resolves_pending_send() {
    let backend = FakeBackend::new()
        .with_sessions(Vec::new())
        .with_chat_reply("too late")
        .into_arc();
    let chat = controller(&backend);
    let id = chat.initialize().await;
    let _release = backend.hold_next_chat();

    let send = chat.send_message(id, "anyone there?");
    let stop = async {
        backend.chat_started().await;
        chat.shutdown();
    };
    let (outcome, _) = tokio::join!(send, stop);

    assert_eq!(outcome, SendOutcome::Failed);
    let thread = chat.thread(id).unwrap();
    assert_eq!(thread.messages[1].text, APOLOGY_TEXT);
    assert!(!chat.is_sending(id));
}

#[tokio::test]
async fn test_dropped_send_does_not_leave_placeholder() {
    let backend = FakeBackend::new()
        .with_sessions(Vec::new())
        .with_chat_reply("never delivered")
        .into_arc();
    let chat = controller(&backend);
    let id = chat.initialize().await;
    let _release = backend.hold_next_chat();

    tokio::select! {
        _ = chat.send_message(id, "hello") => panic!("send should still be waiting"),
        _ = backend.chat_started() => {}
    }

    let thread = chat.thread(id).unwrap();
    assert_eq!(thread.messages.len(), 2);
    assert!(!thread.has_pending());
    assert_eq!(thread.messages[1].text, APOLOGY_TEXT);
    assert!(!chat.is_sending(id));
}

#[tokio::test]
async fn test_history_not_fetched_after_local_send() {
    let backend = FakeBackend::new()
        .with_sessions(vec![summary("s-1", "Monday")])
        .with_history("s-1", vec![HistoryEntry::new("Earlier", "Noted")])
        .with_chat_reply("Now")
        .into_arc();
    let chat = controller(&backend);
    let id = chat.initialize().await;

    chat.send_message(id, "Later").await;
    // History fetch is skipped once the thread has messages
    assert!(!chat.ensure_messages_loaded(id).await.unwrap());
    assert_eq!(chat.thread(id).unwrap().messages.len(), 2);
}
