use std::sync::{Arc, Mutex};
use std::time::Duration;

use confab_service::ChatRequest;
use confab_test_service::{PresetReply, RecordedCall, TestChatService};
use tokio::time::timeout;

use crate::transcript::{MessageKind, Sender};
use crate::{
    ConversationClient, ConversationClientBuilder, ConversationState,
    DEFAULT_WELCOME_MESSAGE, ErrorKind,
};

fn build_client(service: &TestChatService) -> ConversationClient {
    ConversationClientBuilder::with_service(service.clone()).build()
}

fn entries(client: &ConversationClient) -> Vec<(Sender, MessageKind, String)> {
    client
        .transcript()
        .messages()
        .iter()
        .map(|m| (m.sender(), m.kind(), m.text().to_owned()))
        .collect()
}

fn welcome() -> (Sender, MessageKind, String) {
    (
        Sender::Assistant,
        MessageKind::Normal,
        DEFAULT_WELCOME_MESSAGE.to_owned(),
    )
}

#[tokio::test]
async fn test_start() {
    let service = TestChatService::default();
    service.add_start_reply(PresetReply::success("abc123"));
    let client = build_client(&service);
    assert_eq!(client.state(), ConversationState::Uninitialized);

    assert_eq!(client.start().await.unwrap(), "abc123");
    assert_eq!(client.conversation_id().as_deref(), Some("abc123"));
    assert_eq!(client.state(), ConversationState::Active);
    assert_eq!(entries(&client), vec![welcome()]);
    assert!(DEFAULT_WELCOME_MESSAGE.starts_with("Hello! "));

    // Starting again reuses the conversation.
    assert_eq!(client.start().await.unwrap(), "abc123");
    assert_eq!(entries(&client), vec![welcome()]);
    assert_eq!(service.calls(), vec![RecordedCall::Start]);
}

#[tokio::test]
async fn test_start_failure() {
    let service = TestChatService::default();
    service.add_start_reply(PresetReply::protocol_failure("not success"));
    let client = build_client(&service);

    let err = client.start().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert_eq!(client.conversation_id(), None);
    assert_eq!(client.state(), ConversationState::Uninitialized);

    let transcript = client.transcript();
    assert_eq!(transcript.len(), 1);
    let message = transcript.last().unwrap();
    assert_eq!(message.sender(), Sender::Assistant);
    assert!(message.is_error());
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_starts_share_one_conversation() {
    let service = TestChatService::default();
    service.set_delay(Duration::from_millis(200));
    service.add_start_reply(PresetReply::success("abc123"));
    service.add_start_reply(PresetReply::success("def456"));
    let client = build_client(&service);

    let (first, second) = tokio::join!(client.start(), client.start());
    assert_eq!(first.unwrap(), "abc123");
    assert_eq!(second.unwrap(), "abc123");
    assert_eq!(service.calls(), vec![RecordedCall::Start]);
    assert_eq!(entries(&client), vec![welcome()]);
}

#[tokio::test(start_paused = true)]
async fn test_send_answers() {
    let service = TestChatService::default();
    service.set_delay(Duration::from_millis(100));
    service.add_start_reply(PresetReply::success("abc123"));
    service.add_chat_reply(PresetReply::success("Fork, branch, PR."));
    let client = build_client(&service);
    client.start().await.unwrap();

    let question = "How do I open a PR?";
    let (answer, _) = tokio::join!(client.send(question), async {
        // The question shows up before the service replies.
        let transcript = client.transcript();
        let last = transcript.last().unwrap();
        assert_eq!(last.sender(), Sender::User);
        assert_eq!(last.text(), question);
        assert_eq!(client.state(), ConversationState::Busy);
    });
    assert_eq!(answer.unwrap(), "Fork, branch, PR.");

    assert_eq!(
        entries(&client),
        vec![
            welcome(),
            (Sender::User, MessageKind::Normal, question.to_owned()),
            (
                Sender::Assistant,
                MessageKind::Normal,
                "Fork, branch, PR.".to_owned()
            ),
        ]
    );
    assert_eq!(client.state(), ConversationState::Active);
    assert_eq!(
        service.chat_requests(),
        vec![ChatRequest::new("abc123", question)]
    );
}

#[tokio::test]
async fn test_send_trims_and_forwards_realtime() {
    let service = TestChatService::default();
    service.add_start_reply(PresetReply::success("abc123"));
    service.add_chat_reply(PresetReply::success("Sure."));
    let client = ConversationClientBuilder::with_service(service.clone())
        .with_realtime(true)
        .build();
    client.start().await.unwrap();

    client.send("  Any good first issues?\n").await.unwrap();
    assert_eq!(
        service.chat_requests(),
        vec![
            ChatRequest::new("abc123", "Any good first issues?")
                .with_realtime(true)
        ]
    );
    assert_eq!(client.transcript().messages()[1].text(), "Any good first issues?");
}

#[tokio::test]
async fn test_send_empty_is_ignored() {
    let service = TestChatService::default();
    let client = build_client(&service);

    for text in ["", "   ", "\n\t"] {
        let err = client.send(text).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
    assert!(client.transcript().is_empty());
    assert!(service.calls().is_empty());
    assert!(!client.is_busy());
}

#[tokio::test]
async fn test_send_failure_keeps_conversation() {
    let service = TestChatService::default();
    service.add_start_reply(PresetReply::success("abc123"));
    service.add_chat_reply(PresetReply::transport_failure("HTTP status 500"));
    let client = build_client(&service);
    client.start().await.unwrap();

    let err = client.send("Hello").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(
        entries(&client),
        vec![
            welcome(),
            (Sender::User, MessageKind::Normal, "Hello".to_owned()),
            (
                Sender::Assistant,
                MessageKind::Error,
                "Sorry, there was an error: HTTP status 500".to_owned()
            ),
        ]
    );
    assert!(!client.is_busy());
    assert_eq!(client.conversation_id().as_deref(), Some("abc123"));
}

#[tokio::test]
async fn test_send_starts_conversation_first() {
    let service = TestChatService::default();
    service.add_start_reply(PresetReply::success("abc123"));
    service.add_chat_reply(PresetReply::success("Welcome aboard."));
    let client = build_client(&service);

    client.send("Hi").await.unwrap();
    assert_eq!(
        service.calls(),
        vec![
            RecordedCall::Start,
            RecordedCall::Chat(ChatRequest::new("abc123", "Hi")),
        ]
    );
    assert_eq!(
        entries(&client),
        vec![
            (Sender::User, MessageKind::Normal, "Hi".to_owned()),
            welcome(),
            (
                Sender::Assistant,
                MessageKind::Normal,
                "Welcome aboard.".to_owned()
            ),
        ]
    );
}

#[tokio::test]
async fn test_send_skips_chat_when_start_fails() {
    let service = TestChatService::default();
    service.add_start_reply(PresetReply::transport_failure("unreachable"));
    let client = build_client(&service);

    let err = client.send("Hi").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(service.calls(), vec![RecordedCall::Start]);

    let transcript = client.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript.messages()[0].sender(), Sender::User);
    assert!(transcript.messages()[1].is_error());
    assert!(!client.is_busy());
}

#[tokio::test(start_paused = true)]
async fn test_send_while_busy_is_rejected() {
    let service = TestChatService::default();
    service.set_delay(Duration::from_millis(100));
    service.add_start_reply(PresetReply::success("abc123"));
    service.add_chat_reply(PresetReply::success("First answer"));
    service.add_chat_reply(PresetReply::success("Second answer"));
    let client = build_client(&service);
    client.start().await.unwrap();

    let (first, second, reset) = tokio::join!(
        client.send("first"),
        client.send("second"),
        client.reset()
    );
    assert_eq!(first.unwrap(), "First answer");
    assert_eq!(second.unwrap_err().kind(), ErrorKind::Busy);
    assert_eq!(reset.unwrap_err().kind(), ErrorKind::Busy);

    assert_eq!(service.chat_requests().len(), 1);
    let texts: Vec<_> = entries(&client).into_iter().map(|e| e.2).collect();
    assert_eq!(texts, vec![DEFAULT_WELCOME_MESSAGE, "first", "First answer"]);

    // Once idle, the next submission goes through.
    assert_eq!(client.send("second").await.unwrap(), "Second answer");
}

#[tokio::test]
async fn test_reset() {
    let service = TestChatService::default();
    service.add_start_reply(PresetReply::success("abc123"));
    service.add_chat_reply(PresetReply::success("Fork, branch, PR."));
    service.add_reset_reply(PresetReply::success(""));
    service.add_start_reply(PresetReply::success("def456"));
    let client = build_client(&service);
    client.start().await.unwrap();
    client.send("How do I open a PR?").await.unwrap();

    client.reset().await.unwrap();
    assert_eq!(entries(&client), vec![welcome()]);
    assert_eq!(client.conversation_id().as_deref(), Some("def456"));
    assert_eq!(client.state(), ConversationState::Active);
    assert_eq!(
        service.calls()[2..],
        [RecordedCall::Reset(Some("abc123".to_owned())), RecordedCall::Start]
    );

    // A start right after the reset doesn't greet twice.
    client.start().await.unwrap();
    assert_eq!(entries(&client), vec![welcome()]);
}

#[tokio::test]
async fn test_reset_without_conversation() {
    let service = TestChatService::default();
    service.add_start_reply(PresetReply::transport_failure("unreachable"));
    service.add_start_reply(PresetReply::success("abc123"));
    let client = build_client(&service);
    client.start().await.unwrap_err();

    client.reset().await.unwrap();
    assert_eq!(entries(&client), vec![welcome()]);
    assert_eq!(client.conversation_id().as_deref(), Some("abc123"));
    assert_eq!(
        service.calls(),
        vec![RecordedCall::Start, RecordedCall::Start]
    );
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_requests_release_the_client() {
    let service = TestChatService::default();
    service.add_start_reply(PresetReply::success("abc123"));
    service.add_start_reply(PresetReply::success("def456"));
    service.add_chat_reply(PresetReply::success("Too late"));
    service.add_chat_reply(PresetReply::success("Fork, branch, PR."));

    let busy_events = Arc::new(Mutex::new(Vec::new()));
    let client = ConversationClientBuilder::with_service(service.clone())
        .on_busy_changed({
            let busy_events = Arc::clone(&busy_events);
            move |busy| busy_events.lock().unwrap().push(busy)
        })
        .build();

    service.set_delay(Duration::from_secs(10));
    let started = timeout(Duration::from_secs(1), client.start()).await;
    assert!(started.is_err());
    assert_eq!(client.state(), ConversationState::Uninitialized);

    service.set_delay(Duration::ZERO);
    assert_eq!(client.start().await.unwrap(), "def456");

    service.set_delay(Duration::from_secs(10));
    let answer = timeout(Duration::from_secs(1), client.send("first")).await;
    assert!(answer.is_err());
    assert!(!client.is_busy());
    assert_eq!(client.state(), ConversationState::Active);
    assert_eq!(*busy_events.lock().unwrap(), vec![true, false]);

    service.add_reset_reply(PresetReply::success(""));
    let reset = timeout(Duration::from_secs(1), client.reset()).await;
    assert!(reset.is_err());
    assert!(!client.is_busy());
    assert_eq!(client.conversation_id().as_deref(), Some("def456"));

    service.set_delay(Duration::ZERO);
    assert_eq!(client.send("second").await.unwrap(), "Fork, branch, PR.");
    let texts: Vec<_> = entries(&client).into_iter().map(|e| e.2).collect();
    assert_eq!(
        texts,
        vec![DEFAULT_WELCOME_MESSAGE, "first", "second", "Fork, branch, PR."]
    );
}

#[tokio::test]
async fn test_reset_failure() {
    let service = TestChatService::default();
    service.add_start_reply(PresetReply::success("abc123"));
    service.add_reset_reply(PresetReply::protocol_failure("Failed to reset"));
    let client = build_client(&service);
    client.start().await.unwrap();

    let err = client.reset().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert_eq!(
        entries(&client),
        vec![
            welcome(),
            (
                Sender::Assistant,
                MessageKind::Error,
                "Error resetting conversation: Failed to reset".to_owned()
            ),
        ]
    );
    assert_eq!(client.conversation_id().as_deref(), Some("abc123"));
    assert!(!client.is_busy());
}

#[tokio::test]
async fn test_callbacks() {
    let service = TestChatService::default();
    service.add_start_reply(PresetReply::success("abc123"));
    service.add_chat_reply(PresetReply::success("Hi!"));
    service.add_chat_reply(PresetReply::protocol_failure("boom"));
    service.add_reset_reply(PresetReply::success(""));
    service.add_start_reply(PresetReply::success("def456"));

    let events = Arc::new(Mutex::new(Vec::<String>::new()));
    let record = |events: &Arc<Mutex<Vec<String>>>| {
        let events = Arc::clone(events);
        move |event: String| events.lock().unwrap().push(event)
    };
    let client = ConversationClientBuilder::with_service(service.clone())
        .with_welcome_message("Welcome!")
        .on_message({
            let record = record(&events);
            move |message| {
                record(format!("{}: {}", message.sender().as_str(), message.text()))
            }
        })
        .on_busy_changed({
            let record = record(&events);
            move |busy| record(format!("busy: {busy}"))
        })
        .on_focus_input({
            let record = record(&events);
            move || record("focus".to_owned())
        })
        .on_transcript_cleared({
            let record = record(&events);
            move || record("cleared".to_owned())
        })
        .build();

    client.send("Hello").await.unwrap();
    client.send("Again").await.unwrap_err();
    client.reset().await.unwrap();

    assert_eq!(
        *events.lock().unwrap(),
        vec![
            "busy: true",
            "user: Hello",
            "assistant: Welcome!",
            "assistant: Hi!",
            "busy: false",
            "focus",
            "busy: true",
            "user: Again",
            "assistant: Sorry, there was an error: boom",
            "busy: false",
            "busy: true",
            "cleared",
            "assistant: Welcome!",
            "busy: false",
        ]
    );
}

#[tokio::test]
async fn test_suggestions() {
    let service = TestChatService::default();
    service.add_start_reply(PresetReply::success("abc123"));
    service.add_chat_reply(PresetReply::success("Try documentation."));
    let client = ConversationClientBuilder::with_service(service.clone())
        .with_suggestions(["How do I start contributing?", "Find Rust issues"])
        .build();

    assert_eq!(client.suggestions().len(), 2);
    let err = client.send_suggestion(5).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(service.calls().is_empty());

    client.send_suggestion(0).await.unwrap();
    assert_eq!(
        service.chat_requests(),
        vec![ChatRequest::new("abc123", "How do I start contributing?")]
    );
}

#[tokio::test]
async fn test_check_health() {
    let service = TestChatService::default();
    let client = build_client(&service);

    let health = client.check_health().await.unwrap();
    assert!(health.is_healthy());
    assert!(client.transcript().is_empty());
    assert_eq!(service.calls(), vec![RecordedCall::Health]);
}
