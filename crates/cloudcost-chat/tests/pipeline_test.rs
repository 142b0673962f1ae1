use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use cloudcost_chat::{
    ChatConfig, ChatError, ChatInput, ChatPipeline, ChatSession, TurnOutcome,
};
use cloudcost_context::OFF_TOPIC_REPLY;
use cloudcost_llm::{ChatClient, ChatRequest, ChatResponse};
use cloudcost_persist::{
    FileType, InMemoryPersistenceClient, MessageRole, NewUpload, PersistenceClient, UploadStore,
    NO_MESSAGES_SENTINEL,
};

enum Behavior {
    Reply(&'static str),
    /// Answers relevance questions with `verdict`, everything else with `reply`
    Classify {
        verdict: &'static str,
        reply: &'static str,
    },
    Fail,
    Hang,
}

struct StubClient {
    behavior: Behavior,
    calls: AtomicUsize,
    last_request: std::sync::Mutex<Option<ChatRequest>>,
}

impl StubClient {
    fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
            last_request: std::sync::Mutex::new(None),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_prompt(&self) -> String {
        let request = self.last_request.lock().unwrap();
        request
            .as_ref()
            .map(|r| {
                r.messages
                    .iter()
                    .map(|m| m.content().to_plain_text())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatClient for StubClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let is_relevance_check = request
            .messages
            .iter()
            .any(|m| m.content().to_plain_text().starts_with("Is the following text related"));
        if !is_relevance_check {
            *self.last_request.lock().unwrap() = Some(request);
        }
        match self.behavior {
            Behavior::Reply(text) => Ok(ChatResponse::text(text)),
            Behavior::Classify { verdict, .. } if is_relevance_check => {
                Ok(ChatResponse::text(verdict))
            }
            Behavior::Classify { reply, .. } => Ok(ChatResponse::text(reply)),
            Behavior::Fail => anyhow::bail!("quota exceeded"),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(ChatResponse::text("too late"))
            }
        }
    }
}

fn pipeline(
    client: Arc<StubClient>,
    store: Arc<InMemoryPersistenceClient>,
    config: ChatConfig,
) -> ChatPipeline {
    ChatPipeline::builder()
        .llm_client(client)
        .with_persistence(store)
        .config(config)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_conversation_turn_persists_both_messages() {
    let client = StubClient::new(Behavior::Reply("Use reserved instances."));
    let store = Arc::new(InMemoryPersistenceClient::new());
    let chat = pipeline(client.clone(), store.clone(), ChatConfig::default());

    let mut session = ChatSession::new("guest");
    let outcome = chat
        .handle_turn(&mut session, ChatInput::message("How can I lower EC2 costs?"))
        .await
        .unwrap();

    let reply = outcome.reply().unwrap();
    assert_eq!(reply.reply, "Use reserved instances.");
    assert_eq!(reply.mode, "conversation");
    assert_eq!(session.thread_id.as_deref(), Some(reply.thread_id.as_str()));

    let messages = store.get_thread_messages("guest", &reply.thread_id).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, MessageRole::User);
    assert_eq!(messages[0].content, "How can I lower EC2 costs?");
    assert_eq!(messages[1].role, MessageRole::Assistant);
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn test_history_is_sent_on_the_next_turn() {
    let client = StubClient::new(Behavior::Reply("Noted."));
    let store = Arc::new(InMemoryPersistenceClient::new());
    let chat = pipeline(client.clone(), store, ChatConfig::default());

    let mut session = ChatSession::new("guest");
    chat.handle_turn(&mut session, ChatInput::message("We run 40 VMs on Azure"))
        .await
        .unwrap();
    chat.handle_turn(&mut session, ChatInput::message("Which ones should I resize?"))
        .await
        .unwrap();

    let prompt = client.last_prompt();
    assert!(prompt.contains("user: We run 40 VMs on Azure"));
    assert!(prompt.contains("assistant: Noted."));
    // the new turn is sent once, as the final user message
    assert_eq!(prompt.matches("Which ones should I resize?").count(), 1);
}

#[tokio::test]
async fn test_off_topic_message_skips_the_llm() {
    let client = StubClient::new(Behavior::Reply("should not be used"));
    let store = Arc::new(InMemoryPersistenceClient::new());
    let chat = pipeline(client.clone(), store.clone(), ChatConfig::default());

    let mut session = ChatSession::new("guest");
    let outcome = chat
        .handle_turn(&mut session, ChatInput::message("Who won the football match?"))
        .await
        .unwrap();

    let reply = outcome.reply().unwrap();
    assert_eq!(reply.reply, OFF_TOPIC_REPLY);
    assert!(!reply.relevant);
    assert_eq!(client.calls(), 0);

    let messages = store.get_thread_messages("guest", &reply.thread_id).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|m| !m.relevant));
}

#[tokio::test]
async fn test_off_topic_words_with_attachment_still_analyze() {
    let client = StubClient::new(Behavior::Reply("analysis"));
    let store = Arc::new(InMemoryPersistenceClient::new());
    let chat = pipeline(client.clone(), store, ChatConfig::default());

    let mut session = ChatSession::new("guest");
    let input = ChatInput::message("what's the weather").with_metrics("cpu avg 4%");
    chat.handle_turn(&mut session, input).await.unwrap();

    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn test_plan_only_runs_file_analysis() {
    let client = StubClient::new(Behavior::Reply(
        "Rightsize.\n```json\n[{\"resource\": \"m5.2xlarge\", \"estimatedMonthlySavings\": 120}]\n```",
    ));
    let store = Arc::new(InMemoryPersistenceClient::new());
    let chat = pipeline(client.clone(), store.clone(), ChatConfig::default());

    let mut session = ChatSession::new("guest");
    let outcome = chat
        .handle_turn(&mut session, ChatInput::default().with_plan("4x m5.2xlarge on-demand"))
        .await
        .unwrap();

    let reply = outcome.reply().unwrap();
    assert_eq!(reply.mode, "file_analysis");
    assert!(reply.analysis_id.is_some());
    assert!(client.last_prompt().contains("4x m5.2xlarge on-demand"));
    assert!(client.last_prompt().contains("Pricing plan"));

    let request = client.last_request.lock().unwrap().clone().unwrap();
    assert_eq!(request.options.temperature, Some(0.2));
    assert_eq!(request.options.max_tokens, Some(2000));

    let analyses = store
        .list_analyses("guest", Some(&reply.thread_id))
        .await
        .unwrap();
    assert_eq!(analyses.len(), 1);
    assert_eq!(analyses[0].plan, "4x m5.2xlarge on-demand");
    assert_eq!(
        analyses[0].structured.as_ref().unwrap()[0]["estimatedMonthlySavings"],
        120
    );
}

#[tokio::test]
async fn test_empty_input_is_skipped() {
    let client = StubClient::new(Behavior::Reply("unused"));
    let store = Arc::new(InMemoryPersistenceClient::new());
    let chat = pipeline(client.clone(), store.clone(), ChatConfig::default());

    let mut session = ChatSession::new("guest");
    let outcome = chat
        .handle_turn(&mut session, ChatInput::message("  "))
        .await
        .unwrap();

    assert_eq!(outcome, TurnOutcome::Skipped);
    assert!(session.thread_id.is_none());
    assert!(store.get_latest_thread("guest").await.unwrap().is_none());
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_llm_failure_keeps_user_message_only() {
    let client = StubClient::new(Behavior::Fail);
    let store = Arc::new(InMemoryPersistenceClient::new());
    let chat = pipeline(client, store.clone(), ChatConfig::default());

    let mut session = ChatSession::new("guest");
    let err = chat
        .handle_turn(&mut session, ChatInput::message("Explain my S3 bill"))
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::Llm(_)));
    assert!(err.is_llm_failure());

    let thread_id = session.thread_id.unwrap();
    let messages = store.get_thread_messages("guest", &thread_id).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, MessageRole::User);
}

#[tokio::test]
async fn test_llm_timeout_fails_the_turn() {
    let client = StubClient::new(Behavior::Hang);
    let store = Arc::new(InMemoryPersistenceClient::new());
    let config = ChatConfig::default().with_timeout(Duration::from_millis(50));
    let chat = pipeline(client, store.clone(), config);

    let mut session = ChatSession::new("guest");
    let err = chat
        .handle_turn(&mut session, ChatInput::message("Compare GCP and AWS storage pricing"))
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::Timeout(_)));

    let thread_id = session.thread_id.unwrap();
    assert_eq!(store.get_thread_messages("guest", &thread_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_thread_is_rejected() {
    let client = StubClient::new(Behavior::Reply("unused"));
    let store = Arc::new(InMemoryPersistenceClient::new());
    let chat = pipeline(client.clone(), store, ChatConfig::default());

    let mut session = ChatSession::new("guest").with_thread("missing");
    let err = chat
        .handle_turn(&mut session, ChatInput::message("hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::ThreadNotFound(id) if id == "missing"));
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_turns_continue_latest_thread() {
    let client = StubClient::new(Behavior::Reply("ok"));
    let store = Arc::new(InMemoryPersistenceClient::new());
    let chat = pipeline(client, store.clone(), ChatConfig::default());

    let existing = store.create_thread("guest").await.unwrap();
    let mut session = ChatSession::new("guest");
    chat.handle_turn(&mut session, ChatInput::message("hello"))
        .await
        .unwrap();

    assert_eq!(session.thread_id.as_deref(), Some(existing.id.as_str()));
}

#[tokio::test]
async fn test_new_chat_resets_session_and_uploads() {
    let dir = tempfile::tempdir().unwrap();
    let uploads = Arc::new(UploadStore::new(dir.path(), 1024).await.unwrap());
    let store = Arc::new(InMemoryPersistenceClient::new());
    let chat = ChatPipeline::builder()
        .llm_client(StubClient::new(Behavior::Reply("ok")))
        .with_persistence(store.clone())
        .with_uploads(uploads.clone())
        .build()
        .unwrap();

    let mut session = ChatSession::new("guest").with_session_id("upload-session");
    chat.handle_turn(&mut session, ChatInput::message("hello"))
        .await
        .unwrap();
    uploads
        .store(
            NewUpload {
                user_id: "guest".to_string(),
                session_id: Some("upload-session".to_string()),
                file_type: FileType::Plan,
                file_name: "plan.csv".to_string(),
            },
            b"t3.large,730h",
        )
        .await
        .unwrap();

    let fresh = chat.lifecycle().start_new_chat(&session).await.unwrap();

    assert_ne!(fresh.thread_id, session.thread_id);
    assert_ne!(fresh.session_id, session.session_id);
    assert!(uploads.session_files("guest", "upload-session").await.is_empty());

    let latest = store.get_latest_thread("guest").await.unwrap().unwrap();
    assert_eq!(fresh.thread_id.as_deref(), Some(latest.id.as_str()));
}

#[tokio::test]
async fn test_select_thread_loads_history() {
    let store = Arc::new(InMemoryPersistenceClient::new());
    let chat = pipeline(StubClient::new(Behavior::Reply("ok")), store.clone(), ChatConfig::default());

    let mut session = ChatSession::new("guest");
    chat.handle_turn(&mut session, ChatInput::message("hello"))
        .await
        .unwrap();
    let first = session.thread_id.clone().unwrap();

    let mut other = chat.lifecycle().start_new_chat(&session).await.unwrap();
    let history = chat.lifecycle().select_thread(&mut other, &first).await.unwrap();

    assert_eq!(history.len(), 2);
    assert_eq!(other.thread_id.as_deref(), Some(first.as_str()));
    assert!(chat
        .lifecycle()
        .select_thread(&mut other, "missing")
        .await
        .is_err());
    assert_eq!(other.thread_id.as_deref(), Some(first.as_str()));
}

#[tokio::test]
async fn test_summarize() {
    let client = StubClient::new(Behavior::Reply("- discussed EC2"));
    let store = Arc::new(InMemoryPersistenceClient::new());
    let chat = pipeline(client.clone(), store.clone(), ChatConfig::default());

    let empty = store.create_thread("guest").await.unwrap();
    let summary = chat.summarize("guest", &empty.id).await.unwrap();
    assert_eq!(summary, NO_MESSAGES_SENTINEL);
    assert_eq!(client.calls(), 0);

    let mut session = ChatSession::new("guest").with_thread(empty.id.clone());
    chat.handle_turn(&mut session, ChatInput::message("EC2 is expensive"))
        .await
        .unwrap();

    let summary = chat.summarize("guest", &empty.id).await.unwrap();
    assert_eq!(summary, "- discussed EC2");
    assert!(client.last_prompt().contains("user: EC2 is expensive"));
}

#[tokio::test]
async fn test_relevance_check_flags_unrelated_turn() {
    let client = StubClient::new(Behavior::Classify {
        verdict: "No.",
        reply: "I can only help with cloud spend.",
    });
    let store = Arc::new(InMemoryPersistenceClient::new());
    let chat = pipeline(
        client.clone(),
        store.clone(),
        ChatConfig::default().with_relevance_check(true),
    );

    let mut session = ChatSession::new("guest");
    let reply = chat
        .handle_turn(&mut session, ChatInput::message("Plan my garden layout for spring"))
        .await
        .unwrap()
        .reply()
        .cloned()
        .unwrap();

    assert!(!reply.relevant);
    assert_eq!(reply.reply, "I can only help with cloud spend.");
    // one classification plus the reply
    assert_eq!(client.calls(), 2);

    let messages = store.get_thread_messages("guest", &reply.thread_id).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, MessageRole::User);
    assert!(!messages[0].relevant);
    assert!(!messages[1].relevant);
}

#[tokio::test]
async fn test_relevance_check_runs_per_attached_field() {
    let client = StubClient::new(Behavior::Classify {
        verdict: "yes",
        reply: "Move batch jobs to spot.\n```json\n[]\n```",
    });
    let store = Arc::new(InMemoryPersistenceClient::new());
    let chat = pipeline(
        client.clone(),
        store.clone(),
        ChatConfig::default().with_relevance_check(true),
    );

    let input = ChatInput::message("what can I cut?")
        .with_plan("20x c5.xlarge on-demand")
        .with_metrics("avg cpu 6%");
    let mut session = ChatSession::new("guest");
    let reply = chat
        .handle_turn(&mut session, input)
        .await
        .unwrap()
        .reply()
        .cloned()
        .unwrap();

    assert!(reply.relevant);
    assert_eq!(reply.mode, "file_analysis");
    // comment, plan and metrics are classified, then one analysis call
    assert_eq!(client.calls(), 4);

    let messages = store.get_thread_messages("guest", &reply.thread_id).await.unwrap();
    assert!(messages.iter().all(|m| m.relevant));
}
