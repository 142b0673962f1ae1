use cloudcost_llm::{ChatOptions, ChatRequest, ChatResponse, Message};

#[test]
fn test_chat_request_creation() {
    let messages = vec![Message::human("Hello")];
    let request = ChatRequest::new("gpt-4o", messages);

    assert_eq!(request.model, "gpt-4o");
    assert_eq!(request.messages.len(), 1);
    assert_eq!(request.options, ChatOptions::default());
}

#[test]
fn test_chat_request_with_options() {
    let options = ChatOptions::new()
        .temperature(0.7)
        .max_tokens(100);

    let request = ChatRequest::new("gpt-4o", vec![Message::human("Hello")])
        .with_options(options);

    assert_eq!(request.options.temperature, Some(0.7));
    assert_eq!(request.options.max_tokens, Some(100));
}

#[test]
fn test_chat_options_default() {
    let options = ChatOptions::default();

    assert_eq!(options.temperature, None);
    assert_eq!(options.max_tokens, None);
}

#[test]
fn test_response_into_text() {
    let response = ChatResponse::text("Switch to spot instances");
    assert_eq!(response.into_text().unwrap(), "Switch to spot instances");
}

#[test]
fn test_blank_response_is_an_error() {
    let response = ChatResponse {
        content: Some("   ".to_string()),
        usage: None,
        finish_reason: Some("length".to_string()),
    };
    let err = response.into_text().unwrap_err();
    assert!(err.to_string().contains("length"));

    let missing = ChatResponse { content: None, usage: None, finish_reason: None };
    assert!(missing.into_text().is_err());
}
