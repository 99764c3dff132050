use generation_provider::config::{GeminiConfig, GEMINI_DEFAULTS};
use generation_provider::generator::{parse_response, request_json, ChatTurn, GeminiGenerator, GeneratorError};
use generation_provider::prompt::build_prompt;

#[test]
fn prompt_joins_context_and_lists_history() {
    let history = vec![ChatTurn::new("hi", "hello")];
    let prompt = build_prompt("what about foxes?", &["The quick brown fox.", "Foxes are canids."], &history);

    let expected = "\nYou are an intelligent assistant. Use the context below to answer the user's query concisely.\n\n\
Context:\nThe quick brown fox.\nFoxes are canids.\n\n\
Conversation History:\nUser: hi\nBot: hello\nUser: what about foxes?\n\n\n\
User Query:\nwhat about foxes?\n\n\
Answer:\n";
    assert_eq!(prompt, expected);
}

#[test]
fn defaults_match_original_sampling_settings() {
    let config = GeminiConfig::with_api_key("k");
    assert_eq!(config.model, "gemini-2.0-flash-exp");
    assert_eq!(config.temperature, 0.2);
    assert_eq!(config.top_p, 0.95);
    assert_eq!(config.top_k, 40);
    assert_eq!(config.max_output_tokens, 1024);
    assert_eq!(
        config.url(),
        format!("{}/gemini-2.0-flash-exp:generateContent", GEMINI_DEFAULTS.endpoint)
    );
}

#[test]
fn request_body_uses_camel_case_generation_config() {
    let config = GeminiConfig::with_api_key("k");
    let body = request_json(&config, "q", &["ctx"], &[]);

    assert_eq!(body["contents"][0]["role"], "user");
    assert!(body["contents"][0]["parts"][0]["text"].as_str().unwrap().contains("Context:\nctx\n"));
    let generation = &body["generationConfig"];
    assert_eq!(generation["topK"], 40);
    assert_eq!(generation["maxOutputTokens"], 1024);
    assert_eq!(generation["responseMimeType"], "text/plain");
}

#[test]
fn response_text_is_concatenated_and_trimmed() {
    let body = r#"{"candidates":[{"content":{"parts":[{"text":"  Foxes "},{"text":"are quick.\n"}]}}]}"#;
    assert_eq!(parse_response(body).unwrap(), "Foxes are quick.");
}

#[test]
fn empty_or_malformed_response_is_an_error() {
    assert!(matches!(parse_response(r#"{"candidates":[]}"#), Err(GeneratorError::Response { .. })));
    assert!(matches!(parse_response("{}"), Err(GeneratorError::Response { .. })));
    assert!(matches!(parse_response("not json"), Err(GeneratorError::Response { .. })));
}

#[test]
fn missing_env_key_and_empty_key_are_configuration_errors() {
    let err = GeminiConfig::from_env_var("DOC_QA_TEST_KEY_THAT_IS_NEVER_SET").unwrap_err();
    assert!(matches!(err, GeneratorError::InvalidConfiguration { .. }));

    let err = GeminiGenerator::new(GeminiConfig::with_api_key("  ")).unwrap_err();
    assert!(matches!(err, GeneratorError::InvalidConfiguration { .. }));
}
