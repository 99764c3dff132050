use embedding_provider::config::{default_hashing_config, default_stdio_config, stdio_config_in, ONNX_STDIO_DEFAULTS};
use embedding_provider::embedder::{
    Embedder, EmbedderError, HashingConfig, HashingEmbedder, OnnxStdIoEmbedder, ProviderKind,
};

fn hashing(dimension: usize, max_input_length: usize) -> HashingEmbedder {
    HashingEmbedder::new(HashingConfig {
        dimension,
        max_input_length,
    })
    .expect("hashing configuration is valid")
}

fn squared_distance(lhs: &[f32], rhs: &[f32]) -> f32 {
    lhs.iter().zip(rhs).map(|(a, b)| (a - b) * (a - b)).sum()
}

fn assert_vectors_close(lhs: &[f32], rhs: &[f32]) {
    assert_eq!(lhs.len(), rhs.len(), "vector lengths differ");
    for (index, (a, b)) in lhs.iter().zip(rhs.iter()).enumerate() {
        let diff = (a - b).abs();
        assert!(
            diff <= 1e-4,
            "vectors diverge at position {index}: {a} vs {b} (diff {diff})"
        );
    }
}

#[test]
fn hashing_embedder_produces_deterministic_vectors() {
    let embedder = HashingEmbedder::new(default_hashing_config()).expect("defaults are valid");

    let sentence = "Rust makes systems programming safer without sacrificing speed.";
    let vector_a = embedder.embed(sentence).expect("first embedding succeeds");
    let vector_b = embedder.embed(sentence).expect("second embedding succeeds");

    assert_eq!(vector_a.len(), embedder.dimension());
    assert_eq!(vector_a, vector_b);

    let norm: f32 = vector_a.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-4, "vector should be unit length, got {norm}");

    let info = embedder.info();
    assert_eq!(info.provider, ProviderKind::Hashing);
    assert_eq!(info.embedding_model_id, "token-hash-384");
}

#[test]
fn hashing_embed_batch_matches_individual_embeddings() {
    let embedder = hashing(64, 1_000);
    let inputs = ["embeddings unlock semantic search", "the quick brown fox"];

    let batch_vectors = embedder.embed_batch(&inputs).expect("batch embedding succeeds");
    assert_eq!(batch_vectors.len(), inputs.len());

    for (text, batch_vector) in inputs.iter().zip(batch_vectors.iter()) {
        let single = embedder.embed(text).expect("single embedding succeeds");
        assert_vectors_close(&single, batch_vector);
    }
}

#[test]
fn hashing_ignores_case_and_punctuation() {
    let embedder = hashing(32, 1_000);
    let a = embedder.embed("The Quick, brown FOX!").unwrap();
    let b = embedder.embed("the quick brown fox").unwrap();
    assert_vectors_close(&a, &b);
}

#[test]
fn texts_sharing_words_are_closer() {
    let embedder = hashing(256, 1_000);
    let query = embedder.embed("fox").unwrap();
    let related = embedder.embed("The quick brown fox.").unwrap();
    let unrelated = embedder.embed("Quarterly revenue grew in Europe.").unwrap();

    assert!(squared_distance(&query, &related) < squared_distance(&query, &unrelated));
}

#[test]
fn empty_text_embeds_to_zero_vector() {
    let embedder = hashing(16, 10);
    let vector = embedder.embed("").unwrap();
    assert_eq!(vector, vec![0.0; 16]);
}

#[test]
fn hashing_rejects_inputs_longer_than_limit() {
    let embedder = hashing(16, 5);
    let err = embedder.embed("abcdef").unwrap_err();
    assert_eq!(
        err,
        EmbedderError::InputTooLong {
            max_length: 5,
            actual_length: 6,
        }
    );

    // One oversized entry fails the whole batch.
    assert!(embedder.embed_batch(&["ok", "abcdef"]).is_err());
}

#[test]
fn hashing_rejects_zero_dimension() {
    let err = HashingEmbedder::new(HashingConfig {
        dimension: 0,
        max_input_length: 10,
    })
    .unwrap_err();
    assert!(matches!(err, EmbedderError::InvalidConfiguration { .. }));
}

#[test]
fn stdio_rejects_zero_dimension() {
    let mut config = default_stdio_config();
    config.dimension = 0;
    let err = OnnxStdIoEmbedder::new(config).unwrap_err();
    assert!(matches!(err, EmbedderError::InvalidConfiguration { .. }));
}

#[test]
fn stdio_reports_missing_runtime_library() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = OnnxStdIoEmbedder::new(stdio_config_in(dir.path())).unwrap_err();
    match err {
        EmbedderError::InvalidConfiguration { message } => {
            assert!(message.contains("ONNX Runtime shared library"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
#[ignore = "requires the ONNX runtime and model under embedding_provider/"]
fn stdio_embedder_produces_deterministic_vectors() {
    let embedder = OnnxStdIoEmbedder::new(default_stdio_config())
        .expect("configuration is valid and model loads");

    let sentence = "Rust makes systems programming safer without sacrificing speed.";
    let vector_a = embedder.embed(sentence).expect("first embedding succeeds");
    let vector_b = embedder.embed(sentence).expect("second embedding succeeds");

    assert_eq!(vector_a.len(), ONNX_STDIO_DEFAULTS.embedding_dimension);
    assert_vectors_close(&vector_a, &vector_b);

    let info = embedder.info();
    assert_eq!(info.provider, ProviderKind::OnnxStdIo);
    assert_eq!(info.embedding_model_id, ONNX_STDIO_DEFAULTS.embedding_model_id);

    let inputs = [
        "embeddings unlock semantic search",
        "a longer second sentence forces the first one to be padded",
    ];
    let batch = embedder.embed_batch(&inputs).expect("batch embedding succeeds");
    for (text, batch_vector) in inputs.iter().zip(batch.iter()) {
        let single = embedder.embed(text).expect("single embedding succeeds");
        assert_vectors_close(&single, batch_vector);
    }
}
