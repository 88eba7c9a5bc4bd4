use docchat_core::config::{EmbeddingConfig, EmbeddingProviderKind};
use docchat_core::Error;
use docchat_embed::get_default_embedder;

#[test]
fn hash_provider_shapes_and_determinism() {
    let config = EmbeddingConfig { provider: EmbeddingProviderKind::Hash, dimension: 128, ..EmbeddingConfig::default() };
    let embedder = get_default_embedder(&config, None).expect("embedder");
    assert_eq!(embedder.dim(), 128);

    let texts = vec!["hello world".to_string(), "hello world".to_string(), "something else".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    assert_eq!(embs.len(), 3);
    assert!(embs.iter().all(|v| v.len() == 128));

    let norm: f32 = embs[0].iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");
    for (a, b) in embs[0].iter().zip(embs[1].iter()) {
        assert!((a - b).abs() <= 1e-6);
    }
    assert_ne!(embs[0], embs[2]);
}

#[test]
fn query_embedding_matches_document_embedding_for_hash_provider() {
    let config = EmbeddingConfig { provider: EmbeddingProviderKind::Hash, dimension: 32, ..EmbeddingConfig::default() };
    let embedder = get_default_embedder(&config, None).expect("embedder");
    let doc = embedder.embed_batch(&["water filter".to_string()]).unwrap().remove(0);
    assert_eq!(embedder.embed_query("water filter").unwrap(), doc);
}

#[test]
fn gemini_provider_without_credentials_is_rejected() {
    if docchat_embed::use_fake_embeddings() {
        return;
    }
    let config = EmbeddingConfig::default();
    match get_default_embedder(&config, None) {
        Err(Error::MissingCredential(var)) => assert_eq!(var, "GOOGLE_API_KEY"),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected a missing credential error"),
    }
}

#[cfg(not(feature = "local"))]
#[test]
fn local_provider_needs_the_feature() {
    if docchat_embed::use_fake_embeddings() {
        return;
    }
    let config = EmbeddingConfig { provider: EmbeddingProviderKind::Local, ..EmbeddingConfig::default() };
    assert!(matches!(get_default_embedder(&config, None), Err(Error::InvalidConfig(_))));
}
