//! These tests need the real checkpoint on disk.
//! Run with: cargo test -p semantic-embeddings -- --ignored

mod common;

use common::TEST_MODEL;

#[test]
#[ignore]
fn test_single_text_has_model_dimension() {
    let embedding = TEST_MODEL.encode("cat").expect("Failed to encode");

    assert_eq!(embedding.len(), TEST_MODEL.dimension());
    assert!(embedding.iter().all(|x| x.is_finite()));
}

#[test]
#[ignore]
fn test_batch_encoding_preserves_order() {
    let texts = vec![
        "hello".to_string(),
        "world".to_string(),
        "The weather is lovely".to_string(),
    ];

    let embeddings = TEST_MODEL.encode_batch(&texts).expect("Failed to encode batch");

    assert_eq!(embeddings.len(), 3, "Should have 3 embeddings");
    for (i, embedding) in embeddings.iter().enumerate() {
        assert_eq!(
            embedding.len(),
            TEST_MODEL.dimension(),
            "Embedding {} should match the model's hidden size",
            i
        );
    }
}

#[test]
#[ignore]
fn test_swapping_batch_order_swaps_outputs() {
    // Equal token counts, so neither text is padded
    let forward = TEST_MODEL
        .encode_batch(&["hello".to_string(), "world".to_string()])
        .expect("Failed to encode batch");
    let reversed = TEST_MODEL
        .encode_batch(&["world".to_string(), "hello".to_string()])
        .expect("Failed to encode batch");

    for (a, b) in forward[0].iter().zip(&reversed[1]) {
        assert!((a - b).abs() < 1e-4, "batch order should not change results");
    }
}

#[test]
#[ignore]
fn test_empty_batch_skips_model() {
    let embeddings = TEST_MODEL.encode_batch(&[]).expect("Empty batch should succeed");
    assert!(embeddings.is_empty());
}

#[test]
#[ignore]
fn test_long_text_is_truncated() {
    let long_text = "word ".repeat(TEST_MODEL.max_length() * 4);

    let embedding = TEST_MODEL.encode(&long_text).expect("Long text should still encode");

    assert_eq!(embedding.len(), TEST_MODEL.dimension());
}
