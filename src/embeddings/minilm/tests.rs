use super::*;
use crate::knowledge;
use crate::retrieval::Retriever;
use std::path::PathBuf;

fn model_dir() -> PathBuf {
    std::env::var_os("HR_ASSISTANT_MODEL_DIR").map_or_else(
        || Path::new(env!("CARGO_MANIFEST_DIR")).join("models/all-MiniLM-L6-v2"),
        PathBuf::from,
    )
}

fn load_model() -> MiniLmEmbedder {
    MiniLmEmbedder::load(&model_dir(), MAX_SEQUENCE_TOKENS).expect("model loads")
}

#[test]
fn missing_model_directory_fails_to_load() {
    let result = MiniLmEmbedder::load(Path::new("/nonexistent/minilm"), MAX_SEQUENCE_TOKENS);
    let err = result.err().expect("load should fail without weights");
    assert!(err.to_string().contains(WEIGHTS_FILE));
}

#[test]
#[ignore = "requires all-MiniLM-L6-v2 model files"]
fn embeds_to_384_dimensions() {
    let embedder = load_model();
    let vector = embedder
        .embed("How do I get my payslip?")
        .expect("embedding succeeds");

    assert_eq!(vector.len(), EMBEDDING_DIMENSION);
    assert!(vector.iter().all(|x| x.is_finite()));
}

#[test]
#[ignore = "requires all-MiniLM-L6-v2 model files"]
fn embedding_is_deterministic() {
    let embedder = load_model();
    let a = embedder.embed("Comment poser des congés ?").expect("embeds");
    let b = embedder.embed("Comment poser des congés ?").expect("embeds");

    assert_eq!(a, b);
}

#[test]
#[ignore = "requires all-MiniLM-L6-v2 model files"]
fn related_questions_are_closer_than_unrelated_ones() {
    let embedder = load_model();
    let payslip = embedder.embed("How do I get my payslip?").expect("embeds");
    let paraphrase = embedder.embed("How can I get my payslip?").expect("embeds");
    let weather = embedder
        .embed("What is the weather like in Tokyo?")
        .expect("embeds");

    let dist = |a: &[f32], b: &[f32]| -> f32 { a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum() };
    assert!(dist(&payslip, &paraphrase) < dist(&payslip, &weather));
}

#[test]
#[ignore = "requires all-MiniLM-L6-v2 model files"]
fn overlong_input_is_truncated_and_counted() {
    let embedder = load_model();
    embedder.embed("short question").expect("embeds");
    assert_eq!(embedder.truncated_inputs(), 0);

    let long_text = "congés ".repeat(2_000);
    let vector = embedder.embed(&long_text).expect("long input still embeds");
    assert_eq!(vector.len(), EMBEDDING_DIMENSION);
    assert_eq!(embedder.truncated_inputs(), 1);
}

#[test]
#[ignore = "requires all-MiniLM-L6-v2 model files"]
fn shipped_entries_retrieve_themselves() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/knowledge_base.json");
    let loaded = knowledge::load_entries(path).expect("shipped file loads");
    let retriever = Retriever::build(loaded, Box::new(load_model())).expect("retriever builds");

    for (position, entry) in retriever.entries().iter().enumerate() {
        let matches = retriever
            .search(&entry.combined_text, 1)
            .expect("search succeeds");
        assert_eq!(matches[0].position, position, "{:?}", entry.question);
        assert!(matches[0].distance.abs() < 1e-3, "{:?}", entry.question);
    }
}
