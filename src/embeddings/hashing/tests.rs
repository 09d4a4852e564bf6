use super::*;

#[test]
fn default_dimension_matches_minilm() {
    let embedder = HashEmbedder::default();
    let vector = embedder.embed("Comment poser des congés ?").expect("embeds");

    assert_eq!(embedder.dimension(), EMBEDDING_DIMENSION);
    assert_eq!(vector.len(), EMBEDDING_DIMENSION);
}

#[test]
fn identical_text_gives_identical_vectors() {
    let embedder = HashEmbedder::default();
    let a = embedder.embed("How do I get my payslip?").expect("embeds");
    let b = embedder.embed("How do I get my payslip?").expect("embeds");

    assert_eq!(a, b);
}

#[test]
fn non_empty_text_is_unit_length() {
    let embedder = HashEmbedder::default();
    let vector = embedder.embed("Quand est-ce que je suis payé ?").expect("embeds");
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();

    assert!((norm - 1.0).abs() < 1e-5, "norm was {norm}");
}

#[test]
fn case_and_punctuation_are_ignored() {
    let embedder = HashEmbedder::default();
    let a = embedder.embed("Fiche de PAIE!").expect("embeds");
    let b = embedder.embed("fiche, de paie").expect("embeds");

    assert_eq!(a, b);
}

#[test]
fn empty_text_is_the_zero_vector() {
    let embedder = HashEmbedder::default();
    let vector = embedder.embed("").expect("embeds");

    assert!(vector.iter().all(|x| *x == 0.0));
}

#[test]
fn long_input_is_truncated_and_counted() {
    let embedder = HashEmbedder::new(32).with_max_tokens(4);

    let short = embedder.embed("one two three").expect("embeds");
    assert_eq!(embedder.truncated_inputs(), 0);

    let cut = embedder.embed("one two three four five six").expect("embeds");
    let prefix = embedder.embed("one two three four").expect("embeds");
    assert_eq!(embedder.truncated_inputs(), 1);
    assert_eq!(cut, prefix);
    assert_ne!(short, cut);
}

#[test]
fn tiny_dimension_is_clamped() {
    let embedder = HashEmbedder::new(1);
    assert_eq!(embedder.dimension(), 8);
}
