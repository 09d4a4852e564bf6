use criterion::{Criterion, criterion_group, criterion_main};
use hr_assistant::embeddings::{Embedder, HashEmbedder};
use hr_assistant::index::FlatL2Index;
use hr_assistant::knowledge::load_entries;
use hr_assistant::retrieval::Retriever;
use std::hint::black_box;
use std::path::Path;

const SYNTHETIC_ENTRIES: usize = 5_000;

pub fn criterion_benchmark(c: &mut Criterion) {
    let embedder = HashEmbedder::default();
    let mut index = FlatL2Index::with_capacity(embedder.dimension(), SYNTHETIC_ENTRIES);
    for i in 0..SYNTHETIC_ENTRIES {
        let text = format!("question {i} congés paie mutuelle entrée {}", i % 97);
        let vector = embedder.embed(&text).expect("synthetic text embeds");
        index.insert(&vector).expect("dimension matches");
    }
    let query = embedder
        .embed("Comment poser des congés ?")
        .expect("query embeds");

    c.bench_function("flat_l2_search_5000", |b| {
        b.iter(|| index.search(black_box(&query), black_box(3)))
    });

    let knowledge_path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/knowledge_base.json");
    let knowledge = load_entries(knowledge_path).expect("can read knowledge base");
    let retriever =
        Retriever::build(knowledge, Box::new(HashEmbedder::default())).expect("retriever builds");

    c.bench_function("retriever_search", |b| {
        b.iter(|| retriever.search(black_box("Quand est-ce que je suis payé ?"), black_box(3)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
