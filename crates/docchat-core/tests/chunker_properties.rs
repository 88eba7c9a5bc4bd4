use docchat_core::chunker::RecursiveChunker;
use docchat_core::config::ChunkingConfig;
use proptest::prelude::*;

fn sizes() -> impl Strategy<Value = (usize, usize)> {
    (1usize..40).prop_flat_map(|max| (Just(max), 0..max))
}

fn chunker(max: usize, overlap: usize) -> RecursiveChunker {
    RecursiveChunker::new(&ChunkingConfig { max_chunk_size: max, overlap, ..ChunkingConfig::default() }).unwrap()
}

fn head(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

fn tail(s: &str, n: usize) -> String {
    let len = s.chars().count();
    s.chars().skip(len.saturating_sub(n)).collect()
}

proptest! {
    #[test]
    fn chunks_never_exceed_the_maximum((max, overlap) in sizes(), text in "[ab é\n]{0,300}") {
        for chunk in chunker(max, overlap).split(&text) {
            prop_assert!(chunk.char_len() <= max, "{} > {}", chunk.char_len(), max);
        }
    }

    #[test]
    fn neighbours_share_exactly_the_overlap((max, overlap) in sizes(), text in "[ab é\n]{0,300}") {
        let chunks = chunker(max, overlap).split(&text);
        for pair in chunks.windows(2) {
            prop_assert!(pair[0].char_len() > overlap);
            prop_assert_eq!(tail(&pair[0].content, overlap), head(&pair[1].content, overlap));
        }
    }

    #[test]
    fn chunks_rebuild_the_text((max, overlap) in sizes(), text in "[ab é\n]{1,300}") {
        prop_assume!(!text.trim().is_empty());
        let chunks = chunker(max, overlap).split(&text);
        let mut rebuilt = chunks[0].content.clone();
        for chunk in &chunks[1..] {
            rebuilt.extend(chunk.content.chars().skip(overlap));
        }
        prop_assert_eq!(rebuilt, text);
    }

    #[test]
    fn chunking_is_idempotent((max, overlap) in sizes(), text in ".{0,200}") {
        let c = chunker(max, overlap);
        prop_assert_eq!(c.split(&text), c.split(&text));
    }
}
