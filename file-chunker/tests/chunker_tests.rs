use file_chunker::{chunk, chunk_text, join_segments, ChunkError, ChunkParams};
use proptest::prelude::*;

fn reconstruct(chunks: &[String], overlap: usize) -> String {
    let mut out = String::new();
    for (i, c) in chunks.iter().enumerate() {
        if i == 0 {
            out.push_str(c);
        } else {
            out.extend(c.chars().skip(overlap));
        }
    }
    out
}

#[test]
fn empty_text_yields_no_chunks() {
    let chunks = chunk("", 1000, 100).expect("valid params");
    assert!(chunks.is_empty());
}

#[test]
fn short_text_is_a_single_chunk() {
    let chunks = chunk("The quick brown fox.", 1000, 100).expect("valid params");
    assert_eq!(chunks, vec!["The quick brown fox.".to_string()]);
}

#[test]
fn text_exactly_chunk_size_is_not_split() {
    let text = "x".repeat(1000);
    let chunks = chunk(&text, 1000, 100).expect("valid params");
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0], text);
}

#[test]
fn windows_advance_by_stride() {
    let chunks = chunk("abcdefghij", 4, 1).expect("valid params");
    assert_eq!(chunks, vec!["abcd", "defg", "ghij"]);
}

#[test]
fn final_chunk_may_be_shorter() {
    let text: String = ('a'..='z').cycle().take(2500).collect();
    let chunks = chunk_text(&text, &ChunkParams::default()).expect("valid params");
    let lens: Vec<usize> = chunks.iter().map(|c| c.chars().count()).collect();
    assert_eq!(lens, vec![1000, 1000, 700]);
    assert_eq!(reconstruct(&chunks, 100), text);
}

#[test]
fn offsets_count_characters_not_bytes() {
    let chunks = chunk("日本語テキスト", 3, 1).expect("valid params");
    assert_eq!(chunks, vec!["日本語", "語テキ", "キスト"]);
}

#[test]
fn overlap_not_smaller_than_size_is_rejected() {
    assert_eq!(
        chunk("some text", 100, 100),
        Err(ChunkError::InvalidConfiguration { chunk_size: 100, overlap: 100 })
    );
    assert!(matches!(chunk("some text", 10, 50), Err(ChunkError::InvalidConfiguration { .. })));
    assert!(matches!(chunk("", 0, 0), Err(ChunkError::InvalidConfiguration { .. })));
    assert!(ChunkParams::new(100, 200).is_err());
}

#[test]
fn zero_overlap_partitions_the_text() {
    let chunks = chunk("abcdefg", 3, 0).expect("valid params");
    assert_eq!(chunks, vec!["abc", "def", "g"]);
}

#[test]
fn segments_are_joined_with_single_spaces() {
    let segments = vec!["first page".to_string(), "second page".to_string()];
    assert_eq!(join_segments(&segments), "first page second page");
    let none: [&str; 0] = [];
    assert_eq!(join_segments(&none), "");
}

fn params() -> impl Strategy<Value = (usize, usize)> {
    (1usize..64).prop_flat_map(|size| (Just(size), 0..size))
}

proptest! {
    #[test]
    fn removing_overlap_reconstructs_text(text in "\\PC{0,400}", (size, overlap) in params()) {
        let chunks = chunk(&text, size, overlap).unwrap();
        prop_assert_eq!(reconstruct(&chunks, overlap), text);
    }

    #[test]
    fn chunks_never_exceed_size(text in "\\PC{0,400}", (size, overlap) in params()) {
        let chunks = chunk(&text, size, overlap).unwrap();
        prop_assert!(chunks.iter().all(|c| !c.is_empty() && c.chars().count() <= size));
    }

    #[test]
    fn text_within_size_is_one_chunk(text in "\\PC{1,80}", overlap in 0usize..20) {
        let size = text.chars().count() + overlap + 1;
        let chunks = chunk(&text, size, overlap).unwrap();
        prop_assert_eq!(chunks, vec![text]);
    }
}
