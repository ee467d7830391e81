use carekb_chunk::{chunk, profile_for, ChunkProfile};
use carekb_core::types::DocumentType;

fn protocol_text(target_len: usize) -> String {
    let sentence = "Assess airway patency and breathing effort before any transport decision is made. ";
    let mut text = String::new();
    while text.len() < target_len {
        text.push_str(sentence);
    }
    text.truncate(target_len);
    text
}

#[test]
fn dense_profile_chunks_a_2400_char_protocol() {
    let content = protocol_text(2400);
    let pieces = chunk(&content, &ChunkProfile::dense());

    assert!(
        (3..=4).contains(&pieces.len()),
        "expected 3-4 chunks, got {}",
        pieces.len()
    );
    for piece in &pieces {
        assert!(piece.content.len() >= 50, "chunk below minimum length");
        assert!(piece.end_offset <= content.len());
        assert!(piece.start_offset < piece.end_offset);
    }
    // Full coverage: each chunk starts at or before the previous end,
    // and adjacent chunks overlap.
    assert_eq!(pieces[0].start_offset, 0);
    for pair in pieces.windows(2) {
        assert!(
            pair[1].start_offset < pair[0].end_offset,
            "adjacent chunks must overlap"
        );
    }
    assert_eq!(pieces.last().map(|p| p.end_offset), Some(content.len()));
}

#[test]
fn chunk_indices_are_contiguous_from_zero() {
    let content = protocol_text(5000);
    let pieces = chunk(&content, &ChunkProfile::dense());
    assert!(!pieces.is_empty());
    let total = pieces.len();
    for (i, piece) in pieces.iter().enumerate() {
        assert_eq!(piece.chunk_index, i);
        assert_eq!(piece.total_chunks, total);
    }
}

#[test]
fn wide_profile_produces_fewer_chunks_than_dense() {
    let content = protocol_text(6000);
    let dense = chunk(&content, &ChunkProfile::dense());
    let wide = chunk(&content, &ChunkProfile::wide());
    assert!(wide.len() < dense.len());
}

#[test]
fn paragraphs_split_before_sentences() {
    let content = format!(
        "{}\n\n{}",
        protocol_text(600),
        protocol_text(600)
    );
    let pieces = chunk(&content, &ChunkProfile::dense());
    // Two paragraphs of 600 chars each cannot be merged under the 800
    // cap, so the paragraph boundary must separate chunks.
    assert!(pieces.len() >= 2);
    assert!(pieces[0].end_offset <= 602);
}

#[test]
fn degenerate_boilerplate_is_rejected() {
    let content = "|----|----|----|\n|....|....|....|\n".repeat(40);
    let pieces = chunk(&content, &ChunkProfile::dense());
    assert!(pieces.is_empty(), "table boilerplate must not produce chunks");
}

#[test]
fn short_fragments_are_rejected() {
    let pieces = chunk("Too short.", &ChunkProfile::dense());
    assert!(pieces.is_empty());
}

#[test]
fn unbroken_text_still_chunks_with_overlap() {
    // No separators at all: one 3000-char token run.
    let content = "x".repeat(3000);
    let pieces = chunk(&content, &ChunkProfile::dense());
    assert!(pieces.len() >= 3);
    for pair in pieces.windows(2) {
        assert!(pair[1].start_offset < pair[0].end_offset);
    }
    assert_eq!(pieces.last().map(|p| p.end_offset), Some(3000));
}

#[test]
fn profile_selection_follows_document_type() {
    assert_eq!(profile_for(DocumentType::Protocol).max_chars, 800);
    assert_eq!(profile_for(DocumentType::Guideline).max_chars, 800);
    assert_eq!(profile_for(DocumentType::Policy).max_chars, 1200);
    assert_eq!(profile_for(DocumentType::Standard).overlap, 200);
}
