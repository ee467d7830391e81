//! Recursive separator splitting with offset tracking.
//!
//! Splitting tries the coarsest separator first (paragraph) and falls
//! back finer (line, sentence, clause, word) only for fragments that
//! still exceed the profile size. Fragments are then merged forward into
//! chunks of at most `max_chars`, with `overlap` bytes carried between
//! adjacent chunks.

use std::ops::Range;

use crate::clean::{clean_text, informative_ratio};
use crate::profile::ChunkProfile;

const SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", ", ", " "];

/// One produced passage. Offsets are byte positions into the original
/// content; `content` is the cleaned text that gets embedded.
#[derive(Debug, Clone)]
pub struct ChunkPiece {
    pub content: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub start_offset: usize,
    pub end_offset: usize,
}

/// Split `content` into validated, overlapping chunks.
///
/// Empty input, or input where every fragment fails validation, yields an
/// empty vector; the caller decides whether that is a soft failure.
pub fn chunk(content: &str, profile: &ChunkProfile) -> Vec<ChunkPiece> {
    if content.trim().is_empty() {
        return Vec::new();
    }

    let mut fragments = Vec::new();
    collect_fragments(content, 0, content.len(), 0, profile, &mut fragments);
    if fragments.is_empty() {
        return Vec::new();
    }

    let mut pieces: Vec<ChunkPiece> = Vec::new();
    for range in merge_fragments(content, &fragments, profile) {
        let cleaned = clean_text(&content[range.clone()]);
        if cleaned.len() < profile.min_chunk_chars {
            continue;
        }
        if informative_ratio(&cleaned) < profile.min_informative_ratio {
            continue;
        }
        pieces.push(ChunkPiece {
            content: cleaned,
            chunk_index: 0,
            total_chunks: 0,
            start_offset: range.start,
            end_offset: range.end,
        });
    }

    let total = pieces.len();
    for (i, piece) in pieces.iter_mut().enumerate() {
        piece.chunk_index = i;
        piece.total_chunks = total;
    }
    pieces
}

/// Break `[start, end)` into fragments no larger than `max_chars`, each a
/// byte range of the original content. Separators stay attached to the
/// preceding fragment so offsets remain contiguous.
fn collect_fragments(
    content: &str,
    start: usize,
    end: usize,
    sep_idx: usize,
    profile: &ChunkProfile,
    out: &mut Vec<Range<usize>>,
) {
    if end - start <= profile.max_chars {
        if !content[start..end].trim().is_empty() {
            out.push(start..end);
        }
        return;
    }
    if sep_idx >= SEPARATORS.len() {
        // Nothing left to split on (e.g. one giant unbroken token run):
        // hard-split at step boundaries; the merge pass restores overlap.
        let step = profile.max_chars.saturating_sub(profile.overlap).max(1);
        let mut s = start;
        while s < end {
            let mut e = (s + step).min(end);
            while e < end && !content.is_char_boundary(e) {
                e += 1;
            }
            out.push(s..e);
            s = e;
        }
        return;
    }

    let sep = SEPARATORS[sep_idx];
    let mut parts: Vec<Range<usize>> = Vec::new();
    let mut piece_start = start;
    let mut cursor = start;
    while let Some(pos) = content[cursor..end].find(sep) {
        let boundary = cursor + pos + sep.len();
        parts.push(piece_start..boundary);
        piece_start = boundary;
        cursor = boundary;
    }
    parts.push(piece_start..end);

    if parts.len() == 1 {
        collect_fragments(content, start, end, sep_idx + 1, profile, out);
        return;
    }
    for part in parts {
        if part.end > part.start {
            collect_fragments(content, part.start, part.end, sep_idx + 1, profile, out);
        }
    }
}

/// Merge ordered fragments forward into chunk ranges of at most
/// `max_chars` (a chunk always takes at least one fragment, so a rewound
/// start may exceed the bound by up to `overlap`). Each flush rewinds the
/// next chunk start by `overlap` bytes.
fn merge_fragments(
    content: &str,
    fragments: &[Range<usize>],
    profile: &ChunkProfile,
) -> Vec<Range<usize>> {
    let mut chunks = Vec::new();
    let first = &fragments[0];
    let mut chunk_start = first.start;
    let mut last_end = first.end;
    let mut included = 1usize;

    for fragment in &fragments[1..] {
        if fragment.end - chunk_start > profile.max_chars && included > 0 {
            chunks.push(chunk_start..last_end);
            let mut s = last_end
                .saturating_sub(profile.overlap)
                .max(chunk_start + 1);
            while s < last_end && !content.is_char_boundary(s) {
                s += 1;
            }
            chunk_start = s;
            included = 0;
        }
        last_end = fragment.end;
        included += 1;
    }
    chunks.push(chunk_start..last_end);
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_document_is_one_chunk() {
        let text = "Administer high-flow oxygen and obtain a 12-lead ECG within ten minutes.";
        let pieces = chunk(text, &ChunkProfile::dense());
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0].start_offset, 0);
        assert_eq!(pieces[0].end_offset, text.len());
        assert_eq!(pieces[0].total_chunks, 1);
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk("", &ChunkProfile::dense()).is_empty());
        assert!(chunk("   \n\n \t ", &ChunkProfile::dense()).is_empty());
    }
}
