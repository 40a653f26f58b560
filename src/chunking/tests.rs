use super::*;

fn splitter(budget_chars: usize, overlap_chars: usize, lookback_chars: usize) -> ChunkSplitter {
    ChunkSplitter::new(ChunkerConfig {
        token_budget: budget_chars,
        chars_per_token: 1.0,
        overlap_chars,
        max_chunks: 1_000,
        lookback_chars,
    })
}

fn reconstruct(text: &str, chunks: &[Chunk]) -> String {
    let mut rebuilt = String::new();
    let mut covered = 0usize;
    for chunk in chunks {
        let from = covered.max(chunk.start);
        rebuilt.push_str(&text[from..chunk.end]);
        covered = chunk.end;
    }
    rebuilt
}

const SAMPLE: &str = "Alpha beta gamma. Delta epsilon! Zeta eta theta iota? Kappa lambda mu nu xi omicron pi rho sigma tau. Upsilon phi chi psi omega.";

#[test]
fn empty_text_yields_no_chunks() {
    let outcome = splitter(10, 2, 5).split("");
    assert!(outcome.chunks.is_empty());
    assert!(!outcome.truncated);
    assert_eq!(outcome.covered_end(), 0);
}

#[test]
fn short_text_is_one_chunk_without_overlap() {
    let outcome = splitter(500, 50, 100).split(SAMPLE);
    assert_eq!(outcome.chunks.len(), 1);
    let chunk = &outcome.chunks[0];
    assert_eq!(chunk.text, SAMPLE);
    assert_eq!((chunk.start, chunk.end), (0, SAMPLE.len()));
    assert_eq!(chunk.boundary, ChunkBoundary::End);
}

#[test]
fn chunks_cover_text_and_always_advance() {
    let configs = [
        (10, 0, 5),
        (10, 3, 5),
        (10, 5, 10),
        (10, 9, 10),
        (10, 50, 10),
        (1, 5, 5),
        (25, 8, 20),
    ];

    for (budget, overlap, lookback) in configs {
        let outcome = splitter(budget, overlap, lookback).split(SAMPLE);
        let chunks = &outcome.chunks;

        assert!(!outcome.truncated);
        assert_eq!(chunks[0].start, 0);
        assert_eq!(chunks.last().map(|chunk| chunk.end), Some(SAMPLE.len()));
        assert_eq!(reconstruct(SAMPLE, chunks), SAMPLE);

        for pair in chunks.windows(2) {
            assert!(pair[1].start > pair[0].start, "budget {budget} overlap {overlap}");
            assert!(pair[1].start <= pair[0].end, "gap after chunk {}", pair[0].index);
            assert!(pair[1].end > pair[0].end, "chunk {} adds no text", pair[1].index);
            assert_eq!(pair[1].index, pair[0].index + 1);
        }
        for chunk in chunks {
            assert!(chunk.char_len() <= budget);
        }
    }
}

#[test]
fn overlap_never_reuses_the_previous_sentence_end() {
    let text = "aaaaaa. bbbbbbbbbbbbbbbbbbbb";
    let outcome = splitter(10, 5, 10).split(text);
    let chunks = &outcome.chunks;

    assert_eq!(chunks[0].text, "aaaaaa.");
    assert_eq!(chunks[0].boundary, ChunkBoundary::Sentence);
    assert_eq!((chunks[1].start, chunks[1].end), (2, 12));
    assert_eq!(chunks[1].boundary, ChunkBoundary::Hard);
    assert_eq!(reconstruct(text, chunks), text);
}

#[test]
fn cut_snaps_to_sentence_end_within_lookback() {
    let text = "One two. Three four five six.";
    let outcome = splitter(12, 0, 10).split(text);

    assert_eq!(outcome.chunks.len(), 3);
    assert_eq!(outcome.chunks[0].text, "One two.");
    assert_eq!(outcome.chunks[0].boundary, ChunkBoundary::Sentence);
    assert_eq!(outcome.chunks[1].text, " Three four ");
    assert_eq!(outcome.chunks[1].boundary, ChunkBoundary::Hard);
    assert_eq!(outcome.chunks[2].text, "five six.");
    assert_eq!(
        outcome.degradations,
        vec![Degradation::SplitBudgetExceeded {
            chunk_index: 1,
            char_budget: 12
        }]
    );
}

#[test]
fn multibyte_text_splits_on_char_boundaries() {
    let text = "é".repeat(25) + "—done";
    let outcome = splitter(10, 3, 4).split(&text);

    assert_eq!(reconstruct(&text, &outcome.chunks), text);
    assert!(outcome.chunks.iter().all(|chunk| chunk.char_len() <= 10));
    assert!(
        outcome
            .chunks
            .iter()
            .all(|chunk| text.is_char_boundary(chunk.start) && text.is_char_boundary(chunk.end))
    );
}

#[test]
fn char_offsets_track_byte_offsets() {
    let text = "é".repeat(30);
    let outcome = splitter(10, 0, 0).split(&text);

    let spans = outcome
        .chunks
        .iter()
        .map(|chunk| (chunk.start, chunk.end, chunk.char_start, chunk.char_end))
        .collect::<Vec<_>>();
    assert_eq!(spans, vec![(0, 20, 0, 10), (20, 40, 10, 20), (40, 60, 20, 30)]);
}

#[test]
fn chunk_cap_keeps_first_chunks_and_flags_truncation() {
    let splitter = ChunkSplitter::new(ChunkerConfig {
        token_budget: 10,
        chars_per_token: 1.0,
        overlap_chars: 2,
        max_chunks: 2,
        lookback_chars: 5,
    });

    let outcome = splitter.split(SAMPLE);

    assert_eq!(outcome.chunks.len(), 2);
    assert!(outcome.truncated);
    assert_eq!(outcome.covered_end(), outcome.chunks[1].end);
    assert!(outcome.covered_end() < SAMPLE.len());
}

#[test]
fn token_estimate_uses_configured_ratio() {
    let splitter = ChunkSplitter::new(ChunkerConfig {
        token_budget: 100,
        chars_per_token: 4.0,
        overlap_chars: 0,
        max_chunks: 1,
        lookback_chars: 0,
    });

    let outcome = splitter.split("abcdefghi");
    assert_eq!(outcome.chunks[0].approx_tokens, 3);
}
