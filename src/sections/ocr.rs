use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::{ExtractionConfig, OcrMode};
use crate::extract::OcrEngine;
use crate::model::Degradation;
use crate::util::non_whitespace_char_count;

/// Replaces sparse pages with OCR output when that output is longer.
/// Returns the 1-based numbers of the replaced pages.
pub(super) fn apply_ocr_fallback(
    pages: &mut [String],
    source: &Path,
    config: &ExtractionConfig,
    ocr: Option<&dyn OcrEngine>,
    degradations: &mut Vec<Degradation>,
) -> Vec<usize> {
    let candidates = pages
        .iter()
        .enumerate()
        .filter(|(_, page)| match config.ocr_mode {
            OcrMode::Off => false,
            OcrMode::Force => true,
            OcrMode::Auto => non_whitespace_char_count(page) < config.ocr_min_text_chars,
        })
        .map(|(index, _)| index)
        .collect::<Vec<usize>>();

    if candidates.is_empty() {
        return Vec::new();
    }

    let Some(engine) = ocr else {
        debug!(pages = candidates.len(), "no ocr engine for this source");
        return Vec::new();
    };

    if !engine.available() {
        warn!(
            pages = candidates.len(),
            ocr_mode = config.ocr_mode.as_str(),
            "ocr requested for sparse pages but no ocr engine is available"
        );
        degradations.extend(candidates.iter().map(|index| Degradation::OcrFailure {
            page: index + 1,
            reason: "ocr engine unavailable".to_string(),
        }));
        return Vec::new();
    }

    let mut replaced = Vec::<usize>::new();
    for index in candidates {
        let page_number = index + 1;
        match engine.ocr_page(source, page_number) {
            Ok(recognized) => {
                let original_chars = non_whitespace_char_count(&pages[index]);
                let recognized_chars = non_whitespace_char_count(&recognized);
                if recognized_chars > original_chars {
                    pages[index] = recognized;
                    replaced.push(page_number);
                } else {
                    debug!(page = page_number, original_chars, recognized_chars, "kept extracted text over ocr");
                }
            }
            Err(error) => {
                warn!(page = page_number, error = %error, "ocr failed; keeping extracted text");
                degradations.push(Degradation::OcrFailure {
                    page: page_number,
                    reason: format!("{error:#}"),
                });
            }
        }
    }

    info!(
        ocr_mode = config.ocr_mode.as_str(),
        replaced_pages = replaced.len(),
        "ocr fallback finished"
    );
    replaced
}
