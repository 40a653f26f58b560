use super::*;
use crate::model::TocSource;

#[test]
fn split_form_feed_pages_keeps_interior_empty_pages() {
    let pages = split_form_feed_pages("one\u{000C}\u{000C}three\u{000C}\n");
    assert_eq!(pages, vec!["one", "", "three"]);
}

#[test]
fn split_form_feed_pages_keeps_single_empty_page() {
    assert_eq!(split_form_feed_pages(""), vec![String::new()]);
}

#[test]
fn normalize_pages_removes_running_header_and_page_counter() {
    let mut pages = (1..=4)
        .map(|page| {
            format!("Acme Sustainability Report 2024\nBody text for page {page}.\nPage {page} of 4")
        })
        .collect::<Vec<String>>();

    let stats = normalize_pages(&mut pages);

    assert_eq!(stats.header_lines_removed, 4);
    assert_eq!(stats.noise_lines_removed, 4);
    assert_eq!(pages[0], "Body text for page 1.");
    assert_eq!(pages.len(), 4);
}

#[test]
fn normalize_pages_matches_running_footer_ignoring_case_and_spacing() {
    let mut pages = vec![
        "Our approach to climate.\nACME Corp  |  Confidential".to_string(),
        "Scope 1 emissions fell.\n\nacme corp | confidential\n".to_string(),
        "Water use is flat.\nACME CORP | CONFIDENTIAL".to_string(),
    ];

    let stats = normalize_pages(&mut pages);

    assert_eq!(stats.footer_lines_removed, 3);
    assert_eq!(stats.header_lines_removed, 0);
    assert_eq!(pages[1].trim_end(), "Scope 1 emissions fell.");
    assert_eq!(pages[2], "Water use is flat.");
}

#[test]
fn normalize_pages_keeps_edge_lines_seen_on_too_few_pages() {
    let mut pages = vec![
        "Annual Report\nFirst page body.".to_string(),
        "Annual Report\nSecond page body.".to_string(),
    ];

    let stats = normalize_pages(&mut pages);

    assert_eq!(stats.header_lines_removed, 0);
    assert_eq!(stats.footer_lines_removed, 0);
    assert!(pages[0].starts_with("Annual Report"));
}

#[test]
fn normalize_pages_rejoins_wrapped_words_but_keeps_compounds() {
    let mut pages = vec!["We dis-\nclose our climate-\nrelated risks.".to_string()];

    let stats = normalize_pages(&mut pages);

    assert_eq!(stats.dehyphenation_merges, 1);
    assert!(pages[0].starts_with("We disclose our climate-"));
}

#[test]
fn normalize_pages_keeps_compound_hyphen_on_join() {
    let mut pages = vec!["Task Force on Climate-\nrelated Financial Disclosures".to_string()];

    normalize_pages(&mut pages);

    assert_eq!(pages[0], "Task Force on Climate-related Financial Disclosures");
}

#[test]
fn parse_outline_items_decodes_entities() {
    let xml = r#"<outline><item page="3">About this Report</item>
<item page="12">Governance &amp; Assurance</item><item page="x">Bad</item></outline>"#;

    let entries = parse_outline_items(xml).unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].title, "Governance & Assurance");
    assert_eq!(entries[1].page, Some(12));
    assert_eq!(entries[0].source, TocSource::Bookmark);
}
