use super::*;

fn classify(text: &str) -> DetectionReport {
    FrameworkClassifier::new().unwrap().classify(text)
}

#[test]
fn acronym_inside_a_word_is_not_a_mention() {
    let report = classify("integrity and agriculture");
    assert!(report.get(FrameworkId::Gri).is_none());
    assert!(report.is_empty());
}

#[test]
fn standard_name_counts_as_one_occurrence() {
    let report = classify("the GRI Standards require...");
    let gri = report.get(FrameworkId::Gri).unwrap();

    assert_eq!(gri.total_occurrences, 1);
    assert_eq!(gri.occurrences[0].pattern, "GRI Standards");
    assert_eq!(gri.occurrences[0].kind, PatternKind::Standard);
}

#[test]
fn overlapping_patterns_collapse_to_longest_match() {
    let report = classify("Prepared with reference to the GRI Universal Standards 2021.");
    let gri = report.get(FrameworkId::Gri).unwrap();

    assert_eq!(gri.total_occurrences, 1);
    assert_eq!(gri.occurrences[0].pattern, "GRI Universal Standards");
}

#[test]
fn accordance_statement_is_secondary_with_capped_confidence() {
    let report = classify(
        "We report in accordance with GRI Standards. Our Scope 1 and Scope 2 emissions are disclosed below.",
    );
    let gri = report.get(FrameworkId::Gri).unwrap();

    assert_eq!(gri.total_occurrences, 1);
    assert_eq!(gri.relevant_occurrences, 1);
    assert_eq!(gri.occurrences[0].sentence, "We report in accordance with GRI Standards.");
    assert_eq!(gri.occurrences[0].tiers.primary, vec!["in accordance".to_string()]);
    assert_eq!(gri.evidence.primary, 1);
    assert_eq!(gri.role, FrameworkRole::Secondary);
    assert!((50..=70).contains(&gri.confidence));
    assert_eq!(gri.confidence, 70);
}

#[test]
fn bare_mentions_without_context_stay_low() {
    let report = classify("TCFD was mentioned at the dinner. Later, someone said TCFD again.");
    let tcfd = report.get(FrameworkId::Tcfd).unwrap();

    assert_eq!(tcfd.total_occurrences, 2);
    assert_eq!(tcfd.relevant_occurrences, 0);
    assert_eq!(tcfd.confidence, 4);
    assert_eq!(tcfd.role, FrameworkRole::Reference);
    assert_eq!(tcfd.relevance_ratio, 0.0);
}

#[test]
fn phrase_matches_across_line_breaks() {
    let report = classify("We support the Task Force on Climate-related\nFinancial Disclosures.");
    let tcfd = report.get(FrameworkId::Tcfd).unwrap();

    assert_eq!(tcfd.total_occurrences, 1);
    assert_eq!(tcfd.occurrences[0].kind, PatternKind::Phrase);
}

#[test]
fn role_flips_exactly_at_five_primary_hits() {
    let mut evidence = EvidenceCounts {
        primary: 4,
        secondary: 2,
        compliance: 1,
    };
    assert_eq!(role(evidence), FrameworkRole::Secondary);

    evidence.primary = 5;
    assert_eq!(role(evidence), FrameworkRole::Primary);

    evidence.primary = 4;
    assert_eq!(role(evidence), FrameworkRole::Secondary);

    let reference_only = EvidenceCounts {
        primary: 0,
        secondary: 3,
        compliance: 0,
    };
    assert_eq!(role(reference_only), FrameworkRole::Reference);
}

#[test]
fn repeated_structuring_statements_promote_framework_to_primary() {
    let sentence = "This section is structured around TCFD. ";

    let four = classify(&sentence.repeat(4));
    let tcfd = four.get(FrameworkId::Tcfd).unwrap();
    assert_eq!(tcfd.evidence.primary, 4);
    assert_eq!(tcfd.role, FrameworkRole::Secondary);

    let five = classify(&sentence.repeat(5));
    let tcfd = five.get(FrameworkId::Tcfd).unwrap();
    assert_eq!(tcfd.evidence.primary, 5);
    assert_eq!(tcfd.role, FrameworkRole::Primary);
    assert!(tcfd.confidence <= REPEATED_PRIMARY_CEILING);
}

#[test]
fn confidence_never_exceeds_ceilings() {
    for total in 0..12usize {
        for relevant in 0..=total {
            for primary in 0..8u32 {
                for secondary in 0..5u32 {
                    for compliance in 0..5u32 {
                        let evidence = EvidenceCounts {
                            primary,
                            secondary,
                            compliance,
                        };
                        let score = confidence(total, relevant, evidence);
                        assert!(score <= REPEATED_PRIMARY_CEILING);
                        if relevant == 1 {
                            assert!(score <= SINGLE_PRIMARY_CEILING);
                        }
                        if relevant == 0 {
                            assert!(score <= 10);
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn assessments_sort_by_confidence_then_framework_order() {
    let report = classify(
        "Our emissions are reported under GRI 305 and verified against ISO 14064. We also mention CDP.",
    );

    let order = report
        .assessments
        .iter()
        .map(|assessment| assessment.framework)
        .collect::<Vec<FrameworkId>>();
    assert_eq!(order, vec![FrameworkId::Gri, FrameworkId::Iso, FrameworkId::Cdp]);

    let gri = report.get(FrameworkId::Gri).unwrap();
    assert_eq!(gri.confidence, 70);
    assert_eq!(gri.disclosure_refs, vec!["GRI 305".to_string()]);
    assert_eq!(gri.evidence.compliance, 1);

    let iso = report.get(FrameworkId::Iso).unwrap();
    assert_eq!(iso.disclosure_refs, vec!["ISO 14064".to_string()]);

    assert_eq!(report.get(FrameworkId::Cdp).unwrap().confidence, 2);
    assert_eq!(report.total_occurrences(), 3);
    assert_eq!(report.with_role(FrameworkRole::Secondary).count(), 2);
    assert_eq!(report.with_role(FrameworkRole::Reference).count(), 1);
}

#[test]
fn sentence_is_bounded_by_context_window() {
    let filler = "word ".repeat(100);
    let text = format!("{filler}SASB{filler}");

    let sentence = enclosing_sentence(&text, filler.len(), filler.len() + 4);

    assert!(sentence.contains("SASB"));
    assert!(sentence.chars().count() <= 2 * CONTEXT_CHARS + 4);
}

#[test]
fn dotted_reference_numbers_do_not_end_the_sentence() {
    let text = "Acme Corp. is certified to ISO 14001.2015 standards. Next sentence.";
    let start = text.find("ISO 14001").unwrap();

    let sentence = enclosing_sentence(text, start, start + "ISO 14001".len());

    assert_eq!(sentence, "is certified to ISO 14001.2015 standards.");
}

#[test]
fn framework_parse_accepts_display_names() {
    assert_eq!(FrameworkId::parse(" tcfd "), Some(FrameworkId::Tcfd));
    assert_eq!(FrameworkId::parse("ESG"), None);
    assert_eq!(FrameworkId::Csrd.to_string(), "CSRD");
}
