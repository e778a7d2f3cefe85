use scan_core::{FilterConfig, MatchMode, Relevance, RelevanceClassifier, UNAVAILABLE};

fn classifier() -> RelevanceClassifier {
    RelevanceClassifier::default()
}

#[test]
fn exclusion_wins_over_positive_terms() {
    let classifier = classifier();
    for title in [
        "Senior Data Scientist Intern",
        "Data Engineer Co-op (Summer 2025)",
        "Lead Machine Learning Engineer",
        "Business Analyst, Analytics",
    ] {
        assert_eq!(classifier.classify_title(title), Relevance::Skip, "{title}");
    }
}

#[test]
fn exclusion_reports_the_matching_term() {
    let verdict = classifier().explain_title("Data Scientist Intern");
    assert_eq!(verdict.relevance, Relevance::Skip);
    assert_eq!(verdict.matched.as_deref(), Some("intern"));

    let verdict = classifier().explain_title("Barista");
    assert_eq!(verdict.relevance, Relevance::Skip);
    assert_eq!(verdict.matched, None);
}

#[test]
fn strong_title_is_kept_without_description() {
    let classifier = classifier();
    assert_eq!(
        classifier.classify_title("Data Scientist"),
        Relevance::KeepImmediate
    );
    assert!(classifier.should_save(Relevance::KeepImmediate, UNAVAILABLE));
}

#[test]
fn ambiguous_title_needs_technical_description() {
    let classifier = classifier();
    let relevance = classifier.classify_title("Analyst");
    assert_eq!(relevance, Relevance::CheckDescription);

    assert!(classifier.should_save(relevance, "Daily reporting with SQL and Excel."));
    assert!(!classifier.should_save(relevance, UNAVAILABLE));
    assert!(!classifier.should_save(relevance, "Greets visitors and answers phones."));
    assert!(!classifier.should_save(relevance, ""));
}

#[test]
fn skip_never_saves() {
    assert!(!classifier().should_save(Relevance::Skip, "python sql spark"));
}

#[test]
fn matching_ignores_case() {
    let classifier = RelevanceClassifier::new(FilterConfig {
        exclusion: vec!["INTERN".to_string()],
        strong: vec!["Quant".to_string()],
        ambiguous: Vec::new(),
        technical: Vec::new(),
        match_mode: MatchMode::Substring,
    });
    assert_eq!(classifier.classify_title("quant intern"), Relevance::Skip);
    assert_eq!(
        classifier.classify_title("QUANT Developer"),
        Relevance::KeepImmediate
    );
}

#[test]
fn whole_word_mode_stops_partial_hits() {
    let substring = classifier();
    let whole = RelevanceClassifier::new(FilterConfig {
        match_mode: MatchMode::WholeWord,
        ..FilterConfig::default()
    });
    let title = "Data Analyst - Internal Audit";

    assert_eq!(substring.classify_title(title), Relevance::Skip);
    assert_eq!(whole.classify_title(title), Relevance::KeepImmediate);
}
