// tests/topics_classify.rs
use news_courier::relevance::classify;

#[test]
fn exclusion_vetoes_before_keywords() {
    let out = classify("school of thought on education", &["school"], &["school of thought"]);
    assert!(!out.matches);
    assert_eq!(out.score, 0);
    assert_eq!(out.excluded_by.as_deref(), Some("school of thought"));

    let out = classify("the school reopened", &["school"], &["school of thought"]);
    assert!(out.matches);
    assert_eq!(out.score, 1);
}

#[test]
fn score_counts_distinct_keywords_once() {
    let out = classify(
        "Exam results: exam dates and EXAM halls for university students",
        &["exam", "university", "hostel"],
        &[] as &[&str],
    );
    assert_eq!(out.score, 2);
    assert_eq!(out.matched, vec!["exam".to_string(), "university".to_string()]);
}

#[test]
fn whole_words_only() {
    let kws = ["exam"];
    let none: &[&str] = &[];
    assert!(!classify("examination hall", &kws, none).matches);
    assert!(classify("re-exam", &kws, none).matches);
    assert!(classify("(exam) tomorrow", &kws, none).matches);
    assert!(classify("exam", &kws, none).matches);
}

#[test]
fn non_latin_keywords() {
    let none: &[&str] = &[];
    assert!(classify("बोर्ड परीक्षा का परिणाम घोषित", &["परीक्षा"], none).matches);
    assert!(classify("ધોરણ 10 ની પરીક્ષા", &["પરીક્ષા"], none).matches);
}
