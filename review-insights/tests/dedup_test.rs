use review_insights::dedup::{find_duplicate_indices, similarity};

const A: &str = "aaaaaaaaaa";
const B: &str = "aaaaaaaabb";
const C: &str = "aaaaaabbbb";

#[test]
fn test_similarity_scores() {
    assert_eq!(similarity("abc", "abc"), 100.0);
    assert_eq!(similarity("Great Food", "great food"), 100.0);
    assert!((similarity("abc", "abd") - 66.666).abs() < 0.01);
    assert!((similarity(A, B) - 80.0).abs() < 1e-9);
    assert!((similarity(A, C) - 60.0).abs() < 1e-9);
    assert_eq!(similarity("", ""), 100.0);
}

#[test]
fn test_exact_duplicates_at_full_threshold() {
    assert_eq!(find_duplicate_indices(&["abc", "abc", "abd"], 100), vec![1]);
}

#[test]
fn test_threshold_boundary_is_inclusive() {
    // Exactly 80% similar
    assert_eq!(find_duplicate_indices(&[A, B], 80), vec![1]);
    assert!(find_duplicate_indices(&[A, B], 81).is_empty());
}

#[test]
fn test_chain_survivor_depends_on_order() {
    assert_eq!(find_duplicate_indices(&[A, B, C], 80), vec![1]);
    assert_eq!(find_duplicate_indices(&[B, A, C], 80), vec![1, 2]);
    assert_eq!(find_duplicate_indices(&[C, B, A], 80), vec![1]);
}

#[test]
fn test_comparison_ignores_case() {
    let texts = vec!["The FOOD was great".to_string(), "the food was great".to_string()];
    assert_eq!(find_duplicate_indices(texts.as_slice(), 100), vec![1]);
}

#[test]
fn test_degenerate_inputs() {
    let empty: Vec<&str> = Vec::new();
    assert!(find_duplicate_indices(empty.as_slice(), 85).is_empty());
    assert!(find_duplicate_indices(&["only one"], 85).is_empty());
    assert_eq!(find_duplicate_indices(&["", ""], 85), vec![1]);

    // Everything matches at zero, so only the first text survives
    assert_eq!(find_duplicate_indices(&["cat", "dog", "completely different"], 0), vec![1, 2]);
}

#[test]
fn test_distinct_reviews_are_kept() {
    let texts = [
        "The pasta was delicious and the staff friendly",
        "Terrible service, we waited an hour",
        "Nice ambiance but overpriced wine",
    ];
    assert!(find_duplicate_indices(&texts, 85).is_empty());
}
