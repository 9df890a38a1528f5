use super::*;
use proptest::prelude::*;

#[test]
fn test_valid_bug_references() {
    let valid_titles = vec![
        ("Bug 12: fixed it", 12),
        ("bug 12: fixed it", 12),
        ("BUG 12: fixed it", 12),
        ("[release-4.1] Bug 12: fixed it", 12),
        ("Revert: Bug 12: fixed it", 12),
        ("Bug 0: zero", 0),
        ("prefixBug 12: no word boundary needed", 12),
    ];

    for (title, expected) in valid_titles {
        assert_eq!(
            extract_bug_id(title),
            Some(expected),
            "Title '{}' should reference bug {}",
            title,
            expected
        );
    }
}

#[test]
fn test_invalid_bug_references() {
    let invalid_titles = vec![
        "",
        "fixed it",
        "Bug 12 : space before colon",
        "Bug  12: two spaces",
        "Bug12: no space",
        "Bug 12 fixed it",
        "Bug #12: hash",
        "Bug 99999999999999999999999: too large",
    ];

    for title in invalid_titles {
        assert_eq!(
            extract_bug_id(title),
            None,
            "Title '{}' should not reference a bug",
            title
        );
    }
}

#[test]
fn test_leftmost_reference_wins() {
    assert_eq!(extract_bug_id(r#"Bug 34: Revert: "Bug 12: fix""#), Some(34));
    assert_eq!(extract_bug_id("Bug 12 : x Bug 34: y"), Some(34));
}

#[test]
fn test_replace_bug_reference() {
    assert_eq!(
        replace_bug_reference("[v1] Bug 123: fixed it!", 124),
        "[v1] Bug 124: fixed it!"
    );
    assert_eq!(
        replace_bug_reference("bug 1: a bug 2: b", 3),
        "Bug 3: a bug 2: b"
    );
    assert_eq!(replace_bug_reference("fixed it!", 124), "Bug 124: fixed it!");
}

proptest! {
    #[test]
    fn test_any_number_is_extracted(id in 0u64..u64::MAX, prefix in "[a-z\\[\\] -]{0,10}", suffix in "[a-zA-Z ]{0,20}") {
        let title = format!("{}Bug {}:{}", prefix, id, suffix);
        prop_assert_eq!(extract_bug_id(&title), Some(id));
    }

    #[test]
    fn test_text_without_digits_never_matches(text in "[^0-9]*") {
        prop_assert_eq!(extract_bug_id(&text), None);
    }
}
