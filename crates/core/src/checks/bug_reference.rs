//! # Bug Reference Extraction
//!
//! This module finds the bug a piece of text refers to.
//!
//! A reference is the word `bug` in any case, a single space, the bug number and
//! a colon directly after the number, for example `Bug 1234: fix the frobnicator`.
//! The reference may appear anywhere in the text. When the text holds more than
//! one reference the leftmost one wins, so reverting a bug fix with a title like
//! `Bug 34: Revert: "Bug 12: fix"` links to bug 34.

use crate::config::BUG_REFERENCE_REGEX;

#[cfg(test)]
#[path = "bug_reference_tests.rs"]
mod tests;

/// Extracts the ID of the bug referenced by `text`.
///
/// # Returns
///
/// `Some(id)` for the leftmost reference, `None` when the text holds no
/// reference or the number does not fit in a `u64`.
///
/// # Examples
///
/// ```
/// use bug_warden_core::checks::bug_reference::extract_bug_id;
///
/// assert_eq!(extract_bug_id("Bug 123: fixed it!"), Some(123));
/// assert_eq!(extract_bug_id("[release-4.4] BUG 7: backport"), Some(7));
/// assert_eq!(extract_bug_id("Bug 123 : fixed it!"), None);
/// assert_eq!(extract_bug_id("no reference here"), None);
/// ```
pub fn extract_bug_id(text: &str) -> Option<u64> {
    let captures = BUG_REFERENCE_REGEX.captures(text)?;
    captures.get(1)?.as_str().parse::<u64>().ok()
}

/// Replaces the leftmost bug reference in `title` with a reference to `bug_id`.
///
/// A title without a reference gets one prepended.
///
/// # Examples
///
/// ```
/// use bug_warden_core::checks::bug_reference::replace_bug_reference;
///
/// assert_eq!(replace_bug_reference("[v1] Bug 123: fixed it!", 124), "[v1] Bug 124: fixed it!");
/// assert_eq!(replace_bug_reference("fixed it!", 124), "Bug 124: fixed it!");
/// ```
pub fn replace_bug_reference(title: &str, bug_id: u64) -> String {
    let replacement = format!("Bug {}:", bug_id);
    if BUG_REFERENCE_REGEX.is_match(title) {
        BUG_REFERENCE_REGEX
            .replace(title, regex::NoExpand(&replacement))
            .into_owned()
    } else {
        format!("{} {}", replacement, title)
    }
}
