//! Spacing normalization applied to raw text before segmentation.

/// Characters that receive an inserted trailing space, so that `word—word`
/// is segmented as two words instead of one.
pub const PADDED_DASHES: &[char] = &['—'];

/// Inserts a space after every [padded dash](PADDED_DASHES), then collapses
/// runs of spaces back into single spaces.
///
/// Only U+0020 is collapsed; other whitespace is left as-is (segmentation
/// treats it as a word boundary regardless).
///
/// # Examples
///
/// ```
/// use exegete_words::introduce_spaces;
/// assert_eq!(introduce_spaces("light—and"), "light— and");
/// assert_eq!(introduce_spaces("light— and"), "light— and");
/// ```
pub fn introduce_spaces(text: &str) -> String {
    let mut output = String::with_capacity(text.len() + 8);
    let mut last_was_space = false;
    for c in text.chars() {
        if c == ' ' {
            if !last_was_space {
                output.push(' ');
            }
            last_was_space = true;
            continue;
        }
        output.push(c);
        last_was_space = false;
        if PADDED_DASHES.contains(&c) {
            output.push(' ');
            last_was_space = true;
        }
    }
    output
}
