/// Verses are separated by a blank line.
pub const VERSE_DELIMITER: &str = "\n\n";

/// Splits `\n`-terminated lyrics into verses. Every fragment counts, so runs
/// of blank lines produce empty or newline-led verses and empty lyrics are a
/// single empty verse.
pub fn split_verses(text: &str) -> Vec<&str> {
    text.split(VERSE_DELIMITER).collect()
}

/// Returns verses `[page - 1, page - 1 + page_size)`, clamped to the number
/// of verses. A window starting past the end is empty.
///
/// The window starts at verse `page - 1`, so consecutive pages overlap when
/// `page_size > 1`. Callers reject `page == 0` and `page_size == 0`; here
/// they yield an empty window.
pub fn segment(text: &str, page: usize, page_size: usize) -> Vec<String> {
    if page == 0 || page_size == 0 {
        return Vec::new();
    }

    let normalized = text.replace("\r\n", "\n");
    let verses = split_verses(&normalized);

    let start = page - 1;
    if start >= verses.len() {
        return Vec::new();
    }
    let end = start.saturating_add(page_size).min(verses.len());

    verses[start..end]
        .iter()
        .map(|verse| verse.to_string())
        .collect()
}
