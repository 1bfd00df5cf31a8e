use lazy_static::lazy_static;
use regex::Regex;

/// Longest piece of text handed to the synthesizer in one call
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 125;

lazy_static! {
    static ref SENTENCE_END: Regex = Regex::new(r"[.!?]+").unwrap();
}

/// Split text into pieces of at most `max_chunk_size` characters.
///
/// Cuts prefer the end of the last sentence in the window, then the last
/// space, and fall back to a hard cut at the window edge. Whitespace between
/// chunks is dropped. Lengths are counted in chars, not bytes.
pub fn split_into_chunks(text: &str, max_chunk_size: usize) -> Vec<String> {
    let max = max_chunk_size.max(1);
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    if len <= max {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut pos = 0;

    while pos < len {
        if pos + max >= len {
            chunks.push(chars[pos..].iter().collect());
            break;
        }

        let window = &chars[pos..pos + max];

        if let Some(end) = last_sentence_end(window) {
            chunks.push(window[..end].iter().collect());
            pos += end;
        } else if let Some(space) = last_space(window) {
            chunks.push(window[..space].iter().collect());
            pos += space + 1;
        } else {
            chunks.push(window.iter().collect());
            pos += max;
        }

        while pos < len && chars[pos].is_whitespace() {
            pos += 1;
        }
    }

    chunks
}

/// Char offset just past the last run of `.`, `!` or `?` in the window
fn last_sentence_end(window: &[char]) -> Option<usize> {
    let text: String = window.iter().collect();
    SENTENCE_END
        .find_iter(&text)
        .last()
        .map(|m| text[..m.end()].chars().count())
}

/// Offset of the last space, ignoring one at the very start of the window
fn last_space(window: &[char]) -> Option<usize> {
    window.iter().rposition(|c| *c == ' ').filter(|&i| i > 0)
}
