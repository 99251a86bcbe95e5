//! Text shaping: cleanup, truncation, chunk splitting, reply formatting.

use regex::Regex;

use crate::languages;

/// Collapse runs of whitespace into single spaces and trim the ends.
/// Keeps translation prompts tidy regardless of how the message was typed.
pub fn clean_text(text: &str) -> String {
    let re = Regex::new(r"\s+").expect("valid regex");
    re.replace_all(text.trim(), " ").to_string()
}

/// Truncate to exactly `max` characters. Returns the (possibly shortened)
/// text and whether anything was cut.
pub fn truncate_chars(text: &str, max: usize) -> (String, bool) {
    if char_len(text) <= max {
        return (text.to_string(), false);
    }
    (text.chars().take(max).collect(), true)
}

/// Split text into chunks of at most `max_len` characters.
///
/// Prefers sentence boundaries, falls back to word boundaries, and only
/// hard-splits words longer than a whole chunk. Used for both outbound chat
/// messages and tweet threads.
pub fn split_chunks(text: &str, max_len: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    if char_len(text) <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in split_sentences(text) {
        if fits(&current, sentence, max_len) {
            push_word(&mut current, sentence);
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        if char_len(sentence) <= max_len {
            current.push_str(sentence);
            continue;
        }

        // Sentence longer than a whole chunk: split by words.
        for word in sentence.split_whitespace() {
            if fits(&current, word, max_len) {
                push_word(&mut current, word);
                continue;
            }
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }

            // Word longer than a whole chunk: hard split.
            let mut rest = word;
            while char_len(rest) > max_len {
                let (head, tail) = split_at_chars(rest, max_len);
                chunks.push(head.to_string());
                rest = tail;
            }
            current.push_str(rest);
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Reply body for a completed translation.
pub fn format_translation_reply(
    translated: &str,
    source_code: Option<&str>,
    target_code: &str,
) -> String {
    let target = languages::display_name(target_code);
    let header = match source_code {
        Some(src) => format!("🌐 {} → {}", languages::display_name(src), target),
        None => format!("🌐 Translation → {target}"),
    };
    format!("{header}\n\n{translated}")
}

/// Header prepended to each piece of a multi-part group post.
pub fn part_header(index: usize, total: usize, chunk: &str) -> String {
    if total <= 1 {
        return chunk.to_string();
    }
    format!("📝 Part {}/{}:\n\n{}", index + 1, total, chunk)
}

fn fits(current: &str, next: &str, max_len: usize) -> bool {
    let sep = usize::from(!current.is_empty());
    char_len(current) + sep + char_len(next) <= max_len
}

fn push_word(current: &mut String, word: &str) {
    if !current.is_empty() {
        current.push(' ');
    }
    current.push_str(word);
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn split_at_chars(s: &str, n: usize) -> (&str, &str) {
    match s.char_indices().nth(n) {
        Some((idx, _)) => s.split_at(idx),
        None => (s, ""),
    }
}

/// Split on sentence terminators (`.`, `!`, `?`, possibly repeated) that are
/// followed by whitespace. The terminators stay attached to their sentence,
/// so things like `3.14` never split.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut iter = text.char_indices().peekable();

    while let Some((i, c)) = iter.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }

        let mut end = i + c.len_utf8();
        while let Some(&(j, c2)) = iter.peek() {
            if matches!(c2, '.' | '!' | '?') {
                end = j + c2.len_utf8();
                iter.next();
            } else {
                break;
            }
        }

        let followed_by_space = matches!(iter.peek(), Some(&(_, c2)) if c2.is_whitespace());
        if !followed_by_space {
            continue;
        }

        out.push(&text[start..end]);
        start = text.len();
        while let Some(&(j, c2)) = iter.peek() {
            if c2.is_whitespace() {
                iter.next();
            } else {
                start = j;
                break;
            }
        }
    }

    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  hello \n\t world  "), "hello world");
    }

    #[test]
    fn truncate_is_exact_and_flagged() {
        let (out, cut) = truncate_chars("abcdef", 4);
        assert_eq!(out, "abcd");
        assert!(cut);

        let (out, cut) = truncate_chars("abc", 4);
        assert_eq!(out, "abc");
        assert!(!cut);
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        let (out, cut) = truncate_chars("ééééé", 3);
        assert_eq!(out, "ééé");
        assert!(cut);
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        assert_eq!(split_chunks("hello world", 100), vec!["hello world"]);
    }

    #[test]
    fn splits_on_sentence_boundaries_first() {
        let text = "First sentence here. Second sentence here. Third one.";
        let chunks = split_chunks(text, 25);
        assert!(chunks.len() >= 2);
        assert!(chunks.iter().all(|c| c.chars().count() <= 25));
        assert_eq!(chunks[0], "First sentence here.");
    }

    #[test]
    fn long_sentences_split_on_words() {
        let text = "one two three four five six seven eight nine ten";
        let chunks = split_chunks(text, 12);
        assert!(chunks.iter().all(|c| c.chars().count() <= 12));
        // No word is ever split in half here.
        for chunk in &chunks {
            for word in chunk.split_whitespace() {
                assert!(text.contains(word));
            }
        }
    }

    #[test]
    fn oversized_words_are_hard_split() {
        let text = "abcdefghijklmnop";
        let chunks = split_chunks(text, 5);
        assert_eq!(chunks, vec!["abcde", "fghij", "klmno", "p"]);
    }

    #[test]
    fn decimal_points_do_not_split_sentences() {
        let sentences = split_sentences("Pi is 3.14 exactly. Next sentence.");
        assert_eq!(
            sentences,
            vec!["Pi is 3.14 exactly.", "Next sentence."]
        );
    }

    #[test]
    fn repeated_terminators_stay_attached() {
        let sentences = split_sentences("Really?! Yes. Ok");
        assert_eq!(sentences, vec!["Really?!", "Yes.", "Ok"]);
    }

    #[test]
    fn reply_shows_detected_source_when_known() {
        let with_src = format_translation_reply("Hola", Some("en"), "es");
        assert!(with_src.starts_with("🌐 English → Spanish"));
        assert!(with_src.ends_with("Hola"));

        let without = format_translation_reply("Hola", None, "es");
        assert!(without.starts_with("🌐 Translation → Spanish"));
    }

    #[test]
    fn part_headers_only_for_multipart() {
        assert_eq!(part_header(0, 1, "body"), "body");
        assert_eq!(part_header(1, 3, "body"), "📝 Part 2/3:\n\nbody");
    }
}
