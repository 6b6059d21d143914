//! Reading time estimate

use lazy_static::lazy_static;
use regex::Regex;

use super::ContentSection;
use crate::richtext::as_text;

/// Assumed average reading speed
pub const WORDS_PER_MINUTE: usize = 200;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Plain text of every section body, sections separated by a space
pub fn plain_text(sections: &[ContentSection]) -> String {
    sections
        .iter()
        .map(|section| as_text(&section.body))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Count words: whitespace runs collapse to one space, empty tokens are dropped
pub fn count_words(text: &str) -> usize {
    WHITESPACE
        .replace_all(text, " ")
        .split(' ')
        .filter(|word| !word.is_empty())
        .count()
}

/// Minutes needed to read the sections at 200 words per minute, rounded up.
/// Empty content reads in 0 minutes.
pub fn estimate_reading_minutes(sections: &[ContentSection]) -> usize {
    estimate_reading_minutes_at(sections, WORDS_PER_MINUTE)
}

/// Same as [`estimate_reading_minutes`] with a custom reading speed
pub fn estimate_reading_minutes_at(sections: &[ContentSection], words_per_minute: usize) -> usize {
    count_words(&plain_text(sections)).div_ceil(words_per_minute.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::RichTextBlock;

    fn words(n: usize) -> String {
        vec!["lorem"; n].join(" ")
    }

    fn section(heading: &str, paragraphs: Vec<String>) -> ContentSection {
        ContentSection::new(
            heading,
            paragraphs.into_iter().map(RichTextBlock::paragraph).collect(),
        )
    }

    #[test]
    fn test_empty_content_is_zero_minutes() {
        assert_eq!(estimate_reading_minutes(&[]), 0);
        assert_eq!(estimate_reading_minutes(&[section("A", vec![])]), 0);
        assert_eq!(estimate_reading_minutes(&[section("A", vec!["   \n\t ".to_string()])]), 0);
    }

    #[test]
    fn test_rounds_up() {
        assert_eq!(estimate_reading_minutes(&[section("A", vec![words(1)])]), 1);
        assert_eq!(estimate_reading_minutes(&[section("A", vec![words(200)])]), 1);
        assert_eq!(estimate_reading_minutes(&[section("A", vec![words(201)])]), 2);
        assert_eq!(estimate_reading_minutes(&[section("A", vec![words(400)])]), 2);
    }

    #[test]
    fn test_three_words() {
        let sections = vec![section("A", vec!["one two three".to_string()])];
        assert_eq!(estimate_reading_minutes(&sections), 1);
    }

    #[test]
    fn test_distribution_does_not_matter() {
        let one_block = vec![section("A", vec![words(201)])];
        let many_blocks = vec![
            section("A", vec![words(50), words(50)]),
            section("B", vec![words(100)]),
            section("C", vec![words(1)]),
        ];
        assert_eq!(
            count_words(&plain_text(&one_block)),
            count_words(&plain_text(&many_blocks))
        );
        assert_eq!(estimate_reading_minutes(&many_blocks), 2);
    }

    #[test]
    fn test_whitespace_is_normalized() {
        assert_eq!(count_words("  one\n\ntwo\t three  "), 3);
        assert_eq!(count_words(""), 0);
    }

    #[test]
    fn test_custom_speed() {
        let sections = vec![section("A", vec![words(300)])];
        assert_eq!(estimate_reading_minutes_at(&sections, 100), 3);
        assert_eq!(estimate_reading_minutes_at(&sections, 0), 300);
    }
}
