use logos::Logos;

/// Word lexer for a single line of printer G-code
///
/// A line is a sequence of words: an address letter followed immediately by a
/// signed decimal value ("G1", "X10.5", "E-0.8"). Slicers pack them tight
/// ("G1X10Y10E2.5") or space them out; both lex the same.

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\f\r]+")] // Skip whitespace
#[logos(error = LexerError)]
pub enum Token {
    // Address letter plus value, normalized to uppercase
    #[regex(r"[A-Za-z][-+]?([0-9]+\.?[0-9]*|\.[0-9]+)", |lex| word(lex.slice()))]
    Word((char, f64)),

    // Comments
    #[regex(r";[^\n]*", logos::skip)]
    #[regex(r"\([^)\n]*\)?", logos::skip)]
    Comment,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LexerError;

impl std::fmt::Display for LexerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "lexer error")
    }
}

impl std::error::Error for LexerError {}

fn word(slice: &str) -> Option<(char, f64)> {
    let mut chars = slice.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let value = chars.as_str().parse::<f64>().ok()?;
    Some((letter, value))
}

/// Lex one line into its words, dropping comments and malformed fragments
pub fn words(line: &str) -> Vec<(char, f64)> {
    Token::lexer(line)
        .filter_map(|result| match result {
            Ok(Token::Word(w)) => Some(w),
            _ => None, // Skip errors; a bad field never aborts the run
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_words() {
        let input = "G1 X10 Y20 E2.5 F1800";
        assert_eq!(
            words(input),
            vec![('G', 1.0), ('X', 10.0), ('Y', 20.0), ('E', 2.5), ('F', 1800.0)]
        );
    }

    #[test]
    fn test_packed_words_and_signs() {
        let input = "G1X10.5Y-3E-0.8";
        assert_eq!(
            words(input),
            vec![('G', 1.0), ('X', 10.5), ('Y', -3.0), ('E', -0.8)]
        );
    }

    #[test]
    fn test_lowercase_addresses_normalize() {
        assert_eq!(words("g92 e0"), vec![('G', 92.0), ('E', 0.0)]);
    }

    #[test]
    fn test_comments_are_dropped() {
        assert_eq!(
            words("G1 X5 E1.0 ; perimeter"),
            vec![('G', 1.0), ('X', 5.0), ('E', 1.0)]
        );
        assert_eq!(
            words("G1 (inline note) X5 E1.0"),
            vec![('G', 1.0), ('X', 5.0), ('E', 1.0)]
        );
        assert_eq!(words("; just a comment"), vec![]);
    }

    #[test]
    fn test_malformed_fields_are_skipped() {
        // "E??" never becomes a word; the rest of the line still lexes
        assert_eq!(words("G1 X5 E?? Y2"), vec![('G', 1.0), ('X', 5.0), ('Y', 2.0)]);
        // A bare letter with no number is not a word
        assert_eq!(words("G1 E X5"), vec![('G', 1.0), ('X', 5.0)]);
    }

    #[test]
    fn test_blank_line() {
        assert_eq!(words(""), vec![]);
        assert_eq!(words("   \t"), vec![]);
    }
}
