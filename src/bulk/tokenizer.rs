//! Line tokenizer for uploaded business sheets.
//!
//! Commas and tabs both split fields outside quotes. A `"` toggles quoted
//! mode and `""` inside quoted mode is a literal quote. Tokens are trimmed.

/// Splits one line into trimmed field values.
pub fn tokenize_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' | '\t' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    fields.push(current.trim().to_string());
    fields
}

/// Yields `(display_line_number, line)` for every non-blank line.
///
/// Line numbers are 1-based and count blank lines, so they match what an
/// editor shows for the uploaded file.
pub fn numbered_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| (index + 1, line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_comma_line() {
        assert_eq!(tokenize_line("a,b,c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_tab_and_comma_both_split() {
        assert_eq!(tokenize_line("a\tb,c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_quoted_delimiter_stays_in_one_field() {
        assert_eq!(
            tokenize_line(r#"Joe's AC,"Miami, FL",33139"#),
            vec!["Joe's AC", "Miami, FL", "33139"]
        );
    }

    #[test]
    fn test_doubled_quote_is_literal() {
        assert_eq!(
            tokenize_line(r#""The ""Cool"" Guys",x"#),
            vec![r#"The "Cool" Guys"#, "x"]
        );
    }

    #[test]
    fn test_empty_fields_and_trailing_delimiter() {
        assert_eq!(tokenize_line("a,,b,"), vec!["a", "", "b", ""]);
    }

    #[test]
    fn test_fields_are_trimmed() {
        assert_eq!(tokenize_line("  a ,\" b \" "), vec!["a", "b"]);
    }

    #[test]
    fn test_numbered_lines_skip_blanks_and_strip_cr() {
        let lines: Vec<_> = numbered_lines("h1,h2\r\n\r\nx,y\r\n").collect();
        assert_eq!(lines, vec![(1, "h1,h2"), (3, "x,y")]);
    }
}
