//! Character classes of the s-expression reader.

/// Characters allowed between the start of an opening token and its
/// bracket, as in `'(`, `#{`, `#?@(` or `^{`.
pub const OPEN_PREFIXES: &[char] = &['\'', '`', '~', '@', '#', '?', '^'];

#[derive(Debug, Eq, PartialEq)]
pub enum CharCategory {
  Whitespace,
  Eol,
  Open,
  Close,
  Quote,
  Comment,
  Escape,
  Symbol,
}

pub fn categorize_char(ch: char) -> CharCategory {
  match ch {
    c if char_is_line_ending(c) => CharCategory::Eol,
    c if char_is_whitespace(c) => CharCategory::Whitespace,
    '(' | '[' | '{' => CharCategory::Open,
    ')' | ']' | '}' => CharCategory::Close,
    '"' => CharCategory::Quote,
    ';' => CharCategory::Comment,
    '\\' => CharCategory::Escape,
    _ => CharCategory::Symbol,
  }
}

#[inline]
pub fn char_is_line_ending(ch: char) -> bool {
  matches!(
    ch,
    '\u{000A}' | '\u{000B}' | '\u{000C}' | '\u{000D}' | '\u{0085}' | '\u{2028}' | '\u{2029}'
  )
}

/// Commas are whitespace to the reader.
#[inline]
pub fn char_is_whitespace(ch: char) -> bool {
  ch == ',' || ch.is_whitespace()
}

/// Characters that end a symbol, keyword, number or tag.
#[inline]
pub fn char_is_delimiter(ch: char) -> bool {
  char_is_whitespace(ch) || matches!(ch, '(' | ')' | '[' | ']' | '{' | '}' | '"' | ';')
}

#[inline]
pub fn char_is_open_prefix(ch: char) -> bool {
  OPEN_PREFIXES.contains(&ch)
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn commas_are_whitespace() {
    assert!(char_is_whitespace(','));
    assert!(char_is_whitespace('\t'));
    assert!(!char_is_whitespace('_'));
    assert_eq!(categorize_char(','), CharCategory::Whitespace);
    assert_eq!(categorize_char('\n'), CharCategory::Eol);
  }

  #[test]
  fn delimiters() {
    for ch in ['(', ')', '[', ']', '{', '}', '"', ';', ' ', ','] {
      assert!(char_is_delimiter(ch), "{ch:?}");
    }
    for ch in ['#', '\'', ':', 'a', '?', '\\', 'å'] {
      assert!(!char_is_delimiter(ch), "{ch:?}");
    }
  }

  #[test]
  fn categories() {
    assert_eq!(categorize_char('['), CharCategory::Open);
    assert_eq!(categorize_char('}'), CharCategory::Close);
    assert_eq!(categorize_char('"'), CharCategory::Quote);
    assert_eq!(categorize_char(';'), CharCategory::Comment);
    assert_eq!(categorize_char('\\'), CharCategory::Escape);
    assert_eq!(categorize_char('ö'), CharCategory::Symbol);
  }
}
