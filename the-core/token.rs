//! Lexical tokens of the s-expression reader.
//!
//! Tokens are read-only views over the buffer: a kind plus a half-open span
//! of char offsets. They are never edited, only recomputed by
//! [`crate::lexer::Lexed::new`] after the buffer changes.

/// Bracket families.
///
/// Strings are treated as lists of the [`Bracket::Quote`] family, delimited by
/// an opening and a closing `"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bracket {
  Round,
  Square,
  Curly,
  /// `#{`, closed by `}`.
  Set,
  Quote,
}

impl Bracket {
  pub fn from_close(ch: char) -> Option<Self> {
    match ch {
      ')' => Some(Self::Round),
      ']' => Some(Self::Square),
      '}' => Some(Self::Curly),
      _ => None,
    }
  }

  /// The character that closes a list of this family.
  pub const fn close_char(self) -> char {
    match self {
      Self::Round => ')',
      Self::Square => ']',
      Self::Curly | Self::Set => '}',
      Self::Quote => '"',
    }
  }

  /// Whether `close` ends a list opened by `self`.
  #[inline]
  pub fn closes_with(self, close: Bracket) -> bool {
    self.close_char() == close.close_char()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  /// Spaces, commas and line breaks.
  Whitespace,
  /// `;` through the end of the line.
  Comment,
  /// An opening bracket with its prefix characters, e.g. `#(` or `'[`.
  Open(Bracket),
  Close(Bracket),
  /// Symbols, keywords, numbers and character literals.
  Atom,
  /// `#inst`, `#_`, `^:private` and friends. Binds to the next form.
  ReaderTag,
  /// A word inside a string.
  Text,
  /// `\x` inside a string.
  Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
  pub kind:  TokenKind,
  pub start: usize,
  pub end:   usize,
}

impl Token {
  #[inline]
  pub const fn new(kind: TokenKind, start: usize, end: usize) -> Self {
    Self { kind, start, end }
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.end - self.start
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.start == self.end
  }

  #[inline]
  pub fn contains(&self, pos: usize) -> bool {
    self.start <= pos && pos < self.end
  }

  #[inline]
  pub fn is_open(&self) -> bool {
    matches!(self.kind, TokenKind::Open(_))
  }

  #[inline]
  pub fn is_close(&self) -> bool {
    matches!(self.kind, TokenKind::Close(_))
  }

  /// Whitespace or comment, skipped when moving between forms.
  #[inline]
  pub fn is_blank(&self) -> bool {
    matches!(self.kind, TokenKind::Whitespace | TokenKind::Comment)
  }

  #[inline]
  pub fn is_reader_tag(&self) -> bool {
    self.kind == TokenKind::ReaderTag
  }

  pub fn bracket(&self) -> Option<Bracket> {
    match self.kind {
      TokenKind::Open(bracket) | TokenKind::Close(bracket) => Some(bracket),
      _ => None,
    }
  }

  /// Opening token of a string.
  #[inline]
  pub fn is_string_open(&self) -> bool {
    self.kind == TokenKind::Open(Bracket::Quote)
  }
}
