//! Full re-lex scanner and the bracket structure derived from it.
//!
//! [`Lexed`] is the document mirror consumed by [`crate::cursor::LexCursor`]:
//! the token stream of a whole buffer together with, for every token, its
//! matching bracket and the list that encloses it. It is cheap enough to
//! rebuild after every edit, which keeps it trivially in sync with the text.
//!
//! # Grammar
//!
//! - Whitespace runs include commas.
//! - `;` starts a comment that runs to the end of the line.
//! - Opening tokens carry their prefix characters: `(`, `'(`, `#(`, `#?@(`,
//!   `[`, `{`, `^{`, `#{` (a set), `"` and `#"` (strings).
//! - `#tag`, `#_` and `^meta` are reader tags, bound to the following form.
//! - Inside a string the scanner yields words ([`TokenKind::Text`]),
//!   whitespace and `\x` escapes until the closing quote.
//!
//! Tokens always cover the buffer without gaps, so every char offset belongs
//! to exactly one token.

use ropey::RopeSlice;

use crate::{
  chars::{
    CharCategory,
    categorize_char,
    char_is_delimiter,
    char_is_line_ending,
    char_is_open_prefix,
    char_is_whitespace,
  },
  token::{
    Bracket,
    Token,
    TokenKind,
  },
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lexed {
  tokens:    Vec<Token>,
  /// Matching bracket of each bracket token.
  partners:  Vec<Option<usize>>,
  /// Opening token of the innermost matched list around each token. A closing
  /// bracket is enclosed by its own list.
  enclosing: Vec<Option<usize>>,
  /// Content spans of strings, from after the opening quote up to the
  /// closing quote (or the end of the buffer).
  strings:   Vec<(usize, usize)>,
  len_chars: usize,
  balanced:  bool,
}

impl Lexed {
  pub fn new(text: RopeSlice) -> Self {
    let chars: Vec<char> = text.chars().collect();
    let (tokens, strings) = Scanner::new(&chars).run();
    let partners = match_brackets(&tokens);
    let enclosing = enclosing_lists(&tokens, &partners);
    let balanced = tokens
      .iter()
      .zip(&partners)
      .all(|(token, partner)| token.bracket().is_none() || partner.is_some());

    tracing::trace!(tokens = tokens.len(), balanced, "lexed buffer");

    Self {
      tokens,
      partners,
      enclosing,
      strings,
      len_chars: chars.len(),
      balanced,
    }
  }

  pub fn tokens(&self) -> &[Token] {
    &self.tokens
  }

  pub fn len_chars(&self) -> usize {
    self.len_chars
  }

  /// Every bracket and quote has its partner.
  pub fn is_balanced(&self) -> bool {
    self.balanced
  }

  /// Index of the token containing `pos`, or `tokens().len()` at the end of
  /// the buffer.
  pub fn token_index_at(&self, pos: usize) -> usize {
    self.tokens.partition_point(|token| token.end <= pos)
  }

  pub fn token(&self, index: usize) -> Option<&Token> {
    self.tokens.get(index)
  }

  pub fn partner(&self, index: usize) -> Option<usize> {
    self.partners.get(index).copied().flatten()
  }

  /// Opening token of the list enclosing the position at the start of token
  /// `index`. `index` may be `tokens().len()`.
  pub fn enclosing(&self, index: usize) -> Option<usize> {
    self.enclosing.get(index).copied().flatten()
  }

  pub fn within_string(&self, pos: usize) -> bool {
    let idx = self.strings.partition_point(|&(start, _)| start <= pos);
    idx > 0 && pos <= self.strings[idx - 1].1
  }

  /// `pos` is after the `;` of a comment and no later than its line end.
  pub fn within_comment(&self, pos: usize) -> bool {
    pos > 0
      && self
        .token(self.token_index_at(pos - 1))
        .is_some_and(|token| token.kind == TokenKind::Comment)
  }

  /// `pos` splits a `\x` escape or character literal.
  pub fn within_escape(&self, pos: usize) -> bool {
    self
      .token(self.token_index_at(pos))
      .is_some_and(|token| token.kind == TokenKind::Escape && token.start < pos)
  }
}

struct Scanner<'a> {
  chars:   &'a [char],
  pos:     usize,
  tokens:  Vec<Token>,
  strings: Vec<(usize, usize)>,
}

impl<'a> Scanner<'a> {
  fn new(chars: &'a [char]) -> Self {
    Self {
      chars,
      pos: 0,
      tokens: Vec::new(),
      strings: Vec::new(),
    }
  }

  fn run(mut self) -> (Vec<Token>, Vec<(usize, usize)>) {
    while self.pos < self.chars.len() {
      self.scan_token();
    }
    (self.tokens, self.strings)
  }

  #[inline]
  fn peek(&self, offset: usize) -> Option<char> {
    self.chars.get(self.pos + offset).copied()
  }

  fn push(&mut self, kind: TokenKind, end: usize) {
    debug_assert!(end > self.pos, "tokens are never empty");
    self.tokens.push(Token::new(kind, self.pos, end));
    self.pos = end;
  }

  fn run_while(&self, from: usize, pred: impl Fn(char) -> bool) -> usize {
    let mut end = from;
    while end < self.chars.len() && pred(self.chars[end]) {
      end += 1;
    }
    end
  }

  fn scan_token(&mut self) {
    let ch = self.chars[self.pos];
    match categorize_char(ch) {
      CharCategory::Whitespace | CharCategory::Eol => {
        let end = self.run_while(self.pos, char_is_whitespace);
        self.push(TokenKind::Whitespace, end);
      },
      CharCategory::Comment => {
        let end = self.run_while(self.pos, |c| !char_is_line_ending(c));
        self.push(TokenKind::Comment, end);
      },
      CharCategory::Close => {
        let bracket = Bracket::from_close(ch).unwrap_or(Bracket::Round);
        self.push(TokenKind::Close(bracket), self.pos + 1);
      },
      CharCategory::Quote => self.scan_string(self.pos + 1),
      CharCategory::Escape => self.scan_char_literal(),
      CharCategory::Open | CharCategory::Symbol => self.scan_prefixed(),
    }
  }

  /// Opening brackets with their prefix, or else a symbol.
  fn scan_prefixed(&mut self) {
    let prefix_end = self.run_while(self.pos, char_is_open_prefix);
    let prefixed = prefix_end > self.pos;
    match self.chars.get(prefix_end) {
      Some('(') => self.push(TokenKind::Open(Bracket::Round), prefix_end + 1),
      Some('[') => self.push(TokenKind::Open(Bracket::Square), prefix_end + 1),
      Some('{') => {
        let bracket = if prefixed && self.chars[prefix_end - 1] == '#' {
          Bracket::Set
        } else {
          Bracket::Curly
        };
        self.push(TokenKind::Open(bracket), prefix_end + 1);
      },
      Some('"') if prefixed => self.scan_string(prefix_end + 1),
      _ => self.scan_symbol(),
    }
  }

  fn scan_symbol(&mut self) {
    let ch = self.chars[self.pos];
    let end = self.run_while(self.pos + 1, |c| !char_is_delimiter(c));
    let kind = match (ch, self.peek(1)) {
      ('#', Some('_')) => {
        self.push(TokenKind::ReaderTag, self.pos + 2);
        return;
      },
      // `##Inf` and `#'var` are values, not tags.
      ('#', Some('#' | '\'')) => TokenKind::Atom,
      ('#' | '^', _) if end > self.pos + 1 => TokenKind::ReaderTag,
      _ => TokenKind::Atom,
    };
    self.push(kind, end);
  }

  fn scan_char_literal(&mut self) {
    let mut end = self.pos + 1;
    if let Some(&first) = self.chars.get(end) {
      end += 1;
      if first.is_alphabetic() {
        end = self.run_while(end, char::is_alphanumeric);
      }
    }
    self.push(TokenKind::Escape, end);
  }

  fn scan_string(&mut self, open_end: usize) {
    self.push(TokenKind::Open(Bracket::Quote), open_end);
    let content_start = self.pos;

    loop {
      let Some(ch) = self.peek(0) else {
        self.strings.push((content_start, self.pos));
        return;
      };
      match ch {
        '"' => {
          self.strings.push((content_start, self.pos));
          self.push(TokenKind::Close(Bracket::Quote), self.pos + 1);
          return;
        },
        '\\' => {
          let end = (self.pos + 2).min(self.chars.len());
          self.push(TokenKind::Escape, end);
        },
        c if c.is_whitespace() => {
          let end = self.run_while(self.pos, char::is_whitespace);
          self.push(TokenKind::Whitespace, end);
        },
        _ => {
          let end = self.run_while(self.pos, |c| !(c.is_whitespace() || c == '"' || c == '\\'));
          self.push(TokenKind::Text, end);
        },
      }
    }
  }
}

fn match_brackets(tokens: &[Token]) -> Vec<Option<usize>> {
  let mut partners = vec![None; tokens.len()];
  let mut stack: Vec<usize> = Vec::new();

  for (idx, token) in tokens.iter().enumerate() {
    match token.kind {
      TokenKind::Open(_) => stack.push(idx),
      TokenKind::Close(close) => {
        // A close that does not fit the innermost open list is a stray.
        let Some(&open) = stack.last() else {
          continue;
        };
        if matches!(tokens[open].kind, TokenKind::Open(bracket) if bracket.closes_with(close)) {
          stack.pop();
          partners[open] = Some(idx);
          partners[idx] = Some(open);
        }
      },
      _ => {},
    }
  }

  partners
}

fn enclosing_lists(tokens: &[Token], partners: &[Option<usize>]) -> Vec<Option<usize>> {
  let mut enclosing = Vec::with_capacity(tokens.len());
  let mut stack: Vec<usize> = Vec::new();

  for (idx, token) in tokens.iter().enumerate() {
    match (token.kind, partners[idx]) {
      (TokenKind::Open(_), Some(_)) => {
        enclosing.push(stack.last().copied());
        stack.push(idx);
      },
      (TokenKind::Close(_), Some(_)) => enclosing.push(stack.pop()),
      _ => enclosing.push(stack.last().copied()),
    }
  }

  enclosing
}

#[cfg(test)]
mod test {
  use super::*;

  fn kinds(text: &str) -> Vec<(TokenKind, String)> {
    let chars: Vec<char> = text.chars().collect();
    Lexed::new(RopeSlice::from(text))
      .tokens()
      .iter()
      .map(|t| (t.kind, chars[t.start..t.end].iter().collect()))
      .collect()
  }

  #[test]
  fn lex_prefixed_opens() {
    use Bracket::*;
    use TokenKind::*;

    let tokens = kinds("'(a) #{b} #(c) #?@(d) ^{e 1} @[f]");
    let opens: Vec<_> = tokens
      .iter()
      .filter(|(kind, _)| matches!(kind, Open(_)))
      .cloned()
      .collect();
    assert_eq!(opens, vec![
      (Open(Round), "'(".to_string()),
      (Open(Set), "#{".to_string()),
      (Open(Round), "#(".to_string()),
      (Open(Round), "#?@(".to_string()),
      (Open(Curly), "^{".to_string()),
      (Open(Square), "@[".to_string()),
    ]);
  }

  #[test]
  fn lex_reader_tags() {
    use TokenKind::*;

    assert_eq!(kinds("#f #å#ä#ö"), vec![
      (ReaderTag, "#f".to_string()),
      (Whitespace, " ".to_string()),
      (ReaderTag, "#å#ä#ö".to_string()),
    ]);
    assert_eq!(kinds("#_foo")[0], (ReaderTag, "#_".to_string()));
    assert_eq!(kinds("^:private x")[0], (ReaderTag, "^:private".to_string()));
    assert_eq!(kinds("#'var")[0], (Atom, "#'var".to_string()));
    assert_eq!(kinds("##Inf")[0], (Atom, "##Inf".to_string()));
    assert_eq!(kinds("'sym")[0], (Atom, "'sym".to_string()));
  }

  #[test]
  fn lex_strings_and_escapes() {
    use Bracket::*;
    use TokenKind::*;

    assert_eq!(kinds(r#""a \"b" \( ;c"#), vec![
      (Open(Quote), "\"".to_string()),
      (Text, "a".to_string()),
      (Whitespace, " ".to_string()),
      (Escape, "\\\"".to_string()),
      (Text, "b".to_string()),
      (Close(Quote), "\"".to_string()),
      (Whitespace, " ".to_string()),
      (Escape, "\\(".to_string()),
      (Whitespace, " ".to_string()),
      (Comment, ";c".to_string()),
    ]);
    assert_eq!(kinds(r"\newline")[0], (Escape, r"\newline".to_string()));
    assert_eq!(kinds("#\"re\"")[0], (Open(Quote), "#\"".to_string()));
  }

  #[test]
  fn tokens_cover_a_sample_form() {
    let text = "(defn f [x]\n  ; note\n  {:a #{1 2} :b \"s (\"})";
    let lexed = Lexed::new(RopeSlice::from(text));
    let mut pos = 0;
    for token in lexed.tokens() {
      assert_eq!(token.start, pos);
      pos = token.end;
    }
    assert_eq!(pos, text.chars().count());
    assert!(lexed.is_balanced());
  }

  #[test]
  fn match_and_enclose() {
    let lexed = Lexed::new(RopeSlice::from("(a [b])"));
    // ( a ␠ [ b ] )
    assert_eq!(lexed.partner(0), Some(6));
    assert_eq!(lexed.partner(3), Some(5));
    assert_eq!(lexed.enclosing(0), None);
    assert_eq!(lexed.enclosing(1), Some(0));
    assert_eq!(lexed.enclosing(3), Some(0));
    assert_eq!(lexed.enclosing(4), Some(3));
    assert_eq!(lexed.enclosing(5), Some(3));
    assert_eq!(lexed.enclosing(6), Some(0));
    assert_eq!(lexed.enclosing(7), None);
  }

  #[test]
  fn strays_and_unterminated() {
    let lexed = Lexed::new(RopeSlice::from("(a ]) )"));
    assert!(!lexed.is_balanced());
    assert_eq!(lexed.partner(0), Some(4));
    assert_eq!(lexed.partner(3), None);
    assert_eq!(lexed.partner(6), None);

    let lexed = Lexed::new(RopeSlice::from("(str \"foo"));
    assert!(!lexed.is_balanced());
    assert!(lexed.within_string(9));
    assert_eq!(lexed.partner(0), None);
  }

  #[test]
  fn position_predicates() {
    let text = "(a \"b c\" ;d\n \\x)";
    let lexed = Lexed::new(RopeSlice::from(text));
    assert!(!lexed.within_string(3));
    assert!(lexed.within_string(4));
    assert!(lexed.within_string(7));
    assert!(!lexed.within_string(8));
    assert!(!lexed.within_comment(9));
    assert!(lexed.within_comment(10));
    assert!(lexed.within_comment(11));
    assert!(!lexed.within_comment(12));
    assert!(lexed.within_escape(14));
    assert!(!lexed.within_escape(13));
    assert_eq!(lexed.token_index_at(text.chars().count()), lexed.tokens().len());
  }

  quickcheck::quickcheck! {
    fn tokens_cover_the_buffer(text: String) -> bool {
      let lexed = Lexed::new(RopeSlice::from(text.as_str()));
      let mut end = 0;
      for token in lexed.tokens() {
        if token.start != end || token.end <= token.start {
          return false;
        }
        end = token.end;
      }
      end == text.chars().count()
    }

    fn partners_are_mutual(text: String) -> bool {
      let lexed = Lexed::new(RopeSlice::from(text.as_str()));
      (0..lexed.tokens().len()).all(|idx| match lexed.partner(idx) {
        Some(partner) => lexed.partner(partner) == Some(idx),
        None => true,
      })
    }
  }
}
