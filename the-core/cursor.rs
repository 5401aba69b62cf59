//! The token cursor capability.
//!
//! Structural editing only needs a small set of primitives from whatever
//! keeps the token structure of a buffer: stepping over tokens, jumping to a
//! matching bracket or to the enclosing list, and a handful of position
//! predicates. [`TokenCursor`] captures that set; [`LexCursor`] implements it
//! on top of a fully re-lexed [`Lexed`] mirror.
//!
//! A cursor sits *at* a token: its position is the start offset of that
//! token, or the end of the buffer once it has stepped past the last one.

use std::borrow::Cow;

use ropey::RopeSlice;

use crate::{
  lexer::Lexed,
  token::Token,
};

pub trait TokenCursor: Clone {
  /// Start offset of the current token, or the buffer length at the end.
  fn offset_start(&self) -> usize;

  /// End offset of the current token, or the buffer length at the end.
  fn offset_end(&self) -> usize;

  fn token(&self) -> Option<Token>;

  fn prev_token(&self) -> Option<Token>;

  /// Steps to the next token. Returns `false` at the end of the buffer.
  fn next(&mut self) -> bool;

  /// Steps to the previous token. Returns `false` at the start of the buffer.
  fn previous(&mut self) -> bool;

  /// Repositions the cursor at the token containing `offset`.
  fn set_offset(&mut self, offset: usize);

  /// Jumps to the matching bracket of the current token.
  fn to_partner(&mut self) -> bool;

  /// Jumps to the opening token of the list enclosing the current position.
  fn to_enclosing_open(&mut self) -> bool;

  fn token_text(&self, token: &Token) -> Cow<'_, str>;

  fn within_string(&self, offset: usize) -> bool;

  fn within_comment(&self, offset: usize) -> bool;

  fn within_escape(&self, offset: usize) -> bool;

  fn is_balanced(&self) -> bool;

  fn at_top_level(&self) -> bool {
    !self.clone().to_enclosing_open()
  }

  /// Number of lists around the current position.
  fn depth(&self) -> usize {
    let mut cursor = self.clone();
    let mut depth = 0;
    while cursor.to_enclosing_open() {
      depth += 1;
    }
    depth
  }

  /// Opening and closing tokens of the enclosing list.
  fn enclosing_list(&self) -> Option<(Token, Token)> {
    let mut cursor = self.clone();
    if !cursor.to_enclosing_open() {
      return None;
    }
    let open = cursor.token()?;
    if !cursor.to_partner() {
      return None;
    }
    Some((open, cursor.token()?))
  }
}

#[derive(Debug, Clone)]
pub struct LexCursor<'a> {
  lexed: &'a Lexed,
  text:  RopeSlice<'a>,
  index: usize,
}

impl<'a> LexCursor<'a> {
  pub fn new(lexed: &'a Lexed, text: RopeSlice<'a>, offset: usize) -> Self {
    debug_assert_eq!(lexed.len_chars(), text.len_chars(), "mirror out of sync");
    Self {
      lexed,
      text,
      index: lexed.token_index_at(offset),
    }
  }
}

impl TokenCursor for LexCursor<'_> {
  fn offset_start(&self) -> usize {
    self
      .lexed
      .token(self.index)
      .map_or(self.lexed.len_chars(), |token| token.start)
  }

  fn offset_end(&self) -> usize {
    self
      .lexed
      .token(self.index)
      .map_or(self.lexed.len_chars(), |token| token.end)
  }

  fn token(&self) -> Option<Token> {
    self.lexed.token(self.index).copied()
  }

  fn prev_token(&self) -> Option<Token> {
    let index = self.index.checked_sub(1)?;
    self.lexed.token(index).copied()
  }

  fn next(&mut self) -> bool {
    if self.index < self.lexed.tokens().len() {
      self.index += 1;
      true
    } else {
      false
    }
  }

  fn previous(&mut self) -> bool {
    if self.index > 0 {
      self.index -= 1;
      true
    } else {
      false
    }
  }

  fn set_offset(&mut self, offset: usize) {
    self.index = self.lexed.token_index_at(offset);
  }

  fn to_partner(&mut self) -> bool {
    match self.lexed.partner(self.index) {
      Some(index) => {
        self.index = index;
        true
      },
      None => false,
    }
  }

  fn to_enclosing_open(&mut self) -> bool {
    match self.lexed.enclosing(self.index) {
      Some(index) => {
        self.index = index;
        true
      },
      None => false,
    }
  }

  fn token_text(&self, token: &Token) -> Cow<'_, str> {
    self.text.slice(token.start..token.end).into()
  }

  fn within_string(&self, offset: usize) -> bool {
    self.lexed.within_string(offset)
  }

  fn within_comment(&self, offset: usize) -> bool {
    self.lexed.within_comment(offset)
  }

  fn within_escape(&self, offset: usize) -> bool {
    self.lexed.within_escape(offset)
  }

  fn is_balanced(&self) -> bool {
    self.lexed.is_balanced()
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::token::{
    Bracket,
    TokenKind,
  };

  #[test]
  fn steps_over_tokens() {
    let text = "(a b)";
    let lexed = Lexed::new(RopeSlice::from(text));
    let mut cursor = LexCursor::new(&lexed, RopeSlice::from(text), 0);

    assert!(cursor.prev_token().is_none());
    assert_eq!(cursor.token().map(|t| t.kind), Some(TokenKind::Open(Bracket::Round)));
    assert!(cursor.next());
    assert_eq!(cursor.offset_start(), 1);
    assert_eq!(cursor.token_text(&cursor.token().unwrap()), "a");

    cursor.set_offset(5);
    assert!(cursor.token().is_none());
    assert_eq!(cursor.offset_start(), 5);
    assert!(!cursor.next());
    assert!(cursor.previous());
    assert_eq!(cursor.offset_start(), 4);
  }

  #[test]
  fn mid_token_offsets_land_on_the_token() {
    let text = "(def foo)";
    let lexed = Lexed::new(RopeSlice::from(text));
    let cursor = LexCursor::new(&lexed, RopeSlice::from(text), 3);
    assert_eq!(cursor.offset_start(), 1);
    assert_eq!(cursor.offset_end(), 4);
  }

  #[test]
  fn enclosing_list_and_depth() {
    let text = "(a [b] c)";
    let lexed = Lexed::new(RopeSlice::from(text));
    let cursor = LexCursor::new(&lexed, RopeSlice::from(text), 4);
    assert_eq!(cursor.depth(), 2);
    let (open, close) = cursor.enclosing_list().unwrap();
    assert_eq!((open.start, close.start), (3, 5));

    let top = LexCursor::new(&lexed, RopeSlice::from(text), 0);
    assert!(top.at_top_level());
    assert_eq!(top.depth(), 0);

    let mut close = LexCursor::new(&lexed, RopeSlice::from(text), 8);
    assert!(close.to_partner());
    assert_eq!(close.offset_start(), 0);
  }
}
