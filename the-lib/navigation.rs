//! Sexp navigation.
//!
//! [`SexpCursor`] adds form-level moves on top of any [`TokenCursor`]. A
//! *unit* is an atom, a string or a balanced list, together with the chain of
//! reader tags directly in front of it: `#f #g (a b)` is one unit and so is
//! `^:private foo`. A tag chain with nothing after it is not a unit.
//!
//! The free functions at the bottom answer questions about a [`Document`]
//! in terms of [`Range`]s. None of them can fail: "nothing there" is an empty
//! range at the starting offset.

use the_core::{
  cursor::TokenCursor,
  token::TokenKind,
};

use crate::{
  document::Document,
  selection::Range,
};

pub trait SexpCursor: TokenCursor {
  /// Skips whitespace, and comments when `include_comments` is set.
  fn forward_whitespace(&mut self, include_comments: bool) {
    while let Some(token) = self.token() {
      if !skippable(token.kind, include_comments) {
        break;
      }
      self.next();
    }
  }

  fn backward_whitespace(&mut self, include_comments: bool) {
    while let Some(token) = self.prev_token() {
      if !skippable(token.kind, include_comments) {
        break;
      }
      self.previous();
    }
  }

  /// Steps back over the reader tags bound to the unit starting here.
  fn backward_tags(&mut self) {
    loop {
      let mut probe = self.clone();
      probe.backward_whitespace(true);
      if !probe.prev_token().is_some_and(|token| token.is_reader_tag()) {
        return;
      }
      probe.previous();
      *self = probe;
    }
  }

  /// Moves past the next unit. Stays put at a closing bracket, at an
  /// unmatched opening one, or at the end of the buffer.
  fn forward_sexp(&mut self) -> bool {
    let mut cursor = self.clone();
    cursor.forward_whitespace(true);
    while cursor.token().is_some_and(|token| token.is_reader_tag()) {
      cursor.next();
      cursor.forward_whitespace(true);
    }

    let Some(token) = cursor.token() else {
      return false;
    };
    match token.kind {
      TokenKind::Close(_) => return false,
      TokenKind::Open(_) => {
        if !cursor.to_partner() {
          return false;
        }
        cursor.next();
      },
      _ => {
        cursor.next();
      },
    }

    *self = cursor;
    true
  }

  /// Moves to the start of the previous unit, tags included.
  fn backward_sexp(&mut self) -> bool {
    let mut cursor = self.clone();
    cursor.backward_whitespace(true);

    let Some(token) = cursor.prev_token() else {
      return false;
    };
    match token.kind {
      TokenKind::Open(_) => return false,
      TokenKind::Close(_) => {
        cursor.previous();
        if !cursor.to_partner() {
          return false;
        }
      },
      _ => {
        cursor.previous();
      },
    }
    cursor.backward_tags();

    *self = cursor;
    true
  }

  /// Moves to the closing bracket of the enclosing list.
  fn forward_list(&mut self) -> bool {
    let mut cursor = self.clone();
    if cursor.to_enclosing_open() && cursor.to_partner() {
      *self = cursor;
      true
    } else {
      false
    }
  }

  /// Moves to just after the opening bracket of the enclosing list.
  fn backward_list(&mut self) -> bool {
    let mut cursor = self.clone();
    if cursor.to_enclosing_open() {
      cursor.next();
      *self = cursor;
      true
    } else {
      false
    }
  }

  /// Moves past the closing bracket of the enclosing list.
  fn up_list(&mut self) -> bool {
    if self.forward_list() {
      self.next();
      true
    } else {
      false
    }
  }

  /// Moves to the start of the enclosing list's unit, before its tags.
  fn backward_up_list(&mut self) -> bool {
    if self.to_enclosing_open() {
      self.backward_tags();
      true
    } else {
      false
    }
  }

  /// Enters the next list, skipping any tags in front of it.
  fn down_list(&mut self) -> bool {
    let mut cursor = self.clone();
    cursor.forward_whitespace(true);
    while cursor.token().is_some_and(|token| token.is_reader_tag()) {
      cursor.next();
      cursor.forward_whitespace(true);
    }

    let opens = cursor.token().is_some_and(|token| token.is_open());
    if opens && cursor.clone().to_partner() {
      cursor.next();
      *self = cursor;
      true
    } else {
      false
    }
  }

  /// Direct child units of the enclosing list, or of the top level.
  fn children(&self) -> Vec<Range> {
    let mut cursor = self.clone();
    if !cursor.backward_list() {
      cursor.set_offset(0);
    }

    let mut children = Vec::new();
    loop {
      cursor.forward_whitespace(true);
      let start = cursor.offset_start();
      if !cursor.forward_sexp() {
        break;
      }
      children.push(Range::new(start, cursor.offset_start()));
    }
    children
  }
}

impl<C: TokenCursor> SexpCursor for C {}

#[inline]
fn skippable(kind: TokenKind, include_comments: bool) -> bool {
  kind == TokenKind::Whitespace || (include_comments && kind == TokenKind::Comment)
}

/// Index of the child a caret at `pos` acts on: the one around it, then the
/// one ending or starting at it, then the next one, then the previous one.
pub fn current_child(children: &[Range], pos: usize) -> Option<usize> {
  children
    .iter()
    .position(|child| child.start < pos && pos < child.end)
    .or_else(|| children.iter().position(|child| child.end == pos))
    .or_else(|| children.iter().position(|child| child.start == pos))
    .or_else(|| children.iter().position(|child| child.start > pos))
    .or_else(|| children.iter().rposition(|child| child.end < pos))
}

/// The unit a caret at `pos` acts on.
pub fn current_form(doc: &Document, pos: usize) -> Option<Range> {
  let children = doc.cursor(pos).children();
  current_child(&children, pos).map(|idx| children[idx])
}

/// The next unit after the selection, with the whitespace leading up to it.
pub fn forward_sexp_range(doc: &Document) -> Range {
  let offset = doc.selection().to();
  let mut cursor = doc.cursor(offset);

  let range = if cursor.forward_sexp() && cursor.offset_start() > offset {
    Range::new(offset, cursor.offset_start())
  } else {
    Range::point(offset)
  };
  tracing::trace!(?range, "forward sexp range");
  range
}

/// The previous unit before the selection, with the whitespace trailing it.
///
/// Starts from the lesser end of the selection whatever its direction.
pub fn backward_sexp_range(doc: &Document) -> Range {
  let offset = doc.selection().from();
  let mut cursor = doc.cursor(offset);

  // Mid-token: take the whole unit this token belongs to as the target.
  let splits_unit = cursor.offset_start() < offset
    && cursor.token().is_some_and(|token| !token.is_blank());
  if splits_unit {
    cursor.forward_sexp();
  }

  let range = if cursor.backward_sexp() && cursor.offset_start() < offset {
    Range::new(cursor.offset_start(), offset)
  } else {
    Range::point(offset)
  };
  tracing::trace!(?range, "backward sexp range");
  range
}

/// From the selection to just inside the next list at this level.
pub fn range_to_forward_down_list(doc: &Document) -> Range {
  let offset = doc.selection().to();
  let mut cursor = doc.cursor(offset);

  loop {
    if cursor.down_list() {
      return Range::new(offset, cursor.offset_start());
    }
    if !cursor.forward_sexp() {
      return Range::point(offset);
    }
  }
}

/// From the start of the enclosing list's unit to the selection.
pub fn range_to_backward_up_list(doc: &Document) -> Range {
  let offset = doc.selection().from();
  let mut cursor = doc.cursor(offset);

  if cursor.backward_up_list() {
    Range::new(cursor.offset_start(), offset)
  } else {
    Range::point(offset)
  }
}
