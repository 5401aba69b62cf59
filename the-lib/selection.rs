//! Range and selection geometry.
//!
//! A [`Range`] is an ordered, half-open span of char offsets. It carries no
//! direction and an empty range is a valid "nothing found" answer from
//! navigation.
//!
//! A [`Selection`] is the directional pair the user actually sees: `anchor`
//! is the fixed end and `active` is where the caret sits.
//!
//! ```text
//!  anchor    active        active    anchor
//!    |-------->|             |<--------|
//!     Forward                 Backward
//! ```
//!
//! Two selections over the same span but with swapped ends are different
//! selections, so equality is direction-sensitive.
//!
//! # Example
//!
//! ```ignore
//! use the_paredit::selection::{Range, Selection};
//!
//! let sel = Selection::new(10, 4);
//! assert_eq!(sel.range(), Range::new(4, 10));
//! assert_eq!(sel.flip(), Selection::new(4, 10));
//! ```

use std::{
  borrow::Cow,
  cmp::Ordering,
};

use ropey::RopeSlice;
use the_core::token::Token;
use thiserror::Error;

use crate::{
  movement::Direction,
  transaction::{
    Assoc,
    ChangeSet,
    TransactionError,
  },
};

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SelectionError {
  #[error("selection {anchor}..{active} is out of bounds for document length {len}")]
  OutOfBounds {
    anchor: usize,
    active: usize,
    len:    usize,
  },
  #[error(transparent)]
  Transaction(#[from] TransactionError),
}

pub type Result<T> = std::result::Result<T, SelectionError>;

/// An ordered span `[start, end)` of char offsets.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
  pub start: usize,
  pub end:   usize,
}

impl Range {
  /// Creates a range over `a` and `b` in whichever order they come.
  #[inline]
  pub fn new(a: usize, b: usize) -> Self {
    Self {
      start: a.min(b),
      end:   a.max(b),
    }
  }

  #[inline]
  pub fn point(pos: usize) -> Self {
    Self::new(pos, pos)
  }

  #[inline]
  #[must_use]
  pub fn len(&self) -> usize {
    self.end - self.start
  }

  #[inline]
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.start == self.end
  }

  #[inline]
  pub fn contains(&self, pos: usize) -> bool {
    self.start <= pos && pos < self.end
  }

  #[inline]
  pub fn contains_range(&self, other: &Self) -> bool {
    self.start <= other.start && self.end >= other.end
  }

  /// Smallest range covering both.
  #[must_use]
  pub fn union(&self, other: &Self) -> Self {
    Self {
      start: self.start.min(other.start),
      end:   self.end.max(other.end),
    }
  }

  /// Returns the text inside this range given the text of the whole buffer.
  #[inline]
  pub fn fragment<'a>(&self, text: RopeSlice<'a>) -> Cow<'a, str> {
    text.slice(self.start..self.end).into()
  }
}

impl From<(usize, usize)> for Range {
  fn from((a, b): (usize, usize)) -> Self {
    Self::new(a, b)
  }
}

impl From<Token> for Range {
  fn from(token: Token) -> Self {
    Self::new(token.start, token.end)
  }
}

impl From<Selection> for Range {
  fn from(selection: Selection) -> Self {
    selection.range()
  }
}

/// A directional selection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Selection {
  pub anchor: usize,
  pub active: usize,
}

impl Selection {
  #[inline]
  pub fn new(anchor: usize, active: usize) -> Self {
    Self { anchor, active }
  }

  /// A caret.
  #[inline]
  pub fn point(pos: usize) -> Self {
    Self::new(pos, pos)
  }

  /// Start of the selection
  #[inline]
  #[must_use]
  pub fn from(&self) -> usize {
    self.anchor.min(self.active)
  }

  /// End of the selection
  #[inline]
  #[must_use]
  pub fn to(&self) -> usize {
    self.anchor.max(self.active)
  }

  #[inline]
  #[must_use]
  pub fn len(&self) -> usize {
    self.to() - self.from()
  }

  /// When the active end and anchor are in the same position, we have a
  /// caret.
  #[inline]
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.anchor == self.active
  }

  #[inline]
  pub fn range(&self) -> Range {
    Range::new(self.anchor, self.active)
  }

  #[inline]
  #[must_use]
  pub fn direction(&self) -> Direction {
    if self.active < self.anchor {
      Direction::Backward
    } else {
      Direction::Forward
    }
  }

  /// Flips the direction of the selection
  #[inline]
  #[must_use]
  pub fn flip(&self) -> Self {
    Self {
      anchor: self.active,
      active: self.anchor,
    }
  }

  /// Returns the selection if we're going the same way as `direction`,
  /// else, flip it.
  #[inline]
  #[must_use]
  pub fn with_direction(self, direction: Direction) -> Self {
    if self.direction() == direction {
      self
    } else {
      self.flip()
    }
  }

  /// Checks that both ends fall inside a document of `len` chars.
  pub fn ensure_within(&self, len: usize) -> Result<()> {
    if self.to() > len {
      return Err(SelectionError::OutOfBounds {
        anchor: self.anchor,
        active: self.active,
        len,
      });
    }
    Ok(())
  }

  /// Maps both ends through `changes`. The ends of a non-empty selection
  /// lean inwards, so text inserted right at its edges stays outside.
  pub fn map(self, changes: &ChangeSet) -> Result<Self> {
    if changes.is_empty() {
      return Ok(self);
    }

    let (anchor, active) = match self.anchor.cmp(&self.active) {
      Ordering::Equal => (Assoc::Before, Assoc::Before),
      Ordering::Less => (Assoc::After, Assoc::Before),
      Ordering::Greater => (Assoc::Before, Assoc::After),
    };
    Ok(Self::new(
      changes.map_pos(self.anchor, anchor)?,
      changes.map_pos(self.active, active)?,
    ))
  }
}

impl From<Range> for Selection {
  /// A forward selection over the range.
  fn from(range: Range) -> Self {
    Self::new(range.start, range.end)
  }
}
