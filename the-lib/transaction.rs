//! Atomic edits against a rope.
//!
//! Structural edits usually touch more than one region of the buffer: a slurp
//! moves a closing bracket, a drag swaps two forms. All of those regions are
//! computed against the *original* text and collected into one
//! [`Transaction`], which is then applied in a single pass. Nothing observes
//! the buffer in between, so offsets never have to be patched up by hand.
//!
//! A [`ChangeSet`] stores the edits as a run of [`Operation`]s walked from the
//! start of the buffer. It only applies to a buffer of the length it was
//! built for.
//!
//! ```ignore
//! use the_paredit::transaction::Transaction;
//! use ropey::Rope;
//!
//! let doc = Rope::from("(str) \"foo\"");
//!
//! // Move the closing paren past the string.
//! let tx = Transaction::change(&doc, vec![
//!     (11, 11, Some(")".into())),
//!     (4, 6, Some(" ".into())),
//! ]).unwrap();
//!
//! assert_eq!(tx.apply_to(&doc).unwrap(), "(str \"foo\")");
//! ```

use ropey::{
  Rope,
  RopeBuilder,
  RopeSlice,
};
use thiserror::Error;

use crate::{
  Tendril,
  selection::Selection,
};

pub type Result<T> = std::result::Result<T, TransactionError>;

/// Replaces `from..to` with the text, or deletes it when there is none.
pub type Change = (usize, usize, Option<Tendril>);

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransactionError {
  #[error("changeset length mismatch: expected {expected}, got {actual}")]
  LengthMismatch { expected: usize, actual: usize },
  #[error("invalid change range: start {from} is after end {to}")]
  InvalidRange { from: usize, to: usize },
  #[error("change range {from}..{to} is out of bounds for document length {len}")]
  RangeOutOfBounds {
    from: usize,
    to:   usize,
    len:  usize,
  },
  #[error("change range {from}..{to} overlaps previous end {prev_end}")]
  OverlappingRange {
    prev_end: usize,
    from:     usize,
    to:       usize,
  },
  #[error("position {pos} is out of bounds for changeset length {len}")]
  PositionOutOfBounds { pos: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
  /// Keep n chars.
  Retain(usize),
  /// Drop n chars.
  Delete(usize),
  Insert(Tendril),
}

/// Side a position takes when text is inserted right at it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Assoc {
  Before,
  After,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChangeSet {
  operations: Vec<Operation>,
  len:        usize,
  len_after:  usize,
}

impl ChangeSet {
  /// An identity change set for `doc`.
  #[must_use]
  pub fn new(doc: RopeSlice) -> Self {
    let len = doc.len_chars();
    Self {
      operations: Vec::new(),
      len,
      len_after: len,
    }
  }

  pub fn operations(&self) -> &[Operation] {
    &self.operations
  }

  /// Length of the buffer this applies to.
  pub fn len(&self) -> usize {
    self.len
  }

  pub fn len_after(&self) -> usize {
    self.len_after
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self
      .operations
      .iter()
      .all(|op| matches!(op, Operation::Retain(_)))
  }

  /// Appends `op`, folding it into the previous operation of the same kind.
  fn push(&mut self, op: Operation) {
    match (&op, self.operations.last_mut()) {
      (Operation::Retain(0) | Operation::Delete(0), _) => return,
      (Operation::Insert(text), _) if text.is_empty() => return,
      (Operation::Retain(n), Some(Operation::Retain(last)))
      | (Operation::Delete(n), Some(Operation::Delete(last))) => {
        *last += n;
        return;
      },
      (Operation::Insert(text), Some(Operation::Insert(last))) => {
        last.push_str(text);
        return;
      },
      _ => {},
    }
    self.operations.push(op);
  }

  fn retain(&mut self, n: usize) {
    self.len += n;
    self.len_after += n;
    self.push(Operation::Retain(n));
  }

  fn delete(&mut self, n: usize) {
    self.len += n;
    self.push(Operation::Delete(n));
  }

  fn insert(&mut self, text: Tendril) {
    self.len_after += text.chars().count();
    self.push(Operation::Insert(text));
  }

  fn ensure_len(&self, text_len: usize) -> Result<()> {
    if text_len != self.len {
      return Err(TransactionError::LengthMismatch {
        expected: self.len,
        actual:   text_len,
      });
    }
    Ok(())
  }

  /// Applies the changes in place. Nothing is touched on a length mismatch.
  pub fn apply(&self, text: &mut Rope) -> Result<()> {
    self.ensure_len(text.len_chars())?;

    let mut pos = 0;
    for op in &self.operations {
      match op {
        Operation::Retain(n) => pos += n,
        Operation::Delete(n) => text.remove(pos..pos + n),
        Operation::Insert(s) => {
          text.insert(pos, s);
          pos += s.chars().count();
        },
      }
    }
    Ok(())
  }

  /// Builds the changed text as a new rope, leaving `text` as it is.
  pub fn apply_to(&self, text: &Rope) -> Result<Rope> {
    self.ensure_len(text.len_chars())?;
    if self.is_empty() {
      return Ok(text.clone());
    }

    let mut builder = RopeBuilder::new();
    let mut pos = 0;
    for op in &self.operations {
      match op {
        Operation::Retain(n) => {
          for chunk in text.slice(pos..pos + n).chunks() {
            builder.append(chunk);
          }
          pos += n;
        },
        Operation::Delete(n) => pos += n,
        Operation::Insert(s) => builder.append(s),
      }
    }
    for chunk in text.slice(pos..).chunks() {
      builder.append(chunk);
    }
    Ok(builder.finish())
  }

  /// The changes as `(from, to, text)` in the coordinates of the original
  /// buffer. An insert followed by a delete comes back as one replacement.
  pub fn edits(&self) -> impl Iterator<Item = Change> + '_ {
    let mut ops = self.operations.iter().peekable();
    let mut pos = 0;
    std::iter::from_fn(move || {
      loop {
        let start = pos;
        match ops.next()? {
          Operation::Retain(n) => pos += n,
          Operation::Delete(n) => {
            pos += n;
            return Some((start, pos, None));
          },
          Operation::Insert(s) => {
            if let Some(Operation::Delete(n)) = ops.peek() {
              pos += n;
              ops.next();
            }
            return Some((start, pos, Some(s.clone())));
          },
        }
      }
    })
  }

  /// Where `pos` ends up once the changes are applied.
  ///
  /// A position at the start of a replaced or deleted span stays in front of
  /// it. Inside a replacement, `assoc` picks the start or the end of the new
  /// text, and at a pure insertion it picks the side of the inserted text.
  pub fn map_pos(&self, pos: usize, assoc: Assoc) -> Result<usize> {
    if pos > self.len {
      return Err(TransactionError::PositionOutOfBounds { pos, len: self.len });
    }

    let mut added = 0;
    let mut removed = 0;
    for (from, to, text) in self.edits() {
      if pos < from {
        break;
      }
      let inserted = text.as_ref().map_or(0, |text| text.chars().count());
      let start = from + added - removed;
      if pos == from {
        return Ok(if from == to && assoc == Assoc::After {
          start + inserted
        } else {
          start
        });
      }
      if pos < to {
        return Ok(if assoc == Assoc::After {
          start + inserted
        } else {
          start
        });
      }
      added += inserted;
      removed += to - from;
    }
    Ok(pos + added - removed)
  }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Transaction {
  changes:   ChangeSet,
  selection: Option<Selection>,
}

impl Transaction {
  /// Changes made to the buffer.
  pub fn changes(&self) -> &ChangeSet {
    &self.changes
  }

  /// When set, replaces the mapped selection.
  pub fn selection(&self) -> Option<&Selection> {
    self.selection.as_ref()
  }

  pub fn apply(&self, doc: &mut Rope) -> Result<()> {
    self.changes.apply(doc)
  }

  pub fn apply_to(&self, doc: &Rope) -> Result<Rope> {
    self.changes.apply_to(doc)
  }

  #[must_use]
  pub fn with_selection(mut self, selection: Selection) -> Self {
    self.selection = Some(selection);
    self
  }

  /// Builds a transaction from changes all expressed against `doc`. They may
  /// come in any order but must not overlap.
  pub fn change<I>(doc: &Rope, changes: I) -> Result<Self>
  where
    I: IntoIterator<Item = Change>,
  {
    let len = doc.len_chars();
    let mut changes: Vec<Change> = changes.into_iter().collect();
    changes.sort_by_key(|(from, to, _)| (*from, *to));

    let mut changeset = ChangeSet::new(doc.slice(0..0));
    let mut last = 0;
    for (from, to, text) in changes {
      if from > to {
        return Err(TransactionError::InvalidRange { from, to });
      }
      if to > len {
        return Err(TransactionError::RangeOutOfBounds { from, to, len });
      }
      if from < last {
        return Err(TransactionError::OverlappingRange {
          prev_end: last,
          from,
          to,
        });
      }

      changeset.retain(from - last);
      if let Some(text) = text {
        changeset.insert(text);
      }
      changeset.delete(to - from);
      last = to;
    }
    changeset.retain(len - last);

    Ok(Self {
      changes:   changeset,
      selection: None,
    })
  }
}
