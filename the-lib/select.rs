//! Selection operations and the selection stack.
//!
//! The `move_*` and `select_*` functions place the document's selection
//! relative to a [`Range`], usually one computed by [`crate::navigation`].
//! [`grow_selection_stack`] and [`shrink_selection`] keep a history of
//! grown selections so a grow gesture can be undone step by step.

use the_core::cursor::TokenCursor;

use crate::{
  document::{
    Document,
    Result,
  },
  navigation::{
    self,
    SexpCursor,
  },
  selection::{
    Range,
    Selection,
  },
};

/// Selections grown into, oldest first. The bottom entry is the selection
/// from before the first grow.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SelectionStack(Vec<Selection>);

impl SelectionStack {
  pub fn last(&self) -> Option<&Selection> {
    self.0.last()
  }

  pub fn push(&mut self, selection: Selection) {
    self.0.push(selection);
  }

  pub fn pop(&mut self) -> Option<Selection> {
    self.0.pop()
  }

  pub fn clear(&mut self) {
    self.0.clear();
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn as_slice(&self) -> &[Selection] {
    &self.0
  }
}

pub fn move_to_range_left(doc: &mut Document, range: Range) -> Result<()> {
  doc.set_selection(Selection::point(range.start))
}

pub fn move_to_range_right(doc: &mut Document, range: Range) -> Result<()> {
  doc.set_selection(Selection::point(range.end))
}

/// Keeps the anchor and moves the active end to the end of `range`.
pub fn select_range_forward(doc: &mut Document, range: Range) -> Result<()> {
  let anchor = doc.selection().anchor;
  doc.set_selection(Selection::new(anchor, range.end))
}

/// Keeps the anchor and moves the active end to the start of `range`.
pub fn select_range_backward(doc: &mut Document, range: Range) -> Result<()> {
  let anchor = doc.selection().anchor;
  doc.set_selection(Selection::new(anchor, range.start))
}

pub fn grow_selection_stack(doc: &mut Document, range: Range) -> Result<()> {
  let current = *doc.selection();
  let next = Selection::new(range.start, range.end);

  let stack = doc.selection_stack_mut();
  // The selection moved since the last grow: start a new history.
  if stack.last() != Some(&current) {
    stack.clear();
    stack.push(current);
  }
  if stack.last() == Some(&next) {
    return Ok(());
  }

  doc.set_selection(next)?;
  doc.selection_stack_mut().push(next);
  Ok(())
}

pub fn shrink_selection(doc: &mut Document) -> Result<()> {
  let current = *doc.selection();
  let stack = doc.selection_stack_mut();
  let Some(latest) = stack.pop() else {
    return Ok(());
  };

  if latest == current
    && let Some(previous) = stack.last().copied()
  {
    doc.set_selection(previous)?;
  }
  Ok(())
}

/// The next range out from `range`: the current form, then the contents of
/// the enclosing list, then the whole list, then the same one level up.
fn grown_range(doc: &Document, range: Range) -> Option<Range> {
  if range.is_empty()
    && let Some(form) = navigation::current_form(doc, range.start)
    && form.contains_range(&range)
  {
    return Some(form);
  }

  let mut cursor = doc.cursor(range.start);
  while cursor.to_enclosing_open() {
    let open = cursor.token()?;
    let mut close = cursor.clone();
    if !close.to_partner() {
      return None;
    }
    let close = close.token()?;

    let inner = Range::new(open.end, close.start);
    if inner.contains_range(&range) && inner != range {
      return Some(inner);
    }

    let mut unit = cursor.clone();
    unit.backward_tags();
    let outer = Range::new(unit.offset_start(), close.end);
    if outer.contains_range(&range) && outer != range {
      return Some(outer);
    }
  }

  // Last step: the top-level form itself.
  navigation::current_form(doc, range.start)
    .filter(|form| form.contains_range(&range) && *form != range)
}

/// Expands the selection one step outwards and records it on the stack.
pub fn grow_selection(doc: &mut Document) -> Result<()> {
  let range = doc.selection().range();
  match grown_range(doc, range) {
    Some(next) => grow_selection_stack(doc, next),
    None => Ok(()),
  }
}

pub fn forward_sexp(doc: &mut Document) -> Result<()> {
  let range = navigation::forward_sexp_range(doc);
  move_to_range_right(doc, range)
}

pub fn backward_sexp(doc: &mut Document) -> Result<()> {
  let range = navigation::backward_sexp_range(doc);
  move_to_range_left(doc, range)
}

pub fn select_forward_sexp(doc: &mut Document) -> Result<()> {
  let range = navigation::forward_sexp_range(doc);
  select_range_forward(doc, range)
}

pub fn select_backward_sexp(doc: &mut Document) -> Result<()> {
  let range = navigation::backward_sexp_range(doc);
  select_range_backward(doc, range)
}

pub fn forward_down_sexp(doc: &mut Document) -> Result<()> {
  let range = navigation::range_to_forward_down_list(doc);
  move_to_range_right(doc, range)
}

pub fn backward_up_sexp(doc: &mut Document) -> Result<()> {
  let range = navigation::range_to_backward_up_list(doc);
  move_to_range_left(doc, range)
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::navigation::test::{
    from_notation,
    notation,
  };

  #[test]
  fn move_to_range_collapses() {
    let mut doc = from_notation("(a |b c|)");
    move_to_range_left(&mut doc, Range::new(6, 2)).unwrap();
    assert_eq!(notation(&doc), "(a| b c)");
    move_to_range_right(&mut doc, Range::new(1, 4)).unwrap();
    assert_eq!(notation(&doc), "(a b| c)");
  }

  #[test]
  fn select_ranges_keep_the_anchor() {
    let mut doc = from_notation("(a |b| c d)");
    select_range_forward(&mut doc, Range::new(4, 6)).unwrap();
    assert_eq!(doc.selection(), &Selection::new(3, 6));

    let mut doc = from_notation("(a b c |d)");
    select_range_backward(&mut doc, Range::new(3, 5)).unwrap();
    assert_eq!(doc.selection(), &Selection::new(7, 3));
  }

  #[test]
  fn grow_then_shrink_restores() {
    let mut doc = from_notation("(a |b c)");
    let before = *doc.selection();

    grow_selection_stack(&mut doc, Range::new(3, 4)).unwrap();
    grow_selection_stack(&mut doc, Range::new(1, 6)).unwrap();
    assert_eq!(doc.selection(), &Selection::new(1, 6));
    assert_eq!(doc.selection_stack().len(), 3);

    shrink_selection(&mut doc).unwrap();
    assert_eq!(doc.selection(), &Selection::new(3, 4));
    shrink_selection(&mut doc).unwrap();
    assert_eq!(doc.selection(), &before);
    assert_eq!(doc.selection_stack().len(), 1);

    // Nothing left to go back to.
    shrink_selection(&mut doc).unwrap();
    assert_eq!(doc.selection(), &before);
    assert!(doc.selection_stack().is_empty());
  }

  #[test]
  fn grow_into_the_same_range_is_a_no_op() {
    let mut doc = from_notation("(a |b c)");
    grow_selection_stack(&mut doc, Range::new(3, 4)).unwrap();
    grow_selection_stack(&mut doc, Range::new(3, 4)).unwrap();
    assert_eq!(doc.selection_stack().len(), 2);
  }

  #[test]
  fn moving_the_selection_resets_the_stack() {
    let mut doc = from_notation("(a |b c)");
    grow_selection_stack(&mut doc, Range::new(3, 4)).unwrap();
    doc.set_selection(Selection::point(5)).unwrap();
    grow_selection_stack(&mut doc, Range::new(5, 6)).unwrap();
    assert_eq!(doc.selection_stack().as_slice(), &[
      Selection::point(5),
      Selection::new(5, 6)
    ]);
  }

  #[test]
  fn grow_selection_walks_outwards() {
    let mut doc = from_notation("(x #t [a b|c d])");
    grow_selection(&mut doc).unwrap();
    assert_eq!(notation(&doc), "(x #t [a |bc| d])");
    grow_selection(&mut doc).unwrap();
    assert_eq!(notation(&doc), "(x #t [|a bc d|])");
    grow_selection(&mut doc).unwrap();
    assert_eq!(notation(&doc), "(x |#t [a bc d]|)");
    grow_selection(&mut doc).unwrap();
    assert_eq!(notation(&doc), "(|x #t [a bc d]|)");
    grow_selection(&mut doc).unwrap();
    assert_eq!(notation(&doc), "|(x #t [a bc d])|");
    grow_selection(&mut doc).unwrap();
    assert_eq!(notation(&doc), "|(x #t [a bc d])|");

    for _ in 0..5 {
      shrink_selection(&mut doc).unwrap();
    }
    assert_eq!(notation(&doc), "(x #t [a b|c d])");
  }

  #[test]
  fn convenience_moves() {
    let mut doc = from_notation("(a| b [c d])");
    forward_sexp(&mut doc).unwrap();
    assert_eq!(notation(&doc), "(a b| [c d])");
    forward_down_sexp(&mut doc).unwrap();
    assert_eq!(notation(&doc), "(a b [|c d])");
    select_forward_sexp(&mut doc).unwrap();
    assert_eq!(doc.selection(), &Selection::new(6, 7));
    backward_up_sexp(&mut doc).unwrap();
    assert_eq!(notation(&doc), "(a b |[c d])");
    backward_sexp(&mut doc).unwrap();
    assert_eq!(notation(&doc), "(a |b [c d])");
    select_backward_sexp(&mut doc).unwrap();
    assert_eq!(doc.selection(), &Selection::new(3, 1));
  }
}
