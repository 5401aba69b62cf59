//! The edited buffer and its selection state.
//!
//! A [`Document`] owns the buffer text, the token mirror derived from it, the
//! current selection and the selection stack. Text only changes through
//! [`Document::apply_transaction`], which re-lexes the buffer before
//! returning, so a cursor taken afterwards always sees the current text.
//!
//! There is no IO and no undo history. A transaction that fails validation
//! leaves the document as it was. Without an explicit selection the old one
//! is mapped through the [`ChangeSet`](crate::transaction::ChangeSet).
//!
//! # Example
//!
//! ```no_run
//! use std::num::NonZeroUsize;
//!
//! use ropey::Rope;
//! use the_paredit::{
//!   document::{
//!     Document,
//!     DocumentId,
//!   },
//!   transaction::Transaction,
//! };
//!
//! let id = DocumentId::new(NonZeroUsize::new(1).unwrap());
//! let mut doc = Document::new(id, Rope::from("(a b)"));
//!
//! let tx = Transaction::change(doc.text(), vec![(4, 4, Some(" c".into()))]).unwrap();
//! doc.apply_transaction(&tx).unwrap();
//! assert_eq!(doc.text(), "(a b c)");
//! ```

use std::num::NonZeroUsize;

use ropey::Rope;
use the_core::{
  cursor::LexCursor,
  lexer::Lexed,
};
use thiserror::Error;

use crate::{
  config::Config,
  select::SelectionStack,
  selection::{
    Selection,
    SelectionError,
  },
  transaction::{
    Change,
    Transaction,
    TransactionError,
  },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(NonZeroUsize);

impl DocumentId {
  pub const fn new(id: NonZeroUsize) -> Self {
    Self(id)
  }

  pub const fn get(self) -> NonZeroUsize {
    self.0
  }
}

impl From<NonZeroUsize> for DocumentId {
  fn from(value: NonZeroUsize) -> Self {
    Self::new(value)
  }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DocumentError {
  #[error(transparent)]
  Transaction(#[from] TransactionError),
  #[error(transparent)]
  Selection(#[from] SelectionError),
}

pub type Result<T> = std::result::Result<T, DocumentError>;

#[derive(Debug, Clone)]
pub struct Document {
  id:              DocumentId,
  text:            Rope,
  lexed:           Lexed,
  selection:       Selection,
  selection_stack: SelectionStack,
  config:          Config,
  version:         u64,
}

impl Document {
  pub fn new(id: DocumentId, text: Rope) -> Self {
    let lexed = Lexed::new(text.slice(..));
    Self {
      id,
      text,
      lexed,
      selection: Selection::point(0),
      selection_stack: SelectionStack::default(),
      config: Config::default(),
      version: 0,
    }
  }

  #[must_use]
  pub fn with_config(mut self, config: Config) -> Self {
    self.config = config;
    self
  }

  pub fn id(&self) -> DocumentId {
    self.id
  }

  pub fn text(&self) -> &Rope {
    &self.text
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn set_config(&mut self, config: Config) {
    self.config = config;
  }

  pub fn selection(&self) -> &Selection {
    &self.selection
  }

  pub fn set_selection(&mut self, selection: Selection) -> Result<()> {
    selection.ensure_within(self.text.len_chars())?;
    self.selection = selection;
    Ok(())
  }

  pub fn selection_stack(&self) -> &SelectionStack {
    &self.selection_stack
  }

  pub fn selection_stack_mut(&mut self) -> &mut SelectionStack {
    &mut self.selection_stack
  }

  /// Back to a caret at the start and an empty selection stack.
  pub fn reset_selection(&mut self) {
    self.selection = Selection::point(0);
    self.selection_stack.clear();
  }

  /// A fresh cursor at `offset`. Cursors borrow the document, so none can
  /// outlive the next edit.
  pub fn cursor(&self, offset: usize) -> LexCursor<'_> {
    LexCursor::new(&self.lexed, self.text.slice(..), offset)
  }

  pub fn is_balanced(&self) -> bool {
    self.lexed.is_balanced()
  }

  pub fn version(&self) -> u64 {
    self.version
  }

  pub fn apply_transaction(&mut self, transaction: &Transaction) -> Result<()> {
    if transaction.changes().is_empty() {
      if let Some(selection) = transaction.selection() {
        self.set_selection(*selection)?;
      }
      return Ok(());
    }

    // Validate the selection against the final length before touching the
    // text, so a failure leaves the document as it was.
    let selection = match transaction.selection() {
      Some(selection) => *selection,
      None => self.selection.map(transaction.changes())?,
    };
    selection.ensure_within(transaction.changes().len_after())?;

    transaction.apply(&mut self.text)?;
    self.lexed = Lexed::new(self.text.slice(..));

    self.selection = selection;
    self.version = self.version.saturating_add(1);

    tracing::debug!(
      version = self.version,
      balanced = self.lexed.is_balanced(),
      anchor = selection.anchor,
      active = selection.active,
      "applied transaction"
    );

    Ok(())
  }

  /// Applies `changes`, all expressed against the current text, as one
  /// transaction and then places `selection`.
  pub fn apply_changes<I>(&mut self, changes: I, selection: Selection) -> Result<()>
  where
    I: IntoIterator<Item = Change>,
  {
    let tx = Transaction::change(&self.text, changes)?.with_selection(selection);
    self.apply_transaction(&tx)
  }
}

#[cfg(test)]
mod tests {
  use the_core::cursor::TokenCursor;

  use super::*;

  fn doc(text: &str) -> Document {
    let id = DocumentId::new(NonZeroUsize::new(1).unwrap());
    Document::new(id, Rope::from(text))
  }

  #[test]
  fn apply_transaction_relexes() {
    let mut doc = doc("(a b");
    assert!(!doc.is_balanced());

    let tx = Transaction::change(doc.text(), vec![(4, 4, Some(")".into()))]).unwrap();
    doc.apply_transaction(&tx).unwrap();

    assert_eq!(doc.text().to_string(), "(a b)");
    assert!(doc.is_balanced());
    assert_eq!(doc.version(), 1);
    assert_eq!(doc.cursor(4).token().map(|t| t.start), Some(4));
  }

  #[test]
  fn selection_maps_through_transaction() {
    let mut doc = doc("abc");
    doc.set_selection(Selection::point(1)).unwrap();

    let tx = Transaction::change(doc.text(), vec![(0, 0, Some("x".into()))]).unwrap();
    doc.apply_transaction(&tx).unwrap();

    assert_eq!(doc.selection().active, 2);
  }

  #[test]
  fn transaction_selection_overrides_mapping() {
    let mut doc = doc("abc");
    doc.set_selection(Selection::point(1)).unwrap();

    let selection = Selection::point(0);
    let tx = Transaction::change(doc.text(), vec![(2, 2, Some("x".into()))])
      .unwrap()
      .with_selection(selection);
    doc.apply_transaction(&tx).unwrap();

    assert_eq!(doc.selection(), &selection);
  }

  #[test]
  fn out_of_bounds_selection_leaves_document_untouched() {
    let mut doc = doc("abc");
    let tx = Transaction::change(doc.text(), vec![(0, 1, None)])
      .unwrap()
      .with_selection(Selection::point(3));

    assert!(matches!(
      doc.apply_transaction(&tx),
      Err(DocumentError::Selection(SelectionError::OutOfBounds { .. }))
    ));
    assert_eq!(doc.text().to_string(), "abc");
    assert_eq!(doc.version(), 0);
  }

  #[test]
  fn stale_transaction_is_rejected() {
    let mut doc = doc("(a)");
    let tx = Transaction::change(&Rope::from("(a b)"), vec![(4, 4, Some(" c".into()))]).unwrap();
    assert!(matches!(
      doc.apply_transaction(&tx),
      Err(DocumentError::Transaction(TransactionError::LengthMismatch { .. }))
    ));
    assert_eq!(doc.text().to_string(), "(a)");
  }

  #[test]
  fn reset_selection_clears_the_stack() {
    let mut doc = doc("(a b)");
    doc.set_selection(Selection::new(1, 2)).unwrap();
    doc.selection_stack_mut().push(Selection::new(1, 2));
    doc.reset_selection();
    assert_eq!(doc.selection(), &Selection::point(0));
    assert!(doc.selection_stack().is_empty());
  }
}
