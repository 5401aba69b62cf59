//! Movement direction for carets and selections.
//!
//! This module provides the [`Direction`] enum used throughout the library
//! to describe which way a selection points and which way a form is dragged.
//!
//! # Usage
//!
//! ```ignore
//! use the_paredit::movement::Direction;
//! use the_paredit::selection::Selection;
//!
//! let selection = Selection::new(5, 10);
//!
//! // Check selection direction
//! assert_eq!(selection.direction(), Direction::Forward);
//!
//! // Point the same span the other way
//! let backward = selection.with_direction(Direction::Backward);
//! assert_eq!(backward.anchor, 10);
//! assert_eq!(backward.active, 5);
//! ```

/// The direction of caret movement or selection extension.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
  /// Moving toward the end of the document (increasing positions).
  Forward,
  /// Moving toward the start of the document (decreasing positions).
  Backward,
}
