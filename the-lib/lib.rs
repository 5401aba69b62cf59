//! Structural editing for s-expression buffers.
//!
//! A [`document::Document`] holds the text, its token mirror and the
//! selection. [`navigation`] answers where forms start and end,
//! [`select`] moves and grows the selection, and [`paredit`] rewrites the
//! text without ever unbalancing it.

use smartstring::{
  LazyCompact,
  SmartString,
};

pub mod config;
pub mod document;
pub mod movement;
pub mod navigation;
pub mod paredit;
pub mod select;
pub mod selection;
pub mod transaction;

pub type Tendril = SmartString<LazyCompact>;
