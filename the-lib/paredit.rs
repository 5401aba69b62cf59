//! Structural mutators.
//!
//! Every command here reads the document's caret, works out all of its edits
//! against the current text and applies them as one [`Transaction`]. A
//! command whose preconditions do not hold (nothing to slurp, no sibling to
//! drag, a caret inside a string where lists are expected) leaves the
//! document untouched and returns `Ok(())`. Errors only come from a
//! transaction the document refuses, which means the cursor and the text
//! disagree.
//!
//! Offsets passed to [`Document::apply_changes`] all refer to the text
//! *before* the edit, and the resulting caret is computed up front.

use smallvec::{
  SmallVec,
  smallvec,
};
use the_core::{
  cursor::TokenCursor,
  lexer::Lexed,
  token::{
    Bracket,
    Token,
    TokenKind,
  },
};
use tracing::{
  debug,
  trace,
};

use crate::{
  Tendril,
  document::{
    Document,
    Result,
  },
  movement::Direction,
  navigation::{
    SexpCursor,
    current_child,
  },
  selection::{
    Range,
    Selection,
  },
  transaction::{
    Change,
    Transaction,
  },
};

fn fragment(doc: &Document, range: Range) -> Tendril {
  Tendril::from(range.fragment(doc.text().slice(..)).as_ref())
}

/// Edits of a single command. None needs more than two.
type Changes = SmallVec<[Change; 2]>;

fn edit(doc: &mut Document, changes: Changes, selection: Selection) -> Result<()> {
  trace!(?changes, ?selection, "structural edit");
  doc.apply_changes(changes, selection)
}

fn insert(doc: &mut Document, pos: usize, text: &str, caret: usize) -> Result<()> {
  edit(doc, smallvec![(pos, pos, Some(text.into()))], Selection::point(caret))
}

fn delete_token(doc: &mut Document, token: Token) -> Result<()> {
  edit(
    doc,
    smallvec![(token.start, token.end, None)],
    Selection::point(token.start),
  )
}

fn move_caret(doc: &mut Document, pos: usize) -> Result<()> {
  doc.set_selection(Selection::point(pos))
}

/// Whether the buffer stays balanced once `changes` are applied. Buffers that
/// are already unbalanced are not guarded.
fn keeps_balance(doc: &Document, changes: &[Change]) -> Result<bool> {
  if !doc.is_balanced() {
    return Ok(true);
  }
  let tx = Transaction::change(doc.text(), changes.iter().cloned())?;
  let text = tx.apply_to(doc.text())?;
  Ok(Lexed::new(text.slice(..)).is_balanced())
}

/// Whitespace right after `form`.
fn trailing_whitespace(doc: &Document, form: Range) -> Range {
  let mut cursor = doc.cursor(form.end);
  cursor.forward_whitespace(false);
  Range::new(form.end, cursor.offset_start())
}

/// Whitespace right before `form`. The line break ending a comment is never
/// part of it.
fn leading_whitespace(doc: &Document, form: Range) -> Range {
  let mut cursor = doc.cursor(form.start);
  cursor.backward_whitespace(false);
  let mut start = cursor.offset_start();
  if cursor
    .prev_token()
    .is_some_and(|token| token.kind == TokenKind::Comment)
  {
    start += 1;
  }
  Range::new(start.min(form.start), form.start)
}

/// A single space, or a line break indented to `column_of` when `ws` spanned
/// lines.
fn separator(doc: &Document, ws: Range, column_of: usize) -> String {
  if !fragment(doc, ws).contains('\n') {
    return " ".to_string();
  }
  let text = doc.text();
  let column = column_of - text.line_to_char(text.char_to_line(column_of));
  format!("\n{}", " ".repeat(column))
}

/// Moves `selection` along with `form` when the form ends up at `new_start`.
fn follow(selection: Selection, form: Range, new_start: usize) -> Selection {
  let shift = |pos: usize| new_start + pos.saturating_sub(form.start).min(form.len());
  if !selection.is_empty() && form.contains_range(&selection.range()) {
    Selection::new(shift(selection.anchor), shift(selection.active))
  } else {
    Selection::point(shift(selection.active))
  }
}

/// Like [`follow`], but always ends as a caret at the moved active end.
fn follow_caret(selection: Selection, form: Range, new_start: usize) -> Selection {
  Selection::point(follow(selection, form, new_start).active)
}

/// Where an insertion at `p` goes: past the escape or character literal that
/// `p` splits, if any.
fn past_escape<C: TokenCursor>(cursor: &C, p: usize) -> usize {
  if !cursor.within_escape(p) {
    return p;
  }
  cursor.token().map_or(p, |escape| escape.end)
}

/// Inserts a closing bracket, or steps over the one already there.
pub fn close(doc: &mut Document, close: char) -> Result<()> {
  let Some(bracket) = Bracket::from_close(close) else {
    debug!(%close, "not a closing bracket");
    return Ok(());
  };
  let active = doc.selection().active;
  let p = past_escape(&doc.cursor(active), active);
  let cursor = doc.cursor(p);

  if cursor.within_comment(p) {
    return Ok(());
  }
  let mut text = [0u8; 4];
  let text = close.encode_utf8(&mut text);
  if cursor.within_string(p) {
    return insert(doc, p, text, p + 1);
  }

  let mut ahead = cursor.clone();
  ahead.forward_whitespace(false);
  if let Some(token) = ahead.token()
    && token.kind == TokenKind::Close(bracket)
  {
    return move_caret(doc, token.end);
  }

  if doc.is_balanced() {
    debug!(%close, "buffer is balanced, not inserting");
    return Ok(());
  }
  insert(doc, p, text, p + 1)
}

/// Types a `"`: opens an empty string, steps out of one, or escapes a quote
/// inside one. A selection outside strings is wrapped in a string.
pub fn string_quote(doc: &mut Document) -> Result<()> {
  let selection = *doc.selection();
  let p = selection.active;
  let cursor = doc.cursor(p);

  if !selection.is_empty() && !cursor.within_string(selection.from()) {
    return wrap_in_string(doc, selection.range());
  }

  if cursor.within_escape(p) {
    let Some(escape) = cursor.token() else {
      return Ok(());
    };
    return if cursor.within_string(p) {
      insert(doc, escape.end, "\\\"", escape.end + 2)
    } else {
      insert(doc, escape.end, "\"\"", escape.end + 1)
    };
  }

  if cursor.within_string(p) {
    return match cursor.token() {
      Some(token) if token.kind == TokenKind::Close(Bracket::Quote) && token.start == p => {
        move_caret(doc, token.end)
      },
      // Unterminated string at the end of the buffer.
      None => insert(doc, p, "\"", p + 1),
      _ => insert(doc, p, "\\\"", p + 2),
    };
  }

  if cursor.within_comment(p) {
    return insert(doc, p, "\"", p + 1);
  }
  insert(doc, p, "\"\"", p + 1)
}

fn wrap_in_string(doc: &mut Document, range: Range) -> Result<()> {
  let mut text = Tendril::from("\"");
  let mut len = 0;
  for ch in range.fragment(doc.text().slice(..)).chars() {
    if matches!(ch, '"' | '\\') {
      text.push('\\');
      len += 1;
    }
    text.push(ch);
    len += 1;
  }
  text.push('"');

  let changes: Changes = smallvec![(range.start, range.end, Some(text))];
  if !keeps_balance(doc, &changes)? {
    debug!(?range, "wrapping would unbalance the buffer");
    return Ok(());
  }
  let inner = Selection::new(range.start + 1, range.start + 1 + len);
  let selection = inner.with_direction(doc.selection().direction());
  edit(doc, changes, selection)
}

/// Pulls the unit after the enclosing list into it.
pub fn forward_slurp_sexp(doc: &mut Document) -> Result<()> {
  let p = doc.selection().active;
  let mut cursor = doc.cursor(p);

  loop {
    if !cursor.forward_list() {
      debug!(p, "nothing to slurp forward");
      return Ok(());
    }
    let Some(close) = cursor.token() else {
      return Ok(());
    };
    let mut after = cursor.clone();
    after.next();

    if close.kind == TokenKind::Close(Bracket::Quote) {
      cursor = after;
      continue;
    }
    let mut target = after.clone();
    if !target.forward_sexp() {
      cursor = after;
      continue;
    }

    let mut ws_start = cursor.clone();
    ws_start.backward_whitespace(false);
    let empty = ws_start.prev_token().is_some_and(|token| token.is_open());
    let mut ws_end = after.clone();
    ws_end.forward_whitespace(false);
    let gap = Range::new(ws_start.offset_start(), ws_end.offset_start());

    let mut caret = p;
    let mut changes = Changes::new();
    if fragment(doc, gap).contains('\n') {
      changes.push((close.start, close.end, None));
    } else {
      let joined = gap.len() == close.len();
      let sep = if empty && joined { "" } else { " " };
      changes.push((gap.start, gap.end, Some(sep.into())));
      if p > gap.start {
        caret = p.min(gap.start + sep.len());
      }
    }
    let end = target.offset_start();
    changes.push((end, end, Some(fragment(doc, close.into()))));

    return edit(doc, changes, Selection::point(caret));
  }
}

/// Pulls the unit before the enclosing list into it.
pub fn backward_slurp_sexp(doc: &mut Document) -> Result<()> {
  let p = doc.selection().active;
  let mut cursor = doc.cursor(p);

  loop {
    if !cursor.to_enclosing_open() {
      debug!(p, "nothing to slurp backward");
      return Ok(());
    }
    let Some(open) = cursor.token() else {
      return Ok(());
    };
    if open.is_string_open() {
      continue;
    }

    let mut unit = cursor.clone();
    unit.backward_tags();
    let mut prev = unit.clone();
    if !prev.backward_sexp() {
      cursor = unit;
      continue;
    }

    let head = Range::new(unit.offset_start(), open.end);
    let mut inner = cursor.clone();
    inner.next();
    let empty = inner.token().is_some_and(|token| token.is_close());
    // `a(b)` must not end up as `(ab)`.
    let joined = !empty && !unit.prev_token().is_some_and(|token| token.is_blank());

    let at = prev.offset_start();
    let changes: Changes = smallvec![
      (at, at, Some(fragment(doc, head))),
      (head.start, head.end, joined.then(|| Tendril::from(" "))),
    ];
    let caret = if joined { p + 1 } else { p };
    return edit(doc, changes, Selection::point(caret));
  }
}

/// Pushes the last unit of the enclosing list out of it.
pub fn forward_barf_sexp(doc: &mut Document) -> Result<()> {
  let p = doc.selection().active;
  let cursor = doc.cursor(p);
  if cursor.within_string(p) {
    return Ok(());
  }

  let mut at_close = cursor.clone();
  if !at_close.forward_list() {
    return Ok(());
  }
  let Some(close) = at_close.token() else {
    return Ok(());
  };
  let mut child = at_close.clone();
  if !child.backward_sexp() {
    return Ok(());
  }
  let child_start = child.offset_start();
  child.backward_whitespace(true);
  let at = child.offset_start();

  let mut text = fragment(doc, close.into());
  if at == child_start {
    text.push(' ');
  }
  let changes: Changes = smallvec![(at, at, Some(text)), (close.start, close.end, None)];
  let caret = p.min(at);
  edit(doc, changes, Selection::point(caret))
}

/// Pushes the first unit of the enclosing list out of it.
pub fn backward_barf_sexp(doc: &mut Document) -> Result<()> {
  let p = doc.selection().active;
  let cursor = doc.cursor(p);
  if cursor.within_string(p) {
    return Ok(());
  }

  let mut at_open = cursor.clone();
  if !at_open.to_enclosing_open() {
    return Ok(());
  }
  let Some(open) = at_open.token() else {
    return Ok(());
  };
  let mut unit = at_open.clone();
  unit.backward_tags();
  let head = Range::new(unit.offset_start(), open.end);

  let mut child = at_open.clone();
  child.next();
  if !child.forward_sexp() {
    return Ok(());
  }
  let child_end = child.offset_start();
  child.forward_whitespace(true);
  let at = child.offset_start();

  let sep = if at == child_end { " " } else { "" };
  let mut text = Tendril::from(sep);
  text.push_str(&fragment(doc, head));
  let changes: Changes = smallvec![(head.start, head.end, None), (at, at, Some(text))];
  let caret = p.max(at) + sep.len();
  edit(doc, changes, Selection::point(caret))
}

/// Removes the brackets of the enclosing list.
pub fn splice_sexp(doc: &mut Document) -> Result<()> {
  let p = doc.selection().active;
  let cursor = doc.cursor(p);
  if cursor.within_string(p) {
    return Ok(());
  }
  let Some((open, close)) = cursor.enclosing_list() else {
    return Ok(());
  };

  let changes: Changes = smallvec![(open.start, open.end, None), (close.start, close.end, None)];
  edit(doc, changes, Selection::point(p - open.len()))
}

/// Replaces the enclosing list with the current form.
pub fn raise_sexp(doc: &mut Document) -> Result<()> {
  let p = doc.selection().active;
  let cursor = doc.cursor(p);
  if cursor.within_string(p) {
    return Ok(());
  }
  let Some((open, close)) = cursor.enclosing_list() else {
    return Ok(());
  };
  let children = cursor.children();
  let Some(idx) = current_child(&children, p) else {
    return Ok(());
  };

  let form = children[idx];
  let changes: Changes = smallvec![(open.start, close.end, Some(fragment(doc, form)))];
  let caret = open.start + p.saturating_sub(form.start).min(form.len());
  edit(doc, changes, Selection::point(caret))
}

/// Maps and binding vectors are dragged key and value together.
fn drags_in_pairs<C: SexpCursor>(doc: &Document, cursor: &C) -> bool {
  let mut list = cursor.clone();
  if !list.to_enclosing_open() {
    return false;
  }
  match list.token().map(|token| token.kind) {
    Some(TokenKind::Open(Bracket::Curly)) => true,
    Some(TokenKind::Open(Bracket::Square)) => {
      let mut parent = list.clone();
      if !parent.to_enclosing_open()
        || parent.token().map(|token| token.kind) != Some(TokenKind::Open(Bracket::Round))
      {
        return false;
      }
      parent.next();
      parent.forward_whitespace(true);
      parent.token().is_some_and(|head| {
        head.kind == TokenKind::Atom && doc.config().is_pair_form(&parent.token_text(&head))
      })
    },
    _ => false,
  }
}

/// Units at the caret's level and the index of the one under the caret.
fn sibling_units(doc: &Document, p: usize) -> Option<(Vec<Range>, usize)> {
  let cursor = doc.cursor(p);
  let children = cursor.children();
  let idx = current_child(&children, p)?;
  if !drags_in_pairs(doc, &cursor) {
    return Some((children, idx));
  }

  let pairs = children
    .chunks(2)
    .map(|pair| pair[0].union(&pair[pair.len() - 1]))
    .collect();
  Some((pairs, idx / 2))
}

fn drag(doc: &mut Document, direction: Direction) -> Result<()> {
  let selection = *doc.selection();
  let Some((units, idx)) = sibling_units(doc, selection.active) else {
    return Ok(());
  };
  let other = match direction {
    Direction::Forward => units.get(idx + 1),
    Direction::Backward => idx.checked_sub(1).and_then(|prev| units.get(prev)),
  };
  let Some(&other) = other else {
    debug!(?direction, "no sibling to drag past");
    return Ok(());
  };

  let current = units[idx];
  let changes: Changes = smallvec![
    (current.start, current.end, Some(fragment(doc, other))),
    (other.start, other.end, Some(fragment(doc, current))),
  ];
  let new_start = match direction {
    Direction::Forward => other.end - current.len(),
    Direction::Backward => other.start,
  };
  edit(doc, changes, follow(selection, current, new_start))
}

pub fn drag_sexpr_forward(doc: &mut Document) -> Result<()> {
  drag(doc, Direction::Forward)
}

pub fn drag_sexpr_backward(doc: &mut Document) -> Result<()> {
  drag(doc, Direction::Backward)
}

/// The current form and the unit start and close of its list, for moving
/// the form out of that list.
fn form_in_list(doc: &Document, p: usize) -> Option<(Range, usize, Token)> {
  let cursor = doc.cursor(p);
  if cursor.within_string(p) {
    return None;
  }
  let (_, close) = cursor.enclosing_list()?;
  let children = cursor.children();
  let form = children[current_child(&children, p)?];

  let mut list = cursor.clone();
  list.backward_up_list();
  Some((form, list.offset_start(), close))
}

/// Moves the current form out of its list, in front of it.
pub fn drag_sexpr_backward_up(doc: &mut Document) -> Result<()> {
  let selection = *doc.selection();
  let Some((form, list_start, _)) = form_in_list(doc, selection.active) else {
    return Ok(());
  };

  let trailing = trailing_whitespace(doc, form);
  let ws = if trailing.is_empty() {
    leading_whitespace(doc, form)
  } else {
    trailing
  };
  let removed = form.union(&ws);

  let mut text = fragment(doc, form);
  text.push_str(&separator(doc, ws, list_start));
  let changes: Changes = smallvec![
    (list_start, list_start, Some(text)),
    (removed.start, removed.end, None),
  ];
  edit(doc, changes, follow_caret(selection, form, list_start))
}

/// Moves the current form out of its list, after it.
pub fn drag_sexpr_forward_up(doc: &mut Document) -> Result<()> {
  let selection = *doc.selection();
  let Some((form, list_start, close)) = form_in_list(doc, selection.active) else {
    return Ok(());
  };

  let leading = leading_whitespace(doc, form);
  let ws = if leading.is_empty() {
    trailing_whitespace(doc, form)
  } else {
    leading
  };
  let removed = form.union(&ws);

  let sep = separator(doc, ws, list_start);
  let mut text = Tendril::from(sep.as_str());
  text.push_str(&fragment(doc, form));
  let changes: Changes = smallvec![
    (removed.start, removed.end, None),
    (close.end, close.end, Some(text)),
  ];
  let new_start = close.end - removed.len() + sep.chars().count();
  edit(doc, changes, follow_caret(selection, form, new_start))
}

/// Opening token of `unit` when it is a list, past any tags.
fn list_open(doc: &Document, unit: Range) -> Option<Token> {
  let mut cursor = doc.cursor(unit.start);
  while cursor.token()?.is_reader_tag() {
    cursor.next();
    cursor.forward_whitespace(true);
  }
  let token = cursor.token()?;
  (token.is_open() && !token.is_string_open()).then_some(token)
}

fn list_is_empty(doc: &Document, open: Token) -> bool {
  let mut cursor = doc.cursor(open.end);
  cursor.forward_whitespace(true);
  cursor.token().is_some_and(|token| token.is_close())
}

/// Moves the current form into the next list at its level, as its first
/// element.
pub fn drag_sexpr_forward_down(doc: &mut Document) -> Result<()> {
  let selection = *doc.selection();
  let p = selection.active;
  let children = doc.cursor(p).children();
  let Some(idx) = current_child(&children, p) else {
    return Ok(());
  };
  let form = children[idx];
  let Some(open) = children[idx + 1..]
    .iter()
    .find_map(|unit| list_open(doc, *unit))
  else {
    debug!(p, "no list to drag into");
    return Ok(());
  };

  let removed = form.union(&trailing_whitespace(doc, form));
  let mut text = fragment(doc, form);
  if !list_is_empty(doc, open) {
    text.push(' ');
  }
  let changes: Changes = smallvec![
    (removed.start, removed.end, None),
    (open.end, open.end, Some(text)),
  ];
  edit(doc, changes, follow_caret(selection, form, open.end - removed.len()))
}

/// Moves the current form into the previous list at its level, as its last
/// element.
pub fn drag_sexpr_backward_down(doc: &mut Document) -> Result<()> {
  let selection = *doc.selection();
  let p = selection.active;
  let children = doc.cursor(p).children();
  let Some(idx) = current_child(&children, p) else {
    return Ok(());
  };
  let form = children[idx];
  let Some(open) = children[..idx]
    .iter()
    .rev()
    .find_map(|unit| list_open(doc, *unit))
  else {
    debug!(p, "no list to drag into");
    return Ok(());
  };
  let mut partner = doc.cursor(open.start);
  if !partner.to_partner() {
    return Ok(());
  }
  let Some(close) = partner.token() else {
    return Ok(());
  };

  let removed = leading_whitespace(doc, form).union(&form);
  let sep = if list_is_empty(doc, open) { "" } else { " " };
  let mut text = Tendril::from(sep);
  text.push_str(&fragment(doc, form));
  let changes: Changes = smallvec![
    (close.start, close.start, Some(text)),
    (removed.start, removed.end, None),
  ];
  edit(doc, changes, follow_caret(selection, form, close.start + sep.len()))
}

fn delete_selection(doc: &mut Document, range: Range) -> Result<()> {
  let changes: Changes = smallvec![(range.start, range.end, None)];
  if !keeps_balance(doc, &changes)? {
    debug!(?range, "refusing to delete an unbalanced selection");
    return Ok(());
  }
  edit(doc, changes, Selection::point(range.start))
}

/// Deletes the char at `at`, or moves the caret to `refused` if that would
/// unbalance the buffer.
fn delete_char(doc: &mut Document, at: usize, refused: usize) -> Result<()> {
  let changes: Changes = smallvec![(at, at + 1, None)];
  if !keeps_balance(doc, &changes)? {
    debug!(at, "refusing an unbalancing delete");
    return move_caret(doc, refused);
  }
  edit(doc, changes, Selection::point(at))
}

/// Deletes backwards without breaking structure.
pub fn backspace(doc: &mut Document) -> Result<()> {
  let selection = *doc.selection();
  if !selection.is_empty() {
    return delete_selection(doc, selection.range());
  }
  let p = selection.active;
  if p == 0 {
    return Ok(());
  }

  let cursor = doc.cursor(p);
  if cursor.within_escape(p) {
    return match cursor.token() {
      Some(escape) => delete_token(doc, escape),
      None => Ok(()),
    };
  }
  if cursor.offset_start() < p {
    return delete_char(doc, p - 1, p - 1);
  }
  let Some(prev) = cursor.prev_token() else {
    return Ok(());
  };
  let mut back = cursor.clone();
  back.previous();

  match prev.kind {
    TokenKind::Escape if prev.len() == 2 => delete_token(doc, prev),
    TokenKind::Open(_) => {
      if !back.to_partner() {
        return delete_token(doc, prev);
      }
      match back.token() {
        Some(close) if close.start == p => {
          edit(
            doc,
            smallvec![(prev.start, close.end, None)],
            Selection::point(prev.start),
          )
        },
        _ => move_caret(doc, prev.start),
      }
    },
    TokenKind::Close(_) => {
      if back.to_partner() {
        move_caret(doc, prev.start)
      } else {
        delete_token(doc, prev)
      }
    },
    _ => delete_char(doc, p - 1, p - 1),
  }
}

/// Deletes forwards without breaking structure.
pub fn delete_forward(doc: &mut Document) -> Result<()> {
  let selection = *doc.selection();
  if !selection.is_empty() {
    return delete_selection(doc, selection.range());
  }
  let p = selection.active;
  if p >= doc.text().len_chars() {
    return Ok(());
  }

  let cursor = doc.cursor(p);
  if cursor.within_escape(p) {
    return match cursor.token() {
      Some(escape) => delete_token(doc, escape),
      None => Ok(()),
    };
  }
  if cursor.offset_start() < p {
    return delete_char(doc, p, p + 1);
  }
  let Some(token) = cursor.token() else {
    return Ok(());
  };
  let mut partner = cursor.clone();

  match token.kind {
    TokenKind::Escape if token.len() == 2 => delete_token(doc, token),
    TokenKind::Open(_) => {
      if !partner.to_partner() {
        return delete_token(doc, token);
      }
      match partner.token() {
        Some(close) if close.start == token.end => {
          edit(
            doc,
            smallvec![(token.start, close.end, None)],
            Selection::point(token.start),
          )
        },
        _ => move_caret(doc, token.end),
      }
    },
    TokenKind::Close(_) => {
      if !partner.to_partner() {
        return delete_token(doc, token);
      }
      match partner.token() {
        Some(open) if open.end == p => {
          edit(
            doc,
            smallvec![(open.start, token.end, None)],
            Selection::point(open.start),
          )
        },
        _ => move_caret(doc, token.end),
      }
    },
    _ => delete_char(doc, p, p + 1),
  }
}
