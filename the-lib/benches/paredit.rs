//! Benchmarks for transactions and structural commands in the-paredit.
//!
//! Run with: `cargo bench -p the-paredit --bench paredit`

use std::num::NonZeroUsize;

use divan::{
  Bencher,
  black_box,
};
use ropey::Rope;
use the_paredit::{
  Tendril,
  document::{
    Document,
    DocumentId,
  },
  paredit,
  select,
  selection::Selection,
  transaction::{
    Assoc,
    Change,
    Transaction,
  },
};

fn main() {
  divan::main();
}

const FORM: &str = "(defn handler\n  [{:keys [uri body] :as req}]\n  (let [m #{:get :post} x \
                    ^:private 'sym]\n    (when (m (:method req))\n      [\"ok\" \\a @x])))\n";

fn make_rope(forms: usize) -> Rope {
  Rope::from(FORM.repeat(forms))
}

fn make_document(forms: usize, caret: usize) -> Document {
  let id = DocumentId::new(NonZeroUsize::new(1).unwrap());
  let mut doc = Document::new(id, make_rope(forms));
  doc.set_selection(Selection::point(caret)).unwrap();
  doc
}

/// Caret inside `(:method req)` of the middle form.
fn middle_caret(forms: usize) -> usize {
  let form_len = FORM.chars().count();
  let offset = FORM.find(":method").unwrap() + 1;
  (forms / 2) * form_len + offset
}

fn make_changes(len: usize, count: usize) -> Vec<Change> {
  let step = len / (count + 1);
  let insert = Tendril::from(" x");
  (1..=count)
    .map(|i| (i * step, i * step, Some(insert.clone())))
    .collect()
}

mod transaction {
  use super::*;

  #[divan::bench(args = [1, 8, 64])]
  fn change(bencher: Bencher, count: usize) {
    let doc = make_rope(64);
    let changes = make_changes(doc.len_chars(), count);

    bencher.bench(|| {
      let transaction =
        Transaction::change(black_box(&doc), black_box(changes.iter().cloned())).unwrap();
      black_box(transaction);
    });
  }

  #[divan::bench]
  fn apply(bencher: Bencher) {
    let doc = make_rope(64);
    let transaction = Transaction::change(&doc, make_changes(doc.len_chars(), 32)).unwrap();

    bencher.bench(|| {
      let mut next = doc.clone();
      transaction.apply(&mut next).unwrap();
      black_box(next);
    });
  }

  #[divan::bench]
  fn map_pos(bencher: Bencher) {
    let doc = make_rope(64);
    let transaction = Transaction::change(&doc, make_changes(doc.len_chars(), 32)).unwrap();
    let pos = doc.len_chars() / 2;

    bencher.bench(|| {
      let mapped = transaction
        .changes()
        .map_pos(black_box(pos), Assoc::After)
        .unwrap();
      black_box(mapped);
    });
  }
}

mod commands {
  use the_paredit::document::Result;

  use super::*;

  fn run(bencher: Bencher, forms: usize, command: fn(&mut Document) -> Result<()>) {
    let doc = make_document(forms, middle_caret(forms));
    bencher
      .with_inputs(|| doc.clone())
      .bench_local_values(|mut doc| {
        command(&mut doc).unwrap();
        doc
      });
  }

  #[divan::bench(args = [1, 64])]
  fn forward_slurp(bencher: Bencher, forms: usize) {
    run(bencher, forms, paredit::forward_slurp_sexp);
  }

  #[divan::bench(args = [1, 64])]
  fn drag_forward(bencher: Bencher, forms: usize) {
    run(bencher, forms, paredit::drag_sexpr_forward);
  }

  #[divan::bench(args = [1, 64])]
  fn raise(bencher: Bencher, forms: usize) {
    run(bencher, forms, paredit::raise_sexp);
  }

  #[divan::bench(args = [1, 64])]
  fn backspace(bencher: Bencher, forms: usize) {
    run(bencher, forms, paredit::backspace);
  }

  #[divan::bench(args = [1, 64])]
  fn grow_selection(bencher: Bencher, forms: usize) {
    run(bencher, forms, select::grow_selection);
  }
}
