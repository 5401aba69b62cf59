//! Benchmarks for the re-lex scanner in the-paredit-core.
//!
//! Run with: `cargo bench -p the-paredit-core --bench lexer`

use divan::{
  Bencher,
  black_box,
};
use ropey::Rope;
use the_paredit_core::lexer::Lexed;

fn main() {
  divan::main();
}

const FORM: &str = "(defn handler\n  \"Handles a request.\"\n  [{:keys [uri body] :as req}]\n  ;; \
                    route it\n  (let [m #{:get :post} x ^:private 'sym]\n    (when (m (:method \
                    req))\n      #inst \"2020\" [\\a \\newline @x])))\n";

#[divan::bench(args = [1, 16, 256])]
fn lex_forms(bencher: Bencher, forms: usize) {
  let rope = Rope::from(FORM.repeat(forms));
  bencher.bench(|| Lexed::new(black_box(rope.slice(..))));
}

#[divan::bench]
fn lex_unbalanced(bencher: Bencher) {
  let rope = Rope::from(FORM.repeat(16).replace(')', ""));
  bencher.bench(|| Lexed::new(black_box(rope.slice(..))));
}
