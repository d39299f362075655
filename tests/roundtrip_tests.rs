//! Printing a parsed program and reparsing the output must reach a fixed
//! point: the second print equals the first.

use coremu::ast::Program;
use coremu::parser::{Cursor, Parser};
use coremu::types::TypingContext;

fn parse(source: &str) -> Program {
    let mut ctx = TypingContext::with_builtins();
    let mut parser = Parser::new(&mut ctx);
    let mut cursor = Cursor::new(source);
    parser.parse_program(&mut cursor).expect("program parses")
}

fn assert_roundtrips(source: &str) {
    let first = parse(source).to_string();
    let second = parse(&first).to_string();
    assert_eq!(first, second, "print is not a fixed point for {source:?}");
}

#[test]
fn arithmetic_and_ifz_roundtrip() {
    assert_roundtrips("(- 2 2 (mu' x (ifz x [123 <END>] [x <END>])))");
}

#[test]
fn definitions_roundtrip() {
    assert_roundtrips("(def foo (foo) (foo) [foo foo])");
    assert_roundtrips("(def Id (x) (k) [x k])\n(Id (1) (<END>))");
}

#[test]
fn map_sum_corpus_roundtrips() {
    assert_roundtrips(
        r#"
(def ListMap (f xs) (then)
  [xs
   (case ((Nil         [(Nil) then])
          (Cons (x xs) [(Cons ((mu xThen [f (Ap (x) (xThen))])
                               (mu xsThen (ListMap (f xs) (xsThen)))))
                        then])))])
(def PairSum (p) (then)
  [p (case ((Pair (a b) (+ a b then))))])
(ListMap ((cocase ((Ap (p) (then) (PairSum (p) (then)))))
          (Cons ((Pair (1 2)) (Cons ((Pair (3 4)) (Nil))))))
         (<END>))
"#,
    );
}

#[test]
fn cocases_and_destructors_roundtrip() {
    assert_roundtrips("[(cocase ((Fst (k) [1 k]) (Snd (k) [2 k]))) (Snd (<END>))]");
    assert_roundtrips("[(cocase ((Head (k) [1 k]) (Tail (k) [0 <END>]))) (Head (<END>))]");
    assert_roundtrips("[(cocase ((Ap (x) (k) (+ x 1 k)))) (Ap (41) (<END>))]");
}

#[test]
fn unicode_spellings_normalise_to_ascii() {
    let first = parse("[(μ a [1 a]) (μ' x [x <END>])]").to_string();
    assert_eq!(first, "[(mu a [1 a]) (mu' x [x <END>])]\n");
    let second = parse(&first).to_string();
    assert_eq!(first, second);
}

#[test]
fn nullary_structors_print_without_argument_lists() {
    let printed = parse("[(Nil) <END>]").to_string();
    assert_eq!(printed, "[(Nil) <END>]\n");
    assert_roundtrips("[(Cons (1 (Nil))) <END>]");
}

#[test]
fn negative_literals_roundtrip() {
    assert_roundtrips("[-42 <END>]");
}
