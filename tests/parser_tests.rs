use coremu::ast::{Consumer, Producer, Program, Statement};
use coremu::parser::{Cursor, ParseError, ParseErrorKind, Parser};
use coremu::types::TypingContext;

fn parse(source: &str) -> Result<Program, ParseError> {
    let mut ctx = TypingContext::with_builtins();
    let mut parser = Parser::new(&mut ctx);
    let mut cursor = Cursor::new(source);
    parser.parse_program(&mut cursor)
}

#[test]
fn parses_arithmetic_with_mu_tilde() {
    let program = parse("(- 2 2 (mu' x (ifz x [123 <END>] [x <END>])))").unwrap();
    assert_eq!(program.definitions.len(), 0);
    assert_eq!(program.statements.len(), 1);
    assert!(matches!(program.statements[0], Statement::Arith(_)));
}

#[test]
fn parses_cuts_at_top_level() {
    let program = parse("[1 <END>]\n[2 <END>]").unwrap();
    assert_eq!(program.statements.len(), 2);
    assert!(matches!(program.statements[0], Statement::Cut(_)));
}

const MAP_SUM_PROGRAM: &str = r#"
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
"#;

#[test]
fn parses_list_map_and_pair_sum() {
    let program = parse(MAP_SUM_PROGRAM).unwrap();
    assert_eq!(program.definitions.len(), 2);
    assert_eq!(program.statements.len(), 1);
    assert!(matches!(program.statements[0], Statement::Call(_)));
}

#[test]
fn unicode_mu_spellings_are_accepted() {
    let program = parse("[(μ a [1 a]) (μ' x [x <END>])]").unwrap();
    let Statement::Cut(cut) = &program.statements[0] else {
        panic!("expected a cut");
    };
    assert!(matches!(cut.producer, Producer::Mu(_)));
    assert!(matches!(cut.consumer, Consumer::MuTilde(_)));
}

#[test]
fn variable_and_definition_namespaces_are_separate() {
    // The parameter and coparameter both named foo shadow nothing and
    // clash with nothing: the body resolves foo to the parameter on the
    // producer side and to the coparameter on the consumer side
    let program = parse("(def foo (foo) (foo) [foo foo])").unwrap();
    let definition = &program.definitions[0];
    let Statement::Cut(cut) = &definition.body else {
        panic!("expected a cut body");
    };
    let Producer::Var(var) = &cut.producer else {
        panic!("expected a variable producer");
    };
    let Consumer::Covar(covar) = &cut.consumer else {
        panic!("expected a covariable consumer");
    };
    assert_eq!(var.var_id, definition.arg_ids[0]);
    assert_eq!(covar.covar_id, definition.coarg_ids[0]);
}

#[test]
fn shadowing_rebinds_the_nearest_binder() {
    let program = parse("(def f (x) (k) [x (mu' x [x k])])").unwrap();
    let definition = &program.definitions[0];
    let Statement::Cut(cut) = &definition.body else {
        panic!("expected a cut body");
    };
    let Consumer::MuTilde(inner) = &cut.consumer else {
        panic!("expected a mu' consumer");
    };
    let Statement::Cut(inner_cut) = &inner.body else {
        panic!("expected an inner cut");
    };
    let Producer::Var(inner_var) = &inner_cut.producer else {
        panic!("expected a variable");
    };
    assert_eq!(inner_var.var_id, inner.var_id);
    assert_ne!(inner_var.var_id, definition.arg_ids[0]);
}

#[test]
fn unknown_variable_is_reported() {
    let error = parse("[x <END>]").unwrap_err();
    assert_eq!(error.name(), "Parse error");
    match error.kind {
        ParseErrorKind::UnknownName { syntax_kind, name } => {
            assert_eq!(syntax_kind, "variable");
            assert_eq!(name, "x");
        }
        other => panic!("expected unknown name, got {other:?}"),
    }
}

#[test]
fn unknown_covariable_is_reported() {
    let error = parse("[5 k]").unwrap_err();
    assert!(matches!(error.kind, ParseErrorKind::UnknownName { .. }));
    assert!(error.to_string().contains("unknown covariable: k"));
}

#[test]
fn unknown_definition_is_reported() {
    let error = parse("(Undefined () ())").unwrap_err();
    assert!(error.to_string().contains("unknown definition: Undefined"));
}

#[test]
fn constructor_arity_is_checked() {
    let error = parse("[(Cons (1)) <END>]").unwrap_err();
    match error.kind {
        ParseErrorKind::ArityMismatch {
            ref name,
            expected,
            actual,
            ..
        } => {
            assert_eq!(name, "Cons");
            assert_eq!(expected, 2);
            assert_eq!(actual, 1);
        }
        other => panic!("expected arity mismatch, got {other:?}"),
    }
    assert!(error.to_string().contains("arity mismatch"));
}

#[test]
fn destructor_coarity_is_checked() {
    let error = parse("[5 (Ap (1) ())]").unwrap_err();
    assert!(error
        .to_string()
        .contains("coarity mismatch: Ap expects 1, got 0"));
}

#[test]
fn call_arity_is_checked() {
    let error = parse("(def Id (x) (k) [x k])\n(Id (1 2) (<END>))").unwrap_err();
    assert!(error.to_string().contains("arity mismatch: Id expects 1, got 2"));
}

#[test]
fn duplicate_definitions_are_rejected() {
    let error = parse("(def A () () [1 <END>])\n(def A () () [2 <END>])").unwrap_err();
    assert!(error.to_string().contains("Repeated definition of A"));
}

#[test]
fn ifz_is_a_reserved_name() {
    let error = parse("(def ifz (x) () [x <END>])").unwrap_err();
    assert!(error.to_string().contains("ifz is a reserved name"));
}

#[test]
fn incomplete_case_is_rejected() {
    let error = parse("[(Nil) (case ((Nil [1 <END>])))]").unwrap_err();
    assert!(error.to_string().contains("incomplete clause list"));
}

#[test]
fn duplicate_clauses_are_rejected() {
    let error = parse("[(Nil) (case ((Nil [1 <END>]) (Nil [2 <END>])))]").unwrap_err();
    assert!(error
        .to_string()
        .contains("Duplicate or mismatched structor: Nil"));
}

#[test]
fn cross_type_clauses_are_rejected() {
    let error =
        parse("[(Nil) (case ((Nil [1 <END>]) (Pair (a b) [a <END>])))]").unwrap_err();
    assert!(error
        .to_string()
        .contains("Duplicate or mismatched structor: Pair"));
}

#[test]
fn empty_clause_lists_are_rejected() {
    let error = parse("[(Nil) (case ())]").unwrap_err();
    assert!(error.to_string().contains("empty clause list"));
}

#[test]
fn stray_close_paren_is_an_unexpected_char() {
    let error = parse(")").unwrap_err();
    assert!(matches!(
        error.kind,
        ParseErrorKind::UnexpectedChar(Some(')'))
    ));
    assert!(error.to_string().contains("definition or statement"));
}

#[test]
fn truncated_input_reports_eof() {
    let error = parse("(+ 1 2 <END>").unwrap_err();
    assert!(matches!(error.kind, ParseErrorKind::UnexpectedChar(None)));
    assert!(error.to_string().contains("unexpected end of input"));
}

#[test]
fn errors_carry_line_numbers() {
    let error = parse("[1 <END>]\n[missing <END>]").unwrap_err();
    assert_eq!(error.cause_line, 2);
}

#[test]
fn bad_integer_literals_are_rejected() {
    let error = parse("[-12x <END>]").unwrap_err();
    assert!(error.to_string().contains("invalid integer literal: -12x"));
}

#[test]
fn structor_names_resolve_in_application_position() {
    // A variable named Cons coexists with the constructor Cons
    let program = parse("(def f (Cons) (k) [(Cons (Cons (Nil))) k])").unwrap();
    let definition = &program.definitions[0];
    let Statement::Cut(cut) = &definition.body else {
        panic!("expected a cut body");
    };
    let Producer::Ctor(ctor) = &cut.producer else {
        panic!("expected a constructor");
    };
    assert!(matches!(&ctor.args[0], Producer::Var(var) if var.var_id == definition.arg_ids[0]));
}

#[test]
fn parser_counts_minted_identifiers() {
    let mut ctx = TypingContext::with_builtins();
    let mut parser = Parser::new(&mut ctx);
    let mut cursor = Cursor::new("(def f (x y) (k) [x k])");
    parser.parse_program(&mut cursor).unwrap();
    assert_eq!(parser.n_vars(), 2);
    assert_eq!(parser.n_covars(), 1);
}
