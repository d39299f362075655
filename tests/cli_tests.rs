use assert_cmd::Command;
use predicates::prelude::*;

fn coremu() -> Command {
    Command::cargo_bin("coremu").expect("binary builds")
}

#[test]
fn runs_a_program_from_stdin() {
    coremu()
        .write_stdin("(- 2 2 (mu' x (ifz x [123 <END>] [x <END>])))")
        .assert()
        .success()
        .stdout("123\n");
}

#[test]
fn prints_one_result_per_statement() {
    coremu()
        .write_stdin("[1 <END>]\n[(Cons (1 (Nil))) <END>]")
        .assert()
        .success()
        .stdout("1\n(Cons (1 (Nil)))\n");
}

#[test]
fn parse_errors_exit_with_one() {
    coremu()
        .write_stdin("[x <END>]")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unknown variable: x"));
}

#[test]
fn type_errors_exit_with_two() {
    coremu()
        .write_stdin("[(Cons (1 (Cons ((Nil) (Nil))))) <END>]")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("have different type constructors"));
}

#[test]
fn diagnostics_name_the_error_kind() {
    coremu()
        .write_stdin("[x <END>]")
        .assert()
        .stderr(predicate::str::contains("Parse error"))
        .stderr(predicate::str::contains("while parsing a"));
}

#[test]
fn trace_prints_rules_and_intermediate_statements() {
    coremu()
        .arg("--trace")
        .write_stdin("(- 2 2 (mu' x (ifz x [123 <END>] [x <END>])))")
        .assert()
        .success()
        .stdout(predicate::str::contains("-- Evaluating next statement --"))
        .stdout(predicate::str::contains("-- Reduce: Arithmetic --"))
        .stdout(predicate::str::contains("-- Finished! --"))
        .stdout(predicate::str::ends_with("123\n"));
}

#[test]
fn quiet_suppresses_results() {
    coremu()
        .arg("--quiet")
        .write_stdin("[1 <END>]")
        .assert()
        .success()
        .stdout("");
}

#[test]
fn unicode_output_uses_greek_spellings() {
    coremu()
        .args(["--trace", "--unicode"])
        .write_stdin("[(mu a [5 a]) <END>]")
        .assert()
        .success()
        .stdout(predicate::str::contains("(μ a [5 a])"));
}

#[test]
fn types_flag_annotates_initial_statements() {
    coremu()
        .args(["--trace", "--types"])
        .write_stdin("(def Id (x) (k) [x k])\n(Id (1) (<END>))")
        .assert()
        .success()
        .stdout(predicate::str::contains("Integer"));
}

#[test]
fn empty_input_is_a_valid_program() {
    coremu().write_stdin("").assert().success().stdout("");
}
