//! Small-step interpreter.
//!
//! Each statement of the program is reduced step by step until a cut
//! against `<END>` yields a final producer. Cuts reduce with a fixed
//! priority: a μ on the left always captures the continuation, then a
//! non-value producer is focused, then a μ̃ on the right binds the value,
//! and finally constructors meet cases and cocases meet destructors.
//! Every rule application can be traced to the output stream.
//!
//! The interpreter owns the program, continues the parser's (co)variable
//! numbering for the fresh names focusing introduces, and refuses to run
//! twice.

mod error;
mod focus;
mod subst;

pub use error::RuntimeError;

use std::io::Write;
use std::mem;

use crate::ast::{
    ArithOp, Arithmetic, Call, Clause, Consumer, Cut, Definition, Ifz, Mu, MuTilde, Producer,
    Program, Statement,
};
use crate::fmt::{self, PrintOptions};
use crate::types::{AbstractionId, TypingContext};

use subst::{CovarMap, VarMap};

/// What to print while running.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterpreterOptions {
    /// Print definitions before running.
    pub print_definitions: bool,
    /// Print each statement before executing it.
    pub print_start: bool,
    /// Print every intermediate statement.
    pub print_intermediate: bool,
    /// Print final results.
    pub print_results: bool,
    /// Print the reduction and focusing rules used.
    pub print_info: bool,
    /// Print types when printing definitions and initial statements.
    pub print_types: bool,
    /// Use μ/μ' spellings in all output.
    pub unicode: bool,
}

pub struct Interpreter<'c, W: Write> {
    options: InterpreterOptions,
    /// Typing context, for printing types in the trace.
    ctx: Option<&'c TypingContext>,
    finished: bool,
    stream: W,
    n_vars: usize,
    n_covars: usize,
    definitions: Vec<Definition>,
    statements: Vec<Statement>,
}

enum Step {
    /// The statement reached `[value <END>]`.
    Done(Producer),
    Next(Statement),
}

impl<'c, W: Write> Interpreter<'c, W> {
    /// `n_vars` and `n_covars` continue the parser's numbering so focusing
    /// never reuses an id.
    pub fn new(
        n_vars: usize,
        n_covars: usize,
        program: Program,
        options: InterpreterOptions,
        stream: W,
        ctx: Option<&'c TypingContext>,
    ) -> Self {
        Interpreter {
            options,
            ctx,
            finished: false,
            stream,
            n_vars,
            n_covars,
            definitions: program.definitions,
            statements: program.statements,
        }
    }

    /// Run every statement to completion, in source order, and return what
    /// each one passed into `<END>`.
    pub fn run(&mut self) -> Result<Vec<Producer>, RuntimeError> {
        if self.finished {
            return Err(RuntimeError::AlreadyRun);
        }
        let mut results = Vec::new();
        if self.options.print_definitions {
            self.info("-- Definitions --");
            let options = self.print_options(self.options.print_types);
            let rendered: Vec<_> = self
                .definitions
                .iter()
                .map(|definition| fmt::definition_to_string(definition, options, self.ctx))
                .collect();
            for line in rendered {
                let _ = writeln!(self.stream, "{line}");
            }
        }
        let statements = mem::take(&mut self.statements);
        for statement in statements {
            if self.options.print_start {
                self.info("-- Evaluating next statement --");
                let options = self.print_options(self.options.print_types);
                let rendered = fmt::statement_to_string(&statement, options, self.ctx);
                let _ = writeln!(self.stream, "{rendered}");
            }
            let mut steps = 0usize;
            let mut current = statement;
            let result = loop {
                if self.options.print_intermediate && steps > 0 {
                    let rendered =
                        fmt::statement_to_string(&current, self.print_options(false), None);
                    let _ = writeln!(self.stream, "{rendered}");
                }
                steps += 1;
                match self.step(current)? {
                    Step::Next(next) => current = next,
                    Step::Done(result) => break result,
                }
            };
            if self.options.print_results {
                let rendered = fmt::producer_to_string(&result, self.print_options(false), None);
                let _ = writeln!(self.stream, "{rendered}");
            }
            results.push(result);
        }
        self.finished = true;
        Ok(results)
    }

    fn step(&mut self, statement: Statement) -> Result<Step, RuntimeError> {
        match statement {
            Statement::Arith(arith) => self.step_arithmetic(arith),
            Statement::Ifz(ifz) => self.step_ifz(ifz),
            Statement::Cut(cut) => self.step_cut(cut),
            Statement::Call(call) => self.step_call(call),
        }
    }

    fn step_arithmetic(&mut self, mut statement: Box<Arithmetic>) -> Result<Step, RuntimeError> {
        if !is_value(&mut statement.left) {
            self.info("-- Focus: Arithmetic (left) --");
            return Ok(Step::Next(self.focus_arithmetic(statement, true)));
        }
        if !is_value(&mut statement.right) {
            self.info("-- Focus: Arithmetic (right) --");
            return Ok(Step::Next(self.focus_arithmetic(statement, false)));
        }
        match (&statement.left, &statement.right) {
            (Producer::Lit(left), Producer::Lit(right)) => {
                let result = arithmetic(statement.op, left.value, right.value);
                self.info("-- Reduce: Arithmetic --");
                let Arithmetic { after, .. } = *statement;
                Ok(Step::Next(Statement::cut(Producer::lit(result), after)))
            }
            // Ill-typed operands
            _ => Err(RuntimeError::stuck(Statement::Arith(statement))),
        }
    }

    fn step_ifz(&mut self, mut statement: Box<Ifz>) -> Result<Step, RuntimeError> {
        if !is_value(&mut statement.condition) {
            self.info("-- Focus: If-zero --");
            return Ok(Step::Next(self.focus_ifz(statement)));
        }
        match *statement {
            Ifz {
                condition: Producer::Lit(lit),
                if_zero,
                if_other,
            } => {
                if lit.value == 0 {
                    self.info("-- Reduce: If-zero (zero) --");
                    Ok(Step::Next(if_zero))
                } else {
                    self.info("-- Reduce: If-zero (other) --");
                    Ok(Step::Next(if_other))
                }
            }
            // Ill-typed condition
            other => Err(RuntimeError::stuck(Statement::Ifz(Box::new(other)))),
        }
    }

    fn step_cut(&mut self, statement: Box<Cut>) -> Result<Step, RuntimeError> {
        let Cut { producer, consumer } = *statement;
        // A μ on the left has the highest priority: it captures the
        // current continuation whatever it is
        let mut producer = match producer {
            Producer::Mu(mu) => {
                let Mu {
                    covar_id, mut body, ..
                } = *mu;
                let mut covars = CovarMap::new();
                covars.insert(covar_id, &consumer);
                body.replace(&VarMap::new(), &covars);
                self.info("-- Reduce: Mu --");
                return Ok(Step::Next(body));
            }
            producer => producer,
        };
        if !is_value(&mut producer) {
            // Not a μ, so the only focusable shape left is a constructor
            // with a non-value argument; a bare variable is stuck
            let mut ctor = match producer {
                Producer::Ctor(ctor) => ctor,
                producer => return Err(RuntimeError::stuck(Statement::cut(producer, consumer))),
            };
            let index = find_non_value(&mut ctor.args).expect("constructor is not a value");
            self.info(format!("-- Focus: Constructor {} ({}) --", ctor.name, index));
            let mu = self.focus_constructor(ctor, index);
            return Ok(Step::Next(Statement::cut(
                Producer::Mu(Box::new(mu)),
                consumer,
            )));
        }
        // The producer is a value, so a μ̃ on the right may bind it
        let consumer = match consumer {
            Consumer::MuTilde(mu) => {
                let MuTilde {
                    var_id, mut body, ..
                } = *mu;
                let mut vars = VarMap::new();
                vars.insert(var_id, &producer);
                body.replace(&vars, &CovarMap::new());
                self.info("-- Reduce: Mu' --");
                return Ok(Step::Next(body));
            }
            consumer => consumer,
        };
        match (producer, consumer) {
            (Producer::Ctor(ctor), Consumer::Case(mut case)) => {
                match eval_clauses(
                    ctor.abstraction_id,
                    &ctor.args,
                    &ctor.coargs,
                    &mut case.clauses,
                ) {
                    Some(body) => {
                        self.info(format!("-- Reduce: Case {} --", ctor.name));
                        Ok(Step::Next(body))
                    }
                    None => Err(RuntimeError::stuck(Statement::cut(
                        Producer::Ctor(ctor),
                        Consumer::Case(case),
                    ))),
                }
            }
            (Producer::Cocase(mut cocase), Consumer::Dtor(mut dtor)) => {
                if let Some(index) = find_non_value(&mut dtor.args) {
                    self.info(format!("-- Focus: Destructor {} ({}) --", dtor.name, index));
                    let mu = self.focus_destructor(dtor, index);
                    return Ok(Step::Next(Statement::cut(
                        Producer::Cocase(cocase),
                        Consumer::MuTilde(Box::new(mu)),
                    )));
                }
                match eval_clauses(
                    dtor.abstraction_id,
                    &dtor.args,
                    &dtor.coargs,
                    &mut cocase.clauses,
                ) {
                    Some(body) => {
                        self.info(format!("-- Reduce: Cocase {} --", dtor.name));
                        Ok(Step::Next(body))
                    }
                    None => Err(RuntimeError::stuck(Statement::cut(
                        Producer::Cocase(cocase),
                        Consumer::Dtor(dtor),
                    ))),
                }
            }
            (value, Consumer::End(_)) => {
                self.info("-- Finished! --");
                Ok(Step::Done(value))
            }
            // Mismatched cut
            (producer, consumer) => Err(RuntimeError::stuck(Statement::cut(producer, consumer))),
        }
    }

    fn step_call(&mut self, mut statement: Box<Call>) -> Result<Step, RuntimeError> {
        if let Some(index) = find_non_value(&mut statement.args) {
            self.info(format!("-- Focus: Call {} ({}) --", statement.name, index));
            return Ok(Step::Next(self.focus_call(statement, index)));
        }
        let definition = &self.definitions[statement.definition_id.0];
        debug_assert_eq!(definition.arg_ids.len(), statement.args.len());
        debug_assert_eq!(definition.coarg_ids.len(), statement.coargs.len());
        let vars: VarMap = definition
            .arg_ids
            .iter()
            .copied()
            .zip(&statement.args)
            .collect();
        let covars: CovarMap = definition
            .coarg_ids
            .iter()
            .copied()
            .zip(&statement.coargs)
            .collect();
        // The body is copied; the definition stays pristine for later calls
        let mut body = definition.body.clone();
        body.replace(&vars, &covars);
        self.info(format!("-- Reduce: Call {} --", statement.name));
        Ok(Step::Next(body))
    }

    fn info(&mut self, message: impl AsRef<str>) {
        if self.options.print_info {
            let _ = writeln!(self.stream, "{}", message.as_ref());
        }
    }

    fn print_options(&self, print_types: bool) -> PrintOptions {
        PrintOptions {
            ascii: !self.options.unicode,
            print_types,
        }
    }
}

/// Find the matching clause, bind the structor's (co)arguments to its
/// pattern (co)variables, and return the substituted body. `None` means no
/// clause matched, which the caller reports as a stuck state.
fn eval_clauses(
    abstraction_id: AbstractionId,
    args: &[Producer],
    coargs: &[Consumer],
    clauses: &mut Vec<Clause>,
) -> Option<Statement> {
    let index = clauses
        .iter()
        .position(|clause| clause.abstraction_id == abstraction_id)?;
    let Clause {
        arg_ids,
        coarg_ids,
        mut body,
        ..
    } = clauses.swap_remove(index);
    debug_assert_eq!(arg_ids.len(), args.len());
    debug_assert_eq!(coarg_ids.len(), coargs.len());
    let vars: VarMap = arg_ids.iter().copied().zip(args).collect();
    let covars: CovarMap = coarg_ids.iter().copied().zip(coargs).collect();
    body.replace(&vars, &covars);
    Some(body)
}

/// Whether a producer is a value: literals and cocases are, μ and variables
/// are not, and a constructor is iff all its arguments are. Constructor
/// results are memoised on the node.
pub fn is_value(producer: &mut Producer) -> bool {
    match producer {
        Producer::Lit(_) | Producer::Cocase(_) => true,
        Producer::Var(_) | Producer::Mu(_) => false,
        Producer::Ctor(ctor) => match ctor.is_value {
            Some(value) => value,
            None => {
                let value = ctor.args.iter_mut().all(is_value);
                ctor.is_value = Some(value);
                value
            }
        },
    }
}

/// Index of the first non-value argument, if any.
pub fn find_non_value(args: &mut [Producer]) -> Option<usize> {
    args.iter_mut().position(|arg| !is_value(arg))
}

/// Arithmetic on signed 64-bit integers, total on all inputs: addition,
/// subtraction and multiplication wrap; division by zero yields 1 and
/// modulo by zero yields the dividend.
pub(crate) fn arithmetic(op: ArithOp, left: i64, right: i64) -> i64 {
    match op {
        ArithOp::Add => left.wrapping_add(right),
        ArithOp::Sub => left.wrapping_sub(right),
        ArithOp::Mul => left.wrapping_mul(right),
        ArithOp::Div => {
            if right == 0 {
                1
            } else {
                left.wrapping_div(right)
            }
        }
        ArithOp::Mod => {
            if right == 0 {
                left
            } else {
                left.wrapping_rem(right)
            }
        }
    }
}
