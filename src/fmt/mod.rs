//! Printer for syntax trees and types.
//!
//! Output is the concrete syntax the parser accepts, so printing a parsed
//! program and reparsing it yields the same printed form again. The
//! `Display` impls use the default options (ASCII keywords, no types) and
//! back all error messages; the [`Printer`] itself is for the trace output,
//! where μ spellings and type annotations are configurable.

use std::fmt::{self, Write};

use crate::ast::{
    Arithmetic, Call, Case, Clause, Cocase, Constructor, Consumer, Cut, Definition, Destructor,
    Ifz, Literal, Mu, MuTilde, Producer, Program, Statement, Variable,
};
use crate::types::{TypeHandle, TypeTerm, TypingContext};

#[derive(Debug, Clone, Copy)]
pub struct PrintOptions {
    /// Use `mu`/`mu'` instead of `μ`/`μ'`.
    pub ascii: bool,
    /// Print `: <type>` after typed syntax elements.
    pub print_types: bool,
}

impl Default for PrintOptions {
    fn default() -> Self {
        PrintOptions {
            ascii: true,
            print_types: false,
        }
    }
}

pub struct Printer<'a> {
    options: PrintOptions,
    ctx: Option<&'a TypingContext>,
    out: String,
}

impl<'a> Printer<'a> {
    pub fn new(options: PrintOptions, ctx: Option<&'a TypingContext>) -> Self {
        Printer {
            options,
            ctx,
            out: String::new(),
        }
    }

    pub fn finish(self) -> String {
        self.out
    }

    pub fn program(&mut self, program: &Program) {
        for definition in &program.definitions {
            self.definition(definition);
            self.out.push('\n');
        }
        for statement in &program.statements {
            self.statement(statement);
            self.out.push('\n');
        }
    }

    pub fn definition(&mut self, definition: &Definition) {
        self.out.push_str("(def ");
        self.out.push_str(&definition.name);
        self.out.push(' ');
        self.word_list(&definition.arg_names);
        self.out.push(' ');
        self.word_list(&definition.coarg_names);
        self.out.push(' ');
        self.statement(&definition.body);
        self.out.push(')');
    }

    pub fn producer(&mut self, producer: &Producer) {
        match producer {
            Producer::Var(var) => self.variable(var),
            Producer::Lit(lit) => self.literal(lit),
            Producer::Mu(mu) => self.mu(mu),
            Producer::Ctor(ctor) => self.constructor(ctor),
            Producer::Cocase(cocase) => self.cocase(cocase),
        }
    }

    pub fn consumer(&mut self, consumer: &Consumer) {
        match consumer {
            Consumer::Covar(covar) => {
                self.out.push_str(&covar.name);
                self.maybe_type(covar.ty);
            }
            Consumer::MuTilde(mu) => self.mu_tilde(mu),
            Consumer::Dtor(dtor) => self.destructor(dtor),
            Consumer::Case(case) => self.case(case),
            Consumer::End(end) => {
                self.out.push_str("<END>");
                self.maybe_type(end.ty);
            }
        }
    }

    pub fn statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Arith(arith) => self.arithmetic(arith),
            Statement::Ifz(ifz) => self.ifz(ifz),
            Statement::Cut(cut) => self.cut(cut),
            Statement::Call(call) => self.call(call),
        }
    }

    pub fn variable(&mut self, var: &Variable) {
        self.out.push_str(&var.name);
        self.maybe_type(var.ty);
    }

    pub fn literal(&mut self, lit: &Literal) {
        let _ = write!(self.out, "{}", lit.value);
        self.maybe_type(lit.ty);
    }

    pub fn mu(&mut self, mu: &Mu) {
        self.out.push('(');
        self.out.push_str(if self.options.ascii { "mu" } else { "μ" });
        self.out.push(' ');
        self.out.push_str(&mu.name);
        self.out.push(' ');
        self.statement(&mu.body);
        self.out.push(')');
        self.maybe_type(mu.ty);
    }

    pub fn constructor(&mut self, ctor: &Constructor) {
        self.out.push('(');
        self.out.push_str(&ctor.name);
        if !ctor.args.is_empty() {
            self.out.push(' ');
            self.producer_list(&ctor.args);
        }
        if !ctor.coargs.is_empty() {
            self.out.push(' ');
            self.consumer_list(&ctor.coargs);
        }
        self.out.push(')');
        self.maybe_type(ctor.ty);
    }

    pub fn cocase(&mut self, cocase: &Cocase) {
        self.out.push_str("(cocase ");
        self.clause_list(&cocase.clauses);
        self.out.push(')');
        self.maybe_type(cocase.ty);
    }

    pub fn mu_tilde(&mut self, mu: &MuTilde) {
        self.out.push('(');
        self.out.push_str(if self.options.ascii { "mu'" } else { "μ'" });
        self.out.push(' ');
        self.out.push_str(&mu.name);
        self.out.push(' ');
        self.statement(&mu.body);
        self.out.push(')');
        self.maybe_type(mu.ty);
    }

    pub fn destructor(&mut self, dtor: &Destructor) {
        self.out.push('(');
        self.out.push_str(&dtor.name);
        if !dtor.args.is_empty() {
            self.out.push(' ');
            self.producer_list(&dtor.args);
        }
        if !dtor.coargs.is_empty() {
            self.out.push(' ');
            self.consumer_list(&dtor.coargs);
        }
        self.out.push(')');
        self.maybe_type(dtor.ty);
    }

    pub fn case(&mut self, case: &Case) {
        self.out.push_str("(case ");
        self.clause_list(&case.clauses);
        self.out.push(')');
        self.maybe_type(case.ty);
    }

    pub fn clause(&mut self, clause: &Clause) {
        self.out.push('(');
        self.out.push_str(&clause.name);
        if !clause.arg_names.is_empty() {
            self.out.push(' ');
            self.word_list(&clause.arg_names);
        }
        if !clause.coarg_names.is_empty() {
            self.out.push(' ');
            self.word_list(&clause.coarg_names);
        }
        self.out.push(' ');
        self.statement(&clause.body);
        self.out.push(')');
    }

    pub fn arithmetic(&mut self, arith: &Arithmetic) {
        self.out.push('(');
        self.out.push(arith.op.symbol());
        self.out.push(' ');
        self.producer(&arith.left);
        self.out.push(' ');
        self.producer(&arith.right);
        self.out.push(' ');
        self.consumer(&arith.after);
        self.out.push(')');
    }

    pub fn ifz(&mut self, ifz: &Ifz) {
        self.out.push_str("(ifz ");
        self.producer(&ifz.condition);
        self.out.push(' ');
        self.statement(&ifz.if_zero);
        self.out.push(' ');
        self.statement(&ifz.if_other);
        self.out.push(')');
    }

    pub fn cut(&mut self, cut: &Cut) {
        self.out.push('[');
        self.producer(&cut.producer);
        self.out.push(' ');
        self.consumer(&cut.consumer);
        self.out.push(']');
    }

    pub fn call(&mut self, call: &Call) {
        self.out.push('(');
        self.out.push_str(&call.name);
        self.out.push(' ');
        self.producer_list(&call.args);
        self.out.push(' ');
        self.consumer_list(&call.coargs);
        self.out.push(')');
    }

    pub fn type_handle(&mut self, handle: TypeHandle) {
        let Some(ctx) = self.ctx else {
            let _ = write!(self.out, "<UNKNOWN TYPE: {}>", handle.0);
            return;
        };
        match ctx.type_term(handle) {
            TypeTerm::Var(id) => {
                let _ = write!(self.out, "?{id}");
            }
            TypeTerm::Concrete { id, params } => {
                if params.is_empty() {
                    self.out.push_str(ctx.type_name(*id));
                } else {
                    self.out.push('(');
                    self.out.push_str(ctx.type_name(*id));
                    for &param in params {
                        self.out.push(' ');
                        self.type_handle(param);
                    }
                    self.out.push(')');
                }
            }
            TypeTerm::Forward(_) => unreachable!("type_term resolves forwards"),
        }
    }

    fn maybe_type(&mut self, ty: Option<TypeHandle>) {
        if !self.options.print_types {
            return;
        }
        if let Some(ty) = ty {
            self.out.push_str(": ");
            self.type_handle(ty);
        }
    }

    fn list<T>(&mut self, items: &[T], mut each: impl FnMut(&mut Self, &T)) {
        self.out.push('(');
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.out.push(' ');
            }
            each(self, item);
        }
        self.out.push(')');
    }

    fn word_list(&mut self, words: &[String]) {
        self.list(words, |p, word| p.out.push_str(word));
    }

    fn producer_list(&mut self, producers: &[Producer]) {
        self.list(producers, |p, producer| p.producer(producer));
    }

    fn consumer_list(&mut self, consumers: &[Consumer]) {
        self.list(consumers, |p, consumer| p.consumer(consumer));
    }

    fn clause_list(&mut self, clauses: &[Clause]) {
        self.list(clauses, |p, clause| p.clause(clause));
    }
}

pub fn program_to_string(
    program: &Program,
    options: PrintOptions,
    ctx: Option<&TypingContext>,
) -> String {
    let mut printer = Printer::new(options, ctx);
    printer.program(program);
    printer.finish()
}

pub fn statement_to_string(
    statement: &Statement,
    options: PrintOptions,
    ctx: Option<&TypingContext>,
) -> String {
    let mut printer = Printer::new(options, ctx);
    printer.statement(statement);
    printer.finish()
}

pub fn producer_to_string(
    producer: &Producer,
    options: PrintOptions,
    ctx: Option<&TypingContext>,
) -> String {
    let mut printer = Printer::new(options, ctx);
    printer.producer(producer);
    printer.finish()
}

pub fn definition_to_string(
    definition: &Definition,
    options: PrintOptions,
    ctx: Option<&TypingContext>,
) -> String {
    let mut printer = Printer::new(options, ctx);
    printer.definition(definition);
    printer.finish()
}

pub fn type_to_string(handle: TypeHandle, ctx: &TypingContext) -> String {
    let mut printer = Printer::new(PrintOptions::default(), Some(ctx));
    printer.type_handle(handle);
    printer.finish()
}

macro_rules! display_via_printer {
    ($ty:ty, $method:ident) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let mut printer = Printer::new(PrintOptions::default(), None);
                printer.$method(self);
                f.write_str(&printer.finish())
            }
        }
    };
}

display_via_printer!(Program, program);
display_via_printer!(Definition, definition);
display_via_printer!(Producer, producer);
display_via_printer!(Consumer, consumer);
display_via_printer!(Statement, statement);
display_via_printer!(Clause, clause);
display_via_printer!(Mu, mu);
display_via_printer!(MuTilde, mu_tilde);
display_via_printer!(Constructor, constructor);
display_via_printer!(Destructor, destructor);
display_via_printer!(Call, call);
