//! Recursive-descent parser for the S-expression syntax.
//!
//! One `parse_*` method per syntax element; each can handle leading
//! whitespace and consumes its own closing delimiter. Branches are picked
//! from a single character of lookahead, falling back to a bounded word
//! peek to tell keywords (`mu`, `case`, `def`, ...) from names.
//!
//! Scoping happens here: every binder pushes onto a per-name stack and pops
//! on leaving its construct, so occurrences resolve to unique ids and
//! shadowing costs nothing at runtime. Structor applications are checked
//! against the declared arities, clause sets are checked for totality, and
//! definitions register themselves before their body is parsed so that
//! recursive calls resolve.

mod cursor;
mod error;

pub use cursor::Cursor;
pub use error::{ParseError, ParseErrorKind};

use std::collections::BTreeMap;

use crate::ast::{
    ArithOp, Arithmetic, Call, Case, Clause, Cocase, Constructor, Consumer, Covariable, CovarId,
    Cut, Definition, DefinitionId, Destructor, End, Ifz, Literal, Mu, MuTilde, Polarity, Producer,
    Program, Statement, VarId, Variable,
};
use crate::types::{builtin_structors, AbstractionId, TypingContext};

/// Names of syntax elements, used in diagnostics.
mod kind {
    pub const VARIABLE: &str = "variable";
    pub const VALUE: &str = "value";
    pub const MU: &str = "mu abstraction";
    pub const MU_TILDE: &str = "mu' abstraction";
    pub const CONSTRUCTOR: &str = "constructor";
    pub const COCASE: &str = "cocase expression";
    pub const COVARIABLE: &str = "covariable";
    pub const DESTRUCTOR: &str = "destructor";
    pub const CASE: &str = "case expression";
    pub const END: &str = "end of computation";
    pub const ARITHMETIC: &str = "arithmetic statement";
    pub const IFZ: &str = "if-zero statement";
    pub const CUT: &str = "cut statement";
    pub const CALL: &str = "call statement";
    pub const PRODUCER: &str = "producer";
    pub const CONSUMER: &str = "consumer";
    pub const STATEMENT: &str = "statement";
    pub const DEFINITION: &str = "definition";
    pub const DEF_OR_STMT: &str = "definition or statement";
    pub const CLAUSE: &str = "clause";
    pub const CASE_CLAUSE: &str = "case clause";
    pub const COCASE_CLAUSE: &str = "cocase clause";
    pub const PARAMETER: &str = "parameter";
    pub const COPARAMETER: &str = "coparameter";
    pub const ARGUMENT: &str = "argument";
    pub const COARGUMENT: &str = "coargument";
}

#[derive(Debug, Clone, Copy)]
struct ArityInfo {
    arity: usize,
    coarity: usize,
}

pub struct Parser<'c> {
    ctx: &'c mut TypingContext,
    /// Variables minted so far, for id generation.
    n_vars: usize,
    /// Covariables minted so far, for id generation.
    n_covars: usize,
    n_defs: usize,
    /// Stacks of active ids per variable name; the top shadows the rest.
    var_scope: BTreeMap<String, Vec<VarId>>,
    covar_scope: BTreeMap<String, Vec<CovarId>>,
    def_ids: BTreeMap<String, DefinitionId>,
    constructor_ids: BTreeMap<String, AbstractionId>,
    destructor_ids: BTreeMap<String, AbstractionId>,
    structor_arity: BTreeMap<AbstractionId, ArityInfo>,
    def_arity: BTreeMap<DefinitionId, ArityInfo>,
}

impl<'c> Parser<'c> {
    pub fn new(ctx: &'c mut TypingContext) -> Self {
        let mut parser = Parser {
            ctx,
            n_vars: 0,
            n_covars: 0,
            n_defs: 0,
            var_scope: BTreeMap::new(),
            covar_scope: BTreeMap::new(),
            def_ids: BTreeMap::new(),
            constructor_ids: BTreeMap::new(),
            destructor_ids: BTreeMap::new(),
            structor_arity: BTreeMap::new(),
            def_arity: BTreeMap::new(),
        };
        for builtin in builtin_structors() {
            parser.structor_arity.insert(
                builtin.id,
                ArityInfo {
                    arity: builtin.arity,
                    coarity: builtin.coarity,
                },
            );
            let table = match builtin.polarity {
                Polarity::Producer => &mut parser.constructor_ids,
                Polarity::Consumer => &mut parser.destructor_ids,
            };
            table.insert(builtin.name.to_string(), builtin.id);
        }
        parser
    }

    /// Number of variables minted so far; the interpreter continues the
    /// numbering from here when focusing.
    pub fn n_vars(&self) -> usize {
        self.n_vars
    }

    /// Number of covariables minted so far.
    pub fn n_covars(&self) -> usize {
        self.n_covars
    }

    pub fn parse_program(&mut self, cursor: &mut Cursor) -> Result<Program, ParseError> {
        let mut program = Program::default();
        cursor.skip_whitespace();
        while !cursor.at_eof() {
            if cursor.peek() == Some('[') {
                let cut = self.parse_cut(cursor)?;
                program.statements.push(Statement::Cut(Box::new(cut)));
                cursor.skip_whitespace();
                continue;
            }
            let save = *cursor;
            expect(cursor, '(', kind::DEF_OR_STMT, save.line())?;
            let word = cursor.peek_word(3);
            *cursor = save;
            if word == "def" {
                program.definitions.push(self.parse_definition(cursor)?);
            } else {
                program.statements.push(self.parse_statement(cursor)?);
            }
            cursor.skip_whitespace();
        }
        Ok(program)
    }

    pub fn parse_definition(&mut self, cursor: &mut Cursor) -> Result<Definition, ParseError> {
        cursor.skip_whitespace();
        let start_line = cursor.line();
        expect(cursor, '(', kind::DEFINITION, start_line)?;
        let keyword = cursor.read_word();
        if keyword != "def" {
            return Err(unexpected_keyword(cursor, start_line, kind::DEFINITION, &keyword));
        }
        let name = cursor.read_word();
        if name.is_empty() {
            return Err(ParseError::unexpected(
                cursor.line(),
                start_line,
                kind::DEFINITION,
                cursor.peek(),
            ));
        }
        if self.def_ids.contains_key(&name) {
            return Err(ParseError::invalid(
                cursor.line(),
                start_line,
                kind::DEFINITION,
                format!("Repeated definition of {name}"),
            ));
        }
        if name == "ifz" {
            // The only possible keyword conflict in statement position
            return Err(ParseError::invalid(
                cursor.line(),
                start_line,
                kind::DEFINITION,
                "ifz is a reserved name",
            ));
        }
        let definition_id = DefinitionId(self.n_defs);
        self.n_defs += 1;
        // Registered before the body so recursive calls resolve
        self.def_ids.insert(name.clone(), definition_id);
        let arg_names = self.parse_word_list(cursor, kind::PARAMETER)?;
        let coarg_names = self.parse_word_list(cursor, kind::COPARAMETER)?;
        let arg_ids: Vec<_> = arg_names.iter().map(|n| self.push_var(n)).collect();
        let coarg_ids: Vec<_> = coarg_names.iter().map(|n| self.push_covar(n)).collect();
        self.def_arity.insert(
            definition_id,
            ArityInfo {
                arity: arg_ids.len(),
                coarity: coarg_ids.len(),
            },
        );
        let abstraction_id = self.ctx.add_definition(&name, arg_ids.len(), coarg_ids.len());
        let body = self.parse_statement(cursor)?;
        for arg_name in &arg_names {
            self.pop_var(arg_name);
        }
        for coarg_name in &coarg_names {
            self.pop_covar(coarg_name);
        }
        expect(cursor, ')', kind::DEFINITION, start_line)?;
        Ok(Definition {
            abstraction_id,
            name,
            arg_names,
            coarg_names,
            arg_ids,
            coarg_ids,
            body,
        })
    }

    pub fn parse_statement(&mut self, cursor: &mut Cursor) -> Result<Statement, ParseError> {
        cursor.skip_whitespace();
        let start_line = cursor.line();
        if cursor.peek() == Some('[') {
            return Ok(Statement::Cut(Box::new(self.parse_cut(cursor)?)));
        }
        let save = *cursor;
        expect(cursor, '(', kind::STATEMENT, start_line)?;
        match cursor.peek() {
            Some(c) if ArithOp::from_symbol(c).is_some() => {
                *cursor = save;
                Ok(Statement::Arith(Box::new(self.parse_arithmetic(cursor)?)))
            }
            Some(c) if c.is_ascii_alphabetic() => {
                let word = cursor.peek_word(3);
                *cursor = save;
                if word == "ifz" {
                    Ok(Statement::Ifz(Box::new(self.parse_ifz(cursor)?)))
                } else {
                    Ok(Statement::Call(Box::new(self.parse_call(cursor)?)))
                }
            }
            other => Err(ParseError::unexpected(
                cursor.line(),
                start_line,
                kind::STATEMENT,
                other,
            )),
        }
    }

    pub fn parse_producer(&mut self, cursor: &mut Cursor) -> Result<Producer, ParseError> {
        cursor.skip_whitespace();
        let start_line = cursor.line();
        match cursor.peek() {
            Some(c) if c.is_ascii_alphabetic() => {
                return Ok(Producer::Var(self.parse_variable(cursor)?));
            }
            Some(c) if c.is_ascii_digit() || c == '-' => {
                return Ok(Producer::Lit(self.parse_literal(cursor)?));
            }
            _ => {}
        }
        let save = *cursor;
        expect(cursor, '(', kind::PRODUCER, start_line)?;
        let word = cursor.peek_word(6);
        *cursor = save;
        match word.as_str() {
            "mu" | "μ" => Ok(Producer::Mu(Box::new(self.parse_mu(cursor)?))),
            "cocase" => Ok(Producer::Cocase(Box::new(self.parse_cocase(cursor)?))),
            _ => Ok(Producer::Ctor(Box::new(self.parse_constructor(cursor)?))),
        }
    }

    pub fn parse_consumer(&mut self, cursor: &mut Cursor) -> Result<Consumer, ParseError> {
        cursor.skip_whitespace();
        let start_line = cursor.line();
        match cursor.peek() {
            Some(c) if c.is_ascii_alphabetic() => {
                return Ok(Consumer::Covar(self.parse_covariable(cursor)?));
            }
            Some('<') => return Ok(Consumer::End(self.parse_end(cursor)?)),
            _ => {}
        }
        let save = *cursor;
        expect(cursor, '(', kind::CONSUMER, start_line)?;
        let word = cursor.peek_word(5);
        *cursor = save;
        match word.as_str() {
            "mu'" | "μ'" => Ok(Consumer::MuTilde(Box::new(self.parse_mu_tilde(cursor)?))),
            "case" => Ok(Consumer::Case(Box::new(self.parse_case(cursor)?))),
            _ => Ok(Consumer::Dtor(Box::new(self.parse_destructor(cursor)?))),
        }
    }

    fn parse_variable(&mut self, cursor: &mut Cursor) -> Result<Variable, ParseError> {
        let name = cursor.read_word();
        if name.is_empty() {
            return Err(ParseError::unexpected(
                cursor.line(),
                cursor.line(),
                kind::VARIABLE,
                cursor.peek(),
            ));
        }
        match self.var_scope.get(&name).and_then(|stack| stack.last()) {
            Some(&var_id) => Ok(Variable {
                var_id,
                name,
                ty: None,
            }),
            None => Err(ParseError::unknown_name(
                cursor.line(),
                cursor.line(),
                kind::VARIABLE,
                kind::VARIABLE,
                name,
            )),
        }
    }

    fn parse_literal(&mut self, cursor: &mut Cursor) -> Result<Literal, ParseError> {
        let literal = cursor.read_word();
        if literal.is_empty() {
            return Err(ParseError::unexpected(
                cursor.line(),
                cursor.line(),
                kind::VALUE,
                cursor.peek(),
            ));
        }
        match literal.parse::<i64>() {
            Ok(value) => Ok(Literal { value, ty: None }),
            Err(_) => Err(ParseError::invalid(
                cursor.line(),
                cursor.line(),
                kind::VALUE,
                format!("invalid integer literal: {literal}"),
            )),
        }
    }

    fn parse_mu(&mut self, cursor: &mut Cursor) -> Result<Mu, ParseError> {
        cursor.skip_whitespace();
        let start_line = cursor.line();
        expect(cursor, '(', kind::MU, start_line)?;
        let keyword = cursor.read_word();
        if keyword != "mu" && keyword != "μ" {
            return Err(unexpected_keyword(cursor, start_line, kind::MU, &keyword));
        }
        let name = cursor.read_word();
        if name.is_empty() {
            return Err(ParseError::unexpected(
                cursor.line(),
                start_line,
                kind::MU,
                cursor.peek(),
            ));
        }
        let covar_id = self.push_covar(&name);
        let body = self.parse_statement(cursor)?;
        self.pop_covar(&name);
        expect(cursor, ')', kind::MU, start_line)?;
        Ok(Mu {
            covar_id,
            name,
            body,
            ty: None,
        })
    }

    fn parse_mu_tilde(&mut self, cursor: &mut Cursor) -> Result<MuTilde, ParseError> {
        cursor.skip_whitespace();
        let start_line = cursor.line();
        expect(cursor, '(', kind::MU_TILDE, start_line)?;
        let keyword = cursor.read_word();
        if keyword != "mu'" && keyword != "μ'" {
            return Err(unexpected_keyword(cursor, start_line, kind::MU_TILDE, &keyword));
        }
        let name = cursor.read_word();
        if name.is_empty() {
            return Err(ParseError::unexpected(
                cursor.line(),
                start_line,
                kind::MU_TILDE,
                cursor.peek(),
            ));
        }
        let var_id = self.push_var(&name);
        let body = self.parse_statement(cursor)?;
        self.pop_var(&name);
        expect(cursor, ')', kind::MU_TILDE, start_line)?;
        Ok(MuTilde {
            var_id,
            name,
            body,
            ty: None,
        })
    }

    fn parse_constructor(&mut self, cursor: &mut Cursor) -> Result<Constructor, ParseError> {
        let (abstraction_id, name, args, coargs) =
            self.parse_structor(cursor, Polarity::Producer)?;
        Ok(Constructor {
            abstraction_id,
            name,
            args,
            coargs,
            is_value: None,
            ty: None,
        })
    }

    fn parse_destructor(&mut self, cursor: &mut Cursor) -> Result<Destructor, ParseError> {
        let (abstraction_id, name, args, coargs) =
            self.parse_structor(cursor, Polarity::Consumer)?;
        Ok(Destructor {
            abstraction_id,
            name,
            args,
            coargs,
            ty: None,
        })
    }

    fn parse_covariable(&mut self, cursor: &mut Cursor) -> Result<Covariable, ParseError> {
        let name = cursor.read_word();
        if name.is_empty() {
            return Err(ParseError::unexpected(
                cursor.line(),
                cursor.line(),
                kind::COVARIABLE,
                cursor.peek(),
            ));
        }
        match self.covar_scope.get(&name).and_then(|stack| stack.last()) {
            Some(&covar_id) => Ok(Covariable {
                covar_id,
                name,
                ty: None,
            }),
            None => Err(ParseError::unknown_name(
                cursor.line(),
                cursor.line(),
                kind::COVARIABLE,
                kind::COVARIABLE,
                name,
            )),
        }
    }

    fn parse_end(&mut self, cursor: &mut Cursor) -> Result<End, ParseError> {
        cursor.skip_whitespace();
        let keyword = cursor.read_word();
        if keyword != "<END>" {
            return Err(unexpected_keyword(cursor, cursor.line(), kind::END, &keyword));
        }
        Ok(End { ty: None })
    }

    fn parse_cocase(&mut self, cursor: &mut Cursor) -> Result<Cocase, ParseError> {
        cursor.skip_whitespace();
        let start_line = cursor.line();
        expect(cursor, '(', kind::COCASE, start_line)?;
        let keyword = cursor.read_word();
        if keyword != "cocase" {
            return Err(unexpected_keyword(cursor, start_line, kind::COCASE, &keyword));
        }
        let clauses = self.parse_clauses(cursor, Polarity::Producer, start_line)?;
        expect(cursor, ')', kind::COCASE, start_line)?;
        Ok(Cocase { clauses, ty: None })
    }

    fn parse_case(&mut self, cursor: &mut Cursor) -> Result<Case, ParseError> {
        cursor.skip_whitespace();
        let start_line = cursor.line();
        expect(cursor, '(', kind::CASE, start_line)?;
        let keyword = cursor.read_word();
        if keyword != "case" {
            return Err(unexpected_keyword(cursor, start_line, kind::CASE, &keyword));
        }
        let clauses = self.parse_clauses(cursor, Polarity::Consumer, start_line)?;
        expect(cursor, ')', kind::CASE, start_line)?;
        Ok(Case { clauses, ty: None })
    }

    fn parse_arithmetic(&mut self, cursor: &mut Cursor) -> Result<Arithmetic, ParseError> {
        cursor.skip_whitespace();
        let start_line = cursor.line();
        expect(cursor, '(', kind::ARITHMETIC, start_line)?;
        let op = match cursor.bump() {
            Some(c) => ArithOp::from_symbol(c).ok_or_else(|| {
                ParseError::unexpected(cursor.line(), start_line, kind::ARITHMETIC, Some(c))
            })?,
            None => {
                return Err(ParseError::unexpected(
                    cursor.line(),
                    start_line,
                    kind::ARITHMETIC,
                    None,
                ));
            }
        };
        let left = self.parse_producer(cursor)?;
        let right = self.parse_producer(cursor)?;
        let after = self.parse_consumer(cursor)?;
        expect(cursor, ')', kind::ARITHMETIC, start_line)?;
        Ok(Arithmetic {
            op,
            left,
            right,
            after,
        })
    }

    fn parse_ifz(&mut self, cursor: &mut Cursor) -> Result<Ifz, ParseError> {
        cursor.skip_whitespace();
        let start_line = cursor.line();
        expect(cursor, '(', kind::IFZ, start_line)?;
        let keyword = cursor.read_word();
        if keyword != "ifz" {
            return Err(unexpected_keyword(cursor, start_line, kind::IFZ, &keyword));
        }
        let condition = self.parse_producer(cursor)?;
        let if_zero = self.parse_statement(cursor)?;
        let if_other = self.parse_statement(cursor)?;
        expect(cursor, ')', kind::IFZ, start_line)?;
        Ok(Ifz {
            condition,
            if_zero,
            if_other,
        })
    }

    fn parse_cut(&mut self, cursor: &mut Cursor) -> Result<Cut, ParseError> {
        cursor.skip_whitespace();
        let start_line = cursor.line();
        expect(cursor, '[', kind::CUT, start_line)?;
        let producer = self.parse_producer(cursor)?;
        let consumer = self.parse_consumer(cursor)?;
        expect(cursor, ']', kind::CUT, start_line)?;
        Ok(Cut { producer, consumer })
    }

    fn parse_call(&mut self, cursor: &mut Cursor) -> Result<Call, ParseError> {
        cursor.skip_whitespace();
        let start_line = cursor.line();
        expect(cursor, '(', kind::CALL, start_line)?;
        let name = cursor.read_word();
        if name.is_empty() {
            return Err(ParseError::unexpected(
                cursor.line(),
                start_line,
                kind::CALL,
                cursor.peek(),
            ));
        }
        let Some(&definition_id) = self.def_ids.get(&name) else {
            return Err(ParseError::unknown_name(
                cursor.line(),
                start_line,
                kind::CALL,
                kind::DEFINITION,
                name,
            ));
        };
        let info = self.def_arity[&definition_id];
        let args = self.parse_producer_list(cursor, kind::PRODUCER)?;
        let coargs = self.parse_consumer_list(cursor, kind::CONSUMER)?;
        if args.len() != info.arity {
            return Err(ParseError::arity_mismatch(
                cursor.line(),
                start_line,
                kind::CALL,
                name,
                Polarity::Producer,
                info.arity,
                args.len(),
            ));
        }
        if coargs.len() != info.coarity {
            return Err(ParseError::arity_mismatch(
                cursor.line(),
                start_line,
                kind::CALL,
                name,
                Polarity::Consumer,
                info.coarity,
                coargs.len(),
            ));
        }
        expect(cursor, ')', kind::CALL, start_line)?;
        Ok(Call {
            definition_id,
            name,
            args,
            coargs,
        })
    }

    /// Shared implementation of constructor and destructor applications.
    fn parse_structor(
        &mut self,
        cursor: &mut Cursor,
        polarity: Polarity,
    ) -> Result<(AbstractionId, String, Vec<Producer>, Vec<Consumer>), ParseError> {
        let structor_kind = match polarity {
            Polarity::Producer => kind::CONSTRUCTOR,
            Polarity::Consumer => kind::DESTRUCTOR,
        };
        cursor.skip_whitespace();
        let start_line = cursor.line();
        expect(cursor, '(', structor_kind, start_line)?;
        let name = cursor.read_word();
        if name.is_empty() {
            return Err(ParseError::unexpected(
                cursor.line(),
                start_line,
                structor_kind,
                cursor.peek(),
            ));
        }
        let table = match polarity {
            Polarity::Producer => &self.constructor_ids,
            Polarity::Consumer => &self.destructor_ids,
        };
        let Some(&structor_id) = table.get(&name) else {
            return Err(ParseError::unknown_name(
                cursor.line(),
                start_line,
                structor_kind,
                structor_kind,
                name,
            ));
        };
        let info = self.structor_arity[&structor_id];
        let args = if info.arity > 0 {
            self.parse_producer_list(cursor, kind::ARGUMENT)?
        } else {
            Vec::new()
        };
        if args.len() != info.arity {
            return Err(ParseError::arity_mismatch(
                cursor.line(),
                start_line,
                structor_kind,
                name,
                Polarity::Producer,
                info.arity,
                args.len(),
            ));
        }
        let coargs = if info.coarity > 0 {
            self.parse_consumer_list(cursor, kind::COARGUMENT)?
        } else {
            Vec::new()
        };
        if coargs.len() != info.coarity {
            return Err(ParseError::arity_mismatch(
                cursor.line(),
                start_line,
                structor_kind,
                name,
                Polarity::Consumer,
                info.coarity,
                coargs.len(),
            ));
        }
        expect(cursor, ')', structor_kind, start_line)?;
        Ok((structor_id, name, args, coargs))
    }

    /// Shared implementation of case and cocase clauses. Cocase clauses
    /// match destructors, case clauses match constructors.
    fn parse_clause(&mut self, cursor: &mut Cursor, polarity: Polarity) -> Result<Clause, ParseError> {
        let clause_kind = match polarity {
            Polarity::Producer => kind::COCASE_CLAUSE,
            Polarity::Consumer => kind::CASE_CLAUSE,
        };
        let structor_kind = match polarity {
            Polarity::Producer => kind::DESTRUCTOR,
            Polarity::Consumer => kind::CONSTRUCTOR,
        };
        cursor.skip_whitespace();
        let start_line = cursor.line();
        expect(cursor, '(', clause_kind, start_line)?;
        let name = cursor.read_word();
        if name.is_empty() {
            return Err(ParseError::unexpected(
                cursor.line(),
                start_line,
                clause_kind,
                cursor.peek(),
            ));
        }
        let table = match polarity {
            Polarity::Producer => &self.destructor_ids,
            Polarity::Consumer => &self.constructor_ids,
        };
        let Some(&structor_id) = table.get(&name) else {
            return Err(ParseError::unknown_name(
                cursor.line(),
                start_line,
                clause_kind,
                structor_kind,
                name,
            ));
        };
        let info = self.structor_arity[&structor_id];
        let arg_names = if info.arity > 0 {
            self.parse_word_list(cursor, kind::PARAMETER)?
        } else {
            Vec::new()
        };
        if arg_names.len() != info.arity {
            return Err(ParseError::arity_mismatch(
                cursor.line(),
                start_line,
                clause_kind,
                name,
                Polarity::Producer,
                info.arity,
                arg_names.len(),
            ));
        }
        let coarg_names = if info.coarity > 0 {
            self.parse_word_list(cursor, kind::COPARAMETER)?
        } else {
            Vec::new()
        };
        if coarg_names.len() != info.coarity {
            return Err(ParseError::arity_mismatch(
                cursor.line(),
                start_line,
                clause_kind,
                name,
                Polarity::Consumer,
                info.coarity,
                coarg_names.len(),
            ));
        }
        let arg_ids: Vec<_> = arg_names.iter().map(|n| self.push_var(n)).collect();
        let coarg_ids: Vec<_> = coarg_names.iter().map(|n| self.push_covar(n)).collect();
        let body = self.parse_statement(cursor)?;
        for arg_name in &arg_names {
            self.pop_var(arg_name);
        }
        for coarg_name in &coarg_names {
            self.pop_covar(coarg_name);
        }
        expect(cursor, ')', kind::CLAUSE, start_line)?;
        Ok(Clause {
            abstraction_id: structor_id,
            name,
            arg_names,
            coarg_names,
            arg_ids,
            coarg_ids,
            body,
        })
    }

    /// Parse a clause list and check it is exactly the structor set of one
    /// type: no duplicates, nothing missing, no cross-type mixing.
    fn parse_clauses(
        &mut self,
        cursor: &mut Cursor,
        polarity: Polarity,
        start_line: usize,
    ) -> Result<Vec<Clause>, ParseError> {
        let clause_kind = match polarity {
            Polarity::Producer => kind::COCASE_CLAUSE,
            Polarity::Consumer => kind::CASE_CLAUSE,
        };
        let expression_kind = match polarity {
            Polarity::Producer => kind::COCASE,
            Polarity::Consumer => kind::CASE,
        };
        let clauses = self.parse_list(cursor, clause_kind, |parser, cursor| {
            parser.parse_clause(cursor, polarity)
        })?;
        if clauses.is_empty() {
            return Err(ParseError::invalid(
                cursor.line(),
                start_line,
                expression_kind,
                "empty clause list",
            ));
        }
        let mut expected = self.ctx.structors_like(clauses[0].abstraction_id).clone();
        for clause in &clauses {
            if !expected.remove(&clause.abstraction_id) {
                return Err(ParseError::invalid(
                    cursor.line(),
                    start_line,
                    expression_kind,
                    format!("Duplicate or mismatched structor: {}", clause.name),
                ));
            }
        }
        if !expected.is_empty() {
            return Err(ParseError::invalid(
                cursor.line(),
                start_line,
                expression_kind,
                "incomplete clause list",
            ));
        }
        Ok(clauses)
    }

    fn parse_list<'a, T>(
        &mut self,
        cursor: &mut Cursor<'a>,
        list_kind: &str,
        mut item: impl FnMut(&mut Self, &mut Cursor<'a>) -> Result<T, ParseError>,
    ) -> Result<Vec<T>, ParseError> {
        cursor.skip_whitespace();
        let start_line = cursor.line();
        match cursor.bump() {
            Some('(') => {}
            other => {
                return Err(ParseError::unexpected(
                    cursor.line(),
                    start_line,
                    format!("{list_kind} list"),
                    other,
                ));
            }
        }
        let mut items = Vec::new();
        loop {
            cursor.skip_whitespace();
            match cursor.peek() {
                Some(')') => {
                    cursor.bump();
                    break;
                }
                None => {
                    return Err(ParseError::unexpected(
                        cursor.line(),
                        start_line,
                        format!("{list_kind} list"),
                        None,
                    ));
                }
                _ => items.push(item(self, cursor)?),
            }
        }
        Ok(items)
    }

    fn parse_producer_list<'a>(
        &mut self,
        cursor: &mut Cursor<'a>,
        list_kind: &str,
    ) -> Result<Vec<Producer>, ParseError> {
        self.parse_list(cursor, list_kind, |parser, cursor| {
            parser.parse_producer(cursor)
        })
    }

    fn parse_consumer_list<'a>(
        &mut self,
        cursor: &mut Cursor<'a>,
        list_kind: &str,
    ) -> Result<Vec<Consumer>, ParseError> {
        self.parse_list(cursor, list_kind, |parser, cursor| {
            parser.parse_consumer(cursor)
        })
    }

    fn parse_word_list<'a>(
        &mut self,
        cursor: &mut Cursor<'a>,
        list_kind: &str,
    ) -> Result<Vec<String>, ParseError> {
        self.parse_list(cursor, list_kind, |_, cursor| {
            let word = cursor.read_word();
            if word.is_empty() {
                Err(ParseError::unexpected(
                    cursor.line(),
                    cursor.line(),
                    list_kind,
                    cursor.peek(),
                ))
            } else {
                Ok(word)
            }
        })
    }

    fn push_var(&mut self, name: &str) -> VarId {
        let id = VarId(self.n_vars);
        self.n_vars += 1;
        self.var_scope.entry(name.to_string()).or_default().push(id);
        id
    }

    fn pop_var(&mut self, name: &str) {
        let stack = self.var_scope.get_mut(name).expect("popping unbound variable");
        stack.pop();
    }

    fn push_covar(&mut self, name: &str) -> CovarId {
        let id = CovarId(self.n_covars);
        self.n_covars += 1;
        self.covar_scope
            .entry(name.to_string())
            .or_default()
            .push(id);
        id
    }

    fn pop_covar(&mut self, name: &str) {
        let stack = self
            .covar_scope
            .get_mut(name)
            .expect("popping unbound covariable");
        stack.pop();
    }
}

fn expect(
    cursor: &mut Cursor,
    expected: char,
    context: &str,
    start_line: usize,
) -> Result<(), ParseError> {
    match cursor.bump() {
        Some(c) if c == expected => Ok(()),
        other => Err(ParseError::unexpected(
            cursor.line(),
            start_line,
            context,
            other,
        )),
    }
}

/// An expected keyword was something else: blame its first character, or
/// the lookahead if the word was empty.
fn unexpected_keyword(
    cursor: &Cursor,
    start_line: usize,
    context: &str,
    keyword: &str,
) -> ParseError {
    let cause = keyword.chars().next().or_else(|| cursor.peek());
    ParseError::unexpected(cursor.line(), start_line, context, cause)
}
