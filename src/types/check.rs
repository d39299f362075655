//! The typer: checks every node of a program against an expected type,
//! threading all constraints through the typing context's unifier.
//!
//! Top-level definitions are checked against their own mutable prototype
//! signature, so inference constrains the signature in place and call sites
//! elsewhere instantiate the generalised result. A call to the definition
//! currently under check reuses the prototype instead of a fresh instance,
//! which keeps recursion monomorphic.

use std::collections::BTreeMap;

use crate::ast::{Clause, Consumer, CovarId, Definition, Producer, Program, Statement, VarId};

use super::context::TypingContext;
use super::error::{TypeErrors, TypingError};
use super::ty::{AbstractionId, TypeHandle, TypeId};

pub struct Typer<'c> {
    ctx: &'c mut TypingContext,
    int_type: TypeHandle,
    var_types: BTreeMap<VarId, TypeHandle>,
    covar_types: BTreeMap<CovarId, TypeHandle>,
    /// Abstraction ids of the program's definitions, indexed by definition id.
    def_abstractions: Vec<AbstractionId>,
    current_definition: Option<AbstractionId>,
}

/// Typecheck a whole program, collecting one error per failing top-level
/// item.
pub fn type_program(program: &mut Program, ctx: &mut TypingContext) -> Result<(), TypeErrors> {
    let mut typer = Typer::new(ctx, &program.definitions);
    let mut errors = Vec::new();
    for definition in &mut program.definitions {
        if let Err(error) = typer.check_definition(definition) {
            errors.push(error);
        }
    }
    for statement in &mut program.statements {
        if let Err(error) = typer.check_statement(statement) {
            errors.push(error);
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(TypeErrors(errors))
    }
}

impl<'c> Typer<'c> {
    pub fn new(ctx: &'c mut TypingContext, definitions: &[Definition]) -> Self {
        let int_type = ctx.primitive_prototype(TypeId::INTEGER);
        Typer {
            ctx,
            int_type,
            var_types: BTreeMap::new(),
            covar_types: BTreeMap::new(),
            def_abstractions: definitions.iter().map(|d| d.abstraction_id).collect(),
            current_definition: None,
        }
    }

    pub fn check_definition(&mut self, definition: &mut Definition) -> Result<(), TypingError> {
        for &arg in &definition.arg_ids {
            self.fresh_var(arg);
        }
        for &coarg in &definition.coarg_ids {
            self.fresh_covar(coarg);
        }
        let abstraction = self.ctx.abstraction(definition.abstraction_id);
        debug_assert!(abstraction.result.is_none());
        debug_assert_eq!(abstraction.args.len(), definition.arg_ids.len());
        debug_assert_eq!(abstraction.coargs.len(), definition.coarg_ids.len());
        let args = abstraction.args.clone();
        let coargs = abstraction.coargs.clone();
        // Recursive calls in the body must see the prototype signature
        self.current_definition = Some(definition.abstraction_id);
        // Tie the parameter types to the signature. These cannot fail on
        // their own (the parameter variables are fresh), but inference
        // inside the body constrains them further.
        for (i, &arg_id) in definition.arg_ids.iter().enumerate() {
            let ty = self.var_types[&arg_id];
            self.try_unify(ty, args[i], || definition.to_string())?;
        }
        for (i, &coarg_id) in definition.coarg_ids.iter().enumerate() {
            let ty = self.covar_types[&coarg_id];
            self.try_unify(ty, coargs[i], || definition.to_string())?;
        }
        self.check_statement(&mut definition.body)?;
        self.current_definition = None;
        Ok(())
    }

    pub fn check_statement(&mut self, statement: &mut Statement) -> Result<(), TypingError> {
        match statement {
            Statement::Arith(arith) => {
                // Operands and continuation are all integers
                let int_type = self.int_type;
                self.check_producer(&mut arith.left, int_type)?;
                self.check_producer(&mut arith.right, int_type)?;
                self.check_consumer(&mut arith.after, int_type)
            }
            Statement::Ifz(ifz) => {
                let int_type = self.int_type;
                self.check_producer(&mut ifz.condition, int_type)?;
                self.check_statement(&mut ifz.if_zero)?;
                self.check_statement(&mut ifz.if_other)
            }
            Statement::Cut(cut) => {
                // Producer and consumer must agree on some type
                let cut_type = self.ctx.fresh_type_variable();
                self.check_producer(&mut cut.producer, cut_type)?;
                self.check_consumer(&mut cut.consumer, cut_type)
            }
            Statement::Call(call) => {
                let abstraction_id = self.def_abstractions[call.definition_id.0];
                let item = call.to_string();
                self.check_abstraction(abstraction_id, &mut call.args, &mut call.coargs, None, item)
                    .map(|_| ())
            }
        }
    }

    fn check_producer(&mut self, producer: &mut Producer, expected: TypeHandle) -> Result<(), TypingError> {
        match producer {
            Producer::Var(var) => {
                // All occurrences of a variable share its binder's type
                let ty = self.var_types[&var.var_id];
                self.try_unify(expected, ty, || var.name.clone())?;
                var.ty = Some(ty);
                Ok(())
            }
            Producer::Lit(lit) => {
                let int_type = self.int_type;
                self.try_unify(expected, int_type, || lit.value.to_string())?;
                lit.ty = Some(int_type);
                Ok(())
            }
            Producer::Mu(mu) => {
                self.fresh_covar(mu.covar_id);
                let ty = self.covar_types[&mu.covar_id];
                // Cannot fail, the covariable's type is fresh
                self.try_unify(expected, ty, || mu.to_string())?;
                self.check_statement(&mut mu.body)?;
                mu.ty = Some(ty);
                Ok(())
            }
            Producer::Ctor(ctor) => {
                let item = ctor.to_string();
                let result = self.check_abstraction(
                    ctor.abstraction_id,
                    &mut ctor.args,
                    &mut ctor.coargs,
                    Some(expected),
                    item,
                )?;
                ctor.ty = result;
                Ok(())
            }
            Producer::Cocase(cocase) => {
                for clause in &mut cocase.clauses {
                    self.check_clause(clause, expected)?;
                }
                Ok(())
            }
        }
    }

    fn check_consumer(&mut self, consumer: &mut Consumer, expected: TypeHandle) -> Result<(), TypingError> {
        match consumer {
            Consumer::Covar(covar) => {
                let ty = self.covar_types[&covar.covar_id];
                self.try_unify(expected, ty, || covar.name.clone())?;
                covar.ty = Some(ty);
                Ok(())
            }
            Consumer::MuTilde(mu) => {
                self.fresh_var(mu.var_id);
                let ty = self.var_types[&mu.var_id];
                // Cannot fail, the variable's type is fresh
                self.try_unify(expected, ty, || mu.to_string())?;
                self.check_statement(&mut mu.body)?;
                mu.ty = Some(ty);
                Ok(())
            }
            Consumer::Dtor(dtor) => {
                let item = dtor.to_string();
                let result = self.check_abstraction(
                    dtor.abstraction_id,
                    &mut dtor.args,
                    &mut dtor.coargs,
                    Some(expected),
                    item,
                )?;
                dtor.ty = result;
                Ok(())
            }
            Consumer::Case(case) => {
                for clause in &mut case.clauses {
                    self.check_clause(clause, expected)?;
                }
                Ok(())
            }
            Consumer::End(end) => {
                // The end of computation accepts any type
                end.ty = Some(expected);
                Ok(())
            }
        }
    }

    fn check_clause(&mut self, clause: &mut Clause, expected: TypeHandle) -> Result<(), TypingError> {
        for &arg in &clause.arg_ids {
            self.fresh_var(arg);
        }
        for &coarg in &clause.coarg_ids {
            self.fresh_covar(coarg);
        }
        let instance = self.ctx.instantiate(clause.abstraction_id);
        let result = instance.result.expect("structors have a result type");
        debug_assert_eq!(instance.args.len(), clause.arg_ids.len());
        debug_assert_eq!(instance.coargs.len(), clause.coarg_ids.len());
        // Totality was checked in the parser, but the clauses can still
        // disagree on type parameters
        self.try_unify(expected, result, || clause.to_string())?;
        // Bind the pattern's (co)variables to the structor's (co)arg types
        for (i, &arg_id) in clause.arg_ids.iter().enumerate() {
            let ty = self.var_types[&arg_id];
            self.try_unify(ty, instance.args[i], || clause.to_string())?;
        }
        for (i, &coarg_id) in clause.coarg_ids.iter().enumerate() {
            let ty = self.covar_types[&coarg_id];
            self.try_unify(ty, instance.coargs[i], || clause.to_string())?;
        }
        self.check_statement(&mut clause.body)
    }

    /// Check a structor application or definition call against an
    /// instantiated signature, and return the instance's result type.
    fn check_abstraction(
        &mut self,
        id: AbstractionId,
        args: &mut [Producer],
        coargs: &mut [Consumer],
        expected: Option<TypeHandle>,
        item: String,
    ) -> Result<Option<TypeHandle>, TypingError> {
        let instance = if self.current_definition == Some(id) {
            // Recursive call: no generalisation of the signature under check
            self.ctx.abstraction_prototype(id)
        } else {
            self.ctx.instantiate(id)
        };
        debug_assert_eq!(instance.result.is_some(), expected.is_some());
        // Arity mismatches were caught in the parser
        debug_assert_eq!(instance.args.len(), args.len());
        debug_assert_eq!(instance.coargs.len(), coargs.len());
        for (arg, &arg_ty) in args.iter_mut().zip(&instance.args) {
            self.check_producer(arg, arg_ty)?;
        }
        for (coarg, &coarg_ty) in coargs.iter_mut().zip(&instance.coargs) {
            self.check_consumer(coarg, coarg_ty)?;
        }
        if let (Some(expected), Some(result)) = (expected, instance.result) {
            self.try_unify(expected, result, move || item)?;
        }
        Ok(instance.result)
    }

    fn fresh_var(&mut self, id: VarId) {
        let ty = self.ctx.fresh_type_variable();
        let previous = self.var_types.insert(id, ty);
        assert!(previous.is_none(), "variable bound twice");
    }

    fn fresh_covar(&mut self, id: CovarId) {
        let ty = self.ctx.fresh_type_variable();
        let previous = self.covar_types.insert(id, ty);
        assert!(previous.is_none(), "covariable bound twice");
    }

    fn try_unify(
        &mut self,
        a: TypeHandle,
        b: TypeHandle,
        item: impl FnOnce() -> String,
    ) -> Result<(), TypingError> {
        self.ctx.unify(a, b).map_err(|cause| TypingError {
            item: item(),
            detail: cause.describe(self.ctx),
        })
    }
}
