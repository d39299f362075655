//! Focusing: rewriting a statement so its first non-value subterm gets
//! evaluated before the statement itself.
//!
//! The chosen subterm is replaced by a fresh variable and bound outside:
//! `C[p]` becomes `[p (mu' x. C[x])]`. Constructors additionally wrap the
//! rebuilt cut in a μ abstraction so the surrounding consumer is captured,
//! and destructors symmetrically in a μ̃. Fresh variables are named
//! `_<structor-or-op>_<index>` to keep traces readable.

use std::io::Write;
use std::mem;

use crate::ast::{
    Arithmetic, Call, Constructor, Consumer, CovarId, Destructor, Ifz, Mu, MuTilde, Producer,
    Statement, VarId,
};

use super::Interpreter;

const FOCUS_ARITH_LEFT: &str = "_ar_l";
const FOCUS_ARITH_RIGHT: &str = "_ar_r";
const FOCUS_IFZ: &str = "_ifz";

impl<W: Write> Interpreter<'_, W> {
    pub(super) fn fresh_var_id(&mut self) -> VarId {
        let id = VarId(self.n_vars);
        self.n_vars += 1;
        id
    }

    pub(super) fn fresh_covar_id(&mut self) -> CovarId {
        let id = CovarId(self.n_covars);
        self.n_covars += 1;
        id
    }

    pub(super) fn focus_arithmetic(
        &mut self,
        mut statement: Box<Arithmetic>,
        focus_left: bool,
    ) -> Statement {
        let var_name = if focus_left {
            FOCUS_ARITH_LEFT
        } else {
            FOCUS_ARITH_RIGHT
        };
        let var_id = self.fresh_var_id();
        let slot = if focus_left {
            &mut statement.left
        } else {
            &mut statement.right
        };
        let non_value = mem::replace(slot, Producer::var(var_id, var_name));
        focus_statement(
            Statement::Arith(statement),
            non_value,
            var_id,
            var_name.to_string(),
        )
    }

    pub(super) fn focus_ifz(&mut self, mut statement: Box<Ifz>) -> Statement {
        let var_id = self.fresh_var_id();
        let non_value = mem::replace(&mut statement.condition, Producer::var(var_id, FOCUS_IFZ));
        focus_statement(
            Statement::Ifz(statement),
            non_value,
            var_id,
            FOCUS_IFZ.to_string(),
        )
    }

    pub(super) fn focus_call(&mut self, mut statement: Box<Call>, index: usize) -> Statement {
        let var_name = focus_var_name(&statement.name, index);
        let var_id = self.fresh_var_id();
        let non_value = mem::replace(
            &mut statement.args[index],
            Producer::var(var_id, var_name.clone()),
        );
        focus_statement(Statement::Call(statement), non_value, var_id, var_name)
    }

    /// `[C[p] k]` becomes `[(mu a. [p (mu' x. [C[x] a])]) k]`; the caller
    /// keeps the surrounding cut and swaps the producer for the μ.
    pub(super) fn focus_constructor(&mut self, mut ctor: Box<Constructor>, index: usize) -> Mu {
        let covar_id = self.fresh_covar_id();
        let name = focus_var_name(&ctor.name, index);
        let var_id = self.fresh_var_id();
        let non_value = mem::replace(&mut ctor.args[index], Producer::var(var_id, name.clone()));
        let inner = Statement::cut(Producer::Ctor(ctor), Consumer::covar(covar_id, name.clone()));
        let body = focus_statement(inner, non_value, var_id, name.clone());
        Mu {
            covar_id,
            name,
            body,
            ty: None,
        }
    }

    /// The dual of constructor focusing: the rebuilt cut gets the cocase
    /// bound back in through an outer μ̃.
    pub(super) fn focus_destructor(&mut self, mut dtor: Box<Destructor>, index: usize) -> MuTilde {
        let outer_id = self.fresh_var_id();
        let name = focus_var_name(&dtor.name, index);
        let inner_id = self.fresh_var_id();
        let non_value = mem::replace(&mut dtor.args[index], Producer::var(inner_id, name.clone()));
        let inner = Statement::cut(Producer::var(outer_id, name.clone()), Consumer::Dtor(dtor));
        let body = focus_statement(inner, non_value, inner_id, name.clone());
        MuTilde {
            var_id: outer_id,
            name,
            body,
            ty: None,
        }
    }
}

fn focus_var_name(name: &str, index: usize) -> String {
    format!("_{name}_{index}")
}

/// Bind `non_value` to the fresh variable already spliced into `statement`:
/// the result is `[non_value (mu' x. statement)]`.
fn focus_statement(
    statement: Statement,
    non_value: Producer,
    var_id: VarId,
    var_name: String,
) -> Statement {
    Statement::cut(
        non_value,
        Consumer::MuTilde(Box::new(MuTilde {
            var_id,
            name: var_name,
            body: statement,
            ty: None,
        })),
    )
}
