//! Capture-avoiding substitution.
//!
//! The maps carry borrowed replacement nodes; each hit deep-copies the
//! replacement into place, so one map can serve any number of occurrences.
//! On entering a binder, the entry for the shadowed id is stripped from a
//! copy of the map before descending. Ids are unique program-wide, so a
//! stripped entry can only ever be the binder itself.

use std::collections::BTreeMap;

use crate::ast::{Clause, Consumer, CovarId, Producer, Statement, VarId};

pub(crate) type VarMap<'a> = BTreeMap<VarId, &'a Producer>;
pub(crate) type CovarMap<'a> = BTreeMap<CovarId, &'a Consumer>;

fn without_var<'a>(map: &VarMap<'a>, id: VarId) -> VarMap<'a> {
    let mut map = map.clone();
    map.remove(&id);
    map
}

fn without_covar<'a>(map: &CovarMap<'a>, id: CovarId) -> CovarMap<'a> {
    let mut map = map.clone();
    map.remove(&id);
    map
}

impl Producer {
    pub(crate) fn replace(&mut self, vars: &VarMap<'_>, covars: &CovarMap<'_>) {
        match self {
            Producer::Var(var) => {
                if let Some(&replacement) = vars.get(&var.var_id) {
                    *self = replacement.clone();
                }
            }
            Producer::Lit(_) => {}
            Producer::Mu(mu) => {
                mu.body.replace(vars, &without_covar(covars, mu.covar_id));
            }
            Producer::Ctor(ctor) => {
                if ctor.is_value == Some(false) {
                    // A variable argument may become a value below
                    ctor.is_value = None;
                }
                for arg in &mut ctor.args {
                    arg.replace(vars, covars);
                }
                for coarg in &mut ctor.coargs {
                    coarg.replace(vars, covars);
                }
            }
            Producer::Cocase(cocase) => {
                for clause in &mut cocase.clauses {
                    clause.replace(vars, covars);
                }
            }
        }
    }
}

impl Consumer {
    pub(crate) fn replace(&mut self, vars: &VarMap<'_>, covars: &CovarMap<'_>) {
        match self {
            Consumer::Covar(covar) => {
                if let Some(&replacement) = covars.get(&covar.covar_id) {
                    *self = replacement.clone();
                }
            }
            Consumer::MuTilde(mu) => {
                mu.body.replace(&without_var(vars, mu.var_id), covars);
            }
            Consumer::Dtor(dtor) => {
                for arg in &mut dtor.args {
                    arg.replace(vars, covars);
                }
                for coarg in &mut dtor.coargs {
                    coarg.replace(vars, covars);
                }
            }
            Consumer::Case(case) => {
                for clause in &mut case.clauses {
                    clause.replace(vars, covars);
                }
            }
            Consumer::End(_) => {}
        }
    }
}

impl Statement {
    pub(crate) fn replace(&mut self, vars: &VarMap<'_>, covars: &CovarMap<'_>) {
        match self {
            Statement::Arith(arith) => {
                arith.left.replace(vars, covars);
                arith.right.replace(vars, covars);
                arith.after.replace(vars, covars);
            }
            Statement::Ifz(ifz) => {
                ifz.condition.replace(vars, covars);
                ifz.if_zero.replace(vars, covars);
                ifz.if_other.replace(vars, covars);
            }
            Statement::Cut(cut) => {
                cut.producer.replace(vars, covars);
                cut.consumer.replace(vars, covars);
            }
            Statement::Call(call) => {
                for arg in &mut call.args {
                    arg.replace(vars, covars);
                }
                for coarg in &mut call.coargs {
                    coarg.replace(vars, covars);
                }
            }
        }
    }
}

impl Clause {
    pub(crate) fn replace(&mut self, vars: &VarMap<'_>, covars: &CovarMap<'_>) {
        let mut vars = vars.clone();
        let mut covars = covars.clone();
        for arg in &self.arg_ids {
            vars.remove(arg);
        }
        for coarg in &self.coarg_ids {
            covars.remove(coarg);
        }
        self.body.replace(&vars, &covars);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Mu, MuTilde};

    #[test]
    fn free_variables_are_replaced_everywhere() {
        let x = VarId(0);
        let mut statement = Statement::cut(
            Producer::var(x, "x"),
            Consumer::MuTilde(Box::new(MuTilde {
                var_id: VarId(1),
                name: "y".to_string(),
                body: Statement::cut(Producer::var(x, "x"), Consumer::end()),
                ty: None,
            })),
        );
        let replacement = Producer::lit(9);
        let mut vars = VarMap::new();
        vars.insert(x, &replacement);
        statement.replace(&vars, &CovarMap::new());
        assert_eq!(statement.to_string(), "[9 (mu' y [9 <END>])]");
    }

    #[test]
    fn binders_shadow_their_own_id() {
        let x = VarId(0);
        // A mu' rebinding x: occurrences under it stay untouched
        let mut statement = Statement::Cut(Box::new(crate::ast::Cut {
            producer: Producer::lit(1),
            consumer: Consumer::MuTilde(Box::new(MuTilde {
                var_id: x,
                name: "x".to_string(),
                body: Statement::cut(Producer::var(x, "x"), Consumer::end()),
                ty: None,
            })),
        }));
        let replacement = Producer::lit(9);
        let mut vars = VarMap::new();
        vars.insert(x, &replacement);
        statement.replace(&vars, &CovarMap::new());
        assert_eq!(statement.to_string(), "[1 (mu' x [x <END>])]");
    }

    #[test]
    fn mu_shadows_covariables_not_variables() {
        let a = CovarId(0);
        let mut producer = Producer::Mu(Box::new(Mu {
            covar_id: a,
            name: "a".to_string(),
            body: Statement::cut(Producer::lit(1), Consumer::covar(a, "a")),
            ty: None,
        }));
        let replacement = Consumer::end();
        let mut covars = CovarMap::new();
        covars.insert(a, &replacement);
        producer.replace(&VarMap::new(), &covars);
        assert_eq!(producer.to_string(), "(mu a [1 a])");
    }

    #[test]
    fn clause_binders_strip_their_ids() {
        let x = VarId(0);
        let y = VarId(1);
        let mut clause = Clause {
            abstraction_id: crate::types::AbstractionId::CONS,
            name: "Cons".to_string(),
            arg_names: vec!["x".to_string(), "xs".to_string()],
            coarg_names: vec![],
            arg_ids: vec![x, VarId(2)],
            coarg_ids: vec![],
            body: Statement::cut(Producer::var(x, "x"), Consumer::end()),
        };
        let replacement = Producer::lit(5);
        let mut vars = VarMap::new();
        vars.insert(x, &replacement);
        vars.insert(y, &replacement);
        clause.replace(&vars, &CovarMap::new());
        assert_eq!(clause.body.to_string(), "[x <END>]");
    }
}
