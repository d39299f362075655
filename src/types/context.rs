//! The typing context: a monotonic arena of type terms plus the registries
//! of type prototypes and abstraction signatures.
//!
//! Type cells are only ever appended. Unification rewrites variable cells
//! into forward pointers; dereferencing chases those pointers and compresses
//! the chain. Instantiation clones a signature's types with a memo map so
//! variables shared inside one signature stay shared inside the clone but
//! are independent across clones, which is what gives top-level definitions
//! let-polymorphism at their call sites.

use std::collections::{BTreeMap, BTreeSet};

use super::error::{UnifyError, UnifyErrorKind};
use super::ty::{
    Abstraction, AbstractionId, AbstractionInstance, TypeHandle, TypeId, TypeTemplate, TypeTerm,
};

#[derive(Debug, Default)]
pub struct TypingContext {
    /// Type instances: prototypes as well as types of actual syntax nodes.
    types: Vec<TypeTerm>,
    /// Handles of free instances of types, to be cloned before use.
    type_prototypes: Vec<TypeHandle>,
    /// Type names, for printing.
    type_names: Vec<String>,
    /// Structors indexed by result type prototype, for totality checks.
    type_structors: BTreeMap<TypeHandle, BTreeSet<AbstractionId>>,
    /// Constructors, destructors and definitions.
    abstractions: Vec<Abstraction>,
}

impl TypingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new concrete type with `n_params` fresh parameter
    /// variables and return its id.
    pub fn add_type_prototype(&mut self, name: &str, n_params: usize) -> TypeId {
        let id = TypeId(self.type_prototypes.len());
        let prototype = TypeHandle(self.types.len());
        self.types.push(TypeTerm::Concrete {
            id,
            params: Vec::new(),
        });
        let params: Vec<_> = (0..n_params).map(|_| self.fresh_type_variable()).collect();
        match &mut self.types[prototype.0] {
            TypeTerm::Concrete { params: slot, .. } => *slot = params,
            _ => unreachable!(),
        }
        self.type_prototypes.push(prototype);
        self.type_names.push(name.to_string());
        id
    }

    /// Register a constructor or destructor of result type `type_id`.
    ///
    /// The (co)argument templates are instantiated against the result
    /// prototype's parameter handles, so a structor's signature shares
    /// variables with its type prototype.
    pub fn add_structor(
        &mut self,
        name: &str,
        type_id: TypeId,
        args: Vec<TypeTemplate>,
        coargs: Vec<TypeTemplate>,
    ) -> AbstractionId {
        let prototype = self.type_prototypes[type_id.0];
        let params = match &self.types[prototype.0] {
            TypeTerm::Concrete { params, .. } => params.clone(),
            _ => unreachable!("type prototypes are concrete"),
        };
        let arg_handles: Vec<_> = args
            .into_iter()
            .map(|template| self.instantiate_template(&template, &params))
            .collect();
        let coarg_handles: Vec<_> = coargs
            .into_iter()
            .map(|template| self.instantiate_template(&template, &params))
            .collect();
        let id = AbstractionId(self.abstractions.len());
        self.abstractions.push(Abstraction {
            result: Some(prototype),
            name: name.to_string(),
            args: arg_handles,
            coargs: coarg_handles,
        });
        self.type_structors.entry(prototype).or_default().insert(id);
        id
    }

    /// Register a definition signature: fresh variables for every
    /// (co)argument, no result type.
    pub fn add_definition(&mut self, name: &str, arity: usize, coarity: usize) -> AbstractionId {
        let args: Vec<_> = (0..arity).map(|_| self.fresh_type_variable()).collect();
        let coargs: Vec<_> = (0..coarity).map(|_| self.fresh_type_variable()).collect();
        let id = AbstractionId(self.abstractions.len());
        self.abstractions.push(Abstraction {
            result: None,
            name: name.to_string(),
            args,
            coargs,
        });
        id
    }

    /// The term a handle currently stands for, with forwards chased
    /// (but not compressed, so printing works on a shared context).
    pub fn type_term(&self, handle: TypeHandle) -> &TypeTerm {
        &self.types[self.resolve_ref(handle).0]
    }

    pub fn type_prototype(&self, id: TypeId) -> TypeHandle {
        self.type_prototypes[id.0]
    }

    /// Handle to a parameterless builtin, usable directly as an expected
    /// type: it has no variables for unification to rebind.
    pub fn primitive_prototype(&self, id: TypeId) -> TypeHandle {
        let handle = self.type_prototypes[id.0];
        match &self.types[handle.0] {
            TypeTerm::Concrete { params, .. } if params.is_empty() => handle,
            _ => panic!("{} is not a primitive type", self.type_names[id.0]),
        }
    }

    pub fn abstraction(&self, id: AbstractionId) -> &Abstraction {
        &self.abstractions[id.0]
    }

    /// The un-cloned signature of an abstraction. Unifying against these
    /// handles constrains the signature itself; the typer uses this for
    /// recursive calls inside a definition's own body, which are therefore
    /// monomorphic at that call site.
    pub fn abstraction_prototype(&self, id: AbstractionId) -> AbstractionInstance {
        let abstraction = &self.abstractions[id.0];
        AbstractionInstance {
            result: abstraction.result,
            args: abstraction.args.clone(),
            coargs: abstraction.coargs.clone(),
        }
    }

    pub fn type_name(&self, id: TypeId) -> &str {
        &self.type_names[id.0]
    }

    /// All structors sharing this structor's result type.
    pub fn structors_like(&self, id: AbstractionId) -> &BTreeSet<AbstractionId> {
        let prototype = self.abstractions[id.0]
            .result
            .expect("definitions have no structor set");
        &self.type_structors[&prototype]
    }

    /// Clone an abstraction's signature with fresh variables.
    pub fn instantiate(&mut self, id: AbstractionId) -> AbstractionInstance {
        let abstraction = &self.abstractions[id.0];
        let mut to_clone = abstraction.args.clone();
        to_clone.extend(abstraction.coargs.iter().copied());
        let result = abstraction.result;
        if let Some(result) = result {
            to_clone.push(result);
        }
        let arity = abstraction.arity();
        let coarity = abstraction.coarity();
        let fresh = self.clone_types(&to_clone);
        AbstractionInstance {
            result: result.map(|_| *fresh.last().expect("result type was cloned")),
            args: fresh[..arity].to_vec(),
            coargs: fresh[arity..arity + coarity].to_vec(),
        }
    }

    /// Append a fresh variable cell and return its handle.
    pub fn fresh_type_variable(&mut self) -> TypeHandle {
        let handle = TypeHandle(self.types.len());
        self.types.push(TypeTerm::Var(handle.0));
        handle
    }

    /// Unify two types in place. On success the two handles stand for the
    /// same term afterwards; on failure the context is left partially
    /// unified, which is fine since the enclosing check is abandoned.
    pub fn unify(&mut self, a: TypeHandle, b: TypeHandle) -> Result<(), UnifyError> {
        let mut a = self.resolve(a);
        let mut b = self.resolve(b);
        if a == b {
            return Ok(());
        }
        // Handle (concrete, var) by symmetry
        if matches!(self.types[b.0], TypeTerm::Var(_)) {
            std::mem::swap(&mut a, &mut b);
        }
        if matches!(self.types[a.0], TypeTerm::Var(_)) {
            if self.occurs(a, b) {
                return Err(UnifyError {
                    kind: UnifyErrorKind::Occurs,
                    left: a,
                    right: b,
                });
            }
            self.types[a.0] = TypeTerm::Forward(b);
            return Ok(());
        }
        // Only (concrete, concrete) is left
        let (a_id, a_params) = match &self.types[a.0] {
            TypeTerm::Concrete { id, params } => (*id, params.clone()),
            _ => unreachable!(),
        };
        let (b_id, b_params) = match &self.types[b.0] {
            TypeTerm::Concrete { id, params } => (*id, params.clone()),
            _ => unreachable!(),
        };
        if a_id != b_id {
            return Err(UnifyError {
                kind: UnifyErrorKind::Mismatch,
                left: a,
                right: b,
            });
        }
        debug_assert_eq!(a_params.len(), b_params.len());
        for (a_param, b_param) in a_params.into_iter().zip(b_params) {
            self.unify(a_param, b_param)?;
        }
        Ok(())
    }

    /// Check whether variable `a` occurs in `b`.
    fn occurs(&mut self, a: TypeHandle, b: TypeHandle) -> bool {
        debug_assert!(matches!(self.types[a.0], TypeTerm::Var(_)));
        let b = self.resolve(b);
        match &self.types[b.0] {
            TypeTerm::Var(_) => a == b,
            TypeTerm::Concrete { params, .. } => {
                let params = params.clone();
                params.into_iter().any(|param| self.occurs(a, param))
            }
            TypeTerm::Forward(_) => unreachable!("resolved handle"),
        }
    }

    /// Clone a group of types sharing one memo map, preserving variable
    /// sharing within the group.
    fn clone_types(&mut self, handles: &[TypeHandle]) -> Vec<TypeHandle> {
        let mut memo = BTreeMap::new();
        handles
            .iter()
            .map(|&handle| self.clone_type(handle, &mut memo))
            .collect()
    }

    fn clone_type(
        &mut self,
        handle: TypeHandle,
        memo: &mut BTreeMap<usize, TypeHandle>,
    ) -> TypeHandle {
        let handle = self.resolve(handle);
        if let Some(&clone) = memo.get(&handle.0) {
            return clone;
        }
        match &self.types[handle.0] {
            TypeTerm::Var(_) => {
                let clone = self.fresh_type_variable();
                memo.insert(handle.0, clone);
                clone
            }
            TypeTerm::Concrete { id, params } => {
                let id = *id;
                let params = params.clone();
                let clone = TypeHandle(self.types.len());
                self.types.push(TypeTerm::Concrete {
                    id,
                    params: Vec::new(),
                });
                // Register the mapping before recursing so cyclic sharing
                // through the memo stays consistent
                memo.insert(handle.0, clone);
                let new_params: Vec<_> = params
                    .into_iter()
                    .map(|param| self.clone_type(param, memo))
                    .collect();
                match &mut self.types[clone.0] {
                    TypeTerm::Concrete { params: slot, .. } => *slot = new_params,
                    _ => unreachable!(),
                }
                clone
            }
            TypeTerm::Forward(_) => unreachable!("resolved handle"),
        }
    }

    /// Build a concrete type from a template, replacing `Param(i)` with
    /// `params[i]`.
    fn instantiate_template(
        &mut self,
        template: &TypeTemplate,
        params: &[TypeHandle],
    ) -> TypeHandle {
        match template {
            TypeTemplate::Param(index) => params[*index],
            TypeTemplate::Concrete(id, nested) => {
                let new_params: Vec<_> = nested
                    .iter()
                    .map(|nested| self.instantiate_template(nested, params))
                    .collect();
                let handle = TypeHandle(self.types.len());
                self.types.push(TypeTerm::Concrete {
                    id: *id,
                    params: new_params,
                });
                handle
            }
        }
    }

    /// Chase forwards and compress the chain.
    fn resolve(&mut self, handle: TypeHandle) -> TypeHandle {
        if !matches!(self.types[handle.0], TypeTerm::Forward(_)) {
            return handle;
        }
        let mut chain = Vec::new();
        let mut current = handle;
        while let TypeTerm::Forward(next) = self.types[current.0] {
            chain.push(current);
            current = next;
        }
        // The last link already points at the target
        chain.pop();
        for link in chain {
            self.types[link.0] = TypeTerm::Forward(current);
        }
        current
    }

    /// Chase forwards without compressing.
    fn resolve_ref(&self, handle: TypeHandle) -> TypeHandle {
        let mut current = handle;
        while let TypeTerm::Forward(next) = self.types[current.0] {
            current = next;
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::error::UnifyErrorKind;

    fn list_of(ctx: &mut TypingContext, elem: TypeHandle) -> TypeHandle {
        let handle = TypeHandle(ctx.types.len());
        ctx.types.push(TypeTerm::Concrete {
            id: TypeId(1),
            params: vec![elem],
        });
        handle
    }

    #[test]
    fn unify_two_fresh_variables() {
        let mut ctx = TypingContext::with_builtins();
        let a = ctx.fresh_type_variable();
        let b = ctx.fresh_type_variable();
        ctx.unify(a, b).unwrap();
        assert_eq!(ctx.resolve(a), ctx.resolve(b));
    }

    #[test]
    fn unify_variable_with_concrete() {
        let mut ctx = TypingContext::with_builtins();
        let int = ctx.primitive_prototype(TypeId(0));
        let a = ctx.fresh_type_variable();
        ctx.unify(a, int).unwrap();
        assert!(matches!(
            ctx.type_term(a),
            TypeTerm::Concrete { id: TypeId(0), .. }
        ));
    }

    #[test]
    fn unify_mismatched_constructors() {
        let mut ctx = TypingContext::with_builtins();
        let int = ctx.primitive_prototype(TypeId(0));
        let elem = ctx.fresh_type_variable();
        let list = list_of(&mut ctx, elem);
        let err = ctx.unify(int, list).unwrap_err();
        assert_eq!(err.kind, UnifyErrorKind::Mismatch);
    }

    #[test]
    fn occurs_check_rejects_infinite_type() {
        let mut ctx = TypingContext::with_builtins();
        let a = ctx.fresh_type_variable();
        let list = list_of(&mut ctx, a);
        let err = ctx.unify(a, list).unwrap_err();
        assert_eq!(err.kind, UnifyErrorKind::Occurs);
    }

    #[test]
    fn occurs_check_sees_through_forwards() {
        let mut ctx = TypingContext::with_builtins();
        let a = ctx.fresh_type_variable();
        let b = ctx.fresh_type_variable();
        ctx.unify(a, b).unwrap();
        let list = list_of(&mut ctx, a);
        let err = ctx.unify(b, list).unwrap_err();
        assert_eq!(err.kind, UnifyErrorKind::Occurs);
    }

    #[test]
    fn forward_chains_compress() {
        let mut ctx = TypingContext::with_builtins();
        let a = ctx.fresh_type_variable();
        let b = ctx.fresh_type_variable();
        let c = ctx.fresh_type_variable();
        ctx.unify(a, b).unwrap();
        ctx.unify(b, c).unwrap();
        let target = ctx.resolve(a);
        assert!(matches!(ctx.types[a.0], TypeTerm::Forward(next) if next == target));
    }

    #[test]
    fn instantiate_keeps_sharing_within_one_clone() {
        let mut ctx = TypingContext::with_builtins();
        // Cons : (a, List a) -> List a
        let cons = AbstractionId(1);
        let instance = ctx.instantiate(cons);
        let elem = instance.args[0];
        let list = instance.args[1];
        let int = ctx.primitive_prototype(TypeId(0));
        ctx.unify(elem, int).unwrap();
        // The list argument's parameter must have followed
        match ctx.type_term(list) {
            TypeTerm::Concrete { params, .. } => {
                let param = params[0];
                assert!(matches!(
                    ctx.type_term(param),
                    TypeTerm::Concrete { id: TypeId(0), .. }
                ));
            }
            other => panic!("expected concrete list type, got {other:?}"),
        }
    }

    #[test]
    fn instantiate_is_fresh_across_clones() {
        let mut ctx = TypingContext::with_builtins();
        let cons = AbstractionId(1);
        let first = ctx.instantiate(cons);
        let second = ctx.instantiate(cons);
        let int = ctx.primitive_prototype(TypeId(0));
        ctx.unify(first.args[0], int).unwrap();
        // The second instance's element type is still a variable
        assert!(matches!(ctx.type_term(second.args[0]), TypeTerm::Var(_)));
    }

    #[test]
    fn structors_like_lists_the_whole_type() {
        let ctx = TypingContext::with_builtins();
        let like_nil: Vec<_> = ctx.structors_like(AbstractionId(0)).iter().collect();
        assert_eq!(like_nil, [&AbstractionId(0), &AbstractionId(1)]);
    }

    #[test]
    fn definitions_get_fresh_parameter_types() {
        let mut ctx = TypingContext::with_builtins();
        let id = ctx.add_definition("Loop", 2, 1);
        let abstraction = ctx.abstraction(id);
        assert_eq!(abstraction.arity(), 2);
        assert_eq!(abstraction.coarity(), 1);
        assert!(abstraction.result.is_none());
    }
}
