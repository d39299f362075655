//! The builtin types and structors every program starts from.
//!
//! The type set is fixed: `Integer`, `List a`, `Pair a b`, `Stream a`,
//! `LazyPair a b` and `Lambda a b`, with one structor group per type.
//! Ids are assigned in registration order, so the constants below hold by
//! construction (asserted when seeding a context).

use crate::ast::Polarity;

use super::context::TypingContext;
use super::ty::{AbstractionId, TypeId, TypeTemplate};

impl TypeId {
    pub const INTEGER: TypeId = TypeId(0);
    pub const LIST: TypeId = TypeId(1);
    pub const PAIR: TypeId = TypeId(2);
    pub const STREAM: TypeId = TypeId(3);
    pub const LAZY_PAIR: TypeId = TypeId(4);
    pub const LAMBDA: TypeId = TypeId(5);
}

impl AbstractionId {
    pub const NIL: AbstractionId = AbstractionId(0);
    pub const CONS: AbstractionId = AbstractionId(1);
    pub const PAIR: AbstractionId = AbstractionId(2);
    pub const HEAD: AbstractionId = AbstractionId(3);
    pub const TAIL: AbstractionId = AbstractionId(4);
    pub const FST: AbstractionId = AbstractionId(5);
    pub const SND: AbstractionId = AbstractionId(6);
    pub const AP: AbstractionId = AbstractionId(7);
}

/// Name, id, arity, coarity and syntax polarity of a builtin structor,
/// as the parser needs them for lookup and arity checking.
pub struct BuiltinStructor {
    pub name: &'static str,
    pub id: AbstractionId,
    pub arity: usize,
    pub coarity: usize,
    pub polarity: Polarity,
}

pub fn builtin_structors() -> [BuiltinStructor; 8] {
    use Polarity::{Consumer, Producer};
    [
        BuiltinStructor {
            name: "Nil",
            id: AbstractionId::NIL,
            arity: 0,
            coarity: 0,
            polarity: Producer,
        },
        BuiltinStructor {
            name: "Cons",
            id: AbstractionId::CONS,
            arity: 2,
            coarity: 0,
            polarity: Producer,
        },
        BuiltinStructor {
            name: "Pair",
            id: AbstractionId::PAIR,
            arity: 2,
            coarity: 0,
            polarity: Producer,
        },
        BuiltinStructor {
            name: "Head",
            id: AbstractionId::HEAD,
            arity: 0,
            coarity: 1,
            polarity: Consumer,
        },
        BuiltinStructor {
            name: "Tail",
            id: AbstractionId::TAIL,
            arity: 0,
            coarity: 1,
            polarity: Consumer,
        },
        BuiltinStructor {
            name: "Fst",
            id: AbstractionId::FST,
            arity: 0,
            coarity: 1,
            polarity: Consumer,
        },
        BuiltinStructor {
            name: "Snd",
            id: AbstractionId::SND,
            arity: 0,
            coarity: 1,
            polarity: Consumer,
        },
        BuiltinStructor {
            name: "Ap",
            id: AbstractionId::AP,
            arity: 1,
            coarity: 1,
            polarity: Consumer,
        },
    ]
}

impl TypingContext {
    /// A fresh context with all builtin types and structors registered.
    pub fn with_builtins() -> TypingContext {
        use TypeTemplate::{Concrete, Param};

        let mut ctx = TypingContext::new();
        let types = [
            ("Integer", 0, TypeId::INTEGER),
            ("List", 1, TypeId::LIST),
            ("Pair", 2, TypeId::PAIR),
            ("Stream", 1, TypeId::STREAM),
            ("LazyPair", 2, TypeId::LAZY_PAIR),
            ("Lambda", 2, TypeId::LAMBDA),
        ];
        for (name, n_params, expected) in types {
            let id = ctx.add_type_prototype(name, n_params);
            debug_assert_eq!(id, expected);
        }

        let structors = [
            ("Nil", TypeId::LIST, vec![], vec![], AbstractionId::NIL),
            (
                "Cons",
                TypeId::LIST,
                vec![Param(0), Concrete(TypeId::LIST, vec![Param(0)])],
                vec![],
                AbstractionId::CONS,
            ),
            (
                "Pair",
                TypeId::PAIR,
                vec![Param(0), Param(1)],
                vec![],
                AbstractionId::PAIR,
            ),
            (
                "Head",
                TypeId::STREAM,
                vec![],
                vec![Param(0)],
                AbstractionId::HEAD,
            ),
            (
                "Tail",
                TypeId::STREAM,
                vec![],
                vec![Concrete(TypeId::STREAM, vec![Param(0)])],
                AbstractionId::TAIL,
            ),
            (
                "Fst",
                TypeId::LAZY_PAIR,
                vec![],
                vec![Param(0)],
                AbstractionId::FST,
            ),
            (
                "Snd",
                TypeId::LAZY_PAIR,
                vec![],
                vec![Param(1)],
                AbstractionId::SND,
            ),
            (
                "Ap",
                TypeId::LAMBDA,
                vec![Param(0)],
                vec![Param(1)],
                AbstractionId::AP,
            ),
        ];
        for (name, type_id, args, coargs, expected) in structors {
            let id = ctx.add_structor(name, type_id, args, coargs);
            debug_assert_eq!(id, expected);
        }
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_ids_match_registration_order() {
        let ctx = TypingContext::with_builtins();
        assert_eq!(ctx.abstraction(AbstractionId::NIL).name, "Nil");
        assert_eq!(ctx.abstraction(AbstractionId::AP).name, "Ap");
        assert_eq!(ctx.type_name(TypeId::LAMBDA), "Lambda");
    }

    #[test]
    fn structor_arities_match_signatures() {
        let ctx = TypingContext::with_builtins();
        for builtin in builtin_structors() {
            let abstraction = ctx.abstraction(builtin.id);
            assert_eq!(abstraction.arity(), builtin.arity, "{}", builtin.name);
            assert_eq!(abstraction.coarity(), builtin.coarity, "{}", builtin.name);
        }
    }
}
