//! Property-based tests over the pipeline's universal invariants:
//! desugaring, typechecking, the IDB/EDB partition, parser round-tripping,
//! and evaluator determinism.

use proptest::prelude::*;

use dedalus_core::ast::{Atom, Literal, Predicate, Program, Rule, RuleKind, Term};
use dedalus_core::desugar::desugar;
use dedalus_core::eval::{run, spawn, UniformRandInt};
use dedalus_core::parser::parse_program;
use dedalus_core::typecheck::typecheck;

fn arb_constant_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,4}".prop_map(|s| s)
}

fn arb_variable_name() -> impl Strategy<Value = String> {
    "[A-Z][A-Z0-9]{0,4}".prop_map(|s| s)
}

fn fact_program(location: &str, predicate: &str, args: &[&str]) -> Program {
    let mut terms = vec![Term::constant(location, true)];
    terms.extend(args.iter().map(|a| Term::constant(*a, false)));
    Program::new(vec![Rule::new(Atom::new(Predicate::new(predicate), terms), RuleKind::Deductive, vec![])])
}

proptest! {
    #[test]
    fn desugaring_is_idempotent(name in arb_variable_name()) {
        let program = Program::new(vec![Rule::new(
            Atom::new(Predicate::new("p"), vec![Term::variable(name.clone(), false)]),
            RuleKind::Deductive,
            vec![Literal::positive(Atom::new(Predicate::new("q"), vec![Term::variable(name, false)]))],
        )]);
        let once = desugar(&program);
        let twice = desugar(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn typechecking_a_typechecked_program_is_a_no_op(name in arb_variable_name()) {
        let program = Program::new(vec![Rule::new(
            Atom::new(Predicate::new("p"), vec![Term::variable(name.clone(), false)]),
            RuleKind::Deductive,
            vec![Literal::positive(Atom::new(Predicate::new("q"), vec![Term::variable(name, false)]))],
        )]);
        let once = typecheck(desugar(&program)).unwrap();
        let twice = typecheck(once.clone()).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn every_predicate_is_in_exactly_one_of_idb_or_edb(
        loc in arb_constant_name(), a in arb_constant_name(), b in arb_constant_name(),
    ) {
        let program = fact_program(&loc, "p", &[&a, &b]);
        let idb = program.idb();
        let edb = program.edb();
        prop_assert!(idb.is_disjoint(&edb));
        prop_assert_eq!(idb.union(&edb).count(), program.predicates().len());
    }

    #[test]
    fn parsing_a_rule_s_printed_form_reproduces_it(
        pred in "[a-z][a-z0-9]{0,4}", loc in arb_constant_name(), arg in arb_constant_name(),
    ) {
        let program = fact_program(&loc, &pred, &[&arg]);
        let printed = program.to_string();
        let reparsed = parse_program(&printed).unwrap();
        prop_assert_eq!(reparsed.to_string(), printed);
    }

    #[test]
    fn evaluation_is_deterministic_for_a_fixed_randint_sequence(
        loc in arb_constant_name(), constant in arb_constant_name(), delay in 1u64..5,
    ) {
        let make_program = || {
            let mut rules = fact_program(&loc, "p", &[&constant]).rules;
            rules.push(Rule::new(
                Atom::new(Predicate::new("q"), vec![Term::constant(loc.clone(), true)]),
                RuleKind::Async,
                vec![Literal::positive(Atom::new(
                    Predicate::new("p"),
                    vec![Term::constant(loc.clone(), true), Term::constant(constant.clone(), false)],
                ))],
            ));
            typecheck(desugar(&Program::new(rules))).unwrap()
        };

        let fixed = Box::new(UniformRandInt::new(delay, delay));
        let p1 = run(spawn(make_program(), Some(fixed)), 4);
        let fixed2 = Box::new(UniformRandInt::new(delay, delay));
        let p2 = run(spawn(make_program(), Some(fixed2)), 4);
        prop_assert_eq!(p1.database, p2.database);
        prop_assert_eq!(p1.async_buffer, p2.async_buffer);
    }
}
