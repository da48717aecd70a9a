//! Implicit-location desugaring: a rule with no explicit location term
//! anywhere in its head or body atoms has a fresh location variable `#_L`
//! prepended to every atom's term list. A rule with at least one explicit
//! location term is left untouched. Idempotent: running desugar twice is
//! the same as running it once, since an already-desugared rule has an
//! explicit location term.

use crate::ast::{Atom, Program, Rule, Term};

fn atom_has_location(atom: &Atom) -> bool {
    atom.terms.iter().any(Term::is_location)
}

fn desugar_rule(rule: Rule) -> Rule {
    let atoms_have_location =
        atom_has_location(&rule.head) || rule.body.iter().any(|l| atom_has_location(&l.atom));
    if atoms_have_location {
        return rule;
    }

    let location = Term::variable("_L", true);
    let mut head = rule.head;
    head.terms.insert(0, location.clone());

    let body = rule
        .body
        .into_iter()
        .map(|mut literal| {
            literal.atom.terms.insert(0, location.clone());
            literal
        })
        .collect();

    Rule::new(head, rule.kind, body)
}

/// Returns a new, semantically independent `Program` with implicit
/// locations made explicit. Never mutates `program`.
pub fn desugar(program: &Program) -> Program {
    Program::new(program.rules.iter().cloned().map(desugar_rule).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Literal, Predicate, RuleKind};

    fn var(s: &str) -> Term {
        Term::variable(s, false)
    }

    fn atom(p: &str, terms: Vec<Term>) -> Atom {
        Atom::new(Predicate::new(p), terms)
    }

    #[test]
    fn s1_inserts_fresh_location_variable() {
        // p(X, Y) :- q(X, Z), r(Z, Y). -> p(#_L, X, Y) :- q(#_L, X, Z), r(#_L, Z, Y).
        let program = Program::new(vec![Rule::new(
            atom("p", vec![var("X"), var("Y")]),
            RuleKind::Deductive,
            vec![
                Literal::positive(atom("q", vec![var("X"), var("Z")])),
                Literal::positive(atom("r", vec![var("Z"), var("Y")])),
            ],
        )]);

        let desugared = desugar(&program);
        assert_eq!(
            desugared.to_string(),
            "p(#_L, X, Y) :- q(#_L, X, Z), r(#_L, Z, Y)."
        );
    }

    #[test]
    fn idempotent_on_already_desugared_rules() {
        let program = Program::new(vec![Rule::new(
            atom("p", vec![Term::variable("_L", true), var("X")]),
            RuleKind::Deductive,
            vec![Literal::positive(atom("q", vec![Term::variable("_L", true), var("X")]))],
        )]);
        let once = desugar(&program);
        let twice = desugar(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn preserves_explicitly_located_rules() {
        let program = Program::new(vec![Rule::new(
            atom("p", vec![Term::constant("a", true)]),
            RuleKind::Deductive,
            vec![],
        )]);
        let desugared = desugar(&program);
        assert_eq!(program, desugared);
    }

    #[test]
    fn does_not_mutate_input() {
        let program = Program::new(vec![Rule::new(
            atom("p", vec![var("X")]),
            RuleKind::Deductive,
            vec![Literal::positive(atom("q", vec![var("X")]))],
        )]);
        let original = program.clone();
        let _ = desugar(&program);
        assert_eq!(program, original);
    }
}
