//! Typechecker: ordered invariant checks over a desugared program — fixed
//! predicate arity, range restriction, timestamp restriction (constant-time
//! rules have an empty body), and location agreement — each its own
//! function, returning on the first violation it finds, called in sequence
//! by `typecheck`.

use std::collections::{HashMap, HashSet};

use crate::ast::{Atom, Program, Rule};
use crate::error::TypeError;

fn atoms_of(rule: &Rule) -> Vec<&Atom> {
    std::iter::once(&rule.head).chain(rule.body.iter().map(|l| &l.atom)).collect()
}

fn fixed_arities(program: &Program) -> Result<(), TypeError> {
    let mut arities: HashMap<&str, usize> = HashMap::new();
    for rule in &program.rules {
        for atom in atoms_of(rule) {
            let p = atom.predicate.0.as_str();
            let arity = atom.arity();
            match arities.get(p) {
                Some(&existing) if existing != arity => {
                    return Err(TypeError::InconsistentArity {
                        predicate: p.to_string(),
                        first_arity: existing,
                        second_arity: arity,
                    });
                }
                _ => {
                    arities.insert(p, arity);
                }
            }
        }
    }
    Ok(())
}

fn range_restricted(program: &Program) -> Result<(), TypeError> {
    for rule in &program.rules {
        let positive_vars: HashSet<&str> = rule
            .positive_literals()
            .flat_map(|l| l.atom.variables())
            .map(|t| t.symbol())
            .collect();
        let negative_vars: HashSet<&str> = rule
            .negative_literals()
            .flat_map(|l| l.atom.variables())
            .map(|t| t.symbol())
            .collect();
        let head_vars: HashSet<&str> = rule.head.variables().map(|t| t.symbol()).collect();

        let unrestricted_head: Vec<String> =
            head_vars.difference(&positive_vars).map(|s| s.to_string()).collect();
        if !unrestricted_head.is_empty() {
            let mut vars = unrestricted_head;
            vars.sort();
            return Err(TypeError::NotRangeRestricted { rule: rule.to_string(), unrestricted_vars: vars });
        }

        let unrestricted_negative: Vec<String> =
            negative_vars.difference(&positive_vars).map(|s| s.to_string()).collect();
        if !unrestricted_negative.is_empty() {
            let mut vars = unrestricted_negative;
            vars.sort();
            return Err(TypeError::NotRangeRestricted { rule: rule.to_string(), unrestricted_vars: vars });
        }
    }
    Ok(())
}

fn timestamp_restricted(program: &Program) -> Result<(), TypeError> {
    for rule in &program.rules {
        if rule.is_constant_time() && !rule.body.is_empty() {
            return Err(TypeError::ConstantTimeWithBody { rule: rule.to_string() });
        }
    }
    Ok(())
}

fn location_restricted(program: &Program) -> Result<(), TypeError> {
    for rule in &program.rules {
        for atom in atoms_of(rule) {
            if atom.terms.is_empty() {
                return Err(TypeError::LocationViolation {
                    rule: rule.to_string(),
                    reason: format!("atom {atom} has no location specifier"),
                });
            }
            if !atom.terms[0].is_location() {
                return Err(TypeError::LocationViolation {
                    rule: rule.to_string(),
                    reason: format!("the first term of atom {atom} is not a location specifier"),
                });
            }
            if atom.terms[1..].iter().any(|t| t.is_location()) {
                return Err(TypeError::LocationViolation {
                    rule: rule.to_string(),
                    reason: format!("atom {atom} has a location term that is not in head position"),
                });
            }
        }

        let head_location = &rule.head.terms[0];
        let body_locations: HashSet<&crate::ast::Term> =
            rule.body.iter().map(|l| &l.atom.terms[0]).collect();

        if body_locations.len() > 1 {
            return Err(TypeError::LocationViolation {
                rule: rule.to_string(),
                reason: "the body contains multiple locations".to_string(),
            });
        }

        let mut locations: HashSet<&crate::ast::Term> = body_locations;
        locations.insert(head_location);

        if (rule.is_deductive() || rule.is_inductive()) && locations.len() != 1 {
            return Err(TypeError::LocationViolation {
                rule: rule.to_string(),
                reason: "the head and body contain different locations; only async rules may do this"
                    .to_string(),
            });
        }
    }
    Ok(())
}

/// Runs every invariant check, in order, against a desugared program.
/// Returns the program unchanged on success.
pub fn typecheck(program: Program) -> Result<Program, TypeError> {
    fixed_arities(&program)?;
    range_restricted(&program)?;
    timestamp_restricted(&program)?;
    location_restricted(&program)?;
    Ok(program)
}

pub fn typechecks(program: &Program) -> bool {
    typecheck(program.clone()).is_ok()
}
