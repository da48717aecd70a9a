//! Evaluator: substitution/unification, naive rule evaluation, the
//! stratified fixpoint, and the `Process`/`spawn`/`step`/`run` state
//! machine.
//!
//! `step` runs six ordered phases each timestep: buffer promotion,
//! constant-time rules, deductive saturation, inductive scheduling, async
//! scheduling, timestep advance. Deductive saturation runs stratum by
//! stratum in topological order rather than as one flat fixpoint over every
//! deductive rule at once — the two converge to the same result for a
//! stratified program, since stratum ordering only ever makes strictly more
//! tuples available to a later stratum before it is evaluated.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::ast::{Atom, Predicate, Program, Rule, Term};
use crate::pdg::strata;

pub type Tuple = Vec<String>;
pub type Relation = HashSet<Tuple>;
pub type Database = HashMap<Predicate, Relation>;
pub type AsyncBuffer = BTreeMap<u64, HashMap<Predicate, Relation>>;
pub type Bindings<'a> = HashMap<&'a str, String>;

/// Injectable source of positive random delays for async rules. Must
/// return a value `>= 1`: `randint() == 0` would deliver into the past.
pub trait RandInt {
    fn next(&mut self) -> u64;
}

/// Default source: uniform over `[low, high]`.
pub struct UniformRandInt {
    low: u64,
    high: u64,
    rng: rand::rngs::ThreadRng,
}

impl UniformRandInt {
    pub fn new(low: u64, high: u64) -> Self {
        assert!(low >= 1 && low <= high, "randint range must satisfy 1 <= low <= high");
        UniformRandInt { low, high, rng: rand::thread_rng() }
    }
}

impl RandInt for UniformRandInt {
    fn next(&mut self) -> u64 {
        use rand::Rng;
        self.rng.gen_range(self.low..=self.high)
    }
}

/// Evaluator state: the program being run, the current timestep, the
/// current database, the future-facts buffer, and the injected `randint`
/// source. `step` consumes a `Process` and produces a new one; it never
/// mutates anything the caller still holds.
pub struct Process {
    pub program: Program,
    pub timestep: u64,
    pub database: Database,
    pub async_buffer: AsyncBuffer,
    randint: Box<dyn RandInt>,
}

fn empty_database(program: &Program) -> Database {
    program.predicates().into_iter().map(|p| (p, Relation::new())).collect()
}

/// Builds the initial `Process` for `program`: every program predicate is
/// seeded with an empty relation, so buffer promotion always has a
/// well-defined relation to install even for a predicate with nothing
/// pending yet. Defaults to a `randint` sampled uniformly from `[1, 10]`
/// when none is supplied.
pub fn spawn(program: Program, randint: Option<Box<dyn RandInt>>) -> Process {
    let database = empty_database(&program);
    Process {
        program,
        timestep: 0,
        database,
        async_buffer: AsyncBuffer::new(),
        randint: randint.unwrap_or_else(|| Box::new(UniformRandInt::new(1, 10))),
    }
}

/// Grounds every term of `atom` under `bindings`. Every variable in `atom`
/// must already be bound; an unbound variable is a programming error, not a
/// recoverable failure.
pub fn subst(atom: &Atom, bindings: &Bindings<'_>) -> Tuple {
    atom.terms
        .iter()
        .map(|term| match term {
            Term::Constant { symbol, .. } => symbol.clone(),
            Term::Variable { symbol, .. } => bindings
                .get(symbol.as_str())
                .unwrap_or_else(|| panic!("invariant violation: unbound variable {symbol} during subst"))
                .clone(),
        })
        .collect()
}

/// Unifies a list of atoms against a same-length list of candidate tuples,
/// atom-by-atom and term-by-term. Returns `None` on the first mismatch.
pub fn unify<'a>(atoms: &[&'a Atom], tuples: &[&Tuple]) -> Option<Bindings<'a>> {
    let mut bindings = Bindings::new();
    for (atom, tuple) in atoms.iter().zip(tuples.iter()) {
        if atom.terms.len() != tuple.len() {
            panic!("invariant violation: arity mismatch during unify");
        }
        for (term, value) in atom.terms.iter().zip(tuple.iter()) {
            match term {
                Term::Constant { symbol, .. } => {
                    if symbol != value {
                        return None;
                    }
                }
                Term::Variable { symbol, .. } => match bindings.get(symbol.as_str()) {
                    Some(existing) if existing != value => return None,
                    _ => {
                        bindings.insert(symbol.as_str(), value.clone());
                    }
                },
            }
        }
    }
    Some(bindings)
}

fn cartesian_product<'a>(relations: &[&'a Relation]) -> Box<dyn Iterator<Item = Vec<&'a Tuple>> + 'a> {
    relations.iter().fold(
        Box::new(std::iter::once(Vec::new())) as Box<dyn Iterator<Item = Vec<&'a Tuple>>>,
        |acc, relation| {
            let relation = *relation;
            Box::new(acc.flat_map(move |prefix| {
                relation.iter().map(move |tuple| {
                    let mut next = prefix.clone();
                    next.push(tuple);
                    next
                })
            }))
        },
    )
}

/// Evaluates a single rule against `database`: Cartesian product over the
/// positive body predicates' relations, unify each combination against the
/// positive atoms, check negative atoms are absent (stratified
/// negation-as-failure), and emit the substituted head for every surviving
/// combination.
pub fn eval_rule(database: &Database, rule: &Rule) -> Relation {
    let positive_atoms: Vec<&Atom> = rule.positive_literals().map(|l| &l.atom).collect();
    let negative_atoms: Vec<&Atom> = rule.negative_literals().map(|l| &l.atom).collect();

    if positive_atoms.is_empty() {
        // Empty body: exactly one output tuple when the head is ground,
        // none if it still has variables.
        let bindings = Bindings::new();
        if rule.head.variables().next().is_some() {
            return Relation::new();
        }
        return std::iter::once(subst(&rule.head, &bindings)).collect();
    }

    let positive_relations: Vec<&Relation> = positive_atoms
        .iter()
        .map(|atom| {
            database
                .get(&atom.predicate)
                .unwrap_or_else(|| panic!("invariant violation: missing database entry for {}", atom.predicate))
        })
        .collect();

    let mut output = Relation::new();
    for combination in cartesian_product(&positive_relations) {
        let Some(bindings) = unify(&positive_atoms, &combination) else { continue };

        let blocked = negative_atoms.iter().any(|atom| {
            let tuple = subst(atom, &bindings);
            database
                .get(&atom.predicate)
                .unwrap_or_else(|| panic!("invariant violation: missing database entry for {}", atom.predicate))
                .contains(&tuple)
        });
        if blocked {
            continue;
        }

        output.insert(subst(&rule.head, &bindings));
    }
    output
}

/// Runs the deductive rules of `program` to a fixpoint over `database`,
/// stratum by stratum in topological order. Within a stratum, every
/// deductive rule whose head lies in that stratum is re-evaluated and
/// unioned in until a full pass adds nothing new.
pub fn deductive_fixpoint(program: &Program, database: &mut Database) {
    let deductive_rules: Vec<&Rule> = program.rules.iter().filter(|r| r.is_deductive()).collect();

    for stratum in strata(program) {
        let stratum: HashSet<&Predicate> = stratum.iter().collect();
        let rules_in_stratum: Vec<&Rule> =
            deductive_rules.iter().filter(|r| stratum.contains(&r.head.predicate)).copied().collect();

        let mut changed = true;
        while changed {
            changed = false;
            for rule in &rules_in_stratum {
                let derived = eval_rule(database, rule);
                let relation = database.entry(rule.head.predicate.clone()).or_default();
                let before = relation.len();
                relation.extend(derived);
                if relation.len() != before {
                    changed = true;
                }
            }
        }
    }
}

/// Runs one timestep to completion, consuming `process` and returning its
/// successor. The caller's `process` value is unaffected: every mutation
/// happens on owned data moved out of the consumed `process`.
pub fn step(mut process: Process) -> Process {
    let timestep = process.timestep;

    // 1. Buffer promotion: every predicate's relation is replaced by
    // whatever the buffer holds for it at this timestep (empty if absent).
    let promoted = process.async_buffer.remove(&timestep).unwrap_or_default();
    for predicate in process.program.predicates() {
        let relation = promoted.get(&predicate).cloned().unwrap_or_default();
        process.database.insert(predicate, relation);
    }

    // 2. Constant-time rules whose timestamp matches the current timestep.
    for rule in &process.program.rules {
        if let crate::ast::RuleKind::ConstantTime(t) = rule.kind {
            if t == timestep {
                let derived = eval_rule(&process.database, rule);
                process.database.entry(rule.head.predicate.clone()).or_default().extend(derived);
            }
        }
    }

    // 3. Deductive saturation.
    deductive_fixpoint(&process.program, &mut process.database);

    // 4. Inductive scheduling: derived tuples persist into the next
    // timestep's buffer.
    let next_timestep = timestep + 1;
    for rule in process.program.rules.iter().filter(|r| r.is_inductive()) {
        let derived = eval_rule(&process.database, rule);
        process
            .async_buffer
            .entry(next_timestep)
            .or_default()
            .entry(rule.head.predicate.clone())
            .or_default()
            .extend(derived);
    }

    // 5. Asynchronous scheduling: each derived tuple is delivered at
    // `timestep + randint()`, independently.
    for rule in process.program.rules.iter().filter(|r| r.is_async()) {
        let derived = eval_rule(&process.database, rule);
        for tuple in derived {
            let delivery = timestep + process.randint.next();
            process
                .async_buffer
                .entry(delivery)
                .or_default()
                .entry(rule.head.predicate.clone())
                .or_default()
                .insert(tuple);
        }
    }

    // 6. Timestep advance.
    process.timestep = next_timestep;
    process
}

pub fn run(mut process: Process, timesteps: u64) -> Process {
    for _ in 0..timesteps {
        process = step(process);
    }
    process
}
