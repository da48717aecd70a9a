//! Program representation: terms, atoms, literals, rules, and the
//! predicate/IDB/EDB program queries of [`Program`].
//!
//! A closed algebraic description: structural `PartialEq`/`Eq`/`Hash` on
//! every type, exhaustive matches instead of runtime type checks, narrowed
//! to Dedalus's plain constant/variable terms and location-aware atoms.

use std::collections::BTreeSet;
use std::fmt;

/// A term is either a constant or a variable, each optionally marked as a
/// location term (printed with a leading `#`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Constant { symbol: String, is_location: bool },
    Variable { symbol: String, is_location: bool },
}

impl Term {
    pub fn constant(symbol: impl Into<String>, is_location: bool) -> Self {
        Term::Constant { symbol: symbol.into(), is_location }
    }

    pub fn variable(symbol: impl Into<String>, is_location: bool) -> Self {
        Term::Variable { symbol: symbol.into(), is_location }
    }

    pub fn is_location(&self) -> bool {
        match self {
            Term::Constant { is_location, .. } | Term::Variable { is_location, .. } => {
                *is_location
            }
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable { .. })
    }

    pub fn symbol(&self) -> &str {
        match self {
            Term::Constant { symbol, .. } | Term::Variable { symbol, .. } => symbol,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_location() {
            write!(f, "#")?;
        }
        write!(f, "{}", self.symbol())
    }
}

/// Predicate identity is symbol identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Predicate(pub String);

impl Predicate {
    pub fn new(symbol: impl Into<String>) -> Self {
        Predicate(symbol.into())
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Atom {
    pub predicate: Predicate,
    pub terms: Vec<Term>,
}

impl Atom {
    pub fn new(predicate: Predicate, terms: Vec<Term>) -> Self {
        Atom { predicate, terms }
    }

    pub fn arity(&self) -> usize {
        self.terms.len()
    }

    pub fn variables(&self) -> impl Iterator<Item = &Term> {
        self.terms.iter().filter(|t| t.is_variable())
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms = self.terms.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
        write!(f, "{}({})", self.predicate, terms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarity {
    Positive,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    pub polarity: Polarity,
    pub atom: Atom,
}

impl Literal {
    pub fn positive(atom: Atom) -> Self {
        Literal { polarity: Polarity::Positive, atom }
    }

    pub fn negative(atom: Atom) -> Self {
        Literal { polarity: Polarity::Negative, atom }
    }

    pub fn is_positive(&self) -> bool {
        self.polarity == Polarity::Positive
    }

    pub fn is_negative(&self) -> bool {
        self.polarity == Polarity::Negative
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            write!(f, "!")?;
        }
        write!(f, "{}", self.atom)
    }
}

/// The four rule kinds: deductive (holds this timestep), inductive
/// (persists into the next timestep), async (delivered at a randomly chosen
/// future timestep), and constant-time (fires exactly once, at a fixed
/// timestep, with an empty body).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Deductive,
    Inductive,
    Async,
    ConstantTime(u64),
}

impl RuleKind {
    pub fn is_deductive(&self) -> bool {
        matches!(self, RuleKind::Deductive)
    }

    pub fn is_inductive(&self) -> bool {
        matches!(self, RuleKind::Inductive)
    }

    pub fn is_async(&self) -> bool {
        matches!(self, RuleKind::Async)
    }

    pub fn is_constant_time(&self) -> bool {
        matches!(self, RuleKind::ConstantTime(_))
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKind::Deductive => write!(f, ""),
            RuleKind::Inductive => write!(f, "@next"),
            RuleKind::Async => write!(f, "@async"),
            RuleKind::ConstantTime(t) => write!(f, "@{t}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
    pub head: Atom,
    pub kind: RuleKind,
    pub body: Vec<Literal>,
}

impl Rule {
    pub fn new(head: Atom, kind: RuleKind, body: Vec<Literal>) -> Self {
        Rule { head, kind, body }
    }

    pub fn is_deductive(&self) -> bool {
        self.kind.is_deductive()
    }

    pub fn is_inductive(&self) -> bool {
        self.kind.is_inductive()
    }

    pub fn is_async(&self) -> bool {
        self.kind.is_async()
    }

    pub fn is_constant_time(&self) -> bool {
        self.kind.is_constant_time()
    }

    pub fn positive_literals(&self) -> impl Iterator<Item = &Literal> {
        self.body.iter().filter(|l| l.is_positive())
    }

    pub fn negative_literals(&self) -> impl Iterator<Item = &Literal> {
        self.body.iter().filter(|l| l.is_negative())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = self.body.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
        write!(f, "{}{} :- {}.", self.head, self.kind, body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    pub rules: Vec<Rule>,
}

impl Program {
    pub fn new(rules: Vec<Rule>) -> Self {
        Program { rules }
    }

    /// All predicates mentioned anywhere in the program (head or body).
    pub fn predicates(&self) -> BTreeSet<Predicate> {
        let mut predicates = BTreeSet::new();
        for rule in &self.rules {
            predicates.insert(rule.head.predicate.clone());
            for literal in &rule.body {
                predicates.insert(literal.atom.predicate.clone());
            }
        }
        predicates
    }

    /// Predicates heading at least one rule with a non-empty body.
    pub fn idb(&self) -> BTreeSet<Predicate> {
        self.rules
            .iter()
            .filter(|r| !r.body.is_empty())
            .map(|r| r.head.predicate.clone())
            .collect()
    }

    pub fn edb(&self) -> BTreeSet<Predicate> {
        self.predicates().difference(&self.idb()).cloned().collect()
    }

    /// EDB predicates all of whose rules are deductive, i.e. guaranteed to
    /// hold at every timestep rather than only transiently.
    pub fn persistent_edb(&self) -> BTreeSet<Predicate> {
        let edb = self.edb();
        let mut not_persistent = BTreeSet::new();
        for rule in &self.rules {
            if edb.contains(&rule.head.predicate) && !rule.is_deductive() {
                not_persistent.insert(rule.head.predicate.clone());
            }
        }
        edb.difference(&not_persistent).cloned().collect()
    }

    pub fn is_positive(&self) -> bool {
        self.rules.iter().all(|r| r.body.iter().all(Literal::is_positive))
    }

    pub fn is_semipositive(&self) -> bool {
        let idb = self.idb();
        self.rules.iter().all(|r| {
            r.body.iter().all(|l| l.is_positive() || !idb.contains(&l.atom.predicate))
        })
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines = self.rules.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n");
        write!(f, "{lines}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(s: &str) -> Term {
        Term::variable(s, false)
    }

    fn loc(s: &str) -> Term {
        Term::variable(s, true)
    }

    fn atom(p: &str, terms: Vec<Term>) -> Atom {
        Atom::new(Predicate::new(p), terms)
    }

    #[test]
    fn display_matches_surface_syntax() {
        let rule = Rule::new(
            atom("p", vec![loc("_L"), var("X"), var("Y")]),
            RuleKind::Deductive,
            vec![
                Literal::positive(atom("q", vec![loc("_L"), var("X"), var("Z")])),
                Literal::negative(atom("r", vec![loc("_L"), var("Z"), var("Y")])),
            ],
        );
        assert_eq!(rule.to_string(), "p(#_L, X, Y) :- q(#_L, X, Z), !r(#_L, Z, Y).");
    }

    #[test]
    fn constant_time_display() {
        let rule = Rule::new(atom("p", vec![Term::constant("a", true)]), RuleKind::ConstantTime(42), vec![]);
        assert_eq!(rule.to_string(), "p(#a)@42 :- .");
    }

    #[test]
    fn predicates_idb_edb_partition() {
        // p(#a, b)@0 :- .
        // p(#a, b) :- .
        // q(#a, b) :- .
        // q(X) :- p(X).
        // r(X)@next :- p(X), q(X).
        let program = Program::new(vec![
            Rule::new(atom("p", vec![Term::constant("a", true), Term::constant("b", false)]), RuleKind::ConstantTime(0), vec![]),
            Rule::new(atom("p", vec![Term::constant("a", true), Term::constant("b", false)]), RuleKind::Deductive, vec![]),
            Rule::new(atom("q", vec![Term::constant("a", true), Term::constant("b", false)]), RuleKind::Deductive, vec![]),
            Rule::new(atom("q", vec![var("X")]), RuleKind::Deductive, vec![Literal::positive(atom("p", vec![var("X")]))]),
            Rule::new(atom("r", vec![var("X")]), RuleKind::Inductive, vec![
                Literal::positive(atom("p", vec![var("X")])),
                Literal::positive(atom("q", vec![var("X")])),
            ]),
        ]);

        let predicates: BTreeSet<String> = program.predicates().into_iter().map(|p| p.0).collect();
        assert_eq!(predicates, ["p", "q", "r"].into_iter().map(String::from).collect());

        let idb: BTreeSet<String> = program.idb().into_iter().map(|p| p.0).collect();
        assert_eq!(idb, ["q", "r"].into_iter().map(String::from).collect());

        let edb: BTreeSet<String> = program.edb().into_iter().map(|p| p.0).collect();
        assert_eq!(edb, ["p"].into_iter().map(String::from).collect());
    }

    #[test]
    fn non_persistent_edb_has_non_deductive_rule() {
        // S4: p(#a) :- . followed by p(#a)@0 :- . => persistent_edb() = {}
        let program = Program::new(vec![
            Rule::new(atom("p", vec![Term::constant("a", true)]), RuleKind::Deductive, vec![]),
            Rule::new(atom("p", vec![Term::constant("a", true)]), RuleKind::ConstantTime(0), vec![]),
        ]);
        assert!(program.persistent_edb().is_empty());
    }
}
