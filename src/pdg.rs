//! Predicate dependency graph, stratification, and Dedalus^S classification.
//!
//! Stratification is decided via Tarjan's SCC + condensation + "no negative
//! edge inside any SCC", which is equivalent to asking whether any simple
//! directed cycle contains a negative edge, without needing to enumerate
//! cycles directly — a directed edge lies on some simple cycle iff its
//! endpoints share a strongly connected component. See `DESIGN.md`.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use crate::ast::{Predicate, Program};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeLabel {
    pub negative: bool,
    pub is_async: bool,
}

/// Directed graph over predicates. An edge `q -> p` means some rule with
/// head `p` has a body literal on `q`.
#[derive(Debug, Clone, Default)]
pub struct Pdg {
    pub vertices: BTreeSet<Predicate>,
    pub edges: HashMap<(Predicate, Predicate), EdgeLabel>,
}

impl Pdg {
    fn add_edge(&mut self, from: Predicate, to: Predicate, negative: bool, is_async: bool) {
        let label = self.edges.entry((from, to)).or_default();
        label.negative |= negative;
        label.is_async |= is_async;
    }

    fn successors(&self, v: &Predicate) -> Vec<Predicate> {
        let mut out: Vec<Predicate> =
            self.edges.keys().filter(|(from, _)| from == v).map(|(_, to)| to.clone()).collect();
        out.sort();
        out.dedup();
        out
    }
}

/// Full PDG over every rule in the program.
pub fn pdg(program: &Program) -> Pdg {
    let mut g = Pdg { vertices: program.predicates(), edges: HashMap::new() };
    for rule in &program.rules {
        let p = rule.head.predicate.clone();
        for literal in &rule.body {
            let q = literal.atom.predicate.clone();
            g.add_edge(q, p.clone(), literal.is_negative(), rule.is_async());
        }
    }
    g
}

/// PDG restricted to deductive rules; vertex set is predicates heading some
/// deductive rule, edges only between those vertices, `async` labels
/// omitted.
pub fn deductive_pdg(program: &Program) -> Pdg {
    let deductive_rules: Vec<_> = program.rules.iter().filter(|r| r.is_deductive()).collect();
    let vertices: BTreeSet<Predicate> =
        deductive_rules.iter().map(|r| r.head.predicate.clone()).collect();

    let mut g = Pdg { vertices: vertices.clone(), edges: HashMap::new() };
    for rule in deductive_rules {
        let p = rule.head.predicate.clone();
        for literal in &rule.body {
            let q = literal.atom.predicate.clone();
            if !vertices.contains(&q) {
                continue;
            }
            g.add_edge(q, p.clone(), literal.is_negative(), false);
        }
    }
    g
}

struct Tarjan<'a> {
    graph: &'a Pdg,
    counter: usize,
    stack: Vec<Predicate>,
    on_stack: HashSet<Predicate>,
    indices: HashMap<Predicate, usize>,
    lowlinks: HashMap<Predicate, usize>,
    sccs: Vec<Vec<Predicate>>,
}

impl<'a> Tarjan<'a> {
    fn new(graph: &'a Pdg) -> Self {
        Tarjan {
            graph,
            counter: 0,
            stack: Vec::new(),
            on_stack: HashSet::new(),
            indices: HashMap::new(),
            lowlinks: HashMap::new(),
            sccs: Vec::new(),
        }
    }

    fn strongconnect(&mut self, v: &Predicate) {
        self.indices.insert(v.clone(), self.counter);
        self.lowlinks.insert(v.clone(), self.counter);
        self.counter += 1;
        self.stack.push(v.clone());
        self.on_stack.insert(v.clone());

        let successors = self.graph.successors(v);
        for w in successors {
            if !self.indices.contains_key(&w) {
                self.strongconnect(&w);
                let w_low = self.lowlinks[&w];
                let v_low = self.lowlinks[v];
                self.lowlinks.insert(v.clone(), v_low.min(w_low));
            } else if self.on_stack.contains(&w) {
                let w_idx = self.indices[&w];
                let v_low = self.lowlinks[v];
                self.lowlinks.insert(v.clone(), v_low.min(w_idx));
            }
        }

        if self.lowlinks[v] == self.indices[v] {
            let mut component = Vec::new();
            loop {
                let w = self.stack.pop().expect("tarjan: root's own component is still on the stack");
                self.on_stack.remove(&w);
                let done = w == *v;
                component.push(w);
                if done {
                    break;
                }
            }
            self.sccs.push(component);
        }
    }

    fn run(mut self) -> Vec<Vec<Predicate>> {
        let vertices: Vec<Predicate> = self.graph.vertices.iter().cloned().collect();
        for v in vertices {
            if !self.indices.contains_key(&v) {
                self.strongconnect(&v);
            }
        }
        self.sccs
    }
}

/// Strongly connected components of `graph`, in no particular order.
pub fn tarjan_scc(graph: &Pdg) -> Vec<Vec<Predicate>> {
    Tarjan::new(graph).run()
}

fn component_index(sccs: &[Vec<Predicate>]) -> HashMap<Predicate, usize> {
    let mut index = HashMap::new();
    for (i, component) in sccs.iter().enumerate() {
        for p in component {
            index.insert(p.clone(), i);
        }
    }
    index
}

/// A PDG is stratified iff no simple directed cycle contains a negative
/// edge, which holds iff no negative edge has both endpoints in the same
/// SCC of the condensation.
pub fn is_stratified_graph(graph: &Pdg) -> bool {
    let sccs = tarjan_scc(graph);
    let component_of = component_index(&sccs);
    graph
        .edges
        .iter()
        .all(|((from, to), label)| !label.negative || component_of[from] != component_of[to])
}

pub fn is_stratified(program: &Program) -> bool {
    is_stratified_graph(&pdg(program))
}

pub fn is_deductive_stratified(program: &Program) -> bool {
    is_stratified_graph(&deductive_pdg(program))
}

/// SCCs of the deductive PDG, in topological order of the condensation
/// (earlier strata have no dependency on later ones) — the evaluation
/// order §4.5.3's stratified fixpoint runs rule evaluation in.
pub fn strata(program: &Program) -> Vec<Vec<Predicate>> {
    let graph = deductive_pdg(program);
    let sccs = tarjan_scc(&graph);
    let component_of = component_index(&sccs);

    let n = sccs.len();
    let mut adjacency: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
    for (from, to) in graph.edges.keys() {
        let a = component_of[from];
        let b = component_of[to];
        if a != b {
            adjacency[a].insert(b);
        }
    }

    let mut indegree = vec![0usize; n];
    for targets in &adjacency {
        for &b in targets {
            indegree[b] += 1;
        }
    }

    let mut queue: VecDeque<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    while let Some(u) = queue.pop_front() {
        order.push(u);
        for &v in &adjacency[u] {
            indegree[v] -= 1;
            if indegree[v] == 0 {
                queue.push_back(v);
            }
        }
    }

    order.into_iter().map(|i| sccs[i].clone()).collect()
}

/// For every predicate heading an async rule, is there an inductive
/// persistence rule `p(terms)@next :- p(terms).` copying it forward
/// unchanged?
pub fn has_guarded_asynchrony(program: &Program) -> bool {
    let async_predicates: BTreeSet<Predicate> = program
        .rules
        .iter()
        .filter(|r| r.is_async())
        .map(|r| r.head.predicate.clone())
        .collect();

    let guarded_predicates: BTreeSet<Predicate> = program
        .rules
        .iter()
        .filter(|r| {
            r.is_inductive()
                && async_predicates.contains(&r.head.predicate)
                && r.body.len() == 1
                && r.body[0].is_positive()
                && r.body[0].atom.predicate == r.head.predicate
                && r.body[0].atom.terms == r.head.terms
        })
        .map(|r| r.head.predicate.clone())
        .collect();

    async_predicates == guarded_predicates
}

/// A program is Dedalus^S iff every EDB predicate is persistent, it has
/// guarded asynchrony, it has no constant-time rules, and its PDG is
/// stratified.
pub fn is_dedalus_s(program: &Program) -> bool {
    let has_constant_time = program.rules.iter().any(|r| r.is_constant_time());
    program.edb() == program.persistent_edb()
        && has_guarded_asynchrony(program)
        && !has_constant_time
        && is_stratified(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Atom, Literal, Rule, RuleKind, Term};

    fn p(name: &str) -> Predicate {
        Predicate::new(name)
    }

    fn rule(head: &str, kind: RuleKind, body: &[&str]) -> Rule {
        Rule::new(
            Atom::new(p(head), vec![Term::variable("_L", true)]),
            kind,
            body.iter()
                .map(|q| Literal::positive(Atom::new(p(q), vec![Term::variable("_L", true)])))
                .collect(),
        )
    }

    #[test]
    fn s2_three_sccs_in_topological_order() {
        // Predicates {a..h}; SCCs {a,b,c}, {d,e}, {f,g,h}; cross edges
        // b->d, a->f, e->g.
        let mut rules = vec![
            rule("b", RuleKind::Deductive, &["a"]),
            rule("c", RuleKind::Deductive, &["b"]),
            rule("a", RuleKind::Deductive, &["c"]),
            rule("e", RuleKind::Deductive, &["d"]),
            rule("d", RuleKind::Deductive, &["e"]),
            rule("g", RuleKind::Deductive, &["f"]),
            rule("h", RuleKind::Deductive, &["g"]),
            rule("f", RuleKind::Deductive, &["h"]),
            rule("d", RuleKind::Deductive, &["b"]),
            rule("f", RuleKind::Deductive, &["a"]),
            rule("g", RuleKind::Deductive, &["e"]),
        ];
        // ensure every predicate heads at least one deductive rule already true above.
        rules.dedup();
        let program = Program::new(rules);
        let strata = strata(&program);

        let as_sets: Vec<BTreeSet<String>> = strata
            .iter()
            .map(|stratum| stratum.iter().map(|x| x.0.clone()).collect())
            .collect();

        let abc: BTreeSet<String> = ["a", "b", "c"].into_iter().map(String::from).collect();
        let de: BTreeSet<String> = ["d", "e"].into_iter().map(String::from).collect();
        let fgh: BTreeSet<String> = ["f", "g", "h"].into_iter().map(String::from).collect();

        assert_eq!(as_sets.len(), 3);
        let pos_abc = as_sets.iter().position(|s| s == &abc).unwrap();
        let pos_de = as_sets.iter().position(|s| s == &de).unwrap();
        let pos_fgh = as_sets.iter().position(|s| s == &fgh).unwrap();
        assert!(pos_abc < pos_de);
        assert!(pos_de < pos_fgh);
    }

    #[test]
    fn s5_guarded_asynchrony() {
        // p(X)@async :- p(X). alone fails.
        let only_async = Program::new(vec![rule("p", RuleKind::Async, &["p"])]);
        assert!(!has_guarded_asynchrony(&only_async));

        // Adding p(X)@next :- p(X). makes it pass.
        let mut rules = only_async.rules.clone();
        rules.push(rule("p", RuleKind::Inductive, &["p"]));
        let guarded = Program::new(rules);
        assert!(has_guarded_asynchrony(&guarded));
    }

    #[test]
    fn negative_self_loop_is_not_stratified() {
        let program = Program::new(vec![Rule::new(
            Atom::new(p("p"), vec![Term::variable("_L", true)]),
            RuleKind::Deductive,
            vec![Literal::negative(Atom::new(p("p"), vec![Term::variable("_L", true)]))],
        )]);
        assert!(!is_stratified(&program));
    }

    #[test]
    fn negative_edge_across_strata_is_stratified() {
        // q is EDB; p negates q. No cycle, so stratified regardless of polarity.
        let program = Program::new(vec![Rule::new(
            Atom::new(p("p"), vec![Term::variable("_L", true)]),
            RuleKind::Deductive,
            vec![Literal::negative(Atom::new(p("q"), vec![Term::variable("_L", true)]))],
        )]);
        assert!(is_stratified(&program));
    }
}
