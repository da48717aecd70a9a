//! Surface syntax parser, built with `pest`: a `#[derive(Parser)]` struct
//! bound to a `.pest` grammar file, plus a hand-written tree-to-AST walk
//! function per grammar production.

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::ast::{Atom, Literal, Predicate, Program, RuleKind, Term};
use crate::error::{ParseError, ParseResult};

#[derive(Parser)]
#[grammar = "datalog.pest"]
pub struct DatalogParser;

fn parse_term(pair: Pair<Rule>) -> Term {
    debug_assert_eq!(pair.as_rule(), Rule::term);
    let mut inner = pair.into_inner();
    let first = inner.next().expect("term always has at least one child");
    let (is_location, ident) = if first.as_rule() == Rule::location_marker {
        (true, inner.next().expect("location marker is followed by an identifier"))
    } else {
        (false, first)
    };

    match ident.as_rule() {
        Rule::constant_id => Term::constant(ident.as_str(), is_location),
        Rule::variable_id => Term::variable(ident.as_str(), is_location),
        other => unreachable!("unexpected term child rule {other:?}"),
    }
}

fn parse_atom(pair: Pair<Rule>) -> Atom {
    debug_assert_eq!(pair.as_rule(), Rule::atom);
    let mut inner = pair.into_inner();
    let predicate = Predicate::new(inner.next().expect("atom always has a predicate").as_str());
    let terms = inner
        .next()
        .map(|term_list| term_list.into_inner().map(parse_term).collect())
        .unwrap_or_default();
    Atom::new(predicate, terms)
}

fn parse_literal(pair: Pair<Rule>) -> Literal {
    debug_assert_eq!(pair.as_rule(), Rule::literal);
    let mut inner = pair.into_inner();
    let first = inner.next().expect("literal always has at least one child");
    if first.as_rule() == Rule::negation {
        let atom = parse_atom(inner.next().expect("negation is followed by an atom"));
        Literal::negative(atom)
    } else {
        Literal::positive(parse_atom(first))
    }
}

fn parse_rule_kind(pair: Option<Pair<Rule>>) -> RuleKind {
    match pair {
        None => RuleKind::Deductive,
        Some(pair) => match pair.as_str() {
            "@next" => RuleKind::Inductive,
            "@async" => RuleKind::Async,
            annotation => {
                let timestamp: u64 = annotation
                    .trim_start_matches('@')
                    .parse()
                    .expect("natural rule already validated by the grammar");
                RuleKind::ConstantTime(timestamp)
            }
        },
    }
}

fn parse_rule(pair: Pair<Rule>) -> crate::ast::Rule {
    debug_assert_eq!(pair.as_rule(), Rule::rule_stmt);
    let mut inner = pair.into_inner();

    let head_pair = inner.next().expect("rule_stmt always has a head atom");
    let head = parse_atom(head_pair.into_inner().next().expect("atom_head wraps exactly one atom"));

    let mut annotation = None;
    let mut body = Vec::new();
    for next in inner {
        match next.as_rule() {
            Rule::rule_annotation => annotation = Some(next),
            Rule::literal_list => body = next.into_inner().map(parse_literal).collect(),
            other => unreachable!("unexpected rule_stmt child rule {other:?}"),
        }
    }

    crate::ast::Rule::new(head, parse_rule_kind(annotation), body)
}

/// Parses a full Dedalus source document into a [`Program`]. Does not
/// desugar or typecheck; callers run [`crate::desugar::desugar`] and
/// [`crate::typecheck::typecheck`] afterward.
pub fn parse_program(source: &str) -> ParseResult<Program> {
    let mut pairs = DatalogParser::parse(Rule::program, source).map_err(ParseError::from)?;
    let program_pair = pairs.next().expect("grammar guarantees exactly one `program` pair");

    let rules = program_pair
        .into_inner()
        .filter(|pair| pair.as_rule() == Rule::rule_stmt)
        .map(parse_rule)
        .collect();

    Ok(Program::new(rules))
}
