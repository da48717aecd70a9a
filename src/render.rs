//! Tabular rendering of a [`crate::eval::Process`] using `comfy-table`:
//! current timestep, one table per non-empty predicate relation, and the
//! future-facts buffer grouped by delivery timestep.

use std::fmt::Write as _;

use comfy_table::{Cell, ContentArrangement, Table};

use crate::eval::Process;

fn relation_table(predicate: &str, relation: &std::collections::HashSet<Vec<String>>) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![Cell::new(predicate)]);

    let mut rows: Vec<String> = relation.iter().map(|tuple| format!("({})", tuple.join(", "))).collect();
    rows.sort();
    for row in rows {
        table.add_row(vec![row]);
    }
    table
}

/// Renders `process`'s current database and pending async/inductive
/// buffer as a sequence of tables, one per non-empty predicate, preceded
/// by the current timestep and followed by the buffer grouped by
/// delivery timestep.
pub fn render_process(process: &Process) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "timestep: {}", process.timestep);

    let mut predicates: Vec<&crate::ast::Predicate> = process.database.keys().collect();
    predicates.sort();
    for predicate in predicates {
        let relation = &process.database[predicate];
        if relation.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{}", relation_table(&predicate.to_string(), relation));
    }

    if process.async_buffer.is_empty() {
        return out;
    }

    let _ = writeln!(out, "pending:");
    for (&timestep, relations) in &process.async_buffer {
        let _ = writeln!(out, "  @ {timestep}:");
        let mut predicates: Vec<&crate::ast::Predicate> = relations.keys().collect();
        predicates.sort();
        for predicate in predicates {
            let relation = &relations[predicate];
            if relation.is_empty() {
                continue;
            }
            let _ = writeln!(out, "{}", relation_table(&predicate.to_string(), relation));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Atom, Predicate, Program, Rule, RuleKind, Term};
    use crate::eval::{spawn, step, UniformRandInt};

    #[test]
    fn renders_current_timestep_and_nonempty_relations() {
        let program = Program::new(vec![Rule::new(
            Atom::new(Predicate::new("p"), vec![Term::constant("a", true)]),
            RuleKind::ConstantTime(0),
            vec![],
        )]);
        let process = step(spawn(program, Some(Box::new(UniformRandInt::new(1, 1)))));
        let rendered = render_process(&process);
        assert!(rendered.contains("timestep: 1"));
        assert!(rendered.contains('p'));
        assert!(rendered.contains('a'));
    }
}
