use super::errors::AnalysisError;
use super::graph::{find_cycles_in_scc, strongly_connected_components, Graph};
use crate::grammar::{Grammar, Rule};
use hashbrown::HashMap;

/// Map of rule names to their index in the grammar
fn rule_index(grammar: &Grammar) -> HashMap<String, usize> {
    grammar
        .rules()
        .iter()
        .enumerate()
        .map(|(i, rule)| (rule.name().to_string(), i))
        .collect()
}

/// Compute the `nullable` flag of every rule
///
/// Rules are evaluated again and again until a full pass doesn't change any flag,
/// as a rule's nullability depends on the rules it refers to.
pub fn compute_nullables(grammar: &mut Grammar) {
    let index = rule_index(grammar);

    loop {
        let mut changed = false;

        for i in 0..grammar.rules().len() {
            let nullable = {
                let rules = grammar.rules();
                rules[i]
                    .expr()
                    .is_nullable(&|name| index.get(name).map_or(false, |&j| rules[j].nullable))
            };

            let rule = &mut grammar.rules_mut()[i];

            if rule.nullable != nullable {
                rule.nullable = nullable;
                changed = true;
            }
        }

        if !changed {
            break;
        }
    }
}

/// Build the graph of the rules each rule may call before consuming any input
///
/// Every rule is a vertex, as is every name referred to without being declared.
/// Nullability must have been computed beforehand.
pub fn make_first_graph(grammar: &Grammar) -> Graph {
    let index = rule_index(grammar);
    let rules = grammar.rules();
    let nullable = |name: &str| index.get(name).map_or(false, |&i| rules[i].is_nullable());

    let mut graph = rules
        .iter()
        .map(|rule| (rule.name().to_string(), rule.expr().initial_names(&nullable)))
        .collect::<Graph>();

    let undeclared = graph
        .values()
        .flatten()
        .filter(|name| !graph.contains_key(*name))
        .cloned()
        .collect::<Vec<_>>();

    for name in undeclared {
        graph.entry(name).or_default();
    }

    graph
}

/// Flag the left-recursive rules and elect a leader in each left-recursive group
///
/// Returns `true` if any left recursion was found.
pub fn compute_left_recursives(grammar: &mut Grammar) -> Result<bool, AnalysisError> {
    let graph = make_first_graph(grammar);
    let index = rule_index(grammar);
    let sccs = strongly_connected_components(graph.keys().map(String::as_str), &graph);

    let mut flag = |name: &str, update: fn(&mut Rule)| {
        if let Some(&i) = index.get(name) {
            update(&mut grammar.rules_mut()[i]);
        }
    };

    let mut has_left_recursion = false;

    for scc in &sccs {
        // Single rule: only left-recursive if it calls itself directly
        if scc.len() == 1 {
            for name in scc {
                if graph.get(name).map_or(false, |calls| calls.contains(name)) {
                    log::debug!("rule {} is directly left-recursive", name);
                    flag(name, |rule| {
                        rule.left_recursive = true;
                        rule.leader = true;
                    });
                    has_left_recursion = true;
                }
            }

            continue;
        }

        for name in scc {
            flag(name, |rule| rule.left_recursive = true);
        }

        // The leader must be part of every single cycle of the group
        let mut leaders = scc.clone();

        for start in scc {
            for cycle in find_cycles_in_scc(&graph, scc, start)? {
                leaders.retain(|candidate| cycle.contains(candidate));

                if leaders.is_empty() {
                    return Err(AnalysisError::NoLeader(scc.iter().cloned().collect()));
                }
            }
        }

        // Candidates are sorted, so the election is deterministic
        if let Some(leader) = leaders.iter().next() {
            log::debug!(
                "left-recursive group {:?} is led by rule {}",
                scc,
                leader
            );
            flag(leader, |rule| rule.leader = true);
        }

        has_left_recursion = true;
    }

    Ok(has_left_recursion)
}
