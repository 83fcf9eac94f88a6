use super::errors::AnalysisError;
use hashbrown::{HashMap, HashSet};
use std::collections::{BTreeMap, BTreeSet};

/// A directed graph between named vertices (vertex => successors)
pub type Graph = BTreeMap<String, BTreeSet<String>>;

/// Split a graph's vertices into its strongly connected components (Tarjan's algorithm)
///
/// Vertices without a self-loop and outside of any cycle are still returned, as singleton components.
/// Successors missing from `graph`'s keys are treated as vertices without outgoing edges.
pub fn strongly_connected_components<'a>(
    vertices: impl IntoIterator<Item = &'a str>,
    graph: &'a Graph,
) -> Vec<BTreeSet<String>> {
    let mut tarjan = Tarjan {
        graph,
        index: HashMap::new(),
        lowlink: HashMap::new(),
        stack: vec![],
        on_stack: HashSet::new(),
        next_index: 0,
        components: vec![],
    };

    for vertex in vertices {
        if !tarjan.index.contains_key(&vertex) {
            tarjan.visit(vertex);
        }
    }

    tarjan.components
}

/// (Internal) State of a Tarjan traversal
struct Tarjan<'a> {
    graph: &'a Graph,
    index: HashMap<&'a str, usize>,
    lowlink: HashMap<&'a str, usize>,
    stack: Vec<&'a str>,
    on_stack: HashSet<&'a str>,
    next_index: usize,
    components: Vec<BTreeSet<String>>,
}

impl<'a> Tarjan<'a> {
    fn visit(&mut self, vertex: &'a str) {
        self.index.insert(vertex, self.next_index);
        self.lowlink.insert(vertex, self.next_index);
        self.next_index += 1;

        self.stack.push(vertex);
        self.on_stack.insert(vertex);

        let graph = self.graph;

        for successor in graph.get(vertex).into_iter().flatten() {
            let successor = successor.as_str();

            if !self.index.contains_key(&successor) {
                self.visit(successor);
                self.lower(vertex, self.lowlink[&successor]);
            } else if self.on_stack.contains(&successor) {
                self.lower(vertex, self.index[&successor]);
            }
        }

        // The vertex is the root of a component: pop it from the stack
        if self.lowlink[&vertex] == self.index[&vertex] {
            let mut component = BTreeSet::new();

            while let Some(member) = self.stack.pop() {
                self.on_stack.remove(&member);
                component.insert(member.to_string());

                if member == vertex {
                    break;
                }
            }

            self.components.push(component);
        }
    }

    fn lower(&mut self, vertex: &'a str, candidate: usize) {
        if let Some(lowlink) = self.lowlink.get_mut(&vertex) {
            *lowlink = (*lowlink).min(candidate);
        }
    }
}

/// Enumerate the cycles of a strongly connected component, starting from a given vertex
///
/// The graph is first restricted to the edges between members of `scc`.
/// Each returned cycle is the visited path followed by the vertex that closed it,
/// which is not necessarily `start` (sub-cycles met along the way are reported as well).
pub fn find_cycles_in_scc(
    graph: &Graph,
    scc: &BTreeSet<String>,
    start: &str,
) -> Result<Vec<Vec<String>>, AnalysisError> {
    if !scc.contains(start) {
        return Err(AnalysisError::StartNotInScc(start.to_string()));
    }

    let missing = scc
        .iter()
        .filter(|vertex| !graph.contains_key(*vertex))
        .cloned()
        .collect::<Vec<_>>();

    if !missing.is_empty() {
        return Err(AnalysisError::MissingVertices(missing));
    }

    // Only keep the edges staying inside of the component
    let scc_graph = scc
        .iter()
        .map(|vertex| {
            let successors = graph
                .get(vertex)
                .into_iter()
                .flatten()
                .filter(|successor| scc.contains(*successor))
                .map(String::as_str)
                .collect::<Vec<_>>();

            (vertex.as_str(), successors)
        })
        .collect::<BTreeMap<_, _>>();

    let mut cycles = vec![];
    find_cycles_from(&scc_graph, start, &mut vec![], &mut cycles);
    Ok(cycles)
}

fn find_cycles_from<'a>(
    graph: &BTreeMap<&'a str, Vec<&'a str>>,
    vertex: &'a str,
    path: &mut Vec<&'a str>,
    cycles: &mut Vec<Vec<String>>,
) {
    if path.contains(&vertex) {
        let mut cycle = path.iter().map(|v| v.to_string()).collect::<Vec<_>>();
        cycle.push(vertex.to_string());
        cycles.push(cycle);
        return;
    }

    path.push(vertex);

    for successor in graph.get(vertex).into_iter().flatten() {
        find_cycles_from(graph, successor, path, cycles);
    }

    path.pop();
}
