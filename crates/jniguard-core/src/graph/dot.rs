//! Graphviz export of the dependency graph, and the reader for it
//!
//! Every node carries its identity fields as attributes, so an exported file
//! re-parses into the same vertex and edge sets.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::Write;

use graphviz_rust::dot_structures as dot;
use graphviz_rust::printer::{DotPrinter, PrinterContext};
use petgraph::visit::EdgeRef;

use super::{DependencyGraph, EnclNamePosTuple, UnsafeUse, Vertex};

// DOT attribute keys
const KIND: &str = "kind";
const VAR: &str = "var";
const FUNCTION: &str = "function";
const FILE: &str = "file";
const POSITION: &str = "position";
const UNSAFE_FUNCTION: &str = "unsafe_function";
const LABEL: &str = "label";

const OCCURRENCE: &str = "occurrence";
const MARKER: &str = "marker";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DotError {
    #[error("Invalid DOT: {0}")]
    Parse(String),
    #[error("Expected a digraph")]
    NotADigraph,
    #[error("Node {node} is missing attribute '{name}'")]
    MissingAttribute { node: String, name: &'static str },
    #[error("Node {node} has unknown kind '{kind}'")]
    UnknownKind { node: String, kind: String },
    #[error("Edge refers to undeclared node {node}")]
    UnknownNode { node: String },
    #[error("Edges between subgraphs are not supported")]
    SubgraphEdge,
}

/// Quotes `value` as a DOT string. Control characters are escaped so that
/// every statement stays on one line.
fn quoted(value: &str) -> dot::Id {
    let mut text = String::with_capacity(value.len() + 2);
    text.push('"');
    for ch in value.chars() {
        match ch {
            '"' => text.push_str("\\\""),
            '\\' => text.push_str("\\\\"),
            '\n' => text.push_str("\\n"),
            '\r' => text.push_str("\\r"),
            '\t' => text.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(text, "\\u{:04x}", c as u32);
            }
            c => text.push(c),
        }
    }
    text.push('"');
    dot::Id::Escaped(text)
}

/// Returns the string form of a DOT id, undoing [`quoted`].
fn id_str(id: &dot::Id) -> Cow<'_, str> {
    match id {
        dot::Id::Html(s) | dot::Id::Plain(s) | dot::Id::Anonymous(s) => Cow::Borrowed(s),
        dot::Id::Escaped(s) => {
            let inner = s
                .strip_prefix('"')
                .and_then(|rest| rest.strip_suffix('"'))
                .unwrap_or(s);
            Cow::Owned(unescape(inner))
        }
    }
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn node_id(index: usize) -> dot::NodeId {
    dot::NodeId(dot::Id::Plain(format!("n{index}")), None)
}

fn attr(name: &str, value: &str) -> dot::Attribute {
    dot::Attribute(dot::Id::Plain(name.to_string()), quoted(value))
}

fn node_statement(index: usize, vertex: &Vertex) -> dot::Stmt {
    let kind = if vertex.is_marker() { MARKER } else { OCCURRENCE };
    let mut attributes = vec![
        attr(KIND, kind),
        attr(VAR, vertex.var_name()),
        attr(FUNCTION, vertex.function_name()),
        attr(FILE, vertex.file_name()),
        attr(POSITION, vertex.position()),
    ];
    if let Vertex::Marker(marker) = vertex {
        attributes.push(attr(UNSAFE_FUNCTION, &marker.unsafe_function));
    }
    attributes.push(attr(LABEL, &vertex.to_string()));
    dot::Stmt::Node(dot::Node::new(node_id(index), attributes))
}

impl DependencyGraph {
    fn dot_graph(&self) -> dot::Graph {
        let graph = self.inner();
        let nodes = graph
            .node_indices()
            .map(|idx| node_statement(idx.index(), &graph[idx]));
        let edges = graph.edge_references().map(|edge| {
            dot::Stmt::Edge(dot::Edge {
                ty: dot::EdgeTy::Pair(
                    dot::Vertex::N(node_id(edge.source().index())),
                    dot::Vertex::N(node_id(edge.target().index())),
                ),
                attributes: Vec::new(),
            })
        });

        dot::Graph::DiGraph {
            id: dot::Id::Plain("jniguard".to_string()),
            strict: true,
            stmts: nodes.chain(edges).collect(),
        }
    }

    pub fn to_dot(&self) -> String {
        self.dot_graph().print(&mut PrinterContext::default())
    }

    pub fn from_dot(text: &str) -> Result<Self, DotError> {
        let parsed = graphviz_rust::parse(text).map_err(DotError::Parse)?;
        let dot::Graph::DiGraph { stmts, .. } = parsed else {
            return Err(DotError::NotADigraph);
        };

        let mut graph = DependencyGraph::new();
        let mut nodes: HashMap<String, Vertex> = HashMap::new();
        for stmt in &stmts {
            if let dot::Stmt::Node(node) = stmt {
                let id = id_str(&node.id.0).into_owned();
                let vertex = parse_vertex(&id, &node.attributes)?;
                graph.add_vertex(vertex.clone());
                nodes.insert(id, vertex);
            }
        }

        for stmt in &stmts {
            let dot::Stmt::Edge(edge) = stmt else {
                continue;
            };
            let chain: Vec<&dot::Vertex> = match &edge.ty {
                dot::EdgeTy::Pair(source, target) => vec![source, target],
                dot::EdgeTy::Chain(vertices) => vertices.iter().collect(),
            };
            for pair in chain.windows(2) {
                let source = declared(&nodes, pair[0])?;
                let target = declared(&nodes, pair[1])?;
                graph.ensure_edge(source, target);
            }
        }

        Ok(graph)
    }
}

fn declared<'a>(
    nodes: &'a HashMap<String, Vertex>,
    vertex: &dot::Vertex,
) -> Result<&'a Vertex, DotError> {
    let dot::Vertex::N(node) = vertex else {
        return Err(DotError::SubgraphEdge);
    };
    let id = id_str(&node.0);
    match nodes.get(id.as_ref()) {
        Some(found) => Ok(found),
        None => Err(DotError::UnknownNode {
            node: id.into_owned(),
        }),
    }
}

fn parse_vertex(node: &str, attributes: &[dot::Attribute]) -> Result<Vertex, DotError> {
    let values: HashMap<Cow<'_, str>, Cow<'_, str>> = attributes
        .iter()
        .map(|dot::Attribute(key, value)| (id_str(key), id_str(value)))
        .collect();
    let field = |name: &'static str| {
        values
            .get(name)
            .map(|value| value.to_string())
            .ok_or_else(|| DotError::MissingAttribute {
                node: node.to_string(),
                name,
            })
    };

    let kind = field(KIND)?;
    let var = field(VAR)?;
    let function = field(FUNCTION)?;
    let file = field(FILE)?;
    let position = field(POSITION)?;

    match kind.as_str() {
        OCCURRENCE => Ok(Vertex::from(EnclNamePosTuple::new(
            &var, &function, &file, &position,
        ))),
        MARKER => Ok(Vertex::from(UnsafeUse {
            var_name: var,
            function_name: function,
            file_name: file,
            position,
            unsafe_function: field(UNSAFE_FUNCTION)?,
        })),
        _ => Err(DotError::UnknownKind {
            node: node.to_string(),
            kind,
        }),
    }
}
