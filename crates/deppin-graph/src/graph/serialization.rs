//! Serialization methods for DependencyGraph.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::DependencyGraph;
use crate::{GraphError, ImportPath, Result, Revision, WorldId};

/// Helper to escape labels for DOT format.
fn escape_label(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

#[derive(Debug, Serialize, Deserialize)]
struct EdgeJson {
    from: Revision,
    to: Revision,
    worlds: BTreeSet<WorldId>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GraphJson {
    root: ImportPath,
    nodes: Vec<Revision>,
    edges: Vec<EdgeJson>,
}

impl DependencyGraph {
    /// Export the graph as canonical, pretty-printed JSON.
    ///
    /// Identical graphs serialize to identical bytes.
    pub fn to_json(&self) -> Result<String> {
        let graph_json = GraphJson {
            root: self.root.name.clone(),
            nodes: self.nodes.iter().cloned().collect(),
            edges: self
                .edges()
                .map(|edge| EdgeJson {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    worlds: edge.worlds.clone(),
                })
                .collect(),
        };

        serde_json::to_string_pretty(&graph_json)
            .map_err(|e| GraphError::Serialization(format!("Failed to serialize graph: {e}")))
    }

    /// Rebuild a graph from [`to_json`](Self::to_json) output, validating
    /// the structural invariants.
    pub fn from_json(json: &str) -> Result<Self> {
        let parsed: GraphJson = serde_json::from_str(json)
            .map_err(|e| GraphError::Serialization(format!("Failed to parse graph: {e}")))?;

        let nodes: BTreeSet<Revision> = parsed.nodes.into_iter().collect();

        let root = Revision::root(parsed.root);
        if !nodes.contains(&root) {
            return Err(GraphError::UnknownNode(root));
        }

        let mut edges: BTreeMap<Revision, BTreeMap<Revision, BTreeSet<WorldId>>> =
            BTreeMap::new();
        for edge in parsed.edges {
            edges
                .entry(edge.from)
                .or_default()
                .entry(edge.to)
                .or_default()
                .extend(edge.worlds);
        }

        let graph = Self {
            root,
            nodes,
            edges,
        };
        graph.validate()?;
        Ok(graph)
    }

    /// Export the graph as DOT format for visualization.
    pub fn to_dot(&self) -> String {
        let mut output = String::from("digraph DependencyGraph {\n");

        for revision in &self.nodes {
            output.push_str("    \"");
            output.push_str(&escape_label(&revision.to_string()));
            output.push_str("\";\n");
        }

        for edge in self.edges() {
            output.push_str("    \"");
            output.push_str(&escape_label(&edge.from.to_string()));
            output.push_str("\" -> \"");
            output.push_str(&escape_label(&edge.to.to_string()));
            output.push_str("\";\n");
        }

        output.push_str("}\n");
        output
    }
}

#[cfg(test)]
mod tests {
    use crate::{DependencyGraph, GraphBuilder, ImportPath, Revision, WorldId};

    fn p(s: &str) -> ImportPath {
        ImportPath::new(s).unwrap()
    }

    fn sample() -> DependencyGraph {
        let root = Revision::root(p("example.org/app"));
        let lib = Revision::pinned(p("example.org/lib"), "v1.2.3");
        let mut builder = GraphBuilder::new(root.clone());
        let host = WorldId::host();
        builder.merge_node(lib.clone(), &host).unwrap();
        builder.add_edge(&root, &lib, &host).unwrap();
        builder.build()
    }

    #[test]
    fn json_is_stable_and_reloadable() {
        let graph = sample();
        let first = graph.to_json().unwrap();
        let second = graph.to_json().unwrap();
        assert_eq!(first, second);

        let reloaded = DependencyGraph::from_json(&first).unwrap();
        assert_eq!(reloaded, graph);
    }

    #[test]
    fn from_json_rejects_orphans() {
        let json = r#"{
            "root": "app",
            "nodes": [
                { "name": "app", "revision": "" },
                { "name": "lonely", "revision": "v1" }
            ],
            "edges": []
        }"#;
        assert!(DependencyGraph::from_json(json).is_err());
    }

    #[test]
    fn json_keeps_every_revision_of_a_name() {
        let root = Revision::root(p("app"));
        let outer = Revision::pinned(p("y"), "outer");
        let inner = Revision::pinned(p("y"), "inner");
        let x = Revision::pinned(p("x"), "v1");
        let host = WorldId::host();
        let mut builder = GraphBuilder::new(root.clone());
        builder
            .merge_world(&host, [outer.clone(), inner.clone(), x.clone()])
            .unwrap();
        builder.add_edge(&root, &outer, &host).unwrap();
        builder.add_edge(&root, &x, &host).unwrap();
        builder.add_edge(&x, &inner, &host).unwrap();
        let graph = builder.build();

        let reloaded = DependencyGraph::from_json(&graph.to_json().unwrap()).unwrap();
        assert_eq!(reloaded.revisions(&p("y")).count(), 2);
        assert_eq!(reloaded, graph);
    }

    #[test]
    fn dot_output_lists_nodes_and_edges() {
        let dot = sample().to_dot();
        assert!(dot.starts_with("digraph DependencyGraph {"));
        assert!(dot.contains("\"example.org/app\" -> \"example.org/lib@v1.2.3\";"));
    }
}
