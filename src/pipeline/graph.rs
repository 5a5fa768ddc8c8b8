// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipespec contributors

//! Artifact flow graph
//!
//! Stages are nodes; an edge `A → B` labelled with an artifact name means
//! stage B consumes something stage A produces. Execution order itself is
//! the stage position, the graph only shows where data travels.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;

use crate::pipeline::PipelineSpec;

/// Data-flow graph of a built pipeline
pub struct FlowGraph {
    graph: DiGraph<String, String>,
    name_to_index: HashMap<String, NodeIndex>,
    /// Nodes in stage order
    order: Vec<NodeIndex>,
    gates: Vec<String>,
}

impl FlowGraph {
    /// Build the flow graph of a specification
    pub fn build(spec: &PipelineSpec) -> Self {
        let mut graph = DiGraph::new();
        let mut name_to_index = HashMap::new();
        let mut order = Vec::with_capacity(spec.stages.len());

        for stage in &spec.stages {
            let node = graph.add_node(stage.name.clone());
            name_to_index.insert(stage.name.clone(), node);
            order.push(node);
        }

        for artifact in &spec.artifacts {
            let Some(&from) = name_to_index.get(&artifact.producer) else {
                continue;
            };
            for consumer in &artifact.consumers {
                if let Some(&to) = name_to_index.get(consumer) {
                    graph.add_edge(from, to, artifact.name.clone());
                }
            }
        }

        let gates = spec.approval_gates().map(|s| s.name.clone()).collect();

        Self {
            graph,
            name_to_index,
            order,
            gates,
        }
    }

    /// Artifacts a stage receives, with the producing stage
    pub fn inputs(&self, stage: &str) -> Option<Vec<(String, String)>> {
        let node = self.name_to_index.get(stage)?;
        let mut inputs: Vec<(String, String)> = self
            .graph
            .edges_directed(*node, Direction::Incoming)
            .map(|e| (e.weight().clone(), self.graph[e.source()].clone()))
            .collect();
        inputs.sort();
        Some(inputs)
    }

    /// Stages that consume anything a stage produces
    pub fn consumers(&self, stage: &str) -> Option<Vec<String>> {
        let node = self.name_to_index.get(stage)?;
        let mut out: Vec<String> = self
            .graph
            .neighbors_directed(*node, Direction::Outgoing)
            .map(|n| self.graph[n].clone())
            .collect();
        out.sort();
        out.dedup();
        Some(out)
    }

    /// Whether data produced by `from` reaches `to`, directly or through other stages
    pub fn feeds(&self, from: &str, to: &str) -> bool {
        let (Some(a), Some(b)) = (self.name_to_index.get(from), self.name_to_index.get(to)) else {
            return false;
        };
        a != b && petgraph::algo::has_path_connecting(&self.graph, *a, *b, None)
    }

    /// Generate Mermaid diagram
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");

        for node in &self.order {
            let name = &self.graph[*node];
            if self.gates.contains(name) {
                out.push_str(&format!("    {}{{{{{}}}}}\n", name, name));
            } else {
                out.push_str(&format!("    {}[{}]\n", name, name));
            }
        }

        for edge in self.graph.edge_references() {
            out.push_str(&format!(
                "    {} -->|{}| {}\n",
                self.graph[edge.source()],
                edge.weight(),
                self.graph[edge.target()]
            ));
        }

        // Sequencing between consecutive stages
        for pair in self.order.windows(2) {
            out.push_str(&format!(
                "    {} -.-> {}\n",
                self.graph[pair[0]], self.graph[pair[1]]
            ));
        }

        out
    }

    /// Generate DOT diagram
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph pipeline {\n");
        out.push_str("    rankdir=LR;\n");
        out.push_str("    node [shape=box, style=rounded];\n\n");

        for node in &self.order {
            let name = &self.graph[*node];
            if self.gates.contains(name) {
                out.push_str(&format!("    \"{}\" [shape=diamond];\n", name));
            } else {
                out.push_str(&format!("    \"{}\";\n", name));
            }
        }

        out.push('\n');
        for edge in self.graph.edge_references() {
            out.push_str(&format!(
                "    \"{}\" -> \"{}\" [label=\"{}\"];\n",
                self.graph[edge.source()],
                self.graph[edge.target()],
                edge.weight()
            ));
        }

        for pair in self.order.windows(2) {
            out.push_str(&format!(
                "    \"{}\" -> \"{}\" [style=dashed];\n",
                self.graph[pair[0]], self.graph[pair[1]]
            ));
        }

        out.push_str("}\n");
        out
    }

    /// Generate text representation in execution order
    pub fn to_text(&self) -> String {
        let mut out = String::new();

        for (i, node) in self.order.iter().enumerate() {
            let name = &self.graph[*node];
            out.push_str(&format!("{}. {}", i + 1, name));

            if self.gates.contains(name) {
                out.push_str(" (manual approval)");
            }

            let inputs = self.inputs(name).unwrap_or_default();
            if !inputs.is_empty() {
                let described: Vec<String> = inputs
                    .iter()
                    .map(|(artifact, producer)| format!("{} from {}", artifact, producer))
                    .collect();
                out.push_str(&format!(" [consumes: {}]", described.join(", ")));
            }

            out.push('\n');
        }

        out
    }
}
