//! Graph visualisation generator.
//!
//! This module converts a [`crate::graph::TargetGraph`] into DOT text for
//! the `graph` subcommand. Nodes and edges are emitted in declaration order
//! to ensure deterministic output.

use std::fmt::{self, Display, Formatter, Write};

use crate::ast::TargetKind;
use crate::graph::{LinkEdge, Target, TargetGraph};

/// Render the target graph as a DOT digraph.
///
/// # Panics
///
/// Panics if writing to the output string fails (which is unexpected under
/// normal conditions).
#[must_use]
pub fn generate(graph: &TargetGraph) -> String {
    let mut out = String::new();
    writeln!(out, "digraph targets {{").expect("write DOT header");
    writeln!(out, "  rankdir = LR;").expect("write DOT header");

    for target in graph.targets.values() {
        write!(out, "{}", Node { target }).expect("write DOT node");
    }
    for target in graph.targets.values() {
        for edge in &target.links {
            write!(
                out,
                "{}",
                Edge {
                    from: &target.name,
                    edge,
                }
            )
            .expect("write DOT edge");
        }
    }

    writeln!(out, "}}").expect("write DOT footer");
    out
}

/// Wrapper struct to display a target as a DOT node.
struct Node<'a> {
    target: &'a Target,
}

impl Display for Node<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let shape = match self.target.kind {
            TargetKind::Executable => "box",
            TargetKind::SharedLibrary => "ellipse",
            TargetKind::StaticLibrary => "folder",
        };
        writeln!(
            f,
            "  \"{}\" [shape={shape}, label=\"{}\\n{}\"];",
            self.target.name, self.target.name, self.target.out_dir,
        )
    }
}

/// Wrapper struct to display a link as a DOT edge.
///
/// Runtime (shared) edges are solid; link-time-only edges are dashed.
struct Edge<'a> {
    from: &'a str,
    edge: &'a LinkEdge,
}

impl Display for Edge<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let style = if self.edge.runtime { "solid" } else { "dashed" };
        writeln!(
            f,
            "  \"{}\" -> \"{}\" [style={style}];",
            self.from, self.edge.target,
        )
    }
}
