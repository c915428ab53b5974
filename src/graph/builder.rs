// Parallel class parsing feeding the reference graph

use super::ReferenceGraph;
use crate::bytecode::{ClassStructureVisitor, VisitedClass};
use crate::discovery::ClassEntry;
use crate::error::ClassFileError;
use rayon::prelude::*;
use tracing::{debug, info};

/// A class entry that could not be parsed
#[derive(Debug, Clone)]
pub struct ParseFailure {
    /// Location of the entry, `source!entry`
    pub location: String,
    pub error: ClassFileError,
}

/// Parses class entries into class-local reference sets
///
/// Parsing runs in parallel; the results are merged into the graph by the
/// caller's thread only.
#[derive(Debug, Clone, Copy)]
pub struct GraphBuilder {
    visitor: ClassStructureVisitor,
    parallel: bool,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            visitor: ClassStructureVisitor::new(),
            parallel: true,
        }
    }

    pub fn with_visitor(mut self, visitor: ClassStructureVisitor) -> Self {
        self.visitor = visitor;
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Parse every entry, in entry order
    pub fn parse(&self, source: &str, entries: &[ClassEntry]) -> Vec<Result<VisitedClass, ParseFailure>> {
        let parse_one = |entry: &ClassEntry| {
            self.visitor.visit(&entry.bytes).map_err(|error| ParseFailure {
                location: format!("{}!{}", source, entry.entry),
                error,
            })
        };

        if self.parallel {
            debug!("Parsing {} classes of {} in parallel...", entries.len(), source);
            entries.par_iter().map(parse_one).collect()
        } else {
            entries.iter().map(parse_one).collect()
        }
    }

    /// Parse `entries` and merge every parsed class into `graph`
    ///
    /// Returns the parsed classes' summaries and the failures, in entry order.
    pub fn build_into(
        &self,
        graph: &mut ReferenceGraph,
        source: &str,
        entries: &[ClassEntry],
    ) -> (Vec<VisitedClass>, Vec<ParseFailure>) {
        let mut visited = Vec::new();
        let mut failures = Vec::new();

        for result in self.parse(source, entries) {
            match result {
                Ok(class) => {
                    graph.record_references(&class.name, &class.references);
                    visited.push(class);
                }
                Err(failure) => failures.push(failure),
            }
        }

        info!(
            "{}: {} classes merged, {} skipped",
            source,
            visited.len(),
            failures.len()
        );
        (visited, failures)
    }
}
