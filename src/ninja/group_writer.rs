//! Emission for group targets.
//!
//! A group is only a stamp over its deps' outputs. Consumers never read
//! the stamp; propagation has already flattened the group's members into
//! their dep lists.

use std::fmt::{self, Write};

use crate::item::GraphView;
use crate::ninja::escape::EscapeMode;
use crate::ninja::helper::target_output_file;
use crate::ninja::path_output::PathOutput;
use crate::settings::{BuildSettings, Settings};
use crate::target::Target;

pub struct GroupTargetWriter<'a> {
    target: &'a Target,
    settings: &'a Settings,
    graph: &'a dyn GraphView,
    path_output: PathOutput,
    out: &'a mut String,
}

impl<'a> GroupTargetWriter<'a> {
    pub fn new(
        graph: &'a dyn GraphView,
        build: &'a BuildSettings,
        settings: &'a Settings,
        target: &'a Target,
        out: &'a mut String,
    ) -> Self {
        let path_output = PathOutput::new(build.build_dir().clone(), EscapeMode::Ninja);
        Self {
            target,
            settings,
            graph,
            path_output,
            out,
        }
    }

    /// # Errors
    ///
    /// Only ever the [`fmt::Error`] bubbled up from the output sink.
    pub fn run(&mut self) -> fmt::Result {
        self.out.write_str("build ")?;
        self.path_output
            .write_output_file(self.out, &target_output_file(self.settings, self.target));
        write!(self.out, ": {}stamp", self.settings.rule_prefix())?;

        for dep_label in self.target.deps.iter().chain(self.target.datadeps.iter()) {
            let Some(dep) = self.graph.target(dep_label) else {
                continue;
            };
            self.out.write_str(" ")?;
            self.path_output
                .write_output_file(self.out, &target_output_file(self.settings, dep));
        }
        self.out.write_str("\n")
    }
}
