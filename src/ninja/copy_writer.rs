//! Emission for copy targets.
//!
//! Each source gets one `copy` edge to its declared destination, then a
//! stamp collects the copies so dependents (and the user) have a single
//! name to build.

use std::fmt::{self, Write};

use crate::ninja::escape::EscapeMode;
use crate::ninja::helper::{script_output_file, target_output_file};
use crate::ninja::path_output::PathOutput;
use crate::settings::{BuildSettings, Settings};
use crate::target::Target;

pub struct CopyTargetWriter<'a> {
    target: &'a Target,
    build: &'a BuildSettings,
    settings: &'a Settings,
    path_output: PathOutput,
    out: &'a mut String,
}

impl<'a> CopyTargetWriter<'a> {
    pub fn new(
        build: &'a BuildSettings,
        settings: &'a Settings,
        target: &'a Target,
        out: &'a mut String,
    ) -> Self {
        let path_output = PathOutput::new(build.build_dir().clone(), EscapeMode::Ninja);
        Self {
            target,
            build,
            settings,
            path_output,
            out,
        }
    }

    /// # Errors
    ///
    /// Only ever the [`fmt::Error`] bubbled up from the output sink.
    pub fn run(&mut self) -> fmt::Result {
        // Declaration checks guarantee outputs pair up with sources and
        // live inside the build dir.
        let destinations: Vec<_> = self
            .target
            .script_values
            .outputs
            .iter()
            .filter_map(|output| script_output_file(self.build, output))
            .collect();

        for (source, destination) in self.target.sources.iter().zip(&destinations) {
            self.out.write_str("build ")?;
            self.path_output.write_output_file(self.out, destination);
            write!(self.out, ": {}copy ", self.settings.rule_prefix())?;
            self.path_output.write_source_file(self.out, source);
            self.out.write_str("\n")?;
        }

        self.out.write_str("build ")?;
        self.path_output
            .write_output_file(self.out, &target_output_file(self.settings, self.target));
        write!(self.out, ": {}stamp", self.settings.rule_prefix())?;
        for destination in &destinations {
            self.out.write_str(" ")?;
            self.path_output.write_output_file(self.out, destination);
        }
        self.out.write_str("\n")
    }
}
