//! Emission for script (custom) targets.
//!
//! Each custom target gets its own rule (rule names are global in ninja,
//! so the label is mangled into the name), one build edge producing the
//! declared outputs from the script inputs, and a stamp so the target
//! name itself is buildable.

use std::fmt::{self, Write};

use crate::ninja::escape::{EscapeMode, EscapeOptions, escape_to};
use crate::ninja::helper::{script_output_file, target_output_file};
use crate::ninja::path_output::PathOutput;
use crate::paths::OutputFile;
use crate::settings::{BuildSettings, Settings};
use crate::target::Target;

pub struct ScriptTargetWriter<'a> {
    target: &'a Target,
    build: &'a BuildSettings,
    settings: &'a Settings,
    path_output: PathOutput,
    out: &'a mut String,
}

impl<'a> ScriptTargetWriter<'a> {
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
        let rule_name = self.write_rule_definition()?;
        let outputs: Vec<_> = self
            .target
            .script_values
            .outputs
            .iter()
            .filter_map(|output| script_output_file(self.build, output))
            .collect();

        self.write_build_line(&rule_name, &outputs)?;
        self.write_stamp(&outputs)
    }

    fn write_rule_definition(&mut self) -> Result<String, fmt::Error> {
        let rule_name = self.rule_name();
        let shell = EscapeOptions::new(EscapeMode::NinjaShell);

        writeln!(self.out, "rule {rule_name}")?;
        self.out.write_str("  command = python ")?;
        self.path_output
            .write_source_file(self.out, &self.target.script_values.script);
        for arg in &self.target.script_values.args {
            self.out.write_str(" ")?;
            escape_to(self.out, arg, shell);
        }
        self.out.write_str("\n")?;
        writeln!(
            self.out,
            "  description = CUSTOM {}",
            self.target.label().display_with_toolchain(),
        )?;
        if !self.target.script_values.depfile.is_empty() {
            writeln!(self.out, "  depfile = {}", self.target.script_values.depfile)?;
        }
        writeln!(self.out, "  restat = 1")?;
        Ok(rule_name)
    }

    /// Rule names are global across the emitted files; derive one from
    /// the full label.
    fn rule_name(&self) -> String {
        let mut name: String = self
            .target
            .label()
            .display_with_toolchain()
            .chars()
            .map(|c| if matches!(c, ':' | '/' | '(' | ')') { '_' } else { c })
            .collect();
        name.push_str("_rule");
        format!("{}{}", self.settings.rule_prefix(), name.trim_start_matches('_'))
    }

    fn write_build_line(&mut self, rule_name: &str, outputs: &[OutputFile]) -> fmt::Result {
        self.out.write_str("build")?;
        for output in outputs {
            self.out.write_str(" ")?;
            self.path_output.write_output_file(self.out, output);
        }
        write!(self.out, ": {rule_name}")?;

        let inputs: Vec<_> = self
            .target
            .sources
            .iter()
            .chain(self.target.source_prereqs.iter())
            .collect();
        if !inputs.is_empty() {
            // The command does not name its inputs; they gate re-runs only.
            self.out.write_str(" |")?;
            for input in inputs {
                self.out.write_str(" ")?;
                self.path_output.write_source_file(self.out, input);
            }
        }
        self.out.write_str("\n")
    }

    fn write_stamp(&mut self, outputs: &[OutputFile]) -> fmt::Result {
        self.out.write_str("build ")?;
        self.path_output
            .write_output_file(self.out, &target_output_file(self.settings, self.target));
        write!(self.out, ": {}stamp", self.settings.rule_prefix())?;
        for output in outputs {
            self.out.write_str(" ")?;
            self.path_output.write_output_file(self.out, output);
        }
        self.out.write_str("\n")
    }
}
