//! Emission for binary targets: executables, shared and static
//! libraries, and source sets.
//!
//! Output order is fixed: compiler variable block, per-source compile
//! rules, then either the link/archive block or a stamp for source sets.
//! The exact bytes matter; the downstream executor treats them as its
//! build description.

use std::collections::BTreeSet;
use std::fmt::{self, Write};

use crate::config::ConfigValues;
use crate::item::GraphView;
use crate::label::Label;
use crate::ninja::escape::{EscapeMode, EscapeOptions, escape_to};
use crate::ninja::helper::{
    compile_rule_name, output_file_for_source, target_output_dir, target_output_file,
};
use crate::ninja::path_output::{DirMode, PathOutput};
use crate::paths::{OutputFile, find_filename};
use crate::settings::{BuildSettings, Settings};
use crate::sources::{SourceFileType, classify_source};
use crate::target::{OutputType, Target};
use crate::toolchain::{Tool, ToolType, Toolchain};

/// A target's own values followed by each config applying to it, in
/// propagation order. Free-standing so callers can keep writing through
/// the writer while iterating.
fn config_values_iter<'g>(
    graph: &'g dyn GraphView,
    target: &'g Target,
) -> impl Iterator<Item = &'g ConfigValues> {
    std::iter::once(&target.config_values).chain(
        target
            .configs
            .iter()
            .filter_map(move |label| graph.config(label).map(|config| &config.values)),
    )
}

pub struct BinaryTargetWriter<'a> {
    target: &'a Target,
    toolchain: &'a Toolchain,
    settings: &'a Settings,
    graph: &'a dyn GraphView,
    path_output: PathOutput,
    out: &'a mut String,
}

impl<'a> BinaryTargetWriter<'a> {
    pub fn new(
        graph: &'a dyn GraphView,
        build: &'a BuildSettings,
        settings: &'a Settings,
        toolchain: &'a Toolchain,
        target: &'a Target,
        out: &'a mut String,
    ) -> Self {
        let path_output = PathOutput::new(build.build_dir().clone(), EscapeMode::Ninja);
        Self {
            target,
            toolchain,
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
        self.write_compiler_vars()?;
        let object_files = self.write_sources()?;
        if self.target.output_type == OutputType::SourceSet {
            self.write_source_set_stamp(&object_files)
        } else {
            self.write_linker_stuff(&object_files)
        }
    }

    fn write_compiler_vars(&mut self) -> fmt::Result {
        let shell = EscapeOptions::new(EscapeMode::Shell);

        self.out.write_str("defines =")?;
        for values in config_values_iter(self.graph, self.target) {
            for define in &values.defines {
                self.out.write_str(" -D")?;
                escape_to(self.out, define, shell);
            }
        }
        self.out.write_str("\nincludes =")?;
        for values in config_values_iter(self.graph, self.target) {
            for dir in &values.include_dirs {
                // The quotes survive ninja escaping, so the compiler sees
                // a quoted argument. No trailing slash: on Windows it
                // would be a backslash escaping our closing quote.
                self.out.write_str(" \"-I")?;
                self.path_output.write_dir(self.out, dir, DirMode::NoLastSlash);
                self.out.write_str("\"")?;
            }
        }
        self.out.write_str("\n")?;

        self.write_flag_line("cflags", |values| &values.cflags)?;
        self.write_flag_line("cflags_c", |values| &values.cflags_c)?;
        self.write_flag_line("cflags_cc", |values| &values.cflags_cc)?;
        self.write_flag_line("cflags_objc", |values| &values.cflags_objc)?;
        self.write_flag_line("cflags_objcc", |values| &values.cflags_objcc)?;
        self.out.write_str("\n")
    }

    fn write_flag_line(
        &mut self,
        name: &str,
        get: impl Fn(&ConfigValues) -> &[String],
    ) -> fmt::Result {
        self.write_flag_values(name, get)?;
        self.out.write_str("\n")
    }

    fn write_flag_values(
        &mut self,
        name: &str,
        get: impl Fn(&ConfigValues) -> &[String],
    ) -> fmt::Result {
        // Flag strings may be several flags in one; the build files own
        // their quoting, so only ninja escaping applies.
        let options = EscapeOptions::with_inhibit_quoting(EscapeMode::Ninja);
        self.out.write_str(name)?;
        self.out.write_str(" =")?;
        for values in config_values_iter(self.graph, self.target) {
            for flag in get(values) {
                self.out.write_str(" ")?;
                escape_to(self.out, flag, options);
            }
        }
        Ok(())
    }

    /// Emit one compile rule per recognized source, returning the object
    /// files in source order. Unknown extensions and headers are skipped.
    fn write_sources(&mut self) -> Result<Vec<OutputFile>, fmt::Error> {
        let implicit_deps = self.sources_implicit_deps();
        let mut object_files = Vec::with_capacity(self.target.sources.len());

        for source in &self.target.sources {
            let ty = classify_source(source, self.settings.os());
            let Some(rule) = compile_rule_name(self.settings, ty) else {
                continue;
            };
            let object = output_file_for_source(self.settings, self.target, source);

            self.out.write_str("build ")?;
            self.path_output.write_output_file(self.out, &object);
            write!(self.out, ": {rule} ")?;
            self.path_output.write_source_file(self.out, source);
            self.out.write_str(&implicit_deps)?;
            self.out.write_str("\n")?;

            object_files.push(object);
        }
        self.out.write_str("\n")?;
        Ok(object_files)
    }

    /// Compile-time inputs shared by every source: the target's
    /// source_prereqs plus the outputs of hard deps. Empty when neither
    /// applies.
    fn sources_implicit_deps(&self) -> String {
        let mut ret = String::from(" |");
        let mut has_files = false;

        for prereq in &self.target.source_prereqs {
            ret.push(' ');
            self.path_output.write_source_file(&mut ret, prereq);
            has_files = true;
        }
        for dep_label in &self.target.deps {
            let Some(dep) = self.graph.target(dep_label) else {
                continue;
            };
            if dep.hard_dep {
                ret.push(' ');
                self.path_output
                    .write_output_file(&mut ret, &target_output_file(self.settings, dep));
                has_files = true;
            }
        }
        if has_files { ret } else { String::new() }
    }

    fn write_linker_stuff(&mut self, object_files: &[OutputFile]) -> fmt::Result {
        let windows_manifest = if self.settings.os().is_win() {
            let mut manifest = target_output_dir(self.settings, self.target);
            manifest.push_str(self.target.label().name());
            manifest.push_str(".intermediate.manifest");
            self.out.write_str("manifests = ")?;
            self.path_output.write_output_file(self.out, &manifest);
            self.out.write_str("\n")?;
            Some(manifest)
        } else {
            None
        };

        let tool_type = ToolType::for_output_type(self.target.output_type);
        debug_assert!(tool_type.is_some(), "linker block requires a link tool");
        let tool_type = tool_type.unwrap_or(ToolType::Link);
        let tool = self.toolchain.tool(tool_type);

        self.write_linker_flags(tool, windows_manifest.as_ref())?;
        self.write_libs(tool)?;

        // The external file is what dependents link against; the internal
        // file is the primary artifact. They differ only for shared
        // libraries on Windows (import library vs. dll).
        let external = target_output_file(self.settings, self.target);
        let internal = if self.target.output_type == OutputType::SharedLibrary
            && self.settings.os().is_win()
        {
            let name = if self.target.output_name.is_empty() {
                self.target.label().name()
            } else {
                &self.target.output_name
            };
            OutputFile::new(format!(
                "{}{name}.dll",
                self.settings.toolchain_output_subdir(),
            ))
        } else {
            external.clone()
        };

        self.write_link_command(&external, &internal, tool_type, object_files)?;

        if self.target.output_type == OutputType::SharedLibrary {
            // The shared object name has no path.
            writeln!(self.out, "  soname = {}", find_filename(internal.value()))?;
            self.out.write_str("  lib = ")?;
            self.path_output.write_output_file(self.out, &internal);
            self.out.write_str("\n")?;
            if self.settings.os().is_win() {
                self.out.write_str("  dll = ")?;
                self.path_output.write_output_file(self.out, &internal);
                self.out.write_str("\n")?;
                self.out.write_str("  implibflag = /IMPLIB:")?;
                self.path_output.write_output_file(self.out, &external);
                self.out.write_str("\n")?;
            }
        }
        self.out.write_str("\n")
    }

    fn write_linker_flags(
        &mut self,
        tool: Option<&Tool>,
        windows_manifest: Option<&OutputFile>,
    ) -> fmt::Result {
        self.write_flag_values("ldflags", |values| &values.ldflags)?;

        // Library search paths pushed up through the dependency tree.
        // These reach the linker's command line, so shell escaping stacks
        // on top of ninja's.
        if !self.target.all_lib_dirs().is_empty() {
            let lib_path_output =
                PathOutput::new(self.path_output.current_dir().clone(), EscapeMode::NinjaShell);
            let prefix = tool.map_or("", |t| t.lib_dir_prefix.as_str());
            for dir in self.target.all_lib_dirs() {
                write!(self.out, " {prefix}")?;
                lib_path_output.write_dir(self.out, dir, DirMode::NoLastSlash);
            }
        }

        if let Some(manifest) = windows_manifest {
            self.out.write_str(" /MANIFEST /ManifestFile:")?;
            self.path_output.write_output_file(self.out, manifest);
        }
        self.out.write_str("\n")
    }

    fn write_libs(&mut self, tool: Option<&Tool>) -> fmt::Result {
        let options = EscapeOptions::new(EscapeMode::NinjaShell);
        let prefix = tool.map_or("", |t| t.lib_prefix.as_str());
        self.out.write_str("libs =")?;
        for lib in self.target.all_libs() {
            let lower = lib.to_ascii_lowercase();
            if self.settings.os().is_mac() && lower.ends_with(".framework") {
                // -framework takes the name without the extension.
                self.out.write_str(" -framework ")?;
                escape_to(self.out, &lib[..lib.len() - ".framework".len()], options);
            } else {
                write!(self.out, " {prefix}")?;
                escape_to(self.out, lib, options);
            }
        }
        self.out.write_str("\n")
    }

    fn write_link_command(
        &mut self,
        external: &OutputFile,
        internal: &OutputFile,
        tool_type: ToolType,
        object_files: &[OutputFile],
    ) -> fmt::Result {
        self.out.write_str("build ")?;
        self.path_output.write_output_file(self.out, internal);
        if external != internal {
            self.out.write_str(" ")?;
            self.path_output.write_output_file(self.out, external);
        }
        write!(self.out, ": {}{}", self.settings.rule_prefix(), tool_type.name())?;

        let (extra_object_files, linkable_deps, non_linkable_deps) = self.classified_deps();

        for object in object_files {
            self.out.write_str(" ")?;
            self.path_output.write_output_file(self.out, object);
        }
        for object in &extra_object_files {
            self.out.write_str(" ")?;
            self.path_output.write_output_file(self.out, object);
        }
        for dep in linkable_deps {
            self.out.write_str(" ")?;
            self.path_output
                .write_output_file(self.out, &target_output_file(self.settings, dep));
        }
        self.write_implicit_dependencies(&non_linkable_deps)?;
        self.out.write_str("\n")
    }

    /// Source sets compile like anything else, but their "output" is only
    /// a stamp over the object files so `ninja <target>` works; consumers
    /// reach past the stamp to the objects.
    fn write_source_set_stamp(&mut self, object_files: &[OutputFile]) -> fmt::Result {
        self.out.write_str("build ")?;
        self.path_output
            .write_output_file(self.out, &target_output_file(self.settings, self.target));
        write!(self.out, ": {}stamp", self.settings.rule_prefix())?;

        let (extra_object_files, _, non_linkable_deps) = self.classified_deps();
        // The classifier never feeds object files into a source set; any
        // source set we depend on lands in the non-linkable list.
        debug_assert!(extra_object_files.is_empty());

        for object in object_files {
            self.out.write_str(" ")?;
            self.path_output.write_output_file(self.out, object);
        }
        self.write_implicit_dependencies(&non_linkable_deps)?;
        self.out.write_str("\n")
    }

    /// Split deps into link inputs, injected object files, and order-only
    /// deps, walking declared deps first, inherited libraries second, and
    /// datadeps last.
    fn classified_deps(&self) -> (BTreeSet<OutputFile>, Vec<&'a Target>, Vec<&'a Target>) {
        let mut extra_object_files = BTreeSet::new();
        let mut linkable_deps = Vec::new();
        let mut non_linkable_deps = Vec::new();

        let inherited = self.target.inherited_libraries();
        for dep_label in &self.target.deps {
            if inherited.contains(dep_label) {
                continue; // Classified below; don't add dupes.
            }
            self.classify_dependency(
                dep_label,
                &mut extra_object_files,
                &mut linkable_deps,
                &mut non_linkable_deps,
            );
        }
        for dep_label in inherited {
            self.classify_dependency(
                dep_label,
                &mut extra_object_files,
                &mut linkable_deps,
                &mut non_linkable_deps,
            );
        }
        for dep_label in &self.target.datadeps {
            if let Some(dep) = self.graph.target(dep_label) {
                non_linkable_deps.push(dep);
            }
        }

        (extra_object_files, linkable_deps, non_linkable_deps)
    }

    fn classify_dependency(
        &self,
        dep_label: &Label,
        extra_object_files: &mut BTreeSet<OutputFile>,
        linkable_deps: &mut Vec<&'a Target>,
        non_linkable_deps: &mut Vec<&'a Target>,
    ) {
        let Some(dep) = self.graph.target(dep_label) else {
            return;
        };
        let can_link_libs = self.target.output_type.can_link_libs();

        if dep.output_type == OutputType::SourceSet {
            if can_link_libs {
                // Linking in a source set: take its object files directly.
                for source in &dep.sources {
                    let ty = classify_source(source, self.settings.os());
                    if ty != SourceFileType::Unknown && ty != SourceFileType::Header {
                        extra_object_files
                            .insert(output_file_for_source(self.settings, dep, source));
                    }
                }
            } else {
                // A source set reached from another source set (or a
                // static library) orders after it without consuming its
                // objects; they surface at the first linkable ancestor.
                non_linkable_deps.push(dep);
            }
        } else if can_link_libs && dep.output_type.is_linkable() {
            linkable_deps.push(dep);
        } else {
            non_linkable_deps.push(dep);
        }
    }

    /// Everything after ` || `: non-linkable deps' outputs, then data
    /// files. Omitted entirely when both are empty.
    fn write_implicit_dependencies(&mut self, non_linkable_deps: &[&Target]) -> fmt::Result {
        if non_linkable_deps.is_empty() && self.target.data.is_empty() {
            return Ok(());
        }
        self.out.write_str(" ||")?;
        for dep in non_linkable_deps {
            self.out.write_str(" ")?;
            self.path_output
                .write_output_file(self.out, &target_output_file(self.settings, dep));
        }
        for data in &self.target.data {
            self.out.write_str(" ")?;
            self.path_output.write_source_file(self.out, data);
        }
        Ok(())
    }
}
