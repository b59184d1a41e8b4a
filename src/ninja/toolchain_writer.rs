//! Emission of the per-toolchain file and the top-level build.ninja.
//!
//! The toolchain file declares each tool's rule (with the toolchain's
//! rule prefix) and subninjas every per-target file built with that
//! toolchain. build.ninja ties the toolchain files together and adds
//! convenience phony aliases so `ninja <name>` works.

use std::collections::HashMap;
use std::fmt::{self, Write};

use itertools::Itertools;

use crate::ninja::helper::{target_ninja_file, target_output_file};
use crate::paths::OutputFile;
use crate::settings::Settings;
use crate::target::Target;
use crate::toolchain::Toolchain;

/// Write the rules + subninja file for one toolchain. `targets` must
/// already be filtered to this toolchain and sorted for determinism.
pub fn write_toolchain_file(
    settings: &Settings,
    toolchain: &Toolchain,
    targets: &[&Target],
    out: &mut String,
) -> fmt::Result {
    for (tool_type, tool) in toolchain.tools() {
        writeln!(out, "rule {}{}", settings.rule_prefix(), tool_type.name())?;
        if !tool.command.is_empty() {
            writeln!(out, "  command = {}", tool.command)?;
        }
        if !tool.description.is_empty() {
            writeln!(out, "  description = {}", tool.description)?;
        }
        if !tool.depfile.is_empty() {
            writeln!(out, "  depfile = {}", tool.depfile)?;
        }
        if !tool.depsformat.is_empty() {
            writeln!(out, "  deps = {}", tool.depsformat)?;
        }
        writeln!(out)?;
    }

    for target in targets {
        writeln!(out, "subninja {}", target_ninja_file(settings, target))?;
    }
    Ok(())
}

/// The file name of a toolchain's ninja file inside the build dir.
#[must_use]
pub fn toolchain_file_name(settings: &Settings) -> OutputFile {
    if settings.is_default() {
        OutputFile::new("toolchain.ninja")
    } else {
        let name = settings
            .toolchain_label()
            .map_or("toolchain", |label| label.name());
        OutputFile::new(format!("toolchain_{name}.ninja"))
    }
}

/// Write the top-level build.ninja: one subninja per toolchain file,
/// phony aliases for every emitted target, and a default `all`.
pub fn write_build_ninja(
    toolchain_files: &[OutputFile],
    aliased: &[(&Settings, &Target)],
    out: &mut String,
) -> fmt::Result {
    for file in toolchain_files {
        writeln!(out, "subninja {file}")?;
    }
    writeln!(out)?;

    // Count short names so ambiguous ones get no alias.
    let mut name_counts: HashMap<&str, usize> = HashMap::new();
    for (_, target) in aliased {
        *name_counts.entry(target.label().name()).or_default() += 1;
    }

    let mut outputs = Vec::new();
    for (settings, target) in aliased {
        let output = target_output_file(settings, target);
        let dir = &target.label().dir().value()[2..];
        let path_alias = format!("{dir}{}", target.label().name());
        // An alias that already names the output would be a circular
        // phony edge.
        if path_alias != output.value() {
            writeln!(out, "build {path_alias}: phony {output}")?;
        }
        if name_counts.get(target.label().name()) == Some(&1)
            && path_alias != target.label().name()
            && target.label().name() != output.value()
        {
            writeln!(out, "build {}: phony {output}", target.label().name())?;
        }
        outputs.push(output);
    }

    if !outputs.is_empty() {
        writeln!(out)?;
        writeln!(out, "build all: phony {}", outputs.iter().join(" "))?;
        writeln!(out, "default all")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Location;
    use crate::label::Label;
    use crate::paths::SourceDir;
    use crate::settings::TargetOs;
    use crate::target::OutputType;
    use crate::toolchain::{Tool, ToolType};

    #[test]
    fn toolchain_file_declares_rules_then_subninjas() {
        let settings = Settings::new(TargetOs::Linux);
        let mut toolchain = Toolchain::new(
            Label::without_toolchain(SourceDir::new("//build/"), "host"),
            Location::default(),
        );
        toolchain.set_tool(
            ToolType::Cxx,
            Tool {
                command: "g++ $cflags $cflags_cc -c $in -o $out".to_owned(),
                description: "CXX $out".to_owned(),
                depfile: "$out.d".to_owned(),
                depsformat: "gcc".to_owned(),
                ..Tool::default()
            },
        );

        let label = Label::without_toolchain(SourceDir::new("//foo/"), "bar");
        let mut target = Target::new(label, Location::default());
        target.output_type = OutputType::SourceSet;

        let mut out = String::new();
        write_toolchain_file(&settings, &toolchain, &[&target], &mut out).expect("write");
        let expected = concat!(
            "rule cxx\n",
            "  command = g++ $cflags $cflags_cc -c $in -o $out\n",
            "  description = CXX $out\n",
            "  depfile = $out.d\n",
            "  deps = gcc\n",
            "\n",
            "subninja obj/foo/bar.ninja\n",
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn build_ninja_aliases_unambiguous_names() {
        let settings = Settings::new(TargetOs::Linux);
        let mut a = Target::new(
            Label::without_toolchain(SourceDir::new("//foo/"), "bar"),
            Location::default(),
        );
        a.output_type = OutputType::SourceSet;
        let mut b = Target::new(
            Label::without_toolchain(SourceDir::new("//baz/"), "bar"),
            Location::default(),
        );
        b.output_type = OutputType::SourceSet;

        let mut out = String::new();
        write_build_ninja(
            &[OutputFile::new("toolchain.ninja")],
            &[(&settings, &a), (&settings, &b)],
            &mut out,
        )
        .expect("write");

        assert!(out.contains("subninja toolchain.ninja\n"));
        assert!(out.contains("build foo/bar: phony obj/foo/bar.stamp\n"));
        assert!(out.contains("build baz/bar: phony obj/baz/bar.stamp\n"));
        // "bar" is ambiguous between the two, so no short alias.
        assert!(!out.contains("\nbuild bar: phony"));
        assert!(out.contains("build all: phony obj/foo/bar.stamp obj/baz/bar.stamp\n"));
        assert!(out.ends_with("default all\n"));
    }
}
