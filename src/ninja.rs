//! Ninja file generation.
//!
//! Turns a resolved graph into the exact text a ninja-compatible
//! executor consumes: one file per target, one per toolchain, and a
//! top-level `build.ninja`. Generation is pure (strings in, strings
//! out); [`generate_into`] does the only filesystem work, through a
//! capability handle on the build directory so nothing can land outside
//! it. Running generation twice over the same graph yields byte-identical
//! output.

pub mod binary_writer;
pub mod copy_writer;
pub mod escape;
pub mod group_writer;
pub mod helper;
pub mod path_output;
pub mod script_writer;
pub mod toolchain_writer;

use camino::{Utf8Component, Utf8Path};
use cap_std::fs_utf8::Dir;
use indexmap::IndexMap;

use crate::builder::Builder;
use crate::errors::{GenError, Location};
use crate::item::GraphView;
use crate::label::Label;
use crate::ninja::binary_writer::BinaryTargetWriter;
use crate::ninja::copy_writer::CopyTargetWriter;
use crate::ninja::group_writer::GroupTargetWriter;
use crate::ninja::helper::target_ninja_file;
use crate::ninja::script_writer::ScriptTargetWriter;
use crate::ninja::toolchain_writer::{
    toolchain_file_name, write_build_ninja, write_toolchain_file,
};
use crate::paths::OutputFile;
use crate::settings::{BuildSettings, Settings, TargetOs};
use crate::target::{OutputType, Target};
use crate::toolchain::Toolchain;

/// One emitted file, relative to the build directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: OutputFile,
    pub contents: String,
}

/// Emit the per-target file for one resolved target, or `None` for
/// targets that produce no rules (`external` interop targets and the
/// unknown type).
#[must_use]
pub fn emit_target(
    graph: &dyn GraphView,
    build: &BuildSettings,
    settings: &Settings,
    toolchain: &Toolchain,
    target: &Target,
) -> Option<String> {
    if target.external {
        return None;
    }
    let mut out = String::new();
    let result = match target.output_type {
        OutputType::Executable
        | OutputType::SharedLibrary
        | OutputType::StaticLibrary
        | OutputType::SourceSet => {
            BinaryTargetWriter::new(graph, build, settings, toolchain, target, &mut out).run()
        }
        OutputType::Group => GroupTargetWriter::new(graph, build, settings, target, &mut out).run(),
        OutputType::CopyFiles => CopyTargetWriter::new(build, settings, target, &mut out).run(),
        OutputType::Custom => ScriptTargetWriter::new(build, settings, target, &mut out).run(),
        OutputType::Unknown => return None,
    };
    result.expect("write ninja output");
    Some(out)
}

/// Generate every output file for the resolved graph: per-target files,
/// per-toolchain files, and `build.ninja`. Targets are grouped by
/// toolchain and sorted by label, so output is stable across runs no
/// matter how loading interleaved.
#[must_use]
pub fn generate(
    builder: &Builder,
    build: &BuildSettings,
    os: TargetOs,
    default_toolchain: Option<&Label>,
) -> Vec<GeneratedFile> {
    let mut targets: Vec<&Target> = builder
        .resolved_targets()
        .filter(|t| !t.external && t.output_type != OutputType::Unknown)
        .collect();
    targets.sort_by(|a, b| a.label().cmp(b.label()));

    let mut by_toolchain: IndexMap<Option<Label>, Vec<&Target>> = IndexMap::new();
    by_toolchain.entry(None).or_default();
    for target in targets {
        let toolchain = target
            .label()
            .toolchain_label()
            .filter(|label| default_toolchain != Some(label));
        by_toolchain.entry(toolchain).or_default().push(target);
    }

    let empty_toolchain = Toolchain::default();
    let groups: Vec<(Option<Label>, Settings, Vec<&Target>)> = by_toolchain
        .into_iter()
        .map(|(toolchain, group)| {
            let settings = match &toolchain {
                None => Settings::new(os),
                Some(label) => Settings::for_toolchain(os, label.clone()),
            };
            (toolchain, settings, group)
        })
        .collect();

    let mut files = Vec::new();
    let mut toolchain_files = Vec::new();
    for (toolchain_label, settings, group) in &groups {
        let toolchain = match toolchain_label {
            Some(label) => builder.toolchain(label),
            None => default_toolchain.and_then(|label| builder.toolchain(label)),
        }
        .unwrap_or(&empty_toolchain);

        for target in group {
            if let Some(contents) = emit_target(builder, build, settings, toolchain, target) {
                files.push(GeneratedFile {
                    path: target_ninja_file(settings, target),
                    contents,
                });
            }
        }

        let mut out = String::new();
        write_toolchain_file(settings, toolchain, group, &mut out).expect("write ninja output");
        let path = toolchain_file_name(settings);
        toolchain_files.push(path.clone());
        files.push(GeneratedFile {
            path,
            contents: out,
        });
    }

    let aliased: Vec<(&Settings, &Target)> = groups
        .iter()
        .flat_map(|(_, settings, group)| group.iter().map(move |target| (settings, *target)))
        .collect();
    let mut out = String::new();
    write_build_ninja(&toolchain_files, &aliased, &mut out).expect("write ninja output");
    files.push(GeneratedFile {
        path: OutputFile::new("build.ninja"),
        contents: out,
    });

    files
}

/// Write generated files under the build directory handle.
///
/// # Errors
///
/// [`GenError::PathEscapesRoot`] when a path would leave the build dir;
/// [`GenError::Io`] when the filesystem write fails.
pub fn generate_into(dir: &Dir, files: &[GeneratedFile]) -> Result<(), GenError> {
    for file in files {
        let path = Utf8Path::new(file.path.value());
        let escapes = path.is_absolute()
            || path
                .components()
                .any(|c| matches!(c, Utf8Component::ParentDir));
        if escapes {
            return Err(GenError::PathEscapesRoot {
                path: file.path.value().to_owned(),
                location: Location::default(),
            });
        }
        if let Some(parent) = path.parent() {
            if !parent.as_str().is_empty() {
                dir.create_dir_all(parent).map_err(|source| GenError::Io {
                    path: parent.to_string(),
                    source,
                })?;
            }
        }
        dir.write(path, file.contents.as_bytes())
            .map_err(|source| GenError::Io {
                path: file.path.value().to_owned(),
                source,
            })?;
    }
    Ok(())
}
