//! Output-name derivation and rule naming.
//!
//! Everything here is pure string assembly over the path model: where a
//! target's object files live, what its final artifact is called on each
//! platform, and which (possibly toolchain-prefixed) rule compiles a
//! given source.

use crate::paths::{OutputFile, SourceFile};
use crate::settings::{BuildSettings, Settings};
use crate::sources::{SourceFileType, artifact_extension, object_extension};
use crate::target::{OutputType, Target};
use crate::toolchain::ToolType;

/// The directory holding a target's intermediate files, e.g. `obj/foo/`.
#[must_use]
pub fn target_output_dir(settings: &Settings, target: &Target) -> OutputFile {
    let mut value = settings.toolchain_output_subdir().to_owned();
    value.push_str("obj");
    // The label dir is source-absolute; keep one of its leading slashes.
    value.push_str(&target.label().dir().value()[1..]);
    OutputFile::new(value)
}

/// The object file a source compiles to:
/// `obj/<source-dir>/<target-name>.<source-stem>.<obj-ext>`.
#[must_use]
pub fn output_file_for_source(
    settings: &Settings,
    target: &Target,
    source: &SourceFile,
) -> OutputFile {
    let mut value = settings.toolchain_output_subdir().to_owned();
    value.push_str("obj");
    value.push_str(&source.dir().value()[1..]);
    value.push_str(target.label().name());
    value.push('.');
    value.push_str(source.stem());
    value.push('.');
    value.push_str(object_extension(settings.os()));
    OutputFile::new(value)
}

/// The name other rules use to refer to this target's final artifact.
///
/// Executables sit in the toolchain root; shared libraries sit in the
/// root on Windows (this names the import library there) and under
/// `lib/` with a `lib` prefix elsewhere; static libraries and every
/// stamp-producing type live in the target's obj dir.
#[must_use]
pub fn target_output_file(settings: &Settings, target: &Target) -> OutputFile {
    let name = if target.output_name.is_empty() {
        target.label().name()
    } else {
        &target.output_name
    };
    let extension = if target.output_extension.is_empty() {
        default_extension(settings, target.output_type)
    } else {
        target.output_extension.as_str()
    };

    let mut value = settings.toolchain_output_subdir().to_owned();
    match target.output_type {
        OutputType::Executable => {
            value.push_str(name);
            append_extension(&mut value, extension);
        }
        OutputType::SharedLibrary if settings.os().is_win() => {
            value.push_str(name);
            append_extension(&mut value, extension);
        }
        OutputType::SharedLibrary => {
            value.push_str("lib/lib");
            value.push_str(name);
            append_extension(&mut value, extension);
        }
        _ => {
            value.push_str("obj");
            value.push_str(&target.label().dir().value()[1..]);
            if target.output_type == OutputType::StaticLibrary && !settings.os().is_win() {
                value.push_str("lib");
            }
            value.push_str(name);
            append_extension(&mut value, extension);
        }
    }
    OutputFile::new(value)
}

/// The per-target ninja file referenced by subninja lines.
#[must_use]
pub fn target_ninja_file(settings: &Settings, target: &Target) -> OutputFile {
    let mut file = target_output_dir(settings, target);
    file.push_str(target.label().name());
    file.push_str(".ninja");
    file
}

/// A declared script/copy output as a build-dir-relative file, or `None`
/// when it does not lie inside the build dir (declaration checks reject
/// that before emission).
#[must_use]
pub fn script_output_file(build: &BuildSettings, output: &SourceFile) -> Option<OutputFile> {
    let build_dir = build.build_dir().value();
    output
        .value()
        .strip_prefix(build_dir)
        .map(|rest| OutputFile::new(rest.to_owned()))
}

/// The (toolchain-prefixed) rule that compiles a classified source, or
/// `None` when the type compiles nothing.
#[must_use]
pub fn compile_rule_name(settings: &Settings, ty: SourceFileType) -> Option<String> {
    let tool = ToolType::for_source_type(ty)?;
    Some(format!("{}{}", settings.rule_prefix(), tool.name()))
}

fn default_extension(settings: &Settings, output_type: OutputType) -> &'static str {
    match output_type {
        OutputType::Executable | OutputType::SharedLibrary | OutputType::StaticLibrary => {
            artifact_extension(output_type, settings.os())
        }
        _ => "stamp",
    }
}

fn append_extension(value: &mut String, extension: &str) {
    if !extension.is_empty() {
        value.push('.');
        value.push_str(extension);
    }
}
