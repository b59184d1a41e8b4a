//! Source file classification.
//!
//! The emitter needs to know which compile rule (if any) applies to each
//! source file, and what the platform calls its object files and final
//! artifacts. Classification keys off the lowercased extension and the
//! target OS; unrecognized extensions are not an error, they simply
//! contribute no rule.

use crate::paths::SourceFile;
use crate::settings::TargetOs;
use crate::target::OutputType;

/// What a source file is, for the purpose of picking a compile rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceFileType {
    /// Not a recognized source type; silently skipped.
    Unknown,
    /// A C source file.
    C,
    /// A C++ source file.
    Cpp,
    /// A header: known, but compiles nothing.
    Header,
    /// An Objective-C source file (Mac only).
    ObjC,
    /// An Objective-C++ source file (Mac only).
    ObjCpp,
    /// A resource script (Windows only).
    Resource,
    /// An assembly file (non-Windows).
    Assembly,
}

/// Classify a source file by extension for the given target OS.
#[must_use]
pub fn classify_source(file: &SourceFile, os: TargetOs) -> SourceFileType {
    let Some(extension) = file.extension() else {
        return SourceFileType::Unknown;
    };
    let extension = extension.to_ascii_lowercase();
    match extension.as_str() {
        "cc" | "cpp" | "cxx" => SourceFileType::Cpp,
        "c" => SourceFileType::C,
        "h" => SourceFileType::Header,
        "m" if os == TargetOs::Mac => SourceFileType::ObjC,
        "mm" if os == TargetOs::Mac => SourceFileType::ObjCpp,
        "rc" if os == TargetOs::Windows => SourceFileType::Resource,
        "s" if os != TargetOs::Windows => SourceFileType::Assembly,
        _ => SourceFileType::Unknown,
    }
}

/// The object file extension, without the dot.
#[must_use]
pub fn object_extension(os: TargetOs) -> &'static str {
    match os {
        TargetOs::Windows => "obj",
        TargetOs::Mac | TargetOs::Linux => "o",
    }
}

/// The default extension for a final artifact, without the dot. Empty
/// means no extension. For shared libraries on Windows this is the import
/// library extension; the runtime `.dll` is derived separately.
#[must_use]
pub fn artifact_extension(output_type: OutputType, os: TargetOs) -> &'static str {
    match (os, output_type) {
        (TargetOs::Mac | TargetOs::Linux, OutputType::Executable) => "",
        (TargetOs::Mac, OutputType::SharedLibrary) => "dylib",
        (TargetOs::Linux, OutputType::SharedLibrary) => "so",
        (TargetOs::Mac | TargetOs::Linux, OutputType::StaticLibrary) => "a",
        (TargetOs::Windows, OutputType::Executable) => "exe",
        (TargetOs::Windows, OutputType::SharedLibrary) => "dll.lib",
        (TargetOs::Windows, OutputType::StaticLibrary) => "lib",
        _ => "",
    }
}
