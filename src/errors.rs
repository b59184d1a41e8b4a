//! Error types surfaced to the user.
//!
//! Every user-facing error carries the source location of the declaration
//! that triggered it; several carry a secondary location pointing at the
//! other half of the conflict.

use std::fmt;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::label::Label;
use crate::paths::SourceFile;

/// A position in a build description file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub file: SourceFile,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

impl Location {
    pub fn new(file: SourceFile, line: u32, column: u32) -> Self {
        Self { file, line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.file.is_null() {
            f.write_str("<unknown>")
        } else {
            write!(f, "{}:{}:{}", self.file, self.line, self.column)
        }
    }
}

/// Errors raised while building and emitting the graph.
#[derive(Debug, Error, Diagnostic)]
pub enum GenError {
    /// A value delivered by the front-end could not be interpreted.
    #[error("{location}: {message}")]
    #[diagnostic(code(genin::parse))]
    ParseOrType { location: Location, message: String },

    /// Two items were defined with the same label.
    #[error("{location}: duplicate definition of {label}")]
    #[diagnostic(
        code(genin::duplicate_definition),
        help("an item with this label was already defined at {previous}")
    )]
    DuplicateDefinition {
        label: Label,
        location: Location,
        previous: Location,
    },

    /// A referenced label was never defined.
    #[error("{location}: undefined label {label}, referenced by {referenced_by}")]
    #[diagnostic(
        code(genin::unresolved_label),
        help("check the label for typos, and that its build file was loaded")
    )]
    UnresolvedLabel {
        label: Label,
        referenced_by: Label,
        location: Location,
    },

    /// Target deps form a cycle.
    #[error("{location}: dependency cycle: {}", render_cycle(members))]
    #[diagnostic(code(genin::dependency_cycle))]
    DependencyCycle {
        members: Vec<Label>,
        location: Location,
    },

    /// An output path does not lie inside the build directory.
    #[error("{location}: path \"{path}\" escapes the build directory")]
    #[diagnostic(code(genin::path_escapes_root))]
    PathEscapesRoot { path: String, location: Location },

    /// A declaration field has the wrong type.
    #[error("{location}: {field} must be a {expected}")]
    #[diagnostic(code(genin::bad_type))]
    BadType {
        field: &'static str,
        expected: &'static str,
        location: Location,
    },

    /// A target declared an output type this generator does not know.
    #[error("{location}: unknown output type \"{value}\"")]
    #[diagnostic(code(genin::unknown_output_type))]
    UnknownOutputType { value: String, location: Location },

    /// A script output is not under the build directory.
    #[error("{location}: script output \"{path}\" is not inside the build directory")]
    #[diagnostic(
        code(genin::config_outside_output_dir),
        help("script outputs normally start with the build directory, e.g. \"//out/Debug/...\"")
    )]
    ConfigOutsideOutputDir { path: String, location: Location },

    /// Reading or writing the emitted files failed.
    #[error("writing \"{path}\": {source}")]
    #[diagnostic(code(genin::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

fn render_cycle(members: &[Label]) -> String {
    use itertools::Itertools;
    members.iter().map(Label::display_with_toolchain).join(" -> ")
}
