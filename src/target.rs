//! Targets: declared build artifacts.
//!
//! A target is born with label references to its deps and configs and no
//! derived state. Once every referent has itself resolved, the builder
//! runs [`Target::on_resolved`], which pulls dependent configs and
//! computes the inherited-library closure. After that the target is
//! read-only.

mod resolve;

use serde::{Deserialize, Serialize};

use crate::config::ConfigValues;
use crate::errors::Location;
use crate::label::Label;
use crate::ordered_set::OrderedSet;
use crate::paths::{SourceDir, SourceFile};

/// What a target produces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputType {
    #[default]
    Unknown,
    Group,
    Executable,
    SharedLibrary,
    StaticLibrary,
    SourceSet,
    CopyFiles,
    Custom,
}

impl OutputType {
    /// The name used in build descriptions and diagnostics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Group => "group",
            Self::Executable => "executable",
            Self::SharedLibrary => "shared_library",
            Self::StaticLibrary => "static_library",
            Self::SourceSet => "source_set",
            Self::CopyFiles => "copy",
            Self::Custom => "custom",
        }
    }

    /// Parse the name used in build descriptions.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "group" => Some(Self::Group),
            "executable" => Some(Self::Executable),
            "shared_library" => Some(Self::SharedLibrary),
            "static_library" => Some(Self::StaticLibrary),
            "source_set" => Some(Self::SourceSet),
            "copy" => Some(Self::CopyFiles),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }

    /// Whether dependents link this target's output file directly.
    #[must_use]
    pub fn is_linkable(self) -> bool {
        matches!(self, Self::SharedLibrary | Self::StaticLibrary)
    }

    /// Whether this target's link step consumes library inputs. Static
    /// libraries and source sets only collect objects; their libraries are
    /// pushed up to the first executable or shared library.
    #[must_use]
    pub fn can_link_libs(self) -> bool {
        matches!(self, Self::Executable | Self::SharedLibrary)
    }
}

/// Values for script (custom) targets.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptValues {
    #[serde(default)]
    pub script: SourceFile,
    #[serde(default)]
    pub args: Vec<String>,
    /// Declared outputs, source-absolute; each must lie inside the build
    /// directory.
    #[serde(default)]
    pub outputs: Vec<SourceFile>,
    #[serde(default)]
    pub depfile: String,
}

/// A declared build artifact.
#[derive(Clone, Debug, Default)]
pub struct Target {
    label: Label,
    defined_from: Location,

    pub output_type: OutputType,
    /// Overrides the label name in final artifact file names when
    /// non-empty.
    pub output_name: String,
    /// Overrides the platform artifact extension when non-empty.
    pub output_extension: String,

    pub sources: Vec<SourceFile>,
    /// Extra compile-time inputs for every source.
    pub source_prereqs: Vec<SourceFile>,
    /// Runtime data files; order-only in the emitted rules.
    pub data: Vec<SourceFile>,

    /// Dependents must wait for this target even without a direct input
    /// edge (e.g. generated headers).
    pub hard_dep: bool,
    /// Defined elsewhere for interop; resolved but never emitted.
    pub external: bool,
    pub gyp_file: SourceFile,

    pub deps: Vec<Label>,
    pub datadeps: Vec<Label>,

    pub configs: Vec<Label>,
    pub all_dependent_configs: Vec<Label>,
    pub direct_dependent_configs: Vec<Label>,
    /// Subset of `deps` whose direct-dependent configs this target
    /// re-exports.
    pub forward_dependent_configs: Vec<Label>,

    pub config_values: ConfigValues,
    pub script_values: ScriptValues,

    // Derived by on_resolved.
    inherited_libraries: OrderedSet<Label>,
    all_lib_dirs: OrderedSet<SourceDir>,
    all_libs: OrderedSet<String>,
}

impl Target {
    pub fn new(label: Label, defined_from: Location) -> Self {
        Self {
            label,
            defined_from,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn label(&self) -> &Label {
        &self.label
    }

    #[must_use]
    pub fn defined_from(&self) -> &Location {
        &self.defined_from
    }

    /// Static libraries and source sets reachable through deps without
    /// crossing a shared-library boundary. Never contains this target.
    #[must_use]
    pub fn inherited_libraries(&self) -> &OrderedSet<Label> {
        &self.inherited_libraries
    }

    /// Library search dirs from this target's configs and its inherited
    /// libraries, in first-seen order.
    #[must_use]
    pub fn all_lib_dirs(&self) -> &OrderedSet<SourceDir> {
        &self.all_lib_dirs
    }

    /// Libraries to link from this target's configs and its inherited
    /// libraries, in first-seen order.
    #[must_use]
    pub fn all_libs(&self) -> &OrderedSet<String> {
        &self.all_libs
    }
}
