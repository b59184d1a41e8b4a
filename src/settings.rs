//! Per-build and per-toolchain settings.

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};

use crate::label::Label;
use crate::paths::{SourceDir, SourceFile, invert_dir};

/// The OS the emitted rules will build for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetOs {
    Linux,
    Mac,
    Windows,
}

impl TargetOs {
    #[must_use]
    pub fn is_win(self) -> bool {
        self == Self::Windows
    }

    #[must_use]
    pub fn is_mac(self) -> bool {
        self == Self::Mac
    }
}

/// Settings for one build: one toplevel output directory. Shared by every
/// toolchain participating in that build.
#[derive(Clone, Debug)]
pub struct BuildSettings {
    root_path: Utf8PathBuf,
    build_dir: SourceDir,
    build_to_source: String,
    build_args: BTreeMap<String, String>,
}

impl BuildSettings {
    pub fn new(root_path: impl Into<Utf8PathBuf>, build_dir: SourceDir) -> Self {
        let build_to_source = invert_dir(&build_dir);
        Self {
            root_path: root_path.into(),
            build_dir,
            build_to_source,
            build_args: BTreeMap::new(),
        }
    }

    /// Absolute host path of the source root.
    #[must_use]
    pub fn root_path(&self) -> &Utf8Path {
        &self.root_path
    }

    /// The root of all output files, source-absolute, e.g. `//out/Debug/`.
    #[must_use]
    pub fn build_dir(&self) -> &SourceDir {
        &self.build_dir
    }

    /// The inverse of the build dir, e.g. `../../` for `//out/Debug/`.
    #[must_use]
    pub fn build_to_source_dir(&self) -> &str {
        &self.build_to_source
    }

    pub fn build_args_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.build_args
    }

    #[must_use]
    pub fn build_args(&self) -> &BTreeMap<String, String> {
        &self.build_args
    }

    /// The absolute host path for a source-absolute file.
    #[must_use]
    pub fn full_path(&self, file: &SourceFile) -> Utf8PathBuf {
        if file.is_source_absolute() {
            self.root_path.join(&file.value()[2..])
        } else {
            Utf8PathBuf::from(file.value())
        }
    }
}

/// Settings for one toolchain within a build. The default toolchain's
/// outputs sit at the build dir root; other toolchains get a subdirectory
/// and a rule-name prefix so their rules do not collide.
#[derive(Clone, Debug)]
pub struct Settings {
    os: TargetOs,
    toolchain_label: Option<Label>,
    is_default: bool,
    toolchain_output_subdir: String,
    rule_prefix: String,
}

impl Settings {
    /// Settings for the default toolchain.
    #[must_use]
    pub fn new(os: TargetOs) -> Self {
        Self {
            os,
            toolchain_label: None,
            is_default: true,
            toolchain_output_subdir: String::new(),
            rule_prefix: String::new(),
        }
    }

    /// Settings for a non-default toolchain. Its outputs move under
    /// `<name>/` and its rules gain a `<name>_` prefix.
    #[must_use]
    pub fn for_toolchain(os: TargetOs, label: Label) -> Self {
        let name = label.name().to_owned();
        Self {
            os,
            toolchain_label: Some(label),
            is_default: false,
            toolchain_output_subdir: format!("{name}/"),
            rule_prefix: format!("{name}_"),
        }
    }

    #[must_use]
    pub fn os(&self) -> TargetOs {
        self.os
    }

    #[must_use]
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    #[must_use]
    pub fn toolchain_label(&self) -> Option<&Label> {
        self.toolchain_label.as_ref()
    }

    /// Empty for the default toolchain, `<name>/` otherwise.
    #[must_use]
    pub fn toolchain_output_subdir(&self) -> &str {
        &self.toolchain_output_subdir
    }

    /// Empty for the default toolchain, `<name>_` otherwise.
    #[must_use]
    pub fn rule_prefix(&self) -> &str {
        &self.rule_prefix
    }
}
