//! Configs: named bundles of compile and link settings.

use serde::{Deserialize, Serialize};

use crate::errors::Location;
use crate::label::Label;
use crate::paths::SourceDir;

/// The ordered value lists a config (or a target directly) can carry.
///
/// Order within each list is significant: it becomes command-line order.
/// Concatenation across configs is stable, so merged output is
/// deterministic for a given declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigValues {
    #[serde(default)]
    pub defines: Vec<String>,
    #[serde(default)]
    pub include_dirs: Vec<SourceDir>,
    #[serde(default)]
    pub cflags: Vec<String>,
    #[serde(default)]
    pub cflags_c: Vec<String>,
    #[serde(default)]
    pub cflags_cc: Vec<String>,
    #[serde(default)]
    pub cflags_objc: Vec<String>,
    #[serde(default)]
    pub cflags_objcc: Vec<String>,
    #[serde(default)]
    pub ldflags: Vec<String>,
    #[serde(default)]
    pub lib_dirs: Vec<SourceDir>,
    #[serde(default)]
    pub libs: Vec<String>,
}

/// A named config item.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Config {
    label: Label,
    defined_from: Location,
    pub values: ConfigValues,
}

impl Config {
    pub fn new(label: Label, defined_from: Location) -> Self {
        Self {
            label,
            defined_from,
            values: ConfigValues::default(),
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
}
