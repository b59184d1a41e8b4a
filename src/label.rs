//! Labels identifying items in the build graph.
//!
//! A label is a directory, a name, and the toolchain the item is built
//! with, e.g. `//base:base_unittests(//build:msvc)`. Toolchain is part of
//! identity: the same directory and name under two toolchains are two
//! distinct items.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::paths::SourceDir;

/// Identity of an item: directory, name, and toolchain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Label {
    dir: SourceDir,
    name: String,
    toolchain_dir: SourceDir,
    toolchain_name: String,
}

impl Label {
    pub fn new(
        dir: SourceDir,
        name: impl Into<String>,
        toolchain_dir: SourceDir,
        toolchain_name: impl Into<String>,
    ) -> Self {
        Self {
            dir,
            name: name.into(),
            toolchain_dir,
            toolchain_name: toolchain_name.into(),
        }
    }

    /// A label in the default toolchain.
    pub fn without_toolchain(dir: SourceDir, name: impl Into<String>) -> Self {
        Self {
            dir,
            name: name.into(),
            toolchain_dir: SourceDir::default(),
            toolchain_name: String::new(),
        }
    }

    /// Parse a label reference against the directory it appears in.
    ///
    /// Accepted forms are `//foo/bar:baz`, `//foo/bar` (name defaults to
    /// the last directory component), `:baz` (current directory), and
    /// `relative/dir:baz`, each optionally followed by a toolchain in
    /// parentheses. Labels with no explicit toolchain inherit
    /// `default_toolchain`.
    ///
    /// # Errors
    ///
    /// Returns a message describing the malformed part when the input
    /// cannot be parsed.
    pub fn resolve(
        current_dir: &SourceDir,
        default_toolchain: Option<&Label>,
        input: &str,
    ) -> Result<Self, String> {
        let (body, toolchain) = match input.split_once('(') {
            Some((body, rest)) => {
                let inner = rest
                    .strip_suffix(')')
                    .ok_or_else(|| format!("unterminated toolchain in label \"{input}\""))?;
                (body, Some(inner))
            }
            None => (input, None),
        };

        if body.is_empty() {
            return Err(format!("label \"{input}\" has no name or directory"));
        }

        let (dir_part, name_part) = match body.rsplit_once(':') {
            Some((dir, name)) => {
                if name.is_empty() {
                    return Err(format!("label \"{input}\" names an empty target"));
                }
                (dir, Some(name))
            }
            None => (body, None),
        };

        let dir = if dir_part.is_empty() {
            current_dir.clone()
        } else {
            current_dir.resolve_dir(dir_part)
        };

        let name = match name_part {
            Some(name) => name.to_owned(),
            None => {
                // "//foo/bar" is shorthand for "//foo/bar:bar".
                let trimmed = dir.value().trim_end_matches('/');
                let last = trimmed.rsplit('/').next().unwrap_or_default();
                if last.is_empty() {
                    return Err(format!("label \"{input}\" has no implicit name"));
                }
                last.to_owned()
            }
        };

        let (toolchain_dir, toolchain_name) = match toolchain {
            Some(tc) => {
                let tc_label = Self::resolve(current_dir, None, tc)?;
                (tc_label.dir, tc_label.name)
            }
            None => default_toolchain.map_or_else(
                || (SourceDir::default(), String::new()),
                |t| (t.dir.clone(), t.name.clone()),
            ),
        };

        Ok(Self {
            dir,
            name,
            toolchain_dir,
            toolchain_name,
        })
    }

    #[must_use]
    pub fn dir(&self) -> &SourceDir {
        &self.dir
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn toolchain_dir(&self) -> &SourceDir {
        &self.toolchain_dir
    }

    #[must_use]
    pub fn toolchain_name(&self) -> &str {
        &self.toolchain_name
    }

    #[must_use]
    pub fn has_toolchain(&self) -> bool {
        !self.toolchain_name.is_empty()
    }

    /// The label naming this item's toolchain, if it has one.
    #[must_use]
    pub fn toolchain_label(&self) -> Option<Label> {
        self.has_toolchain().then(|| Label {
            dir: self.toolchain_dir.clone(),
            name: self.toolchain_name.clone(),
            toolchain_dir: SourceDir::default(),
            toolchain_name: String::new(),
        })
    }

    /// The short `//dir:name` rendering without the toolchain.
    #[must_use]
    pub fn display_short(&self) -> String {
        format!("{}:{}", self.dir.without_last_slash(), self.name)
    }

    /// The explicit rendering including the toolchain when present.
    #[must_use]
    pub fn display_with_toolchain(&self) -> String {
        if self.has_toolchain() {
            format!(
                "{}({}:{})",
                self.display_short(),
                self.toolchain_dir.without_last_slash(),
                self.toolchain_name,
            )
        } else {
            self.display_short()
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_short())
    }
}
