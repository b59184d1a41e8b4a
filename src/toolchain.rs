//! Toolchains: the tools that turn sources into artifacts.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::Location;
use crate::label::Label;
use crate::sources::SourceFileType;
use crate::target::OutputType;

/// The tool slots a toolchain can fill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolType {
    Cc,
    Cxx,
    Objc,
    Objcxx,
    Rc,
    Asm,
    Alink,
    Solink,
    Link,
    Stamp,
    Copy,
}

impl ToolType {
    /// The ninja rule name for this tool, before any toolchain prefix.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Cc => "cc",
            Self::Cxx => "cxx",
            Self::Objc => "objc",
            Self::Objcxx => "objcxx",
            Self::Rc => "rc",
            Self::Asm => "asm",
            Self::Alink => "alink",
            Self::Solink => "solink",
            Self::Link => "link",
            Self::Stamp => "stamp",
            Self::Copy => "copy",
        }
    }

    /// Parse the name used in build descriptions.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "cc" => Some(Self::Cc),
            "cxx" => Some(Self::Cxx),
            "objc" => Some(Self::Objc),
            "objcxx" => Some(Self::Objcxx),
            "rc" => Some(Self::Rc),
            "asm" => Some(Self::Asm),
            "alink" => Some(Self::Alink),
            "solink" => Some(Self::Solink),
            "link" => Some(Self::Link),
            "stamp" => Some(Self::Stamp),
            "copy" => Some(Self::Copy),
            _ => None,
        }
    }

    /// The compile tool for a classified source, when one applies.
    #[must_use]
    pub fn for_source_type(ty: SourceFileType) -> Option<Self> {
        match ty {
            SourceFileType::C => Some(Self::Cc),
            SourceFileType::Cpp => Some(Self::Cxx),
            SourceFileType::ObjC => Some(Self::Objc),
            SourceFileType::ObjCpp => Some(Self::Objcxx),
            SourceFileType::Resource => Some(Self::Rc),
            SourceFileType::Assembly => Some(Self::Asm),
            SourceFileType::Header | SourceFileType::Unknown => None,
        }
    }

    /// The link-stage tool for a binary target.
    #[must_use]
    pub fn for_output_type(output_type: OutputType) -> Option<Self> {
        match output_type {
            OutputType::StaticLibrary => Some(Self::Alink),
            OutputType::SharedLibrary => Some(Self::Solink),
            OutputType::Executable => Some(Self::Link),
            OutputType::SourceSet => Some(Self::Stamp),
            _ => None,
        }
    }
}

/// One tool definition inside a toolchain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    /// Command template the downstream executor runs.
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub depfile: String,
    /// The ninja `deps` mode, e.g. `gcc` or `msvc`.
    #[serde(default)]
    pub depsformat: String,
    /// Prefix for each library on the link line, e.g. `-l`.
    #[serde(default)]
    pub lib_prefix: String,
    /// Prefix for each library search dir on the link line, e.g. `-L`.
    #[serde(default)]
    pub lib_dir_prefix: String,
}

/// A toolchain item: a named set of tools.
#[derive(Clone, Debug, Default)]
pub struct Toolchain {
    label: Label,
    defined_from: Location,
    tools: IndexMap<ToolType, Tool>,
}

impl Toolchain {
    pub fn new(label: Label, defined_from: Location) -> Self {
        Self {
            label,
            defined_from,
            tools: IndexMap::new(),
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

    pub fn set_tool(&mut self, ty: ToolType, tool: Tool) {
        self.tools.insert(ty, tool);
    }

    #[must_use]
    pub fn tool(&self, ty: ToolType) -> Option<&Tool> {
        self.tools.get(&ty)
    }

    /// The defined tools, in definition order.
    pub fn tools(&self) -> impl Iterator<Item = (ToolType, &Tool)> {
        self.tools.iter().map(|(ty, tool)| (*ty, tool))
    }
}
