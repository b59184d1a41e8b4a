//! The item sum type and the resolved-graph view.

use crate::config::Config;
use crate::errors::Location;
use crate::label::Label;
use crate::target::Target;
use crate::toolchain::Toolchain;

/// Anything that can be defined in a build description and referenced by
/// label.
#[derive(Clone, Debug)]
pub enum Item {
    Target(Target),
    Config(Config),
    Toolchain(Toolchain),
}

impl Item {
    #[must_use]
    pub fn label(&self) -> &Label {
        match self {
            Self::Target(t) => t.label(),
            Self::Config(c) => c.label(),
            Self::Toolchain(t) => t.label(),
        }
    }

    #[must_use]
    pub fn defined_from(&self) -> &Location {
        match self {
            Self::Target(t) => t.defined_from(),
            Self::Config(c) => c.defined_from(),
            Self::Toolchain(t) => t.defined_from(),
        }
    }

    /// A noun for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Target(_) => "target",
            Self::Config(_) => "config",
            Self::Toolchain(_) => "toolchain",
        }
    }

    #[must_use]
    pub fn as_target(&self) -> Option<&Target> {
        match self {
            Self::Target(t) => Some(t),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_config(&self) -> Option<&Config> {
        match self {
            Self::Config(c) => Some(c),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_toolchain(&self) -> Option<&Toolchain> {
        match self {
            Self::Toolchain(t) => Some(t),
            _ => None,
        }
    }
}

/// Read access to already-resolved items.
///
/// Propagation and emission look items up by label instead of holding
/// references: the central store owns every item, so back-references
/// (e.g. `forward_dependent_configs`) cannot form ownership cycles.
pub trait GraphView {
    fn target(&self, label: &Label) -> Option<&Target>;
    fn config(&self, label: &Label) -> Option<&Config>;
    fn toolchain(&self, label: &Label) -> Option<&Toolchain>;
}
