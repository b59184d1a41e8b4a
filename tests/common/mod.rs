#![allow(dead_code, reason = "each suite uses a different slice of the fixtures")]

//! Shared fixtures for the integration suites.

use genin::builder::Builder;
use genin::errors::Location;
use genin::item::Item;
use genin::label::Label;
use genin::paths::SourceDir;
use genin::settings::{BuildSettings, Settings, TargetOs};
use genin::target::{OutputType, Target};
use genin::toolchain::{Tool, ToolType, Toolchain};

/// A build rooted at `/src` writing into `//out/Debug/`.
pub fn test_build() -> BuildSettings {
    BuildSettings::new("/src", SourceDir::new("//out/Debug/"))
}

pub fn settings(os: TargetOs) -> Settings {
    Settings::new(os)
}

pub fn label(dir: &str, name: &str) -> Label {
    Label::without_toolchain(SourceDir::new(dir), name)
}

pub fn target(dir: &str, name: &str, output_type: OutputType) -> Target {
    let mut t = Target::new(label(dir, name), Location::default());
    t.output_type = output_type;
    t
}

/// A toolchain with the usual posix link conventions filled in.
pub fn posix_toolchain() -> Toolchain {
    let mut toolchain = Toolchain::new(label("//build/", "host"), Location::default());
    for ty in [ToolType::Alink, ToolType::Solink, ToolType::Link] {
        toolchain.set_tool(
            ty,
            Tool {
                lib_prefix: "-l".to_owned(),
                lib_dir_prefix: "-L".to_owned(),
                ..Tool::default()
            },
        );
    }
    toolchain
}

/// Define every target in the builder and fail on any leftover problem.
pub fn resolve_all(targets: Vec<Target>) -> Builder {
    let mut builder = Builder::new();
    for target in targets {
        builder.item_defined(Item::Target(target)).expect("define item");
    }
    let errors = builder.check_for_bad_items();
    assert!(errors.is_empty(), "unresolved graph: {errors:?}");
    builder
}

/// Emit one resolved target through the given toolchain.
pub fn emit(
    builder: &Builder,
    build: &BuildSettings,
    settings: &Settings,
    toolchain: &Toolchain,
    label: &Label,
) -> String {
    let target = builder
        .item(label)
        .and_then(Item::as_target)
        .expect("resolved target");
    genin::ninja::emit_target(builder, build, settings, toolchain, target)
        .expect("target emits rules")
}
