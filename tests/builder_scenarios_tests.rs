#![allow(
    clippy::expect_used,
    reason = "integration tests prefer expect for expressive failures"
)]

//! Graph-construction failure scenarios: cycles, unresolved labels, and
//! the no-partial-emission guarantee.

mod common;

use common::{label, target, test_build};
use genin::builder::Builder;
use genin::errors::GenError;
use genin::item::Item;
use genin::ninja;
use genin::settings::TargetOs;
use genin::target::OutputType;

#[test]
fn dep_cycle_reports_both_labels_and_emits_nothing() {
    let mut a = target("//foo/", "a", OutputType::StaticLibrary);
    a.deps.push(label("//foo/", "b"));
    let mut b = target("//foo/", "b", OutputType::StaticLibrary);
    b.deps.push(label("//foo/", "a"));

    let mut builder = Builder::new();
    builder.item_defined(Item::Target(a)).expect("define a");
    builder.item_defined(Item::Target(b)).expect("define b");

    let errors = builder.check_for_bad_items();
    assert_eq!(errors.len(), 1, "one error for one cycle: {errors:?}");
    let GenError::DependencyCycle { members, .. } = &errors[0] else {
        panic!("expected a cycle, got {:?}", errors[0]);
    };
    assert!(members.contains(&label("//foo/", "a")));
    assert!(members.contains(&label("//foo/", "b")));

    // Neither target resolved, so no per-target file may be flushed.
    let files = ninja::generate(&builder, &test_build(), TargetOs::Linux, None);
    assert!(
        files.iter().all(|f| !f.path.value().starts_with("obj/")),
        "unexpected per-target output: {files:?}",
    );
}

#[test]
fn unresolved_label_names_the_referrer() {
    let mut a = target("//foo/", "a", OutputType::Executable);
    a.deps.push(label("//lib/", "gone"));

    let mut builder = Builder::new();
    builder.item_defined(Item::Target(a)).expect("define a");

    let errors = builder.check_for_bad_items();
    assert_eq!(errors.len(), 1);
    let GenError::UnresolvedLabel {
        label: missing,
        referenced_by,
        ..
    } = &errors[0]
    else {
        panic!("expected unresolved label, got {:?}", errors[0]);
    };
    assert_eq!(*missing, label("//lib/", "gone"));
    assert_eq!(*referenced_by, label("//foo/", "a"));
}

#[test]
fn chain_through_a_cycle_stays_unresolved() {
    // c -> a -> b -> a: c is stuck behind the cycle but not part of it.
    let mut a = target("//foo/", "a", OutputType::StaticLibrary);
    a.deps.push(label("//foo/", "b"));
    let mut b = target("//foo/", "b", OutputType::StaticLibrary);
    b.deps.push(label("//foo/", "a"));
    let mut c = target("//foo/", "c", OutputType::Executable);
    c.deps.push(label("//foo/", "a"));

    let mut builder = Builder::new();
    builder.item_defined(Item::Target(c)).expect("define c");
    builder.item_defined(Item::Target(a)).expect("define a");
    builder.item_defined(Item::Target(b)).expect("define b");

    assert!(!builder.is_resolved(&label("//foo/", "c")));
    let errors = builder.check_for_bad_items();
    let cycles = errors
        .iter()
        .filter(|e| matches!(e, GenError::DependencyCycle { .. }))
        .count();
    assert_eq!(cycles, 1);
}

#[test]
fn toolchain_references_participate_in_resolution() {
    use genin::errors::Location;
    use genin::label::Label;
    use genin::paths::SourceDir;
    use genin::toolchain::Toolchain;

    let toolchain_label = Label::without_toolchain(SourceDir::new("//build/"), "arm");
    let target_label = Label::new(
        SourceDir::new("//foo/"),
        "lib",
        SourceDir::new("//build/"),
        "arm",
    );
    let mut lib = genin::target::Target::new(target_label.clone(), Location::default());
    lib.output_type = OutputType::StaticLibrary;

    let mut builder = Builder::new();
    builder.item_defined(Item::Target(lib)).expect("define lib");
    assert!(
        !builder.is_resolved(&target_label),
        "target must wait for its toolchain",
    );

    builder
        .item_defined(Item::Toolchain(Toolchain::new(
            toolchain_label,
            Location::default(),
        )))
        .expect("define toolchain");
    assert!(builder.is_resolved(&target_label));
    assert!(builder.check_for_bad_items().is_empty());
}

#[test]
fn same_name_under_two_toolchains_is_not_a_duplicate() {
    use genin::errors::Location;
    use genin::label::Label;
    use genin::paths::SourceDir;
    use genin::toolchain::Toolchain;

    let arm = Label::without_toolchain(SourceDir::new("//build/"), "arm");
    let mut builder = Builder::new();
    builder
        .item_defined(Item::Toolchain(Toolchain::new(arm, Location::default())))
        .expect("define toolchain");

    let default_lib = target("//foo/", "lib", OutputType::StaticLibrary);
    builder.item_defined(Item::Target(default_lib)).expect("define default");

    let arm_label = Label::new(
        SourceDir::new("//foo/"),
        "lib",
        SourceDir::new("//build/"),
        "arm",
    );
    let mut arm_lib = genin::target::Target::new(arm_label, Location::default());
    arm_lib.output_type = OutputType::StaticLibrary;
    builder.item_defined(Item::Target(arm_lib)).expect("define arm copy");

    assert!(builder.check_for_bad_items().is_empty());
}

#[test]
fn duplicate_definition_is_an_error() {
    let mut builder = Builder::new();
    builder
        .item_defined(Item::Target(target("//foo/", "a", OutputType::Group)))
        .expect("define a");
    let err = builder
        .item_defined(Item::Target(target("//foo/", "a", OutputType::Group)))
        .expect_err("duplicate");
    assert!(matches!(err, GenError::DuplicateDefinition { .. }));
}
