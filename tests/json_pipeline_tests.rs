#![allow(
    clippy::expect_used,
    reason = "integration tests prefer expect for expressive failures"
)]

//! End-to-end pipeline: JSON build files on disk, parallel loading,
//! resolution, and ninja files written through a capability handle.

mod common;

use std::fs;

use camino::Utf8PathBuf;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use genin::loader::JsonLoader;
use genin::ninja;
use genin::paths::{SourceDir, SourceFile};
use genin::scheduler::Scheduler;
use genin::settings::{BuildSettings, TargetOs};
use tempfile::TempDir;

fn write_tree(root: &TempDir, files: &[(&str, &str)]) -> Utf8PathBuf {
    let root_path = Utf8PathBuf::try_from(root.path().to_path_buf()).expect("utf8 temp dir");
    for (path, contents) in files {
        let full = root_path.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).expect("create dirs");
        }
        fs::write(&full, contents).expect("write build file");
    }
    root_path
}

const ROOT_BUILD: &str = r#"{
    "imports": ["//lib/BUILD.json"],
    "targets": [
        {
            "name": "app",
            "output_type": "executable",
            "sources": ["main.cc"],
            "deps": ["//lib:util"]
        }
    ]
}"#;

const LIB_BUILD: &str = r#"{
    "configs": [
        {
            "name": "uses_z",
            "libs": ["z"]
        }
    ],
    "targets": [
        {
            "name": "util",
            "output_type": "static_library",
            "sources": ["util.cc"],
            "all_dependent_configs": [":uses_z"]
        }
    ]
}"#;

fn run_pipeline(root_path: &Utf8PathBuf) -> (genin::builder::Builder, BuildSettings) {
    let build = BuildSettings::new(root_path.clone(), SourceDir::new("//out/Debug/"));
    let loader = JsonLoader::new(build.clone(), None);
    let (builder, errors) =
        Scheduler::new(4).run(&loader, vec![SourceFile::new("//BUILD.json")]);
    assert!(errors.is_empty(), "load errors: {errors:?}");
    let errors = builder.check_for_bad_items();
    assert!(errors.is_empty(), "bad items: {errors:?}");
    (builder, build)
}

#[test]
fn loads_resolves_and_writes_ninja_files() {
    let tmp = TempDir::new().expect("temp dir");
    let root_path = write_tree(&tmp, &[("BUILD.json", ROOT_BUILD), ("lib/BUILD.json", LIB_BUILD)]);

    let (builder, build) = run_pipeline(&root_path);
    let files = ninja::generate(&builder, &build, TargetOs::Linux, None);

    let build_dir = root_path.join("out/Debug");
    fs::create_dir_all(&build_dir).expect("create build dir");
    let dir = Dir::open_ambient_dir(&build_dir, ambient_authority()).expect("open build dir");
    ninja::generate_into(&dir, &files).expect("write files");

    let app = fs::read_to_string(build_dir.join("obj/app.ninja")).expect("app file");
    assert!(app.contains("build obj/app.main.o: cxx ../../main.cc\n"));
    // The all-dependent config pushed -lz onto the executable; the
    // static lib's own output links directly.
    assert!(app.contains("libs = z\n") || app.contains("libs = -lz\n"));
    assert!(app.contains("build app: link obj/app.main.o obj/lib/libutil.a\n"));

    let util = fs::read_to_string(build_dir.join("obj/lib/util.ninja")).expect("util file");
    assert!(util.contains("build obj/lib/util.util.o: cxx ../../lib/util.cc\n"));
    assert!(util.contains("build obj/lib/libutil.a: alink obj/lib/util.util.o\n"));

    let top = fs::read_to_string(build_dir.join("build.ninja")).expect("top file");
    assert!(top.contains("subninja toolchain.ninja\n"));
    assert!(top.contains("build lib/util: phony obj/lib/libutil.a\n"));
    assert!(top.contains("build util: phony obj/lib/libutil.a\n"));
    assert!(top.contains("default all\n"));
}

#[test]
fn regeneration_is_byte_identical() {
    let tmp = TempDir::new().expect("temp dir");
    let root_path = write_tree(&tmp, &[("BUILD.json", ROOT_BUILD), ("lib/BUILD.json", LIB_BUILD)]);

    let (builder_a, build_a) = run_pipeline(&root_path);
    let (builder_b, build_b) = run_pipeline(&root_path);
    let first = ninja::generate(&builder_a, &build_a, TargetOs::Linux, None);
    let second = ninja::generate(&builder_b, &build_b, TargetOs::Linux, None);
    assert_eq!(first, second);
}

#[test]
fn malformed_json_surfaces_a_located_parse_error() {
    let tmp = TempDir::new().expect("temp dir");
    let root_path = write_tree(&tmp, &[("BUILD.json", "{ not json")]);

    let build = BuildSettings::new(root_path, SourceDir::new("//out/Debug/"));
    let loader = JsonLoader::new(build.clone(), None);
    let (_, errors) = Scheduler::new(2).run(&loader, vec![SourceFile::new("//BUILD.json")]);
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], genin::errors::GenError::ParseOrType { .. }));
}
