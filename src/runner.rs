//! CLI execution and command dispatch logic.
//!
//! This module keeps [`main`] minimal by providing a single entry point
//! that wires settings, the loader pool, resolution checks, and emission
//! together.

use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use miette::Report;

use crate::cli::{Cli, Commands};
use crate::diagnostics::ResultExt;
use crate::loader::JsonLoader;
use crate::ninja;
use crate::paths::{SourceDir, SourceFile};
use crate::scheduler::Scheduler;
use crate::settings::{BuildSettings, TargetOs};

/// The build file loaded first, at the source root.
const ROOT_BUILD_FILE: &str = "//BUILD.json";

/// Execute the parsed [`Cli`] commands.
///
/// # Errors
///
/// Any pipeline error, rendered as a diagnostic for the user.
pub fn run(cli: &Cli) -> miette::Result<()> {
    match &cli.command {
        Commands::Gen {
            build_dir,
            os,
            jobs,
        } => run_gen(cli, build_dir, (*os).into(), *jobs),
    }
}

fn run_gen(cli: &Cli, build_dir: &str, os: TargetOs, jobs: Option<usize>) -> miette::Result<()> {
    let root = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir()
            .diag("determine the current directory")?
            .try_into()
            .map_err(|_| miette::miette!("the current directory is not valid UTF-8"))?,
    };
    let build_dir = if build_dir.starts_with("//") {
        SourceDir::new(build_dir)
    } else {
        SourceDir::new(format!("//{build_dir}"))
    };
    tracing::info!(root = %root, build_dir = %build_dir, "generating");

    let mut build = BuildSettings::new(root.clone(), build_dir.clone());
    build.build_args_mut().extend(cli.build_args.iter().cloned());

    let loader = JsonLoader::new(build.clone(), None);
    let jobs = jobs.unwrap_or_else(default_jobs);
    let (builder, mut errors) =
        Scheduler::new(jobs).run(&loader, vec![SourceFile::new(ROOT_BUILD_FILE)]);
    errors.extend(builder.check_for_bad_items());
    if !errors.is_empty() {
        let mut errors = errors.into_iter();
        let first = errors.next().map(Report::new);
        for error in errors {
            eprintln!("{:?}", Report::new(error));
        }
        return Err(first.unwrap_or_else(|| miette::miette!("generation failed")));
    }

    let files = ninja::generate(&builder, &build, os, None);

    let build_dir_path = root.join(&build_dir.value()[2..]);
    std::fs::create_dir_all(&build_dir_path)
        .diag_with(|| format!("create build directory {build_dir_path}"))?;
    let dir = Dir::open_ambient_dir(&build_dir_path, ambient_authority())
        .diag_with(|| format!("open build directory {build_dir_path}"))?;
    ninja::generate_into(&dir, &files)?;

    tracing::info!(files = files.len(), "wrote ninja files");
    Ok(())
}

fn default_jobs() -> usize {
    std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get)
}
