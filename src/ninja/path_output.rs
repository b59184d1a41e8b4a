//! Writing graph paths relative to the build directory.
//!
//! Emitted paths are always relative to the build dir and always use
//! forward slashes. Source-absolute paths are prefixed with the inverse
//! of the build dir (`../../` for `//out/Debug/`); system-absolute paths
//! pass through; output files are already build-dir-relative.

use crate::ninja::escape::{EscapeMode, EscapeOptions, escape_to};
use crate::paths::{OutputFile, SourceDir, SourceFile, invert_dir};

/// Whether a directory keeps its trailing slash when written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirMode {
    IncludeLastSlash,
    NoLastSlash,
}

pub struct PathOutput {
    current_dir: SourceDir,
    inverse_current_dir: String,
    options: EscapeOptions,
}

impl PathOutput {
    #[must_use]
    pub fn new(current_dir: SourceDir, mode: EscapeMode) -> Self {
        let inverse_current_dir = invert_dir(&current_dir);
        Self {
            current_dir,
            inverse_current_dir,
            options: EscapeOptions::new(mode),
        }
    }

    #[must_use]
    pub fn current_dir(&self) -> &SourceDir {
        &self.current_dir
    }

    pub fn set_inhibit_quoting(&mut self, inhibit: bool) {
        self.options.inhibit_quoting = inhibit;
    }

    pub fn write_source_file(&self, out: &mut String, file: &SourceFile) {
        if file.is_source_absolute() {
            let mut path = self.inverse_current_dir.clone();
            path.push_str(&file.value()[2..]);
            escape_to(out, &path, self.options);
        } else {
            escape_to(out, file.value(), self.options);
        }
    }

    pub fn write_output_file(&self, out: &mut String, file: &OutputFile) {
        escape_to(out, file.value(), self.options);
    }

    pub fn write_dir(&self, out: &mut String, dir: &SourceDir, mode: DirMode) {
        let mut path = if dir.is_source_absolute() {
            if dir.value() == "//" {
                if self.inverse_current_dir.is_empty() {
                    "./".to_owned()
                } else {
                    self.inverse_current_dir.clone()
                }
            } else {
                let mut path = self.inverse_current_dir.clone();
                path.push_str(&dir.value()[2..]);
                path
            }
        } else if dir.value() == "/" {
            "/.".to_owned()
        } else {
            dir.value().to_owned()
        };
        if mode == DirMode::NoLastSlash && path.len() > 1 && path.ends_with('/') {
            path.pop();
        }
        escape_to(out, &path, self.options);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output() -> PathOutput {
        PathOutput::new(SourceDir::new("//out/Debug/"), EscapeMode::Ninja)
    }

    #[test]
    fn source_files_are_rebased_to_the_build_dir() {
        let mut out = String::new();
        output().write_source_file(&mut out, &SourceFile::new("//foo/input1.cc"));
        assert_eq!(out, "../../foo/input1.cc");
    }

    #[test]
    fn system_absolute_files_pass_through() {
        let mut out = String::new();
        output().write_source_file(&mut out, &SourceFile::new("/usr/include/z.h"));
        assert_eq!(out, "/usr/include/z.h");
    }

    #[test]
    fn output_files_are_already_relative() {
        let mut out = String::new();
        output().write_output_file(&mut out, &OutputFile::new("obj/foo/bar.o"));
        assert_eq!(out, "obj/foo/bar.o");
    }

    #[test]
    fn dirs_can_drop_the_trailing_slash() {
        let mut out = String::new();
        output().write_dir(&mut out, &SourceDir::new("//foo/bar/"), DirMode::NoLastSlash);
        assert_eq!(out, "../../foo/bar");

        out.clear();
        output().write_dir(&mut out, &SourceDir::new("//foo/"), DirMode::IncludeLastSlash);
        assert_eq!(out, "../../foo/");
    }

    #[test]
    fn source_root_writes_as_the_inverse() {
        let mut out = String::new();
        output().write_dir(&mut out, &SourceDir::source_root(), DirMode::NoLastSlash);
        assert_eq!(out, "../..");
    }

    #[test]
    fn paths_with_spaces_are_ninja_escaped() {
        let mut out = String::new();
        output().write_source_file(&mut out, &SourceFile::new("//my dir/a.cc"));
        assert_eq!(out, "../../my$ dir/a.cc");
    }
}
