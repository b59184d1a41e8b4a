//! Source and output path model.
//!
//! Paths inside the build graph are normalized strings rather than host
//! paths. A *source-absolute* path begins with `//` and names a location
//! relative to the source root; a *system-absolute* path begins with a
//! single `/` (or a drive letter on Windows). Output files are stored
//! relative to the build directory and never carry a leading slash.
//!
//! The string model is deliberate: these values are graph identities and
//! wire-format fragments, so they must compare and render byte-for-byte
//! identically on every host. Host-facing paths (the source root on disk,
//! the files we ultimately write) use [`camino::Utf8PathBuf`] instead.
//!
//! ```
//! use genin::paths::{SourceDir, rebase_source_absolute};
//!
//! let build_dir = SourceDir::new("//out/Debug/");
//! assert_eq!(
//!     rebase_source_absolute("//foo/input1.cc", &build_dir),
//!     "../../foo/input1.cc",
//! );
//! ```

use std::fmt;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

/// A file in the build graph, e.g. `//base/files/file_util.cc`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceFile(String);

/// A directory in the build graph. Always ends in a slash, e.g. `//base/`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceDir(String);

/// A file relative to the build directory, e.g. `obj/base/foo.o`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputFile(String);

impl SourceFile {
    /// Create a source file, normalizing the given value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(normalize(&value.into()))
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn is_source_absolute(&self) -> bool {
        self.0.starts_with("//")
    }

    #[must_use]
    pub fn is_system_absolute(&self) -> bool {
        !self.is_source_absolute() && is_absolute(&self.0)
    }

    /// The directory containing this file, including the trailing slash.
    #[must_use]
    pub fn dir(&self) -> SourceDir {
        SourceDir(find_dir(&self.0).to_owned())
    }

    /// The file name part after the last slash.
    #[must_use]
    pub fn file_name(&self) -> &str {
        find_filename(&self.0)
    }

    /// The file name with the extension (and its dot) removed.
    #[must_use]
    pub fn stem(&self) -> &str {
        find_filename_no_extension(&self.0)
    }

    /// The extension after the last dot in the file name, if any.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        find_extension(&self.0)
    }
}

impl fmt::Display for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl SourceDir {
    /// Create a source dir, normalizing and ensuring a trailing slash.
    pub fn new(value: impl Into<String>) -> Self {
        let mut value = normalize(&value.into());
        if !value.ends_with('/') {
            value.push('/');
        }
        Self(value)
    }

    /// The source root, `//`.
    #[must_use]
    pub fn source_root() -> Self {
        Self("//".to_owned())
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn is_source_absolute(&self) -> bool {
        self.0.starts_with("//")
    }

    /// The directory with the trailing slash removed. The roots `/` and `//`
    /// become `/.` and `//.` so the result still names a directory.
    #[must_use]
    pub fn without_last_slash(&self) -> String {
        match self.0.as_str() {
            "" => String::new(),
            "/" => "/.".to_owned(),
            "//" => "//.".to_owned(),
            other => other[..other.len() - 1].to_owned(),
        }
    }

    /// Resolve a possibly-relative file reference against this directory.
    ///
    /// Absolute inputs (`//...`, `/...`, or a Windows drive) pass through
    /// unchanged apart from normalization.
    #[must_use]
    pub fn resolve_file(&self, input: &str) -> SourceFile {
        SourceFile(self.resolve(input))
    }

    /// Resolve a possibly-relative directory reference against this
    /// directory, preserving the trailing slash.
    #[must_use]
    pub fn resolve_dir(&self, input: &str) -> SourceDir {
        let mut value = self.resolve(input);
        if !value.ends_with('/') {
            value.push('/');
        }
        SourceDir(value)
    }

    fn resolve(&self, input: &str) -> String {
        if is_absolute(input) {
            normalize(input)
        } else {
            normalize(&format!("{}{input}", self.0))
        }
    }
}

impl fmt::Display for SourceDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl OutputFile {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }

    pub fn push_str(&mut self, s: &str) {
        self.0.push_str(s);
    }

    /// The file name part after the last slash.
    #[must_use]
    pub fn file_name(&self) -> &str {
        find_filename(&self.0)
    }
}

impl fmt::Display for OutputFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// True for `//...`, `/...`, and `c:/...` forms.
#[must_use]
pub fn is_absolute(path: &str) -> bool {
    let bytes = path.as_bytes();
    if bytes.first() == Some(&b'/') {
        return true;
    }
    // Windows drive letter, e.g. "C:/foo".
    bytes.len() > 2
        && bytes[1] == b':'
        && bytes[0].is_ascii_alphabetic()
        && (bytes[2] == b'/' || bytes[2] == b'\\')
}

/// Collapse `.` and `..` components and duplicate slashes, converting
/// backslashes to forward slashes.
///
/// The leading `//` of a source-absolute path is never collapsed, and a
/// `..` at the top of a relative path is retained (it forms a new root
/// that further `..` components cannot delete). The transform is
/// idempotent.
#[must_use]
pub fn normalize(path: &str) -> String {
    let (top, is_relative) = if path.starts_with("//") {
        ("//", false)
    } else if path.starts_with('/') {
        ("/", false)
    } else {
        ("", true)
    };

    let mut out = String::with_capacity(path.len());
    out.push_str(top);
    // Components before this index form the root and cannot be removed by
    // a `..`.
    let mut root_len = top.len();

    for component in path[top.len()..].split(['/', '\\']) {
        match component {
            "" | "." => {}
            ".." => {
                if out.len() > root_len {
                    // Drop the previous component and its slash.
                    let trimmed = out[..out.len() - 1].rfind('/').map_or(root_len, |i| i + 1);
                    out.truncate(trimmed.max(root_len));
                } else if is_relative {
                    // Retain a leading "..": it becomes part of the root.
                    out.push_str("../");
                    root_len = out.len();
                }
                // At the top of an absolute path, ".." is silently eaten.
            }
            c => {
                out.push_str(c);
                out.push('/');
            }
        }
    }

    // The loop appends a slash after every component; remove it unless the
    // input named a directory.
    let names_dir = path.ends_with('/')
        || path.ends_with('\\')
        || path.ends_with("/.")
        || path.ends_with("/..")
        || path == "."
        || path == "..";
    if !names_dir && out.len() > root_len && out.ends_with('/') {
        out.pop();
    }
    out
}

/// The dotted path from `dir` back up to the source root: one `../` per
/// component. The source root itself inverts to the empty string.
#[must_use]
pub fn invert_dir(dir: &SourceDir) -> String {
    let value = dir.value();
    if value.is_empty() {
        return String::new();
    }
    let begin = if value.starts_with("//") { 2 } else { 1 };
    let mut ret = String::new();
    for _ in value[begin..].matches('/') {
        ret.push_str("../");
    }
    ret
}

/// Express the source-absolute `input` relative to the source-absolute
/// directory `dest_dir`. Identical paths collapse to `.`.
#[must_use]
pub fn rebase_source_absolute(input: &str, dest_dir: &SourceDir) -> String {
    debug_assert!(
        input.starts_with("//"),
        "input to rebase isn't source-absolute: {input}",
    );
    debug_assert!(
        dest_dir.is_source_absolute(),
        "dir to rebase to isn't source-absolute: {dest_dir}",
    );

    let dest = dest_dir.value();

    // Skip the common prefix as long as it ends at a slash.
    let mut common = 2; // The leading "//" always matches.
    let max_common = input.len().min(dest.len());
    let (input_b, dest_b) = (input.as_bytes(), dest.as_bytes());
    for i in common..max_common {
        if input_b[i] == b'/' && dest_b[i] == b'/' {
            common = i + 1;
        } else if input_b[i] != dest_b[i] {
            break;
        }
    }

    // Climb out of what remains of dest, then append the unique input tail.
    let mut ret = String::new();
    for _ in dest[common..].matches('/') {
        ret.push_str("../");
    }
    ret.push_str(&input[common..]);

    if ret.is_empty() {
        ret.push('.');
    }
    ret
}

/// The extension after the last dot in the file name, or `None` when the
/// file name has no dot.
#[must_use]
pub fn find_extension(path: &str) -> Option<&str> {
    let name = find_filename(path);
    name.rfind('.').map(|i| &name[i + 1..])
}

/// The part of `path` after the last slash; the whole string when there is
/// no slash.
#[must_use]
pub fn find_filename(path: &str) -> &str {
    path.rfind('/').map_or(path, |i| &path[i + 1..])
}

/// The file name with any extension (and its dot) removed.
#[must_use]
pub fn find_filename_no_extension(path: &str) -> &str {
    let name = find_filename(path);
    name.rfind('.').map_or(name, |i| &name[..i])
}

/// The part of `path` up to and including the last slash; empty when there
/// is no slash.
#[must_use]
pub fn find_dir(path: &str) -> &str {
    path.rfind('/').map_or("", |i| &path[..=i])
}

/// Convert an absolute host path to a source-absolute string when it lies
/// under `source_root`, or `None` when it does not.
#[must_use]
pub fn make_relative_to_source_root(source_root: &Utf8Path, path: &Utf8Path) -> Option<String> {
    let rest = path.strip_prefix(source_root).ok()?;
    let mut ret = String::from("//");
    for component in rest {
        ret.push_str(component);
        ret.push('/');
    }
    if !path.as_str().ends_with('/') && ret.len() > 2 {
        ret.pop();
    }
    Some(normalize(&ret))
}

/// The [`SourceDir`] naming an absolute host directory: source-absolute
/// when inside the source root, system-absolute otherwise.
#[must_use]
pub fn source_dir_for_path(source_root: &Utf8Path, path: &Utf8Path) -> SourceDir {
    if let Some(relative) = make_relative_to_source_root(source_root, path) {
        return SourceDir::new(relative);
    }
    let mut value = String::from("/");
    for component in path {
        if component == "/" {
            continue;
        }
        value.push_str(component);
        value.push('/');
    }
    SourceDir(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("foo/./bar", "foo/bar")]
    #[case("foo//bar", "foo/bar")]
    #[case("foo/bar/../baz", "foo/baz")]
    #[case("foo/bar/..", "foo/")]
    #[case("../foo", "../foo")]
    #[case("../../foo/bar", "../../foo/bar")]
    #[case("foo/../../bar", "../bar")]
    #[case("//foo/../bar", "//bar")]
    #[case("//../foo", "//foo")]
    #[case("/../foo", "/foo")]
    #[case("//foo/bar/", "//foo/bar/")]
    #[case("foo\\bar\\baz.cc", "foo/bar/baz.cc")]
    #[case("//", "//")]
    #[case("/", "/")]
    #[case(".", "")]
    #[case("./", "")]
    fn normalize_collapses_dot_components(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize(input), expected);
    }

    #[rstest]
    #[case("//foo/bar/baz.cc")]
    #[case("../../up/and/over.h")]
    #[case("//a/")]
    #[case("C:/windows/drive.cc")]
    fn normalize_is_idempotent(#[case] input: &str) {
        let once = normalize(input);
        assert_eq!(normalize(&once), once);
    }

    #[rstest]
    #[case("//", "")]
    #[case("//foo/", "../")]
    #[case("//foo/bar/", "../../")]
    #[case("/foo/bar/", "../../")]
    fn invert_dir_counts_components(#[case] dir: &str, #[case] expected: &str) {
        assert_eq!(invert_dir(&SourceDir::new(dir)), expected);
    }

    #[rstest]
    #[case("//foo/input1.cc", "//out/Debug/", "../../foo/input1.cc")]
    #[case("//foo/bar.cc", "//foo/", "bar.cc")]
    #[case("//foo/", "//foo/", ".")]
    #[case("//foo/bar/baz.cc", "//foo/qux/", "../bar/baz.cc")]
    fn rebase_climbs_then_descends(
        #[case] input: &str,
        #[case] dest: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(rebase_source_absolute(input, &SourceDir::new(dest)), expected);
    }

    #[rstest]
    #[case("//foo/bar/baz.cc", "//foo/qux/")]
    #[case("//deep/a/b/c.h", "//out/Debug/")]
    fn rebase_round_trips_through_dest(#[case] input: &str, #[case] dest: &str) {
        let dest = SourceDir::new(dest);
        let rebased = rebase_source_absolute(input, &dest);
        assert_eq!(normalize(&format!("{}{rebased}", dest.value())), input);
    }

    #[rstest]
    #[case("//foo/", "//foo")]
    #[case("//", "//.")]
    #[case("/", "/.")]
    #[case("", "")]
    fn without_last_slash_keeps_roots_addressable(#[case] dir: &str, #[case] expected: &str) {
        let dir = SourceDir(dir.to_owned());
        assert_eq!(dir.without_last_slash(), expected);
    }

    #[test]
    fn resolve_file_joins_relative_input() {
        let dir = SourceDir::new("//base/files/");
        assert_eq!(dir.resolve_file("foo.cc").value(), "//base/files/foo.cc");
        assert_eq!(dir.resolve_file("../util.h").value(), "//base/util.h");
        assert_eq!(dir.resolve_file("//net/sock.cc").value(), "//net/sock.cc");
        assert_eq!(dir.resolve_file("/usr/include/z.h").value(), "/usr/include/z.h");
    }

    #[test]
    fn source_file_parts() {
        let file = SourceFile::new("//foo/bar/input1.cc");
        assert_eq!(file.dir().value(), "//foo/bar/");
        assert_eq!(file.file_name(), "input1.cc");
        assert_eq!(file.stem(), "input1");
        assert_eq!(file.extension(), Some("cc"));

        let no_ext = SourceFile::new("//foo/Makefile");
        assert_eq!(no_ext.extension(), None);
        assert_eq!(no_ext.stem(), "Makefile");
    }

    #[test]
    fn source_dir_for_path_classifies_inside_and_outside() {
        let root = Utf8Path::new("/home/dev/src");
        assert_eq!(
            source_dir_for_path(root, Utf8Path::new("/home/dev/src/base")).value(),
            "//base/",
        );
        assert_eq!(
            source_dir_for_path(root, Utf8Path::new("/usr/lib")).value(),
            "/usr/lib/",
        );
        assert_eq!(source_dir_for_path(root, Utf8Path::new("/home/dev/src")).value(), "//");
    }
}
