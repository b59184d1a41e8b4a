//! Declarative item payloads.
//!
//! The expression-language front-end is an external collaborator: it
//! evaluates build files and hands over fully-populated declarations.
//! These types are that wire format — plain serde data with string labels
//! and paths still relative to the declaring directory. Conversion into
//! graph items resolves the strings and applies the checks the front-end
//! cannot do (output types, boolean fields, script outputs inside the
//! build dir).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{Config, ConfigValues};
use crate::errors::{GenError, Location};
use crate::label::Label;
use crate::paths::{SourceDir, SourceFile};
use crate::settings::BuildSettings;
use crate::target::{OutputType, ScriptValues, Target};
use crate::toolchain::{Tool, ToolType, Toolchain};

/// Everything one build file declares.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FileDecl {
    /// Further build files to load, relative to this one.
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub configs: Vec<ConfigDecl>,
    #[serde(default)]
    pub toolchains: Vec<ToolchainDecl>,
    #[serde(default)]
    pub targets: Vec<TargetDecl>,
}

/// Value lists with directories still in their declared (possibly
/// relative) spelling.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConfigValuesDecl {
    #[serde(default)]
    pub defines: Vec<String>,
    #[serde(default)]
    pub include_dirs: Vec<String>,
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
    pub lib_dirs: Vec<String>,
    #[serde(default)]
    pub libs: Vec<String>,
}

impl ConfigValuesDecl {
    fn resolve(&self, dir: &SourceDir) -> ConfigValues {
        ConfigValues {
            defines: self.defines.clone(),
            include_dirs: self.include_dirs.iter().map(|d| dir.resolve_dir(d)).collect(),
            cflags: self.cflags.clone(),
            cflags_c: self.cflags_c.clone(),
            cflags_cc: self.cflags_cc.clone(),
            cflags_objc: self.cflags_objc.clone(),
            cflags_objcc: self.cflags_objcc.clone(),
            ldflags: self.ldflags.clone(),
            lib_dirs: self.lib_dirs.iter().map(|d| dir.resolve_dir(d)).collect(),
            libs: self.libs.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConfigDecl {
    pub name: String,
    #[serde(flatten)]
    pub values: ConfigValuesDecl,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ToolchainDecl {
    pub name: String,
    #[serde(default)]
    pub tools: Vec<ToolDecl>,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ToolDecl {
    pub name: String,
    #[serde(flatten)]
    pub tool: Tool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScriptDecl {
    pub script: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub depfile: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TargetDecl {
    pub name: String,
    pub output_type: String,
    #[serde(default)]
    pub output_name: String,
    #[serde(default)]
    pub output_extension: String,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub source_prereqs: Vec<String>,
    #[serde(default)]
    pub data: Vec<String>,
    #[serde(default)]
    pub deps: Vec<String>,
    #[serde(default)]
    pub datadeps: Vec<String>,
    #[serde(default)]
    pub configs: Vec<String>,
    #[serde(default)]
    pub all_dependent_configs: Vec<String>,
    #[serde(default)]
    pub direct_dependent_configs: Vec<String>,
    #[serde(default)]
    pub forward_dependent_configs: Vec<String>,
    /// Kept loosely typed so a front-end handing over the wrong kind of
    /// value gets a bad-type diagnostic instead of a parse failure.
    #[serde(default)]
    pub hard_dep: Option<Value>,
    #[serde(default)]
    pub external: Option<Value>,
    #[serde(default)]
    pub gyp_file: String,
    #[serde(flatten)]
    pub values: ConfigValuesDecl,
    #[serde(default)]
    pub script: Option<ScriptDecl>,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

/// Where a declaration lives, for diagnostics and label resolution.
#[derive(Clone, Debug)]
pub struct DeclContext<'a> {
    pub file: &'a SourceFile,
    pub dir: SourceDir,
    pub default_toolchain: Option<&'a Label>,
}

impl<'a> DeclContext<'a> {
    #[must_use]
    pub fn new(file: &'a SourceFile, default_toolchain: Option<&'a Label>) -> Self {
        Self {
            file,
            dir: file.dir(),
            default_toolchain,
        }
    }

    fn location(&self, line: u32, column: u32) -> Location {
        Location::new(self.file.clone(), line, column)
    }

    fn resolve_label(&self, input: &str, location: &Location) -> Result<Label, GenError> {
        Label::resolve(&self.dir, self.default_toolchain, input).map_err(|message| {
            GenError::ParseOrType {
                location: location.clone(),
                message,
            }
        })
    }

    fn resolve_label_list(
        &self,
        inputs: &[String],
        location: &Location,
    ) -> Result<Vec<Label>, GenError> {
        inputs
            .iter()
            .map(|input| self.resolve_label(input, location))
            .collect()
    }
}

/// Convert a config declaration into a graph item.
///
/// # Errors
///
/// Label syntax problems surface as [`GenError::ParseOrType`].
pub fn config_from_decl(ctx: &DeclContext<'_>, decl: &ConfigDecl) -> Result<Config, GenError> {
    let location = ctx.location(decl.line, decl.column);
    let label = ctx.resolve_label(&format!(":{}", decl.name), &location)?;
    let mut config = Config::new(label, location);
    config.values = decl.values.resolve(&ctx.dir);
    Ok(config)
}

/// Convert a toolchain declaration into a graph item.
///
/// # Errors
///
/// Unknown tool names surface as [`GenError::ParseOrType`].
pub fn toolchain_from_decl(
    ctx: &DeclContext<'_>,
    decl: &ToolchainDecl,
) -> Result<Toolchain, GenError> {
    let location = ctx.location(decl.line, decl.column);
    let label = ctx.resolve_label(&format!(":{}", decl.name), &location)?;
    // Toolchain identity carries no toolchain of its own.
    let label = Label::without_toolchain(label.dir().clone(), label.name());
    let mut toolchain = Toolchain::new(label, location.clone());
    for tool in &decl.tools {
        let ty = ToolType::from_name(&tool.name).ok_or_else(|| GenError::ParseOrType {
            location: location.clone(),
            message: format!("unknown tool \"{}\"", tool.name),
        })?;
        toolchain.set_tool(ty, tool.tool.clone());
    }
    Ok(toolchain)
}

/// Convert a target declaration into a graph item.
///
/// # Errors
///
/// [`GenError::UnknownOutputType`] for an unrecognized `output_type`,
/// [`GenError::BadType`] for non-boolean `hard_dep`/`external`,
/// [`GenError::ConfigOutsideOutputDir`] for script outputs not under the
/// build dir, and [`GenError::ParseOrType`] for malformed labels.
pub fn target_from_decl(
    ctx: &DeclContext<'_>,
    build: &BuildSettings,
    decl: &TargetDecl,
) -> Result<Target, GenError> {
    let location = ctx.location(decl.line, decl.column);

    let output_type = OutputType::from_name(&decl.output_type).ok_or_else(|| {
        GenError::UnknownOutputType {
            value: decl.output_type.clone(),
            location: location.clone(),
        }
    })?;

    let label = Label::new(
        ctx.dir.clone(),
        decl.name.clone(),
        ctx.default_toolchain
            .map(|t| t.dir().clone())
            .unwrap_or_default(),
        ctx.default_toolchain.map(|t| t.name().to_owned()).unwrap_or_default(),
    );

    let mut target = Target::new(label, location.clone());
    target.output_type = output_type;
    target.output_name = decl.output_name.clone();
    target.output_extension = decl.output_extension.clone();

    target.sources = decl.sources.iter().map(|s| ctx.dir.resolve_file(s)).collect();
    target.source_prereqs =
        decl.source_prereqs.iter().map(|s| ctx.dir.resolve_file(s)).collect();
    target.data = decl.data.iter().map(|s| ctx.dir.resolve_file(s)).collect();

    target.hard_dep = require_bool(&decl.hard_dep, "hard_dep", &location)?;
    target.external = require_bool(&decl.external, "external", &location)?;
    if !decl.gyp_file.is_empty() {
        target.gyp_file = ctx.dir.resolve_file(&decl.gyp_file);
    }

    target.deps = ctx.resolve_label_list(&decl.deps, &location)?;
    target.datadeps = ctx.resolve_label_list(&decl.datadeps, &location)?;
    target.configs = ctx.resolve_label_list(&decl.configs, &location)?;
    target.all_dependent_configs =
        ctx.resolve_label_list(&decl.all_dependent_configs, &location)?;
    target.direct_dependent_configs =
        ctx.resolve_label_list(&decl.direct_dependent_configs, &location)?;
    target.forward_dependent_configs =
        ctx.resolve_label_list(&decl.forward_dependent_configs, &location)?;

    target.config_values = decl.values.resolve(&ctx.dir);

    if let Some(script) = &decl.script {
        target.script_values = script_values_from_decl(ctx, build, script, &location)?;
    }
    if output_type == OutputType::CopyFiles
        && target.script_values.outputs.len() != target.sources.len()
    {
        return Err(GenError::ParseOrType {
            location,
            message: format!(
                "copy target declares {} outputs for {} sources",
                target.script_values.outputs.len(),
                target.sources.len(),
            ),
        });
    }

    Ok(target)
}

fn script_values_from_decl(
    ctx: &DeclContext<'_>,
    build: &BuildSettings,
    decl: &ScriptDecl,
    location: &Location,
) -> Result<ScriptValues, GenError> {
    let mut outputs = Vec::with_capacity(decl.outputs.len());
    for output in &decl.outputs {
        let resolved = ctx.dir.resolve_file(output);
        if !resolved.value().starts_with(build.build_dir().value()) {
            return Err(GenError::ConfigOutsideOutputDir {
                path: resolved.value().to_owned(),
                location: location.clone(),
            });
        }
        outputs.push(resolved);
    }
    Ok(ScriptValues {
        script: ctx.dir.resolve_file(&decl.script),
        args: decl.args.clone(),
        outputs,
        depfile: decl.depfile.clone(),
    })
}

fn require_bool(
    value: &Option<Value>,
    field: &'static str,
    location: &Location,
) -> Result<bool, GenError> {
    match value {
        None => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(GenError::BadType {
            field,
            expected: "boolean",
            location: location.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::SourceDir;
    use crate::settings::BuildSettings;

    fn context(file: &SourceFile) -> DeclContext<'_> {
        DeclContext::new(file, None)
    }

    fn build() -> BuildSettings {
        BuildSettings::new("/src", SourceDir::new("//out/Debug/"))
    }

    #[test]
    fn target_decl_resolves_paths_and_labels() {
        let file = SourceFile::new("//foo/BUILD");
        let decl = TargetDecl {
            name: "bar".to_owned(),
            output_type: "source_set".to_owned(),
            sources: vec!["input1.cc".to_owned(), "//other/x.cc".to_owned()],
            deps: vec![":baz".to_owned(), "//lib:util".to_owned()],
            ..TargetDecl::default()
        };
        let target = target_from_decl(&context(&file), &build(), &decl).expect("convert");
        assert_eq!(target.label().display_short(), "//foo:bar");
        assert_eq!(target.sources[0].value(), "//foo/input1.cc");
        assert_eq!(target.sources[1].value(), "//other/x.cc");
        assert_eq!(target.deps[0].display_short(), "//foo:baz");
        assert_eq!(target.deps[1].display_short(), "//lib:util");
    }

    #[test]
    fn unknown_output_types_are_rejected() {
        let file = SourceFile::new("//foo/BUILD");
        let decl = TargetDecl {
            name: "bar".to_owned(),
            output_type: "pile_of_bits".to_owned(),
            ..TargetDecl::default()
        };
        let err = target_from_decl(&context(&file), &build(), &decl).expect_err("reject");
        assert!(matches!(err, GenError::UnknownOutputType { value, .. } if value == "pile_of_bits"));
    }

    #[test]
    fn hard_dep_must_be_boolean() {
        let file = SourceFile::new("//foo/BUILD");
        let decl = TargetDecl {
            name: "bar".to_owned(),
            output_type: "group".to_owned(),
            hard_dep: Some(Value::String("yes".to_owned())),
            ..TargetDecl::default()
        };
        let err = target_from_decl(&context(&file), &build(), &decl).expect_err("reject");
        assert!(matches!(err, GenError::BadType { field: "hard_dep", .. }));
    }

    #[test]
    fn script_outputs_must_stay_in_the_build_dir() {
        let file = SourceFile::new("//foo/BUILD");
        let decl = TargetDecl {
            name: "gen".to_owned(),
            output_type: "custom".to_owned(),
            script: Some(ScriptDecl {
                script: "make.py".to_owned(),
                outputs: vec!["//foo/generated.h".to_owned()],
                ..ScriptDecl::default()
            }),
            ..TargetDecl::default()
        };
        let err = target_from_decl(&context(&file), &build(), &decl).expect_err("reject");
        assert!(matches!(err, GenError::ConfigOutsideOutputDir { .. }));

        let ok = TargetDecl {
            name: "gen".to_owned(),
            output_type: "custom".to_owned(),
            script: Some(ScriptDecl {
                script: "make.py".to_owned(),
                outputs: vec!["//out/Debug/gen/generated.h".to_owned()],
                ..ScriptDecl::default()
            }),
            ..TargetDecl::default()
        };
        let target = target_from_decl(&context(&file), &build(), &ok).expect("convert");
        assert_eq!(target.script_values.outputs[0].value(), "//out/Debug/gen/generated.h");
    }

    #[test]
    fn config_decl_resolves_include_dirs() {
        let file = SourceFile::new("//foo/BUILD");
        let decl = ConfigDecl {
            name: "warnings".to_owned(),
            values: ConfigValuesDecl {
                include_dirs: vec!["include".to_owned()],
                cflags: vec!["-Wall".to_owned()],
                ..ConfigValuesDecl::default()
            },
            ..ConfigDecl::default()
        };
        let config = config_from_decl(&context(&file), &decl).expect("convert");
        assert_eq!(config.label().display_short(), "//foo:warnings");
        assert_eq!(config.values.include_dirs[0].value(), "//foo/include/");
        assert_eq!(config.values.cflags, ["-Wall"]);
    }

    #[test]
    fn toolchain_decl_rejects_unknown_tools() {
        let file = SourceFile::new("//build/BUILD");
        let decl = ToolchainDecl {
            name: "host".to_owned(),
            tools: vec![ToolDecl {
                name: "shoemaker".to_owned(),
                tool: Tool::default(),
            }],
            ..ToolchainDecl::default()
        };
        let err = toolchain_from_decl(&context(&file), &decl).expect_err("reject");
        assert!(matches!(err, GenError::ParseOrType { .. }));
    }
}
