//! A JSON reference front-end.
//!
//! The real expression-language interpreter is an external collaborator;
//! this loader exists so the binary works end-to-end and so tests can
//! drive the full pipeline from files on disk. Each build file is a JSON
//! rendering of [`FileDecl`].

use crate::decl::{DeclContext, FileDecl, config_from_decl, target_from_decl, toolchain_from_decl};
use crate::errors::{GenError, Location};
use crate::item::Item;
use crate::label::Label;
use crate::paths::SourceFile;
use crate::scheduler::{ItemSink, Loader};
use crate::settings::BuildSettings;

pub struct JsonLoader {
    build: BuildSettings,
    default_toolchain: Option<Label>,
}

impl JsonLoader {
    #[must_use]
    pub fn new(build: BuildSettings, default_toolchain: Option<Label>) -> Self {
        Self {
            build,
            default_toolchain,
        }
    }
}

impl Loader for JsonLoader {
    fn load(&self, file: &SourceFile, sink: &ItemSink) -> Result<(), GenError> {
        let path = self.build.full_path(file);
        let text = std::fs::read_to_string(path.as_std_path()).map_err(|source| GenError::Io {
            path: path.to_string(),
            source,
        })?;
        let decl: FileDecl =
            serde_json::from_str(&text).map_err(|error| GenError::ParseOrType {
                location: Location::new(
                    file.clone(),
                    u32::try_from(error.line()).unwrap_or(u32::MAX),
                    u32::try_from(error.column()).unwrap_or(u32::MAX),
                ),
                message: error.to_string(),
            })?;

        let ctx = DeclContext::new(file, self.default_toolchain.as_ref());
        for import in &decl.imports {
            sink.request_load(ctx.dir.resolve_file(import));
        }
        for config in &decl.configs {
            sink.item_defined(Item::Config(config_from_decl(&ctx, config)?));
        }
        for toolchain in &decl.toolchains {
            sink.item_defined(Item::Toolchain(toolchain_from_decl(&ctx, toolchain)?));
        }
        for target in &decl.targets {
            sink.item_defined(Item::Target(target_from_decl(&ctx, &self.build, target)?));
        }
        Ok(())
    }
}
