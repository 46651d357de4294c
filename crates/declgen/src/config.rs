//! Generator configuration.
//!
//! Every field has a default, so an empty file (or no file) is valid.
//!
//! Example `declgen.toml`:
//! ```toml
//! root_module = "protocol"
//! strict = true
//! derives = ["Debug", "Clone", "PartialEq", "Serialize", "Deserialize"]
//! skip_serializing_none = true
//!
//! [primitives]
//! number = "i64"
//! ```

use crate::error::Error;
use crate::output::{PrimitiveNames, RustOptions};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Name of the synthesized root module when the document is not a
    /// single namespace.
    pub root_module: String,
    /// Treat unsupported type expressions as errors.
    pub strict: bool,
    pub derives: Vec<String>,
    pub prelude: Vec<String>,
    pub header: Option<String>,
    pub skip_serializing_none: bool,
    pub primitives: PrimitiveNames,
}

impl Default for Config {
    fn default() -> Self {
        let output = RustOptions::default();
        Self {
            root_module: "bindings".into(),
            strict: false,
            derives: output.derives,
            prelude: output.prelude,
            header: output.header,
            skip_serializing_none: output.skip_serializing_none,
            primitives: output.primitives,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Options for the Rust writer.
    pub fn rust_options(&self) -> RustOptions {
        RustOptions {
            derives: self.derives.clone(),
            prelude: self.prelude.clone(),
            header: self.header.clone(),
            skip_serializing_none: self.skip_serializing_none,
            primitives: self.primitives.clone(),
        }
    }
}
