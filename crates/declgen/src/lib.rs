//! Rust bindings from TypeScript declarations.
//!
//! `declgen` reads ambient declaration files (`.d.ts`: namespaces,
//! interfaces, enums and type aliases) and writes Rust modules whose types
//! serialize to the same JSON with serde.
//!
//! # Architecture
//!
//! ```text
//! Input              Model                          Output
//! ──────────     ─────────────────────────────     ───────────
//! .d.ts text ──> Module tree ──> normalize ──> dedup ──> Rust source
//!  (input/)       (ir.rs)       (Rust naming)  (unions → enum refs)
//! ```
//!
//! 1. [`input::parse_declarations`] builds the tree with raw identifiers.
//! 2. [`normalize::normalize`] renames every identifier to the Rust
//!    convention for its kind, keeping the source spelling for serde.
//! 3. [`dedup::deduplicate`] replaces inline literal unions with references
//!    to enums that carry exactly the same wire values.
//! 4. [`output::generate_rust_types`] writes the modules.
//!
//! Problems that do not stop generation are collected as
//! [`Diagnostics`] and returned next to the code.
//!
//! # Example
//!
//! ```
//! use declgen::{Config, generate};
//!
//! let source = r#"
//! declare namespace net {
//!     interface Ping {
//!         id: number;
//!         kind: "A" | "B";
//!     }
//!     enum Kind { A = "A", B = "B" }
//! }
//! "#;
//!
//! let generated = generate(source, &Config::default()).unwrap();
//! assert!(generated.code.contains("pub mod net {"));
//! assert!(generated.code.contains("pub kind: Kind,"));
//! ```

pub mod config;
pub mod convention;
pub mod dedup;
pub mod diagnostics;
pub mod error;
pub mod index;
pub mod input;
pub mod ir;
pub mod normalize;
pub mod output;

pub use config::Config;
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use error::Error;
pub use input::ParseError;

/// Result of a successful run.
#[derive(Debug)]
pub struct Generated {
    pub code: String,
    pub diagnostics: Diagnostics,
}

/// Run the whole pipeline over one document.
pub fn generate(source: &str, config: &Config) -> Result<Generated, Error> {
    let mut diagnostics = Diagnostics::new();

    let root = input::parse_declarations(source, &config.root_module, &mut diagnostics)?;
    let mut root = normalize::normalize(root);
    let stats = dedup::deduplicate(&mut root, &mut diagnostics);
    tracing::debug!(
        unions = stats.unions,
        enums = stats.enums,
        rewritten = stats.rewritten,
        "deduplicated literal unions"
    );

    let code = output::generate_rust_types(&root, &config.rust_options(), &mut diagnostics);

    let unsupported = diagnostics.count(DiagnosticKind::UnsupportedType);
    if config.strict && unsupported > 0 {
        for diag in diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::UnsupportedType)
        {
            tracing::error!("{diag}");
        }
        return Err(Error::Unsupported { count: unsupported });
    }

    Ok(Generated { code, diagnostics })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_mode_rejects_unsupported_types() {
        let source = "interface Handler { callback: () => void; }";
        let lenient = generate(source, &Config::default()).unwrap();
        assert!(lenient.code.contains("pub callback: serde_json::Value,"));
        assert_eq!(lenient.diagnostics.count(DiagnosticKind::UnsupportedType), 1);

        let strict = Config {
            strict: true,
            ..Config::default()
        };
        let err = generate(source, &strict).unwrap_err();
        assert!(matches!(err, Error::Unsupported { count: 1 }));
    }

    #[test]
    fn parse_errors_propagate() {
        let err = generate("", &Config::default()).unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::NoDeclarations)));
    }
}
