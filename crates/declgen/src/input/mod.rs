//! Input readers.
//!
//! Each reader parses a declaration language and produces the root
//! [`Module`](crate::ir::Module) of the model, with raw identifiers.

pub mod typescript;

pub use typescript::parse_declarations;

/// Failure to turn declaration text into a model.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("failed to load the TypeScript grammar: {0}")]
    Grammar(String),
    #[error("the parser produced no syntax tree")]
    Syntax,
    #[error("`{kind}` node has no `{what}`")]
    Missing { kind: String, what: &'static str },
    #[error("the document contains no declarations")]
    NoDeclarations,
}
