use textdoc_core::{DocumentError, GrammarError};
use thiserror::Error;

#[derive(Debug, Error)]
/// Errors produced while loading, compiling or applying YAML grammars.
pub enum SyntaxError {
    #[error("YAML parse error: {0}")]
    /// YAML parsing failed.
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    /// Filesystem I/O failed.
    Io(#[from] std::io::Error),

    #[error("invalid grammar: {0}")]
    /// The compiled rule sets are inconsistent.
    Grammar(#[from] GrammarError),

    #[error("invalid color '{0}'")]
    /// A color is neither `#rrggbb`/`#rgb` nor a name from the palette.
    InvalidColor(String),

    #[error("unknown variable '{0}'")]
    /// A `{{name}}` reference names no variable.
    UnknownVariable(String),

    #[error("circular variable reference '{0}'")]
    /// Variable expansion loop detected.
    CircularVariableReference(String),

    #[error("unknown grammar '{0}'")]
    /// No grammar with this name was loaded.
    UnknownGrammar(String),

    #[error(transparent)]
    /// Applying a grammar to a document failed.
    Document(#[from] DocumentError),
}
