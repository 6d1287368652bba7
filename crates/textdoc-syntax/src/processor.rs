use crate::yaml::{FoldingDefinition, Language, SyntaxError};
use std::fmt;
use std::sync::Arc;
use textdoc_core::{
    BraceFoldingStrategy, Document, FoldingStrategy, HighlightReport, IndentFoldingStrategy,
};

/// Applies a [`Language`] to documents: installs its grammar and regenerates
/// fold regions with the strategy its definition names.
pub struct SyntaxProcessor {
    language: Arc<Language>,
    folding: Option<Box<dyn FoldingStrategy + Send>>,
}

impl SyntaxProcessor {
    /// Create a processor for `language`.
    pub fn new(language: Arc<Language>) -> Self {
        let folding: Option<Box<dyn FoldingStrategy + Send>> = match language.folding {
            FoldingDefinition::None => None,
            FoldingDefinition::Braces { open, close } => Some(Box::new(BraceFoldingStrategy {
                opening: open,
                closing: close,
            })),
            FoldingDefinition::Indent { tab_size } => {
                Some(Box::new(IndentFoldingStrategy { tab_size }))
            }
        };
        Self { language, folding }
    }

    /// The applied language.
    pub fn language(&self) -> &Arc<Language> {
        &self.language
    }

    /// Install the grammar on `document` and regenerate its fold regions.
    pub fn process(&mut self, document: &mut Document) -> Result<HighlightReport, SyntaxError> {
        let report = document.set_grammar(self.language.grammar.clone())?;
        let folds = self.refresh_foldings(document)?;
        tracing::debug!(
            grammar = self.language.name(),
            lines = report.line_count,
            folds,
            "applied language to document"
        );
        Ok(report)
    }

    /// Regenerate fold regions only; folded regions that still exist stay folded.
    ///
    /// Returns the number of regions now held by the document.
    pub fn refresh_foldings(&mut self, document: &mut Document) -> Result<usize, SyntaxError> {
        let Some(strategy) = self.folding.as_mut() else {
            return Ok(document.folding().len());
        };
        Ok(document.update_foldings_with(strategy.as_mut())?.len())
    }
}

impl fmt::Debug for SyntaxProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxProcessor")
            .field("language", &self.language.name())
            .field("folding", &self.language.folding)
            .finish()
    }
}
