use crate::yaml::compiler::compile_grammar;
use crate::yaml::definition::{FoldingDefinition, GrammarDefinition};
use crate::yaml::error::SyntaxError;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use textdoc_core::highlight::HighlightGrammar;

#[derive(Debug, Clone)]
/// A compiled grammar together with the file associations of its definition.
pub struct Language {
    /// The compiled grammar.
    pub grammar: Arc<HighlightGrammar>,
    /// Lower-case file extensions without the leading dot.
    pub file_extensions: Vec<String>,
    /// Fold region generation for documents in this language.
    pub folding: FoldingDefinition,
}

impl Language {
    /// Compile a parsed definition.
    pub fn compile(definition: &GrammarDefinition) -> Result<Self, SyntaxError> {
        Ok(Self {
            grammar: Arc::new(compile_grammar(definition)?),
            file_extensions: definition
                .file_extensions
                .iter()
                .map(|ext| normalize_extension(ext))
                .collect(),
            folding: definition.folding.clone(),
        })
    }

    /// Grammar name.
    pub fn name(&self) -> &str {
        self.grammar.name()
    }
}

#[derive(Debug, Default)]
/// Grammars loaded from YAML, looked up by name or file extension.
///
/// Loading a grammar whose name is already present replaces it; extensions
/// claimed by several grammars resolve to the one loaded last.
pub struct GrammarSet {
    languages: HashMap<String, Arc<Language>>,
    by_extension: HashMap<String, String>,
}

impl GrammarSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse, compile and register a grammar from a YAML string.
    pub fn load_from_str(&mut self, yaml: &str) -> Result<Arc<Language>, SyntaxError> {
        let definition: GrammarDefinition = serde_yaml::from_str(yaml)?;
        self.insert(Language::compile(&definition)?)
    }

    /// Parse, compile and register a grammar file.
    pub fn load_from_path(&mut self, path: impl AsRef<Path>) -> Result<Arc<Language>, SyntaxError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)?;
        let language = self.load_from_str(&yaml)?;
        tracing::debug!(path = %path.display(), grammar = language.name(), "loaded grammar file");
        Ok(language)
    }

    /// Load every `*.yaml` / `*.yml` file of `dir`, in file name order.
    ///
    /// Returns the number of grammars loaded. The first failing file aborts
    /// the scan; grammars loaded before it stay registered.
    pub fn load_from_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize, SyntaxError> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            let is_yaml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
            if is_yaml && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            self.load_from_path(path)?;
        }
        Ok(paths.len())
    }

    /// Register an already compiled language.
    pub fn insert(&mut self, language: Language) -> Result<Arc<Language>, SyntaxError> {
        let name = language.name().to_string();
        let language = Arc::new(language);
        if let Some(previous) = self.languages.insert(name.clone(), language.clone()) {
            self.by_extension.retain(|_, owner| *owner != previous.name());
        }
        for ext in &language.file_extensions {
            self.by_extension.insert(ext.clone(), name.clone());
        }
        Ok(language)
    }

    /// Grammar named `name`.
    pub fn get(&self, name: &str) -> Result<Arc<HighlightGrammar>, SyntaxError> {
        self.language(name)
            .map(|language| language.grammar.clone())
            .ok_or_else(|| SyntaxError::UnknownGrammar(name.to_string()))
    }

    /// Language named `name`.
    pub fn language(&self, name: &str) -> Option<Arc<Language>> {
        self.languages.get(name).cloned()
    }

    /// Grammar registered for a file extension (`"cs"`, `".CS"`).
    pub fn for_extension(&self, ext: &str) -> Option<Arc<HighlightGrammar>> {
        self.language_for_extension(ext)
            .map(|language| language.grammar.clone())
    }

    /// Language registered for a file extension.
    pub fn language_for_extension(&self, ext: &str) -> Option<Arc<Language>> {
        let name = self.by_extension.get(&normalize_extension(ext))?;
        self.language(name)
    }

    /// Language for a file name or path, by its extension.
    pub fn language_for_path(&self, path: impl AsRef<Path>) -> Option<Arc<Language>> {
        let ext = path.as_ref().extension()?.to_str()?;
        self.language_for_extension(ext)
    }

    /// Names of all loaded grammars, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.languages.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of loaded grammars.
    pub fn len(&self) -> usize {
        self.languages.len()
    }

    /// `true` if nothing is loaded.
    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim_start_matches('.').to_ascii_lowercase()
}
