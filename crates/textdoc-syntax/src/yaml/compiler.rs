use crate::yaml::definition::{
    ColorSpec, GrammarDefinition, PatternDefinition, RuleSetDefinition, SpanDefinition,
};
use crate::yaml::error::SyntaxError;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use textdoc_core::highlight::{
    Color, GrammarBuilder, HighlightColor, HighlightGrammar, PatternDef, RuleSetDef, SpanDef,
};

/// Compile a parsed definition into a [`HighlightGrammar`].
///
/// `{{name}}` references in regex patterns are replaced by the realized
/// `variables` first. Colors are `#rrggbb`/`#rgb` or keys of the `colors`
/// palette.
pub fn compile_grammar(definition: &GrammarDefinition) -> Result<HighlightGrammar, SyntaxError> {
    let variables = realize_variables(&definition.variables)?;
    let palette = Palette::new(&definition.colors)?;

    let mut builder = GrammarBuilder::new(definition.name.clone())
        .default_rule_set(definition.default_rule_set.clone());
    if let Some(spec) = &definition.default_color {
        builder = builder.default_color(palette.resolve(spec)?);
    }
    if let Some(spec) = &definition.digit_color {
        builder = builder.digit_color(palette.resolve(spec)?);
    }
    for rule_set in &definition.rule_sets {
        builder = builder.rule_set(compile_rule_set(rule_set, &variables, &palette)?);
    }

    let grammar = builder.build()?;
    tracing::debug!(
        grammar = grammar.name(),
        rule_sets = grammar.rule_sets().len(),
        spans = grammar.span_count(),
        "compiled YAML grammar"
    );
    Ok(grammar)
}

fn compile_rule_set(
    definition: &RuleSetDefinition,
    variables: &HashMap<String, String>,
    palette: &Palette,
) -> Result<RuleSetDef, SyntaxError> {
    let mut rule_set = RuleSetDef::new(definition.name.clone())
        .ignore_case(definition.ignore_case)
        .highlight_digits(definition.highlight_digits)
        .delimiters(definition.delimiters.clone());

    for group in &definition.keywords {
        rule_set = rule_set.keywords(palette.resolve(&group.color)?, group.words.iter().cloned());
    }
    for span in &definition.spans {
        rule_set = rule_set.span(compile_span(span, variables, palette)?);
    }
    for mark in &definition.mark_previous {
        rule_set = rule_set.mark_previous(
            mark.what.clone(),
            palette.resolve(&mark.color)?,
            mark.mark_marker,
        );
    }
    for mark in &definition.mark_following {
        rule_set = rule_set.mark_following(
            mark.what.clone(),
            palette.resolve(&mark.color)?,
            mark.mark_marker,
        );
    }
    Ok(rule_set)
}

fn compile_span(
    definition: &SpanDefinition,
    variables: &HashMap<String, String>,
    palette: &Palette,
) -> Result<SpanDef, SyntaxError> {
    let mut span = SpanDef::new(
        definition.name.clone(),
        compile_pattern(&definition.begin, variables)?,
    )
    .ignore_case(definition.ignore_case);

    if let Some(end) = &definition.end {
        span = span.end(compile_pattern(end, variables)?);
    }
    if let Some(spec) = &definition.color {
        span = span.color(palette.resolve(spec)?);
    }
    if let Some(spec) = &definition.begin_color {
        span = span.begin_color(palette.resolve(spec)?);
    }
    if let Some(spec) = &definition.end_color {
        span = span.end_color(palette.resolve(spec)?);
    }
    if let Some(rule_set) = &definition.rule_set {
        span = span.rule_set(rule_set.clone());
    }
    if let Some(escape) = definition.escape {
        span = span.escape(escape);
    }
    if definition.stop_eol {
        span = span.stop_eol();
    }
    if definition.begin_single_word {
        span = span.begin_single_word();
    }
    if definition.end_single_word {
        span = span.end_single_word();
    }
    if let Some(at_start) = definition.begin_at_line_start {
        span = span.begin_at_line_start(at_start);
    }
    Ok(span)
}

fn compile_pattern(
    pattern: &PatternDefinition,
    variables: &HashMap<String, String>,
) -> Result<PatternDef, SyntaxError> {
    Ok(match pattern {
        PatternDefinition::Literal(text) => PatternDef::Literal(text.clone()),
        PatternDefinition::Regex { regex } => {
            PatternDef::regex(substitute_variables(regex, variables)?)
        }
    })
}

/// Named colors of one grammar.
struct Palette {
    named: HashMap<String, HighlightColor>,
}

impl Palette {
    /// Palette entries may only use hex colors, never other entries.
    fn new(colors: &HashMap<String, ColorSpec>) -> Result<Self, SyntaxError> {
        let empty = Self {
            named: HashMap::new(),
        };
        let mut named = HashMap::with_capacity(colors.len());
        for (name, spec) in colors {
            named.insert(name.clone(), empty.resolve(spec)?);
        }
        Ok(Self { named })
    }

    fn resolve(&self, spec: &ColorSpec) -> Result<HighlightColor, SyntaxError> {
        match spec {
            ColorSpec::Plain(text) => self.lookup(text),
            ColorSpec::Styled {
                color,
                background,
                bold,
                italic,
            } => {
                let mut resolved = self.lookup(color)?;
                if let Some(background) = background {
                    resolved = resolved.with_background(self.lookup(background)?.color);
                }
                resolved.bold |= *bold;
                resolved.italic |= *italic;
                Ok(resolved)
            }
        }
    }

    fn lookup(&self, text: &str) -> Result<HighlightColor, SyntaxError> {
        if let Some(color) = self.named.get(text) {
            return Ok(*color);
        }
        Color::parse_hex(text)
            .map(HighlightColor::new)
            .ok_or_else(|| SyntaxError::InvalidColor(text.to_string()))
    }
}

fn realize_variables(
    vars: &HashMap<String, String>,
) -> Result<HashMap<String, String>, SyntaxError> {
    let mut realized = HashMap::new();
    let mut visiting = HashSet::<String>::new();

    for key in vars.keys() {
        realize_one_variable(key, vars, &mut realized, &mut visiting)?;
    }

    Ok(realized)
}

fn realize_one_variable(
    key: &str,
    vars: &HashMap<String, String>,
    realized: &mut HashMap<String, String>,
    visiting: &mut HashSet<String>,
) -> Result<String, SyntaxError> {
    if let Some(val) = realized.get(key) {
        return Ok(val.clone());
    }
    if !visiting.insert(key.to_string()) {
        return Err(SyntaxError::CircularVariableReference(key.to_string()));
    }

    let raw = vars
        .get(key)
        .ok_or_else(|| SyntaxError::UnknownVariable(key.to_string()))?;

    let mut out = String::with_capacity(raw.len());
    let mut last = 0usize;
    for (start, end, name) in variable_refs(raw) {
        out.push_str(&raw[last..start]);
        out.push_str(&realize_one_variable(&name, vars, realized, visiting)?);
        last = end;
    }
    out.push_str(&raw[last..]);

    visiting.remove(key);
    realized.insert(key.to_string(), out.clone());
    Ok(out)
}

fn substitute_variables(
    text: &str,
    vars: &HashMap<String, String>,
) -> Result<String, SyntaxError> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0usize;
    for (start, end, name) in variable_refs(text) {
        out.push_str(&text[last..start]);
        let value = vars
            .get(&name)
            .ok_or_else(|| SyntaxError::UnknownVariable(name.clone()))?;
        out.push_str(value);
        last = end;
    }
    out.push_str(&text[last..]);
    Ok(out)
}

/// `(start, end, name)` of every `{{name}}` in `text`; other braces stay literal.
fn variable_refs(text: &str) -> Vec<(usize, usize, String)> {
    let re = Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").expect("valid variable regex");
    re.captures_iter(text)
        .filter_map(|cap| {
            let m = cap.get(0)?;
            let name = cap.get(1)?.as_str().to_string();
            Some((m.start(), m.end(), name))
        })
        .collect()
}
