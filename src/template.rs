//! Placeholder resolution for role and task templates.
//!
//! Definition files use a simple named-placeholder syntax: `{name}` is
//! replaced by the context value bound to `name`, `{{` and `}}` render as
//! literal braces. Resolution is deliberately strict: a placeholder with no
//! matching context key is an error, never an empty substitution, so typos
//! in definition files fail loudly before anything executes.

use std::collections::BTreeMap;
use thiserror::Error;

/// Error type for placeholder resolution failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// A placeholder was referenced but no context key matches it.
    #[error("unknown placeholder '{{{name}}}' at byte {position}")]
    UnknownPlaceholder { name: String, position: usize },

    /// A `{` was opened without a matching `}`.
    #[error("unmatched '{{' at byte {position}")]
    UnmatchedBrace { position: usize },

    /// An empty placeholder `{}` was found.
    #[error("empty placeholder '{{}}' at byte {position}")]
    EmptyPlaceholder { position: usize },
}

/// Resolve a template against a set of named values.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use plume::template::resolve;
///
/// let mut vars = BTreeMap::new();
/// vars.insert("company_url".to_string(), "netflix".to_string());
///
/// let text = resolve("Candidature chez {company_url}.", &vars).unwrap();
/// assert_eq!(text, "Candidature chez netflix.");
/// ```
pub fn resolve(template: &str, vars: &BTreeMap<String, String>) -> Result<String, ResolveError> {
    let mut out = String::with_capacity(template.len());
    scan(template, |piece| {
        match piece {
            Piece::Literal(text) => out.push_str(text),
            Piece::Placeholder { name, position } => match vars.get(name) {
                Some(value) => out.push_str(value),
                None => {
                    return Err(ResolveError::UnknownPlaceholder {
                        name: name.to_string(),
                        position,
                    });
                }
            },
        }
        Ok(())
    })?;
    Ok(out)
}

/// List the placeholder names a template references, in order of first
/// appearance. Syntax errors are reported the same way as in [`resolve`].
pub fn placeholders(template: &str) -> Result<Vec<String>, ResolveError> {
    let mut names: Vec<String> = Vec::new();
    scan(template, |piece| {
        if let Piece::Placeholder { name, .. } = piece
            && !names.iter().any(|n| n == name)
        {
            names.push(name.to_string());
        }
        Ok(())
    })?;
    Ok(names)
}

/// One syntactic piece of a template.
enum Piece<'a> {
    /// Literal text, with `{{`/`}}` already unescaped by the scanner for
    /// single-character pieces.
    Literal(&'a str),
    /// A placeholder reference with its byte position.
    Placeholder { name: &'a str, position: usize },
}

/// Walk a template, calling `emit` for each literal run and placeholder.
///
/// Placeholders are scanned as ASCII brace pairs, which is safe on UTF-8
/// input: multi-byte sequences never contain the brace bytes.
fn scan<'a, F>(template: &'a str, mut emit: F) -> Result<(), ResolveError>
where
    F: FnMut(Piece<'a>) -> Result<(), ResolveError>,
{
    let bytes = template.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' => {
                if bytes.get(i + 1) == Some(&b'{') {
                    emit(Piece::Literal("{"))?;
                    i += 2;
                    continue;
                }
                let close = template[i + 1..]
                    .find('}')
                    .map(|off| i + 1 + off)
                    .ok_or(ResolveError::UnmatchedBrace { position: i })?;
                let name = template[i + 1..close].trim();
                if name.is_empty() {
                    return Err(ResolveError::EmptyPlaceholder { position: i });
                }
                emit(Piece::Placeholder { name, position: i })?;
                i = close + 1;
            }
            b'}' => {
                // `}}` collapses to a literal `}`; a lone `}` passes through.
                emit(Piece::Literal("}"))?;
                i += if bytes.get(i + 1) == Some(&b'}') { 2 } else { 1 };
            }
            _ => {
                let next = template[i..]
                    .find(['{', '}'])
                    .map(|off| i + off)
                    .unwrap_or(bytes.len());
                emit(Piece::Literal(&template[i..next]))?;
                i = next;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_named_placeholders() {
        let vars = vars(&[("company_url", "netflix"), ("gender", "féminin")]);
        let out = resolve("Chez {company_url}, accord au {gender}.", &vars).unwrap();
        assert_eq!(out, "Chez netflix, accord au féminin.");
    }

    #[test]
    fn plain_text_passes_through() {
        let out = resolve("Aucune variable ici.", &BTreeMap::new()).unwrap();
        assert_eq!(out, "Aucune variable ici.");
    }

    #[test]
    fn empty_template_is_empty() {
        assert_eq!(resolve("", &BTreeMap::new()).unwrap(), "");
    }

    #[test]
    fn escaped_braces_render_literally() {
        let out = resolve("use {{name}} syntax", &BTreeMap::new()).unwrap();
        assert_eq!(out, "use {name} syntax");

        let out = resolve("a }} b", &BTreeMap::new()).unwrap();
        assert_eq!(out, "a } b");
    }

    #[test]
    fn lone_closing_brace_passes_through() {
        let out = resolve("a } b", &BTreeMap::new()).unwrap();
        assert_eq!(out, "a } b");
    }

    #[test]
    fn unknown_placeholder_fails_with_name_and_position() {
        let err = resolve("Bonjour {inconnu}", &BTreeMap::new()).unwrap_err();
        assert_eq!(
            err,
            ResolveError::UnknownPlaceholder {
                name: "inconnu".to_string(),
                position: 8,
            }
        );
    }

    #[test]
    fn unmatched_brace_fails() {
        let err = resolve("Bonjour {inconnu", &BTreeMap::new()).unwrap_err();
        assert_eq!(err, ResolveError::UnmatchedBrace { position: 8 });
    }

    #[test]
    fn empty_placeholder_fails() {
        let err = resolve("Bonjour {}", &BTreeMap::new()).unwrap_err();
        assert_eq!(err, ResolveError::EmptyPlaceholder { position: 8 });

        let err = resolve("Bonjour {   }", &BTreeMap::new()).unwrap_err();
        assert_eq!(err, ResolveError::EmptyPlaceholder { position: 8 });
    }

    #[test]
    fn whitespace_around_names_is_trimmed() {
        let vars = vars(&[("name", "Caro")]);
        let out = resolve("Bonjour { name } !", &vars).unwrap();
        assert_eq!(out, "Bonjour Caro !");
    }

    #[test]
    fn repeated_and_adjacent_placeholders() {
        let vars = vars(&[("a", "A"), ("b", "B")]);
        assert_eq!(resolve("{a}{b}{a}", &vars).unwrap(), "ABA");
    }

    #[test]
    fn empty_value_substitutes_to_nothing() {
        let vars = vars(&[("empty", "")]);
        assert_eq!(resolve("x{empty}y", &vars).unwrap(), "xy");
    }

    #[test]
    fn multibyte_text_around_placeholders() {
        let vars = vars(&[("poste", "ingénieur")]);
        let out = resolve("Métier visé : {poste} — à Paris", &vars).unwrap();
        assert_eq!(out, "Métier visé : ingénieur — à Paris");
    }

    #[test]
    fn braces_in_substituted_values_are_not_rescanned() {
        let vars = vars(&[("code", "if (x) { y }")]);
        assert_eq!(resolve("{code}", &vars).unwrap(), "if (x) { y }");
    }

    #[test]
    fn multiline_values() {
        let vars = vars(&[("cv", "ligne 1\nligne 2")]);
        let out = resolve("CV :\n{cv}", &vars).unwrap();
        assert_eq!(out, "CV :\nligne 1\nligne 2");
    }

    #[test]
    fn placeholders_lists_names_in_first_appearance_order() {
        let names =
            placeholders("{company_url} et {hiring_needs} chez {company_url}").unwrap();
        assert_eq!(names, vec!["company_url", "hiring_needs"]);
    }

    #[test]
    fn placeholders_ignores_escapes() {
        let names = placeholders("{{literal}} and {real}").unwrap();
        assert_eq!(names, vec!["real"]);
    }

    #[test]
    fn placeholders_reports_syntax_errors() {
        assert!(matches!(
            placeholders("oops {").unwrap_err(),
            ResolveError::UnmatchedBrace { .. }
        ));
    }

    #[test]
    fn placeholders_of_resolved_text_is_empty() {
        let vars = vars(&[("a", "valeur")]);
        let resolved = resolve("avant {a} après", &vars).unwrap();
        assert!(placeholders(&resolved).unwrap().is_empty());
    }

    #[test]
    fn error_display_is_readable() {
        let err = ResolveError::UnknownPlaceholder {
            name: "cv_path".to_string(),
            position: 4,
        };
        assert_eq!(err.to_string(), "unknown placeholder '{cv_path}' at byte 4");
    }
}
