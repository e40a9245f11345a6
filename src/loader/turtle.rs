//! Line-oriented reader for the N-Triples subset of Turtle
//!
//! One statement per line, terminated by ` .`. Terms may be `<iri>`,
//! `prefix:local`, `"literal"` (with optional `^^type` or `@lang`) or the
//! keyword `a`. `@prefix` / `PREFIX` directives, `#` comments and blank lines
//! are understood; anything else is logged and skipped.

use std::path::Path;
use std::sync::OnceLock;

use log::{debug, warn};
use regex::Regex;

use crate::core::{well_known_namespace, Triple, Uri};
use crate::error::{HodError, Result};
use crate::loader::Dataset;

fn prefix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^@?prefix\s+([A-Za-z0-9_.-]*):\s*<([^>]*)>\s*\.?$").expect("valid prefix regex")
    })
}

fn statement_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^(<[^>]*>|\S+)\s+(<[^>]*>|\S+)\s+(".*"\S*|<[^>]*>|\S+)\s*\.$"#).expect("valid statement regex")
    })
}

/// Resolve one term against the prefixes declared so far.
fn read_term(text: &str, dataset: &Dataset) -> Result<Uri> {
    let uri = Uri::from_term(text);
    if text.starts_with('<') || text.starts_with('"') || text == "a" || text.contains("://") {
        return Ok(uri);
    }
    if !text.contains(':') {
        return Err(HodError::Parse(format!("'{}' is neither an IRI nor a prefixed name", text)));
    }
    match dataset.namespaces.get(&uri.namespace).map(String::as_str).or_else(|| well_known_namespace(&uri.namespace)) {
        Some(full) => Ok(Uri::new(full, &uri.value)),
        None => Err(HodError::Parse(format!("undeclared prefix '{}:'", uri.namespace))),
    }
}

pub fn parse_str(text: &str) -> Result<Dataset> {
    let mut dataset = Dataset::new();
    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(caps) = prefix_regex().captures(line) {
            dataset.add_namespace(&caps[1], &caps[2]);
            continue;
        }
        let Some(caps) = statement_regex().captures(line) else {
            warn!("line {}: skipping unrecognized statement '{}'", lineno + 1, line);
            continue;
        };
        let terms = (read_term(&caps[1], &dataset), read_term(&caps[2], &dataset), read_term(&caps[3], &dataset));
        match terms {
            (Ok(s), Ok(p), Ok(o)) => dataset.triples.push(Triple::new(s, p, o)),
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => warn!("line {}: {}", lineno + 1, e),
        }
    }
    debug!("parsed {} triples, {} prefixes", dataset.triples.len(), dataset.namespaces.len());
    Ok(dataset)
}

pub fn parse_file(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| HodError::Parse(format!("{}: {}", path.display(), e)))?;
    parse_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RDF_NAMESPACE;

    const SAMPLE: &str = r#"
@prefix bf: <https://brickschema.org/schema/1.1/BrickFrame#> .
@prefix brick: <https://brickschema.org/schema/1.1/Brick#> .
PREFIX ex: <http://buildsys.org/ontologies/building_example#>

# equipment
ex:ahu_1 a brick:AHU .
ex:ahu_1 bf:feeds ex:vav_1 .
<http://buildsys.org/ontologies/building_example#vav_1> bf:feeds ex:zone_1 .
ex:zone_1 brick:label "Zone 1"^^xsd:string .
ex:bad undeclared:thing ex:vav_1 .
this line is garbage
"#;

    #[test]
    fn test_parse_sample() {
        let dataset = parse_str(SAMPLE).unwrap();
        assert_eq!(dataset.namespaces.len(), 3);
        assert_eq!(dataset.namespaces["brick"], "https://brickschema.org/schema/1.1/Brick");
        assert_eq!(dataset.len(), 4);

        let first = &dataset.triples[0];
        assert_eq!(first.subject, Uri::new("http://buildsys.org/ontologies/building_example", "ahu_1"));
        assert_eq!(first.predicate, Uri::new(RDF_NAMESPACE, "type"));
        assert_eq!(first.object, Uri::new("https://brickschema.org/schema/1.1/Brick", "AHU"));

        assert_eq!(dataset.triples[2].subject, dataset.triples[1].object);
        assert_eq!(dataset.triples[3].object.value, "\"Zone 1\"^^xsd:string");
    }

    #[test]
    fn test_missing_file() {
        let err = parse_file(Path::new("/nonexistent/hoddb/graph.ttl")).unwrap_err();
        assert!(matches!(err, HodError::Parse(_)));
    }
}
