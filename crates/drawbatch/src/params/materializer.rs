use std::collections::{BTreeMap, HashMap};

use tracing::warn;

use super::schema::{self, ParamKind};
use super::value::ParamValue;

/// Fully resolved, typed parameter set for one drawing, ready for
/// transmission to the host. Built fresh per job and discarded after the
/// invocation completes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaterializedParams {
    // BTreeMap keeps serialization byte-stable for identical inputs.
    values: BTreeMap<String, ParamValue>,
}

impl MaterializedParams {
    pub fn get(&self, property: &str) -> Option<&ParamValue> {
        self.values.get(property)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.values.iter()
    }

    /// Serializes the parameter set to the JSON payload the host consumes.
    /// Canonical property-name casing is preserved exactly.
    pub fn to_payload(&self) -> String {
        serde_json::to_string(&self.values).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Builds the definitive parameter set for one drawing: a copy of the shared
/// base parameters, engine defaults for anything still unset, then the
/// schema-coerced row overrides on top.
///
/// Pure function of its two inputs; unknown columns and empty cells are
/// skipped, and no coercion ever fails.
pub fn materialize(
    overrides: &HashMap<String, String>,
    base: &BTreeMap<String, ParamValue>,
) -> MaterializedParams {
    let mut values = base.clone();

    inject_engine_defaults(&mut values);

    // Sorted column order keeps the result deterministic when two raw
    // columns alias to the same canonical property.
    let mut columns: Vec<(&String, &String)> = overrides.iter().collect();
    columns.sort_by(|a, b| a.0.cmp(b.0));

    for (column, raw) in columns {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }

        let Some(entry) = schema::resolve(column) else {
            // Unknown columns are not an error; the table may carry
            // annotations the engine has no use for.
            continue;
        };

        values.insert(entry.property.to_string(), coerce(entry.kind, raw));
    }

    MaterializedParams { values }
}

fn inject_engine_defaults(values: &mut BTreeMap<String, ParamValue>) {
    let defaults: [(&str, ParamValue); 4] = [
        (schema::EXTRACT_DIMENSIONS, ParamValue::Bool(true)),
        (schema::EXTRACT_ANNOTATIONS, ParamValue::Bool(true)),
        (schema::LAYER_FILTERS, ParamValue::List(Vec::new())),
        (
            schema::PLUGIN_VERSION,
            ParamValue::Text(schema::PLUGIN_VERSION_DEFAULT.to_string()),
        ),
    ];

    for (property, default) in defaults {
        values.entry(property.to_string()).or_insert(default);
    }
}

fn coerce(kind: ParamKind, raw: &str) -> ParamValue {
    match kind {
        ParamKind::Bool => ParamValue::Bool(parse_bool(raw)),
        ParamKind::List => ParamValue::List(parse_list(raw)),
        ParamKind::Number => match raw.parse::<f64>() {
            Ok(number) => ParamValue::Number(number),
            Err(_) => {
                warn!(value = raw, "numeric column did not parse; keeping raw string");
                ParamValue::Text(raw.to_string())
            }
        },
        ParamKind::Text => ParamValue::Text(raw.to_string()),
    }
}

// Anything that is not an exact true spelling degrades to false.
fn parse_bool(raw: &str) -> bool {
    raw.eq_ignore_ascii_case("true") || raw == "1"
}

fn parse_list(raw: &str) -> Vec<String> {
    if raw.starts_with('[') {
        // Bracket-delimited: JSON string array, or nothing at all.
        serde_json::from_str::<Vec<String>>(raw).unwrap_or_default()
    } else if raw.contains(',') {
        raw.split(',')
            .map(|part| part.trim().trim_matches('"').trim_matches('\''))
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        vec![raw.to_string()]
    }
}

/// Reports which of the required columns are missing from a header row.
/// Called once per table before any row is materialized.
pub fn validate_required_columns<S: AsRef<str>>(headers: &[S]) -> Vec<String> {
    schema::REQUIRED_COLUMNS
        .iter()
        .filter(|required| {
            !headers
                .iter()
                .any(|header| header.as_ref().eq_ignore_ascii_case(required))
        })
        .map(|required| required.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn base(pairs: &[(&str, ParamValue)]) -> BTreeMap<String, ParamValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    // ── Defaults & merging ──

    #[test]
    fn test_engine_defaults_injected_when_absent() {
        let params = materialize(&HashMap::new(), &BTreeMap::new());

        assert_eq!(params.get("ExtractDimensions"), Some(&ParamValue::Bool(true)));
        assert_eq!(params.get("ExtractAnnotations"), Some(&ParamValue::Bool(true)));
        assert_eq!(params.get("LayerFilters"), Some(&ParamValue::List(vec![])));
        assert_eq!(
            params.get("PluginVersion"),
            Some(&ParamValue::Text("1.4.2".to_string()))
        );
    }

    #[test]
    fn test_base_value_wins_over_engine_default() {
        let base = base(&[("ExtractDimensions", ParamValue::Bool(false))]);
        let params = materialize(&HashMap::new(), &base);

        assert_eq!(params.get("ExtractDimensions"), Some(&ParamValue::Bool(false)));
    }

    #[test]
    fn test_override_wins_over_base_and_default() {
        let base = base(&[("UnitsSystem", ParamValue::from("metric"))]);
        let row = overrides(&[("Units", "imperial"), ("ExtractDimensions", "false")]);
        let params = materialize(&row, &base);

        assert_eq!(params.get("UnitsSystem"), Some(&ParamValue::from("imperial")));
        assert_eq!(params.get("ExtractDimensions"), Some(&ParamValue::Bool(false)));
    }

    #[test]
    fn test_empty_and_whitespace_cells_skipped() {
        let row = overrides(&[("SheetScale", ""), ("UnitsSystem", "   ")]);
        let params = materialize(&row, &BTreeMap::new());

        assert!(params.get("SheetScale").is_none());
        assert!(params.get("UnitsSystem").is_none());
    }

    #[test]
    fn test_unknown_columns_silently_ignored() {
        let row = overrides(&[("OperatorInitials", "kb"), ("Rev", "C")]);
        let params = materialize(&row, &BTreeMap::new());

        assert!(params.get("OperatorInitials").is_none());
        assert_eq!(params.get("TitleBlockRevision"), Some(&ParamValue::from("C")));
    }

    // ── Coercion ──

    #[test]
    fn test_bool_coercion_true_spellings() {
        for spelling in ["true", "TRUE", "True", "1"] {
            let row = overrides(&[("PurgeUnused", spelling)]);
            let params = materialize(&row, &BTreeMap::new());
            assert_eq!(
                params.get("PurgeUnused"),
                Some(&ParamValue::Bool(true)),
                "spelling {spelling:?}"
            );
        }
    }

    #[test]
    fn test_bool_coercion_everything_else_is_false() {
        for spelling in ["false", "0", "yes", "on", "maybe", "2"] {
            let row = overrides(&[("PurgeUnused", spelling)]);
            let params = materialize(&row, &BTreeMap::new());
            assert_eq!(
                params.get("PurgeUnused"),
                Some(&ParamValue::Bool(false)),
                "spelling {spelling:?}"
            );
        }
    }

    #[test]
    fn test_list_coercion_comma_separated() {
        let row = overrides(&[("Layers", r#"dims, "notes", center-marks"#)]);
        let params = materialize(&row, &BTreeMap::new());

        assert_eq!(
            params.get("LayerFilters"),
            Some(&ParamValue::List(vec![
                "dims".to_string(),
                "notes".to_string(),
                "center-marks".to_string()
            ]))
        );
    }

    #[test]
    fn test_list_coercion_bracketed_json() {
        let row = overrides(&[("ExportViews", r#"["front","iso"]"#)]);
        let params = materialize(&row, &BTreeMap::new());

        assert_eq!(
            params.get("ExportViews"),
            Some(&ParamValue::List(vec![
                "front".to_string(),
                "iso".to_string()
            ]))
        );
    }

    #[test]
    fn test_list_coercion_malformed_bracket_degrades_to_empty() {
        let row = overrides(&[("ExportViews", "[front,")]);
        let params = materialize(&row, &BTreeMap::new());

        assert_eq!(params.get("ExportViews"), Some(&ParamValue::List(vec![])));
    }

    #[test]
    fn test_list_coercion_single_value_wraps() {
        let row = overrides(&[("Layers", "hidden")]);
        let params = materialize(&row, &BTreeMap::new());

        assert_eq!(
            params.get("LayerFilters"),
            Some(&ParamValue::List(vec!["hidden".to_string()]))
        );
    }

    #[test]
    fn test_list_coercion_drops_empty_entries() {
        let row = overrides(&[("Layers", "a, , b,,")]);
        let params = materialize(&row, &BTreeMap::new());

        assert_eq!(
            params.get("LayerFilters"),
            Some(&ParamValue::List(vec!["a".to_string(), "b".to_string()]))
        );
    }

    #[test]
    fn test_numeric_coercion() {
        let row = overrides(&[("Scale", "2.5")]);
        let params = materialize(&row, &BTreeMap::new());

        assert_eq!(params.get("SheetScale"), Some(&ParamValue::Number(2.5)));
    }

    #[test]
    fn test_numeric_fallback_keeps_raw_string() {
        let row = overrides(&[("Scale", "1:50")]);
        let params = materialize(&row, &BTreeMap::new());

        assert_eq!(params.get("SheetScale"), Some(&ParamValue::from("1:50")));
    }

    #[test]
    fn test_text_is_trimmed() {
        let row = overrides(&[("Profile", "  iso-weld  ")]);
        let params = materialize(&row, &BTreeMap::new());

        assert_eq!(params.get("CheckProfile"), Some(&ParamValue::from("iso-weld")));
    }

    // ── Purity & payload ──

    #[test]
    fn test_materialize_is_pure() {
        let base = base(&[("UnitsSystem", ParamValue::from("metric"))]);
        let row = overrides(&[
            ("Scale", "2"),
            ("Layers", "a,b"),
            ("Purge", "true"),
            ("Rev", "B"),
        ]);

        let first = materialize(&row, &base);
        let second = materialize(&row, &base);

        assert_eq!(first, second);
        assert_eq!(first.to_payload(), second.to_payload());
    }

    #[test]
    fn test_payload_preserves_canonical_casing() {
        let row = overrides(&[("drawingfile", "bracket-42.dwg")]);
        let payload = materialize(&row, &BTreeMap::new()).to_payload();

        assert!(payload.contains("\"DrawingFile\""));
        assert!(!payload.contains("\"drawingfile\""));
    }

    // ── Required columns ──

    #[test]
    fn test_validate_required_columns_all_present() {
        let headers = ["DrawingFile", "ProjectNumber", "CheckProfile", "Scale"];
        assert!(validate_required_columns(&headers).is_empty());
    }

    #[test]
    fn test_validate_required_columns_reports_exactly_the_missing_one() {
        let headers = ["DrawingFile", "CheckProfile"];
        assert_eq!(
            validate_required_columns(&headers),
            vec!["ProjectNumber".to_string()]
        );
    }

    #[test]
    fn test_validate_required_columns_empty_headers() {
        let headers: [&str; 0] = [];
        assert_eq!(
            validate_required_columns(&headers),
            vec![
                "DrawingFile".to_string(),
                "ProjectNumber".to_string(),
                "CheckProfile".to_string()
            ]
        );
    }
}
