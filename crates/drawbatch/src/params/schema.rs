//! Static column schema for per-drawing parameter tables.
//!
//! The table maps raw CSV column names (and their historical aliases) to the
//! canonical property names the host plugin understands, together with the
//! wire type each property must coerce to. It is process-wide, read-only
//! configuration; nothing mutates it after startup.

/// Wire type a schema entry coerces its raw cell into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Bool,
    List,
    Number,
    Text,
}

/// One column mapping: raw column name plus aliases, canonical property name,
/// and the wire type.
#[derive(Debug, Clone, Copy)]
pub struct SchemaEntry {
    pub column: &'static str,
    pub aliases: &'static [&'static str],
    pub property: &'static str,
    pub kind: ParamKind,
}

/// Columns every parameter table must carry.
pub const REQUIRED_COLUMNS: [&str; 3] = ["DrawingFile", "ProjectNumber", "CheckProfile"];

// Properties the engine injects defaults for when a row leaves them unset.
pub const EXTRACT_DIMENSIONS: &str = "ExtractDimensions";
pub const EXTRACT_ANNOTATIONS: &str = "ExtractAnnotations";
pub const LAYER_FILTERS: &str = "LayerFilters";
pub const PLUGIN_VERSION: &str = "PluginVersion";
pub const PLUGIN_VERSION_DEFAULT: &str = "1.4.2";

const SCHEMA: [SchemaEntry; 13] = [
    SchemaEntry {
        column: "DrawingFile",
        aliases: &["Drawing", "File"],
        property: "DrawingFile",
        kind: ParamKind::Text,
    },
    SchemaEntry {
        column: "ProjectNumber",
        aliases: &["Project", "Project No"],
        property: "ProjectNumber",
        kind: ParamKind::Text,
    },
    SchemaEntry {
        column: "CheckProfile",
        aliases: &["Profile"],
        property: "CheckProfile",
        kind: ParamKind::Text,
    },
    SchemaEntry {
        column: "ExtractDimensions",
        aliases: &["Dimensions"],
        property: EXTRACT_DIMENSIONS,
        kind: ParamKind::Bool,
    },
    SchemaEntry {
        column: "ExtractAnnotations",
        aliases: &["Annotations"],
        property: EXTRACT_ANNOTATIONS,
        kind: ParamKind::Bool,
    },
    SchemaEntry {
        column: "PurgeUnused",
        aliases: &["Purge"],
        property: "PurgeUnused",
        kind: ParamKind::Bool,
    },
    SchemaEntry {
        column: "LayerFilters",
        aliases: &["Layers", "Layer Filters"],
        property: LAYER_FILTERS,
        kind: ParamKind::List,
    },
    SchemaEntry {
        column: "ExportViews",
        aliases: &["Views"],
        property: "ExportViews",
        kind: ParamKind::List,
    },
    SchemaEntry {
        column: "SheetScale",
        aliases: &["Scale"],
        property: "SheetScale",
        kind: ParamKind::Number,
    },
    SchemaEntry {
        column: "LineWeightThreshold",
        aliases: &[],
        property: "LineWeightThreshold",
        kind: ParamKind::Number,
    },
    SchemaEntry {
        column: "TitleBlockRevision",
        aliases: &["Revision", "Rev"],
        property: "TitleBlockRevision",
        kind: ParamKind::Text,
    },
    SchemaEntry {
        column: "UnitsSystem",
        aliases: &["Units"],
        property: "UnitsSystem",
        kind: ParamKind::Text,
    },
    SchemaEntry {
        column: "PluginVersion",
        aliases: &[],
        property: PLUGIN_VERSION,
        kind: ParamKind::Text,
    },
];

/// Resolves a raw column name to its schema entry: direct column match,
/// aliased match, or pass-through when the name already equals a canonical
/// property name. Matching is case-insensitive; `None` means the column is
/// unknown to the schema.
pub fn resolve(column: &str) -> Option<&'static SchemaEntry> {
    SCHEMA.iter().find(|entry| {
        entry.column.eq_ignore_ascii_case(column)
            || entry
                .aliases
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(column))
            || entry.property.eq_ignore_ascii_case(column)
    })
}
