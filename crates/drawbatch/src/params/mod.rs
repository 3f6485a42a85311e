pub mod materializer;
pub mod schema;
pub mod value;

pub use materializer::{materialize, validate_required_columns, MaterializedParams};
pub use schema::{ParamKind, SchemaEntry, REQUIRED_COLUMNS};
pub use value::ParamValue;
