//! JSON Schema generation for tool arguments.

use crate::types::tool::ToolSchema;

/// Generate a tool argument schema from a `schemars` type.
///
/// Subschemas are inlined so the result is self-contained; `$schema` and
/// `title` are dropped.
pub fn schema_for<T: schemars::JsonSchema>() -> ToolSchema {
    let settings = schemars::generate::SchemaSettings::draft07().with(|s| {
        s.inline_subschemas = true;
    });
    let generator = settings.into_generator();
    let schema = generator.into_root_schema_for::<T>();
    let value = serde_json::to_value(&schema).unwrap_or_default();
    ToolSchema::from_value(value)
}
