pub mod validation;

use schemars::{gen::SchemaSettings, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::{
    any::{type_name, TypeId},
    sync::Arc,
};
use tracing::error;

/// Cached JSON schema handle associated with a response type.
///
/// Subschemas are inlined so the schema can be embedded directly as a tool
/// parameter definition without a `definitions` table.
#[derive(Clone, Debug)]
pub struct SchemaHandle {
    schema_name: &'static str,
    type_name: &'static str,
    type_id: TypeId,
    schema_json: Arc<Value>,
}

impl SchemaHandle {
    pub fn for_type<T: JsonSchema + 'static>(schema_name: &'static str) -> Self {
        let root = SchemaSettings::draft07()
            .with(|settings| settings.inline_subschemas = true)
            .into_generator()
            .into_root_schema_for::<T>();

        let schema_json = serde_json::to_value(root).unwrap_or_else(|err| {
            error!(
                "failed to serialize schema for {}: {}",
                type_name::<T>(),
                err
            );
            json!({ "type": "object" })
        });

        Self {
            schema_name,
            type_name: type_name::<T>(),
            type_id: TypeId::of::<T>(),
            schema_json: Arc::new(schema_json),
        }
    }

    pub fn schema_name(&self) -> &'static str {
        self.schema_name
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn schema_json(&self) -> &Value {
        self.schema_json.as_ref()
    }

    /// Top-level `properties` of the schema, or an empty object.
    pub fn properties(&self) -> Value {
        self.schema_json
            .get("properties")
            .cloned()
            .unwrap_or_else(|| json!({}))
    }

    /// Top-level `required` list of the schema, or an empty array.
    pub fn required(&self) -> Value {
        self.schema_json
            .get("required")
            .cloned()
            .unwrap_or_else(|| json!([]))
    }
}

/// Types the AI service is asked to produce as structured tool arguments.
pub trait CompletionSchema: DeserializeOwned + Send + Sync + 'static {
    fn schema() -> &'static SchemaHandle;
}

/// Implement [`CompletionSchema`] for a `JsonSchema` type with a cached handle.
#[macro_export]
macro_rules! completion_schema {
    ($ty:ty, $name:literal) => {
        impl $crate::schemas::CompletionSchema for $ty {
            fn schema() -> &'static $crate::schemas::SchemaHandle {
                static HANDLE: ::std::sync::OnceLock<$crate::schemas::SchemaHandle> =
                    ::std::sync::OnceLock::new();
                HANDLE.get_or_init(|| $crate::schemas::SchemaHandle::for_type::<$ty>($name))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, JsonSchema)]
    struct Inner {
        label: String,
    }

    /// Sample payload
    #[derive(Debug, Deserialize, JsonSchema)]
    struct Outer {
        /// Name of the thing
        name: String,
        inner: Option<Inner>,
        items: Vec<Inner>,
    }

    completion_schema!(Outer, "Outer");

    #[test]
    fn test_handle_is_cached_and_typed() {
        let first = Outer::schema();
        let second = Outer::schema();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.schema_name(), "Outer");
        assert_eq!(first.type_id(), TypeId::of::<Outer>());
        assert!(first.type_name().ends_with("Outer"));
    }

    #[test]
    fn test_subschemas_are_inlined() {
        let schema = Outer::schema().schema_json();
        assert!(schema.get("definitions").is_none());
        assert!(!schema.to_string().contains("$ref"));

        let props = Outer::schema().properties();
        assert_eq!(props["name"]["description"], "Name of the thing");
        assert_eq!(
            props["items"]["items"]["properties"]["label"]["type"],
            "string"
        );
        assert_eq!(Outer::schema().required(), json!(["items", "name"]));
    }
}
