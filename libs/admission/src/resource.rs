use crate::error::{Error, Result};

use std::collections::BTreeMap;

use kube::core::DynamicObject;

/// Schema-agnostic view of an incoming resource. Only the fields common
/// to every resource kind are extracted; the rest of the payload is
/// dropped.
#[derive(Clone, Debug, Default)]
pub struct NormalizedResource {
    pub name: String,
    pub generate_name: String,
    pub kind: String,
    pub annotations: BTreeMap<String, String>,
}

impl NormalizedResource {
    /// Base name for synthesized objects: generate-name when set,
    /// otherwise the resource name.
    pub fn base_name(&self) -> &str {
        if self.generate_name.is_empty() {
            &self.name
        } else {
            &self.generate_name
        }
    }

    /// Name+kind concatenation identifying the triggering resource.
    pub fn identity(&self) -> String {
        format!("{}{}", self.name, self.kind)
    }
}

/// Decode a raw resource payload into a [`NormalizedResource`] without
/// assuming a concrete schema.
pub fn normalize(raw: &serde_json::Value) -> Result<NormalizedResource> {
    let object: DynamicObject =
        serde_json::from_value(raw.clone()).map_err(Error::Decode)?;
    Ok(NormalizedResource {
        name: object.metadata.name.clone().unwrap_or_default(),
        generate_name: object.metadata.generate_name.clone().unwrap_or_default(),
        kind: object
            .types
            .as_ref()
            .map(|t| t.kind.clone())
            .unwrap_or_default(),
        annotations: object.metadata.annotations.clone().unwrap_or_default(),
    })
}
