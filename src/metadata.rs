use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

use crate::domain::MetadataArgument;
use crate::error::AnnexError;

const ENCODE_SCHEMA: &[(&str, &[&str])] = &[
    (
        "Experiment",
        &[
            "assay_term_name",
            "assay_term_id",
            "biosample_term_name",
            "biosample_term_id",
            "biosample_type",
            "dbxrefs",
            "target",
        ],
    ),
    (
        "File",
        &[
            "aliases",
            "accession",
            "assembly",
            "dataset",
            "date_created",
            "file_format",
            "genome_annotation",
            "output_category",
            "output_type",
            "status",
            "submitted_file_name",
            "uuid",
            "replicate",
        ],
    ),
    (
        "Replicate",
        &[
            "biological_replicate_number",
            "technical_replicate_number",
            "paired_ended",
            "library",
        ],
    ),
    (
        "Library",
        &[
            "aliases",
            "biosample",
            "description",
            "nucleic_acid_starting_quantity",
            "nucleic_acid_starting_units",
        ],
    ),
    (
        "Biosample",
        &["life_stage", "model_organism_age", "model_organism_age_units"],
    ),
];

/// Fields worth exporting as annex metadata, keyed by ENCODE type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    types: BTreeMap<String, BTreeSet<String>>,
}

impl AllowList {
    pub fn encode() -> Self {
        Self::from_entries(ENCODE_SCHEMA.iter().copied())
    }

    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a [&'a str])>,
    {
        let types = entries
            .into_iter()
            .map(|(tag, fields)| {
                let fields = fields.iter().map(|field| field.to_string()).collect();
                (tag.to_string(), fields)
            })
            .collect();
        Self { types }
    }

    pub fn contains_type(&self, tag: &str) -> bool {
        self.types.contains_key(tag)
    }

    pub fn fields(&self, tag: &str) -> Option<&BTreeSet<String>> {
        self.types.get(tag)
    }

    /// First tag of `@type` that has an allow-list entry.
    pub fn effective_type<'o>(&self, object: &'o Map<String, Value>) -> Option<&'o str> {
        type_tags(object).find(|tag| self.contains_type(tag))
    }
}

impl Default for AllowList {
    fn default() -> Self {
        Self::encode()
    }
}

pub fn type_tags(object: &Map<String, Value>) -> impl Iterator<Item = &str> {
    object
        .get("@type")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
}

/// Flattens an ENCODE object into `git-annex metadata` assignments.
///
/// Fields are visited in document order and filtered through the allow-list
/// entry for the object's effective type. `replicate`, `library`, `lab` and
/// `biosample` are expanded in place with the fields of the embedded object.
pub fn extract_metadata(
    object: &Value,
    allow_list: &AllowList,
) -> Result<Vec<MetadataArgument>, AnnexError> {
    let object = object
        .as_object()
        .ok_or_else(|| AnnexError::MalformedObject("expected a JSON object".to_string()))?;
    let object_type = allow_list.effective_type(object).ok_or_else(|| {
        AnnexError::UnknownObjectType(type_tags(object).collect::<Vec<_>>().join(","))
    })?;
    let Some(allowed) = allow_list.fields(object_type) else {
        return Err(AnnexError::UnknownObjectType(object_type.to_string()));
    };

    let mut metadata = Vec::new();
    for (key, value) in object {
        if !allowed.contains(key) {
            continue;
        }
        match key.as_str() {
            // the label reads better than the target's @id
            "target" => {
                if let Some(label) = value.get("label").filter(|label| !is_blank(label)) {
                    metadata.push(MetadataArgument::set(key.as_str(), scalar_text(label)));
                }
            }
            "dataset" => {
                let path = value.as_str().ok_or_else(|| {
                    AnnexError::MalformedObject(format!("dataset is not a path: {value}"))
                })?;
                metadata.push(MetadataArgument::set(key.as_str(), dataset_name(path)));
            }
            "replicate" | "library" | "lab" => {
                metadata.extend(extract_metadata(embedded(key, value)?, allow_list)?);
            }
            "biosample" => {
                let biosample = embedded(key, value)?;
                let accession = biosample.get("accession").ok_or_else(|| {
                    AnnexError::MalformedObject("biosample without accession".to_string())
                })?;
                metadata.push(MetadataArgument::set(key.as_str(), scalar_text(accession)));
                metadata.extend(extract_metadata(biosample, allow_list)?);
            }
            _ => match value {
                Value::Array(items) => {
                    for item in items {
                        metadata.push(MetadataArgument::append(key.as_str(), scalar_text(item)));
                    }
                }
                other => metadata.push(MetadataArgument::set(key.as_str(), scalar_text(other))),
            },
        }
    }
    Ok(metadata)
}

fn embedded<'v>(key: &str, value: &'v Value) -> Result<&'v Value, AnnexError> {
    if value.is_object() {
        Ok(value)
    } else {
        Err(AnnexError::MalformedObject(format!(
            "{key} is not an embedded object: {value}"
        )))
    }
}

/// `/experiments/ENCSR000AKA/` -> `ENCSR000AKA`
pub fn dataset_name(path: &str) -> &str {
    let trimmed = path.strip_suffix('/').unwrap_or(path);
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Text form of a value. Booleans and null are spelled `True`, `False` and
/// `None` to match values already present in existing annexes.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}
