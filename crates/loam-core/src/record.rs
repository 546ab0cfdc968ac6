//! Domain types for dataset records and collection bindings.
//!
//! A [`RecordDescriptor`] is one entry of a local dataset, addressed by its
//! natural key. A [`CollectionBinding`] maps a dataset onto the content API:
//! which GraphQL type it targets, which field holds the natural key, and how
//! relation references are wired. Payload assembly for create and update
//! mutations lives here so the reconciler and the client share one shape.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SeedError;

/// A single dataset entry to be converged into the content repository.
///
/// `fields` carries scalar and structured values (rich text blocks, JSON
/// blobs, string lists) exactly as the API expects them. `relations` maps a
/// relation field name to the natural keys of the target entries; the
/// reconciler resolves those keys to remote IDs before writing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDescriptor {
    /// Natural key, unique within the target collection.
    pub key: String,
    /// Field values keyed by API field name.
    #[serde(default)]
    pub fields: Map<String, Value>,
    /// Relation references keyed by API field name.
    #[serde(default)]
    pub relations: BTreeMap<String, Vec<String>>,
}

impl RecordDescriptor {
    /// Creates a descriptor with the given natural key and no fields.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            fields: Map::new(),
            relations: BTreeMap::new(),
        }
    }

    /// Adds a field value, consuming and returning the descriptor.
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Adds a relation reference, consuming and returning the descriptor.
    pub fn with_relation(
        mut self,
        field: impl Into<String>,
        keys: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.relations
            .insert(field.into(), keys.into_iter().map(Into::into).collect());
        self
    }

    /// Checks that the descriptor can be processed at all.
    pub fn validate(&self) -> Result<(), SeedError> {
        if self.key.trim().is_empty() {
            return Err(SeedError::Data("record has a blank natural key".to_string()));
        }
        Ok(())
    }
}

/// Opaque identifier minted by the content repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(String);

impl RemoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RemoteId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for RemoteId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Content stage of the staged repository.
///
/// Existence checks and mutations always target [`Stage::Draft`]; read-only
/// inventory queries may target either stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Draft,
    Published,
}

impl Stage {
    /// The stage name as the GraphQL `Stage` enum spells it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Draft => "DRAFT",
            Stage::Published => "PUBLISHED",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service-side view of an entry, as returned by inventory queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub id: RemoteId,
    /// Value of the collection's natural-key field.
    pub key: String,
    pub stage: Stage,
}

/// How one relation field of a collection is wired to its target collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationBinding {
    /// API field name on the owning type, e.g. `industries`.
    pub field: String,
    /// Plural query field of the target collection, e.g. `industries`.
    pub target_query_field: String,
    /// Natural-key field on the target type, e.g. `slug`.
    pub target_key_field: String,
    /// Whether the field accepts a list of targets.
    #[serde(default)]
    pub to_many: bool,
}

/// Binding of a dataset onto one GraphQL content type.
///
/// Operation and input-type names are derived from `type_name` following the
/// API's naming scheme: `createIndustry`, `updateIndustry`,
/// `publishIndustry`, `IndustryCreateInput`, `IndustryUpdateInput`.
///
/// # Examples
///
/// ```
/// use loam_core::record::CollectionBinding;
///
/// let binding = CollectionBinding::new("industries", "Industry", "industries", "slug");
/// assert_eq!(binding.create_field(), "createIndustry");
/// assert_eq!(binding.update_input_type(), "IndustryUpdateInput");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionBinding {
    /// Catalog name used to select this binding on the command line.
    pub name: String,
    /// GraphQL type name, e.g. `Industry`.
    pub type_name: String,
    /// Plural query field, e.g. `industries`.
    pub query_field: String,
    /// API field holding the natural key, e.g. `slug`.
    pub key_field: String,
    /// Relation fields this collection manages.
    #[serde(default)]
    pub relations: Vec<RelationBinding>,
}

/// Relation shaping differs between the two write mutations: create connects,
/// update replaces.
#[derive(Clone, Copy, PartialEq)]
enum RelationMode {
    Connect,
    Set,
}

impl CollectionBinding {
    /// Creates a binding without relations.
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        query_field: impl Into<String>,
        key_field: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            query_field: query_field.into(),
            key_field: key_field.into(),
            relations: Vec::new(),
        }
    }

    /// Adds a relation binding, consuming and returning the binding.
    pub fn with_relation(mut self, relation: RelationBinding) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn create_field(&self) -> String {
        format!("create{}", self.type_name)
    }

    pub fn update_field(&self) -> String {
        format!("update{}", self.type_name)
    }

    pub fn publish_field(&self) -> String {
        format!("publish{}", self.type_name)
    }

    pub fn create_input_type(&self) -> String {
        format!("{}CreateInput", self.type_name)
    }

    pub fn update_input_type(&self) -> String {
        format!("{}UpdateInput", self.type_name)
    }

    /// Looks up the binding for a relation field name.
    pub fn relation(&self, field: &str) -> Option<&RelationBinding> {
        self.relations.iter().find(|r| r.field == field)
    }

    /// Static checks that a record can be written through this binding.
    ///
    /// These need no remote state: blank keys, key-field conflicts,
    /// relations the binding does not declare, relation values misplaced in
    /// `fields`, and to-one relations with more than one target all make a
    /// record unprocessable.
    pub fn validate_record(&self, record: &RecordDescriptor) -> Result<(), SeedError> {
        record.validate()?;

        if let Some(existing) = record.fields.get(&self.key_field) {
            if existing != &Value::String(record.key.clone()) {
                return Err(SeedError::Data(format!(
                    "field '{}' conflicts with the record key '{}'",
                    self.key_field, record.key
                )));
            }
        }

        for relation in &self.relations {
            if record.fields.contains_key(&relation.field) {
                return Err(SeedError::Data(format!(
                    "relation field '{}' must be listed under relations, not fields",
                    relation.field
                )));
            }
        }

        for (field, keys) in &record.relations {
            let relation = self.relation(field).ok_or_else(|| {
                SeedError::Data(format!(
                    "collection '{}' has no relation field '{}'",
                    self.name, field
                ))
            })?;
            if !relation.to_many && keys.len() > 1 {
                return Err(SeedError::Data(format!(
                    "to-one relation '{}' has {} targets",
                    relation.field,
                    keys.len()
                )));
            }
        }

        Ok(())
    }

    /// Assembles the `data` input for the create mutation.
    ///
    /// The natural key is written into the key field, and every resolved
    /// relation is attached with connect semantics.
    pub fn create_payload(
        &self,
        record: &RecordDescriptor,
        resolved: &BTreeMap<String, Vec<RemoteId>>,
    ) -> Result<Value, SeedError> {
        self.write_payload(record, resolved, RelationMode::Connect)
    }

    /// Assembles the `data` input for the update mutation.
    ///
    /// List relations use set semantics so the remote state mirrors the
    /// dataset exactly; an empty list present in the record clears the
    /// relation, while a relation absent from the record is left untouched.
    pub fn update_payload(
        &self,
        record: &RecordDescriptor,
        resolved: &BTreeMap<String, Vec<RemoteId>>,
    ) -> Result<Value, SeedError> {
        self.write_payload(record, resolved, RelationMode::Set)
    }

    fn write_payload(
        &self,
        record: &RecordDescriptor,
        resolved: &BTreeMap<String, Vec<RemoteId>>,
        mode: RelationMode,
    ) -> Result<Value, SeedError> {
        self.validate_record(record)?;

        let mut data = record.fields.clone();

        // The key field is owned by the descriptor's key, never by fields.
        data.insert(self.key_field.clone(), Value::String(record.key.clone()));

        for (field, ids) in resolved {
            let relation = self.relation(field).ok_or_else(|| {
                SeedError::Data(format!(
                    "collection '{}' has no relation field '{}'",
                    self.name, field
                ))
            })?;

            if let Some(value) = relation_value(relation, ids, mode)? {
                data.insert(relation.field.clone(), value);
            }
        }

        Ok(Value::Object(data))
    }
}

/// Shapes resolved relation IDs into the API's relational input.
///
/// Returns `None` when the relation should be omitted from the payload.
fn relation_value(
    relation: &RelationBinding,
    ids: &[RemoteId],
    mode: RelationMode,
) -> Result<Option<Value>, SeedError> {
    let unique_inputs: Vec<Value> = ids
        .iter()
        .map(|id| serde_json::json!({ "id": id.as_str() }))
        .collect();

    if relation.to_many {
        let value = match mode {
            RelationMode::Connect => {
                if unique_inputs.is_empty() {
                    return Ok(None);
                }
                serde_json::json!({ "connect": unique_inputs })
            }
            // set with an empty list clears the relation on the remote side
            RelationMode::Set => serde_json::json!({ "set": unique_inputs }),
        };
        return Ok(Some(value));
    }

    match ids.len() {
        0 => Ok(None),
        1 => Ok(Some(serde_json::json!({ "connect": { "id": ids[0].as_str() } }))),
        n => Err(SeedError::Data(format!(
            "to-one relation '{}' has {} targets",
            relation.field, n
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn industries_binding() -> CollectionBinding {
        CollectionBinding::new("industries", "Industry", "industries", "slug")
    }

    fn applications_binding() -> CollectionBinding {
        CollectionBinding::new("applications", "Application", "applications", "title")
            .with_relation(RelationBinding {
                field: "industry".to_string(),
                target_query_field: "industries".to_string(),
                target_key_field: "slug".to_string(),
                to_many: false,
            })
            .with_relation(RelationBinding {
                field: "components".to_string(),
                target_query_field: "components".to_string(),
                target_key_field: "slug".to_string(),
                to_many: true,
            })
    }

    #[test]
    fn test_derived_operation_names() {
        let binding = industries_binding();
        assert_eq!(binding.create_field(), "createIndustry");
        assert_eq!(binding.update_field(), "updateIndustry");
        assert_eq!(binding.publish_field(), "publishIndustry");
        assert_eq!(binding.create_input_type(), "IndustryCreateInput");
        assert_eq!(binding.update_input_type(), "IndustryUpdateInput");
    }

    #[test]
    fn test_stage_serialization() {
        assert_eq!(serde_json::to_string(&Stage::Draft).unwrap(), "\"DRAFT\"");
        assert_eq!(
            serde_json::to_string(&Stage::Published).unwrap(),
            "\"PUBLISHED\""
        );
        assert_eq!(Stage::Draft.as_str(), "DRAFT");
    }

    #[test]
    fn test_descriptor_deserialization() {
        let json = r#"{
            "key": "healthcare",
            "fields": { "name": "Healthcare", "sections": ["Overview"] },
            "relations": { "technologies": ["ai-analysis-engine"] }
        }"#;

        let record: RecordDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(record.key, "healthcare");
        assert_eq!(record.fields["name"], "Healthcare");
        assert_eq!(record.relations["technologies"], vec!["ai-analysis-engine"]);
    }

    #[test]
    fn test_descriptor_defaults() {
        let record: RecordDescriptor = serde_json::from_str(r#"{ "key": "retail" }"#).unwrap();
        assert!(record.fields.is_empty());
        assert!(record.relations.is_empty());
    }

    #[test]
    fn test_validate_blank_key() {
        let record = RecordDescriptor::new("  ");
        assert!(matches!(record.validate(), Err(SeedError::Data(_))));
    }

    #[test]
    fn test_create_payload_injects_key_field() {
        let binding = industries_binding();
        let record = RecordDescriptor::new("healthcare")
            .with_field("name", Value::String("Healthcare".to_string()));

        let payload = binding.create_payload(&record, &BTreeMap::new()).unwrap();
        assert_eq!(payload["slug"], "healthcare");
        assert_eq!(payload["name"], "Healthcare");
    }

    #[test]
    fn test_payload_rejects_conflicting_key_field() {
        let binding = industries_binding();
        let record = RecordDescriptor::new("healthcare")
            .with_field("slug", Value::String("retail".to_string()));

        let result = binding.create_payload(&record, &BTreeMap::new());
        assert!(matches!(result, Err(SeedError::Data(_))));
    }

    #[test]
    fn test_payload_accepts_matching_key_field() {
        let binding = industries_binding();
        let record = RecordDescriptor::new("healthcare")
            .with_field("slug", Value::String("healthcare".to_string()));

        let payload = binding.create_payload(&record, &BTreeMap::new()).unwrap();
        assert_eq!(payload["slug"], "healthcare");
    }

    #[test]
    fn test_create_payload_connects_relations() {
        let binding = applications_binding();
        let record = RecordDescriptor::new("Fraud Detection");

        let mut resolved = BTreeMap::new();
        resolved.insert("industry".to_string(), vec![RemoteId::new("ind-1")]);
        resolved.insert(
            "components".to_string(),
            vec![RemoteId::new("cmp-1"), RemoteId::new("cmp-2")],
        );

        let payload = binding.create_payload(&record, &resolved).unwrap();
        assert_eq!(payload["industry"]["connect"]["id"], "ind-1");
        assert_eq!(payload["components"]["connect"][0]["id"], "cmp-1");
        assert_eq!(payload["components"]["connect"][1]["id"], "cmp-2");
    }

    #[test]
    fn test_update_payload_sets_relations() {
        let binding = applications_binding();
        let record = RecordDescriptor::new("Fraud Detection");

        let mut resolved = BTreeMap::new();
        resolved.insert("components".to_string(), vec![RemoteId::new("cmp-1")]);

        let payload = binding.update_payload(&record, &resolved).unwrap();
        assert_eq!(payload["components"]["set"][0]["id"], "cmp-1");
        assert!(payload.get("industry").is_none());
    }

    #[test]
    fn test_update_payload_empty_list_clears_relation() {
        let binding = applications_binding();
        let record = RecordDescriptor::new("Fraud Detection");

        let mut resolved = BTreeMap::new();
        resolved.insert("components".to_string(), Vec::new());

        let payload = binding.update_payload(&record, &resolved).unwrap();
        assert_eq!(payload["components"]["set"], serde_json::json!([]));
    }

    #[test]
    fn test_create_payload_omits_empty_relation() {
        let binding = applications_binding();
        let record = RecordDescriptor::new("Fraud Detection");

        let mut resolved = BTreeMap::new();
        resolved.insert("components".to_string(), Vec::new());

        let payload = binding.create_payload(&record, &resolved).unwrap();
        assert!(payload.get("components").is_none());
    }

    #[test]
    fn test_payload_rejects_unknown_relation() {
        let binding = industries_binding();
        let record = RecordDescriptor::new("healthcare");

        let mut resolved = BTreeMap::new();
        resolved.insert("technologies".to_string(), vec![RemoteId::new("tec-1")]);

        let result = binding.create_payload(&record, &resolved);
        assert!(matches!(result, Err(SeedError::Data(_))));
    }

    #[test]
    fn test_payload_rejects_relation_listed_in_fields() {
        let binding = applications_binding();
        let record = RecordDescriptor::new("Fraud Detection")
            .with_field("components", serde_json::json!(["cmp-1"]));

        let result = binding.create_payload(&record, &BTreeMap::new());
        assert!(matches!(result, Err(SeedError::Data(_))));
    }

    #[test]
    fn test_validate_record_rejects_unknown_relation() {
        let binding = industries_binding();
        let record =
            RecordDescriptor::new("healthcare").with_relation("technologies", ["ai-engine"]);

        assert!(matches!(
            binding.validate_record(&record),
            Err(SeedError::Data(_))
        ));
    }

    #[test]
    fn test_validate_record_rejects_multiple_to_one_keys() {
        let binding = applications_binding();
        let record = RecordDescriptor::new("Fraud Detection")
            .with_relation("industry", ["healthcare", "retail"]);

        assert!(matches!(
            binding.validate_record(&record),
            Err(SeedError::Data(_))
        ));
    }

    #[test]
    fn test_payload_rejects_multiple_to_one_targets() {
        let binding = applications_binding();
        let record = RecordDescriptor::new("Fraud Detection");

        let mut resolved = BTreeMap::new();
        resolved.insert(
            "industry".to_string(),
            vec![RemoteId::new("ind-1"), RemoteId::new("ind-2")],
        );

        let result = binding.create_payload(&record, &resolved);
        assert!(matches!(result, Err(SeedError::Data(_))));
    }

    #[test]
    fn test_remote_id_display() {
        let id = RemoteId::new("cln4x2");
        assert_eq!(id.to_string(), "cln4x2");
        assert_eq!(id.as_str(), "cln4x2");
    }
}
