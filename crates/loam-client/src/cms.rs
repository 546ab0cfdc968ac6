use async_trait::async_trait;
use serde_json::{json, Value};

use loam_core::config::HttpConfig;
use loam_core::error::SeedError;
use loam_core::reconcile::ContentStore;
use loam_core::record::{CollectionBinding, RemoteId, RemoteRecord, Stage};

use crate::graphql::GraphQlClient;

/// Content repository access over GraphQL.
///
/// Implements the reconciler-facing [`ContentStore`] operations by building
/// fixed-shape documents from a [`CollectionBinding`]: the binding supplies
/// type and field names, the client supplies the wire protocol. Mutations
/// always target the DRAFT stage; the publish mutation promotes an entry to
/// PUBLISHED and selects the resulting stage back as confirmation.
///
/// # Examples
///
/// ```no_run
/// use loam_client::CmsClient;
/// use loam_core::config::BindingsCatalog;
/// use loam_core::reconcile::ContentStore;
/// use loam_core::record::Stage;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = CmsClient::new("https://api.example.com/v2/project/master", "token")?;
/// let catalog = BindingsCatalog::builtin();
/// let binding = catalog.get("industries").unwrap();
/// let drafts = client.list(binding, Stage::Draft, 100).await?;
/// println!("{} draft industries", drafts.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CmsClient {
    graphql: GraphQlClient,
}

impl CmsClient {
    /// Creates a client with the default HTTP configuration.
    pub fn new(endpoint: &str, token: &str) -> Result<Self, SeedError> {
        Ok(Self {
            graphql: GraphQlClient::new(endpoint, token)?,
        })
    }

    /// Creates a client with explicit timeout and retry settings.
    pub fn with_config(
        endpoint: &str,
        token: &str,
        config: HttpConfig,
    ) -> Result<Self, SeedError> {
        Ok(Self {
            graphql: GraphQlClient::with_config(endpoint, token, config)?,
        })
    }
}

#[async_trait]
impl ContentStore for CmsClient {
    async fn lookup(
        &self,
        query_field: &str,
        key_field: &str,
        key: &str,
        stage: Stage,
    ) -> Result<Vec<RemoteId>, SeedError> {
        let document = lookup_document(query_field, key_field);
        let variables = json!({ "key": key, "stage": stage.as_str() });

        let data = self
            .graphql
            .execute(&document, Some("LookupByNaturalKey"), variables, stage)
            .await?;

        ids_from_lookup(&data, query_field)
    }

    async fn create(
        &self,
        binding: &CollectionBinding,
        data: Value,
    ) -> Result<RemoteId, SeedError> {
        let document = create_document(binding);
        let variables = json!({ "data": data });

        let response = self
            .graphql
            .execute(&document, Some("CreateRecord"), variables, Stage::Draft)
            .await?;

        id_from_mutation(&response, &binding.create_field())
    }

    async fn update(
        &self,
        binding: &CollectionBinding,
        id: &RemoteId,
        data: Value,
    ) -> Result<(), SeedError> {
        let document = update_document(binding);
        let variables = json!({ "id": id.as_str(), "data": data });

        let response = self
            .graphql
            .execute(&document, Some("UpdateRecord"), variables, Stage::Draft)
            .await?;

        id_from_mutation(&response, &binding.update_field()).map(|_| ())
    }

    async fn publish(&self, binding: &CollectionBinding, id: &RemoteId) -> Result<(), SeedError> {
        let document = publish_document(binding);
        let variables = json!({ "id": id.as_str() });

        let response = self
            .graphql
            .execute(&document, Some("PublishRecord"), variables, Stage::Draft)
            .await?;

        id_from_mutation(&response, &binding.publish_field()).map(|_| ())
    }

    async fn list(
        &self,
        binding: &CollectionBinding,
        stage: Stage,
        limit: usize,
    ) -> Result<Vec<RemoteRecord>, SeedError> {
        let document = list_document(binding);
        let variables = json!({ "stage": stage.as_str(), "first": limit });

        let data = self
            .graphql
            .execute(&document, Some("ListRecords"), variables, stage)
            .await?;

        records_from_list(&data, binding, stage)
    }
}

fn lookup_document(query_field: &str, key_field: &str) -> String {
    format!(
        "query LookupByNaturalKey($key: String!, $stage: Stage!) {{ {}(where: {{ {}: $key }}, stage: $stage) {{ id }} }}",
        query_field, key_field
    )
}

fn create_document(binding: &CollectionBinding) -> String {
    format!(
        "mutation CreateRecord($data: {}!) {{ {}(data: $data) {{ id }} }}",
        binding.create_input_type(),
        binding.create_field()
    )
}

fn update_document(binding: &CollectionBinding) -> String {
    format!(
        "mutation UpdateRecord($id: ID!, $data: {}!) {{ {}(where: {{ id: $id }}, data: $data) {{ id }} }}",
        binding.update_input_type(),
        binding.update_field()
    )
}

fn publish_document(binding: &CollectionBinding) -> String {
    format!(
        "mutation PublishRecord($id: ID!) {{ {}(where: {{ id: $id }}, to: PUBLISHED) {{ id stage }} }}",
        binding.publish_field()
    )
}

fn list_document(binding: &CollectionBinding) -> String {
    format!(
        "query ListRecords($stage: Stage!, $first: Int!) {{ {}(stage: $stage, first: $first) {{ id {} }} }}",
        binding.query_field, binding.key_field
    )
}

/// Extracts the matched entry IDs from a lookup response.
fn ids_from_lookup(data: &Value, query_field: &str) -> Result<Vec<RemoteId>, SeedError> {
    let entries = data
        .get(query_field)
        .and_then(Value::as_array)
        .ok_or_else(|| SeedError::MissingData(format!("field '{}'", query_field)))?;

    entries
        .iter()
        .map(|entry| {
            entry
                .get("id")
                .and_then(Value::as_str)
                .map(RemoteId::new)
                .ok_or_else(|| SeedError::MissingData(format!("id in '{}' entry", query_field)))
        })
        .collect()
}

/// Extracts the entry ID from a mutation payload.
///
/// A present-but-null payload means the service accepted the request without
/// performing the mutation, which the caller must treat as a failure.
fn id_from_mutation(data: &Value, field: &str) -> Result<RemoteId, SeedError> {
    data.get(field)
        .and_then(|payload| payload.get("id"))
        .and_then(Value::as_str)
        .map(RemoteId::new)
        .ok_or_else(|| SeedError::MissingData(format!("payload of '{}'", field)))
}

/// Converts a list response into remote records at the queried stage.
fn records_from_list(
    data: &Value,
    binding: &CollectionBinding,
    stage: Stage,
) -> Result<Vec<RemoteRecord>, SeedError> {
    let entries = data
        .get(&binding.query_field)
        .and_then(Value::as_array)
        .ok_or_else(|| SeedError::MissingData(format!("field '{}'", binding.query_field)))?;

    entries
        .iter()
        .map(|entry| {
            let id = entry
                .get("id")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    SeedError::MissingData(format!("id in '{}' entry", binding.query_field))
                })?;
            let key = entry
                .get(&binding.key_field)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Ok(RemoteRecord {
                id: RemoteId::new(id),
                key,
                stage,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn industries_binding() -> CollectionBinding {
        CollectionBinding::new("industries", "Industry", "industries", "slug")
    }

    #[test]
    fn test_lookup_document() {
        assert_eq!(
            lookup_document("industries", "slug"),
            "query LookupByNaturalKey($key: String!, $stage: Stage!) { industries(where: { slug: $key }, stage: $stage) { id } }"
        );
    }

    #[test]
    fn test_create_document() {
        assert_eq!(
            create_document(&industries_binding()),
            "mutation CreateRecord($data: IndustryCreateInput!) { createIndustry(data: $data) { id } }"
        );
    }

    #[test]
    fn test_update_document() {
        assert_eq!(
            update_document(&industries_binding()),
            "mutation UpdateRecord($id: ID!, $data: IndustryUpdateInput!) { updateIndustry(where: { id: $id }, data: $data) { id } }"
        );
    }

    #[test]
    fn test_publish_document() {
        assert_eq!(
            publish_document(&industries_binding()),
            "mutation PublishRecord($id: ID!) { publishIndustry(where: { id: $id }, to: PUBLISHED) { id stage } }"
        );
    }

    #[test]
    fn test_list_document() {
        assert_eq!(
            list_document(&industries_binding()),
            "query ListRecords($stage: Stage!, $first: Int!) { industries(stage: $stage, first: $first) { id slug } }"
        );
    }

    #[test]
    fn test_ids_from_lookup() {
        let data = json!({ "industries": [{ "id": "ind-1" }, { "id": "ind-2" }] });
        let ids = ids_from_lookup(&data, "industries").unwrap();
        assert_eq!(ids, vec![RemoteId::new("ind-1"), RemoteId::new("ind-2")]);
    }

    #[test]
    fn test_ids_from_lookup_empty() {
        let data = json!({ "industries": [] });
        let ids = ids_from_lookup(&data, "industries").unwrap();
        assert!(ids.is_empty());
    }

    #[test]
    fn test_ids_from_lookup_missing_field() {
        let data = json!({});
        let result = ids_from_lookup(&data, "industries");
        assert!(matches!(result, Err(SeedError::MissingData(_))));
    }

    #[test]
    fn test_id_from_mutation() {
        let data = json!({ "createIndustry": { "id": "ind-9" } });
        let id = id_from_mutation(&data, "createIndustry").unwrap();
        assert_eq!(id, RemoteId::new("ind-9"));
    }

    #[test]
    fn test_id_from_mutation_null_payload() {
        let data = json!({ "publishIndustry": null });
        let result = id_from_mutation(&data, "publishIndustry");
        assert!(matches!(result, Err(SeedError::MissingData(_))));
    }

    #[test]
    fn test_records_from_list() {
        let binding = industries_binding();
        let data = json!({
            "industries": [
                { "id": "ind-1", "slug": "healthcare" },
                { "id": "ind-2", "slug": "retail" }
            ]
        });

        let records = records_from_list(&data, &binding, Stage::Published).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].key, "healthcare");
        assert_eq!(records[0].stage, Stage::Published);
        assert_eq!(records[1].id, RemoteId::new("ind-2"));
    }

    #[test]
    fn test_new_with_invalid_endpoint() {
        let result = CmsClient::new("not-a-valid-url", "token");
        assert!(matches!(result, Err(SeedError::InvalidEndpoint(_))));
    }
}
