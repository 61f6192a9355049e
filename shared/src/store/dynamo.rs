use std::collections::HashMap;
use std::marker::PhantomData;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client;
use log::{debug, warn};
use serde_dynamo::{from_item, to_attribute_value, to_item};

use super::{Document, DocumentStore, FieldOp, Filter, Result, StoreError, Update};

type Item = HashMap<String, AttributeValue>;

/// Attempts for updates guarded by a list snapshot before giving up.
const MAX_CONDITIONAL_ATTEMPTS: usize = 3;

/// Creates a DynamoDB client from the ambient AWS configuration, pointed at
/// `endpoint` when one is given (DynamoDB local).
pub async fn create_client(endpoint: Option<&str>) -> Client {
    let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .load()
        .await;
    let mut builder = aws_sdk_dynamodb::config::Builder::from(&config);
    if let Some(endpoint) = endpoint {
        builder = builder.endpoint_url(endpoint);
    }
    Client::from_conf(builder.build())
}

/// DynamoDB-backed store: one table per collection, partition key `id`.
pub struct DynamoDocumentStore<D> {
    client: Client,
    table_name: String,
    _marker: PhantomData<fn() -> D>,
}

impl<D: Document> DynamoDocumentStore<D> {
    pub fn with_client_and_table(client: Client, table_name: String) -> Self {
        Self {
            client,
            table_name,
            _marker: PhantomData,
        }
    }

    fn key(id: &str) -> Item {
        HashMap::from([("id".to_string(), AttributeValue::S(id.to_string()))])
    }

    async fn get_raw(&self, id: &str) -> Result<Option<Item>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key(id)))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| {
                StoreError::DatabaseError(format!("Failed to get {} {}: {}", D::COLLECTION, id, e))
            })?;
        Ok(output.item)
    }

    fn decode(item: Item) -> Result<D> {
        from_item(item).map_err(|e| StoreError::SerializationError(e.to_string()))
    }
}

/// Builder for a single UpdateItem call.
#[derive(Default)]
struct UpdateExpression {
    sets: Vec<String>,
    removes: Vec<String>,
    conditions: Vec<String>,
    names: HashMap<String, String>,
    values: Item,
}

impl UpdateExpression {
    fn name(&mut self, index: usize, field: &str) -> String {
        let placeholder = format!("#f{}", index);
        self.names.insert(placeholder.clone(), field.to_string());
        placeholder
    }

    fn value(&mut self, placeholder: String, value: AttributeValue) -> String {
        self.values.insert(placeholder.clone(), value);
        placeholder
    }

    fn expression(&self) -> String {
        let mut parts = Vec::new();
        if !self.sets.is_empty() {
            parts.push(format!("SET {}", self.sets.join(", ")));
        }
        if !self.removes.is_empty() {
            parts.push(format!("REMOVE {}", self.removes.join(", ")));
        }
        parts.join(" ")
    }

    fn condition(&self) -> String {
        let mut all = vec!["attribute_exists(id)".to_string()];
        all.extend(self.conditions.iter().cloned());
        all.join(" AND ")
    }
}

fn string_list(item: Option<&Item>, field: &str) -> Option<Vec<String>> {
    match item.and_then(|i| i.get(field)) {
        Some(AttributeValue::L(values)) => Some(
            values
                .iter()
                .map(|v| v.as_s().map(|s| s.to_string()).unwrap_or_default())
                .collect(),
        ),
        _ => None,
    }
}

fn build_expression(update: &Update, current: Option<&Item>) -> Result<UpdateExpression> {
    let mut expr = UpdateExpression::default();

    for (i, op) in update.ops().iter().enumerate() {
        match op {
            FieldOp::Set(field, value) => {
                let name = expr.name(i, field);
                let av: AttributeValue = to_attribute_value(value)
                    .map_err(|e| StoreError::SerializationError(e.to_string()))?;
                let value = expr.value(format!(":v{}", i), av);
                expr.sets.push(format!("{} = {}", name, value));
            }
            FieldOp::Unset(field) => {
                let name = expr.name(i, field);
                expr.removes.push(name);
            }
            FieldOp::Push(field, id) => {
                let name = expr.name(i, field);
                let value = expr.value(
                    format!(":v{}", i),
                    AttributeValue::L(vec![AttributeValue::S(id.clone())]),
                );
                let empty = expr.value(":empty".to_string(), AttributeValue::L(vec![]));
                expr.sets.push(format!(
                    "{} = list_append(if_not_exists({}, {}), {})",
                    name, name, empty, value
                ));
            }
            FieldOp::Pull(field, id) => {
                let positions: Vec<usize> = string_list(current, field)
                    .unwrap_or_default()
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| *v == id)
                    .map(|(pos, _)| pos)
                    .collect();
                if positions.is_empty() {
                    continue;
                }
                let name = expr.name(i, field);
                for pos in positions {
                    let value = expr.value(format!(":v{}_{}", i, pos), AttributeValue::S(id.clone()));
                    expr.removes.push(format!("{}[{}]", name, pos));
                    expr.conditions.push(format!("{}[{}] = {}", name, pos, value));
                }
            }
            FieldOp::AddToSet(field, values) => {
                let existing = string_list(current, field);
                let mut additions: Vec<String> = Vec::new();
                for value in values {
                    let present = existing.as_ref().map(|e| e.contains(value)).unwrap_or(false);
                    if !present && !additions.contains(value) {
                        additions.push(value.clone());
                    }
                }
                if additions.is_empty() {
                    continue;
                }
                let name = expr.name(i, field);
                let value = expr.value(
                    format!(":v{}", i),
                    AttributeValue::L(additions.into_iter().map(AttributeValue::S).collect()),
                );
                let empty = expr.value(":empty".to_string(), AttributeValue::L(vec![]));
                expr.sets.push(format!(
                    "{} = list_append(if_not_exists({}, {}), {})",
                    name, name, empty, value
                ));
                // The list must not have changed since it was read
                match existing {
                    Some(list) => {
                        let len = expr.value(
                            format!(":len{}", i),
                            AttributeValue::N(list.len().to_string()),
                        );
                        expr.conditions.push(format!("size({}) = {}", name, len));
                    }
                    None => expr.conditions.push(format!("attribute_not_exists({})", name)),
                }
            }
        }
    }

    Ok(expr)
}

#[async_trait]
impl<D: Document> DocumentStore<D> for DynamoDocumentStore<D> {
    async fn insert(&self, doc: D) -> Result<D> {
        debug!("Inserting {} {}", D::COLLECTION, doc.id());
        let item: Item = to_item(&doc).map_err(|e| StoreError::SerializationError(e.to_string()))?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(id)")
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error()
                    .map(|se| se.is_conditional_check_failed_exception())
                    .unwrap_or(false)
                {
                    StoreError::ValidationError(format!(
                        "{} {} already exists",
                        D::COLLECTION,
                        doc.id()
                    ))
                } else {
                    StoreError::DatabaseError(format!("Failed to insert {}: {}", D::COLLECTION, e))
                }
            })?;

        Ok(doc)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<D>> {
        debug!("Finding {} {}", D::COLLECTION, id);
        self.get_raw(id).await?.map(Self::decode).transpose()
    }

    async fn find_by_id_and_update(&self, id: &str, update: Update) -> Result<Option<D>> {
        debug!("Updating {} {} with {} ops", D::COLLECTION, id, update.ops().len());

        for attempt in 1..=MAX_CONDITIONAL_ATTEMPTS {
            let current = if update.needs_current() {
                match self.get_raw(id).await? {
                    Some(item) => Some(item),
                    None => return Ok(None),
                }
            } else {
                None
            };

            let expr = build_expression(&update, current.as_ref())?;
            if expr.sets.is_empty() && expr.removes.is_empty() {
                // Nothing left to change, the current state is the result
                return match current {
                    Some(item) => Self::decode(item).map(Some),
                    None => self.find_by_id(id).await,
                };
            }

            let result = self
                .client
                .update_item()
                .table_name(&self.table_name)
                .set_key(Some(Self::key(id)))
                .update_expression(expr.expression())
                .condition_expression(expr.condition())
                .set_expression_attribute_names(Some(expr.names.clone()))
                .set_expression_attribute_values(if expr.values.is_empty() {
                    None
                } else {
                    Some(expr.values.clone())
                })
                .return_values(ReturnValue::AllNew)
                .send()
                .await;

            match result {
                Ok(output) => return output.attributes.map(Self::decode).transpose(),
                Err(e) => {
                    let conditional = e
                        .as_service_error()
                        .map(|se| se.is_conditional_check_failed_exception())
                        .unwrap_or(false);
                    if !conditional {
                        return Err(StoreError::DatabaseError(format!(
                            "Failed to update {} {}: {}",
                            D::COLLECTION,
                            id,
                            e
                        )));
                    }
                    if current.is_none() {
                        // Only the existence check can have failed
                        return Ok(None);
                    }
                    warn!(
                        "Concurrent change on {} {}, retrying update (attempt {})",
                        D::COLLECTION,
                        id,
                        attempt
                    );
                }
            }
        }

        Err(StoreError::DatabaseError(format!(
            "Gave up updating {} {} after {} concurrent modifications",
            D::COLLECTION,
            id,
            MAX_CONDITIONAL_ATTEMPTS
        )))
    }

    async fn find_by_id_and_delete(&self, id: &str) -> Result<Option<D>> {
        debug!("Deleting {} {}", D::COLLECTION, id);
        let output = self
            .client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key(id)))
            .return_values(ReturnValue::AllOld)
            .send()
            .await
            .map_err(|e| {
                StoreError::DatabaseError(format!("Failed to delete {} {}: {}", D::COLLECTION, id, e))
            })?;

        output.attributes.map(Self::decode).transpose()
    }

    async fn find(&self, filter: Filter) -> Result<Vec<D>> {
        debug!("Scanning {} with {:?}", D::COLLECTION, filter);
        let mut docs = Vec::new();
        let mut start_key: Option<Item> = None;

        loop {
            let mut request = self
                .client
                .scan()
                .table_name(&self.table_name)
                .set_exclusive_start_key(start_key.take());

            if let Filter::Contains(field, value) = &filter {
                request = request
                    .filter_expression("contains(#f, :v)")
                    .expression_attribute_names("#f", field)
                    .expression_attribute_values(":v", AttributeValue::S(value.clone()));
            }

            let output = request.send().await.map_err(|e| {
                StoreError::DatabaseError(format!("Failed to scan {}: {}", D::COLLECTION, e))
            })?;

            for item in output.items.unwrap_or_default() {
                docs.push(Self::decode(item)?);
            }

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        Ok(docs)
    }
}
