use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType,
};
use aws_sdk_dynamodb::Client;
use log::debug;

use crate::store::dynamo::create_client;

pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Tests run against DynamoDB local when `USE_DYNAMODB=true`.
pub fn use_dynamodb() -> bool {
    std::env::var("USE_DYNAMODB")
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(false)
}

pub async fn create_dynamo_client() -> Client {
    let endpoint =
        std::env::var("DYNAMODB_ENDPOINT").unwrap_or_else(|_| "http://localhost:8000".to_string());
    create_client(Some(&endpoint)).await
}

/// Creates a collection table keyed by `id`.
pub async fn create_document_table(client: &Client, table_name: &str) -> Result<(), Error> {
    debug!("Creating test table '{}'", table_name);
    client
        .create_table()
        .table_name(table_name)
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name("id")
                .key_type(KeyType::Hash)
                .build()?,
        )
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name("id")
                .attribute_type(ScalarAttributeType::S)
                .build()?,
        )
        .billing_mode(BillingMode::PayPerRequest)
        .send()
        .await
        .map_err(aws_sdk_dynamodb::Error::from)?;
    Ok(())
}

/// Deletes every item from a test table.
pub async fn clear_dynamo_table(client: &Client, table_name: &str) -> Result<(), Error> {
    let output = client
        .scan()
        .table_name(table_name)
        .send()
        .await
        .map_err(aws_sdk_dynamodb::Error::from)?;
    for item in output.items.unwrap_or_default() {
        if let Some(id) = item.get("id") {
            client
                .delete_item()
                .table_name(table_name)
                .key("id", id.clone())
                .send()
                .await
                .map_err(aws_sdk_dynamodb::Error::from)?;
        }
    }
    Ok(())
}

/// Creates (if needed) and empties a test table.
pub async fn prepare_table(client: &Client, table_name: &str) {
    if let Err(e) = create_document_table(client, table_name).await {
        if !e.to_string().contains("ResourceInUse") {
            log::error!("Error creating table {}: {}", table_name, e);
        }
    }
    if let Err(e) = clear_dynamo_table(client, table_name).await {
        log::error!("Failed to clear table {}: {}", table_name, e);
    }
}
