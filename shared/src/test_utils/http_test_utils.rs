use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::Value;

/// Reads a response body as JSON, `Value::Null` when the body is empty.
pub async fn response_to_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("response body must be readable")
        .to_bytes();

    if bytes.is_empty() {
        return Value::Null;
    }

    serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        Value::String(String::from_utf8_lossy(&bytes).into_owned())
    })
}
