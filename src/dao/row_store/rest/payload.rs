//! Normalization of the row store's response bodies.

use serde::Deserialize;
use serde_json::Value;

use crate::dao::models::Row;

use super::error::{RestDaoError, RestResult};

/// Shapes a list endpoint may answer with. The error marker is tried first so an
/// object carrying `error` never passes for rows.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PagePayload {
    Failure {
        error: Value,
        #[serde(default)]
        detail: Option<Value>,
    },
    Envelope {
        results: Vec<Row>,
    },
    Rows(Vec<Row>),
}

/// Turn a list response body into rows, or into [`RestDaoError::Rejected`].
pub fn normalize_page(path: &str, body: Value) -> RestResult<Vec<Row>> {
    match serde_json::from_value(body) {
        Ok(PagePayload::Rows(rows)) | Ok(PagePayload::Envelope { results: rows }) => Ok(rows),
        Ok(PagePayload::Failure { error, detail }) => Err(rejected(path, &error, detail.as_ref())),
        Err(source) => Err(RestDaoError::UnexpectedPayload {
            path: path.to_string(),
            source,
        }),
    }
}

/// Turn a single-row response body into a row, or into [`RestDaoError::Rejected`].
pub fn normalize_row(path: &str, body: Value) -> RestResult<Row> {
    match body {
        Value::Object(row) if row.contains_key("error") => {
            let error = row.get("error").cloned().unwrap_or(Value::Null);
            Err(rejected(path, &error, row.get("detail")))
        }
        Value::Object(row) => Ok(row),
        other => Err(RestDaoError::UnexpectedPayload {
            path: path.to_string(),
            source: serde::de::Error::custom(format!("expected a row object, got {other}")),
        }),
    }
}

/// Extract the marker carried by an error body, if any.
pub fn error_marker(path: &str, body: &Value) -> Option<RestDaoError> {
    let object = body.as_object()?;
    let error = object.get("error")?;
    Some(rejected(path, error, object.get("detail")))
}

fn rejected(path: &str, error: &Value, detail: Option<&Value>) -> RestDaoError {
    let mut message = describe(error);
    if let Some(detail) = detail.filter(|detail| !detail.is_null()) {
        message = format!("{message} ({})", describe(detail));
    }
    RestDaoError::Rejected {
        path: path.to_string(),
        message,
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
