// src/store/firestore.rs
//! Firestore REST v1 adapter.
//!
//! Only the calls the pipeline needs: document GET / PATCH / DELETE and
//! `:runQuery` with equality and less-than field filters. Authentication is a
//! ready-made OAuth access token supplied by configuration.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{Document, DocumentStore, FieldValue, Fields, Filter, Op};

pub const DEFAULT_FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com";

pub struct FirestoreStore {
    http: Client,
    /// `{base}/v1/projects/{project}/databases/(default)/documents`
    root: String,
    /// Resource-name prefix Firestore uses in responses.
    name_prefix: String,
    access_token: Option<String>,
}

impl FirestoreStore {
    /// Point at a custom endpoint (emulator, test server).
    pub fn with_base_url(
        base_url: &str,
        project_id: &str,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let project_id = project_id.trim();
        if project_id.is_empty() {
            return Err(anyhow!("firestore project id is empty"));
        }
        let http = Client::builder()
            .user_agent("askarg-feed/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .context("reqwest client")?;
        let name_prefix = format!("projects/{project_id}/databases/(default)/documents");
        let root = format!("{}/v1/{}", base_url.trim_end_matches('/'), name_prefix);
        Ok(Self {
            http,
            root,
            name_prefix,
            access_token: access_token.filter(|t| !t.trim().is_empty()),
        })
    }

    fn authed(&self, rb: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(t) => rb.bearer_auth(t),
            None => rb,
        }
    }

    fn doc_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.root, collection.trim_matches('/'), id)
    }

    /// `:runQuery` endpoint and collection id for a possibly nested collection path.
    fn query_target(&self, collection: &str) -> (String, String) {
        let path = collection.trim_matches('/');
        match path.rsplit_once('/') {
            Some((parent, id)) => (format!("{}/{}:runQuery", self.root, parent), id.to_string()),
            None => (format!("{}:runQuery", self.root), path.to_string()),
        }
    }

    fn id_from_name<'a>(&self, name: &'a str) -> &'a str {
        name.rsplit('/').next().unwrap_or(name)
    }
}

#[derive(Debug, Deserialize)]
struct WireDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RunQueryRow {
    #[serde(default)]
    document: Option<WireDocument>,
}

#[async_trait::async_trait]
impl DocumentStore for FirestoreStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let resp = self
            .authed(self.http.get(self.doc_url(collection, id)))
            .send()
            .await
            .with_context(|| format!("firestore get {collection}/{id}"))?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = resp
            .error_for_status()
            .with_context(|| format!("firestore get {collection}/{id} non-2xx"))?;
        let doc: WireDocument = resp.json().await.context("firestore get body")?;
        Ok(Some(decode_document(self.id_from_name(&doc.name), &doc.fields)))
    }

    async fn query(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Document>> {
        let (url, collection_id) = self.query_target(collection);
        let body = json!({ "structuredQuery": structured_query(&collection_id, filters) });
        let rows: Vec<RunQueryRow> = self
            .authed(self.http.post(url))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("firestore runQuery {collection}"))?
            .error_for_status()
            .with_context(|| format!("firestore runQuery {collection} non-2xx"))?
            .json()
            .await
            .context("firestore runQuery body")?;

        Ok(rows
            .into_iter()
            .filter_map(|r| r.document)
            .map(|d| decode_document(self.id_from_name(&d.name), &d.fields))
            .collect())
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        let body = json!({ "fields": encode_fields(&fields) });
        self.authed(self.http.patch(self.doc_url(collection, id)))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("firestore set {collection}/{id}"))?
            .error_for_status()
            .with_context(|| format!("firestore set {collection}/{id} non-2xx"))?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.authed(self.http.delete(self.doc_url(collection, id)))
            .send()
            .await
            .with_context(|| format!("firestore delete {collection}/{id}"))?
            .error_for_status()
            .with_context(|| format!("firestore delete {collection}/{id} non-2xx"))?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "firestore"
    }
}

impl std::fmt::Debug for FirestoreStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreStore")
            .field("root", &self.root)
            .field("prefix", &self.name_prefix)
            .field("authed", &self.access_token.is_some())
            .finish()
    }
}

/// `structuredQuery` body: one collection, filters AND-ed.
pub(crate) fn structured_query(collection_id: &str, filters: &[Filter]) -> Value {
    let mut q = json!({ "from": [{ "collectionId": collection_id }] });
    let field_filter = |f: &Filter| {
        let op = match f.op {
            Op::Eq => "EQUAL",
            Op::Lt => "LESS_THAN",
        };
        json!({
            "fieldFilter": {
                "field": { "fieldPath": f.field },
                "op": op,
                "value": encode_value(&f.value),
            }
        })
    };
    match filters {
        [] => {}
        [one] => {
            q["where"] = field_filter(one);
        }
        many => {
            q["where"] = json!({
                "compositeFilter": {
                    "op": "AND",
                    "filters": many.iter().map(field_filter).collect::<Vec<_>>(),
                }
            });
        }
    }
    q
}

pub(crate) fn encode_fields(fields: &Fields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(k, v)| (k.clone(), encode_value(v)))
            .collect(),
    )
}

pub(crate) fn encode_value(v: &FieldValue) -> Value {
    match v {
        FieldValue::Null => json!({ "nullValue": null }),
        FieldValue::Bool(b) => json!({ "booleanValue": b }),
        // int64 travels as a decimal string
        FieldValue::Integer(i) => json!({ "integerValue": i.to_string() }),
        FieldValue::Double(d) => json!({ "doubleValue": d }),
        FieldValue::String(s) => json!({ "stringValue": s }),
        FieldValue::Timestamp(t) => {
            json!({ "timestampValue": t.to_rfc3339_opts(SecondsFormat::Micros, true) })
        }
        FieldValue::Array(items) => {
            json!({ "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() } })
        }
    }
}

/// Unknown or unsupported wire types decode to `Null`.
pub(crate) fn decode_value(v: &Value) -> FieldValue {
    let Some(obj) = v.as_object() else {
        return FieldValue::Null;
    };
    if let Some(s) = obj.get("stringValue").and_then(Value::as_str) {
        return FieldValue::String(s.to_string());
    }
    if let Some(s) = obj.get("timestampValue").and_then(Value::as_str) {
        return DateTime::parse_from_rfc3339(s)
            .map(|t| FieldValue::Timestamp(t.with_timezone(&Utc)))
            .unwrap_or(FieldValue::Null);
    }
    if let Some(i) = obj.get("integerValue") {
        let parsed = match i {
            Value::String(s) => s.parse::<i64>().ok(),
            other => other.as_i64(),
        };
        return parsed.map(FieldValue::Integer).unwrap_or(FieldValue::Null);
    }
    if let Some(d) = obj.get("doubleValue").and_then(Value::as_f64) {
        return FieldValue::Double(d);
    }
    if let Some(b) = obj.get("booleanValue").and_then(Value::as_bool) {
        return FieldValue::Bool(b);
    }
    if let Some(arr) = obj.get("arrayValue") {
        let values = arr
            .get("values")
            .and_then(Value::as_array)
            .map(|vs| vs.iter().map(decode_value).collect())
            .unwrap_or_default();
        return FieldValue::Array(values);
    }
    FieldValue::Null
}

fn decode_document(id: &str, fields: &Map<String, Value>) -> Document {
    Document {
        id: id.to_string(),
        fields: fields
            .iter()
            .map(|(k, v)| (k.clone(), decode_value(v)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn store() -> FirestoreStore {
        FirestoreStore::with_base_url("http://localhost:8080/", "demo", None, Duration::from_secs(5))
            .unwrap()
    }

    #[test]
    fn query_target_handles_nested_paths() {
        let s = store();
        let (url, id) = s.query_target("news_articles");
        assert_eq!(
            url,
            "http://localhost:8080/v1/projects/demo/databases/(default)/documents:runQuery"
        );
        assert_eq!(id, "news_articles");

        let (url, id) = s.query_target("chat_rooms/r1/messages");
        assert_eq!(
            url,
            "http://localhost:8080/v1/projects/demo/databases/(default)/documents/chat_rooms/r1:runQuery"
        );
        assert_eq!(id, "messages");
    }

    #[test]
    fn single_and_composite_where_clauses() {
        let one = structured_query("news_articles", &[Filter::eq("title", "A")]);
        assert_eq!(one["where"]["fieldFilter"]["op"], "EQUAL");
        assert_eq!(one["where"]["fieldFilter"]["value"]["stringValue"], "A");

        let two = structured_query(
            "internships_jobs",
            &[Filter::eq("title", "A"), Filter::eq("link", "L")],
        );
        assert_eq!(two["where"]["compositeFilter"]["op"], "AND");
        assert_eq!(
            two["where"]["compositeFilter"]["filters"]
                .as_array()
                .unwrap()
                .len(),
            2
        );

        let none = structured_query("chat_rooms", &[]);
        assert!(none.get("where").is_none());
    }

    #[test]
    fn timestamp_survives_encode_decode() {
        let t = Utc.with_ymd_and_hms(2025, 8, 1, 12, 30, 0).unwrap();
        let wire = encode_value(&FieldValue::Timestamp(t));
        assert_eq!(wire["timestampValue"], "2025-08-01T12:30:00.000000Z");
        assert_eq!(decode_value(&wire), FieldValue::Timestamp(t));
    }

    #[test]
    fn decodes_integer_strings_and_unknown_types() {
        assert_eq!(
            decode_value(&json!({ "integerValue": "42" })),
            FieldValue::Integer(42)
        );
        assert_eq!(
            decode_value(&json!({ "geoPointValue": { "latitude": 1.0 } })),
            FieldValue::Null
        );
        assert_eq!(
            decode_value(&json!({ "arrayValue": {} })),
            FieldValue::Array(vec![])
        );
    }
}
