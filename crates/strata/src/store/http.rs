//! Client for the structures REST API.
//!
//! | Operation | Request                    | Response                         |
//! |-----------|----------------------------|----------------------------------|
//! | list      | `GET {base}/structures`      | `[{id, name, updated_at}]`       |
//! | load      | `GET {base}/structures/{id}` | `{id, name, data, updated_at}` or 404 |
//! | save      | `POST {base}/structures`     | `{success: true}`                |
//! | delete    | `DELETE {base}/structures/{id}` | `{success: true}`             |

use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ureq::{Agent, Body, http::Response};

use strata_core::model::Diagram;

use super::{StoreError, StructureRecord, StructureStore, StructureSummary, timestamp, validate_id};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const NOT_FOUND: u16 = 404;

/// A [`StructureStore`] backed by the structures REST API.
#[derive(Debug, Clone)]
pub struct HttpStore {
    base_url: String,
    agent: Agent,
}

#[derive(Debug, Serialize)]
struct SaveRequest<'a> {
    id: &'a str,
    name: &'a str,
    data: &'a Diagram,
}

/// A record as returned by the server. The server stores `data` as text and
/// may hand it back either as a JSON string or as an embedded object.
#[derive(Debug, Deserialize)]
struct WireRecord {
    id: String,
    name: String,
    data: Value,
    updated_at: String,
}

#[derive(Debug, Deserialize)]
struct WireSummary {
    id: String,
    name: String,
    updated_at: String,
}

impl HttpStore {
    /// Creates a client for the API rooted at `base_url`, e.g.
    /// `http://localhost:3000/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            agent: Agent::new_with_config(config),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}/structures", self.base_url)
    }

    fn record_url(&self, id: &str) -> Result<String, StoreError> {
        validate_id(id)?;
        Ok(format!("{}/structures/{id}", self.base_url))
    }
}

impl StructureStore for HttpStore {
    fn list(&self) -> Result<Vec<StructureSummary>, StoreError> {
        let url = self.collection_url();
        debug!(url; "Listing structures");
        let response = self.agent.get(&url).call().map_err(transport_error)?;
        let body = successful_body(response)?;

        let wire: Vec<WireSummary> = serde_json::from_str(&body)?;
        wire.into_iter()
            .map(|summary| {
                Ok(StructureSummary {
                    updated_at: parse_timestamp(&summary.updated_at)?,
                    id: summary.id,
                    name: summary.name,
                })
            })
            .collect()
    }

    fn load(&self, id: &str) -> Result<Option<StructureRecord>, StoreError> {
        let url = self.record_url(id)?;
        debug!(url; "Loading structure");
        let response = self.agent.get(&url).call().map_err(transport_error)?;
        if response.status().as_u16() == NOT_FOUND {
            debug!(id; "Structure not found");
            return Ok(None);
        }
        let body = successful_body(response)?;

        let wire: WireRecord = serde_json::from_str(&body)?;
        Ok(Some(StructureRecord {
            data: decode_data(wire.data)?,
            updated_at: parse_timestamp(&wire.updated_at)?,
            id: wire.id,
            name: wire.name,
        }))
    }

    fn save(&self, id: &str, name: &str, data: &Diagram) -> Result<(), StoreError> {
        validate_id(id)?;
        let request = SaveRequest { id, name, data };
        let response = self
            .agent
            .post(&self.collection_url())
            .send_json(&request)
            .map_err(transport_error)?;
        successful_body(response)?;

        info!(id, name; "Structure saved");
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let url = self.record_url(id)?;
        let response = self.agent.delete(&url).call().map_err(transport_error)?;
        successful_body(response)?;

        info!(id; "Structure deleted");
        Ok(())
    }
}

fn transport_error(err: ureq::Error) -> StoreError {
    error!(err:err; "Structure store request failed");
    StoreError::Transport(err)
}

/// Reads the response body, turning non-2xx statuses into
/// [`StoreError::Status`].
fn successful_body(mut response: Response<Body>) -> Result<String, StoreError> {
    let status = response.status();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(transport_error)?;

    if status.is_success() {
        Ok(body)
    } else {
        error!(status = status.as_u16(); "Structure store rejected request");
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

fn decode_data(data: Value) -> Result<Diagram, StoreError> {
    match data {
        Value::String(text) => Ok(serde_json::from_str(&text)?),
        other => Ok(serde_json::from_value(other)?),
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    timestamp::parse(raw).ok_or_else(|| {
        StoreError::Serialization(serde::de::Error::custom(format!(
            "invalid timestamp `{raw}`"
        )))
    })
}

#[cfg(test)]
mod tests {
    use std::{
        io::{BufRead, BufReader, Read, Write},
        net::TcpListener,
        thread::{self, JoinHandle},
    };

    use chrono::TimeZone;

    use super::*;

    /// Serves a single canned response on a local port and hands back the
    /// raw request (head and body) it received.
    fn serve_once(status: u16, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}/api", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);

            let mut request = String::new();
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
                request.push_str(&line);
                if line == "\r\n" || line.is_empty() {
                    break;
                }
            }
            let mut payload = vec![0; content_length];
            reader.read_exact(&mut payload).unwrap();
            request.push_str(&String::from_utf8(payload).unwrap());

            let response = format!(
                "HTTP/1.1 {status} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            reader.get_mut().write_all(response.as_bytes()).unwrap();
            request
        });

        (base_url, handle)
    }

    fn request_body(request: &str) -> Value {
        let (_, body) = request.split_once("\r\n\r\n").unwrap();
        serde_json::from_str(body).unwrap()
    }

    const PAYLOAD: &str = r#"{"entities":[{"id":"1","type":"SPV","name":"BidCo","incorporationJurisdiction":"BVI","x":0,"y":0}],"relationships":[]}"#;

    #[test]
    fn test_decode_data_from_string() {
        let diagram = decode_data(Value::String(PAYLOAD.to_string())).unwrap();
        assert_eq!(diagram.entities().len(), 1);
        assert_eq!(diagram.entities()[0].name, "BidCo");
    }

    #[test]
    fn test_decode_data_from_object() {
        let value: Value = serde_json::from_str(PAYLOAD).unwrap();
        let diagram = decode_data(value).unwrap();
        assert_eq!(diagram.entity("1").unwrap().incorporation_jurisdiction, "BVI");
    }

    #[test]
    fn test_decode_data_rejects_garbage() {
        assert!(decode_data(Value::String("not json".to_string())).is_err());
        assert!(decode_data(Value::Bool(true)).is_err());
    }

    #[test]
    fn test_urls() {
        let store = HttpStore::new("http://localhost:3000/api/");
        assert_eq!(store.base_url(), "http://localhost:3000/api");
        assert_eq!(store.collection_url(), "http://localhost:3000/api/structures");
        assert_eq!(
            store.record_url("abc").unwrap(),
            "http://localhost:3000/api/structures/abc"
        );
        assert!(store.record_url("a/b").is_err());
    }

    #[test]
    fn test_save_request_shape() {
        let diagram = Diagram::new();
        let request = SaveRequest {
            id: "s1",
            name: "Demo",
            data: &diagram,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["id"], "s1");
        assert_eq!(value["data"]["relationships"], serde_json::json!([]));
    }

    #[test]
    fn test_parse_timestamp_error() {
        assert!(matches!(
            parse_timestamp("soon"),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn test_list_parses_sql_datetime() {
        let (base_url, server) = serve_once(
            200,
            r#"[{"id":"s2","name":"Newer","updated_at":"2025-06-01 09:30:00"},{"id":"s1","name":"Older","updated_at":"2025-05-01T08:00:00Z"}]"#,
        );

        let listed = HttpStore::new(base_url).list().unwrap();
        let request = server.join().unwrap();

        assert!(request.starts_with("GET /api/structures HTTP/1.1"), "{request}");
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, "s2");
        assert_eq!(
            listed[0].updated_at,
            Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap()
        );
        assert_eq!(listed[1].name, "Older");
    }

    #[test]
    fn test_load_decodes_string_data() {
        let (base_url, server) = serve_once(
            200,
            r#"{"id":"s1","name":"Demo","data":"{\"entities\":[],\"relationships\":[]}","updated_at":"2025-06-01 09:30:00"}"#,
        );

        let record = HttpStore::new(base_url).load("s1").unwrap().unwrap();
        let request = server.join().unwrap();

        assert!(request.starts_with("GET /api/structures/s1 HTTP/1.1"), "{request}");
        assert_eq!(record.id, "s1");
        assert_eq!(record.name, "Demo");
        assert!(record.data.is_empty());
    }

    #[test]
    fn test_load_not_found_is_none() {
        let (base_url, server) = serve_once(404, r#"{"error":"Not found"}"#);

        let loaded = HttpStore::new(base_url).load("missing").unwrap();
        server.join().unwrap();

        assert!(loaded.is_none());
    }

    #[test]
    fn test_server_error_is_status() {
        let (base_url, server) = serve_once(500, r#"{"error":"database locked"}"#);

        let err = HttpStore::new(base_url).load("s1").unwrap_err();
        server.join().unwrap();

        match err {
            StoreError::Status { status, body } => {
                assert_eq!(status, 500);
                assert!(body.contains("database locked"));
            }
            other => panic!("expected a status error, got {other:?}"),
        }
    }

    #[test]
    fn test_save_posts_record() {
        let (base_url, server) = serve_once(200, r#"{"success":true}"#);
        let mut diagram = Diagram::new();
        diagram.add_entity(
            strata_core::model::EntityType::DiscretionaryTrust,
            strata_core::shape::EntityShape::Rectangle,
        );

        HttpStore::new(base_url).save("s1", "Demo", &diagram).unwrap();
        let request = server.join().unwrap();

        assert!(request.starts_with("POST /api/structures HTTP/1.1"), "{request}");
        let body = request_body(&request);
        assert_eq!(body["id"], "s1");
        assert_eq!(body["name"], "Demo");
        assert_eq!(body["data"]["entities"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_delete_unknown_id_succeeds() {
        let (base_url, server) = serve_once(200, r#"{"success":true}"#);

        HttpStore::new(base_url).delete("never-saved").unwrap();
        let request = server.join().unwrap();

        assert!(request.starts_with("DELETE /api/structures/never-saved HTTP/1.1"), "{request}");
    }
}
