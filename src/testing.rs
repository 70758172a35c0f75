//! In-memory API for unit tests
//!
//! Serves registered lists page by page, answers `start=-1` with the final
//! page, unpacks batch envelopes, and records every exchange so tests can
//! count round trips.

use crate::client::{ApiClient, ClientConfig};
use crate::error::{Error, Result};
use crate::http::{RetryPolicy, Transport};
use crate::request::Request;
use crate::types::{JsonObject, JsonValue, BATCH_METHOD, MAX_BATCH_SIZE, START_PARAM};
use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

pub(crate) struct FakeApi {
    page_size: usize,
    counted: bool,
    report_start: bool,
    lists: Mutex<HashMap<String, Vec<JsonValue>>>,
    values: Mutex<HashMap<String, JsonValue>>,
    broken: Mutex<HashSet<String>>,
    failures: Mutex<VecDeque<Error>>,
    exchanges: Mutex<Vec<Exchange>>,
}

/// One recorded round trip
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Exchange {
    pub method: String,
    /// Commands of a batch envelope, or the single call's command
    pub commands: Vec<String>,
}

impl FakeApi {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            counted: true,
            report_start: true,
            lists: Mutex::default(),
            values: Mutex::default(),
            broken: Mutex::default(),
            failures: Mutex::default(),
            exchanges: Mutex::default(),
        }
    }

    /// Stop reporting `total`
    pub fn uncounted(mut self) -> Self {
        self.counted = false;
        self
    }

    /// Stop reporting `start` on responses
    pub fn without_start(mut self) -> Self {
        self.report_start = false;
        self
    }

    /// Register a list behind `request` (its `start` is ignored)
    pub fn list(self, request: &Request, items: Vec<JsonValue>) -> Self {
        self.lists
            .lock()
            .unwrap()
            .insert(list_key(&request.query()).0, items);
        self
    }

    /// Register a fixed result for a non-list method
    pub fn value(self, method: &str, value: JsonValue) -> Self {
        self.values.lock().unwrap().insert(method.to_string(), value);
        self
    }

    /// Make every call to the list behind `request` fail with an API error
    pub fn broken(self, request: &Request) -> Self {
        self.broken
            .lock()
            .unwrap()
            .insert(list_key(&request.query()).0);
        self
    }

    /// Fail the next exchange with `error`
    pub fn fail_next(&self, error: Error) {
        self.failures.lock().unwrap().push_back(error);
    }

    pub fn round_trips(&self) -> usize {
        self.exchanges.lock().unwrap().len()
    }

    pub fn exchanges(&self) -> Vec<Exchange> {
        self.exchanges.lock().unwrap().clone()
    }

    fn serve(&self, command: &str) -> std::result::Result<Served, JsonValue> {
        let (key, start) = list_key(command);
        if self.broken.lock().unwrap().contains(&key) {
            return Err(json!({
                "error": "ACCESS_DENIED",
                "error_description": "Access denied"
            }));
        }

        let method = command.split('?').next().unwrap_or(command);
        if let Some(value) = self.values.lock().unwrap().get(method) {
            return Ok(Served::plain(value.clone()));
        }

        let lists = self.lists.lock().unwrap();
        let items = lists.get(&key).map(Vec::as_slice).unwrap_or_default();
        let len = items.len();
        let start = match start {
            Some(-1) if len == 0 => 0,
            Some(-1) => (len - 1) / self.page_size * self.page_size,
            Some(start) => start.max(0) as usize,
            None => 0,
        };
        let end = (start + self.page_size).min(len);
        let page = items.get(start..end).unwrap_or_default().to_vec();

        Ok(Served {
            result: JsonValue::Array(page),
            total: self.counted.then_some(len),
            next: (end < len).then_some(end),
            start: self.report_start.then_some(start),
        })
    }

    fn record(&self, method: &str, commands: Vec<String>) {
        self.exchanges.lock().unwrap().push(Exchange {
            method: method.to_string(),
            commands,
        });
    }

    fn single(&self, method: &str, parameters: &JsonValue) -> JsonValue {
        let parameters = parameters.as_object().cloned().unwrap_or_default();
        let command = Request::with_parameters(method, parameters).query();
        self.record(method, vec![command.clone()]);

        match self.serve(&command) {
            Ok(served) => {
                let mut body = JsonObject::new();
                body.insert("result".into(), served.result);
                if let Some(total) = served.total {
                    body.insert("total".into(), total.into());
                }
                if let Some(next) = served.next {
                    body.insert("next".into(), next.into());
                }
                if let Some(start) = served.start {
                    body.insert("start".into(), start.into());
                }
                JsonValue::Object(body)
            }
            Err(error) => error,
        }
    }

    fn batch(&self, envelope: &JsonValue) -> JsonValue {
        let halt = envelope["halt"].as_bool().unwrap_or(false);
        let cmd = envelope["cmd"].as_object().cloned().unwrap_or_default();
        assert!(cmd.len() <= MAX_BATCH_SIZE, "batch of {} calls", cmd.len());

        let commands: Vec<(String, String)> = cmd
            .into_iter()
            .map(|(key, command)| (key, command.as_str().unwrap_or_default().to_string()))
            .collect();
        self.record(
            BATCH_METHOD,
            commands.iter().map(|(_, command)| command.clone()).collect(),
        );

        let mut result = JsonObject::new();
        let mut errors = JsonObject::new();
        let mut totals = JsonObject::new();
        let mut nexts = JsonObject::new();
        let mut starts = JsonObject::new();
        for (key, command) in commands {
            match self.serve(&command) {
                Ok(served) => {
                    result.insert(key.clone(), served.result);
                    if let Some(total) = served.total {
                        totals.insert(key.clone(), total.into());
                    }
                    if let Some(next) = served.next {
                        nexts.insert(key.clone(), next.into());
                    }
                    if let Some(start) = served.start {
                        starts.insert(key, start.into());
                    }
                }
                Err(error) => {
                    errors.insert(key, error);
                    if halt {
                        break;
                    }
                }
            }
        }

        json!({
            "result": {
                "result": php_map(result),
                "result_error": php_map(errors),
                "result_total": php_map(totals),
                "result_next": php_map(nexts),
                "result_start": php_map(starts),
                "result_time": [],
            }
        })
    }
}

#[async_trait]
impl Transport for FakeApi {
    async fn send(&self, method: &str, parameters: &JsonValue) -> Result<JsonValue> {
        if let Some(error) = self.failures.lock().unwrap().pop_front() {
            self.record(method, Vec::new());
            return Err(error);
        }
        if method == BATCH_METHOD {
            Ok(self.batch(parameters))
        } else {
            Ok(self.single(method, parameters))
        }
    }
}

struct Served {
    result: JsonValue,
    total: Option<usize>,
    next: Option<usize>,
    start: Option<usize>,
}

impl Served {
    fn plain(result: JsonValue) -> Self {
        Self {
            result,
            total: None,
            next: None,
            start: None,
        }
    }
}

/// Empty maps travel as `[]`
fn php_map(map: JsonObject) -> JsonValue {
    if map.is_empty() {
        json!([])
    } else {
        JsonValue::Object(map)
    }
}

/// Identify a list by its command without `start`; also return that `start`
fn list_key(command: &str) -> (String, Option<i64>) {
    let (method, query) = command.split_once('?').unwrap_or((command, ""));
    let mut start = None;
    let mut pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .filter(|(name, value)| {
            if name == START_PARAM {
                start = value.parse().ok();
                false
            } else {
                true
            }
        })
        .collect();
    pairs.sort();

    let query: Vec<String> = pairs
        .into_iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect();
    (format!("{method}?{}", query.join("&")), start)
}

/// `count` numbered items: `{"ID": 1}`, `{"ID": 2}`, ...
pub(crate) fn items(count: usize) -> Vec<JsonValue> {
    (1..=count).map(|id| json!({ "ID": id })).collect()
}

/// Items tagged with the reference they belong to
pub(crate) fn tagged_items(tag: &str, count: usize) -> Vec<JsonValue> {
    (1..=count).map(|id| json!({ "ID": id, "REF": tag })).collect()
}

/// Config that retries without sleeping
pub(crate) fn fast_config() -> ClientConfig {
    ClientConfig::builder()
        .retry(RetryPolicy::default().with_max_attempts(3).without_delay())
        .build()
}

pub(crate) fn client(api: &Arc<FakeApi>, config: ClientConfig) -> ApiClient {
    ApiClient::with_transport(api.clone(), config).unwrap()
}
