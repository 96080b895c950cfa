//! In-process stand-in for the Zenobase REST API.
//!
//! Serves one request per connection and records every request so tests can
//! assert on headers and on whether the network was touched at all.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use serde_json::{Value, json};
use zb_api::ClientConfig;

pub const USERNAME: &str = "erik";
pub const PASSWORD: &str = "secret";
pub const CLIENT_ID: &str = "client-1";

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

#[derive(Debug, Default)]
pub struct State {
    pub tokens: HashSet<String>,
    pub revoked: Vec<String>,
    pub buckets: Vec<Value>,
    pub events: HashMap<String, Vec<Value>>,
    pub requests: Vec<Recorded>,
    /// Leave `total` out of bucket pages.
    pub omit_total: bool,
    next_id: usize,
}

impl State {
    fn next_id(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }
}

pub struct FakeZenobase {
    addr: SocketAddr,
    state: Arc<Mutex<State>>,
}

impl FakeZenobase {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake server");
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(State::default()));
        let shared = Arc::clone(&state);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                serve(stream, &shared);
            }
        });
        Self { addr, state }
    }

    pub fn host(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            host: self.host(),
            timeout: Duration::from_secs(5),
            strict_limits: true,
        }
    }

    pub fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn request_count(&self) -> usize {
        self.state().requests.len()
    }

    pub fn seed_bucket(&self, label: &str) -> String {
        let mut state = self.state();
        let id = format!("bucket-{}", state.next_id());
        state
            .buckets
            .push(json!({"@id": id, "label": label, "description": ""}));
        id
    }
}

fn serve(stream: TcpStream, state: &Mutex<State>) {
    let Some(request) = read_request(&stream) else {
        return;
    };
    let (status, content_type, body) = {
        let mut state = state.lock().unwrap();
        state.requests.push(request.clone());
        route(&mut state, &request)
    };
    let mut stream = stream;
    let mut head = format!("HTTP/1.1 {status} Fake\r\n");
    if !body.is_empty() {
        head.push_str(&format!("Content-Type: {content_type}\r\n"));
    }
    head.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    ));
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body.as_bytes());
    let _ = stream.flush();
}

fn read_request(stream: &TcpStream) -> Option<Recorded> {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line).ok()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut headers = HashMap::new();
    loop {
        let mut header = String::new();
        reader.read_line(&mut header).ok()?;
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            headers.insert(name.trim().to_lowercase(), value.trim().to_string());
        }
    }

    let len = headers
        .get("content-length")
        .and_then(|len| len.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0; len];
    reader.read_exact(&mut body).ok()?;

    Some(Recorded {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

type Reply = (u16, &'static str, String);

fn json_reply(status: u16, value: &Value) -> Reply {
    (status, "application/json; charset=utf-8", value.to_string())
}

fn text_reply(status: u16, text: &str) -> Reply {
    (status, "text/plain", text.to_string())
}

fn route(state: &mut State, request: &Recorded) -> Reply {
    let (path, query) = request
        .path
        .split_once('?')
        .unwrap_or((request.path.as_str(), ""));

    if request.method == "POST" && path == "/oauth/token" {
        return issue_token(state, &request.body);
    }

    let authorized = request
        .headers
        .get("authorization")
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| state.tokens.contains(token));
    if !authorized {
        return json_reply(401, &json!({"error": "unauthorized"}));
    }

    let method = request.method.as_str();
    if method == "GET" && path == "/teapot" {
        return text_reply(418, "short and stout");
    }
    if method == "GET" && path == format!("/users/{CLIENT_ID}/buckets/") {
        return list_buckets(state, query);
    }
    if method == "POST" && path == "/buckets/" {
        let body: Value = serde_json::from_str(&request.body).unwrap_or(Value::Null);
        let id = format!("bucket-{}", state.next_id());
        let bucket = json!({
            "@id": id,
            "label": body["label"],
            "description": body["description"],
        });
        state.buckets.push(bucket.clone());
        return json_reply(201, &bucket);
    }
    if let Some(token) = path.strip_prefix("/authorizations/") {
        if method == "DELETE" && state.tokens.remove(token) {
            state.revoked.push(token.to_string());
            return text_reply(204, "");
        }
        return text_reply(404, "no such token");
    }
    if let Some(rest) = path.strip_prefix("/buckets/") {
        return match rest.strip_suffix('/') {
            Some(id) => bucket_events(state, method, id, &request.body),
            None => bucket_resource(state, method, rest),
        };
    }
    text_reply(404, "not found")
}

fn issue_token(state: &mut State, body: &str) -> Reply {
    let form: HashMap<&str, &str> = body
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .collect();
    let accepted = match form.get("grant_type").copied() {
        Some("password") => {
            form.get("username") == Some(&USERNAME) && form.get("password") == Some(&PASSWORD)
        }
        Some("client_credentials") => true,
        _ => false,
    };
    if !accepted {
        return json_reply(
            400,
            &json!({"error": "invalid_grant", "error_description": "Bad credentials"}),
        );
    }
    let token = format!("token-{}", state.next_id());
    state.tokens.insert(token.clone());
    json_reply(200, &json!({"access_token": token, "client_id": CLIENT_ID}))
}

fn list_buckets(state: &State, query: &str) -> Reply {
    let params: HashMap<&str, &str> = query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .collect();
    let offset: usize = params.get("offset").and_then(|v| v.parse().ok()).unwrap_or(0);
    let limit: usize = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(100);
    if limit > 100 {
        return text_reply(400, "limit must be at most 100");
    }
    let mut buckets = state.buckets.clone();
    buckets.sort_by(|a, b| a["label"].as_str().cmp(&b["label"].as_str()));
    let page: Vec<Value> = buckets.iter().skip(offset).take(limit).cloned().collect();
    if state.omit_total {
        return json_reply(200, &json!({"buckets": page}));
    }
    json_reply(200, &json!({"total": buckets.len(), "buckets": page}))
}

fn bucket_resource(state: &mut State, method: &str, id: &str) -> Reply {
    let position = state.buckets.iter().position(|b| b["@id"] == id);
    match (method, position) {
        ("GET", Some(idx)) => {
            let mut bucket = state.buckets[idx].clone();
            bucket["size"] = json!(state.events.get(id).map_or(0, Vec::len));
            json_reply(200, &bucket)
        }
        ("DELETE", Some(idx)) => {
            state.buckets.remove(idx);
            state.events.remove(id);
            text_reply(204, "")
        }
        _ => text_reply(404, "no such bucket"),
    }
}

fn bucket_events(state: &mut State, method: &str, id: &str, body: &str) -> Reply {
    if !state.buckets.iter().any(|b| b["@id"] == id) {
        return text_reply(404, "no such bucket");
    }
    match method {
        "GET" => {
            let events = state.events.get(id).cloned().unwrap_or_default();
            json_reply(200, &json!({"total": events.len(), "events": events}))
        }
        "POST" => {
            let body: Value = serde_json::from_str(body).unwrap_or(Value::Null);
            let stored = state.events.entry(id.to_string()).or_default();
            match body.get("events").and_then(Value::as_array) {
                Some(batch) => stored.extend(batch.iter().cloned()),
                None => stored.push(body),
            }
            text_reply(201, "created")
        }
        _ => text_reply(405, "method not allowed"),
    }
}
