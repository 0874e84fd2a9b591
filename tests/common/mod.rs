#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

/// Minimal DNS-over-HTTPS JSON endpoint on 127.0.0.1.
///
/// Each queried `name` is answered from the table given to [`MockDoh::start`];
/// names not in the table get an NXDOMAIN body without an `Answer` section.
pub struct MockDoh {
    pub url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockDoh {
    pub fn start(responses: HashMap<String, (u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&requests);

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                let Ok(read_half) = stream.try_clone() else { continue };
                let mut reader = BufReader::new(read_half);

                let mut request_line = String::new();
                if reader.read_line(&mut request_line).is_err() {
                    continue;
                }
                loop {
                    let mut line = String::new();
                    match reader.read_line(&mut line) {
                        Ok(0) | Err(_) => break,
                        Ok(_) if line == "\r\n" || line == "\n" => break,
                        Ok(_) => {}
                    }
                }

                log.lock().unwrap().push(request_line.trim_end().to_string());
                let domain = query_param(&request_line, "name").unwrap_or_default();
                let (status, body) = responses
                    .get(&domain)
                    .cloned()
                    .unwrap_or_else(|| (200, nxdomain()));

                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/dns-json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    if status == 200 { "OK" } else { "Error" },
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
                let _ = stream.flush();
            }
        });

        MockDoh {
            url: format!("http://{}/resolve", addr),
            requests,
        }
    }

    /// Request lines received so far, e.g. `GET /resolve?name=example.com&type=MX HTTP/1.1`
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Domains queried so far, in order
    pub fn queried_domains(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter_map(|line| query_param(line, "name"))
            .collect()
    }
}

fn query_param(request_line: &str, key: &str) -> Option<String> {
    let target = request_line.split_whitespace().nth(1)?;
    let (_, query) = target.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.to_string())
}

/// Body with one MX answer for `domain`
pub fn mx_answer(domain: &str) -> String {
    format!(
        r#"{{"Status":0,"Answer":[{{"name":"{d}.","type":15,"TTL":300,"data":"10 mx.{d}."}}]}}"#,
        d = domain
    )
}

/// Body for a name that does not exist
pub fn nxdomain() -> String {
    r#"{"Status":3,"Authority":[{"name":"test.","type":6,"TTL":60,"data":"ns.test. hostmaster.test. 1 1 1 1 1"}]}"#.to_string()
}

/// A resolver table: example.com has MX, nomx.test has none, broken.test fails
pub fn standard_responses() -> HashMap<String, (u16, String)> {
    let mut responses = HashMap::new();
    responses.insert("example.com".to_string(), (200, mx_answer("example.com")));
    responses.insert("nomx.test".to_string(), (200, r#"{"Status":0}"#.to_string()));
    responses.insert("broken.test".to_string(), (500, "upstream failure".to_string()));
    responses.insert("garbled.test".to_string(), (200, "<html>not json</html>".to_string()));
    responses
}

/// Keep any proxy configured in the environment away from the loopback mock
pub fn bypass_proxy() {
    static ONCE: std::sync::Once = std::sync::Once::new();
    ONCE.call_once(|| std::env::set_var("NO_PROXY", "127.0.0.1,localhost"));
}
