//! Shared test support: a scripted HTTP stub standing in for the backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::time::Duration;

use url::Url;

use crate::config::AppConfig;
use crate::supabase::SupabaseClient;

/// Serve a fixed sequence of canned responses, one connection each, then
/// stop accepting. Returns the base URL to point a client at.
pub fn serve_script(responses: Vec<(&'static str, &'static str)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        for (status, body) in responses {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            read_request_head(&mut stream);
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    format!("http://{addr}")
}

/// Read until the end of the request headers. The canned responses never
/// depend on the request body, so whatever arrives with the headers is
/// simply discarded.
fn read_request_head(stream: &mut TcpStream) {
    let mut seen = Vec::new();
    let mut chunk = [0u8; 1024];

    while !seen.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return,
            Ok(n) => seen.extend_from_slice(&chunk[..n]),
        }
    }
}

/// Configuration pointing at a stub (or dead) address.
pub fn stub_config(base_url: &str) -> AppConfig {
    AppConfig {
        supabase_url: Url::parse(base_url).unwrap(),
        anon_key: "eyJhbGciOiJIUzI1NiJ9.x7Kq3mWn9pZt2rYv".to_string(),
        access_token: None,
        bootstrap_timeout: Duration::from_secs(5),
    }
}

/// A backend client pointed at the given stub address.
pub fn stub_client(base_url: &str) -> SupabaseClient {
    SupabaseClient::new(&stub_config(base_url))
}
