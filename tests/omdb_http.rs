//! `OmdbClient` against a throwaway local HTTP listener.

use movie_notes::config::ProviderConfig;
use movie_notes::provider::{Lookup, MovieProvider, OmdbClient};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

/// Serve each canned `(status, body)` once, in order, and return the
/// request lines that were received.
fn serve(responses: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for (status, body) in responses {
            let (mut stream, _) = listener.accept().unwrap();

            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let text = String::from_utf8_lossy(&request);
            seen.push(text.lines().next().unwrap_or_default().to_string());

            let reason = if status == 200 { "OK" } else { "Error" };
            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                reason,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
        }
        seen
    });

    (format!("http://{}/", addr), handle)
}

fn client(base_url: String) -> OmdbClient {
    let config = ProviderConfig {
        base_url,
        timeout_secs: 5,
    };
    OmdbClient::new(&config, "test-key").unwrap()
}

const BLADE_RUNNER: &str = r#"{"Title":"Blade Runner","imdbID":"tt0083658","imdbRating":"8.1","imdbVotes":"800,000","Metascore":"84","Ratings":[{"Source":"Rotten Tomatoes","Value":"89%"}],"Response":"True"}"#;

#[test]
fn test_lookup_by_title_found() {
    let (url, server) = serve(vec![(200, BLADE_RUNNER)]);

    let result = client(url).lookup_by_title("Blade Runner").unwrap();

    let Lookup::Found(record) = result else {
        panic!("expected a record");
    };
    assert_eq!(record.id.as_deref(), Some("tt0083658"));
    assert_eq!(record.ratings[0].value, "89%");

    let requests = server.join().unwrap();
    assert!(requests[0].starts_with("GET /?"), "request: {}", requests[0]);
    assert!(requests[0].contains("t=Blade"), "request: {}", requests[0]);
    assert!(requests[0].contains("apikey=test-key"));
}

#[test]
fn test_lookup_by_id_uses_id_parameter() {
    let (url, server) = serve(vec![(200, BLADE_RUNNER)]);

    let result = client(url).lookup_by_id("tt0083658").unwrap();
    assert!(matches!(result, Lookup::Found(_)));

    let requests = server.join().unwrap();
    assert!(requests[0].contains("i=tt0083658"), "request: {}", requests[0]);
}

#[test]
fn test_clean_miss_is_not_found() {
    let (url, server) = serve(vec![(200, r#"{"Response":"False","Error":"Movie not found!"}"#)]);

    let result = client(url).lookup_by_title("Nope").unwrap();
    assert_eq!(result, Lookup::NotFound);
    server.join().unwrap();
}

#[test]
fn test_non_success_status_is_an_error() {
    let (url, server) = serve(vec![(401, r#"{"Response":"False","Error":"Invalid API key!"}"#)]);

    let err = client(url).lookup_by_title("Heat").unwrap_err();
    assert!(err.to_string().contains("401"), "error: {}", err);
    server.join().unwrap();
}

#[test]
fn test_undecodable_body_is_an_error() {
    let (url, server) = serve(vec![(200, "<html>upstream timeout</html>")]);

    let err = client(url).lookup_by_id("tt0083658").unwrap_err();
    assert!(err.to_string().contains("decode"), "error: {}", err);
    server.join().unwrap();
}
