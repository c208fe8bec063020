//! cURL export of prepared test requests

use crate::models::{HttpMethod, TestRequest};

/// Format a test request as a cURL command, with the same headers the
/// HTTP backend sends
pub fn to_curl(request: &TestRequest) -> String {
    let mut parts = vec!["curl".to_string()];

    // Method
    if request.method != HttpMethod::GET {
        parts.push(format!("-X {}", request.method.as_str()));
    }

    // URL
    parts.push(format!("'{}'", quote(&request.url)));

    // Headers
    parts.push("-H 'Accept: application/json'".to_string());

    // Body
    if let Some(body) = &request.body {
        parts.push("-H 'Content-Type: application/json'".to_string());
        parts.push(format!("-d '{}'", quote(body)));
    }

    parts.join(" \\\n  ")
}

fn quote(text: &str) -> String {
    text.replace('\'', "'\\''")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_has_no_method_flag() {
        let request = TestRequest {
            url: "http://127.0.0.1:8000/api/users/7".into(),
            method: HttpMethod::GET,
            body: None,
        };
        assert_eq!(
            to_curl(&request),
            "curl \\\n  'http://127.0.0.1:8000/api/users/7' \\\n  -H 'Accept: application/json'"
        );
    }

    #[test]
    fn test_post_body_is_quoted() {
        let request = TestRequest {
            url: "http://h/users".into(),
            method: HttpMethod::POST,
            body: Some(r#"{"name":"O'Brien"}"#.into()),
        };
        let curl = to_curl(&request);
        assert!(curl.starts_with("curl \\\n  -X POST"));
        assert!(curl.contains("-H 'Content-Type: application/json'"));
        assert!(curl.ends_with(r#"-d '{"name":"O'\''Brien"}'"#));
    }
}
