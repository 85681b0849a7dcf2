//! actix-web <-> reqwest conversion helpers shared by the proxy route.
//!
//! `dispatcher::{header_name, header_value}` already handle the raw
//! `HeaderName`/`HeaderValue` parsing; this module bridges the two HTTP
//! crates' method and header-map types around that.

use crate::core::dispatcher::{header_name, header_value};

/// Converts an actix-web request method into the `reqwest::Method` the
/// dispatcher forwards with. actix validates methods on parse, so this only
/// fails for methods reqwest itself rejects (none, in practice).
pub fn to_reqwest_method(method: &actix_web::http::Method) -> Option<reqwest::Method> {
    reqwest::Method::from_bytes(method.as_str().as_bytes()).ok()
}

/// Converts an actix-web request's headers into a `reqwest::header::HeaderMap`.
/// Headers that fail to round-trip (neither side's format is a strict
/// superset of the other) are skipped rather than failing the whole request.
pub fn to_reqwest_headers(headers: &actix_web::http::header::HeaderMap) -> reqwest::header::HeaderMap {
    let mut out = reqwest::header::HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        let Some(name) = header_name(name.as_str()) else {
            continue;
        };
        let Some(value) = header_value(value.as_bytes()) else {
            continue;
        };
        out.append(name, value);
    }
    out
}

/// Converts a `reqwest::header::HeaderMap` (the upstream response) back into
/// actix-web's header types, for copying onto the outgoing `HttpResponse`.
pub fn to_actix_headers(headers: &reqwest::header::HeaderMap) -> Vec<(actix_web::http::header::HeaderName, actix_web::http::header::HeaderValue)> {
    let mut out = Vec::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        let Ok(name) = actix_web::http::header::HeaderName::from_bytes(name.as_str().as_bytes()) else {
            continue;
        };
        let Ok(value) = actix_web::http::header::HeaderValue::from_bytes(value.as_bytes()) else {
            continue;
        };
        out.push((name, value));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_method() {
        let method = to_reqwest_method(&actix_web::http::Method::POST).unwrap();
        assert_eq!(method, reqwest::Method::POST);
    }

    #[test]
    fn converts_headers_round_trip() {
        let mut headers = actix_web::http::header::HeaderMap::new();
        headers.insert(
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::HeaderValue::from_static("application/json"),
        );
        let converted = to_reqwest_headers(&headers);
        assert_eq!(converted.get("content-type").unwrap(), "application/json");
    }

    #[test]
    fn converts_response_headers_back_to_actix() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("x-upstream", reqwest::header::HeaderValue::from_static("yes"));
        let converted = to_actix_headers(&headers);
        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].0.as_str(), "x-upstream");
    }
}
