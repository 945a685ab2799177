//! Canonical request string construction for SharedKey signing.
//!
//! The canonical string is a newline-joined serialization of the
//! security-relevant parts of a request, built from three blocks in a fixed
//! order:
//!
//! ```text
//! METHOD\n
//! Content-Encoding\n
//! Content-Language\n
//! Content-Length\n
//! Content-MD5\n
//! Content-Type\n
//! Date\n
//! If-Modified-Since\n
//! If-Match\n
//! If-None-Match\n
//! If-Unmodified-Since\n
//! Range\n
//! x-ms-name:value\n          (one line per custom header, sorted)
//! /account/path\n
//! name:value1,value2\n       (one line per query parameter, sorted)
//! ```
//!
//! Absent fields in the fixed header block emit an empty line rather than
//! being omitted, so the line positions are invariant. The same logical
//! request always canonicalizes to the identical byte sequence regardless of
//! header insertion order, header name casing, or query parameter insertion
//! order.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::DateTime;
use http::{HeaderMap, Method, Uri};

/// The reserved header prefix whose headers are folded into the signature.
pub const CUSTOM_HEADER_PREFIX: &str = "x-ms-";

/// The fixed-order request headers of the standard header block, after the
/// method and content headers.
const STANDARD_HEADERS: &[&str] = &[
    "if-modified-since",
    "if-match",
    "if-none-match",
    "if-unmodified-since",
    "range",
];

/// Build the full canonical request string for the given request components.
///
/// The result concatenates the standard header block, the custom header block,
/// and the resource block, each line newline-terminated.
///
/// # Examples
///
/// ```
/// use sharedkey_auth::canonical::build_canonical_request;
///
/// let req = http::Request::builder()
///     .method("GET")
///     .uri("http://localhost/api/Subscribers")
///     .body(())
///     .unwrap();
/// let canonical = build_canonical_request(req.method(), req.uri(), req.headers(), "barryd");
/// assert!(canonical.starts_with("GET\n"));
/// assert!(canonical.ends_with("/barryd/api/Subscribers\n"));
/// ```
#[must_use]
pub fn build_canonical_request(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    account: &str,
) -> String {
    let mut canonical = canonicalize_standard_headers(method, headers);
    canonical.push_str(&canonicalize_custom_headers(headers));
    canonical.push_str(&canonicalize_resource(
        uri.path(),
        uri.query().unwrap_or(""),
        account,
    ));
    canonical
}

/// Build the fixed-order standard header block.
///
/// Every field contributes exactly one newline-terminated line; absent headers
/// contribute an empty line. A bodyless request therefore still emits the
/// empty `Content-Length`, `Content-MD5`, and `Content-Type` lines, keeping
/// the block positionally stable.
#[must_use]
pub fn canonicalize_standard_headers(method: &Method, headers: &HeaderMap) -> String {
    let mut block = String::new();
    append_line(&mut block, &method.as_str().to_uppercase());
    append_line(&mut block, header_value(headers, "content-encoding"));
    append_line(&mut block, header_value(headers, "content-language"));
    append_line(&mut block, header_value(headers, "content-length"));
    append_line(&mut block, &normalized_content_md5(headers));
    append_line(&mut block, header_value(headers, "content-type"));
    append_line(&mut block, &rfc1123_date(headers));
    for name in STANDARD_HEADERS {
        append_line(&mut block, header_value(headers, name));
    }
    block
}

/// Build the custom header block from all `x-ms-` prefixed headers.
///
/// Headers are deduplicated by name (the first-seen value wins when a header
/// occurs multiple times), sorted lexicographically ascending by lowercased
/// name, and emitted as `name:value` lines. Values have leading whitespace
/// trimmed, embedded tabs replaced with a single space, and embedded CR-LF
/// sequences removed.
#[must_use]
pub fn canonicalize_custom_headers(headers: &HeaderMap) -> String {
    // HeaderName stores names lowercased, so sorting the map keys yields the
    // required case-insensitive lexicographic order directly.
    let mut custom: BTreeMap<&str, String> = BTreeMap::new();
    for (name, value) in headers {
        if name.as_str().starts_with(CUSTOM_HEADER_PREFIX) {
            let scrubbed = scrub_value(value.to_str().unwrap_or(""));
            custom.entry(name.as_str()).or_insert(scrubbed);
        }
    }

    let mut block = String::new();
    for (name, value) in &custom {
        block.push_str(name);
        block.push(':');
        block.push_str(value);
        block.push('\n');
    }
    block
}

/// Build the resource block: the account-qualified path followed by one line
/// per query parameter.
///
/// Query parameters are percent-decoded before grouping, deduplicated by
/// lowercased name, sorted lexicographically ascending, and rendered as
/// `name:value1,value2,...` with repeated values comma-joined in arrival
/// order.
#[must_use]
pub fn canonicalize_resource(path: &str, query: &str, account: &str) -> String {
    let mut block = String::new();
    block.push('/');
    block.push_str(account);
    block.push_str(path);
    block.push('\n');

    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in form_urlencoded::parse(query.as_bytes()) {
        params
            .entry(name.to_lowercase())
            .or_default()
            .push(value.into_owned());
    }

    for (name, values) in &params {
        block.push_str(name);
        block.push(':');
        block.push_str(&values.join(","));
        block.push('\n');
    }
    block
}

/// Append a newline-terminated line to the canonical string.
fn append_line(canonical: &mut String, value: &str) {
    canonical.push_str(value);
    canonical.push('\n');
}

/// Extract a header value as a string, returning an empty string when the
/// header is missing or not valid UTF-8.
fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}

/// Normalize the declared `Content-MD5` header by decoding and re-encoding it
/// as base64. An undecodable value canonicalizes as empty, which can never
/// match a digest the sender actually computed.
fn normalized_content_md5(headers: &HeaderMap) -> String {
    BASE64
        .decode(header_value(headers, "content-md5"))
        .map(|digest| BASE64.encode(digest))
        .unwrap_or_default()
}

/// Re-render the `Date` header as RFC 1123 in the invariant culture, or an
/// empty string when the header is missing or unparseable.
fn rfc1123_date(headers: &HeaderMap) -> String {
    DateTime::parse_from_rfc2822(header_value(headers, "date"))
        .map(|date| {
            date.to_utc()
                .format("%a, %d %b %Y %H:%M:%S GMT")
                .to_string()
        })
        .unwrap_or_default()
}

/// Unfold a custom header value: trim leading whitespace, replace embedded
/// tabs with a single space, and strip CR-LF sequences.
fn scrub_value(value: &str) -> String {
    value.trim_start().replace('\t', " ").replace("\r\n", "")
}
