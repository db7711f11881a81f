//! Request fingerprints
//!
//! A fingerprint is the SHA-256 of a canonical JSON rendering of the
//! request: upper-cased method, URL path, selected headers, and the body
//! with floating-point noise folded away. Requests differing only in
//! trailing float precision share a fingerprint; any other difference,
//! including whitespace, does not.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::OnceLock;

use http::{HeaderMap, Method};
use regex::{Captures, Regex};
use serde_json::{Map, Number, Value};
use sha2::{Digest, Sha256};
use tapedeck_config::FingerprintConfig;
use url::Url;

/// Fingerprint of a request
pub fn fingerprint(
    method: &Method,
    url: &str,
    headers: &HeaderMap,
    body: &Value,
    options: &FingerprintConfig,
) -> String {
    let selected: Map<String, Value> = options
        .include_headers
        .iter()
        .filter_map(|name| {
            let value = headers.get(name.as_str())?.to_str().ok()?;
            Some((name.to_ascii_lowercase(), Value::from(value)))
        })
        .collect();

    let mut payload = Map::new();
    payload.insert("method".into(), method.as_str().to_ascii_uppercase().into());
    payload.insert("endpoint".into(), endpoint(url).into());
    payload.insert("headers".into(), Value::Object(selected));
    payload.insert("body".into(), normalize(body, options.float_precision));

    let mut canonical = String::new();
    write_canonical(&mut canonical, &Value::Object(payload));

    let hash = Sha256::digest(canonical.as_bytes());
    format!("{hash:x}")
}

/// Path component of a URL; relative URLs are used up to any query
pub fn endpoint(url: &str) -> String {
    Url::parse(url).map_or_else(
        |_| url.split(['?', '#']).next().unwrap_or_default().to_owned(),
        |parsed| parsed.path().to_owned(),
    )
}

/// Fold float noise out of a JSON value
///
/// Floats are rounded to `precision` places. Decimals embedded in strings
/// are rewritten at that precision when they carry more fractional digits.
pub fn normalize(value: &Value, precision: u32) -> Value {
    match value {
        Value::Number(number) if number.is_f64() => round_number(number, precision),
        Value::String(text) => Value::String(normalize_text(text, precision)),
        Value::Array(items) => items.iter().map(|item| normalize(item, precision)).collect(),
        Value::Object(object) => Value::Object(
            object
                .iter()
                .map(|(key, item)| (key.clone(), normalize(item, precision)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn round_number(number: &Number, precision: u32) -> Value {
    let Some(float) = number.as_f64() else {
        return Value::Number(number.clone());
    };
    let factor = 10_f64.powi(i32::try_from(precision).unwrap_or(i32::MAX));
    let rounded = (float * factor).round() / factor;
    Number::from_f64(rounded).map_or_else(|| Value::Number(number.clone()), Value::Number)
}

fn normalize_text(text: &str, precision: u32) -> String {
    fn decimal() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new(r"(-?\d+)\.(\d+)").expect("must be valid regex"))
    }

    let places = usize::try_from(precision).unwrap_or(usize::MAX);
    decimal()
        .replace_all(text, |captures: &Captures<'_>| {
            if captures[2].len() <= places {
                captures[0].to_owned()
            } else {
                round_decimal(&captures[1], &captures[2], places)
            }
        })
        .into_owned()
}

/// Round a decimal literal half-up on its digits, so long integer parts
/// keep every digit
fn round_decimal(whole: &str, fraction: &str, places: usize) -> String {
    let (sign, whole) = whole.strip_prefix('-').map_or(("", whole), |rest| ("-", rest));
    let mut digits: Vec<u8> = whole.bytes().chain(fraction.bytes().take(places)).collect();

    if fraction.as_bytes().get(places).is_some_and(|digit| *digit >= b'5') {
        let mut carry = true;
        for digit in digits.iter_mut().rev() {
            if *digit == b'9' {
                *digit = b'0';
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, b'1');
        }
    }

    let (whole, fraction) = digits.split_at(digits.len() - places);
    let mut out: String = sign.to_owned();
    out.extend(whole.iter().map(|&digit| char::from(digit)));
    if !fraction.is_empty() {
        out.push('.');
        out.extend(fraction.iter().map(|&digit| char::from(digit)));
    }
    out
}

/// Compact JSON with object keys in sorted order
fn write_canonical(out: &mut String, value: &Value) {
    match value {
        Value::Object(object) => {
            let sorted: BTreeMap<&String, &Value> = object.iter().collect();
            out.push('{');
            for (i, (key, item)) in sorted.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_scalar(out, &Value::String(key.clone()));
                out.push(':');
                write_canonical(out, item);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(out, item);
            }
            out.push(']');
        }
        scalar => write_scalar(out, scalar),
    }
}

fn write_scalar(out: &mut String, value: &Value) {
    let _ = write!(out, "{value}");
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const URL: &str = "http://test/v1/chat/completions";

    fn hash(body: &Value) -> String {
        fingerprint(&Method::POST, URL, &HeaderMap::new(), body, &FingerprintConfig::default())
    }

    fn tool_message(content: &str) -> Value {
        json!({"messages": [{"role": "tool", "content": content}]})
    }

    #[test]
    fn identical_requests_match() {
        let body = json!({"model": "llama3.2:3b", "messages": [{"role": "user", "content": "Hello world"}], "temperature": 0.7});
        assert_eq!(hash(&body), hash(&body.clone()));
        assert_eq!(hash(&body).len(), 64);
    }

    #[test]
    fn different_content_differs() {
        let a = json!({"messages": [{"role": "user", "content": "Hello world"}]});
        let b = json!({"messages": [{"role": "user", "content": "Different message"}]});
        assert_ne!(hash(&a), hash(&b));
    }

    #[test]
    fn whitespace_is_significant() {
        assert_ne!(
            hash(&json!({"content": "Hello world"})),
            hash(&json!({"content": "Hello  world"}))
        );
    }

    #[test]
    fn float_noise_is_folded() {
        assert_eq!(hash(&json!({"temperature": 0.700_000_1})), hash(&json!({"temperature": 0.7})));
        assert_ne!(hash(&json!({"temperature": 0.7})), hash(&json!({"temperature": 0.8})));
    }

    #[test]
    fn embedded_decimals_are_folded() {
        assert_eq!(
            hash(&tool_message("score: 0.7472640164649847")),
            hash(&tool_message("score: 0.74726414959878"))
        );
        assert_eq!(
            hash(&tool_message("score: 0.662477492560699")),
            hash(&tool_message("score: 0.6624775971970099"))
        );
        assert_ne!(hash(&tool_message("score: 0.75")), hash(&tool_message("score: 0.76")));
    }

    #[test]
    fn short_decimals_are_untouched() {
        assert_eq!(normalize_text("version 1.25 of 3", 5), "version 1.25 of 3");
        assert_eq!(normalize_text("x=-2.1234567", 3), "x=-2.123");
    }

    #[test]
    fn long_integer_parts_keep_every_digit() {
        assert_eq!(
            normalize_text("123456789012345678901234567890.1234567", 5),
            "123456789012345678901234567890.12346"
        );
        assert_ne!(
            hash(&tool_message("123456789012345678901234567890.1234567")),
            hash(&tool_message("123456789012345678901234567891.1234567"))
        );
    }

    #[test]
    fn rounding_carries_into_the_integer_part() {
        assert_eq!(normalize_text("9.9999996", 5), "10.00000");
        assert_eq!(normalize_text("-0.1999996", 5), "-0.20000");
        assert_eq!(normalize_text("2.5", 0), "3");
    }

    #[test]
    fn key_order_is_irrelevant() {
        let a: Value = serde_json::from_str(r#"{"model": "m", "temperature": 0.1}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"temperature": 0.1, "model": "m"}"#).unwrap();
        assert_eq!(hash(&a), hash(&b));
    }

    #[test]
    fn only_the_url_path_counts() {
        let body = json!({"model": "m"});
        let options = FingerprintConfig::default();
        let headers = HeaderMap::new();
        let local = fingerprint(&Method::POST, "http://localhost:11434/v1/chat/completions", &headers, &body, &options);
        let remote = fingerprint(&Method::POST, "https://api.openai.com/v1/chat/completions", &headers, &body, &options);
        let other = fingerprint(&Method::POST, "http://localhost:11434/v1/embeddings", &headers, &body, &options);

        assert_eq!(local, remote);
        assert_ne!(local, other);
        assert_eq!(endpoint("/v1/models?limit=2"), "/v1/models");
    }

    #[test]
    fn method_case_is_ignored_but_method_counts() {
        let body = json!({});
        let options = FingerprintConfig::default();
        let headers = HeaderMap::new();
        let get = fingerprint(&Method::GET, URL, &headers, &body, &options);
        let lowercase = fingerprint(&Method::from_bytes(b"get").unwrap(), URL, &headers, &body, &options);
        let post = fingerprint(&Method::POST, URL, &headers, &body, &options);

        assert_eq!(get, lowercase);
        assert_ne!(get, post);
    }

    #[test]
    fn only_selected_headers_count() {
        let body = json!({"model": "m"});
        let options = FingerprintConfig {
            include_headers: vec!["X-Provider".into()],
            float_precision: 5,
        };

        let mut ollama = HeaderMap::new();
        ollama.insert("x-provider", "ollama".parse().unwrap());
        ollama.insert("authorization", "Bearer a".parse().unwrap());
        let mut ollama_other_key = ollama.clone();
        ollama_other_key.insert("authorization", "Bearer b".parse().unwrap());
        let mut openai = HeaderMap::new();
        openai.insert("x-provider", "openai".parse().unwrap());

        let hash = |headers: &HeaderMap| fingerprint(&Method::POST, URL, headers, &body, &options);
        assert_eq!(hash(&ollama), hash(&ollama_other_key));
        assert_ne!(hash(&ollama), hash(&openai));
    }
}
