use std::io::{Read as _, Write};
use std::path::Path;

use anyhow::Context as _;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use serde_json::Value;
use tapedeck_config::Config;
use tapedeck_exceptions::translate_exception;
use tapedeck_recorder::{ResponseStorage, fingerprint};

/// Print the fingerprint of a request
pub async fn fingerprint(
    config: &Config,
    method: &str,
    url: &str,
    body: Option<&Path>,
    headers: &[String],
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid HTTP method `{method}`"))?;
    let headers = parse_headers(headers)?;
    let body = match body {
        Some(path) => read_body(path).await?,
        None => Value::Object(serde_json::Map::new()),
    };

    let hash = fingerprint::fingerprint(&method, url, &headers, &body, &config.recording.fingerprint);
    writeln!(out, "{hash}")?;
    Ok(())
}

/// Print a stored recording as JSON
pub async fn show(storage: &ResponseStorage, hash: &str, out: &mut impl Write) -> anyhow::Result<()> {
    let recording = storage
        .find_recording(hash)
        .await?
        .with_context(|| format!("no recording for hash {hash} under {}", storage.base_dir().display()))?;

    serde_json::to_writer_pretty(&mut *out, &recording)?;
    writeln!(out)?;
    Ok(())
}

/// Print the HTTP error a recorded failure translates to
pub async fn replay_error(storage: &ResponseStorage, hash: &str, out: &mut impl Write) -> anyhow::Result<()> {
    let recording = storage
        .find_recording(hash)
        .await?
        .with_context(|| format!("no recording for hash {hash} under {}", storage.base_dir().display()))?;

    let fault = recording
        .response
        .fault(tapedeck_providers::global())
        .with_context(|| format!("recording {hash} is not a failed call"))?;

    tracing::debug!(hash, error_type = %fault.type_name(), "replaying recorded failure");

    let response = translate_exception(&fault);
    writeln!(out, "{} ({})", response.status_code, fault.type_name())?;
    serde_json::to_writer_pretty(&mut *out, &response)?;
    writeln!(out)?;
    Ok(())
}

/// Print every recording hash visible to `storage`
pub async fn list(storage: &ResponseStorage, out: &mut impl Write) -> anyhow::Result<()> {
    for hash in storage.list().await? {
        writeln!(out, "{hash}")?;
    }
    Ok(())
}

async fn read_body(path: &Path) -> anyhow::Result<Value> {
    let raw = if path.as_os_str() == "-" {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw)?;
        raw
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read request body {}", path.display()))?
    };

    serde_json::from_str(&raw).context("request body is not valid JSON")
}

fn parse_headers(headers: &[String]) -> anyhow::Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for header in headers {
        let (name, value) = header
            .split_once(':')
            .with_context(|| format!("header `{header}` is not `name: value`"))?;
        let name = HeaderName::from_bytes(name.trim().as_bytes()).with_context(|| format!("invalid header name in `{header}`"))?;
        let value = HeaderValue::from_str(value.trim()).with_context(|| format!("invalid header value in `{header}`"))?;
        map.append(name, value);
    }
    Ok(map)
}
