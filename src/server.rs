//! Request Loop
//!
//! Turns raw query strings into rendered responses. `serve` reads one
//! URL-encoded request per line and writes one JSON response per line; every
//! request shares the same [`Context`].

use crate::context::Context;
use crate::outcome::{ApiError, ErrorCode, Outcome};
use crate::params::RawParams;
use crate::resource::dispatch::dispatch;
use crate::response::{new_request_id, render, render_fault, WireResponse};
use anyhow::{Context as _, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Dispatch one request and render its response
pub fn handle(ctx: &Context, params: &RawParams) -> WireResponse {
    let request_id = new_request_id();
    let action = params.scalar("Action").unwrap_or_default().to_string();

    match dispatch(ctx, params) {
        Ok(outcome) => render(&action, &outcome, &request_id),
        Err(e) => {
            tracing::warn!("request {} failed: {:#}", request_id, e);
            render_fault(&e, &request_id)
        }
    }
}

/// Decode a URL-encoded query string and handle it
pub fn handle_query(ctx: &Context, query: &str) -> WireResponse {
    handle(ctx, &RawParams::from_query(query))
}

/// Handle one raw request line; bytes that are not UTF-8 get an error response
fn handle_line(ctx: &Context, line: &[u8]) -> Option<WireResponse> {
    let Ok(text) = std::str::from_utf8(line) else {
        let request_id = new_request_id();
        tracing::warn!("request {} is not valid UTF-8", request_id);
        let error = ApiError::new(
            ErrorCode::InvalidParameterValue,
            "The request is not valid UTF-8",
        );
        return Some(render("", &Outcome::Error(error), &request_id));
    };

    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(handle_query(ctx, text))
}

/// Serve requests line by line until `reader` is exhausted
///
/// Returns the number of requests handled.
pub async fn serve<R, W>(ctx: &Context, mut reader: R, mut writer: W) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = Vec::new();
    let mut handled = 0;

    loop {
        line.clear();
        let read = reader
            .read_until(b'\n', &mut line)
            .await
            .context("Failed to read request")?;
        if read == 0 {
            break;
        }
        let Some(response) = handle_line(ctx, &line) else {
            continue;
        };

        let mut encoded =
            serde_json::to_string(&response).context("Failed to encode response")?;
        encoded.push('\n');
        writer
            .write_all(encoded.as_bytes())
            .await
            .context("Failed to write response")?;
        writer.flush().await?;
        handled += 1;
    }

    tracing::info!("input closed after {} request(s)", handled);
    Ok(handled)
}
