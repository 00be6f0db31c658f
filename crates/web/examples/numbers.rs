//! Serves a small numbers api over plain tcp.
//!
//! ```text
//! curl -v http://127.0.0.1:8080/numbers/42?favorite=1
//! curl -v -H 'Accept: application/xml' http://127.0.0.1:8080/numbers?limit=2
//! curl -v -u admin:secret -d 'number=7' http://127.0.0.1:8080/numbers
//! ```

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use http::StatusCode;
use metal_http::auth::BasicAuthCredential;
use metal_http::protocol::{RequestHead, encode_response};
use metal_web::handler::method_fn;
use metal_web::router::Route;
use metal_web::validation::{Declarations, ParamSpec};
use metal_web::{ApiError, Controller, ControllerClass, Metal, MetalConfig};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

const NUMBERS: [i64; 5] = [4, 8, 15, 16, 23];
const MAX_REQUEST_BYTES: usize = 64 * 1024;

fn numbers() -> ControllerClass {
    ControllerClass::new("Numbers")
        .method(
            "getNumbers",
            method_fn(|controller: &mut Controller| {
                controller.validate(&Declarations::new().param(
                    "limit",
                    ParamSpec::optional().with_type("positiveNonZeroInt").with_default(NUMBERS.len()),
                ))?;
                controller.negotiate_format()?;

                let limit = controller.int_param("limit").and_then(|limit| usize::try_from(limit).ok()).unwrap_or(0);
                Ok(json!({ "numbers": NUMBERS.iter().take(limit).collect::<Vec<_>>() }))
            }),
        )
        .method(
            "getNumber",
            method_fn(|controller: &mut Controller| {
                controller.validate(
                    &Declarations::new()
                        .param("number", ParamSpec::required().with_type("int"))
                        .param("favorite", ParamSpec::optional().with_type("flag").with_default(0)),
                )?;
                controller.negotiate_format()?;

                Ok(json!({
                    "number": controller.int_param("number"),
                    "favorite": controller.int_param("favorite") == Some(1),
                }))
            }),
        )
        .method(
            "createNumber",
            method_fn(|controller: &mut Controller| {
                controller.validate(&Declarations::new().param("number", ParamSpec::required().with_type("nonZeroInt")))?;

                let admin = BasicAuthCredential::new("admin", "secret");
                if !controller.request().basic_auth_credential().is_some_and(|credential| credential.is_match(&admin)) {
                    return Err(ApiError::unauthorized("Unauthorized").into());
                }

                controller.response_mut().set_status(StatusCode::CREATED);
                Ok(json!({ "number": controller.int_param("number") }))
            }),
        )
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = MetalConfig::new()
        .route(Route::get("/numbers", "Numbers#getNumbers"))
        .route(Route::get(r"/numbers/{number:-?\d+}", "Numbers#getNumber"))
        .route(Route::post("/numbers", "Numbers#createNumber"));
    let metal = match Metal::builder().config(config).class(numbers()).build() {
        Ok(metal) => Arc::new(metal),
        Err(e) => {
            error!(cause = %e, "invalid application configuration");
            return;
        }
    };

    let address = "127.0.0.1:8080";
    let tcp_listener = match TcpListener::bind(address).await {
        Ok(tcp_listener) => tcp_listener,
        Err(e) => {
            error!(cause = %e, "bind server error");
            return;
        }
    };
    info!(address, "start listening");

    loop {
        let (tcp_stream, _remote_addr) = match tcp_listener.accept().await {
            Ok(stream_and_addr) => stream_and_addr,
            Err(e) => {
                warn!(cause = %e, "failed to accept");
                continue;
            }
        };

        let metal = Arc::clone(&metal);
        tokio::spawn(async move {
            if let Err(e) = serve(&metal, tcp_stream).await {
                error!(cause = %e, "connection failed");
            }
        });
    }
}

/// Answers exactly one request, then closes the connection.
async fn serve(metal: &Metal, mut tcp_stream: TcpStream) -> std::io::Result<()> {
    let mut buf = BytesMut::with_capacity(8 * 1024);

    let response = loop {
        if tcp_stream.read_buf(&mut buf).await? == 0 {
            break metal.handle_raw(&buf);
        }
        match progress(&buf) {
            Progress::Partial => {}
            Progress::Complete => break metal.handle_raw(&buf),
            Progress::TooLarge => {
                warn!(received = buf.len(), max_size = MAX_REQUEST_BYTES, "request too large");
                let mut response = http::Response::new(Bytes::new());
                *response.status_mut() = StatusCode::PAYLOAD_TOO_LARGE;
                break response;
            }
        }
    };
    info!(status = %response.status(), "request handled");

    let mut out = BytesMut::new();
    encode_response(&response, &mut out);
    tcp_stream.write_all(&out).await?;
    tcp_stream.shutdown().await
}

#[derive(Debug, PartialEq, Eq)]
enum Progress {
    Partial,
    Complete,
    TooLarge,
}

/// Whether `buf` holds a whole request head plus the body its `Content-Length` announces.
/// A head that fails to parse counts as complete; the pipeline answers it with `400`.
/// Requests over `MAX_REQUEST_BYTES`, received or announced, are too large.
fn progress(buf: &[u8]) -> Progress {
    match RequestHead::parse(buf) {
        Ok(Some((head, body_offset))) => {
            let content_length = head.headers().get("content-length").and_then(|len| len.trim().parse::<usize>().ok());
            let expected = body_offset.saturating_add(content_length.unwrap_or(0));
            if expected > MAX_REQUEST_BYTES {
                Progress::TooLarge
            } else if buf.len() >= expected {
                Progress::Complete
            } else {
                Progress::Partial
            }
        }
        Ok(None) if buf.len() > MAX_REQUEST_BYTES => Progress::TooLarge,
        Ok(None) => Progress::Partial,
        Err(_) => Progress::Complete,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_progress() {
        assert_eq!(progress(b"GET /numbers HTTP/1.1\r\nHost: a"), Progress::Partial);
        assert_eq!(progress(b"GET /numbers HTTP/1.1\r\nHost: a\r\n\r\n"), Progress::Complete);
        assert_eq!(progress(b"POST /numbers HTTP/1.1\r\nContent-Length: 8\r\n\r\nnumber"), Progress::Partial);
        assert_eq!(progress(b"POST /numbers HTTP/1.1\r\nContent-Length: 8\r\n\r\nnumber=7"), Progress::Complete);
    }

    #[test]
    fn request_too_large() {
        let head = format!("POST /numbers HTTP/1.1\r\nContent-Length: {}\r\n\r\n", MAX_REQUEST_BYTES);
        assert_eq!(progress(head.as_bytes()), Progress::TooLarge);

        let endless_head = format!("GET /numbers HTTP/1.1\r\nX-Filler: {}", "a".repeat(MAX_REQUEST_BYTES));
        // the head limit trips first; the pipeline answers the parse error itself
        assert_eq!(progress(endless_head.as_bytes()), Progress::Complete);
    }
}
