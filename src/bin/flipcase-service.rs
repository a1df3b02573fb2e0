//! Demo service: flips the ASCII case of the text it is given.
//!
//! POST /flipcase/transform with `{"text": "..."}` returns
//! `{"transformed": "..."}`. Exists to prove the production wiring end
//! to end; the transform itself is a stand-in collaborator.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nullables::{Clock, CommandLine, HandlerError, HttpRequest, HttpResponse, HttpServer, Log, LogData};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nullables=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let command_line = Arc::new(CommandLine::new());
    let port = match command_line.args().first() {
        Some(argument) => argument.parse()?,
        None => 5000,
    };
    let log = Log::new(command_line, Clock::new());

    let mut server = HttpServer::new(log.clone());
    server.start(port, transform).await?;
    log.info(LogData::message("flipcase service started").with("port", port));

    tokio::signal::ctrl_c().await?;
    server.stop().await?;
    log.info(LogData::message("flipcase service stopped"));
    Ok(())
}

async fn transform(request: HttpRequest) -> Result<Value, HandlerError> {
    if request.method() != "POST" || request.url_pathname() != "/flipcase/transform" {
        return Ok(HttpResponse::of(404, "not found").into());
    }
    if !request.has_content_type("application/json") {
        return Ok(HttpResponse::of(400, "invalid content-type header").into());
    }

    let body = request.read_body().await?;
    let parsed: Value = match serde_json::from_str(&body) {
        Ok(parsed) => parsed,
        Err(_) => return Ok(HttpResponse::of(400, "request body was not JSON").into()),
    };
    let Some(text) = parsed.get("text").and_then(Value::as_str) else {
        return Ok(HttpResponse::of(400, "JSON body must have a `text` field").into());
    };

    let flipped: String = text
        .chars()
        .map(|character| {
            if character.is_ascii_uppercase() {
                character.to_ascii_lowercase()
            } else if character.is_ascii_lowercase() {
                character.to_ascii_uppercase()
            } else {
                character
            }
        })
        .collect();

    let response = HttpResponse::of(200, json!({ "transformed": flipped }).to_string())
        .with_header("content-type", "application/json");
    Ok(response.into())
}
