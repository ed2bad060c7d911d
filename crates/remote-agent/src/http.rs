//! The agent's HTTP surface.
//!
//! Four routes, matched on method and path. The response bodies are a wire
//! contract shared with other client implementations, so the JSON shapes
//! here are exact:
//!
//! - `POST /shutdown` → `200 {"message": "Shutting down..."}`
//! - `POST /restart`  → `200 {"message": "Restarting..."}`
//! - `POST /sleep`    → `200 {"message": "Sleeping..."}`
//! - `GET  /health`   → `200 {"status": "online", "platform": <os>}`
//!
//! Failures answer `500 {"error": <message>}`; unknown routes `404`.

use std::convert::Infallible;
use std::sync::Arc;

use hyper::{Body, Method, Request, Response};
use serde_json::json;
use tracing::{error, info};

use remote_core::PowerCommand;

use crate::executor::CommandExecutor;
use crate::platform::Platform;

/// Shared per-server state handed to every request handler.
pub struct AgentContext {
    executor: CommandExecutor,
    os_name: &'static str,
}

impl AgentContext {
    /// Build the context for the detected platform.
    pub fn new(platform: Platform, simulate: bool) -> Self {
        Self {
            executor: CommandExecutor::new(platform, simulate),
            os_name: std::env::consts::OS,
        }
    }
}

/// Route an incoming request. Never fails; every outcome is a response.
pub(crate) async fn handle_request(
    req: Request<Body>,
    ctx: Arc<AgentContext>,
) -> Result<Response<Body>, Infallible> {
    let response = match (req.method(), req.uri().path()) {
        (&Method::POST, "/shutdown") => power_response(&ctx, PowerCommand::Shutdown).await,
        (&Method::POST, "/restart") => power_response(&ctx, PowerCommand::Restart).await,
        (&Method::POST, "/sleep") => power_response(&ctx, PowerCommand::Sleep).await,
        (&Method::GET, "/health") => json_response(
            200,
            &json!({ "status": "online", "platform": ctx.os_name }),
        ),
        _ => json_response(404, &json!({ "error": "Not found" })),
    };
    Ok(response)
}

async fn power_response(ctx: &AgentContext, command: PowerCommand) -> Response<Body> {
    info!(route = command.route(), "received power command");
    match ctx.executor.run(command).await {
        Ok(detail) => {
            let mut body = json!({ "message": command.ack_message() });
            if ctx.executor.is_simulating() {
                // Synthetic success: keep `message` exact, mark the
                // simulation and describe the command that would have run.
                body["simulated"] = json!(true);
                body["command"] = json!(detail);
            }
            json_response(200, &body)
        }
        Err(e) => {
            error!(route = command.route(), "power command failed: {e}");
            json_response(500, &json!({ "error": e.to_string() }))
        }
    }
}

fn json_response(status: u16, body: &serde_json::Value) -> Response<Body> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
