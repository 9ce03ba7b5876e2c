//! HTTP server for the dashboard
//!
//! `fooddrive serve` → loads the dataset, then answers requests one at a time

use crate::context::AppContext;
use crate::dataset::SelectOptions;
use crate::error::{Error, Result};
use crate::predict::{self, PredictionForm, PredictionOutcome, PredictionRequest};
use crate::render::{self, FormState, Page};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::io::Read;
use tiny_http::{Header, Method, Request, Response, Server};

#[derive(Serialize)]
struct ApiResponse<T> {
    ok: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Serialize)]
struct PredictionData {
    #[serde(flatten)]
    outcome: PredictionOutcome,
    message: String,
}

/// A fully built response, independent of the socket
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Reply {
    fn html(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: "text/html; charset=utf-8",
            body: body.into_bytes(),
        }
    }

    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        let body = serde_json::to_vec(value).unwrap_or_else(|e| {
            format!(r#"{{"ok":false,"data":null,"error":"serialization failed: {}"}}"#, e)
                .into_bytes()
        });
        Self {
            status,
            content_type: "application/json",
            body,
        }
    }

    fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: body.as_bytes().to_vec(),
        }
    }

    fn not_found() -> Self {
        Self::text(404, "Not found")
    }
}

#[derive(Deserialize)]
struct NavQuery {
    page: Option<String>,
}

/// Start the dashboard server
pub fn start(ctx: AppContext) -> Result<()> {
    let addr = ctx.config.bind_addr();
    let server = Server::http(&addr).map_err(|e| Error::Server(e.to_string()))?;

    match ctx.audit_model() {
        Ok(problems) => {
            for problem in problems {
                tracing::warn!("{}", problem);
            }
        }
        Err(e) => tracing::warn!(error = %e, "model artifact check failed"),
    }

    eprintln!("\n{}", "Food Drive App".bold().green());
    eprintln!("   Dashboard: http://{}", addr);
    eprintln!("   Press Ctrl+C to stop\n");
    tracing::info!(%addr, "listening");

    // One request at a time; pages are re-rendered from scratch on each
    for request in server.incoming_requests() {
        if let Err(e) = handle_request(&ctx, request) {
            tracing::error!(error = %e, "failed to send response");
        }
    }

    Ok(())
}

fn handle_request(ctx: &AppContext, mut request: Request) -> std::io::Result<()> {
    let method = request.method().clone();
    let url = request.url().to_string();

    let mut body = String::new();
    if method == Method::Post {
        if let Err(e) = request.as_reader().read_to_string(&mut body) {
            let reply = Reply::text(400, &format!("Failed to read body: {}", e));
            return request.respond(into_response(reply));
        }
    }

    let reply = route(ctx, &method, &url, &body);
    tracing::debug!(%method, %url, status = reply.status, "handled request");
    request.respond(into_response(reply))
}

fn into_response(reply: Reply) -> Response<std::io::Cursor<Vec<u8>>> {
    let content_type = Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes())
        .expect("content types are static ASCII");
    Response::from_data(reply.body)
        .with_status_code(reply.status)
        .with_header(content_type)
}

/// Dispatch one request to a page, asset or API handler
pub fn route(ctx: &AppContext, method: &Method, url: &str, body: &str) -> Reply {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));

    match (method, path) {
        (&Method::Get, "/") => match parse_page(query) {
            Some(page) => render(ctx, page, None),
            None => Reply::not_found(),
        },

        (&Method::Post, "/predict") => handle_predict_form(ctx, body),

        (&Method::Get, "/assets/logo") => serve_logo(ctx),

        (&Method::Get, "/api/options") => {
            Reply::json(200, &ApiResponse::<&SelectOptions>::success(&ctx.dataset.options))
        }

        (&Method::Post, "/api/predict") => handle_predict_api(ctx, body),

        _ => Reply::not_found(),
    }
}

/// Sidebar selection from the query string; no selection is the dashboard
///
/// A query that does not decode (e.g. a repeated `page`) selects nothing.
fn parse_page(query: &str) -> Option<Page> {
    let nav: NavQuery = serde_urlencoded::from_str(query).ok()?;
    match nav.page {
        None => Some(Page::default()),
        Some(slug) => Page::from_slug(&slug),
    }
}

fn render(ctx: &AppContext, page: Page, form: Option<&FormState>) -> Reply {
    match render::render_page(ctx, page, form) {
        Ok(html) => Reply::html(200, html),
        Err(e) => {
            tracing::error!(page = page.label(), error = %e, "page render failed");
            Reply::text(500, &format!("Failed to render {}: {}", page.label(), e))
        }
    }
}

fn handle_predict_form(ctx: &AppContext, body: &str) -> Reply {
    // Echo whatever fields did arrive, even when the submission is incomplete
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(body).unwrap_or_default();
    let form = PredictionForm::from_pairs(&pairs);
    let request = PredictionRequest::from_urlencoded(body);
    let outcome = predict::run(&ctx.config.assets.model, request);
    let state = FormState::from_submission(&form, outcome);
    render(ctx, Page::MlModeling, Some(&state))
}

fn handle_predict_api(ctx: &AppContext, body: &str) -> Reply {
    let form: PredictionForm = match serde_json::from_str(body) {
        Ok(form) => form,
        Err(e) => {
            return Reply::json(400, &ApiResponse::<()>::failure(format!("Invalid JSON: {}", e)))
        }
    };

    let outcome = predict::run(&ctx.config.assets.model, PredictionRequest::from_form(&form));
    let status = match outcome {
        PredictionOutcome::Success { .. } => 200,
        PredictionOutcome::InputError { .. } => 422,
        PredictionOutcome::Failure { .. } => 500,
    };
    let message = outcome.message();
    let response = if outcome.is_success() {
        ApiResponse::success(PredictionData { outcome, message })
    } else {
        ApiResponse {
            ok: false,
            data: Some(PredictionData { outcome, message: message.clone() }),
            error: Some(message),
        }
    };
    Reply::json(status, &response)
}

fn serve_logo(ctx: &AppContext) -> Reply {
    let path = &ctx.config.assets.logo;
    match std::fs::read(path) {
        Ok(bytes) => Reply {
            status: 200,
            content_type: image_content_type(path),
            body: bytes,
        },
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "logo unavailable");
            Reply::not_found()
        }
    }
}

fn image_content_type(path: &std::path::Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
