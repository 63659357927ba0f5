//! Minimal strand example: one chain, one context, served by hyper.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl -i http://localhost:3000/orders
//!   curl -i -H 'authorization: Bearer demo' http://localhost:3000/orders

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use http::StatusCode;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use strand::{Chain, Constructor, ContextAdapter, Request, Response};
use tokio::net::TcpListener;
use tracing::{error, info};

/// Shared by every request served through the adapter.
#[derive(Clone)]
struct AppContext {
    service: &'static str,
    token: Arc<str>,
    next_id: Arc<AtomicU64>,
}

/// Request id assigned by the outermost layer.
#[derive(Clone, Copy)]
struct RequestId(u64);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let ctx = AppContext {
        service: "orders",
        token: "demo".into(),
        next_id: Arc::new(AtomicU64::new(1)),
    };

    // Every endpoint gets ids and access logs; only some need auth.
    let std_chain = Chain::new([request_id(), access_log()]);
    let protected = std_chain.append([bearer_auth()]);

    let app = protected.then_fn_with_context(ctx, list_orders);

    if let Err(e) = serve("0.0.0.0:3000", app).await {
        error!("server error: {e}");
    }
}

// ── Middleware ────────────────────────────────────────────────────────────────

fn request_id() -> Constructor<AppContext> {
    Constructor::from_fn(|ctx: AppContext, mut req: Request, next| async move {
        let id = ctx.next_id.fetch_add(1, Ordering::Relaxed);
        req.extensions_mut().insert(RequestId(id));

        let mut res = next.call(ctx, req).await;
        if let Ok(value) = id.to_string().parse() {
            res.headers_mut().insert("x-request-id", value);
        }
        res
    })
}

fn access_log() -> Constructor<AppContext> {
    Constructor::from_fn(|ctx: AppContext, req: Request, next| async move {
        let service = ctx.service;
        let method = req.method().clone();
        let path = req.path().to_owned();
        let id = req.extensions().get::<RequestId>().map_or(0, |id| id.0);
        let started = Instant::now();

        let res = next.call(ctx, req).await;
        info!(
            service,
            request_id = id,
            %method,
            path = %path,
            status = res.status_code().as_u16(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "request served"
        );
        res
    })
}

fn bearer_auth() -> Constructor<AppContext> {
    Constructor::from_fn(|ctx: AppContext, req: Request, next| async move {
        let authorized = req
            .header("authorization")
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == &*ctx.token);

        if !authorized {
            return Response::status(StatusCode::UNAUTHORIZED);
        }
        next.call(ctx, req).await
    })
}

// ── Terminal handler ──────────────────────────────────────────────────────────

async fn list_orders(ctx: AppContext, req: Request) -> Response {
    let id = req.extensions().get::<RequestId>().map_or(0, |id| id.0);
    Response::json(format!(r#"{{"service":"{}","request":{id},"orders":[]}}"#, ctx.service))
}

// ── Dispatch ──────────────────────────────────────────────────────────────────

/// Accepts connections on `addr` and hands every request to `app`.
///
/// Returns after SIGTERM or Ctrl-C once in-flight connections have drained.
async fn serve(addr: &str, app: ContextAdapter<AppContext>) -> std::io::Result<()> {
    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "strand demo listening");

    let mut tasks = tokio::task::JoinSet::new();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            () = &mut shutdown => {
                info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                break;
            }

            res = listener.accept() => {
                let (stream, remote_addr) = match res {
                    Ok(v) => v,
                    Err(e) => {
                        error!("accept error: {e}");
                        continue;
                    }
                };

                let app = app.clone();
                let io = TokioIo::new(stream);

                tasks.spawn(async move {
                    if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                        .serve_connection(io, app)
                        .await
                    {
                        error!(peer = %remote_addr, "connection error: {e}");
                    }
                });
            }

            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    while tasks.join_next().await.is_some() {}

    info!("strand demo stopped");
    Ok(())
}

/// Resolves on SIGTERM (Unix) or Ctrl-C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}
