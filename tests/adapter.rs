//! Context binding and dispatch through the adapter.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Frame};
use hyper::service::Service;
use strand::{BoxFuture, Chain, Constructor, ContextAdapter, ContextHandler, Request, Response};

#[derive(Clone, Debug)]
struct Tenant {
    name: &'static str,
    served: Arc<AtomicUsize>,
}

impl Tenant {
    fn new(name: &'static str) -> Self {
        Self { name, served: Arc::new(AtomicUsize::new(0)) }
    }
}

/// Terminal implemented on a type rather than a function.
struct Echo;

impl ContextHandler<Tenant> for Echo {
    fn call(&self, ctx: Tenant, req: Request) -> BoxFuture {
        Box::pin(async move {
            ctx.served.fetch_add(1, Ordering::SeqCst);
            let body = String::from_utf8_lossy(req.body()).into_owned();
            Response::text(format!("{}:{}:{body}", ctx.name, req.path()))
        })
    }
}

fn counted() -> Constructor<Tenant> {
    Constructor::from_fn(|ctx: Tenant, req, next| async move {
        let mut res = next.call(ctx.clone(), req).await;
        let n = ctx.served.load(Ordering::SeqCst);
        res.headers_mut().insert("x-served", n.to_string().parse().unwrap());
        res
    })
}

fn http_request(path: &str, body: &'static str) -> http::Request<Full<Bytes>> {
    http::Request::builder()
        .method("POST")
        .uri(path)
        .body(Full::new(Bytes::from_static(body.as_bytes())))
        .unwrap()
}

async fn read_body(res: http::Response<Full<Bytes>>) -> Bytes {
    res.into_body().collect().await.unwrap().to_bytes()
}

#[tokio::test]
async fn serve_passes_the_bound_context() {
    let app = Chain::new([counted()]).then_with_context(Tenant::new("acme"), Echo);
    let req = Request::from_http(http_request("/orders", "42")).await.unwrap();

    let res = app.serve(req).await;

    assert_eq!(app.context().name, "acme");
    assert_eq!(res.body().as_ref(), b"acme:/orders:42");
    assert_eq!(res.headers()["x-served"], "1");
}

#[tokio::test]
async fn adapters_from_one_chain_do_not_interfere() {
    let chain = Chain::new([counted()]);
    let acme = chain.then_with_context(Tenant::new("acme"), Echo);
    let globex = chain.then_fn_with_context(Tenant::new("globex"), |ctx: Tenant, _req| async move {
        ctx.served.fetch_add(10, Ordering::SeqCst);
        Response::text(ctx.name)
    });

    let res = acme.call(http_request("/a", "")).await.unwrap();
    assert_eq!(read_body(res).await.as_ref(), b"acme:/a:");

    let res = globex.call(http_request("/b", "")).await.unwrap();
    assert_eq!(res.headers()["x-served"], "10");
    assert_eq!(read_body(res).await.as_ref(), b"globex");

    assert_eq!(acme.context().served.load(Ordering::SeqCst), 1);
    assert_eq!(globex.context().served.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn service_converts_the_response() {
    let app = ContextAdapter::new(Tenant::new("acme"), Echo);

    let res = app.call(http_request("/ping", "hi")).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "text/plain; charset=utf-8");
    assert_eq!(read_body(res).await.as_ref(), b"acme:/ping:hi");
}

struct BrokenBody;

impl Body for BrokenBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        Poll::Ready(Some(Err(std::io::Error::other("connection reset"))))
    }
}

#[tokio::test]
async fn unreadable_body_never_enters_the_chain() {
    let tenant = Tenant::new("acme");
    let app = Chain::new([counted()]).then_with_context(tenant.clone(), Echo);

    let req = http::Request::builder().uri("/").body(BrokenBody).unwrap();
    let res = app.call(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(res.headers().get("x-served").is_none());
    assert_eq!(tenant.served.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn concurrent_requests_share_one_adapter() {
    let tenant = Tenant::new("acme");
    let app = Chain::new([counted()]).then_with_context(tenant.clone(), Echo);

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                let path = format!("/item/{i}");
                let req = http::Request::builder().uri(path).body(Full::new(Bytes::new())).unwrap();
                app.call(req).await.unwrap().status()
            })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::OK);
    }
    assert_eq!(tenant.served.load(Ordering::SeqCst), 16);
}

#[tokio::test]
#[should_panic(expected = "handler exploded")]
async fn handler_panics_propagate() {
    let app = Chain::new([counted()]).then_fn_with_context(Tenant::new("acme"), |_: Tenant, _| async {
        if true {
            panic!("handler exploded");
        }
        "unreachable"
    });

    app.serve(Request::new(http::Request::new(Bytes::new()))).await;
}
