use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::time::sleep;

async fn handle(req: Request<Body>) -> Result<Response<Body>, Infallible> {
    // Simulate a little server-side work so latency stats are non-zero
    sleep(Duration::from_millis(5)).await;
    Ok(Response::new(Body::from(format!(
        "ok: {}",
        req.uri().path()
    ))))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));

    let make_svc = make_service_fn(|_conn| async { Ok::<_, Infallible>(service_fn(handle)) });
    let server = Server::bind(&addr).serve(make_svc);

    println!("Mock target listening on http://{}", addr);
    println!("Point config/stampede.yaml at it and run the harness.");

    server.await?;
    Ok(())
}
