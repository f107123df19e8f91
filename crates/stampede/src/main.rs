use hyper::{
    service::{make_service_fn, service_fn},
    Body, Request, Response, Server, StatusCode,
};
use stampede::engine::population::{Population, ProfileRuntime, RunConfig};
use stampede::engine::stats;
use stampede::engine::transport::HttpTransport;
use stampede::engine::user::UserProfile;
use stampede::metrics;
use stampede_common::Config;
use std::convert::Infallible;
use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_production_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_target(true))
        .init();

    info!("Production structured logging initialized (JSON)");
}

async fn metrics_handler(req: Request<Body>) -> Result<Response<Body>, Infallible> {
    match req.uri().path() {
        "/health" => Ok(Response::new(Body::from("OK"))),
        "/metrics" => Ok(Response::new(Body::from(metrics::render_metrics()))),
        _ => {
            let mut not_found = Response::new(Body::from("Not Found"));
            *not_found.status_mut() = StatusCode::NOT_FOUND;
            Ok(not_found)
        }
    }
}

async fn run_metrics_server(port: u16) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    metrics::register_metrics();

    let make_svc =
        make_service_fn(|_conn| async { Ok::<_, Infallible>(service_fn(metrics_handler)) });

    let server = Server::bind(&addr).serve(make_svc);

    info!(port = port, "Observability server online");

    if let Err(e) = server.await {
        error!(error = %e, "Observability server failed");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_production_logging();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/stampede.yaml".to_string());
    let config_data = fs::read_to_string(&config_path)?;
    let config: Config = serde_yaml::from_str(&config_data)?;

    if config.metrics.enabled {
        let port = config.metrics.port;
        tokio::spawn(async move {
            run_metrics_server(port).await;
        });
    }

    let (stats, collector) = stats::spawn_collector();

    let mut profiles = Vec::with_capacity(config.profiles.len());
    for profile_config in &config.profiles {
        let profile = UserProfile::from_config(profile_config)?;
        let transport = HttpTransport::new(&config.target.base_url, &profile.default_headers)?;
        profiles.push(ProfileRuntime {
            profile: Arc::new(profile),
            transport: Arc::new(transport),
        });
    }

    let run = RunConfig {
        spawn_rate: config.run.spawn_rate,
        duration: config.run.duration_secs.map(Duration::from_secs),
        grace_timeout: Duration::from_secs(config.run.grace_timeout_secs),
    };
    let headless = run.duration.is_some();

    let started = tokio::time::Instant::now();
    let population = Population::start(run, profiles, stats.clone())?;
    info!(
        target = %config.target.base_url,
        headless,
        "Stampede started"
    );

    tokio::select! {
        _ = population.cancelled() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    let report = population.stop().await;
    if report.abandoned > 0 {
        warn!(
            abandoned = report.abandoned,
            "Some users did not stop within the grace period"
        );
    }

    let snapshot = stats.snapshot().await;
    let elapsed = started.elapsed();
    info!(
        requests = snapshot.total_count,
        users_stopped = report.stopped,
        elapsed_secs = elapsed.as_secs_f64(),
        throughput_rps = snapshot.total_count as f64 / elapsed.as_secs_f64().max(f64::EPSILON),
        "Run complete"
    );

    let mut action_names: Vec<_> = snapshot.per_action.keys().collect();
    action_names.sort();
    for name in action_names {
        let action = &snapshot.per_action[name];
        info!(
            action = %name,
            count = action.count,
            success = action.success_count,
            min_ms = action.min.as_millis() as u64,
            mean_ms = action.mean.as_millis() as u64,
            p50_ms = action.p50.as_millis() as u64,
            p90_ms = action.p90.as_millis() as u64,
            p99_ms = action.p99.as_millis() as u64,
            max_ms = action.max.as_millis() as u64,
            "Action summary"
        );
    }

    // Last sender gone: the collector drains and exits.
    drop(stats);
    let _ = collector.await;
    Ok(())
}
