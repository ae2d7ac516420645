//! Logging and metrics for the gate.
//!
//! Tracing goes to stdout through an `EnvFilter` (default `info`). Counters are
//! exported in Prometheus text format on a dedicated listener so the API port
//! never exposes them.
use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use metrics_exporter_prometheus::PrometheusHandle;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const SIGN_IN_TOTAL: &str = "authgate_sign_in_total";
pub const VERIFY_FAILURES_TOTAL: &str = "authgate_verify_failures_total";
pub const AUTHORIZE_TOTAL: &str = "authgate_authorize_total";

static METRICS_HANDLE: Mutex<Option<PrometheusHandle>> = Mutex::new(None);
static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Install tracing and the Prometheus recorder.
///
/// # What it does
/// Sets up an `EnvFilter` (default `info`) with a fmt layer the first time it
/// runs, and returns the process-wide Prometheus handle. Later calls reuse
/// both, so tests may call it freely.
///
/// # Errors
/// - The recorder cannot be installed, e.g. another recorder already owns the
///   global slot.
pub fn init_observability(service_name: &str) -> anyhow::Result<PrometheusHandle> {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer();
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init();
    });
    tracing::debug!(service = service_name, "observability initialized");
    install_metrics_recorder()
}

fn install_metrics_recorder() -> anyhow::Result<PrometheusHandle> {
    // The recorder is process-global; install it at most once.
    let mut slot = METRICS_HANDLE
        .lock()
        .map_err(|_| anyhow::anyhow!("metrics handle lock poisoned"))?;
    if let Some(handle) = slot.as_ref() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("install metrics recorder")?;
    *slot = Some(handle.clone());
    Ok(handle)
}

pub fn record_sign_in(outcome: &'static str) {
    metrics::counter!(SIGN_IN_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_verify_failure(code: &'static str) {
    metrics::counter!(VERIFY_FAILURES_TOTAL, "code" => code).increment(1);
}

pub fn record_authorize(allowed: bool) {
    let decision = if allowed { "allow" } else { "deny" };
    metrics::counter!(AUTHORIZE_TOTAL, "decision" => decision).increment(1);
}

pub async fn serve_metrics(handle: PrometheusHandle, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    serve_metrics_with_listener(handle, listener, std::future::pending()).await
}

/// Serve `GET /metrics` on `listener` until `shutdown` resolves.
pub async fn serve_metrics_with_listener<F>(
    handle: PrometheusHandle,
    listener: tokio::net::TcpListener,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = axum::Router::new().route(
        "/metrics",
        axum::routing::get(move || async move { handle.render() }),
    );
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn counters_show_up_in_render() {
        let handle = init_observability("authgate-test").expect("observability");
        record_sign_in("success");
        record_verify_failure("expired_token");
        record_authorize(false);
        let rendered = handle.render();
        assert!(rendered.contains(SIGN_IN_TOTAL));
        assert!(rendered.contains(VERIFY_FAILURES_TOTAL));
        assert!(rendered.contains(AUTHORIZE_TOTAL));
    }

    #[tokio::test]
    async fn init_is_idempotent() {
        let first = init_observability("authgate-test").expect("first");
        let second = init_observability("authgate-test").expect("second");
        record_sign_in("failure");
        assert!(first.render().contains(SIGN_IN_TOTAL));
        assert!(second.render().contains(SIGN_IN_TOTAL));
    }

    #[tokio::test]
    async fn metrics_listener_serves_prometheus_text() {
        let handle = init_observability("authgate-test").expect("observability");
        record_authorize(true);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(serve_metrics_with_listener(handle, listener, async {
            let _ = rx.await;
        }));

        let mut stream = tokio::net::TcpStream::connect(addr).await.expect("connect");
        stream
            .write_all(b"GET /metrics HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n")
            .await
            .expect("write");
        let mut response = String::new();
        stream.read_to_string(&mut response).await.expect("read");
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains(AUTHORIZE_TOTAL));

        let _ = tx.send(());
        server.await.expect("join").expect("serve");
    }
}
