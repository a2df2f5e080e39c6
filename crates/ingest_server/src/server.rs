//! Server startup and graceful shutdown

use std::future::Future;

use contracts::{ServerConfig, WarehouseSink};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::error::ServeError;
use crate::routes::{router, AppState};

/// Bind `host:port` from the config
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, ServeError> {
    let addr = format!("{}:{}", config.host, config.port);
    TcpListener::bind(&addr)
        .await
        .map_err(|source| ServeError::Bind { addr, source })
}

/// Serve on an already bound listener until `shutdown` resolves
pub async fn serve_on<S, F>(
    listener: TcpListener,
    state: AppState<S>,
    shutdown: F,
) -> Result<(), ServeError>
where
    S: WarehouseSink + Sync + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let local_addr = listener.local_addr()?;
    info!(
        addr = %local_addr,
        dataset = %state.tables().dataset,
        "ingest server listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("ingest server stopped");
    Ok(())
}

/// Bind and serve with the configured warehouse sink
#[instrument(
    name = "ingest_server",
    skip(config, shutdown),
    fields(host = %config.host, port = config.port, sink = ?config.sink)
)]
pub async fn serve<F>(config: &ServerConfig, shutdown: F) -> Result<(), ServeError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = bind(config).await?;
    serve_on(listener, AppState::from_config(config), shutdown).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::TableNames;
    use crate::lazy::LazySink;
    use crate::sinks::MemoryWarehouse;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_graceful_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = AppState::new(
            LazySink::new(|| Ok(MemoryWarehouse::new("memory"))),
            TableNames::default(),
        );
        let (tx, rx) = oneshot::channel::<()>();

        let server = tokio::spawn(serve_on(listener, state, async move {
            let _ = rx.await;
        }));

        let text = reqwest::get(format!("http://{addr}/"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(text, "Server Is Running");

        tx.send(()).unwrap();
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_bind_error() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = ServerConfig {
            host: "127.0.0.1".into(),
            port: taken.local_addr().unwrap().port(),
            ..ServerConfig::default()
        };

        let err = bind(&config).await.unwrap_err();
        assert!(matches!(err, ServeError::Bind { .. }));
        assert!(err.to_string().contains("127.0.0.1"));
    }
}
