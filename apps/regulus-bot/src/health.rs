//! Liveness probe for hosting platforms.

use axum::{http::StatusCode, routing::get, Router};
use tokio::net::TcpListener;
use tracing::info;

use crate::error::Error;

async fn alive() -> (StatusCode, &'static str) {
    (StatusCode::OK, "Regulus-Bot is running!")
}

pub fn router() -> Router {
    Router::new().route("/", get(alive))
}

/// Serve the probe on every interface at `port` until the process exits.
pub async fn serve(port: u16) -> Result<(), Error> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    serve_on(listener).await
}

pub async fn serve_on(listener: TcpListener) -> Result<(), Error> {
    info!(addr = %listener.local_addr()?, "Health check listening");
    axum::serve(listener, router()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn root_reports_running() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve_on(listener));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
        assert!(response.ends_with("Regulus-Bot is running!"));
    }
}
