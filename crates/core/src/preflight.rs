//! Reachability checks run before a batch starts.

use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::info;

/// Preflight failures.
#[derive(Debug, Error)]
pub enum PreflightError {
    #[error(
        "Cannot connect to {host}:{port}: {reason}. \
         Open port {port} on the cluster firewall"
    )]
    PortClosed {
        host: String,
        port: u16,
        reason: String,
    },
}

/// Opens and drops a TCP connection to `host:port`.
pub async fn check_port(host: &str, port: u16, limit: Duration) -> Result<(), PreflightError> {
    let closed = |reason: String| PreflightError::PortClosed {
        host: host.to_string(),
        port,
        reason,
    };

    match timeout(limit, TcpStream::connect((host, port))).await {
        Ok(Ok(_stream)) => {
            info!(host = %host, port, "Port reachable");
            Ok(())
        }
        Ok(Err(e)) => Err(closed(e.to_string())),
        Err(_) => Err(closed(format!("no answer within {}s", limit.as_secs()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_open_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        check_port("127.0.0.1", port, Duration::from_secs(1))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_closed_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = check_port("127.0.0.1", port, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(err.to_string().contains(&format!("Open port {}", port)));
    }
}
