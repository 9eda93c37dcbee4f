//! HTTP listener with graceful shutdown.

use std::net::{IpAddr, SocketAddr};

use axum::Router;
use if_addrs::get_if_addrs;
use tokio::net::{TcpListener, ToSocketAddrs};

pub async fn serve<S: ToSocketAddrs>(addr: S, router: Router) -> std::io::Result<()> {
    let tcp_listener = TcpListener::bind(addr).await?;
    log_listener_urls(&tcp_listener);

    axum::serve(tcp_listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

fn log_listener_urls(listener: &TcpListener) {
    let Ok(addr) = listener.local_addr() else {
        tracing::warn!("could not determine the address the server is listening on");
        return;
    };

    let port = addr.port();
    tracing::info!("Listening on port {}", port);

    let ips: Vec<IpAddr> = match addr {
        SocketAddr::V4(addr4) if addr4.ip().is_unspecified() => interface_ips(false),
        SocketAddr::V6(addr6) if addr6.ip().is_unspecified() => interface_ips(true),
        _ => vec![addr.ip()],
    };

    for ip in ips {
        match ip {
            _ if ip.is_loopback() => tracing::info!("➜  Local:   http://localhost:{}", port),
            IpAddr::V4(_) => tracing::info!("➜  Network: http://{}:{}", ip, port),
            // Enclose IPv6 addresses in square brackets
            IpAddr::V6(_) => tracing::info!("➜  Network: http://[{}]:{}", ip, port),
        }
    }
}

fn interface_ips(ipv6: bool) -> Vec<IpAddr> {
    get_if_addrs()
        .into_iter()
        .flatten()
        .map(|i| i.ip())
        .filter(|ip| ip.is_ipv6() == ipv6)
        .collect()
}

pub async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
