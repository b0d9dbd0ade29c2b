//! A throwaway HTTP server standing in for a provider API.

use axum::Router;

/// Serve `router` on an ephemeral local port and return its base URL.
///
/// The server runs until the test's runtime shuts down.
pub async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind stub listener");
    let addr = listener.local_addr().expect("stub listener has no address");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("stub server failed");
    });

    format!("http://{}", addr)
}
