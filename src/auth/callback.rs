//! One-shot local HTTP listener for the OAuth redirect.
//!
//! The listener binds the fixed redirect port, serves exactly one callback
//! request, hands the query parameters back through a channel, and shuts
//! down.

use std::net::SocketAddr;

use axum::Router;
use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use serde::Deserialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{Error, Result};

const SUCCESS_PAGE: &str = "<html><body><h1>Authentication successful!</h1>\
<p>You can close this window.</p></body></html>";

const FAILURE_PAGE: &str = "<html><body><h1>Authentication failed</h1>\
<p>No authorization code was received. You can close this window and try \
again.</p></body></html>";

/// Query parameters the provider appends to the redirect URI.
#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    error: Option<String>,
}

async fn callback(
    State(tx): State<mpsc::Sender<CallbackParams>>,
    Query(params): Query<CallbackParams>,
) -> Html<&'static str> {
    let page = if params.code.is_some() {
        SUCCESS_PAGE
    } else {
        FAILURE_PAGE
    };
    let _ = tx.send(params).await;
    Html(page)
}

/// A bound, running callback server waiting for a single redirect.
pub struct CallbackServer {
    addr: SocketAddr,
    rx: mpsc::Receiver<CallbackParams>,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

impl CallbackServer {
    /// Binds the listener on `127.0.0.1:port` and starts serving.
    ///
    /// Pass port 0 to bind an ephemeral port (used by tests); the bound
    /// address is available via [`local_addr`](Self::local_addr).
    ///
    /// # Errors
    ///
    /// Returns an error if the port cannot be bound (commonly: a previous
    /// run still holds it).
    pub async fn bind(port: u16) -> Result<Self> {
        let (tx, rx) = mpsc::channel(1);
        let (shutdown, shutdown_rx) = oneshot::channel::<()>();

        let app = Router::new().route("/", get(callback)).with_state(tx);
        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], port))).await?;
        let addr = listener.local_addr()?;

        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        Ok(Self {
            addr,
            rx,
            shutdown,
            task,
        })
    }

    /// The address the listener is actually bound to.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Waits for the single callback request and returns its `code`.
    ///
    /// The server is shut down before this returns, regardless of outcome.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] if the callback carried no authorization code
    /// or reported a provider error.
    pub async fn recv_code(mut self) -> Result<String> {
        let params = self.rx.recv().await;

        // Stop accepting; graceful shutdown lets the in-flight response
        // finish so the browser still renders the result page.
        let _ = self.shutdown.send(());
        let _ = self.task.await;

        let params = params
            .ok_or_else(|| Error::Auth("callback listener closed before a request arrived".to_string()))?;
        if let Some(error) = params.error {
            return Err(Error::Auth(format!("authorization was denied: {error}")));
        }
        params
            .code
            .ok_or_else(|| Error::Auth("no authorization code in the callback request".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_code_from_single_request() {
        let server = CallbackServer::bind(0).await.unwrap();
        let url = format!("http://{}/?code=test-code-42", server.local_addr());

        let request = tokio::spawn(async move { reqwest::get(url).await });

        let code = server.recv_code().await.unwrap();
        assert_eq!(code, "test-code-42");

        let response = request.await.unwrap().unwrap();
        assert!(response.status().is_success());
        let body = response.text().await.unwrap();
        assert!(body.contains("Authentication successful"));
    }

    #[tokio::test]
    async fn missing_code_is_an_auth_error() {
        let server = CallbackServer::bind(0).await.unwrap();
        let url = format!("http://{}/?error=access_denied", server.local_addr());

        let request = tokio::spawn(async move { reqwest::get(url).await });

        let err = server.recv_code().await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
        assert!(err.to_string().contains("access_denied"));

        let response = request.await.unwrap().unwrap();
        let body = response.text().await.unwrap();
        assert!(body.contains("Authentication failed"));
    }

    #[tokio::test]
    async fn bare_callback_without_params_is_an_auth_error() {
        let server = CallbackServer::bind(0).await.unwrap();
        let url = format!("http://{}/", server.local_addr());

        tokio::spawn(async move {
            let _ = reqwest::get(url).await;
        });

        let err = server.recv_code().await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }
}
