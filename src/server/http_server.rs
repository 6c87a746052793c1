//! HTTP server implementation.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinSet;
use tokio::signal;
use log::{debug, info, warn, error};
use std::net::SocketAddr;

use crate::parser::{HttpRequest, Method, expected_length, parse_request};
use crate::server::config::{RequestLimits, ServerConfig};
use crate::server::error::Error;
use crate::server::handler::{HandlerFn, Route};
use crate::server::response::{HttpResponse, StatusCode};

/// How long a client may take to deliver a complete request.
const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// How long shutdown waits for in-flight connections.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of looking up a route.
enum RouteMatch {
    Found(HandlerFn),
    NotFound,
    MethodNotAllowed(Vec<String>),
}

/// An HTTP server.
pub struct HttpServer {
    /// The server configuration.
    pub config: ServerConfig,
    /// The routes.
    pub routes: Arc<RwLock<Vec<Route>>>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            routes: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Add a route to the server.
    pub async fn add_route<F, Fut>(&self, path: impl Into<String>, methods: Vec<Method>, handler: F)
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse, Error>> + Send + 'static,
    {
        let path = path.into();
        let handler = Arc::new(move |req: HttpRequest| -> Pin<Box<dyn Future<Output = Result<HttpResponse, Error>> + Send>> {
            Box::pin(handler(req))
        });

        let route = Route {
            path,
            methods,
            handler,
        };

        self.routes.write().await.push(route);
    }

    /// Display the server banner and registered endpoints.
    async fn display_server_info(&self) {
        let banner = include_str!("../banner.txt");
        info!("\n{banner}");

        let routes = self.routes.read().await;
        info!("Registered endpoints:");
        for route in routes.iter() {
            let methods = route.methods.iter()
                .map(|m| m.to_string())
                .collect::<Vec<String>>()
                .join(", ");
            info!("  {methods} {}", route.path);
        }
    }

    /// Set up the TCP listener.
    async fn setup_listener(&self) -> Result<TcpListener, Error> {
        let listener = TcpListener::bind(&self.config.addr).await?;
        info!("Server listening on http://{addr}", addr = self.config.addr);
        Ok(listener)
    }

    /// Set up a Ctrl+C handler for graceful shutdown.
    fn setup_ctrl_c_handler(shutdown_tx: mpsc::Sender<()>, tasks: &mut JoinSet<()>) {
        tasks.spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl+C, initiating graceful shutdown");
                    let _ = shutdown_tx.send(()).await;
                }
                Err(e) => {
                    error!("Error setting up Ctrl+C handler: {e}");
                }
            }
        });
    }

    /// Handle a new connection.
    ///
    /// A failing connection is logged and dropped; it never stops the server.
    async fn handle_new_connection(
        mut socket: tokio::net::TcpStream,
        addr: SocketAddr,
        semaphore: Arc<tokio::sync::Semaphore>,
        routes: Arc<RwLock<Vec<Route>>>,
        limits: RequestLimits,
        tasks: &mut JoinSet<()>,
    ) {
        // Try to acquire a permit from the semaphore
        let permit = match semaphore.try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                warn!("Connection limit reached, rejecting connection from {addr}");
                let response = HttpResponse::text(
                    StatusCode::ServiceUnavailable,
                    "Server is at capacity, please try again later",
                );
                let _ = socket.write_all(&response.to_bytes()).await;
                return;
            }
        };

        debug!("Connection from {addr}");
        tasks.spawn(async move {
            // The permit is dropped when the task completes, releasing the semaphore slot
            let _permit = permit;

            if let Err(e) = Self::handle_connection(&mut socket, routes, limits, Some(addr)).await {
                match e {
                    Error::IoError(_) => error!("Error handling connection from {addr}: {e}"),
                    _ => warn!("Request from {addr} failed: {e}"),
                }
            }
        });
    }

    /// Handle connection errors.
    async fn handle_connection_error(e: std::io::Error) -> bool {
        error!("Error accepting connection: {e}");

        if e.kind() == std::io::ErrorKind::BrokenPipe {
            error!("Critical error accepting connection, shutting down");
            return true;
        }

        // For other errors, wait a bit before retrying
        tokio::time::sleep(Duration::from_millis(100)).await;
        false
    }

    /// Perform graceful shutdown.
    async fn perform_shutdown(tasks: &mut JoinSet<()>) {
        info!("Waiting for {len} active connections to complete...", len = tasks.len());
        let _ = tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
            while let Some(res) = tasks.join_next().await {
                if let Err(e) = res {
                    error!("Task failed during shutdown: {e}");
                }
            }
        }).await;

        info!("Server shutdown complete");
    }

    /// Start the server and listen for incoming connections.
    pub async fn start(&self) -> Result<(), Error> {
        self.display_server_info().await;

        let listener = self.setup_listener().await?;

        // Create a semaphore to limit concurrent connections
        let semaphore = Arc::new(tokio::sync::Semaphore::new(self.config.max_connections));

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        // The Ctrl+C watcher lives in its own set so shutdown can drain connections separately
        let mut signals = JoinSet::new();
        Self::setup_ctrl_c_handler(shutdown_tx.clone(), &mut signals);

        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                Some(()) = shutdown_rx.recv() => {
                    info!("Shutting down server...");
                    break;
                }

                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((socket, addr)) => {
                            Self::handle_new_connection(
                                socket,
                                addr,
                                semaphore.clone(),
                                self.routes.clone(),
                                self.config.limits(),
                                &mut tasks,
                            ).await;
                        },
                        Err(e) => {
                            if Self::handle_connection_error(e).await {
                                break;
                            }
                        }
                    }
                }

                // Reap finished connections so the set does not grow without bound
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        signals.abort_all();
        Self::perform_shutdown(&mut tasks).await;

        Ok(())
    }

    /// Read one complete request from the socket.
    ///
    /// Returns `None` when the peer closed the connection without sending anything.
    pub async fn read_request(
        socket: &mut (impl AsyncRead + Unpin),
        limits: RequestLimits,
    ) -> Result<Option<Vec<u8>>, Error> {
        let mut buf = Vec::with_capacity(limits.read_buffer_size);
        let mut chunk = vec![0; limits.read_buffer_size];

        loop {
            let n = socket.read(&mut chunk).await?;
            if n == 0 {
                break; // Connection closed
            }
            buf.extend_from_slice(&chunk[..n]);

            match expected_length(&buf) {
                Some(total) if total > limits.max_request_size => {
                    return Err(Error::PayloadTooLarge(total));
                }
                Some(total) if buf.len() >= total => break,
                None if buf.len() > limits.max_request_size => {
                    return Err(Error::PayloadTooLarge(buf.len()));
                }
                _ => {}
            }
        }

        Ok(if buf.is_empty() { None } else { Some(buf) })
    }

    /// Find the handler for `path` and `method`.
    async fn select_route(routes: &RwLock<Vec<Route>>, path: &str, method: Method) -> RouteMatch {
        let routes = routes.read().await;
        let matching_routes: Vec<&Route> = routes
            .iter()
            .filter(|route| route.path == path)
            .collect();

        if matching_routes.is_empty() {
            return RouteMatch::NotFound;
        }

        match matching_routes.iter().find(|route| route.accepts(method)) {
            Some(route) => RouteMatch::Found(route.handler.clone()),
            None => RouteMatch::MethodNotAllowed(
                matching_routes
                    .iter()
                    .flat_map(|route| route.methods.iter().map(|m| m.to_string()))
                    .collect(),
            ),
        }
    }

    /// Handle a single connection.
    pub async fn handle_connection(
        socket: &mut (impl AsyncRead + AsyncWrite + Unpin),
        routes: Arc<RwLock<Vec<Route>>>,
        limits: RequestLimits,
        remote_addr: Option<SocketAddr>,
    ) -> Result<(), Error> {
        let read = tokio::time::timeout(REQUEST_READ_TIMEOUT, Self::read_request(&mut *socket, limits)).await;
        let raw = match read {
            Ok(Ok(Some(raw))) => raw,
            Ok(Ok(None)) => return Ok(()),
            Ok(Err(Error::PayloadTooLarge(size))) => {
                let response = HttpResponse::text(
                    StatusCode::PayloadTooLarge,
                    format!("Request too large: limit is {limit} bytes", limit = limits.max_request_size),
                );
                socket.write_all(&response.to_bytes()).await?;
                return Err(Error::PayloadTooLarge(size));
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(Error::IoError(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "timed out reading request",
                )));
            }
        };

        // Parse the HTTP request
        let mut request = match parse_request(&raw) {
            Ok(req) => req,
            Err(e) => {
                let response = HttpResponse::text(StatusCode::BadRequest, format!("Error parsing request: {e}"));
                socket.write_all(&response.to_bytes()).await?;
                return Err(Error::ParseError(e));
            }
        };
        request.remote_addr = remote_addr;

        let path = request.route_path().to_string();
        let selected = Self::select_route(&routes, &path, request.method).await;

        match selected {
            RouteMatch::Found(handler) => {
                let is_head = request.method == Method::HEAD;
                let response = match handler(request).await {
                    Ok(resp) => resp,
                    Err(e) => {
                        let response = HttpResponse::text(
                            StatusCode::InternalServerError,
                            format!("Internal server error: {e}"),
                        );
                        socket.write_all(&response.to_bytes()).await?;
                        return Err(e);
                    }
                };

                let response = if is_head { response.without_body() } else { response };
                socket.write_all(&response.to_bytes()).await?;
            }
            RouteMatch::NotFound => {
                let response = HttpResponse::text(StatusCode::NotFound, format!("Not found: {path}"));
                socket.write_all(&response.to_bytes()).await?;
                return Err(Error::NotFound(path));
            }
            RouteMatch::MethodNotAllowed(allowed_methods) => {
                let allowed = allowed_methods.join(", ");
                let response = HttpResponse::text(
                    StatusCode::MethodNotAllowed,
                    format!(
                        "Method {method} not allowed for path: {path}. Allowed methods: {allowed}",
                        method = request.method,
                    ),
                )
                .with_header("Allow", allowed);

                socket.write_all(&response.to_bytes()).await?;
                return Err(Error::MethodNotAllowed(request.method, path));
            }
        }

        socket.flush().await?;
        Ok(())
    }
}
