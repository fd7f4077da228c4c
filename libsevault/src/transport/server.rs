//! Unix-socket server that speaks the Docker volume-plugin protocol and
//! dispatches incoming requests to a [`VolumePlugin`].

use std::convert::Infallible;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::server::conn::Http;
use hyper::service::service_fn;
use hyper::{Body, Method, Request, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, info, instrument, warn};

use crate::error::VolumeError;
use crate::message::*;
use crate::plugin::VolumePlugin;

/// Upper bound on a request body.  Plugin requests are tiny JSON documents.
const MAX_BODY_BYTES: u64 = 1024 * 1024;

/// A plugin server bound to a Unix socket.
///
/// The socket file is removed when the server is dropped.
pub struct PluginServer<T> {
    listener: UnixListener,
    socket_path: PathBuf,
    handler: Arc<T>,
}

impl<T> PluginServer<T>
where
    T: VolumePlugin + 'static,
{
    /// Bind to `socket_path`, replacing a stale socket file left by a
    /// previous run and creating the parent directory if needed.
    pub async fn bind(
        socket_path: impl Into<PathBuf>,
        handler: Arc<T>,
    ) -> Result<Self, VolumeError> {
        let socket_path = socket_path.into();

        if let Some(parent) = socket_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| VolumeError::Storage {
                    path: parent.display().to_string(),
                    reason: format!("create socket directory: {e}"),
                })?;
        }
        match tokio::fs::remove_file(&socket_path).await {
            Ok(()) => debug!(path = %socket_path.display(), "removed stale socket"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(VolumeError::Transport(format!(
                    "remove stale socket {}: {e}",
                    socket_path.display()
                )));
            }
        }

        let listener = UnixListener::bind(&socket_path).map_err(|e| {
            VolumeError::Transport(format!("bind {}: {e}", socket_path.display()))
        })?;
        info!(path = %socket_path.display(), "volume plugin listening");
        Ok(Self {
            listener,
            socket_path,
            handler,
        })
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Accept connections until accepting fails.
    ///
    /// Each connection is served on its own Tokio task; requests on
    /// different connections run concurrently.
    pub async fn serve(&self) -> Result<(), VolumeError> {
        loop {
            let (stream, _) = self.listener.accept().await.map_err(VolumeError::transport)?;
            let handler = Arc::clone(&self.handler);
            tokio::spawn(async move {
                if let Err(e) = Self::handle_connection(stream, handler).await {
                    warn!(error = %e, "plugin connection error");
                }
            });
        }
    }

    /// [`Self::serve`] until `shutdown` completes.
    pub async fn serve_until<F>(&self, shutdown: F) -> Result<(), VolumeError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            result = self.serve() => result,
            () = shutdown => {
                info!("volume plugin shutting down");
                Ok(())
            }
        }
    }

    async fn handle_connection(stream: UnixStream, handler: Arc<T>) -> Result<(), hyper::Error> {
        let service = service_fn(move |req| {
            let handler = Arc::clone(&handler);
            async move { Ok::<_, Infallible>(handle_request(handler.as_ref(), req).await) }
        });
        Http::new()
            .http1_only(true)
            .serve_connection(stream, service)
            .await
    }
}

impl<T> Drop for PluginServer<T> {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.socket_path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            error!(
                path = %self.socket_path.display(),
                error = %e,
                "failed to remove plugin socket"
            );
        }
    }
}

async fn handle_request<T>(handler: &T, req: Request<Body>) -> Response<Body>
where
    T: VolumePlugin + ?Sized,
{
    if req.method() != Method::POST {
        let err = ErrorResponse::new(format!("method {} not allowed", req.method()));
        return json_response(StatusCode::METHOD_NOT_ALLOWED, error_body(&err));
    }

    let path = req.uri().path().to_owned();
    let body = match read_body(req.into_body()).await {
        Ok(body) => body,
        Err(e) => {
            return json_response(StatusCode::BAD_REQUEST, error_body(&ErrorResponse::new(e)));
        }
    };

    let (status, payload) = dispatch(handler, &path, &body).await;
    json_response(status, payload)
}

/// Collect a request body, failing once it grows past [`MAX_BODY_BYTES`].
async fn read_body(mut body: Body) -> Result<Vec<u8>, VolumeError> {
    use hyper::body::HttpBody;

    if body.size_hint().lower() > MAX_BODY_BYTES {
        return Err(VolumeError::transport("request body too large"));
    }
    let mut buf = Vec::new();
    while let Some(chunk) = body.data().await {
        let chunk = chunk.map_err(VolumeError::transport)?;
        if (buf.len() + chunk.len()) as u64 > MAX_BODY_BYTES {
            return Err(VolumeError::transport("request body too large"));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

fn json_response(status: StatusCode, payload: Vec<u8>) -> Response<Body> {
    let mut response = Response::new(Body::from(payload));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(PLUGIN_CONTENT_TYPE));
    response
}

fn error_body(err: &ErrorResponse) -> Vec<u8> {
    serde_json::to_vec(err).unwrap_or_default()
}

/// Route one protocol request to `handler` and produce the HTTP status and
/// JSON body of the reply.
///
/// Malformed bodies yield `400`, unknown endpoints `404`, and operation
/// failures `500` with the error message in `Err`.
#[instrument(skip(handler, body))]
pub async fn dispatch<T>(handler: &T, path: &str, body: &[u8]) -> (StatusCode, Vec<u8>)
where
    T: VolumePlugin + ?Sized,
{
    let Some(endpoint) = Endpoint::from_path(path) else {
        warn!("unknown plugin endpoint");
        let err = ErrorResponse::new(format!("unknown endpoint {path}"));
        return (StatusCode::NOT_FOUND, error_body(&err));
    };

    debug!(%endpoint, "plugin request received");
    match call(handler, endpoint, body).await {
        Ok(payload) => (StatusCode::OK, payload),
        Err(e) => {
            let status = match e {
                VolumeError::Transport(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            debug!(%endpoint, error = %e, "plugin request failed");
            (status, error_body(&ErrorResponse::new(e)))
        }
    }
}

async fn call<T>(handler: &T, endpoint: Endpoint, body: &[u8]) -> Result<Vec<u8>, VolumeError>
where
    T: VolumePlugin + ?Sized,
{
    match endpoint {
        Endpoint::Activate => encode(&ActivateResponse::default()),
        Endpoint::Create => {
            let req: CreateRequest = decode(body)?;
            handler
                .create(&req.name, req.opts.unwrap_or_default())
                .await?;
            encode(&EmptyResponse::default())
        }
        Endpoint::Remove => {
            let req: NameRequest = decode(body)?;
            handler.remove(&req.name).await?;
            encode(&EmptyResponse::default())
        }
        Endpoint::Mount => {
            let req: MountRequest = decode(body)?;
            let mountpoint = handler.mount(&req.name, &req.id).await?;
            encode(&MountpointResponse { mountpoint })
        }
        Endpoint::Path => {
            let req: NameRequest = decode(body)?;
            let mountpoint = handler.path(&req.name).await?;
            encode(&MountpointResponse { mountpoint })
        }
        Endpoint::Unmount => {
            let req: MountRequest = decode(body)?;
            handler.unmount(&req.name, &req.id).await?;
            encode(&EmptyResponse::default())
        }
        Endpoint::Get => {
            let req: NameRequest = decode(body)?;
            let volume = handler.get(&req.name).await?;
            encode(&GetResponse {
                volume: volume.into(),
            })
        }
        Endpoint::List => {
            let volumes = handler.list().await?;
            encode(&ListResponse {
                volumes: volumes.into_iter().map(WireVolume::from).collect(),
            })
        }
        Endpoint::Capabilities => encode(&CapabilitiesResponse::from(handler.capabilities())),
    }
}

fn decode<R: DeserializeOwned>(body: &[u8]) -> Result<R, VolumeError> {
    serde_json::from_slice(body)
        .map_err(|e| VolumeError::Transport(format!("malformed request body: {e}")))
}

fn encode<R: Serialize>(response: &R) -> Result<Vec<u8>, VolumeError> {
    serde_json::to_vec(response).map_err(VolumeError::transport)
}
