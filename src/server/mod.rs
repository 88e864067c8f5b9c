//! The stub server: one listening socket, one connection at a time.
//!
//! Every accepted connection is parsed into a [`Request`], appended to the
//! request log and answered with the next queued [`Response`]. Both the log
//! and the queue live behind a single mutex shared between the caller and the
//! accept loop.
//!
//! Stopping is best effort. [`StubServer::stop`] raises a signal that the accept
//! loop checks between connections and while serving one; a connection that was
//! already accepted when the signal lands may still be answered, or be dropped
//! halfway.

use crate::dto::{Request, Response};
use crate::http::{read_request, write_response, ParseError};
use log::{debug, error, info, warn};
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};

pub use queue::{ResponseHandle, ResponseQueue};

mod queue;

#[derive(Debug, Default)]
struct StubState {
    requests: Vec<Request>,
    responses: ResponseQueue,
}

type SharedState = Arc<Mutex<StubState>>;

fn lock_state(state: &SharedState) -> MutexGuard<'_, StubState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct StubServer {
    addr: SocketAddr,
    listener: Option<std::net::TcpListener>,
    state: SharedState,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<Result<(), ServerError>>>,
}

impl StubServer {
    pub fn builder() -> StubServerBuilder {
        StubServerBuilder::default()
    }

    /// Binds all interfaces on `port` right away. Port 0 picks a free port.
    pub fn new(port: u16) -> Result<StubServer, BuildError> {
        StubServer::builder()
            .with_addr(SocketAddr::from(([0, 0, 0, 0], port)))
            .build()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn add_response(&self, mime_type: &str, body: &str) -> ResponseHandle {
        self.enqueue(Response::new(mime_type, body))
    }

    pub fn add_response_with_status(
        &self,
        status_code: u16,
        mime_type: &str,
        body: &str,
    ) -> ResponseHandle {
        self.enqueue(Response::with_status(status_code, mime_type, body))
    }

    /// Queues `response`, evicting the default one if nothing was queued yet.
    pub fn enqueue(&self, response: Response) -> ResponseHandle {
        lock_state(&self.state).responses.push(response)
    }

    /// Forgets all logged requests and queued responses.
    pub fn reset(&self) {
        let mut state = lock_state(&self.state);
        state.requests.clear();
        state.responses.reset();
    }

    /// Requests received since construction or the last reset, oldest first.
    pub fn requests(&self) -> Vec<Request> {
        lock_state(&self.state).requests.clone()
    }

    pub fn request_count(&self) -> usize {
        lock_state(&self.state).requests.len()
    }

    /// Spawns the accept loop onto the current tokio runtime.
    ///
    /// Calling it while the loop runs does nothing. A stopped server cannot be
    /// started again, and neither can one whose loop already ended on an error;
    /// [`wait`](Self::wait) reports that error. Outside a tokio runtime this
    /// returns [`ServerError::NoRuntime`].
    pub fn start(&mut self) -> Result<(), ServerError> {
        if *self.shutdown.borrow() {
            return Err(ServerError::Stopped);
        }
        if let Some(task) = &self.task {
            if task.is_finished() {
                return Err(ServerError::Stopped);
            }
            return Ok(());
        }
        tokio::runtime::Handle::try_current().map_err(|_| ServerError::NoRuntime)?;

        let listener = self.listener.take().ok_or(ServerError::Stopped)?;
        let listener = TcpListener::from_std(listener).map_err(ServerError::Listen)?;

        let task = tokio::task::spawn(serve(
            listener,
            self.addr,
            self.state.clone(),
            self.shutdown.subscribe(),
        ));
        self.task = Some(task);
        Ok(())
    }

    /// Signals the accept loop to finish and drops the connection in flight, if any.
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Waits for the accept loop to end and returns how it ended.
    ///
    /// A request the server could not parse ends the loop, and this is where
    /// that error surfaces. Without a prior [`stop`](Self::stop) this only
    /// returns once such an error occurs.
    pub async fn wait(&mut self) -> Result<(), ServerError> {
        match self.task.take() {
            Some(task) => task.await?,
            None => Ok(()),
        }
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn serve(
    listener: TcpListener,
    addr: SocketAddr,
    state: SharedState,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), ServerError> {
    info!("Listening on port {}", addr.port());

    loop {
        let stream = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!("Accepted connection from {}", peer);
                    stream
                }
                Err(e) => {
                    error!("failed to accept connection: {:?}", e);
                    continue;
                }
            },
        };

        tokio::select! {
            biased;
            _ = shutdown.changed() => {
                warn!("Stopped while serving a connection, closing it");
                break;
            }
            handled = handle_connection(stream, &state) => {
                if let Err(err) = handled {
                    error!("Stub server failed: {err}");
                    return Err(err);
                }
            }
        }
    }

    info!("Stopped listening on port {}", addr.port());
    Ok(())
}

// The stream is dropped, and with it the socket closed, on every path out of here
async fn handle_connection(mut stream: TcpStream, state: &SharedState) -> Result<(), ServerError> {
    let (reader, mut writer) = stream.split();
    let mut reader = BufReader::new(reader);

    let served = exchange(&mut reader, &mut writer, state).await;
    let closed = writer.shutdown().await;

    served?;
    match closed {
        Err(e) if e.kind() != ErrorKind::NotConnected => Err(ServerError::Close(e)),
        _ => Ok(()),
    }
}

async fn exchange<R, W>(reader: &mut R, writer: &mut W, state: &SharedState) -> Result<(), ServerError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let request = match read_request(reader).await? {
        Some(request) => request,
        None => {
            debug!("Connection closed before sending a request");
            return Ok(());
        }
    };
    info!("Got request: {} {}", request.method(), request.path());

    let response = {
        let mut state = lock_state(state);
        state.requests.push(request);
        state.responses.next()
    };
    debug!(
        "Responding with {} ({} chars of {})",
        response.status_code(),
        response.body().chars().count(),
        response.mime_type()
    );

    write_response(writer, &response)
        .await
        .map_err(ServerError::Write)
}

#[derive(Default)]
pub struct StubServerBuilder {
    host: Option<String>,
    port: Option<u16>,
    addr: Option<SocketAddr>,
}

impl StubServerBuilder {
    pub fn new() -> StubServerBuilder {
        StubServerBuilder::default()
    }

    pub fn with_host(mut self, host: String) -> StubServerBuilder {
        self.host = Some(host);
        self
    }

    pub fn with_port(mut self, port: u16) -> StubServerBuilder {
        self.port = Some(port);
        self
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> StubServerBuilder {
        self.addr = Some(addr);
        self
    }

    /// Binds the listening socket. Nothing is accepted until [`StubServer::start`].
    pub fn build(self) -> Result<StubServer, BuildError> {
        let addr = match self.addr {
            Some(addr) => addr,
            None => {
                let host = self.host.ok_or(BuildError::NoHost)?;
                let port = self.port.ok_or(BuildError::NoPort)?;
                let host = host.parse().map_err(|_| BuildError::InvalidHost(host))?;
                SocketAddr::new(host, port)
            }
        };

        let bind_error = |source| BuildError::Bind { addr, source };
        let listener = std::net::TcpListener::bind(addr).map_err(bind_error)?;
        listener.set_nonblocking(true).map_err(bind_error)?;
        let addr = listener.local_addr().map_err(bind_error)?;

        let (shutdown, _) = watch::channel(false);
        Ok(StubServer {
            addr,
            listener: Some(listener),
            state: SharedState::default(),
            shutdown,
            task: None,
        })
    }
}

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("host is not specified")]
    NoHost,

    #[error("given host {0:?} is not a valid ip")]
    InvalidHost(String),

    #[error("listening port is not specified")]
    NoPort,

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("server has been stopped")]
    Stopped,

    #[error("server must be started from within a tokio runtime")]
    NoRuntime,

    #[error("failed to listen: {0}")]
    Listen(std::io::Error),

    #[error("failed to parse request: {0}")]
    Parse(#[from] ParseError),

    #[error("failed to write response: {0}")]
    Write(std::io::Error),

    #[error("failed to close connection: {0}")]
    Close(std::io::Error),

    #[error("accept loop panicked or was cancelled: {0}")]
    Task(#[from] JoinError),
}
