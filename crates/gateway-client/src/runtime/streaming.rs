//! Server-streaming execution: worker tasks and the consumer stream.
//!
//! Every in-flight streaming call runs exactly one worker task. The worker
//! owns the response body for its whole lifetime and is the only writer to
//! the value and error channels; the body is released on every exit path by
//! drop. Channels hold one item, so the worker paces itself to consumer
//! speed. The worker selects on the cancellation token at every blocking
//! step — body reads and channel sends alike — so a consumer that drops the
//! stream cannot leave the worker blocked holding the body.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::BytesMut;
use futures::{Stream, StreamExt};
use http::StatusCode;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::body::HttpBody;
use super::client::{CallMeta, GatewayClient};
use super::error::{GatewayError, RpcStatus, StatusError};
use super::request::{content_type_of, GatewayRequest};
use super::sse::SseDecoder;

/// Wire envelope multiplexing stream items and terminal errors:
/// `{"result": …}` carries one value, `{"error": …}` a status object.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct StreamEnvelope {
    pub result: Option<Box<serde_json::value::RawValue>>,
    pub error: Option<Box<serde_json::value::RawValue>>,
}

/// Typed consumer half of a server-streamed call.
///
/// Implements [`Stream`] with `Item = Result<T, GatewayError>`; the
/// tonic-style [`message`](Self::message) accessor is usually more
/// convenient. Values arrive in decode order; the first error terminates
/// the stream; end-of-stream yields `None` with no error. Dropping the
/// stream cancels the worker.
#[derive(Debug)]
pub struct ServerStream<T> {
    values: mpsc::Receiver<T>,
    errors: mpsc::Receiver<GatewayError>,
    cancel: CancellationToken,
    done: bool,
}

impl<T> ServerStream<T> {
    fn new(
        values: mpsc::Receiver<T>,
        errors: mpsc::Receiver<GatewayError>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            values,
            errors,
            cancel,
            done: false,
        }
    }

    /// Receive the next message, `Ok(None)` on clean end-of-stream.
    ///
    /// # Errors
    ///
    /// Returns the stream's terminal error once, after all preceding values
    /// have been delivered.
    pub async fn message(&mut self) -> Result<Option<T>, GatewayError> {
        futures::future::poll_fn(|cx| Pin::new(&mut *self).poll_next(cx))
            .await
            .transpose()
    }
}

impl<T> Stream for ServerStream<T> {
    type Item = Result<T, GatewayError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        // Values first: buffered values precede any terminal error.
        match this.values.poll_recv(cx) {
            Poll::Ready(Some(value)) => return Poll::Ready(Some(Ok(value))),
            Poll::Ready(None) => {
                return match this.errors.poll_recv(cx) {
                    Poll::Ready(Some(err)) => {
                        this.done = true;
                        Poll::Ready(Some(Err(err)))
                    }
                    Poll::Ready(None) => {
                        this.done = true;
                        Poll::Ready(None)
                    }
                    Poll::Pending => Poll::Pending,
                };
            }
            Poll::Pending => {}
        }
        match this.errors.poll_recv(cx) {
            Poll::Ready(Some(err)) => {
                this.done = true;
                Poll::Ready(Some(Err(err)))
            }
            _ => Poll::Pending,
        }
    }
}

impl<T> Drop for ServerStream<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl GatewayClient {
    /// Execute a server-streaming call decoded from Server-Sent-Events.
    ///
    /// The request is sent with `Accept: text/event-stream`; each event's
    /// data payload is parsed as a `{"result"}/{"error"}` envelope. An
    /// `error` envelope terminates the stream with an RPC status error
    /// (from the embedded payload, falling back to the HTTP status code);
    /// envelopes with neither key are protocol keep-alives and are skipped.
    ///
    /// # Errors
    ///
    /// A non-success response fails here, before any delivery: its body is
    /// read once and parsed as a single envelope to extract the terminal
    /// error.
    pub async fn server_streaming<T>(
        &self,
        meta: CallMeta,
        req: GatewayRequest,
    ) -> Result<ServerStream<T>, GatewayError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let res = self.send(&meta, req, true).await?;
        let status = res.status();
        if !status.is_success() {
            let bytes = res.bytes().await?;
            return Err(status_from_stream_error_body(status, &bytes));
        }

        let (values_tx, values_rx) = mpsc::channel(1);
        let (errors_tx, errors_rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        tokio::spawn(run_sse_worker::<T>(
            res,
            status,
            values_tx,
            errors_tx,
            cancel.clone(),
        ));
        Ok(ServerStream::new(values_rx, errors_rx, cancel))
    }

    /// Execute a server-streaming call consumed as raw newline-delimited
    /// chunks, one [`HttpBody`] frame per chunk, each carrying the
    /// response's original `Content-Type`. Concatenating frame data
    /// reproduces the transported bytes exactly.
    ///
    /// # Errors
    ///
    /// Same send/error semantics as [`GatewayClient::server_streaming`].
    pub async fn server_streaming_raw(
        &self,
        meta: CallMeta,
        req: GatewayRequest,
    ) -> Result<ServerStream<HttpBody>, GatewayError> {
        let res = self.send(&meta, req, true).await?;
        let status = res.status();
        if !status.is_success() {
            let bytes = res.bytes().await?;
            return Err(status_from_stream_error_body(status, &bytes));
        }

        let (values_tx, values_rx) = mpsc::channel(1);
        let (errors_tx, errors_rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        tokio::spawn(run_chunk_worker(res, values_tx, errors_tx, cancel.clone()));
        Ok(ServerStream::new(values_rx, errors_rx, cancel))
    }
}

/// Interpret the body of a failed streaming send: one envelope, parsed once
/// before any delivery begins.
pub(crate) fn status_from_stream_error_body(
    http_status: StatusCode,
    body: &[u8],
) -> GatewayError {
    let fallback =
        || StatusError::synthetic(http_status, String::from_utf8_lossy(body).into_owned()).into();
    match serde_json::from_slice::<StreamEnvelope>(body) {
        Ok(envelope) => match envelope.error {
            Some(raw) => match serde_json::from_str::<RpcStatus>(raw.get()) {
                Ok(payload) if payload.code != 0 => StatusError::upstream(payload).into(),
                Ok(_) => fallback(),
                Err(err) => GatewayError::Decode(err),
            },
            None => fallback(),
        },
        Err(_) => fallback(),
    }
}

/// Outcome of one decoded envelope.
enum Step<T> {
    Deliver(T),
    Terminal(GatewayError),
    Skip,
}

fn envelope_step<T: DeserializeOwned>(data: &str, http_status: StatusCode) -> Step<T> {
    let envelope: StreamEnvelope = match serde_json::from_str(data) {
        Ok(envelope) => envelope,
        Err(err) => return Step::Terminal(GatewayError::Decode(err)),
    };
    if let Some(raw) = envelope.error {
        return Step::Terminal(match serde_json::from_str::<RpcStatus>(raw.get()) {
            Ok(payload) if payload.code != 0 => StatusError::upstream(payload).into(),
            Ok(_) => StatusError::synthetic(http_status, raw.get().to_string()).into(),
            Err(err) => GatewayError::Decode(err),
        });
    }
    if let Some(raw) = envelope.result {
        return match serde_json::from_str::<T>(raw.get()) {
            Ok(value) => Step::Deliver(value),
            Err(err) => Step::Terminal(GatewayError::Decode(err)),
        };
    }
    // Neither key: protocol-level keep-alive.
    Step::Skip
}

async fn run_sse_worker<T>(
    res: reqwest::Response,
    http_status: StatusCode,
    values: mpsc::Sender<T>,
    errors: mpsc::Sender<GatewayError>,
    cancel: CancellationToken,
) where
    T: DeserializeOwned + Send + 'static,
{
    let mut body = res.bytes_stream();
    let mut decoder = SseDecoder::new();
    loop {
        while let Some(event) = decoder.next_event() {
            match envelope_step::<T>(&event.data, http_status) {
                Step::Deliver(value) => {
                    tokio::select! {
                        () = cancel.cancelled() => return,
                        sent = values.send(value) => {
                            if sent.is_err() {
                                return;
                            }
                        }
                    }
                }
                Step::Terminal(err) => {
                    tokio::select! {
                        () = cancel.cancelled() => {}
                        _ = errors.send(err) => {}
                    }
                    return;
                }
                Step::Skip => {}
            }
        }
        tokio::select! {
            () = cancel.cancelled() => return,
            chunk = body.next() => match chunk {
                Some(Ok(bytes)) => decoder.push(&bytes),
                Some(Err(err)) => {
                    tokio::select! {
                        () = cancel.cancelled() => {}
                        _ = errors.send(err.into()) => {}
                    }
                    return;
                }
                // End of stream: dropping the senders closes the stream
                // cleanly with no error.
                None => return,
            },
        }
    }
}

async fn run_chunk_worker(
    res: reqwest::Response,
    values: mpsc::Sender<HttpBody>,
    errors: mpsc::Sender<GatewayError>,
    cancel: CancellationToken,
) {
    let content_type = content_type_of(&res);
    let mut body = res.bytes_stream();
    let mut buf = BytesMut::new();
    loop {
        // Emit every complete chunk, delimiter included, so concatenation
        // is byte-exact.
        while let Some(pos) = buf.iter().position(|b| *b == b'\n') {
            let frame = HttpBody {
                content_type: content_type.clone(),
                data: buf.split_to(pos + 1).freeze(),
            };
            tokio::select! {
                () = cancel.cancelled() => return,
                sent = values.send(frame) => {
                    if sent.is_err() {
                        return;
                    }
                }
            }
        }
        tokio::select! {
            () = cancel.cancelled() => return,
            chunk = body.next() => match chunk {
                Some(Ok(bytes)) => buf.extend_from_slice(&bytes),
                Some(Err(err)) => {
                    tokio::select! {
                        () = cancel.cancelled() => {}
                        _ = errors.send(err.into()) => {}
                    }
                    return;
                }
                None => {
                    // A final unterminated chunk is emitted as-is.
                    if !buf.is_empty() {
                        let frame = HttpBody {
                            content_type,
                            data: buf.freeze(),
                        };
                        tokio::select! {
                            () = cancel.cancelled() => {}
                            _ = values.send(frame) => {}
                        }
                    }
                    return;
                }
            },
        }
    }
}
