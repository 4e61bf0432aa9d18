//! Framed RPC plumbing shared by every Shoal service.
//!
//! One connection carries a sequence of request/response exchanges:
//! length-delimited frames over TCP, each frame a postcard-encoded
//! message. Connections are long-lived and each side drives its end
//! serially, so there is no request multiplexing and no per-message
//! correlation id.

use futures::{SinkExt, StreamExt};
use serde::{Serialize, de::DeserializeOwned};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::config::Endpoint;

#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("message codec error: {0}")]
    Codec(#[from] postcard::Error),
    #[error("connection closed by peer")]
    Closed,
    #[error("peer sent an unexpected message")]
    UnexpectedMessage,
}

/// A typed message channel over one TCP stream.
#[derive(Debug)]
pub struct Connection {
    framed: Framed<TcpStream, LengthDelimitedCodec>,
}

impl Connection {
    /// Connects to `endpoint`. Request frames are small, so Nagle
    /// batching is disabled.
    pub async fn connect(endpoint: &Endpoint) -> Result<Self, RpcError> {
        let stream = TcpStream::connect((endpoint.host.as_str(), endpoint.port)).await?;
        stream.set_nodelay(true)?;
        Ok(Self::new(stream))
    }

    /// Wraps an already-accepted stream.
    pub fn new(stream: TcpStream) -> Self {
        Connection {
            framed: Framed::new(stream, LengthDelimitedCodec::new()),
        }
    }

    /// Sends one message.
    pub async fn send<T: Serialize>(&mut self, msg: &T) -> Result<(), RpcError> {
        let bytes = postcard::to_allocvec(msg)?;
        self.framed.send(bytes.into()).await?;
        Ok(())
    }

    /// Receives the next message, or `None` when the peer closed the
    /// connection cleanly between frames.
    pub async fn next<T: DeserializeOwned>(&mut self) -> Result<Option<T>, RpcError> {
        match self.framed.next().await {
            Some(frame) => Ok(Some(postcard::from_bytes(&frame?)?)),
            None => Ok(None),
        }
    }

    /// Receives the next message, treating end of stream as an error.
    pub async fn recv<T: DeserializeOwned>(&mut self) -> Result<T, RpcError> {
        self.next().await?.ok_or(RpcError::Closed)
    }

    /// One request/response round trip.
    pub async fn call<Req, Resp>(&mut self, request: &Req) -> Result<Resp, RpcError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        self.send(request).await?;
        self.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tokio::net::TcpListener;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    enum Ping {
        Echo(String),
        Add(u64, u64),
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    enum Pong {
        Echoed(String),
        Sum(u64),
    }

    /// A connection survives multiple exchanges and reports a clean peer
    /// shutdown as `None` on the server side.
    #[tokio::test]
    async fn request_response_round_trips() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let endpoint = Endpoint {
            host: "127.0.0.1".to_string(),
            port: listener.local_addr().unwrap().port(),
        };

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut conn = Connection::new(stream);
            while let Some(request) = conn.next::<Ping>().await.unwrap() {
                let response = match request {
                    Ping::Echo(text) => Pong::Echoed(text),
                    Ping::Add(a, b) => Pong::Sum(a + b),
                };
                conn.send(&response).await.unwrap();
            }
        });

        let mut conn = Connection::connect(&endpoint).await.unwrap();
        let echoed: Pong = conn.call(&Ping::Echo("hello".to_string())).await.unwrap();
        assert_eq!(echoed, Pong::Echoed("hello".to_string()));
        let sum: Pong = conn.call(&Ping::Add(40, 2)).await.unwrap();
        assert_eq!(sum, Pong::Sum(42));

        drop(conn);
        server.await.unwrap();
    }
}
