//! TCP front end of the ledger. Each connection may send any number of
//! newline-terminated requests; each gets one reply line, in order.

use std::{future::Future, io, net::SocketAddr};

use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
};
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    config::SocketSettings,
    ledger::Ledger,
    protocol::{self, Reply},
};

/// Longest request line accepted before the connection is dropped.
pub const MAX_LINE_BYTES: u64 = 64 * 1024;

pub async fn bind(settings: &SocketSettings) -> io::Result<TcpListener> {
    TcpListener::bind(settings.address()).await
}

/// Accepts connections until `shutdown` resolves. Connections already being
/// served keep running on their own tasks.
pub async fn run(
    listener: TcpListener,
    ledger: Ledger,
    shutdown: impl Future<Output = ()>,
) -> io::Result<()> {
    let local = listener.local_addr()?;
    tracing::info!(%local, "ledger server listening");

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("stopping ledger server");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let ledger = ledger.clone();
                    let span = tracing::info_span!("session", id = %Uuid::new_v4(), %peer);
                    tokio::spawn(
                        async move {
                            tracing::info!("client connected");
                            match handle_connection(stream, &ledger).await {
                                Ok(served) => tracing::info!(served, "client disconnected"),
                                Err(e) => tracing::warn!(error = %e, "connection aborted"),
                            }
                        }
                        .instrument(span),
                    );
                }
                Err(e) => tracing::warn!(error = %e, "failed to accept connection"),
            },
        }
    }

    Ok(())
}

/// Binds the configured address and serves until Ctrl-C.
pub async fn serve(settings: &SocketSettings, ledger: Ledger) -> io::Result<()> {
    let listener = bind(settings).await?;
    run(listener, ledger, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

/// Serves one connection. Returns the number of requests answered.
async fn handle_connection(stream: TcpStream, ledger: &Ledger) -> io::Result<usize> {
    let peer: Option<SocketAddr> = stream.peer_addr().ok();
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    let mut served = 0;

    loop {
        line.clear();
        let read = (&mut reader)
            .take(MAX_LINE_BYTES)
            .read_until(b'\n', &mut line)
            .await?;

        if read == 0 {
            break;
        }
        if line.last() != Some(&b'\n') {
            if read as u64 >= MAX_LINE_BYTES {
                tracing::warn!(?peer, "request line too long, closing");
                let reply = Reply::failure(protocol::MSG_INVALID_COMMAND);
                writer.write_all(reply.to_line().as_bytes()).await?;
            }
            // Trailing bytes without a newline are not a request.
            break;
        }

        line.pop();
        let raw = String::from_utf8_lossy(&line);
        tracing::debug!(request = %raw, "request received");

        let reply = ledger.handle_line(&raw).await;
        writer.write_all(reply.to_line().as_bytes()).await?;
        served += 1;
    }

    Ok(served)
}
