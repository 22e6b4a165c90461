//! Per-connection read loop.

use std::sync::Arc;

use protocol::FrameCodec;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::watch;

use super::SessionManager;
use crate::dispatch::PacketDispatcher;
use crate::error::Result;
use crate::game::{GameActions, PlayerContext};

const READ_CHUNK: usize = 4 * 1024;

/// Everything a connection task shares with the rest of the server.
#[derive(Clone)]
pub struct ConnectionServices {
    pub dispatcher: PacketDispatcher,
    pub actions: Arc<dyn GameActions>,
    pub codec: FrameCodec,
    pub sessions: SessionManager,
}

/// Reads packets from `stream` and dispatches them one at a time in arrival
/// order until the peer disconnects or shutdown is signalled.
///
/// A framing error leaves the stream position unknown and ends the connection
/// with an error; everything that happens inside a single packet is absorbed
/// by the dispatcher.
pub async fn serve_connection<S>(
    mut stream: S,
    connection_id: u64,
    services: ConnectionServices,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()>
where
    S: AsyncRead + Unpin + Send,
{
    let mut ctx = PlayerContext::new(connection_id, services.actions.clone());
    let mut buffer: Vec<u8> = Vec::with_capacity(READ_CHUNK);
    let mut chunk = vec![0u8; READ_CHUNK];

    loop {
        let read = tokio::select! {
            read = stream.read(&mut chunk) => read?,
            _ = shutdown.changed() => {
                log::debug!("[{}] Closing on shutdown", connection_id);
                return Ok(());
            }
        };
        if read == 0 {
            log::debug!("[{}] Peer closed the connection", connection_id);
            return Ok(());
        }
        buffer.extend_from_slice(&chunk[..read]);

        let (frames, consumed) = services.codec.decode_batch(&buffer)?;
        for frame in frames {
            let outcome = services.dispatcher.dispatch(&mut ctx, frame).await;
            services.sessions.record(connection_id, outcome);
        }
        buffer.drain(..consumed);
    }
}
