//! Accept loop: binds one IPv4 `SO_REUSEADDR` listening socket and spawns one
//! session task per accepted connection, grounded in `shroom-net`'s
//! `ShroomServer::serve_tcp` (`server::mod`) — generalized from its
//! `TcpListenerStream` wrapper to a direct `tokio::select!` against
//! `ctrl_c()` so the loop also honors a single process-wide stop signal.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpSocket};

use crate::broker::BrokerState;
use crate::error::BrokerResult;
use crate::session;

/// Binds the IPv4 `SO_REUSEADDR` listening socket without yet accepting on
/// it, so the caller can log/act on a successful bind before handing control
/// to [`serve`].
pub fn bind(port: u16) -> BrokerResult<TcpListener> {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    let socket = TcpSocket::new_v4()?;
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    Ok(socket.listen(1024)?)
}

pub async fn serve(listener: TcpListener, broker: Arc<BrokerState>) -> BrokerResult<()> {
    let next_id = AtomicU64::new(1);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        let id = next_id.fetch_add(1, Ordering::Relaxed);
                        log::debug!("accepted connection {id} from {peer}");
                        let broker = Arc::clone(&broker);
                        tokio::spawn(async move {
                            session::run(broker, stream, id).await;
                        });
                    }
                    Err(err) => {
                        // Tokio/mio retries EINTR internally before it ever
                        // reaches here, so any error observed at this point is
                        // a genuine fault: log it and stop accepting.
                        log::error!("accept failed, stopping accept loop: {err}");
                        return Err(err.into());
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("shutdown signal received, stopping accept loop");
                break;
            }
        }
    }

    Ok(())
}
