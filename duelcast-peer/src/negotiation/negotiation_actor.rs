use crate::negotiation::{CloseListener, NegotiationStateMachine};
use crate::signaling::RelayEvent;
use crate::transport::{PeerTransport, TransportEvent};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Event loop owning one [`NegotiationStateMachine`].
///
/// Relay events, transport events and the close signal are consumed one at a
/// time, so the machine never sees two steps interleave.
pub struct NegotiationActor<T: PeerTransport> {
    machine: NegotiationStateMachine<T>,
    relay_rx: mpsc::UnboundedReceiver<RelayEvent>,
    transport_rx: mpsc::Receiver<TransportEvent<T::RemoteTrack>>,
    close: CloseListener,
}

impl<T: PeerTransport> NegotiationActor<T> {
    pub fn new(
        machine: NegotiationStateMachine<T>,
        relay_rx: mpsc::UnboundedReceiver<RelayEvent>,
        transport_rx: mpsc::Receiver<TransportEvent<T::RemoteTrack>>,
        close: CloseListener,
    ) -> Self {
        Self {
            machine,
            relay_rx,
            transport_rx,
            close,
        }
    }

    pub async fn run(mut self) {
        info!(
            "Negotiation loop started for {}",
            self.machine.local_identity().id
        );

        let mut relay_open = true;
        let mut transport_open = true;

        loop {
            tokio::select! {
                biased;

                _ = self.close.closed() => {
                    debug!("Close requested");
                    break;
                }

                evt = self.relay_rx.recv(), if relay_open => {
                    match evt {
                        Some(RelayEvent::Subscribed) => self.machine.on_subscribed().await,
                        Some(RelayEvent::Envelope(envelope)) => self.machine.dispatch(envelope).await,
                        Some(RelayEvent::Closed) | None => {
                            warn!("Relay subscription ended");
                            relay_open = false;
                        }
                    }
                }

                evt = self.transport_rx.recv(), if transport_open => {
                    match evt {
                        Some(e) => self.machine.on_transport_event(e).await,
                        None => {
                            warn!("Transport channel closed unexpectedly");
                            transport_open = false;
                        }
                    }
                }
            }
        }

        self.machine.close().await;
        info!(
            "Negotiation loop finished for {}",
            self.machine.local_identity().id
        );
    }
}
