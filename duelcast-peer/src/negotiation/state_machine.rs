use crate::bridge::AppInbox;
use crate::negotiation::{CandidateQueue, CloseListener};
use crate::signaling::Outbox;
use crate::transport::{PeerTransport, TransportEvent, TransportState};
use duelcast_core::{
    AnswerPayload, ConnectionError, ConnectionState, NegotiationRole, NetworkCandidate,
    OfferPayload, PeerIdentity, ReadyPayload, RemoteStream, SdpKind, SessionDescription,
    SignalEnvelope,
};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Two-party offer/answer negotiation for one connection attempt.
///
/// All mutation goes through `&mut self`, driven by a single
/// [`NegotiationActor`](crate::negotiation::NegotiationActor). Every transport
/// call is raced against the close signal and its result discarded if close
/// wins.
pub struct NegotiationStateMachine<T: PeerTransport> {
    local: PeerIdentity,
    transport: Arc<T>,
    outbox: Outbox,
    close: CloseListener,

    state: ConnectionState,
    role: NegotiationRole,
    local_description: Option<SessionDescription>,
    remote_description: Option<SessionDescription>,
    candidates: CandidateQueue,
    remote_tracks: Vec<T::RemoteTrack>,

    state_tx: watch::Sender<ConnectionState>,
    remote_name_tx: watch::Sender<Option<String>>,
    remote_stream_tx: watch::Sender<Option<RemoteStream<T::RemoteTrack>>>,
    inbox: AppInbox,
}

impl<T: PeerTransport> NegotiationStateMachine<T> {
    pub fn new(
        local: PeerIdentity,
        transport: Arc<T>,
        outbox: Outbox,
        close: CloseListener,
        inbox: AppInbox,
    ) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Idle);
        let (remote_name_tx, _) = watch::channel(None);
        let (remote_stream_tx, _) = watch::channel(None);

        Self {
            local,
            transport,
            outbox,
            close,
            state: ConnectionState::Idle,
            role: NegotiationRole::Undecided,
            local_description: None,
            remote_description: None,
            candidates: CandidateQueue::new(),
            remote_tracks: Vec::new(),
            state_tx,
            remote_name_tx,
            remote_stream_tx,
            inbox,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn role(&self) -> NegotiationRole {
        self.role
    }

    pub fn local_identity(&self) -> &PeerIdentity {
        &self.local
    }

    pub fn has_remote_description(&self) -> bool {
        self.remote_description.is_some()
    }

    pub fn queued_candidates(&self) -> usize {
        self.candidates.len()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    pub fn watch_remote_name(&self) -> watch::Receiver<Option<String>> {
        self.remote_name_tx.subscribe()
    }

    pub fn watch_remote_stream(&self) -> watch::Receiver<Option<RemoteStream<T::RemoteTrack>>> {
        self.remote_stream_tx.subscribe()
    }

    /// The relay confirmed our subscription: announce ourselves.
    pub async fn on_subscribed(&mut self) {
        if self.state != ConnectionState::Idle {
            debug!("Subscription confirmed again in {} state, ignoring", self.state);
            return;
        }

        self.set_state(ConnectionState::AwaitingRemote);
        self.announce().await;
    }

    pub async fn dispatch(&mut self, envelope: SignalEnvelope) {
        match envelope {
            SignalEnvelope::AppMessage(card) => self.inbox.deliver(card),
            other if self.state.is_terminal() => {
                debug!("Ignoring {} in {} state", other.event(), self.state);
            }
            SignalEnvelope::Ready(payload) => self.on_ready(payload).await,
            SignalEnvelope::Offer(payload) => self.on_offer(payload).await,
            SignalEnvelope::Answer(payload) => self.on_answer(payload).await,
            SignalEnvelope::IceCandidate(candidate) => self.on_remote_candidate(candidate).await,
        }
    }

    pub async fn on_transport_event(&mut self, event: TransportEvent<T::RemoteTrack>) {
        match event {
            TransportEvent::CandidateDiscovered(candidate) => {
                if self.state.is_terminal() {
                    return;
                }
                self.outbox.send(SignalEnvelope::IceCandidate(candidate)).await;
            }

            TransportEvent::TrackReceived(track) => {
                self.remote_tracks.push(track);
                if self.state == ConnectionState::Connected {
                    self.publish_remote_stream();
                }
            }

            TransportEvent::StateChanged(TransportState::Connected) => {
                if self.state.is_terminal() {
                    return;
                }
                self.set_state(ConnectionState::Connected);
                self.publish_remote_stream();
            }

            TransportEvent::StateChanged(TransportState::Failed) => {
                if self.state.is_terminal() {
                    return;
                }
                error!(
                    "{}",
                    ConnectionError::NegotiationFailed("transport reported failure".into())
                );
                self.set_state(ConnectionState::Failed);
            }

            TransportEvent::StateChanged(TransportState::Disconnected) => {
                warn!("Transport disconnected for {}", self.local.id);
            }

            TransportEvent::StateChanged(other) => {
                debug!("Transport state {:?}", other);
            }
        }
    }

    /// Tears everything down. Safe to call repeatedly.
    pub async fn close(&mut self) {
        if self.state == ConnectionState::Closed {
            return;
        }

        info!("Closing connection for {} in {}", self.local.id, self.outbox.handle().room());
        self.set_state(ConnectionState::Closed);
        self.candidates.clear();

        if let Err(e) = self.transport.close().await {
            warn!("Failed to close transport: {:#}", e);
        }
        self.outbox.release().await;
        self.remote_stream_tx.send_replace(None);
    }

    async fn on_ready(&mut self, payload: ReadyPayload) {
        if payload.client_id == self.local.id {
            debug!("Ignoring own ready");
            return;
        }
        self.note_remote_name(payload.username);

        if self.remote_description.is_some()
            || self.role != NegotiationRole::Undecided
            || self.state != ConnectionState::AwaitingRemote
        {
            debug!("Ready from {} after negotiation started, ignoring", payload.client_id);
            return;
        }

        if self.local.offers_to(&payload.client_id) {
            info!("{} offers to {}", self.local.id, payload.client_id);
            self.start_offer().await;
        } else {
            // The remote side offers; make sure it has heard from us.
            self.announce().await;
        }
    }

    async fn start_offer(&mut self) {
        self.role = NegotiationRole::Offerer;
        self.set_state(ConnectionState::Negotiating);

        let offer = match self.guarded(self.transport.create_offer()).await {
            None => return,
            Some(Ok(offer)) => offer,
            Some(Err(e)) => return self.abandon_offer(e),
        };

        match self.guarded(self.transport.set_local_description(offer.clone())).await {
            None => return,
            Some(Err(e)) => return self.abandon_offer(e),
            Some(Ok(())) => {}
        }

        self.local_description = Some(offer.clone());
        self.outbox
            .send(SignalEnvelope::offer(offer, self.local.display_name.clone()))
            .await;
    }

    fn abandon_offer(&mut self, e: anyhow::Error) {
        warn!("{}", ConnectionError::DescriptionApplyFailed(format!("{e:#}")));
        self.role = NegotiationRole::Undecided;
        self.set_state(ConnectionState::AwaitingRemote);
    }

    async fn on_offer(&mut self, payload: OfferPayload) {
        self.note_remote_name(payload.username);

        if self.remote_description.is_some() {
            debug!("Ignoring duplicate offer");
            return;
        }
        if self.role == NegotiationRole::Offerer {
            warn!(
                "{}",
                ConnectionError::DescriptionApplyFailed("offer received while offering".into())
            );
            return;
        }

        let offer = payload.offer;
        if offer.kind != SdpKind::Offer {
            warn!(
                "{}",
                ConnectionError::DescriptionApplyFailed(format!("expected offer, got {:?}", offer.kind))
            );
            return;
        }

        match self.guarded(self.transport.set_remote_description(offer.clone())).await {
            None => return,
            Some(Err(e)) => {
                warn!("{}", ConnectionError::DescriptionApplyFailed(format!("{e:#}")));
                return;
            }
            Some(Ok(())) => {}
        }

        self.remote_description = Some(offer);
        self.role = NegotiationRole::Answerer;
        self.set_state(ConnectionState::Negotiating);
        self.drain_candidates().await;
        if self.close.is_closed() {
            return;
        }

        let answer = match self.guarded(self.transport.create_answer()).await {
            None => return,
            Some(Ok(answer)) => answer,
            Some(Err(e)) => return self.fail(e),
        };

        match self.guarded(self.transport.set_local_description(answer.clone())).await {
            None => return,
            Some(Err(e)) => return self.fail(e),
            Some(Ok(())) => {}
        }

        self.local_description = Some(answer.clone());
        self.outbox
            .send(SignalEnvelope::answer(answer, self.local.display_name.clone()))
            .await;
    }

    async fn on_answer(&mut self, payload: AnswerPayload) {
        self.note_remote_name(payload.username);

        if self.remote_description.is_some() {
            debug!("Ignoring duplicate answer");
            return;
        }
        if self.role != NegotiationRole::Offerer || self.local_description.is_none() {
            debug!("Ignoring answer to an offer we never made");
            return;
        }

        let answer = payload.answer;
        if answer.kind != SdpKind::Answer {
            warn!(
                "{}",
                ConnectionError::DescriptionApplyFailed(format!("expected answer, got {:?}", answer.kind))
            );
            return;
        }

        match self.guarded(self.transport.set_remote_description(answer.clone())).await {
            None => return,
            Some(Err(e)) => {
                warn!("{}", ConnectionError::DescriptionApplyFailed(format!("{e:#}")));
                return;
            }
            Some(Ok(())) => {}
        }

        self.remote_description = Some(answer);
        self.drain_candidates().await;
    }

    async fn on_remote_candidate(&mut self, candidate: NetworkCandidate) {
        if self.remote_description.is_none() {
            debug!("Queueing candidate until the remote description is set");
            self.candidates.enqueue(candidate);
            return;
        }

        match self.guarded(self.transport.add_ice_candidate(candidate)).await {
            None | Some(Ok(())) => {}
            Some(Err(e)) => {
                warn!("{}", ConnectionError::CandidateApplyFailed(format!("{e:#}")));
            }
        }
    }

    async fn drain_candidates(&mut self) {
        if self.candidates.is_empty() {
            return;
        }

        let transport = self.transport.clone();
        let report = self
            .candidates
            .drain_into(&self.close, |candidate| {
                let transport = transport.clone();
                async move { transport.add_ice_candidate(candidate).await }
            })
            .await;

        info!(
            "{}: queued candidates applied={} failed={} dropped={}",
            self.local.id, report.applied, report.failed, report.dropped
        );
    }

    async fn announce(&self) {
        self.outbox
            .send(SignalEnvelope::ready(
                self.local.id.clone(),
                self.local.display_name.clone(),
            ))
            .await;
    }

    fn fail(&mut self, e: anyhow::Error) {
        error!("{}", ConnectionError::NegotiationFailed(format!("{e:#}")));
        self.set_state(ConnectionState::Failed);
    }

    /// `None` when the connection was closed before `fut` finished.
    async fn guarded<F: Future>(&self, fut: F) -> Option<F::Output> {
        let close = self.close.clone();
        tokio::select! {
            biased;
            _ = close.closed() => None,
            out = fut => Some(out),
        }
    }

    fn set_state(&mut self, next: ConnectionState) {
        if self.state == next {
            return;
        }
        info!("{}: {} -> {}", self.local.id, self.state, next);
        self.state = next;
        self.state_tx.send_replace(next);
    }

    fn note_remote_name(&self, name: Option<String>) {
        let Some(name) = name else {
            return;
        };
        self.remote_name_tx.send_if_modified(|current| {
            if current.as_deref() == Some(name.as_str()) {
                return false;
            }
            *current = Some(name);
            true
        });
    }

    fn publish_remote_stream(&self) {
        if self.remote_tracks.is_empty() {
            return;
        }
        self.remote_stream_tx
            .send_replace(Some(RemoteStream::new(self.remote_tracks.clone())));
    }
}
