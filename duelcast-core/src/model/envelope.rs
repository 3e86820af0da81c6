use crate::model::card::CardDeclaration;
use crate::model::description::SessionDescription;
use crate::model::ice::NetworkCandidate;
use crate::model::peer::PeerId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadyPayload {
    #[serde(rename = "clientId")]
    pub client_id: PeerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OfferPayload {
    pub offer: SessionDescription,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerPayload {
    pub answer: SessionDescription,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Everything that travels over the relay, as
/// `{"event": "<kind>", "payload": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum SignalEnvelope {
    Ready(ReadyPayload),
    Offer(OfferPayload),
    Answer(AnswerPayload),
    IceCandidate(NetworkCandidate),
    #[serde(rename = "card-declared")]
    AppMessage(CardDeclaration),
}

impl SignalEnvelope {
    pub fn ready(client_id: PeerId, username: impl Into<String>) -> Self {
        Self::Ready(ReadyPayload {
            client_id,
            username: Some(username.into()),
        })
    }

    pub fn offer(offer: SessionDescription, username: impl Into<String>) -> Self {
        Self::Offer(OfferPayload {
            offer,
            username: Some(username.into()),
        })
    }

    pub fn answer(answer: SessionDescription, username: impl Into<String>) -> Self {
        Self::Answer(AnswerPayload {
            answer,
            username: Some(username.into()),
        })
    }

    /// Wire name of the event, used in logs.
    pub fn event(&self) -> &'static str {
        match self {
            Self::Ready(_) => "ready",
            Self::Offer(_) => "offer",
            Self::Answer(_) => "answer",
            Self::IceCandidate(_) => "ice-candidate",
            Self::AppMessage(_) => "card-declared",
        }
    }
}
