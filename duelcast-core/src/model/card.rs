use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// A card one player declares to the other.
///
/// Field names on the wire follow the web client (`desc`, `image_url`, ...);
/// the camelCase spellings are accepted when reading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardDeclaration {
    pub id: String,
    pub name: String,
    #[serde(rename = "desc", alias = "description", default)]
    pub description: String,
    #[serde(alias = "imageUrl", default)]
    pub image_url: String,
    #[serde(alias = "imageUrlSmall", default)]
    pub image_url_small: String,
    /// Milliseconds since the unix epoch, set by the declaring side.
    pub timestamp: u64,
}

impl CardDeclaration {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        image_url: impl Into<String>,
        image_url_small: impl Into<String>,
    ) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        Self {
            id: Uuid::new_v4().simple().to_string()[..9].to_owned(),
            name: name.into(),
            description: description.into(),
            image_url: image_url.into(),
            image_url_small: image_url_small.into(),
            timestamp,
        }
    }

    /// Same declaration delivered twice: equal timestamp and name.
    pub fn is_redelivery_of(&self, other: &CardDeclaration) -> bool {
        self.timestamp == other.timestamp && self.name == other.name
    }
}
