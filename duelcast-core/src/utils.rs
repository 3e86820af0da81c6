pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:global.stun.twilio.com:3478";

/// Prefix the relay puts in front of every room topic.
pub const ROOM_TOPIC_PREFIX: &str = "room:";
