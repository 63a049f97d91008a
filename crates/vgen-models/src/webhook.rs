//! Inbound webhook envelope.

/// Header carrying the provider request id.
pub const HEADER_REQUEST_ID: &str = "x-fal-webhook-request-id";
/// Header carrying the provider account user id.
pub const HEADER_USER_ID: &str = "x-fal-webhook-user-id";
/// Header carrying the unix timestamp (seconds) the payload was signed at.
pub const HEADER_TIMESTAMP: &str = "x-fal-webhook-timestamp";
/// Header carrying the hex-encoded detached Ed25519 signature.
pub const HEADER_SIGNATURE: &str = "x-fal-webhook-signature";

/// Signed webhook delivery. Verified once, then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEnvelope {
    pub request_id: String,
    pub user_id: String,
    /// Timestamp exactly as received; it is part of the signed message.
    pub timestamp: String,
    pub signature_hex: String,
    pub raw_body: Vec<u8>,
}

impl WebhookEnvelope {
    /// Timestamp parsed as unix seconds.
    pub fn timestamp_seconds(&self) -> Option<i64> {
        self.timestamp.trim().parse().ok()
    }

    /// Message covered by the signature: request id, user id, timestamp and
    /// the hex digest of the raw body, joined by newlines.
    pub fn signed_message(&self, body_digest_hex: &str) -> String {
        format!(
            "{}\n{}\n{}\n{}",
            self.request_id, self.user_id, self.timestamp, body_digest_hex
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_message_layout() {
        let envelope = WebhookEnvelope {
            request_id: "req".into(),
            user_id: "user".into(),
            timestamp: "1700000000".into(),
            signature_hex: String::new(),
            raw_body: Vec::new(),
        };
        assert_eq!(envelope.signed_message("abc"), "req\nuser\n1700000000\nabc");
        assert_eq!(envelope.timestamp_seconds(), Some(1_700_000_000));
    }
}
