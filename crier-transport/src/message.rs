use serde::{Deserialize, Serialize};

/// A fully rendered email addressed to one recipient.
///
/// Transports receive messages in this shape and nothing else; rendering
/// and personalization happen before a message gets here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}
