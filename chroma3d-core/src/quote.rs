/// Hand-off links for requesting a print quote
use serde::{Deserialize, Serialize};

use crate::material::Preset;

/// Where quote requests go
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteContact {
    pub email: String,
    /// International number without `+` or spaces, as wa.me expects
    pub whatsapp_number: String,
    pub subject: String,
}

impl Default for QuoteContact {
    fn default() -> Self {
        Self {
            email: "hello@chroma3d.in".to_string(),
            whatsapp_number: "919342972807".to_string(),
            subject: "Chroma3D Quote Request".to_string(),
        }
    }
}

/// Fields of the contact form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactMessage {
    /// Message body prefilled into the chat
    pub fn chat_text(&self) -> String {
        format!(
            "Hi, I have a query about Chroma3D!\n\nName: {}\nEmail: {}\nSubject: {}\nMessage: {}",
            self.name, self.email, self.subject, self.message
        )
    }
}

impl QuoteContact {
    pub fn mailto_link(&self, body: Option<&str>) -> String {
        let mut link = format!(
            "mailto:{}?subject={}",
            self.email,
            urlencoding::encode(&self.subject)
        );
        if let Some(body) = body {
            link.push_str("&body=");
            link.push_str(&urlencoding::encode(body));
        }
        link
    }

    pub fn whatsapp_link(&self, message: &ContactMessage) -> String {
        format!(
            "https://wa.me/{}?text={}",
            self.whatsapp_number,
            urlencoding::encode(&message.chat_text())
        )
    }
}

/// Describe the previewed model for a quote request
pub fn quote_message(file_name: &str, preset: &Preset) -> String {
    format!(
        "I'd like a quote for printing {} in {} ({}).",
        file_name,
        preset.name,
        preset.color.to_hex()
    )
}
