//! Document sharing links.
//!
//! Sharing never goes through the backend: the app builds a link and hands it
//! to the platform (mail client or WhatsApp).

use crate::error::ShareError;

/// Message sent along with a shared document.
pub fn share_message(document_name: &str) -> String {
    format!("Sharing document: {document_name}")
}

/// Keep only the ASCII digits of a phone number.
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

/// `https://wa.me/<digits>?text=<message>` deep link.
pub fn whatsapp_link(phone: &str, document_name: &str) -> Result<String, ShareError> {
    let digits = normalize_phone(phone);
    if digits.is_empty() {
        return Err(ShareError::InvalidPhone);
    }
    Ok(format!(
        "https://wa.me/{}?text={}",
        digits,
        urlencoding::encode(&share_message(document_name))
    ))
}

/// `mailto:` link with the document name as subject and the share message as body.
pub fn email_link(recipient: &str, document_name: &str) -> Result<String, ShareError> {
    let recipient = recipient.trim();
    if recipient.is_empty() {
        return Err(ShareError::MissingRecipient);
    }
    Ok(format!(
        "mailto:{}?subject={}&body={}",
        recipient,
        urlencoding::encode(document_name),
        urlencoding::encode(&share_message(document_name))
    ))
}
