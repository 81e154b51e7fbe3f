//! System clipboard adapters for the core `Clipboard` trait.

use anyhow::Result;
use scrollterm_core::host::Clipboard;

/// Clipboard backed by the operating system, via arboard.
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self> {
        Ok(Self {
            inner: arboard::Clipboard::new()?,
        })
    }
}

impl Clipboard for SystemClipboard {
    fn get_text(&mut self) -> Option<String> {
        match self.inner.get_text() {
            Ok(text) => Some(text),
            Err(arboard::Error::ContentNotAvailable) => None,
            Err(err) => {
                tracing::warn!("clipboard read failed: {err}");
                None
            }
        }
    }

    fn set_text(&mut self, text: &str) {
        if let Err(err) = self.inner.set_text(text.to_string()) {
            tracing::warn!("clipboard write failed: {err}");
        }
    }
}

/// Clipboard that holds text in memory only. Used when the system
/// clipboard is unavailable (headless sessions).
#[derive(Default)]
pub struct LocalClipboard {
    content: Option<String>,
}

impl Clipboard for LocalClipboard {
    fn get_text(&mut self) -> Option<String> {
        self.content.clone()
    }

    fn set_text(&mut self, text: &str) {
        self.content = Some(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_clipboard_round_trip() {
        let mut clipboard = LocalClipboard::default();
        assert_eq!(clipboard.get_text(), None);
        clipboard.set_text("copied");
        assert_eq!(clipboard.get_text().as_deref(), Some("copied"));
    }
}
