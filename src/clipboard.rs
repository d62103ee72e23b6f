use anyhow::{anyhow, Result};

use crate::app::Notice;

pub const COPIED_MESSAGE: &str = "Prompt copied to clipboard!";
pub const COPY_FAILED_MESSAGE: &str = "Failed to copy prompt.";

/// Opens short-lived handles to a clipboard
pub trait ClipboardProvider {
    fn open(&self) -> Result<Box<dyn ClipboardHandle>>;
}

pub trait ClipboardHandle {
    fn write_text(&mut self, text: &str) -> Result<()>;
}

/// The system clipboard via arboard
pub struct SystemClipboard;

struct ArboardHandle(arboard::Clipboard);

impl ClipboardProvider for SystemClipboard {
    fn open(&self) -> Result<Box<dyn ClipboardHandle>> {
        let clipboard =
            arboard::Clipboard::new().map_err(|e| anyhow!("clipboard unavailable: {}", e))?;
        Ok(Box::new(ArboardHandle(clipboard)))
    }
}

impl ClipboardHandle for ArboardHandle {
    fn write_text(&mut self, text: &str) -> Result<()> {
        self.0
            .set_text(text.to_string())
            .map_err(|e| anyhow!("clipboard write failed: {}", e))
    }
}

/// Copy the displayed result and report the outcome as a blocking notice
pub fn copy_result(provider: &dyn ClipboardProvider, text: &str) -> Notice {
    match write_transient(provider, text) {
        Ok(()) => {
            tracing::info!(len = text.len(), "copied result to clipboard");
            Notice::new("Copied", COPIED_MESSAGE)
        }
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "Failed to copy text");
            Notice::new("Clipboard", COPY_FAILED_MESSAGE)
        }
    }
}

fn write_transient(provider: &dyn ClipboardProvider, text: &str) -> Result<()> {
    let mut handle = provider.open()?;
    // `handle` is released when this scope ends, on error as well
    handle.write_text(text)
}
