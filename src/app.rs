use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::api::{ApiClient, ChatBackend, PromptBackend};
use crate::chat::{default_quick_replies, ChatWidget};
use crate::clipboard::{copy_result, ClipboardProvider, SystemClipboard};
use crate::config::Config;
use crate::prompt_form::PromptForm;
use crate::provider::Provider;

/// Modal message that swallows the next key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub body: String,
}

impl Notice {
    pub fn new(title: &str, body: &str) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
        }
    }
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub notice: Option<Notice>,

    // Widgets
    pub form: PromptForm,
    pub chat: ChatWidget,
    clipboard: Box<dyn ClipboardProvider>,

    // Save provider changes to the config file
    persist_provider: bool,
    pub base_url: String,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Chat log geometry (updated during render)
    pub chat_scroll: u16,
    pub chat_max_scroll: u16,
}

impl App {
    pub fn new(config: &Config, base_url: &str, provider: Provider) -> Self {
        let client = Arc::new(ApiClient::new(base_url));
        let mut app = Self::with_parts(
            client.clone(),
            client.clone(),
            Box::new(SystemClipboard),
            provider,
            Duration::from_millis(config.display_delay_ms()),
        );
        app.base_url = client.base_url().to_string();
        app.persist_provider = true;
        app
    }

    pub fn with_parts(
        prompt_backend: Arc<dyn PromptBackend>,
        chat_backend: Arc<dyn ChatBackend>,
        clipboard: Box<dyn ClipboardProvider>,
        provider: Provider,
        display_delay: Duration,
    ) -> Self {
        Self {
            should_quit: false,
            notice: None,
            form: PromptForm::new(prompt_backend, provider, display_delay),
            chat: ChatWidget::new(chat_backend, default_quick_replies()),
            clipboard,
            persist_provider: false,
            base_url: String::new(),
            animation_frame: 0,
            chat_scroll: 0,
            chat_max_scroll: 0,
        }
    }

    /// Tick animation frame and reveal delayed results (called by Tick event)
    pub fn tick(&mut self, now: Instant) {
        if self.form.spinner_visible() || self.chat.is_waiting() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        self.form.tick(now);
    }

    /// Collect any finished network requests
    pub async fn poll_tasks(&mut self) {
        self.form.poll().await;
        self.chat.poll().await;
    }

    pub fn copy_result(&mut self) {
        let notice = copy_result(self.clipboard.as_ref(), self.form.result());
        self.notice = Some(notice);
    }

    pub fn cycle_provider(&mut self, forward: bool) {
        self.form.provider = if forward {
            self.form.provider.next()
        } else {
            self.form.provider.prev()
        };
        if self.persist_provider {
            if let Err(e) = Config::save_provider(self.form.provider) {
                tracing::warn!(error = %e, "could not save provider selection");
            }
        }
    }
}
