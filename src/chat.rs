//! Popup chat widget controller.
//!
//! The message log is an ordered list of entries. Apart from appends, only two
//! edits happen: the typing indicator is removed when a reply lands, and the
//! quick-reply panel is lifted out while a request is pending and put back at
//! the end once the exchange finishes, whatever its outcome.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use ratatui::text::Line;
use tokio::task::JoinHandle;

use crate::api::ChatBackend;
use crate::input::TextInput;
use crate::markdown::render_markdown;

pub const FALLBACK_REPLY: &str = "Sorry, I couldn't reach the assistant. Please try again.";

pub const GREETING: &str = "Hello! I'm **Vani**, your AI prompt optimizer. \
Share a rough prompt and I'll turn it into a precise one.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickReply {
    pub label: String,
    /// Text placed in the input when the suggestion is chosen
    pub message: String,
}

impl QuickReply {
    pub fn new(label: &str, message: &str) -> Self {
        Self {
            label: label.to_string(),
            message: message.to_string(),
        }
    }
}

pub fn default_quick_replies() -> Vec<QuickReply> {
    vec![
        QuickReply::new("Optimize a prompt", "Can you optimize this prompt for me: "),
        QuickReply::new("4-D method?", "What is the 4-D methodology?"),
        QuickReply::new(
            "BASIC vs DETAIL",
            "What's the difference between BASIC and DETAIL mode?",
        ),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickReplyPanel {
    pub replies: Vec<QuickReply>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BotMessage {
    pub source: String,
    pub lines: Vec<Line<'static>>,
}

impl BotMessage {
    fn markdown(source: &str) -> Self {
        Self {
            source: source.to_string(),
            lines: render_markdown(source),
        }
    }

    fn plain(text: &str) -> Self {
        Self {
            source: text.to_string(),
            lines: vec![Line::from(text.to_string())],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatEntry {
    User(String),
    Bot(BotMessage),
    Typing,
    QuickReplies(QuickReplyPanel),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatFocus {
    Input,
    Suggestions,
}

pub struct ChatWidget {
    backend: Arc<dyn ChatBackend>,
    open: bool,
    pub input: TextInput,
    pub focus: ChatFocus,
    log: Vec<ChatEntry>,
    detached_panel: Option<QuickReplyPanel>,
    selected_reply: usize,
    /// `None` keeps the log pinned to its bottom
    scroll: Option<u16>,
    in_flight: Option<JoinHandle<Result<String>>>,
}

impl ChatWidget {
    pub fn new(backend: Arc<dyn ChatBackend>, quick_replies: Vec<QuickReply>) -> Self {
        let mut log = vec![ChatEntry::Bot(BotMessage::markdown(GREETING))];
        if !quick_replies.is_empty() {
            log.push(ChatEntry::QuickReplies(QuickReplyPanel {
                replies: quick_replies,
            }));
        }
        Self {
            backend,
            open: false,
            input: TextInput::default(),
            focus: ChatFocus::Input,
            log,
            detached_panel: None,
            selected_reply: 0,
            scroll: None,
            in_flight: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn log(&self) -> &[ChatEntry] {
        &self.log
    }

    pub fn is_waiting(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn scroll(&self) -> Option<u16> {
        self.scroll
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = None;
    }

    /// Scroll up from `current`, the offset the log was last drawn at
    pub fn scroll_up(&mut self, current: u16, lines: u16) {
        self.scroll = Some(current.saturating_sub(lines));
    }

    pub fn scroll_down(&mut self, current: u16, lines: u16, max: u16) {
        let next = current.saturating_add(lines);
        self.scroll = if next >= max { None } else { Some(next) };
    }

    /// The quick-reply panel, when it is currently shown in the log
    pub fn quick_replies(&self) -> Option<&QuickReplyPanel> {
        self.log.iter().find_map(|e| match e {
            ChatEntry::QuickReplies(panel) => Some(panel),
            _ => None,
        })
    }

    pub fn selected_reply(&self) -> usize {
        self.selected_reply
    }

    pub fn select_next_reply(&mut self) {
        let len = self.quick_replies().map_or(0, |p| p.replies.len());
        if len > 0 {
            self.selected_reply = (self.selected_reply + 1).min(len - 1);
        }
    }

    pub fn select_prev_reply(&mut self) {
        self.selected_reply = self.selected_reply.saturating_sub(1);
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            ChatFocus::Input if self.quick_replies().is_some() => ChatFocus::Suggestions,
            _ => ChatFocus::Input,
        };
    }

    /// Copy a suggestion into the input and focus it. Does not send.
    pub fn choose_quick_reply(&mut self, index: usize) -> bool {
        let Some(reply) = self
            .quick_replies()
            .and_then(|p| p.replies.get(index))
            .cloned()
        else {
            return false;
        };
        self.input.set(&reply.message);
        self.focus = ChatFocus::Input;
        true
    }

    /// Send the current input. Blank input is ignored without a trace.
    pub fn submit(&mut self) -> bool {
        if self.in_flight.is_some() {
            return false;
        }
        let message = self.input.value().trim().to_string();
        if message.is_empty() {
            return false;
        }

        self.log.push(ChatEntry::User(message.clone()));
        self.input.clear();
        self.detach_panel();
        self.log.push(ChatEntry::Typing);
        self.scroll_to_bottom();

        tracing::info!(len = message.len(), "sending chat message");
        let backend = Arc::clone(&self.backend);
        self.in_flight = Some(tokio::spawn(async move { backend.chat(&message).await }));
        true
    }

    fn detach_panel(&mut self) {
        if let Some(pos) = self
            .log
            .iter()
            .position(|e| matches!(e, ChatEntry::QuickReplies(_)))
        {
            if let ChatEntry::QuickReplies(panel) = self.log.remove(pos) {
                self.detached_panel = Some(panel);
            }
        }
    }

    /// Collect the reply if the request has finished
    pub async fn poll(&mut self) {
        if self.in_flight.as_ref().is_some_and(|h| h.is_finished()) {
            self.wait().await;
        }
    }

    pub async fn wait(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            let outcome = match handle.await {
                Ok(result) => result,
                Err(e) => Err(anyhow!("chat request task failed: {}", e)),
            };
            self.complete(outcome);
        }
    }

    fn complete(&mut self, outcome: Result<String>) {
        self.log.retain(|e| !matches!(e, ChatEntry::Typing));

        let message = match outcome {
            Ok(reply) => BotMessage::markdown(&reply),
            Err(e) => {
                tracing::error!(error = %format!("{:#}", e), "chat request failed");
                BotMessage::plain(FALLBACK_REPLY)
            }
        };
        self.log.push(ChatEntry::Bot(message));

        // Put the suggestions back after the newest message
        self.detach_panel();
        if let Some(panel) = self.detached_panel.take() {
            self.log.push(ChatEntry::QuickReplies(panel));
        }
        self.scroll_to_bottom();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeChat {
        reply: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl FakeChat {
        fn replying(reply: &'static str) -> Arc<Self> {
            Arc::new(Self {
                reply: Some(reply),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: None,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ChatBackend for FakeChat {
        async fn chat(&self, _message: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .map(str::to_string)
                .ok_or_else(|| anyhow!("network unreachable"))
        }
    }

    fn widget(backend: Arc<FakeChat>) -> ChatWidget {
        ChatWidget::new(backend, default_quick_replies())
    }

    fn count<F: Fn(&ChatEntry) -> bool>(chat: &ChatWidget, f: F) -> usize {
        chat.log().iter().filter(|&e| f(e)).count()
    }

    fn assert_panel_last(chat: &ChatWidget) {
        assert!(matches!(chat.log().last(), Some(ChatEntry::QuickReplies(_))));
        assert_eq!(count(chat, |e| matches!(e, ChatEntry::QuickReplies(_))), 1);
    }

    #[test]
    fn test_toggle_flips_visibility() {
        let mut chat = widget(FakeChat::replying("x"));
        assert!(!chat.is_open());
        chat.toggle();
        assert!(chat.is_open());
        chat.toggle();
        assert!(!chat.is_open());
        chat.toggle();
        chat.close();
        chat.close();
        assert!(!chat.is_open());
    }

    #[tokio::test]
    async fn test_blank_message_is_ignored() {
        let backend = FakeChat::replying("x");
        let mut chat = widget(backend.clone());
        let before = chat.log().to_vec();

        chat.input.set("   \t ");
        assert!(!chat.submit());
        chat.wait().await;

        assert_eq!(chat.log(), &before[..]);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_pending_exchange_shows_typing_and_detaches_panel() {
        let mut chat = widget(FakeChat::replying("ok"));
        chat.input.set("  hello  ");
        assert!(chat.submit());

        assert_eq!(chat.input.value(), "");
        assert!(chat.quick_replies().is_none());
        let tail = &chat.log()[chat.log().len() - 2..];
        assert_eq!(tail[0], ChatEntry::User("hello".to_string()));
        assert_eq!(tail[1], ChatEntry::Typing);

        chat.wait().await;
    }

    #[tokio::test]
    async fn test_successful_exchange_renders_markdown_and_restores_panel() {
        let mut chat = widget(FakeChat::replying("Use **clear** goals."));
        chat.input.set("help");
        chat.submit();
        chat.wait().await;

        assert_eq!(count(&chat, |e| matches!(e, ChatEntry::Typing)), 0);
        assert_panel_last(&chat);
        let n = chat.log().len();
        assert_eq!(chat.log()[n - 3], ChatEntry::User("help".to_string()));
        match &chat.log()[n - 2] {
            ChatEntry::Bot(msg) => {
                assert_eq!(msg.source, "Use **clear** goals.");
                let text: String = msg.lines[0].spans.iter().map(|s| s.content.clone()).collect();
                assert_eq!(text, "Use clear goals.");
            }
            other => panic!("expected bot message, got {:?}", other),
        }
        assert_eq!(chat.scroll(), None);
    }

    #[tokio::test]
    async fn test_failed_exchange_appends_fallback() {
        let mut chat = widget(FakeChat::failing());
        let users_before = count(&chat, |e| matches!(e, ChatEntry::User(_)));
        let bots_before = count(&chat, |e| matches!(e, ChatEntry::Bot(_)));

        chat.input.set("hi");
        chat.submit();
        chat.wait().await;

        assert_eq!(count(&chat, |e| matches!(e, ChatEntry::User(_))), users_before + 1);
        assert_eq!(count(&chat, |e| matches!(e, ChatEntry::Bot(_))), bots_before + 1);
        assert_eq!(count(&chat, |e| matches!(e, ChatEntry::Typing)), 0);
        let n = chat.log().len();
        assert!(matches!(&chat.log()[n - 2], ChatEntry::Bot(m) if m.source == FALLBACK_REPLY));
        assert_panel_last(&chat);
    }

    #[tokio::test]
    async fn test_second_submit_while_waiting_is_ignored() {
        let backend = FakeChat::replying("ok");
        let mut chat = widget(backend.clone());

        chat.input.set("one");
        assert!(chat.submit());
        chat.input.set("two");
        assert!(!chat.submit());
        assert_eq!(chat.input.value(), "two");
        chat.wait().await;

        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert_panel_last(&chat);
    }

    #[tokio::test]
    async fn test_exchange_without_panel() {
        let mut chat = ChatWidget::new(FakeChat::replying("fine"), Vec::new());
        chat.input.set("hi");
        chat.submit();
        chat.wait().await;

        assert!(matches!(chat.log().last(), Some(ChatEntry::Bot(_))));
        assert!(chat.quick_replies().is_none());
    }

    #[tokio::test]
    async fn test_quick_reply_fills_input_without_sending() {
        let backend = FakeChat::replying("x");
        let mut chat = widget(backend.clone());
        chat.focus = ChatFocus::Suggestions;
        chat.select_next_reply();

        assert!(chat.choose_quick_reply(chat.selected_reply()));
        assert_eq!(chat.input.value(), "What is the 4-D methodology?");
        assert_eq!(chat.focus, ChatFocus::Input);
        assert!(!chat.is_waiting());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert!(!chat.choose_quick_reply(99));
    }

    #[test]
    fn test_scroll_pins_to_bottom_at_max() {
        let mut chat = widget(FakeChat::replying("x"));
        chat.scroll_up(10, 3);
        assert_eq!(chat.scroll(), Some(7));
        chat.scroll_down(7, 3, 10);
        assert_eq!(chat.scroll(), None);
    }
}
