use std::time::Instant;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::api::PromptKind;
use crate::app::App;
use crate::chat::ChatFocus;
use crate::input::TextInput;
use crate::prompt_form::FormField;
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick(Instant::now()),
    }
    Ok(())
}

fn ctrl(key: &KeyEvent, c: char) -> bool {
    key.code == KeyCode::Char(c) && key.modifiers.contains(KeyModifiers::CONTROL)
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if ctrl(&key, 'c') {
        app.should_quit = true;
        return;
    }

    // A notice blocks until dismissed
    if app.notice.is_some() {
        app.notice = None;
        return;
    }

    if key.code == KeyCode::F(2) || ctrl(&key, 'o') {
        app.chat.toggle();
        return;
    }

    if app.chat.is_open() {
        handle_chat(app, key);
    } else {
        handle_form(app, key);
    }
}

/// Shared line-editing keys
fn edit_input(input: &mut TextInput, key: &KeyEvent) {
    match key.code {
        KeyCode::Backspace => input.backspace(),
        KeyCode::Delete => input.delete(),
        KeyCode::Left => input.left(),
        KeyCode::Right => input.right(),
        KeyCode::Home => input.home(),
        KeyCode::End => input.end(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => input.insert(c),
        _ => {}
    }
}

fn handle_form(app: &mut App, key: KeyEvent) {
    if ctrl(&key, 's') {
        app.form.submit(PromptKind::Short);
        return;
    }
    if ctrl(&key, 'g') {
        app.form.submit(PromptKind::Full);
        return;
    }
    if ctrl(&key, 'y') {
        app.copy_result();
        return;
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Tab | KeyCode::BackTab => app.form.toggle_focus(),
        KeyCode::Enter => {
            app.form.submit(PromptKind::Full);
        }
        _ => match app.form.focus {
            FormField::Task => edit_input(&mut app.form.task, &key),
            FormField::Provider => match key.code {
                KeyCode::Left | KeyCode::Up => app.cycle_provider(false),
                KeyCode::Right | KeyCode::Down | KeyCode::Char(' ') => app.cycle_provider(true),
                _ => {}
            },
        },
    }
}

fn handle_chat(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.chat.close(),
        KeyCode::Tab | KeyCode::BackTab => app.chat.toggle_focus(),
        KeyCode::PageUp => app.chat.scroll_up(app.chat_scroll, 5),
        KeyCode::PageDown => app.chat.scroll_down(app.chat_scroll, 5, app.chat_max_scroll),
        _ => match app.chat.focus {
            ChatFocus::Input => {
                if key.code == KeyCode::Enter {
                    app.chat.submit();
                } else {
                    edit_input(&mut app.chat.input, &key);
                }
            }
            ChatFocus::Suggestions => match key.code {
                KeyCode::Left | KeyCode::Up => app.chat.select_prev_reply(),
                KeyCode::Right | KeyCode::Down => app.chat.select_next_reply(),
                KeyCode::Enter | KeyCode::Char(' ') => {
                    let selected = app.chat.selected_reply();
                    app.chat.choose_quick_reply(selected);
                }
                _ => {}
            },
        },
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if !app.chat.is_open() {
        return;
    }
    match mouse.kind {
        MouseEventKind::ScrollDown => {
            app.chat.scroll_down(app.chat_scroll, 3, app.chat_max_scroll)
        }
        MouseEventKind::ScrollUp => app.chat.scroll_up(app.chat_scroll, 3),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ChatBackend, GenerationRequest, GenerationResponse, PromptBackend};
    use crate::app::Notice;
    use crate::clipboard::{ClipboardHandle, ClipboardProvider};
    use crate::provider::Provider;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;

    struct Offline;

    #[async_trait]
    impl PromptBackend for Offline {
        async fn generate(&self, _: PromptKind, _: &GenerationRequest) -> Result<GenerationResponse> {
            Err(anyhow!("offline"))
        }
    }

    #[async_trait]
    impl ChatBackend for Offline {
        async fn chat(&self, _: &str) -> Result<String> {
            Err(anyhow!("offline"))
        }
    }

    struct NoClipboard;

    impl ClipboardProvider for NoClipboard {
        fn open(&self) -> Result<Box<dyn ClipboardHandle>> {
            Err(anyhow!("no clipboard"))
        }
    }

    fn app() -> App {
        App::with_parts(
            Arc::new(Offline),
            Arc::new(Offline),
            Box::new(NoClipboard),
            Provider::OpenAI,
            Duration::ZERO,
        )
    }

    fn press(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
        handle_event(app, AppEvent::Key(KeyEvent::new(code, modifiers))).unwrap();
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c), KeyModifiers::NONE);
        }
    }

    #[test]
    fn test_typing_goes_to_task_field() {
        let mut app = app();
        type_text(&mut app, "write a poem");
        assert_eq!(app.form.task.value(), "write a poem");
    }

    #[test]
    fn test_provider_cycles_when_focused() {
        let mut app = app();
        press(&mut app, KeyCode::Tab, KeyModifiers::NONE);
        press(&mut app, KeyCode::Right, KeyModifiers::NONE);
        assert_eq!(app.form.provider, Provider::Llama);
        press(&mut app, KeyCode::Left, KeyModifiers::NONE);
        press(&mut app, KeyCode::Left, KeyModifiers::NONE);
        assert_eq!(app.form.provider, Provider::Gemma);
    }

    #[test]
    fn test_ctrl_o_toggles_chat_and_routes_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('o'), KeyModifiers::CONTROL);
        assert!(app.chat.is_open());

        type_text(&mut app, "hey");
        assert_eq!(app.chat.input.value(), "hey");
        assert_eq!(app.form.task.value(), "");

        press(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        assert!(!app.chat.is_open());
        assert!(!app.should_quit);
    }

    #[test]
    fn test_blank_chat_enter_sends_nothing() {
        let mut app = app();
        press(&mut app, KeyCode::F(2), KeyModifiers::NONE);
        let before = app.chat.log().len();
        type_text(&mut app, "   ");
        press(&mut app, KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(app.chat.log().len(), before);
        assert!(!app.chat.is_waiting());
    }

    #[test]
    fn test_suggestion_enter_fills_input() {
        let mut app = app();
        press(&mut app, KeyCode::F(2), KeyModifiers::NONE);
        press(&mut app, KeyCode::Tab, KeyModifiers::NONE);
        assert_eq!(app.chat.focus, ChatFocus::Suggestions);
        press(&mut app, KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(app.chat.focus, ChatFocus::Input);
        assert!(!app.chat.input.value().is_empty());
        assert!(!app.chat.is_waiting());
    }

    #[test]
    fn test_resize_leaves_state_alone() {
        let mut app = app();
        type_text(&mut app, "draft");
        handle_event(&mut app, AppEvent::Resize).unwrap();
        assert_eq!(app.form.task.value(), "draft");
        assert!(!app.should_quit);
    }

    #[test]
    fn test_notice_swallows_next_key() {
        let mut app = app();
        app.notice = Some(Notice::new("Copied", "done"));
        press(&mut app, KeyCode::Char('x'), KeyModifiers::NONE);
        assert!(app.notice.is_none());
        assert_eq!(app.form.task.value(), "");
    }

    #[test]
    fn test_copy_failure_raises_notice() {
        let mut app = app();
        press(&mut app, KeyCode::Char('y'), KeyModifiers::CONTROL);
        let notice = app.notice.clone().unwrap();
        assert_eq!(notice.body, crate::clipboard::COPY_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn test_enter_submits_and_failure_restores_form() {
        let mut app = app();
        type_text(&mut app, "x");
        press(&mut app, KeyCode::Enter, KeyModifiers::NONE);
        assert!(app.form.is_busy());
        assert!(app.form.spinner_visible());

        app.form.wait().await;
        assert!(!app.form.spinner_visible());
        assert_eq!(app.form.result(), crate::prompt_form::UNREACHABLE_MESSAGE);
    }
}
