//! Prompt form controller.
//!
//! Owns the task field, provider selector, spinner, the two generate buttons
//! and the result block. Each submission spawns one request; the finished
//! task is collected by [`PromptForm::poll`] and routed through a single
//! completion path that always restores the busy UI first.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use tokio::task::JoinHandle;

use crate::api::{GenerationRequest, GenerationResponse, PromptBackend, PromptKind};
use crate::input::TextInput;
use crate::provider::Provider;
use crate::transform::{select_output, strip_review_section};

pub const UNREACHABLE_MESSAGE: &str = "❌ Unable to reach server. Check console.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Task,
    Provider,
}

/// Interactive state of one generate button
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonState {
    pub disabled: bool,
    /// Dimmed "not allowed" styling, applied together with `disabled`
    pub dimmed: bool,
}

struct InFlight {
    kind: PromptKind,
    handle: JoinHandle<Result<GenerationResponse>>,
}

struct PendingResult {
    text: String,
    reveal_at: Instant,
}

pub struct PromptForm {
    backend: Arc<dyn PromptBackend>,
    display_delay: Duration,

    pub task: TextInput,
    pub provider: Provider,
    pub focus: FormField,

    spinner_visible: bool,
    full_button: ButtonState,
    short_button: ButtonState,
    result: String,
    result_visible: bool,

    pending: Option<PendingResult>,
    in_flight: Option<InFlight>,
}

impl PromptForm {
    pub fn new(backend: Arc<dyn PromptBackend>, provider: Provider, display_delay: Duration) -> Self {
        Self {
            backend,
            display_delay,
            task: TextInput::default(),
            provider,
            focus: FormField::Task,
            spinner_visible: false,
            full_button: ButtonState::default(),
            short_button: ButtonState::default(),
            result: String::new(),
            result_visible: false,
            pending: None,
            in_flight: None,
        }
    }

    pub fn spinner_visible(&self) -> bool {
        self.spinner_visible
    }

    pub fn result(&self) -> &str {
        &self.result
    }

    pub fn result_visible(&self) -> bool {
        self.result_visible
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn button(&self, kind: PromptKind) -> ButtonState {
        match kind {
            PromptKind::Full => self.full_button,
            PromptKind::Short => self.short_button,
        }
    }

    fn button_mut(&mut self, kind: PromptKind) -> &mut ButtonState {
        match kind {
            PromptKind::Full => &mut self.full_button,
            PromptKind::Short => &mut self.short_button,
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            FormField::Task => FormField::Provider,
            FormField::Provider => FormField::Task,
        };
    }

    /// Start a generation request. Returns false when one is already running.
    pub fn submit(&mut self, kind: PromptKind) -> bool {
        if self.in_flight.is_some() || self.button(kind).disabled {
            tracing::debug!(endpoint = kind.endpoint(), "generate ignored while busy");
            return false;
        }

        // No client-side validation; empty fields go out as-is
        let request = GenerationRequest {
            task: self.task.value().to_string(),
            provider: self.provider.as_str().to_string(),
        };

        self.spinner_visible = true;
        self.result_visible = false;
        self.pending = None;
        *self.button_mut(kind) = ButtonState {
            disabled: true,
            dimmed: true,
        };

        tracing::info!(
            endpoint = kind.endpoint(),
            provider = %request.provider,
            task_len = request.task.len(),
            "generating prompt"
        );

        let backend = Arc::clone(&self.backend);
        let handle = tokio::spawn(async move { backend.generate(kind, &request).await });
        self.in_flight = Some(InFlight { kind, handle });
        true
    }

    /// Collect the request if it has finished
    pub async fn poll(&mut self) {
        let finished = self
            .in_flight
            .as_ref()
            .is_some_and(|f| f.handle.is_finished());
        if finished {
            self.wait().await;
        }
    }

    /// Wait for the outstanding request, if any, and complete it
    pub async fn wait(&mut self) {
        if let Some(InFlight { kind, handle }) = self.in_flight.take() {
            let outcome = match handle.await {
                Ok(result) => result,
                Err(e) => Err(anyhow!("prompt request task failed: {}", e)),
            };
            self.complete(kind, outcome);
        }
    }

    fn complete(&mut self, kind: PromptKind, outcome: Result<GenerationResponse>) {
        self.spinner_visible = false;
        *self.button_mut(kind) = ButtonState::default();

        match outcome {
            Ok(response) => {
                let mut output = select_output(&response);
                if kind == PromptKind::Full {
                    output = strip_review_section(&output);
                }
                self.result_visible = false;
                self.pending = Some(PendingResult {
                    text: output,
                    reveal_at: Instant::now() + self.display_delay,
                });
            }
            Err(e) => {
                tracing::error!(endpoint = kind.endpoint(), error = %format!("{:#}", e), "prompt generation failed");
                self.pending = None;
                self.result = UNREACHABLE_MESSAGE.to_string();
                self.result_visible = true;
            }
        }
    }

    /// Reveal a delayed result once its display time has come
    pub fn tick(&mut self, now: Instant) {
        if self.pending.as_ref().is_some_and(|p| now >= p.reveal_at) {
            if let Some(pending) = self.pending.take() {
                self.result = pending.text;
                self.result_visible = true;
            }
        }
    }
}
