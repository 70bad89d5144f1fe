//! services/sync/src/runtime/assistant.rs
//!
//! This module contains the assistant conversation controller: one ongoing
//! request/response dialogue against the remote text-generation service,
//! independent of the entity channels. Turns live only in memory.

use madrasa_console_core::domain::{AssistantTurn, Language, TurnRole};
use madrasa_console_core::ports::{AssistantService, Conversation, ServiceError};
use regex::Regex;
use std::sync::Arc;
use tracing::warn;

/// Fixed persona for the console's assistant panel.
pub const ASSISTANT_SYSTEM_PROMPT: &str = "\
You are a polite, knowledgeable Islamic assistant for a madrasa administrative console.
Your goal is to assist in Bengali or English.
Always begin with \"Bismillah\" or an Islamic greeting when appropriate.
If asked for religious rulings (Fatwa), politely advise consulting a Mufti, but provide general references from Quran and Sunnah.";

/// Shown as the assistant's reply whenever the remote service fails. The
/// failure never propagates to the caller; it becomes this visible turn.
pub const ASSISTANT_FALLBACK_REPLY: &str =
    "The assistant service is unavailable right now. Please check your connection and try again.";

enum ConversationState {
    Idle,
    Open(Box<dyn Conversation>),
}

//=========================================================================================
// AssistantController
//=========================================================================================

/// State machine over the text-generation port: Idle until the first
/// interaction, Open while a remote conversation exists, back to Idle on
/// reset. There is no terminal state; restarting is always allowed.
pub struct AssistantController {
    service: Arc<dyn AssistantService>,
    state: ConversationState,
    turns: Vec<AssistantTurn>,
    next_sequence: u64,
}

impl AssistantController {
    pub fn new(service: Arc<dyn AssistantService>) -> Self {
        Self {
            service,
            state: ConversationState::Idle,
            turns: Vec::new(),
            next_sequence: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, ConversationState::Open(_))
    }

    /// The conversation so far, in order. A user turn always strictly
    /// precedes the assistant turn its send produced.
    pub fn turns(&self) -> &[AssistantTurn] {
        &self.turns
    }

    /// Creates the remote conversation session. Idempotent: while a session
    /// is open, further calls reuse it rather than creating a second one.
    pub async fn start(&mut self) -> Result<(), ServiceError> {
        if self.is_open() {
            return Ok(());
        }
        let conversation = self
            .service
            .start_conversation(ASSISTANT_SYSTEM_PROMPT)
            .await?;
        self.state = ConversationState::Open(conversation);
        Ok(())
    }

    /// Appends the user turn, then the assistant's reply, or the fixed
    /// fallback turn on any remote failure. Never returns an error: a
    /// failure is always converted into a visible turn. Taking `&mut self`
    /// serializes sends; turn ordering is only guaranteed for serial calls.
    pub async fn send(&mut self, prompt: &str) -> &AssistantTurn {
        self.push(TurnRole::User, prompt.to_string());

        if let Err(e) = self.start().await {
            warn!(error = %e, "Could not open assistant conversation.");
            self.push(TurnRole::Assistant, ASSISTANT_FALLBACK_REPLY.to_string());
            return self.turns.last().expect("turn just pushed");
        }

        let ConversationState::Open(conversation) = &mut self.state else {
            unreachable!("start() succeeded")
        };
        match conversation.send(prompt).await {
            Ok(reply) => self.push(TurnRole::Assistant, reply),
            Err(e) => {
                warn!(error = %e, "Assistant send failed.");
                self.push(TurnRole::Assistant, ASSISTANT_FALLBACK_REPLY.to_string());
            }
        }
        self.turns.last().expect("turn just pushed")
    }

    /// Discards the remote session and clears every turn. The controller is
    /// back in Idle and may be started again.
    pub fn reset(&mut self) {
        self.state = ConversationState::Idle;
        self.turns.clear();
        self.next_sequence = 0;
    }

    fn push(&mut self, role: TurnRole, text: String) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.turns.push(AssistantTurn {
            role,
            text,
            sequence,
        });
    }

    //=====================================================================================
    // One-shot Drafting
    //=====================================================================================

    /// Drafts a formal notice as an HTML blob, outside the conversation.
    pub async fn draft_notice(
        &self,
        topic: &str,
        language: Language,
    ) -> Result<String, ServiceError> {
        let prompt = format!(
            "Draft a formal madrasa notice in {}.\n\
             Topic: {}\n\
             Format: HTML (inside a <div>), professional styling.\n\
             Include placeholders for Date and Signature.",
            language.label(),
            topic
        );
        Ok(strip_code_fence(&self.service.generate(&prompt).await?))
    }

    /// Drafts a short, encouraging report-card remark.
    pub async fn draft_result_comment(
        &self,
        student_name: &str,
        marks: u32,
        subject: &str,
        language: Language,
    ) -> Result<String, ServiceError> {
        let prompt = format!(
            "Write a short, encouraging report card remark for a student.\n\
             Name: {}\n\
             Subject: {}\n\
             Marks: {}/100\n\
             Language: {}\n\
             Tone: Islamic, encouraging, constructive.",
            student_name,
            subject,
            marks,
            language.label()
        );
        Ok(strip_code_fence(&self.service.generate(&prompt).await?))
    }

    /// Drafts an exam question paper as an HTML blob.
    pub async fn draft_question_paper(
        &self,
        subject: &str,
        class_name: &str,
        topics: &str,
        total_marks: &str,
        language: Language,
    ) -> Result<String, ServiceError> {
        let prompt = format!(
            "Create a madrasa exam question paper in {}.\n\
             Subject: {}\n\
             Class: {}\n\
             Topics: {}\n\
             Total Marks: {}\n\n\
             Output Format: HTML code only (inside a <div>, no <html> or <body> tags).\n\
             Style: Professional, with a header containing placeholders for Madrasa Name, Subject, Class, Time.\n\
             Include: Multiple choice, Short answers, and Broad questions.",
            language.label(),
            subject,
            class_name,
            topics,
            total_marks
        );
        Ok(strip_code_fence(&self.service.generate(&prompt).await?))
    }
}

/// Models often wrap generated HTML in a markdown code fence; callers get
/// the bare blob.
fn strip_code_fence(text: &str) -> String {
    let fence = Regex::new(r"^```[a-zA-Z]*[ \t]*\r?\n?").unwrap();
    let without_opening = fence.replace(text.trim(), "");
    without_opening
        .trim_end()
        .trim_end_matches("```")
        .trim()
        .to_string()
}

//=========================================================================================
// Tests
//=========================================================================================
