//! Conversation rendering for the terminal.
//!
//! The transcript is an append-only list of message entries; transient
//! placeholders (processing/waiting indicators) are addressed by id so they
//! can be removed exactly once when superseded. Error banners self-dismiss
//! after a fixed duration. Status lines reflect the turn controller's
//! current stage.

use crate::defaults;
use crate::monitor::{Clock, SystemClock};
use std::io::{self, Write};
use std::time::{Duration, Instant};

const DIM: &str = "\x1b[2m";
const CYAN: &str = "\x1b[36m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Avatar shown next to user messages.
pub const USER_AVATAR: &str = "you";
/// Avatar shown next to assistant messages.
pub const ASSISTANT_AVATAR: &str = "bot";

/// Clear the current terminal line (replaces status/level bar).
pub fn clear_line() {
    eprint!("\r\x1b[2K");
}

/// Who authored a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One finalized message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
    pub avatar: &'static str,
}

/// Transient indicator messages, removed once superseded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// Shown while the clip is uploaded and transcribed.
    Processing,
    /// Shown while waiting for the reply to start streaming.
    Waiting,
}

/// Identifier for transcript entries, used to remove placeholders.
pub type EntryId = u64;

#[derive(Debug, Clone)]
enum Entry {
    Message(ConversationMessage),
    Placeholder(Placeholder),
}

/// Append-only conversation display list.
///
/// Finalized messages are never mutated or removed; placeholders can be
/// removed exactly once.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<(EntryId, Entry)>,
    next_id: EntryId,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_entry(&mut self, entry: Entry) -> EntryId {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push((id, entry));
        id
    }

    /// Append a finalized message.
    pub fn push_message(&mut self, role: Role, content: &str) -> EntryId {
        let avatar = match role {
            Role::User => USER_AVATAR,
            Role::Assistant => ASSISTANT_AVATAR,
        };
        self.push_entry(Entry::Message(ConversationMessage {
            role,
            content: content.to_string(),
            avatar,
        }))
    }

    /// Insert a transient placeholder, returning its id for later removal.
    pub fn push_placeholder(&mut self, placeholder: Placeholder) -> EntryId {
        self.push_entry(Entry::Placeholder(placeholder))
    }

    /// Remove a placeholder by id.
    ///
    /// Returns true on the first removal, false if the id is unknown or
    /// already removed. Finalized messages are never removed.
    pub fn remove_placeholder(&mut self, id: EntryId) -> bool {
        if let Some(pos) = self
            .entries
            .iter()
            .position(|(eid, entry)| *eid == id && matches!(entry, Entry::Placeholder(_)))
        {
            self.entries.remove(pos);
            true
        } else {
            false
        }
    }

    /// Finalized messages in arrival order.
    pub fn messages(&self) -> Vec<&ConversationMessage> {
        self.entries
            .iter()
            .filter_map(|(_, entry)| match entry {
                Entry::Message(msg) => Some(msg),
                Entry::Placeholder(_) => None,
            })
            .collect()
    }

    /// Placeholders currently visible.
    pub fn placeholders(&self) -> Vec<Placeholder> {
        self.entries
            .iter()
            .filter_map(|(_, entry)| match entry {
                Entry::Placeholder(p) => Some(*p),
                Entry::Message(_) => None,
            })
            .collect()
    }
}

/// Turn stages as shown in the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Listening,
    Processing,
    Transcribing,
    GeneratingResponse,
    ConvertingToSpeech,
    Playing,
    NoSpeech,
}

impl Status {
    /// Short human-readable status text.
    pub fn text(&self) -> &'static str {
        match self {
            Status::Idle => "Press Enter to talk",
            Status::Listening => "Listening... speak now",
            Status::Processing => "Processing audio...",
            Status::Transcribing => "Transcribing...",
            Status::GeneratingResponse => "Generating response...",
            Status::ConvertingToSpeech => "Converting to speech...",
            Status::Playing => "Playing response...",
            Status::NoSpeech => "No speech detected",
        }
    }
}

/// Error banners with self-dismissal after a fixed duration.
pub struct BannerSet<C: Clock = SystemClock> {
    banners: Vec<(String, Instant)>,
    dismiss_after: Duration,
    clock: C,
}

impl BannerSet<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for BannerSet<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> BannerSet<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            banners: Vec::new(),
            dismiss_after: Duration::from_millis(defaults::BANNER_DISMISS_MS),
            clock,
        }
    }

    /// Show a banner; it dismisses itself after the configured duration.
    pub fn push(&mut self, message: &str) {
        let deadline = self.clock.now() + self.dismiss_after;
        self.banners.push((message.to_string(), deadline));
    }

    /// Currently visible banner texts, pruning any whose deadline passed.
    pub fn active(&mut self) -> Vec<String> {
        let now = self.clock.now();
        self.banners.retain(|(_, deadline)| now < *deadline);
        self.banners.iter().map(|(msg, _)| msg.clone()).collect()
    }
}

/// Terminal view over the transcript: model updates plus ANSI output.
pub struct ChatView<C: Clock = SystemClock> {
    transcript: Transcript,
    banners: BannerSet<C>,
    status: Status,
    status_log: Vec<Status>,
    quiet: bool,
}

impl ChatView<SystemClock> {
    pub fn new(quiet: bool) -> Self {
        Self::with_clock(quiet, SystemClock)
    }
}

impl<C: Clock> ChatView<C> {
    pub fn with_clock(quiet: bool, clock: C) -> Self {
        Self {
            transcript: Transcript::new(),
            banners: BannerSet::with_clock(clock),
            status: Status::Idle,
            status_log: Vec::new(),
            quiet,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Currently visible error banners.
    pub fn active_banners(&mut self) -> Vec<String> {
        self.banners.active()
    }

    /// Every status shown so far, in order.
    pub fn status_log(&self) -> &[Status] {
        &self.status_log
    }

    /// Update and print the status line.
    pub fn set_status(&mut self, status: Status) {
        self.status = status;
        self.status_log.push(status);
        if !self.quiet {
            clear_line();
            eprint!("{DIM}{}{RESET}", status.text());
            io::stderr().flush().ok();
        }
    }

    /// Append and print a finalized user message.
    pub fn push_user(&mut self, content: &str) -> EntryId {
        let id = self.transcript.push_message(Role::User, content);
        if !self.quiet {
            clear_line();
        }
        println!("{CYAN}{USER_AVATAR}{RESET}  {content}");
        id
    }

    /// Append an assistant message to the model without printing it;
    /// the caller reveals the text separately.
    pub fn push_assistant(&mut self, content: &str) -> EntryId {
        self.transcript.push_message(Role::Assistant, content)
    }

    /// Insert a transient indicator.
    pub fn push_placeholder(&mut self, placeholder: Placeholder) -> EntryId {
        let id = self.transcript.push_placeholder(placeholder);
        if !self.quiet {
            let label = match placeholder {
                Placeholder::Processing => "Processing",
                Placeholder::Waiting => "Wait",
            };
            clear_line();
            eprint!("{DIM}{label}...{RESET}");
            io::stderr().flush().ok();
        }
        id
    }

    /// Remove a transient indicator. Returns whether it was still present.
    pub fn remove_placeholder(&mut self, id: EntryId) -> bool {
        let removed = self.transcript.remove_placeholder(id);
        if removed && !self.quiet {
            clear_line();
        }
        removed
    }

    /// Show an error banner (red line; self-dismisses from the model after
    /// the configured duration).
    pub fn banner(&mut self, message: &str) {
        self.banners.push(message);
        clear_line();
        eprintln!("{RED}{message}{RESET}");
    }
}

/// Print the level meter line during recording.
pub fn show_level(level: f32, threshold: f32, speech_detected: bool) {
    let bar = format_level_bar(level, threshold);
    let tag = if speech_detected {
        format!(" {GREEN}speech{RESET}")
    } else {
        String::new()
    };
    eprint!("\r\x1b[2K{bar}{tag}");
    io::stderr().flush().ok();
}

/// Render an audio level bar with a threshold marker.
pub fn format_level_bar(level: f32, threshold: f32) -> String {
    // Scale: 0.1 RMS = full bar
    let bar_width = 20usize;
    let filled = ((level / 0.1).min(1.0) * bar_width as f32) as usize;
    let threshold_pos = ((threshold / 0.1).min(1.0) * bar_width as f32) as usize;

    let mut bar = String::with_capacity(bar_width + 2);
    bar.push('[');
    for i in 0..bar_width {
        if i < filled {
            if i >= threshold_pos {
                bar.push('█');
            } else {
                bar.push('▒');
            }
        } else if i == threshold_pos {
            bar.push('│');
        } else {
            bar.push('░');
        }
    }
    bar.push(']');
    bar
}

/// Reveal text with a typewriter effect, one character per interval.
///
/// Runs to completion independently of audio playback; the caller joins the
/// two concurrently.
pub async fn reveal_text(text: &str, interval: Duration) {
    print!("{GREEN}{ASSISTANT_AVATAR}{RESET}  ");
    io::stdout().flush().ok();
    for ch in text.chars() {
        tokio::time::sleep(interval).await;
        print!("{ch}");
        io::stdout().flush().ok();
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone)]
    struct MockClock {
        current: Arc<Mutex<Instant>>,
    }

    impl MockClock {
        fn new() -> Self {
            Self {
                current: Arc::new(Mutex::new(Instant::now())),
            }
        }

        fn advance(&self, duration: Duration) {
            let mut current = self.current.lock().unwrap();
            *current += duration;
        }
    }

    impl Clock for MockClock {
        fn now(&self) -> Instant {
            *self.current.lock().unwrap()
        }
    }

    #[test]
    fn test_transcript_appends_in_order() {
        let mut transcript = Transcript::new();
        transcript.push_message(Role::User, "hi");
        transcript.push_message(Role::Assistant, "hello");

        let messages = transcript.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "hi");
        assert_eq!(messages[0].avatar, USER_AVATAR);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].avatar, ASSISTANT_AVATAR);
    }

    #[test]
    fn test_placeholder_removed_exactly_once() {
        let mut transcript = Transcript::new();
        let id = transcript.push_placeholder(Placeholder::Processing);
        assert_eq!(transcript.placeholders(), vec![Placeholder::Processing]);

        assert!(transcript.remove_placeholder(id));
        assert!(transcript.placeholders().is_empty());
        // Second removal is a no-op
        assert!(!transcript.remove_placeholder(id));
    }

    #[test]
    fn test_messages_cannot_be_removed() {
        let mut transcript = Transcript::new();
        let id = transcript.push_message(Role::User, "hi");

        assert!(!transcript.remove_placeholder(id));
        assert_eq!(transcript.messages().len(), 1);
    }

    #[test]
    fn test_placeholder_removal_keeps_other_entries() {
        let mut transcript = Transcript::new();
        transcript.push_message(Role::User, "hi");
        let waiting = transcript.push_placeholder(Placeholder::Waiting);
        transcript.push_message(Role::Assistant, "hello");

        assert!(transcript.remove_placeholder(waiting));
        assert_eq!(transcript.messages().len(), 2);
        assert!(transcript.placeholders().is_empty());
    }

    #[test]
    fn test_banner_self_dismisses_after_duration() {
        let clock = MockClock::new();
        let mut banners = BannerSet::with_clock(clock.clone());

        banners.push("Error: x");
        assert_eq!(banners.active(), vec!["Error: x".to_string()]);

        clock.advance(Duration::from_millis(defaults::BANNER_DISMISS_MS - 1));
        assert_eq!(banners.active().len(), 1);

        clock.advance(Duration::from_millis(1));
        assert!(banners.active().is_empty());
    }

    #[test]
    fn test_banner_set_holds_multiple() {
        let clock = MockClock::new();
        let mut banners = BannerSet::with_clock(clock.clone());

        banners.push("Error: a");
        clock.advance(Duration::from_millis(1000));
        banners.push("Error: b");

        assert_eq!(banners.active().len(), 2);
        clock.advance(Duration::from_millis(defaults::BANNER_DISMISS_MS - 1000));
        assert_eq!(banners.active(), vec!["Error: b".to_string()]);
    }

    #[test]
    fn test_status_text() {
        assert_eq!(Status::Listening.text(), "Listening... speak now");
        assert_eq!(Status::NoSpeech.text(), "No speech detected");
        assert_eq!(Status::Processing.text(), "Processing audio...");
    }

    #[test]
    fn test_chat_view_tracks_status() {
        let mut view = ChatView::new(true);
        assert_eq!(view.status(), Status::Idle);
        view.set_status(Status::Listening);
        assert_eq!(view.status(), Status::Listening);
    }

    #[test]
    fn test_chat_view_logs_statuses_in_order() {
        let mut view = ChatView::new(true);
        assert!(view.status_log().is_empty());

        view.set_status(Status::Listening);
        view.set_status(Status::ConvertingToSpeech);
        view.set_status(Status::Playing);
        view.set_status(Status::Idle);

        assert_eq!(
            view.status_log(),
            &[
                Status::Listening,
                Status::ConvertingToSpeech,
                Status::Playing,
                Status::Idle,
            ]
        );
    }

    #[test]
    fn test_chat_view_banner_visible() {
        let mut view = ChatView::new(true);
        view.banner("Error: x");
        assert_eq!(view.active_banners(), vec!["Error: x".to_string()]);
    }

    #[test]
    fn test_format_level_bar_bounds() {
        let silent = format_level_bar(0.0, 0.01);
        assert!(silent.starts_with('['));
        assert!(silent.ends_with(']'));
        assert_eq!(silent.chars().count(), 22);

        let loud = format_level_bar(1.0, 0.01);
        assert!(loud.contains('█'));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_text_takes_interval_per_char() {
        let started = tokio::time::Instant::now();
        reveal_text("hello", Duration::from_millis(30)).await;
        assert_eq!(started.elapsed(), Duration::from_millis(150));
    }
}
