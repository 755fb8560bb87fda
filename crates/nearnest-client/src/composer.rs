use crate::validate::{truncate_body, validate_body};

pub const THROTTLE_NOTICE: &str = "Wait a moment before sending again";

/// Draft state of a message input.
///
/// The draft is cleared when a send starts and restored if the send is not
/// accepted, so nothing typed is lost to the throttle.
#[derive(Debug, Default)]
pub struct Composer {
    draft: String,
    sending: bool,
    notice: Option<&'static str>,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the draft, truncated to the body limit.
    pub fn set_draft(&mut self, input: &str) {
        self.draft = truncate_body(input).to_string();
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// Shown after a send was not accepted.
    pub fn notice(&self) -> Option<&'static str> {
        self.notice
    }

    /// Whether the send control is enabled.
    pub fn can_send(&self) -> bool {
        !self.sending && validate_body(&self.draft).is_ok()
    }

    /// Take the trimmed draft for sending and clear the input.
    pub fn begin(&mut self) -> Option<String> {
        if !self.can_send() {
            return None;
        }
        let text = validate_body(&self.draft).ok()?.to_string();
        self.draft.clear();
        self.sending = true;
        Some(text)
    }

    /// Finish a send started with [`begin`](Self::begin).
    pub fn finish(&mut self, text: String, accepted: bool) {
        self.sending = false;
        if accepted {
            self.notice = None;
        } else {
            self.draft = text;
            self.notice = Some(THROTTLE_NOTICE);
        }
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }
}
