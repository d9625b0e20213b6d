//! Modal requests and their typed results.
//!
//! A modal is a suspension point: the orchestrator hands a [`ModalRequest`]
//! to the presenter together with a ticket and resumes when the matching
//! [`ModalResponse`] comes back.

use std::time::Duration;

use helm_types::{Credentials, PlaybackQuery};
use serde::{Deserialize, Serialize};

/// How long transient notices stay on screen.
pub const NOTICE_DURATION: Duration = Duration::from_secs(2);

/// A dialog the presenter should show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModalRequest {
    /// Message with a single acknowledgement button.
    Alert {
        /// Dialog title.
        title: String,
        /// Body text.
        message: String,
        /// Label of the acknowledgement button.
        button: String,
    },
    /// Yes/no question.
    Confirm {
        /// Dialog title.
        title: String,
        /// Body text.
        message: String,
        /// Label of the accepting button.
        accept: String,
        /// Label of the rejecting button.
        reject: String,
    },
    /// Credential collection form.
    Login {
        /// Prompt shown above the form.
        message: String,
    },
    /// Playback time-window editor.
    PlaybackSettings,
}

impl ModalRequest {
    /// Alert with an `OK` button.
    pub fn alert(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::alert_with(title, message, "OK")
    }

    /// Alert with a custom button label.
    pub fn alert_with(
        title: impl Into<String>,
        message: impl Into<String>,
        button: impl Into<String>,
    ) -> Self {
        Self::Alert {
            title: title.into(),
            message: message.into(),
            button: button.into(),
        }
    }

    /// Confirm with `Yes` / `No` buttons.
    pub fn confirm(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::confirm_with(title, message, "Yes", "No")
    }

    /// Confirm with custom button labels.
    pub fn confirm_with(
        title: impl Into<String>,
        message: impl Into<String>,
        accept: impl Into<String>,
        reject: impl Into<String>,
    ) -> Self {
        Self::Confirm {
            title: title.into(),
            message: message.into(),
            accept: accept.into(),
            reject: reject.into(),
        }
    }

    /// The default login prompt.
    pub fn login() -> Self {
        Self::Login {
            message: "Login to Signal K server.".to_owned(),
        }
    }
}

/// The single result a modal yields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ModalResponse {
    /// An alert was dismissed.
    Acknowledged,
    /// A confirm was answered.
    Confirmed(bool),
    /// The login form was submitted (`Some`) or cancelled (`None`).
    Login(Option<Credentials>),
    /// The playback editor was accepted (`Some`) or cancelled (`None`).
    Playback(Option<PlaybackQuery>),
}

impl ModalResponse {
    /// Interpret the response as a yes/no answer. Anything other than an
    /// explicit confirmation counts as "no".
    pub const fn accepted(&self) -> bool {
        matches!(self, Self::Confirmed(true))
    }
}

/// A transient, non-blocking message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Message text.
    pub message: String,
    /// How long to show it.
    pub duration: Duration,
}

impl Notice {
    /// A notice shown for [`NOTICE_DURATION`].
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            duration: NOTICE_DURATION,
        }
    }
}
