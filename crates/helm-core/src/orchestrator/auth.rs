//! Login flow.
//!
//! Two entry contexts exist. A login opened from the menu warns when it is
//! cancelled and offers retry-or-close on failure. A login triggered by a 401
//! on connect offers retry-or-abandon on failure and, once it succeeds, runs
//! the post-connect query protocol again.

use helm_types::{Credentials, Generation};
use tracing::{debug, info, warn};

use super::{Continuation, Orchestrator, Purpose};
use crate::modal::ModalRequest;
use crate::ports::RequestError;

/// Where a login was started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum LoginContext {
    /// Opened by the user, or by an alarm query answered with 401.
    Menu,
    /// The identity fetch after connecting was answered with 401.
    OnConnect,
}

impl Orchestrator {
    /// Show the login dialog. While a login is already in progress no second
    /// dialog opens; a 401 on connect instead takes over the running login so
    /// that its success re-runs the post-connect protocol.
    pub(super) fn show_login(&mut self, ctx: LoginContext) {
        match self.login {
            Some(LoginContext::Menu) if ctx == LoginContext::OnConnect => {
                info!("login in progress now resumes the connection");
                self.login = Some(LoginContext::OnConnect);
            }
            Some(current) => debug!(?current, ?ctx, "login already in progress"),
            None => {
                self.login = Some(ctx);
                self.present(ModalRequest::login(), Continuation::Login);
            }
        }
    }

    const fn login_context(&self) -> LoginContext {
        match self.login {
            Some(ctx) => ctx,
            None => LoginContext::Menu,
        }
    }

    pub(super) fn on_login_submitted(&mut self, credentials: Option<Credentials>) {
        let Some(credentials) = credentials else {
            self.on_login_cancelled();
            return;
        };
        let id = self.issue_request(Purpose::Login);
        debug!(request = %id, user = %credentials.user, "submitting login");
        self.api.login(id, &credentials);
    }

    fn on_login_cancelled(&mut self) {
        let ctx = self.login_context();
        info!(?ctx, "login cancelled");
        self.login = None;
        self.clear_token();
        if ctx == LoginContext::Menu {
            self.present(
                ModalRequest::alert(
                    "Login Cancelled:",
                    "Update operations are NOT available until you have authenticated to the Signal K server.",
                ),
                Continuation::Informational,
            );
        }
    }

    pub(super) fn on_login_result(&mut self, result: Result<serde_json::Value, RequestError>) {
        let ctx = self.login_context();
        let token = match result {
            Ok(doc) => doc
                .get("token")
                .and_then(serde_json::Value::as_str)
                .map(ToOwned::to_owned),
            Err(e) => {
                warn!(error = %e, "login rejected");
                None
            }
        };

        let Some(token) = token else {
            self.clear_token();
            let request = match ctx {
                LoginContext::OnConnect => ModalRequest::confirm_with(
                    "Authentication Failed:",
                    "Invalid Username or Password.",
                    "Try Again",
                    "Abandon",
                ),
                LoginContext::Menu => ModalRequest::confirm_with(
                    "Authentication Failed:",
                    "Invalid Username or Password.\nNote: Choosing CLOSE may make operations requiring authentication unavailable.",
                    "Try Again",
                    "Close",
                ),
            };
            self.present(request, Continuation::LoginRetry);
            return;
        };

        info!(?ctx, "authenticated");
        self.login = None;
        self.store.save_auth_token(Some(&token));
        self.has_token = true;
        if ctx == LoginContext::OnConnect {
            self.query_after_connect();
        }
    }

    pub(super) fn on_login_retry(&mut self, retry: bool) {
        if !retry {
            info!(ctx = ?self.login_context(), "login abandoned");
            self.login = None;
            return;
        }
        self.present(ModalRequest::login(), Continuation::Login);
    }

    /// Anchor-watch replies double as an authorisation probe: a 401 means
    /// write operations need a login.
    pub(super) fn on_anchor_status(
        &mut self,
        generation: Generation,
        result: Result<(), RequestError>,
    ) {
        if generation != self.generation {
            debug!(%generation, current = %self.generation, "dropping stale anchor status");
            return;
        }
        match result {
            Ok(()) => {}
            Err(e) if e.is_unauthorized() => {
                info!("anchor status unauthorised");
                self.show_login(LoginContext::Menu);
            }
            Err(e) => {
                warn!(error = %e, "anchor status unavailable");
                self.present(
                    ModalRequest::alert(
                        "Anchor Watch:",
                        "Server returned an error. This function may not be supported by your server.",
                    ),
                    Continuation::Informational,
                );
            }
        }
    }

    fn clear_token(&mut self) {
        self.has_token = false;
        self.store.save_auth_token(None);
    }
}
