//! Session Manager
//!
//! Owns the single authenticated session of this client: the state
//! machine, the background task set, the expiry subscription and the
//! remember-me / last-path store.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use solifin_api::{
    ApiError, AuthApi, Credentials, PasswordReset, Principal, Registration, RegistrationProfile,
    SessionSignal, SignalBus,
};
use solifin_storage::Database;

use crate::activity::{ActivityBus, ActivityEvent};
use crate::background::Background;
use crate::error::SessionError;
use crate::outcome::{Failure, LoginSuccess, Outcome};
use crate::policy::SessionPolicy;
use crate::session::{AuthSnapshot, Session};
use crate::state::AuthState;
use crate::store::LocalStore;
use crate::ui::{LogoutReason, SessionUi};
use crate::Result;

pub struct SessionManager {
    /// Lock order: `session` before `background`; neither is held
    /// across an await
    session: Arc<Mutex<Session>>,
    background: Arc<Mutex<Option<Background>>>,
    expiry_task: Arc<Mutex<Option<JoinHandle<()>>>>,
    snapshot: Arc<watch::Sender<AuthSnapshot>>,
    api: Arc<dyn AuthApi>,
    ui: Arc<dyn SessionUi>,
    store: LocalStore,
    signals: SignalBus,
    activity: ActivityBus,
    policy: Arc<SessionPolicy>,
}

impl SessionManager {
    pub fn new(
        api: Arc<dyn AuthApi>,
        db: Database,
        signals: SignalBus,
        ui: Arc<dyn SessionUi>,
        policy: SessionPolicy,
    ) -> Self {
        let (snapshot, _) = watch::channel(AuthSnapshot::default());

        Self {
            session: Arc::new(Mutex::new(Session::new())),
            background: Arc::new(Mutex::new(None)),
            expiry_task: Arc::new(Mutex::new(None)),
            snapshot: Arc::new(snapshot),
            api,
            ui,
            store: LocalStore::new(db),
            signals,
            activity: ActivityBus::new(),
            policy: Arc::new(policy),
        }
    }

    /// Subscribe to the transport's session-expired signal.
    /// Calling it again replaces the previous subscription.
    pub fn start(&self) {
        let mut signals = self.signals.subscribe();
        let manager = self.clone();
        let handle = tokio::spawn(async move {
            loop {
                match signals.recv().await {
                    Ok(SessionSignal::Expired) => {
                        manager.force_logout(LogoutReason::Expired).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Expiry subscription lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        if let Some(previous) = self.expiry_task.lock().replace(handle) {
            previous.abort();
        }
        tracing::debug!("Subscribed to session signals");
    }

    /// Cancel the expiry subscription and every background task. The
    /// principal is left as is.
    pub fn shutdown(&self) {
        if let Some(handle) = self.expiry_task.lock().take() {
            handle.abort();
        }
        let _session = self.session.lock();
        self.disarm_background();
        tracing::info!("Session manager shut down");
    }

    /// Check the session once at startup and leave login-like pages when
    /// already signed in.
    pub async fn initialize(&self, current_path: &str) -> bool {
        let authenticated = self.check_auth().await;

        if authenticated && self.policy.is_public_path(current_path) {
            if let Some(principal) = self.principal() {
                let landing = self.policy.landing_path(&principal);
                tracing::info!(from = %current_path, to = %landing, "Leaving public page");
                self.ui.redirect(landing);
            }
        }

        authenticated
    }

    /// Ask the backend who we are. Never fails: any error clears the
    /// principal and yields `false`, unless a logout happened while the
    /// request was in flight.
    pub async fn check_auth(&self) -> bool {
        let generation = {
            let mut session = self.session.lock();
            if session.state() == AuthState::Unauthenticated {
                session.begin_authenticating();
                self.publish(&session);
            }
            session.generation()
        };

        match self.api.whoami().await {
            Ok(principal) => self.set_authenticated(principal, Some(generation), None),
            Err(e) => {
                tracing::debug!(error = %e, "Auth check failed");
                self.clear_if_generation(generation);
                false
            }
        }
    }

    pub async fn login(&self, identifier: &str, secret: &str) -> Outcome<LoginSuccess> {
        {
            let mut session = self.session.lock();
            if session.begin_authenticating() {
                self.publish(&session);
            }
        }

        let credentials = Credentials::new(identifier.trim(), secret);

        if let Err(e) = self.api.csrf_bootstrap().await {
            return Err(self.fail_login(e));
        }

        let principal = match self.api.login(&credentials).await {
            Ok(principal) => principal,
            Err(e) => return Err(self.fail_login(e)),
        };

        let pending = self.recall_last_visited(&principal.id);
        self.set_authenticated(principal.clone(), None, pending.clone());

        tracing::info!(
            principal_id = %principal.id,
            is_admin = principal.is_admin,
            "Logged in"
        );

        Ok(LoginSuccess {
            principal,
            pending_last_visited_path: pending,
        })
    }

    /// Best-effort logout request, then local teardown regardless of the
    /// outcome. Returns whether the backend acknowledged the logout.
    pub async fn logout(&self) -> bool {
        let acknowledged = match self.api.logout().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Logout request failed, clearing session locally");
                false
            }
        };

        self.set_unauthenticated();
        tracing::info!(acknowledged, "Logged out");
        acknowledged
    }

    pub async fn register(&self, profile: &RegistrationProfile) -> Outcome<Registration> {
        self.preflight().await?;

        let registration = self.api.register(profile).await.map_err(Failure::from)?;
        tracing::info!(email = %profile.email, "Registration accepted");
        Ok(registration)
    }

    pub async fn request_password_reset(&self, email: &str) -> Outcome<String> {
        self.preflight().await?;
        self.api
            .forgot_password(email.trim())
            .await
            .map_err(Failure::from)
    }

    pub async fn reset_password(
        &self,
        token: &str,
        email: &str,
        secret: &str,
        secret_confirmation: &str,
    ) -> Outcome<String> {
        self.preflight().await?;

        let request = PasswordReset {
            token: token.to_string(),
            email: email.trim().to_string(),
            secret: secret.to_string(),
            secret_confirmation: secret_confirmation.to_string(),
        };
        self.api
            .reset_password(&request)
            .await
            .map_err(Failure::from)
    }

    pub async fn resend_verification_email(&self, email: &str) -> Outcome<String> {
        self.preflight().await?;
        self.api
            .resend_verification(email.trim())
            .await
            .map_err(Failure::from)
    }

    /// Apply a user interaction. Ignored while unauthenticated.
    pub fn record_activity(&self, event: ActivityEvent) {
        let mut session = self.session.lock();
        if !session.is_authenticated() {
            return;
        }
        session.touch(event.at);
        tracing::trace!(kind = event.kind.as_str(), "Activity recorded");
    }

    /// Remember `path` as the current principal's last visited page.
    /// Returns `Ok(false)` for login/registration-like paths.
    pub fn record_navigation(&self, path: &str) -> Result<bool> {
        let principal_id = self
            .session
            .lock()
            .principal()
            .map(|p| p.id.clone())
            .ok_or(SessionError::NoActiveSession)?;

        if self.policy.is_public_path(path) {
            return Ok(false);
        }

        self.store.set_last_visited_path(&principal_id, path)?;
        Ok(true)
    }

    /// Identifier to pre-fill on the login form
    pub fn remembered_identifier(&self) -> Option<String> {
        match self.store.remembered_identifier() {
            Ok(identifier) => identifier,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read remembered identifier");
                None
            }
        }
    }

    pub fn remember_identifier(&self, identifier: &str, remember: bool) -> Result<()> {
        self.store.remember_identifier(identifier, remember)
    }

    pub fn principal(&self) -> Option<Principal> {
        self.session.lock().principal().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.lock().is_authenticated()
    }

    pub fn state(&self) -> AuthState {
        self.session.lock().state()
    }

    pub fn last_activity(&self) -> Instant {
        self.session.lock().last_activity()
    }

    pub fn pending_last_visited_path(&self) -> Option<String> {
        self.session.lock().pending_last_visited_path.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn activity_bus(&self) -> &ActivityBus {
        &self.activity
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    /// Number of live background timers (liveness and inactivity)
    pub fn active_timer_count(&self) -> usize {
        self.background
            .lock()
            .as_ref()
            .map(Background::timer_count)
            .unwrap_or(0)
    }

    pub fn activity_listener_attached(&self) -> bool {
        self.background.lock().is_some()
    }

    /// Silent re-validation run by the liveness poll. Failure clears the
    /// principal but issues no logout request, notice or redirect.
    pub(crate) async fn poll_liveness(&self) {
        if !self.is_authenticated() {
            return;
        }
        if !self.check_auth().await {
            tracing::warn!("Liveness poll found no valid session");
        }
    }

    pub(crate) fn idle_expired(&self, now: Instant) -> bool {
        let session = self.session.lock();
        session.is_authenticated()
            && now.saturating_duration_since(session.last_activity())
                > self.policy.inactivity_timeout
    }

    /// Logout, notice, redirect. Only the caller that actually ends an
    /// authenticated session runs the sequence; returns false otherwise.
    pub(crate) async fn force_logout(&self, reason: LogoutReason) -> bool {
        if !self.set_unauthenticated() {
            tracing::debug!(reason = reason.as_str(), "No session to end");
            return false;
        }

        tracing::info!(reason = reason.as_str(), "Forcing logout");

        if let Err(e) = self.api.logout().await {
            tracing::debug!(error = %e, "Logout request after forced logout failed");
        }

        self.ui.notify(reason.notice());
        self.ui.redirect(&self.policy.login_path);
        true
    }

    async fn preflight(&self) -> Outcome<()> {
        self.api.csrf_bootstrap().await.map_err(|e| {
            tracing::warn!(error = %e, "CSRF bootstrap failed");
            Failure::from(e)
        })
    }

    fn fail_login(&self, error: ApiError) -> Failure {
        tracing::warn!(error = %error, "Login failed");
        self.set_unauthenticated();
        Failure::from(error)
    }

    fn recall_last_visited(&self, principal_id: &str) -> Option<String> {
        match self.store.last_visited_path(principal_id) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read last visited path");
                None
            }
        }
    }

    /// Install the principal. With `guard`, the update is dropped when a
    /// logout happened since the check began.
    fn set_authenticated(
        &self,
        principal: Principal,
        guard: Option<u64>,
        pending_path: Option<String>,
    ) -> bool {
        let mut session = self.session.lock();
        if guard.is_some_and(|generation| generation != session.generation()) {
            tracing::debug!("Discarding auth result from before a logout");
            return false;
        }

        let entered = session.authenticate(principal, Instant::now());
        if pending_path.is_some() {
            session.pending_last_visited_path = pending_path;
        }

        if entered {
            self.arm_background(&session.id);
            tracing::info!(session_id = %session.id, "Session authenticated");
        }
        self.publish(&session);
        true
    }

    /// Returns true when an authenticated session was ended by this call
    fn set_unauthenticated(&self) -> bool {
        let mut session = self.session.lock();
        self.clear_locked(&mut session)
    }

    /// Clear only if no logout happened since `generation` was read; a
    /// failed check that began under an earlier session leaves the
    /// current one alone.
    fn clear_if_generation(&self, generation: u64) -> bool {
        let mut session = self.session.lock();
        if session.generation() != generation {
            tracing::debug!("Discarding auth failure from before a logout");
            return false;
        }
        self.clear_locked(&mut session)
    }

    fn clear_locked(&self, session: &mut Session) -> bool {
        let previous = session.state();
        let had_principal = session.clear();
        self.disarm_background();

        if previous != AuthState::Unauthenticated {
            self.publish(session);
        }
        had_principal
    }

    /// Caller holds the session lock
    fn arm_background(&self, session_id: &str) {
        let fresh = Background::spawn(self, session_id);
        if let Some(previous) = self.background.lock().replace(fresh) {
            previous.abort();
        }
    }

    /// Caller holds the session lock
    fn disarm_background(&self) {
        if let Some(background) = self.background.lock().take() {
            background.abort();
            tracing::debug!("Background tasks cancelled");
        }
    }

    fn publish(&self, session: &Session) {
        self.snapshot.send_replace(session.snapshot());
    }
}

impl Clone for SessionManager {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            background: Arc::clone(&self.background),
            expiry_task: Arc::clone(&self.expiry_task),
            snapshot: Arc::clone(&self.snapshot),
            api: Arc::clone(&self.api),
            ui: Arc::clone(&self.ui),
            store: self.store.clone(),
            signals: self.signals.clone(),
            activity: self.activity.clone(),
            policy: Arc::clone(&self.policy),
        }
    }
}
