//! Authentication and user-progression operations.

use tracing::info;

use taskforge_shared::model::User;
use taskforge_shared::protocol::ProfilePatch;
use taskforge_shared::types::Priority;

use crate::error::{ClientError, Result};
use crate::events::SessionEvent;
use crate::progression;
use crate::session::Session;

impl Session {
    /// Exchange an identity-provider credential for a session and load
    /// the user's lists and tasks.
    pub async fn login(&self, provider: &str, credential: &str) -> Result<User> {
        let response = self
            .api
            .login(provider, credential)
            .await
            .map_err(|e| self.report(e))?;

        self.api.set_token(Some(response.token));
        self.store.set_user(response.user.clone());
        info!(user = %response.user.id, "signed in");

        self.refresh_all().await?;
        Ok(response.user)
    }

    /// Drop the session token and all local entities.
    pub fn logout(&self) {
        self.api.set_token(None);
        self.store.clear();
        self.events.emit(SessionEvent::UserUpdated);
        self.events.emit(SessionEvent::ListsChanged);
        self.events.emit(SessionEvent::TasksChanged);
    }

    /// Re-fetch lists and tasks from the server, replacing local
    /// collections with the authoritative sets.
    pub async fn refresh_all(&self) -> Result<()> {
        let lists = self.api.lists().await.map_err(|e| self.report(e))?;
        let tasks = self.api.tasks().await.map_err(|e| self.report(e))?;

        self.store.replace_lists(lists);
        self.store.replace_tasks(tasks);
        self.events.emit(SessionEvent::ListsChanged);
        self.events.emit(SessionEvent::TasksChanged);
        Ok(())
    }

    /// Re-fetch the user entity (e.g. after resuming a stored token).
    pub async fn refresh_user(&self) -> Result<User> {
        let user = self.api.me().await.map_err(|e| self.report(e))?;
        self.store.set_user(user.clone());
        self.events.emit(SessionEvent::UserUpdated);
        Ok(user)
    }

    /// Apply a partial profile update.
    pub async fn update_profile(&self, patch: &ProfilePatch) -> Result<User> {
        let user = self.api.update_me(patch).await.map_err(|e| self.report(e))?;
        self.store.set_user(user.clone());
        self.events.emit(SessionEvent::UserUpdated);
        Ok(user)
    }

    /// Award completion XP for a task of `priority` and persist the new
    /// progression. Called from the task-completion path only, after the
    /// false-to-true transition has been confirmed by the server.
    pub(crate) async fn award_completion(&self, priority: Priority) -> Result<()> {
        let Some(user) = self.store.snapshot().user.clone() else {
            // Not signed in far enough to have a user entity; the
            // original UI gates the same way.
            return Ok(());
        };

        let award = progression::completion_award(user.xp, user.level, priority);

        let patch = ProfilePatch {
            xp: Some(award.xp),
            level: Some(award.level),
            ..ProfilePatch::default()
        };
        let updated = self.api.update_me(&patch).await.map_err(|e| self.report(e))?;
        self.store.set_user(updated);
        self.events.emit(SessionEvent::UserUpdated);

        if award.levels_gained > 0 {
            info!(level = award.level, "level up");
            self.events.emit(SessionEvent::LevelUp {
                level: award.level,
            });
        } else {
            self.events.emit(SessionEvent::XpGained {
                amount: progression::xp_gain(priority),
            });
        }
        Ok(())
    }

    /// Resume a previously issued token without a fresh login.
    pub async fn resume(&self, token: String) -> Result<User> {
        self.api.set_token(Some(token));
        let user = match self.refresh_user().await {
            Ok(user) => user,
            Err(e) => {
                // Token no longer valid; fall back to the signed-out state.
                self.api.set_token(None);
                return Err(e);
            }
        };
        self.refresh_all().await?;
        Ok(user)
    }

    pub fn is_signed_in(&self) -> bool {
        self.api.has_token()
    }

    /// Guard for operations that need a session.
    pub(crate) fn require_session(&self) -> Result<()> {
        if self.api.has_token() {
            Ok(())
        } else {
            Err(ClientError::NotSignedIn)
        }
    }
}
