//! Client-local persisted preferences: remember-me and last visited path

use solifin_storage::Database;

use crate::error::SessionError;
use crate::Result;

pub const KEY_REMEMBERED_IDENTIFIER: &str = "rememberedIdentifier";
pub const KEY_REMEMBER_ME: &str = "rememberMe";
const LAST_URL_PREFIX: &str = "lastUrl_";

#[derive(Clone)]
pub struct LocalStore {
    db: Database,
}

impl LocalStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// The identifier to pre-fill on the login form, only when the user
    /// opted in with "remember me"
    pub fn remembered_identifier(&self) -> Result<Option<String>> {
        if self.db.get_bool(KEY_REMEMBER_ME)? != Some(true) {
            return Ok(None);
        }
        Ok(self
            .db
            .get_value(KEY_REMEMBERED_IDENTIFIER)?
            .filter(|id| !id.trim().is_empty()))
    }

    /// Store or forget the login identifier
    pub fn remember_identifier(&self, identifier: &str, remember: bool) -> Result<()> {
        if remember {
            let identifier = identifier.trim();
            if identifier.is_empty() {
                return Err(SessionError::EmptyIdentifier);
            }
            self.db.set_value(KEY_REMEMBERED_IDENTIFIER, identifier)?;
            self.db.set_bool(KEY_REMEMBER_ME, true)?;
        } else {
            self.db.remove_value(KEY_REMEMBERED_IDENTIFIER)?;
            self.db.set_bool(KEY_REMEMBER_ME, false)?;
        }
        Ok(())
    }

    pub fn last_visited_path(&self, principal_id: &str) -> Result<Option<String>> {
        Ok(self.db.get_value(&last_url_key(principal_id))?)
    }

    pub fn set_last_visited_path(&self, principal_id: &str, path: &str) -> Result<()> {
        if path.trim().is_empty() {
            return Err(SessionError::EmptyPath);
        }
        self.db.set_value(&last_url_key(principal_id), path)?;
        Ok(())
    }
}

fn last_url_key(principal_id: &str) -> String {
    format!("{LAST_URL_PREFIX}{principal_id}")
}
