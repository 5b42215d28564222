use engine_logging::{engine_debug, engine_info};
use secrecy::Secret;

use crate::{AuthError, MediaSource, Session};

/// Out-of-band source of a password, e.g. a terminal prompt without echo.
pub trait CredentialPrompt: Send + Sync {
    fn password_for(&self, username: &str) -> std::io::Result<Secret<String>>;
}

/// Produces the one session a run works with.
pub struct SessionManager<'a> {
    source: &'a dyn MediaSource,
    prompt: &'a dyn CredentialPrompt,
}

impl<'a> SessionManager<'a> {
    pub fn new(source: &'a dyn MediaSource, prompt: &'a dyn CredentialPrompt) -> Self {
        Self { source, prompt }
    }

    /// Anonymous without a username; otherwise prompt and log in.
    pub async fn authenticate(&self, username: Option<&str>) -> Result<Session, AuthError> {
        let Some(username) = username else {
            engine_debug!("No username given, continuing anonymously");
            return Ok(Session::anonymous());
        };

        let password = self
            .prompt
            .password_for(username)
            .map_err(AuthError::Prompt)?;
        let session = self.source.authenticate(username, &password).await?;
        engine_info!("Successfully logged in as {}", username);
        Ok(session)
    }
}
