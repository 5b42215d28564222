use std::io;

use console::Term;
use postgrab_engine::CredentialPrompt;
use secrecy::Secret;

/// Reads the account password from the controlling terminal without echo.
pub struct TerminalPrompt;

impl CredentialPrompt for TerminalPrompt {
    fn password_for(&self, username: &str) -> io::Result<Secret<String>> {
        let term = Term::stderr();
        term.write_str(&format!("Enter password for {username}: "))?;
        let password = term.read_secure_line()?;
        Ok(Secret::new(password))
    }
}
