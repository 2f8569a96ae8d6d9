use crate::domain::{Auth, Envelope, Event};
use std::fmt;

/// Shared credentials used to sign every envelope.
#[derive(Clone, Default)]
pub struct Credentials {
    pub project: String,
    pub user: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(
        project: impl Into<String>,
        user: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            user: user.into(),
            secret: secret.into(),
        }
    }

    /// Signs an event, returning its canonical JSON alongside the signature.
    pub fn sign_event(&self, event: &Event) -> Result<(String, String), serde_json::Error> {
        let content = event.to_json()?;
        let sign = sign_content(&content, &self.project, &self.secret, &self.user);
        Ok((content, sign))
    }

    /// Wraps an event into a signed envelope.
    pub fn seal(&self, event: &Event) -> Result<Envelope, serde_json::Error> {
        let (content, sign) = self.sign_event(event)?;
        let auth = Auth {
            project: self.project.clone(),
            user: self.user.clone(),
            sign,
        };
        Ok(Envelope::new(auth, content))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("project", &self.project)
            .field("user", &self.user)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Signs an event against the given project credentials.
pub fn sign(
    event: &Event,
    project: &str,
    secret: &str,
    user: &str,
) -> Result<String, serde_json::Error> {
    let content = event.to_json()?;
    Ok(sign_content(&content, project, secret, user))
}

/// MD5 hex digest of `content=<content>&project=<project>&sk=<secret>&user=<user>`,
/// with spaces, CR and LF removed from the content first.
pub fn sign_content(content: &str, project: &str, secret: &str, user: &str) -> String {
    let stripped = strip_whitespace(content);
    let material = format!("content={stripped}&project={project}&sk={secret}&user={user}");
    format!("{:x}", md5::compute(material.as_bytes()))
}

fn strip_whitespace(content: &str) -> String {
    content
        .chars()
        .filter(|c| !matches!(c, ' ' | '\r' | '\n'))
        .collect()
}
