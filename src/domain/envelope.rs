use serde::Serialize;
use uuid::Uuid;

/// Authentication context attached to every uploaded record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Auth {
    pub project: String,
    pub user: String,
    pub sign: String,
}

/// A signed event ready for transmission.
///
/// Serializes as `{"project":…,"user":…,"sign":…,"content":…}`. The id is
/// local only and exists to correlate log lines for one record.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    #[serde(skip)]
    id: Uuid,
    #[serde(flatten)]
    auth: Auth,
    content: String,
}

impl Envelope {
    pub fn new(auth: Auth, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            auth,
            content,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}
