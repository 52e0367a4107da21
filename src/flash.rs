//! One-shot notifications carried in the session until the next rendered page.

use serde::{Deserialize, Serialize};
use tower_sessions::{session::Error, Session};

/// Messages beyond this many per severity push the oldest out.
pub const MAX_QUEUED: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
}

impl Severity {
    fn key(self) -> &'static str {
        match self {
            Severity::Success => "flash.success",
            Severity::Error => "flash.error",
        }
    }
}

/// Drained messages, ready for a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flashes {
    pub success: Vec<String>,
    pub error: Vec<String>,
}

impl Flashes {
    pub fn is_empty(&self) -> bool {
        self.success.is_empty() && self.error.is_empty()
    }
}

pub async fn enqueue(session: &Session, severity: Severity, text: impl Into<String>) -> Result<(), Error> {
    let mut queue: Vec<String> = session.get(severity.key()).await?.unwrap_or_default();
    push_capped(&mut queue, text.into());
    session.insert(severity.key(), queue).await
}

/// Takes every queued message of one severity. A second call returns nothing.
pub async fn drain(session: &Session, severity: Severity) -> Result<Vec<String>, Error> {
    Ok(session
        .remove::<Vec<String>>(severity.key())
        .await?
        .unwrap_or_default())
}

pub async fn drain_for_render(session: &Session) -> Result<Flashes, Error> {
    Ok(Flashes {
        success: drain(session, Severity::Success).await?,
        error: drain(session, Severity::Error).await?,
    })
}

fn push_capped(queue: &mut Vec<String>, text: String) {
    if queue.len() >= MAX_QUEUED {
        queue.drain(..=queue.len() - MAX_QUEUED);
    }
    queue.push(text);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn drain_empties_the_queue() {
        let session = session();
        enqueue(&session, Severity::Success, "saved").await.unwrap();
        enqueue(&session, Severity::Success, "again").await.unwrap();

        assert_eq!(drain(&session, Severity::Success).await.unwrap(), vec!["saved", "again"]);
        assert!(drain(&session, Severity::Success).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn severities_are_independent() {
        let session = session();
        enqueue(&session, Severity::Error, "nope").await.unwrap();

        let flashes = drain_for_render(&session).await.unwrap();
        assert!(flashes.success.is_empty());
        assert_eq!(flashes.error, vec!["nope"]);
        assert!(drain_for_render(&session).await.unwrap().is_empty());
    }

    #[test]
    fn cap_drops_oldest() {
        let mut queue = Vec::new();
        for i in 0..MAX_QUEUED + 3 {
            push_capped(&mut queue, i.to_string());
        }
        assert_eq!(queue.len(), MAX_QUEUED);
        assert_eq!(queue.first().map(String::as_str), Some("3"));
        assert_eq!(queue.last().map(String::as_str), Some("18"));
    }
}
