//! Pending action queue repository

use libsql::{Connection, Row};

use crate::error::Result;
use crate::models::{ActionPayload, PendingAction, TodoId};
use crate::util::from_millis;

/// Trait for the durable FIFO of unconfirmed mutations (async)
#[allow(async_fn_in_trait)]
pub trait PendingActionRepository {
    /// Append an action to the tail of the queue
    async fn enqueue(&self, action: &PendingAction) -> Result<()>;

    /// All queued actions in insertion order
    async fn list(&self) -> Result<Vec<PendingAction>>;

    /// Remove an action by id; missing ids are ignored
    async fn remove(&self, id: &str) -> Result<()>;

    /// Number of queued actions
    async fn count(&self) -> Result<usize>;

    /// Point every action targeting `from` at `to`, keeping queue order.
    ///
    /// Returns the number of rewritten actions.
    async fn retarget(&self, from: TodoId, to: TodoId) -> Result<usize>;
}

/// libSQL implementation of `PendingActionRepository`
pub struct LibSqlPendingActionRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlPendingActionRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_action(row: &Row) -> Result<PendingAction> {
        let payload: String = row.get(1)?;
        Ok(PendingAction {
            id: row.get(0)?,
            payload: serde_json::from_str::<ActionPayload>(&payload)?,
            timestamp: from_millis(row.get::<i64>(2)?),
        })
    }
}

impl PendingActionRepository for LibSqlPendingActionRepository<'_> {
    async fn enqueue(&self, action: &PendingAction) -> Result<()> {
        let payload = serde_json::to_string(&action.payload)?;
        self.conn
            .execute(
                "INSERT INTO pending_actions (id, kind, target_id, payload, enqueued_at)
                 VALUES (?, ?, ?, ?, ?)",
                libsql::params![
                    action.id.as_str(),
                    action.kind().as_str(),
                    action.target_id().get(),
                    payload,
                    action.timestamp.timestamp_millis()
                ],
            )
            .await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<PendingAction>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, payload, enqueued_at FROM pending_actions ORDER BY seq ASC",
                (),
            )
            .await?;

        let mut actions = Vec::new();
        while let Some(row) = rows.next().await? {
            actions.push(Self::parse_action(&row)?);
        }
        Ok(actions)
    }

    async fn remove(&self, id: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM pending_actions WHERE id = ?", [id])
            .await?;
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM pending_actions", ())
            .await?;
        let count = match rows.next().await? {
            Some(row) => row.get::<i64>(0)?,
            None => 0,
        };
        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn retarget(&self, from: TodoId, to: TodoId) -> Result<usize> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, payload, enqueued_at FROM pending_actions WHERE target_id = ?",
                [from.get()],
            )
            .await?;
        let mut affected = Vec::new();
        while let Some(row) = rows.next().await? {
            affected.push(Self::parse_action(&row)?);
        }

        for action in &affected {
            let payload = serde_json::to_string(&action.payload.clone().retargeted(to))?;
            self.conn
                .execute(
                    "UPDATE pending_actions SET target_id = ?, payload = ? WHERE id = ?",
                    libsql::params![to.get(), payload, action.id.as_str()],
                )
                .await?;
        }
        Ok(affected.len())
    }
}
