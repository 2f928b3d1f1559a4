//! Conflict resolver: a pure decision from (server view, client view, operation).
//!
//! Text fields are last-writer-wins on `last_modified`; `completed` and
//! `deleted` are sticky and merge with a logical OR.

use crate::models::{ActionKind, ConflictDetails, ConflictField, ConflictResolution, Todo};

/// Decide how a queued create/update/delete reconciles with the server's copy.
pub fn resolve_conflict(
    server: Option<&Todo>,
    client: &Todo,
    op: ActionKind,
) -> ConflictResolution {
    match (server, op) {
        // Target is gone remotely: nothing to replay
        (None, ActionKind::Update | ActionKind::Delete) => ConflictResolution::client_wins(None),
        // Server already has the record; the local create is superseded
        (Some(server), ActionKind::Create) => ConflictResolution::server_wins(Some(server.clone())),
        (Some(server), ActionKind::Update | ActionKind::Delete) => {
            let conflict_fields = detect_conflicts(server, client);
            if conflict_fields.is_empty() {
                ConflictResolution::client_wins(Some(client.clone()))
            } else {
                ConflictResolution::merge(
                    merge_todos(server, client),
                    ConflictDetails {
                        server_version: server.clone(),
                        client_version: client.clone(),
                        conflict_fields,
                    },
                )
            }
        }
        (None, ActionKind::Create) => ConflictResolution::client_wins(Some(client.clone())),
    }
}

/// Fields that disagree, reported only when the server saw a strictly later write.
pub fn detect_conflicts(server: &Todo, client: &Todo) -> Vec<ConflictField> {
    if server.last_modified() <= client.last_modified() {
        return Vec::new();
    }

    let mut fields = Vec::new();
    if server.title != client.title {
        fields.push(ConflictField::Title);
    }
    if server.completed != client.completed {
        fields.push(ConflictField::Completed);
    }
    if server.deleted != client.deleted {
        fields.push(ConflictField::Deleted);
    }
    fields
}

/// Deterministic field merge of two versions of the same record.
pub fn merge_todos(server: &Todo, client: &Todo) -> Todo {
    let server_newer = server.last_modified() > client.last_modified();
    Todo {
        title: if server_newer {
            server.title.clone()
        } else {
            client.title.clone()
        },
        completed: server.completed || client.completed,
        deleted: server.deleted || client.deleted,
        updated_at: if server_newer {
            server.updated_at
        } else {
            client.updated_at
        },
        ..client.clone()
    }
}

/// Adjudicate deletion asymmetry between the server and a queued write.
///
/// A live local edit against a remote tombstone cannot be settled
/// automatically and comes back as `manual`.
pub fn handle_delete_conflict(server: Option<&Todo>, client: &Todo) -> ConflictResolution {
    let Some(server) = server else {
        return ConflictResolution::server_wins(None);
    };

    match (server.deleted, client.deleted) {
        (true, false) => ConflictResolution::manual(ConflictDetails {
            server_version: server.clone(),
            client_version: client.clone(),
            conflict_fields: vec![ConflictField::Deleted],
        }),
        (false, true) => ConflictResolution::client_wins(Some(client.clone().into_tombstone())),
        _ => ConflictResolution::client_wins(Some(client.clone())),
    }
}
