use async_trait::async_trait;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set, TransactionTrait,
};
use time::OffsetDateTime;
use tower_sessions::{session::Id, session::Record, session_store, ExpiredDeletion, SessionStore};
use tracing::debug;

use crate::entity::session::{self, ActiveModel as SessionActiveModel, Entity as SessionEntity};

/// Session persistence for `tower-sessions` on top of a SeaORM connection.
///
/// Records are MessagePack encoded into the `sessions` table. The row's
/// `expiry_date` mirrors the record's own expiry so stale sessions can be
/// filtered out on load and swept in bulk.
///
/// # Error Handling
///
/// - Database errors → `session_store::Error::Backend`
/// - Serialization errors → `session_store::Error::Encode`
/// - Deserialization errors → `session_store::Error::Decode`
#[derive(Debug, Clone)]
pub struct SeaOrmStore {
    conn: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

fn backend(e: sea_orm::DbErr) -> session_store::Error {
    session_store::Error::Backend(e.to_string())
}

fn encode(record: &Record) -> session_store::Result<Vec<u8>> {
    rmp_serde::to_vec(record).map_err(|e| session_store::Error::Encode(e.to_string()))
}

#[async_trait]
impl SessionStore for SeaOrmStore {
    /// Inserts a brand new record, regenerating the ID until it does not
    /// collide with an existing row.
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        let txn = self.conn.begin().await.map_err(backend)?;

        while SessionEntity::find_by_id(record.id.to_string())
            .one(&txn)
            .await
            .map_err(backend)?
            .is_some()
        {
            record.id = Id::default();
        }

        let session_model = SessionActiveModel {
            id: Set(record.id.to_string()),
            data: Set(encode(record)?),
            expiry_date: Set(convert_time_to_datetime(record.expiry_date)),
        };

        session_model.insert(&txn).await.map_err(backend)?;
        txn.commit().await.map_err(backend)?;

        debug!(expiry = %record.expiry_date, "session created");
        Ok(())
    }

    /// Upserts the record.
    async fn save(&self, record: &Record) -> session_store::Result<()> {
        let data = encode(record)?;
        let expiry_date = convert_time_to_datetime(record.expiry_date);

        match SessionEntity::find_by_id(record.id.to_string())
            .one(&self.conn)
            .await
            .map_err(backend)?
        {
            Some(existing) => {
                let mut active_model = existing.into_active_model();
                active_model.data = Set(data);
                active_model.expiry_date = Set(expiry_date);
                active_model.update(&self.conn).await.map_err(backend)?;
            }
            None => {
                let session_model = SessionActiveModel {
                    id: Set(record.id.to_string()),
                    data: Set(data),
                    expiry_date: Set(expiry_date),
                };
                session_model.insert(&self.conn).await.map_err(backend)?;
            }
        }

        Ok(())
    }

    /// Loads a record, treating expired rows as absent.
    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let now_db = convert_time_to_datetime(OffsetDateTime::now_utc());

        let session = SessionEntity::find_by_id(session_id.to_string())
            .filter(session::Column::ExpiryDate.gt(now_db))
            .one(&self.conn)
            .await
            .map_err(backend)?;

        match session {
            Some(model) => {
                let record = rmp_serde::from_slice(&model.data)
                    .map_err(|e| session_store::Error::Decode(e.to_string()))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        SessionEntity::delete_by_id(session_id.to_string())
            .exec(&self.conn)
            .await
            .map_err(backend)?;

        debug!("session deleted");
        Ok(())
    }
}

#[async_trait]
impl ExpiredDeletion for SeaOrmStore {
    async fn delete_expired(&self) -> session_store::Result<()> {
        let now_db = convert_time_to_datetime(OffsetDateTime::now_utc());

        let result = SessionEntity::delete_many()
            .filter(session::Column::ExpiryDate.lt(now_db))
            .exec(&self.conn)
            .await
            .map_err(backend)?;

        debug!(removed = result.rows_affected, "expired sessions swept");
        Ok(())
    }
}

// time::OffsetDateTime (tower-sessions) -> chrono DateTime (sea-orm)
fn convert_time_to_datetime(time: OffsetDateTime) -> DateTimeWithTimeZone {
    use chrono::{DateTime, Utc};

    let utc = DateTime::from_timestamp(time.unix_timestamp(), time.nanosecond())
        .unwrap_or(if time.unix_timestamp() < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        });
    utc.into()
}
