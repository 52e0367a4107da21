//! Server-side session records.

use sea_orm::entity::prelude::*;

/// One row per live browser session.
///
/// | Column      | Type               | Description                          |
/// |-------------|--------------------|--------------------------------------|
/// | id          | TEXT (Primary Key) | Session ID carried by the cookie     |
/// | data        | BLOB / BYTEA       | MessagePack encoded session record   |
/// | expiry_date | TIMESTAMPTZ        | Absolute expiry, fixed at creation   |
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,

    pub data: Vec<u8>,

    /// Rows past this instant are never loaded and get swept by
    /// `delete_expired`.
    pub expiry_date: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
