//! The SeaORM session store and the fixed session lifetime.

mod common;

use std::time::Duration as StdDuration;

use common::{spawn_app, Browser};
use sea_orm::{EntityTrait, PaginatorTrait};
use time::{Duration, OffsetDateTime};
use wanderlust::{entity::session, ExpiredDeletion, Id, Record, SeaOrmStore, SessionStore};

fn record(expiry_date: OffsetDateTime) -> Record {
    Record {
        id: Id::default(),
        data: Default::default(),
        expiry_date,
    }
}

#[tokio::test]
async fn create_load_delete() {
    let app = spawn_app().await;
    let store = SeaOrmStore::new(app.db.clone());

    let mut live = record(OffsetDateTime::now_utc() + Duration::days(1));
    store.create(&mut live).await.unwrap();

    let loaded = store.load(&live.id).await.unwrap().expect("live session loads");
    assert_eq!(loaded.id, live.id);
    assert_eq!(loaded.expiry_date.unix_timestamp(), live.expiry_date.unix_timestamp());

    store.delete(&live.id).await.unwrap();
    assert!(store.load(&live.id).await.unwrap().is_none());
}

#[tokio::test]
async fn save_updates_in_place() {
    let app = spawn_app().await;
    let store = SeaOrmStore::new(app.db.clone());

    let mut rec = record(OffsetDateTime::now_utc() + Duration::days(1));
    store.create(&mut rec).await.unwrap();
    rec.expiry_date = OffsetDateTime::now_utc() + Duration::days(2);
    store.save(&rec).await.unwrap();

    assert_eq!(session::Entity::find().count(&app.db).await.unwrap(), 1);
    let loaded = store.load(&rec.id).await.unwrap().unwrap();
    assert_eq!(loaded.expiry_date.unix_timestamp(), rec.expiry_date.unix_timestamp());
}

#[tokio::test]
async fn expired_sessions_are_ignored_and_swept() {
    let app = spawn_app().await;
    let store = SeaOrmStore::new(app.db.clone());

    let mut stale = record(OffsetDateTime::now_utc() - Duration::days(1));
    let mut live = record(OffsetDateTime::now_utc() + Duration::days(1));
    store.create(&mut stale).await.unwrap();
    store.create(&mut live).await.unwrap();

    assert!(store.load(&stale.id).await.unwrap().is_none());

    store.delete_expired().await.unwrap();
    assert_eq!(session::Entity::find().count(&app.db).await.unwrap(), 1);
    assert!(store.load(&live.id).await.unwrap().is_some());
}

#[tokio::test]
async fn session_cookie_is_http_only_with_fixed_expiry() {
    let app = spawn_app().await;
    let mut browser = Browser::new(&app);

    let first = browser.get("/listing").await;
    let cookie = first.set_cookie.expect("session cookie issued");
    assert!(cookie.starts_with("wanderlust.sid="));
    assert!(cookie.contains("HttpOnly"));

    let rows = session::Entity::find().all(&app.db).await.unwrap();
    assert_eq!(rows.len(), 1);
    let issued = rows[0].expiry_date;
    let remaining = issued.timestamp() - OffsetDateTime::now_utc().unix_timestamp();
    assert!(remaining > 6 * 86_400 && remaining <= 7 * 86_400);

    tokio::time::sleep(StdDuration::from_millis(1100)).await;
    browser.get("/listing").await;

    let row = session::Entity::find_by_id(rows[0].id.clone())
        .one(&app.db)
        .await
        .unwrap()
        .expect("same session still stored");
    assert_eq!(row.expiry_date.timestamp(), issued.timestamp());
}
