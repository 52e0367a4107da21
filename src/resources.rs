//! Listing and review persistence.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::info;

use crate::{
    credentials::User,
    entity::{listing, review, user},
    error::{AppError, Result},
    validation::{ListingInput, ReviewInput},
};

pub use crate::entity::listing::Model as Listing;
pub use crate::entity::review::Model as Review;

/// A listing with everything its detail page shows.
#[derive(Debug, Clone)]
pub struct ListingDetail {
    pub listing: Listing,
    pub owner: Option<User>,
    pub reviews: Vec<(Review, Option<User>)>,
}

#[derive(Debug, Clone)]
pub struct ListingStore {
    conn: DatabaseConnection,
}

impl ListingStore {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn all(&self) -> Result<Vec<Listing>> {
        Ok(listing::Entity::find()
            .order_by_asc(listing::Column::Id)
            .all(&self.conn)
            .await?)
    }

    pub async fn find(&self, id: i32) -> Result<Option<Listing>> {
        Ok(listing::Entity::find_by_id(id).one(&self.conn).await?)
    }

    pub async fn find_detail(&self, id: i32) -> Result<Option<ListingDetail>> {
        let Some((listing, owner)) = listing::Entity::find_by_id(id)
            .find_also_related(user::Entity)
            .one(&self.conn)
            .await?
        else {
            return Ok(None);
        };

        let reviews = review::Entity::find()
            .filter(review::Column::ListingId.eq(id))
            .order_by_asc(review::Column::Id)
            .find_also_related(user::Entity)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|(review, author)| (review, author.map(User::from)))
            .collect();

        Ok(Some(ListingDetail {
            listing,
            owner: owner.map(User::from),
            reviews,
        }))
    }

    /// Owner of a listing, or `None` when the listing does not exist.
    pub async fn owner_of(&self, id: i32) -> Result<Option<i32>> {
        Ok(self.find(id).await?.map(|l| l.owner_id))
    }

    pub async fn create(&self, owner_id: i32, input: ListingInput) -> Result<Listing> {
        let model = listing::ActiveModel {
            title: Set(input.title),
            description: Set(input.description),
            image: Set(input.image),
            price: Set(input.price),
            location: Set(input.location),
            country: Set(input.country),
            owner_id: Set(owner_id),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        info!(listing_id = model.id, owner_id, "listing created");
        Ok(model)
    }

    pub async fn update(&self, id: i32, input: ListingInput) -> Result<Listing> {
        let existing = self
            .find(id)
            .await?
            .ok_or(AppError::ResourceNotFound("Listing"))?;

        let mut active_model = existing.into_active_model();
        active_model.title = Set(input.title);
        active_model.description = Set(input.description);
        active_model.image = Set(input.image);
        active_model.price = Set(input.price);
        active_model.location = Set(input.location);
        active_model.country = Set(input.country);
        let model = active_model.update(&self.conn).await?;

        info!(listing_id = id, "listing updated");
        Ok(model)
    }

    /// Deletes the listing together with its reviews.
    pub async fn delete(&self, id: i32) -> Result<Listing> {
        let txn = self.conn.begin().await?;

        let existing = listing::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(AppError::ResourceNotFound("Listing"))?;
        let reviews = review::Entity::delete_many()
            .filter(review::Column::ListingId.eq(id))
            .exec(&txn)
            .await?;
        listing::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        info!(listing_id = id, reviews = reviews.rows_affected, "listing deleted");
        Ok(existing)
    }

    /// Wipes every listing and review. Used by the seed binary.
    pub async fn delete_all(&self) -> Result<u64> {
        let txn = self.conn.begin().await?;
        review::Entity::delete_many().exec(&txn).await?;
        let removed = listing::Entity::delete_many().exec(&txn).await?;
        txn.commit().await?;
        Ok(removed.rows_affected)
    }
}

#[derive(Debug, Clone)]
pub struct ReviewStore {
    conn: DatabaseConnection,
}

impl ReviewStore {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn find(&self, id: i32) -> Result<Option<Review>> {
        Ok(review::Entity::find_by_id(id).one(&self.conn).await?)
    }

    /// Author of a review on the given listing, or `None` when no such
    /// review exists there.
    pub async fn author_of(&self, listing_id: i32, review_id: i32) -> Result<Option<i32>> {
        Ok(self
            .find(review_id)
            .await?
            .filter(|r| r.listing_id == listing_id)
            .map(|r| r.author_id))
    }

    /// Attaches a new review to an existing listing.
    pub async fn create(&self, listing_id: i32, author_id: i32, input: ReviewInput) -> Result<Review> {
        if listing::Entity::find_by_id(listing_id)
            .one(&self.conn)
            .await?
            .is_none()
        {
            return Err(AppError::ResourceNotFound("Listing"));
        }

        let model = review::ActiveModel {
            comment: Set(input.comment),
            rating: Set(input.rating),
            created_at: Set(Utc::now().into()),
            listing_id: Set(listing_id),
            author_id: Set(author_id),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        info!(review_id = model.id, listing_id, author_id, "review added");
        Ok(model)
    }

    /// Removes a review from a listing. Returns whether anything was deleted.
    pub async fn delete(&self, listing_id: i32, review_id: i32) -> Result<bool> {
        let result = review::Entity::delete_many()
            .filter(review::Column::Id.eq(review_id))
            .filter(review::Column::ListingId.eq(listing_id))
            .exec(&self.conn)
            .await?;

        info!(review_id, listing_id, removed = result.rows_affected, "review deleted");
        Ok(result.rows_affected > 0)
    }
}
