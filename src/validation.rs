//! Form payload checks for listings and reviews.
//!
//! Every failing field contributes one message; they are joined with `,` into
//! a single `ValidationFailure`.

use serde::Deserialize;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingForm {
    #[serde(rename = "listing[title]")]
    pub title: Option<String>,
    #[serde(rename = "listing[description]")]
    pub description: Option<String>,
    #[serde(rename = "listing[image]")]
    pub image: Option<String>,
    #[serde(rename = "listing[price]")]
    pub price: Option<String>,
    #[serde(rename = "listing[location]")]
    pub location: Option<String>,
    #[serde(rename = "listing[country]")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingInput {
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub price: i64,
    pub location: String,
    pub country: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewForm {
    #[serde(rename = "review[rating]")]
    pub rating: Option<String>,
    #[serde(rename = "review[comment]")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewInput {
    pub rating: i32,
    pub comment: String,
}

fn required(errors: &mut Vec<String>, field: &str, value: Option<String>) -> String {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => v,
        _ => {
            errors.push(format!("\"{field}\" is required"));
            String::new()
        }
    }
}

fn number<T: std::str::FromStr>(
    errors: &mut Vec<String>,
    field: &str,
    value: Option<String>,
) -> Option<T> {
    let raw = required(errors, field, value);
    if raw.is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(n) => Some(n),
        Err(_) => {
            errors.push(format!("\"{field}\" must be a number"));
            None
        }
    }
}

fn finish<T>(errors: Vec<String>, value: T) -> Result<T> {
    if errors.is_empty() {
        Ok(value)
    } else {
        Err(AppError::ValidationFailure(errors.join(",")))
    }
}

impl ListingForm {
    fn is_absent(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.image.is_none()
            && self.price.is_none()
            && self.location.is_none()
            && self.country.is_none()
    }

    pub fn validate(self) -> Result<ListingInput> {
        if self.is_absent() {
            return Err(AppError::ValidationFailure("\"listing\" is required".into()));
        }

        let mut errors = Vec::new();
        let title = required(&mut errors, "listing.title", self.title);
        let description = required(&mut errors, "listing.description", self.description);
        let price = number::<i64>(&mut errors, "listing.price", self.price);
        if matches!(price, Some(p) if p < 0) {
            errors.push("\"listing.price\" must be greater than or equal to 0".into());
        }
        let location = required(&mut errors, "listing.location", self.location);
        let country = required(&mut errors, "listing.country", self.country);
        let image = self
            .image
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty());

        finish(
            errors,
            ListingInput {
                title,
                description,
                image,
                price: price.unwrap_or_default(),
                location,
                country,
            },
        )
    }
}

impl ReviewForm {
    pub fn validate(self) -> Result<ReviewInput> {
        if self.rating.is_none() && self.comment.is_none() {
            return Err(AppError::ValidationFailure("\"review\" is required".into()));
        }

        let mut errors = Vec::new();
        let rating = number::<i32>(&mut errors, "review.rating", self.rating);
        match rating {
            Some(r) if r < 1 => {
                errors.push("\"review.rating\" must be greater than or equal to 1".into())
            }
            Some(r) if r > 5 => {
                errors.push("\"review.rating\" must be less than or equal to 5".into())
            }
            _ => {}
        }
        let comment = required(&mut errors, "review.comment", self.comment);

        finish(
            errors,
            ReviewInput {
                rating: rating.unwrap_or_default(),
                comment,
            },
        )
    }
}
