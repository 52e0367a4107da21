//! Server-rendered HTML pages.
//!
//! Every page goes through [`layout`], which draws the navigation for the
//! current user and the flash banners drained for this render.

use axum::response::Html;
use tower_sessions::Session;

use crate::{
    credentials::User,
    error::Result,
    flash::{self, Flashes},
    resources::{Listing, ListingDetail},
};

/// Per-request values every page can see.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    pub app_name: String,
    pub current_user: Option<User>,
    pub flash: Flashes,
}

impl RenderContext {
    /// Drains the session's flash queue, so build this only when a page is
    /// actually going to be rendered.
    pub async fn build(session: &Session, current_user: Option<User>, app_name: &str) -> Result<Self> {
        Ok(Self {
            app_name: app_name.to_string(),
            current_user,
            flash: flash::drain_for_render(session).await?,
        })
    }

    fn is_current_user(&self, user_id: i32) -> bool {
        self.current_user.as_ref().is_some_and(|u| u.id == user_id)
    }
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(ctx: &RenderContext, title: &str, body: &str) -> Html<String> {
    let app = escape(&ctx.app_name);
    let nav = match &ctx.current_user {
        Some(user) => format!(
            r#"<span class="user">{}</span> <a href="/logout">Log out</a>"#,
            escape(&user.username)
        ),
        None => r#"<a href="/signup">Sign up</a> <a href="/login">Log in</a>"#.to_string(),
    };

    let mut banners = String::new();
    for msg in &ctx.flash.success {
        banners.push_str(&format!(r#"<div class="flash success">{}</div>"#, escape(msg)));
    }
    for msg in &ctx.flash.error {
        banners.push_str(&format!(r#"<div class="flash error">{}</div>"#, escape(msg)));
    }

    Html(format!(
        r#"<!DOCTYPE html>
<html>
    <head><meta charset="utf-8"><title>{title} | {app}</title></head>
    <body>
        <nav><a href="/listing">{app}</a> <a href="/listing/new">Airbnb your home</a> {nav}</nav>
        {banners}
        <main>
{body}
        </main>
    </body>
</html>
"#,
        title = escape(title),
    ))
}

pub fn listing_index(ctx: &RenderContext, listings: &[Listing]) -> Html<String> {
    let mut body = String::from("<h1>All Listings</h1>\n<ul class=\"listings\">\n");
    for listing in listings {
        body.push_str(&format!(
            r#"<li><a href="/listing/{id}">{title}</a> &middot; &#8377;{price} / night</li>
"#,
            id = listing.id,
            title = escape(&listing.title),
            price = listing.price,
        ));
    }
    body.push_str("</ul>");
    layout(ctx, "All Listings", &body)
}

fn listing_fields(listing: Option<&Listing>) -> String {
    let value = |f: fn(&Listing) -> String| listing.map(f).map(|v| escape(&v)).unwrap_or_default();
    format!(
        r#"<label>Title <input name="listing[title]" value="{title}" required></label>
<label>Description <textarea name="listing[description]" required>{description}</textarea></label>
<label>Image URL <input name="listing[image]" value="{image}"></label>
<label>Price <input name="listing[price]" type="number" min="0" value="{price}" required></label>
<label>Location <input name="listing[location]" value="{location}" required></label>
<label>Country <input name="listing[country]" value="{country}" required></label>"#,
        title = value(|l| l.title.clone()),
        description = value(|l| l.description.clone()),
        image = value(|l| l.image.clone().unwrap_or_default()),
        price = value(|l| l.price.to_string()),
        location = value(|l| l.location.clone()),
        country = value(|l| l.country.clone()),
    )
}

pub fn listing_new(ctx: &RenderContext) -> Html<String> {
    let body = format!(
        r#"<h1>Create a New Listing</h1>
<form method="post" action="/listing">
{}
<button>Add</button>
</form>"#,
        listing_fields(None)
    );
    layout(ctx, "New Listing", &body)
}

pub fn listing_edit(ctx: &RenderContext, listing: &Listing) -> Html<String> {
    let body = format!(
        r#"<h1>Edit your Listing</h1>
<form method="post" action="/listing/{id}?_method=PUT">
{fields}
<button>Edit</button>
</form>"#,
        id = listing.id,
        fields = listing_fields(Some(listing)),
    );
    layout(ctx, "Edit Listing", &body)
}

pub fn listing_show(ctx: &RenderContext, detail: &ListingDetail) -> Html<String> {
    let listing = &detail.listing;
    let mut body = format!(
        r#"<h1>{title}</h1>
<p class="owner">Owned by <i>{owner}</i></p>
<p>{description}</p>
<p>&#8377;{price} / night</p>
<p>{location}, {country}</p>
"#,
        title = escape(&listing.title),
        owner = detail
            .owner
            .as_ref()
            .map(|o| escape(&o.username))
            .unwrap_or_default(),
        description = escape(&listing.description),
        price = listing.price,
        location = escape(&listing.location),
        country = escape(&listing.country),
    );
    if let Some(image) = &listing.image {
        body.push_str(&format!("<img src=\"{}\" alt=\"listing image\">\n", escape(image)));
    }

    if ctx.is_current_user(listing.owner_id) {
        body.push_str(&format!(
            r#"<a href="/listing/{id}/edit">Edit</a>
<form method="post" action="/listing/{id}?_method=DELETE"><button>Delete</button></form>
"#,
            id = listing.id
        ));
    }

    if ctx.current_user.is_some() {
        body.push_str(&format!(
            r#"<h4>Leave a Review</h4>
<form method="post" action="/listing/{id}/review">
<label>Rating <input type="range" min="1" max="5" name="review[rating]"></label>
<label>Comments <textarea name="review[comment]" required></textarea></label>
<button>Submit</button>
</form>
"#,
            id = listing.id
        ));
    }

    body.push_str("<h4>All Reviews</h4>\n<ul class=\"reviews\">\n");
    for (review, author) in &detail.reviews {
        let author_name = author.as_ref().map(|a| escape(&a.username)).unwrap_or_default();
        body.push_str(&format!(
            r#"<li><b>@{author_name}</b> {rating} stars <p>{comment}</p>"#,
            rating = review.rating,
            comment = escape(&review.comment),
        ));
        if ctx.is_current_user(review.author_id) {
            body.push_str(&format!(
                r#"<form method="post" action="/listing/{id}/review/{review_id}?_method=DELETE"><button>Delete</button></form>"#,
                id = listing.id,
                review_id = review.id,
            ));
        }
        body.push_str("</li>\n");
    }
    body.push_str("</ul>");

    layout(ctx, &listing.title, &body)
}

pub fn signup(ctx: &RenderContext) -> Html<String> {
    let body = r#"<h1>Sign up on Wanderlust</h1>
<form method="post" action="/signup">
<label>Username <input name="username" required></label>
<label>Email <input name="email" type="email" required></label>
<label>Password <input name="password" type="password" required></label>
<button>Sign up</button>
</form>"#;
    layout(ctx, "Sign up", body)
}

fn login_form(ctx: &RenderContext, heading: &str, action: &str) -> Html<String> {
    let body = format!(
        r#"<h1>{heading}</h1>
<form method="post" action="{action}">
<label>Username <input name="username" required></label>
<label>Password <input name="password" type="password" required></label>
<button>Login</button>
</form>"#
    );
    layout(ctx, heading, &body)
}

pub fn login(ctx: &RenderContext) -> Html<String> {
    login_form(ctx, "Login", "/login")
}

pub fn admin_login(ctx: &RenderContext) -> Html<String> {
    login_form(ctx, "Admin Login", "/admin")
}

/// Rendered outside any request context, so no navigation state or flash.
pub fn error_page(message: &str) -> Html<String> {
    let ctx = RenderContext {
        app_name: "Wanderlust".into(),
        ..Default::default()
    };
    let body = format!(
        r#"<div class="alert">
<h4>Error</h4>
<p>{}</p>
</div>"#,
        escape(message)
    );
    layout(&ctx, "Error", &body)
}
