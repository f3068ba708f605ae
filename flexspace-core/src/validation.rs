//! Input validation rules
//!
//! Every failure is a [`FlexSpaceError::Validation`] naming the offending field.

use crate::error::{FlexSpaceError, FlexSpaceResult};
use crate::types::{NewRoom, PageRequest, RoomPatch};
use regex::Regex;
use std::sync::LazyLock;

pub const MIN_NAME_LEN: usize = 2;
pub const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern is valid")
});

static SLUG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("slug pattern is valid")
});

pub fn validate_name(name: &str) -> FlexSpaceResult<()> {
    if name.trim().chars().count() < MIN_NAME_LEN {
        return Err(FlexSpaceError::validation(
            "name",
            format!("name must be at least {} characters", MIN_NAME_LEN),
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> FlexSpaceResult<()> {
    if !EMAIL_RE.is_match(email) {
        return Err(FlexSpaceError::validation("email", "email must be a valid address"));
    }
    Ok(())
}

pub fn validate_password(field: &str, password: &str) -> FlexSpaceResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(FlexSpaceError::validation(
            field,
            format!("{} must be at least {} characters", field, MIN_PASSWORD_LEN),
        ));
    }
    Ok(())
}

pub fn validate_slug(slug: &str) -> FlexSpaceResult<()> {
    if !SLUG_RE.is_match(slug) {
        return Err(FlexSpaceError::validation(
            "slug",
            "slug must be lowercase letters and digits separated by single hyphens",
        ));
    }
    Ok(())
}

/// Registration and admin user creation share the same rules.
pub fn validate_registration(name: &str, email: &str, password: &str) -> FlexSpaceResult<()> {
    validate_name(name)?;
    validate_email(email)?;
    validate_password("password", password)
}

fn validate_capacity(capacity: i64) -> FlexSpaceResult<()> {
    if capacity < 1 {
        return Err(FlexSpaceError::validation("capacity", "capacity must be at least 1"));
    }
    Ok(())
}

fn validate_price(price_hour: f64) -> FlexSpaceResult<()> {
    if !price_hour.is_finite() || price_hour < 0.0 {
        return Err(FlexSpaceError::validation(
            "priceHour",
            "priceHour must be a non-negative number",
        ));
    }
    Ok(())
}

fn validate_room_name(name: &str) -> FlexSpaceResult<()> {
    if name.trim().is_empty() {
        return Err(FlexSpaceError::validation("name", "name must not be empty"));
    }
    Ok(())
}

pub fn validate_new_room(room: &NewRoom) -> FlexSpaceResult<()> {
    validate_slug(&room.slug)?;
    validate_room_name(&room.name)?;
    validate_capacity(room.capacity)?;
    validate_price(room.price_hour)
}

pub fn validate_room_patch(patch: &RoomPatch) -> FlexSpaceResult<()> {
    if let Some(slug) = &patch.slug {
        validate_slug(slug)?;
    }
    if let Some(name) = &patch.name {
        validate_room_name(name)?;
    }
    if let Some(capacity) = patch.capacity {
        validate_capacity(capacity)?;
    }
    if let Some(price) = patch.price_hour {
        validate_price(price)?;
    }
    Ok(())
}

/// Apply defaults and bounds to raw pagination parameters
pub fn page_request(page: Option<u32>, limit: Option<u32>) -> FlexSpaceResult<PageRequest> {
    let page = page.unwrap_or(1);
    let limit = limit.unwrap_or(PageRequest::DEFAULT_LIMIT);
    if page < 1 {
        return Err(FlexSpaceError::validation("page", "page must be at least 1"));
    }
    if !(1..=PageRequest::MAX_LIMIT).contains(&limit) {
        return Err(FlexSpaceError::validation(
            "limit",
            format!("limit must be between 1 and {}", PageRequest::MAX_LIMIT),
        ));
    }
    Ok(PageRequest { page, limit })
}
