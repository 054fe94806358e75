//! Game catalogue types.

use serde::{Deserialize, Serialize};

use crate::http::response::ApiError;

/// Highest accepted star rating.
pub const MAX_STAR_RATING: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: u64,
    pub name: String,
    pub star_rating: Option<u8>,
    pub developer: String,
    pub year: i32,
    pub finished: bool,
}

/// Body of a create request; the id is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGame {
    pub name: String,
    #[serde(default)]
    pub star_rating: Option<u8>,
    pub developer: String,
    pub year: i32,
    #[serde(default)]
    pub finished: bool,
}

impl NewGame {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_fields(&self.name, &self.developer, self.star_rating)
    }

    pub fn into_game(self, id: u64) -> Game {
        Game {
            id,
            name: self.name,
            star_rating: self.star_rating,
            developer: self.developer,
            year: self.year,
            finished: self.finished,
        }
    }
}

impl Game {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_fields(&self.name, &self.developer, self.star_rating)
    }
}

fn validate_fields(name: &str, developer: &str, star_rating: Option<u8>) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".into()));
    }
    if developer.trim().is_empty() {
        return Err(ApiError::BadRequest("developer must not be empty".into()));
    }
    if let Some(rating) = star_rating {
        if rating > MAX_STAR_RATING {
            return Err(ApiError::BadRequest(format!(
                "star_rating must be between 0 and {MAX_STAR_RATING}"
            )));
        }
    }
    Ok(())
}

/// List wrapper, so XML gets one document element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameCollection {
    pub games: Vec<Game>,
}
