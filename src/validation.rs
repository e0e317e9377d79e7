//! Input validation shared by the stores.
//!
//! Interactive callers are expected to validate before calling a store, but
//! the stores run these checks again and refuse impossible values instead of
//! persisting them.

use crate::catalog_store::{CrewCredit, MovieDraft};
use std::fmt;

pub const MAX_USERNAME_LENGTH: usize = 32;
pub const MAX_PASSWORD_LENGTH: usize = 64;
pub const MAX_TITLE_LENGTH: usize = 256;
pub const MAX_CREW_NAME_LENGTH: usize = 128;
pub const MAX_ROLE_LENGTH: usize = 64;
pub const MAX_SONG_LENGTH: usize = 256;
pub const MAX_GENRE_LENGTH: usize = 64;
pub const MAX_REVIEW_LENGTH: usize = 250;
pub const MAX_COLLECTION_NAME_LENGTH: usize = 64;

pub const MIN_RATING: f64 = 0.0;
pub const MAX_RATING: f64 = 5.0;

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyField {
        field: &'static str,
    },
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
    NegativeValue {
        field: &'static str,
        value: i64,
    },
    RatingOutOfRange {
        value: f64,
    },
    RankOutOfRange {
        rank: usize,
        max: usize,
    },
    IndexOutOfRange {
        index: usize,
        len: usize,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField { field } => {
                write!(f, "Field '{}' is required but was empty", field)
            }
            ValidationError::TooLong { field, max, actual } => write!(
                f,
                "Field '{}' is limited to {} characters, got {}",
                field, max, actual
            ),
            ValidationError::NegativeValue { field, value } => {
                write!(f, "Field '{}' must be non-negative, got {}", field, value)
            }
            ValidationError::RatingOutOfRange { value } => write!(
                f,
                "Rating must be between {} and {}, got {}",
                MIN_RATING, MAX_RATING, value
            ),
            ValidationError::RankOutOfRange { rank, max } => {
                write!(f, "Rank must be between 1 and {}, got {}", max, rank)
            }
            ValidationError::IndexOutOfRange { index, len } => {
                write!(f, "Position {} is outside of a list of {} entries", index, len)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Checks that `value` is not blank and fits in `max` characters.
pub fn validate_text(field: &'static str, value: &str, max: usize) -> ValidationResult<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    let actual = trimmed.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong { field, max, actual });
    }
    Ok(())
}

pub fn validate_rating(rating: f64) -> ValidationResult<()> {
    if !rating.is_finite() || !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(ValidationError::RatingOutOfRange { value: rating });
    }
    Ok(())
}

pub fn validate_review(review: &str) -> ValidationResult<()> {
    validate_text("review", review, MAX_REVIEW_LENGTH)
}

pub fn validate_username(username: &str) -> ValidationResult<()> {
    validate_text("username", username, MAX_USERNAME_LENGTH)
}

pub fn validate_collection_name(name: &str) -> ValidationResult<()> {
    validate_text("collection name", name, MAX_COLLECTION_NAME_LENGTH)
}

/// Plaintext passwords are only length-checked, they are never stored.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField { field: "password" });
    }
    let actual = password.chars().count();
    if actual > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong {
            field: "password",
            max: MAX_PASSWORD_LENGTH,
            actual,
        });
    }
    Ok(())
}

pub fn validate_crew(crew: &[CrewCredit]) -> ValidationResult<()> {
    for credit in crew {
        validate_text("crew name", &credit.name, MAX_CREW_NAME_LENGTH)?;
        for role in &credit.roles {
            validate_text("crew role", role, MAX_ROLE_LENGTH)?;
        }
    }
    Ok(())
}

pub fn validate_songs(songs: &[String]) -> ValidationResult<()> {
    for song in songs {
        validate_text("song", song, MAX_SONG_LENGTH)?;
    }
    Ok(())
}

pub fn validate_movie_draft(draft: &MovieDraft) -> ValidationResult<()> {
    validate_text("title", &draft.title, MAX_TITLE_LENGTH)?;
    if draft.runtime < 0 {
        return Err(ValidationError::NegativeValue {
            field: "runtime",
            value: draft.runtime,
        });
    }
    if draft.runtime > u32::MAX as i64 {
        return Err(ValidationError::TooLong {
            field: "runtime",
            max: u32::MAX as usize,
            actual: draft.runtime as usize,
        });
    }
    for genre in &draft.genres {
        validate_text("genre", genre, MAX_GENRE_LENGTH)?;
    }
    validate_crew(&draft.crew)?;
    validate_songs(&draft.score)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_valid_draft() -> MovieDraft {
        MovieDraft::new("Hatari!", 157)
            .with_genre("Adventure")
            .with_crew("John Wayne", ["Actor", "Producer"])
            .with_crew("Henry Mancini", ["Composer"])
            .with_song("Baby Elephant Walk")
    }

    #[test]
    fn test_validate_draft_valid() {
        assert!(validate_movie_draft(&make_valid_draft()).is_ok());
    }

    #[test]
    fn test_validate_draft_blank_title() {
        let mut draft = make_valid_draft();
        draft.title = "   ".to_string();
        let err = validate_movie_draft(&draft).unwrap_err();
        assert!(matches!(err, ValidationError::EmptyField { field: "title" }));
    }

    #[test]
    fn test_validate_draft_negative_runtime() {
        let mut draft = make_valid_draft();
        draft.runtime = -5;
        let err = validate_movie_draft(&draft).unwrap_err();
        assert_eq!(
            err,
            ValidationError::NegativeValue {
                field: "runtime",
                value: -5
            }
        );
    }

    #[test]
    fn test_validate_draft_empty_role() {
        let draft = make_valid_draft().with_crew("Howard Hawks", ["Director", " "]);
        let err = validate_movie_draft(&draft).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::EmptyField {
                field: "crew role"
            }
        ));
    }

    #[test]
    fn test_validate_draft_long_song() {
        let draft = make_valid_draft().with_song("la".repeat(200));
        let err = validate_movie_draft(&draft).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::TooLong {
                field: "song",
                max: MAX_SONG_LENGTH,
                actual: 400
            }
        ));
    }

    #[test]
    fn test_validate_rating_bounds() {
        assert!(validate_rating(0.0).is_ok());
        assert!(validate_rating(5.0).is_ok());
        assert!(validate_rating(2.75).is_ok());
        assert!(validate_rating(-0.5).is_err());
        assert!(validate_rating(5.01).is_err());
        assert!(validate_rating(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_username_length() {
        assert!(validate_username("brendan").is_ok());
        assert!(validate_username(&"a".repeat(MAX_USERNAME_LENGTH)).is_ok());
        let err = validate_username(&"a".repeat(MAX_USERNAME_LENGTH + 1)).unwrap_err();
        assert!(matches!(err, ValidationError::TooLong { field: "username", .. }));
    }

    #[test]
    fn test_validate_review_length() {
        assert!(validate_review("I'm a big fan!").is_ok());
        assert!(validate_review(&"x".repeat(MAX_REVIEW_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_display_messages() {
        let err = ValidationError::RankOutOfRange { rank: 9, max: 3 };
        assert_eq!(err.to_string(), "Rank must be between 1 and 3, got 9");
    }
}
