//! Movie catalog models.

use crate::user::AccountId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub type MovieId = i64;
pub type CrewId = i64;

pub const COMPOSER_ROLE: &str = "Composer";
pub const UNKNOWN_COMPOSER: &str = "Unknown Composer";

/// Case-folded form used for every natural-key lookup (titles, crew names,
/// song titles, genres, usernames).
pub fn normalize_key(value: &str) -> String {
    value.trim().to_lowercase()
}

pub fn is_composer_role(role: &str) -> bool {
    role.trim().eq_ignore_ascii_case(COMPOSER_ROLE)
}

/// A crew member with the jobs they held on one movie.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewCredit {
    pub name: String,
    pub roles: Vec<String>,
}

impl CrewCredit {
    pub fn new<I, S>(name: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_composer(&self) -> bool {
        self.roles.iter().any(|r| is_composer_role(r))
    }
}

/// Everything needed to insert a movie. Song order is the track order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieDraft {
    pub title: String,
    pub runtime: i64,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub crew: Vec<CrewCredit>,
    #[serde(default)]
    pub score: Vec<String>,
}

impl MovieDraft {
    pub fn new(title: impl Into<String>, runtime: i64) -> Self {
        Self {
            title: title.into(),
            runtime,
            ..Default::default()
        }
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genres.push(genre.into());
        self
    }

    pub fn with_crew<I, S>(mut self, name: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.crew.push(CrewCredit::new(name, roles));
        self
    }

    pub fn with_song(mut self, song: impl Into<String>) -> Self {
        self.score.push(song.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub track_number: u32,
    pub title: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub composer: String,
    pub songs: Vec<Song>,
}

impl Score {
    pub fn titles(&self) -> Vec<&str> {
        self.songs.iter().map(|s| s.title.as_str()).collect()
    }
}

/// A fully hydrated movie as read back from the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    pub runtime: u32,
    pub genres: Vec<String>,
    /// Crew member name to the set of roles held on this movie.
    pub crew: BTreeMap<String, BTreeSet<String>>,
    pub score: Score,
    pub average_rating: f64,
    pub rating_count: u32,
    pub reviews: BTreeMap<AccountId, Vec<String>>,
}

impl Movie {
    pub fn rating_total(&self) -> f64 {
        self.average_rating * self.rating_count as f64
    }

    /// Mean of all ratings received, 0 when there are none.
    pub fn calculate_rating(&self) -> f64 {
        if self.rating_count == 0 {
            return 0.0;
        }
        self.rating_total() / self.rating_count as f64
    }

    pub fn add_rating(&mut self, rating: f64) {
        let (average, count) = rolling_average(self.average_rating, self.rating_count, rating);
        self.average_rating = average;
        self.rating_count = count;
    }

    pub fn add_review(&mut self, account_id: AccountId, review: impl Into<String>) {
        self.reviews
            .entry(account_id)
            .or_default()
            .push(review.into());
    }

    pub fn get_review_by_user(&self, account_id: AccountId) -> Option<&[String]> {
        self.reviews.get(&account_id).map(Vec::as_slice)
    }

    pub fn composer(&self) -> &str {
        &self.score.composer
    }

    pub fn roles_of(&self, crew_name: &str) -> Option<&BTreeSet<String>> {
        self.crew.get(crew_name)
    }
}

/// Folds `rating` into an average of `count` ratings, returning the new
/// average and count.
pub fn rolling_average(average: f64, count: u32, rating: f64) -> (f64, u32) {
    let new_count = count.saturating_add(1);
    let total = average * count as f64 + rating;
    (total / new_count as f64, new_count)
}
