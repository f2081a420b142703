//! Artist attribution for common tracks
//!
//! Zero cards: one is created from the fallback name. One card: it is used.
//! Several: the caller must ask the user and come back with an explicit id
//! through [`ArtistResolver::resolve_chosen`]. The resolver keeps no state
//! between those two calls.

use garagelib_common::db::{ArtistId, ArtistIdentity, UserId};
use sqlx::SqlitePool;
use tracing::info;

use crate::db;
use crate::error::{WorkflowError, WorkflowResult};

/// Artist card a track is published under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistChoice {
    pub id: ArtistId,
    pub name: String,
}

impl From<ArtistIdentity> for ArtistChoice {
    fn from(artist: ArtistIdentity) -> Self {
        Self {
            id: artist.id,
            name: artist.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribution {
    Resolved(ArtistChoice),
    /// All of the user's cards, oldest first
    DisambiguationRequired(Vec<ArtistIdentity>),
}

pub const ARTIST_NOT_FOUND_TEXT: &str = "Artist card not found.";

#[derive(Clone)]
pub struct ArtistResolver {
    db: SqlitePool,
}

impl ArtistResolver {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn resolve(&self, user_id: UserId, fallback_name: &str) -> WorkflowResult<Attribution> {
        let mut artists = db::list_artists_for_user(&self.db, user_id).await?;

        match artists.len() {
            0 => {
                let created = db::get_or_create_default_artist(&self.db, user_id, fallback_name).await?;
                info!(user_id, artist_id = created.id, "Created default artist card");
                Ok(Attribution::Resolved(created.into()))
            }
            1 => Ok(Attribution::Resolved(artists.remove(0).into())),
            _ => Ok(Attribution::DisambiguationRequired(artists)),
        }
    }

    /// Validate an explicit choice; missing or foreign cards are `NotFound`
    pub async fn resolve_chosen(&self, user_id: UserId, artist_id: ArtistId) -> WorkflowResult<ArtistChoice> {
        match db::get_artist(&self.db, artist_id).await? {
            Some(artist) if artist.user_id == user_id => Ok(artist.into()),
            _ => Err(WorkflowError::NotFound(ARTIST_NOT_FOUND_TEXT.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garagelib_common::db::init_memory_database;

    #[tokio::test]
    async fn test_zero_cards_creates_one_from_fallback() {
        let pool = init_memory_database().await.unwrap();
        let resolver = ArtistResolver::new(pool.clone());

        let attribution = resolver.resolve(42, "Max").await.unwrap();

        let Attribution::Resolved(choice) = attribution else {
            panic!("expected a resolved artist");
        };
        assert_eq!(choice.name, "Max");
        assert_eq!(db::list_artists_for_user(&pool, 42).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_single_card_returned_without_prompt() {
        let pool = init_memory_database().await.unwrap();
        let id = db::add_artist(&pool, 42, "DJ Max").await.unwrap();
        let resolver = ArtistResolver::new(pool.clone());

        for _ in 0..2 {
            assert_eq!(
                resolver.resolve(42, "ignored").await.unwrap(),
                Attribution::Resolved(ArtistChoice {
                    id,
                    name: "DJ Max".to_string()
                })
            );
        }
        assert_eq!(db::list_artists_for_user(&pool, 42).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_several_cards_need_disambiguation() {
        let pool = init_memory_database().await.unwrap();
        let max = db::add_artist(&pool, 42, "Max").await.unwrap();
        let dj = db::add_artist(&pool, 42, "DJ Max").await.unwrap();
        let resolver = ArtistResolver::new(pool.clone());

        match resolver.resolve(42, "Max").await.unwrap() {
            Attribution::DisambiguationRequired(candidates) => {
                let ids: Vec<_> = candidates.iter().map(|a| a.id).collect();
                assert_eq!(ids, vec![max, dj]);
            }
            other => panic!("unexpected {:?}", other),
        }

        let chosen = resolver.resolve_chosen(42, dj).await.unwrap();
        assert_eq!(chosen.name, "DJ Max");
    }

    #[tokio::test]
    async fn test_chosen_card_must_exist_and_be_owned() {
        let pool = init_memory_database().await.unwrap();
        let foreign = db::add_artist(&pool, 7, "Ann").await.unwrap();
        let resolver = ArtistResolver::new(pool.clone());

        assert!(matches!(
            resolver.resolve_chosen(42, foreign).await,
            Err(WorkflowError::NotFound(_))
        ));
        assert!(matches!(
            resolver.resolve_chosen(42, 9999).await,
            Err(WorkflowError::NotFound(_))
        ));
    }
}
