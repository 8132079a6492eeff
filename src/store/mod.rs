//! SQLite-backed persistence for candidate links and extracted profiles.
//!
//! [`LinkRepository`] is the boundary the batch driver depends on; [`LinkStore`]
//! implements it over [`Database`].

mod error;

use async_trait::async_trait;
use sqlx::FromRow;
use tracing::{debug, instrument};

pub use error::{StoreDbErrorKind, StoreError};

use crate::db::Database;
use crate::link::{CandidateLink, LinkStatus, LinkType};
use crate::profile::{LightingEffect, ProfileStub};

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Data-access contract for candidate links and profiles.
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Links in `NEW` or `RETRY`, in id order.
    async fn pending_links(&self) -> Result<Vec<CandidateLink>>;

    /// Records a discovered link. `None` if the post already has this URL.
    async fn insert_link(&self, parent_post_id: &str, original_url: &str) -> Result<Option<i64>>;

    /// Writes the link's type and status, inserting it if the id is unknown.
    async fn update_link(&self, link: &CandidateLink) -> Result<bool>;

    /// Stores a profile. `false` if its link or post already has one.
    async fn insert_profile(&self, profile: &ProfileStub) -> Result<bool>;

    async fn get_link(&self, id: i64) -> Result<Option<CandidateLink>>;

    async fn profile_for_link(&self, link_id: i64) -> Result<Option<ProfileStub>>;
}

#[derive(Debug, FromRow)]
struct LinkRow {
    id: i64,
    parent_post_id: String,
    original_url: String,
    link_type: String,
    link_status: String,
}

impl TryFrom<LinkRow> for CandidateLink {
    type Error = StoreError;

    fn try_from(row: LinkRow) -> Result<Self> {
        let link_type: LinkType = row
            .link_type
            .parse()
            .map_err(|_| StoreError::invalid_column("link_type", &row.link_type))?;
        let link_status: LinkStatus = row
            .link_status
            .parse()
            .map_err(|_| StoreError::invalid_column("link_status", &row.link_status))?;
        Ok(Self {
            id: row.id,
            parent_post_id: row.parent_post_id,
            original_url: row.original_url,
            link_type,
            link_status,
        })
    }
}

#[derive(Debug, FromRow)]
struct ProfileRow {
    origin_link_id: i64,
    parent_post_id: String,
    download_url: String,
    lighting_effects: String,
}

impl TryFrom<ProfileRow> for ProfileStub {
    type Error = StoreError;

    fn try_from(row: ProfileRow) -> Result<Self> {
        let lighting_effects: Vec<LightingEffect> = serde_json::from_str(&row.lighting_effects)?;
        Ok(Self {
            origin_link_id: row.origin_link_id,
            parent_post_id: row.parent_post_id,
            download_url: row.download_url,
            lighting_effects,
        })
    }
}

/// Link and profile tables over a pooled SQLite connection.
#[derive(Debug, Clone)]
pub struct LinkStore {
    db: Database,
}

impl LinkStore {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails, or
    /// [`StoreError::InvalidColumn`] for a row with an unknown type or status.
    #[instrument(skip(self))]
    pub async fn pending_links(&self) -> Result<Vec<CandidateLink>> {
        let rows = sqlx::query_as::<_, LinkRow>(
            r"SELECT id, parent_post_id, original_url, link_type, link_status
              FROM candidate_links
              WHERE link_status IN (?, ?)
              ORDER BY id ASC",
        )
        .bind(LinkStatus::New.as_str())
        .bind(LinkStatus::Retry.as_str())
        .fetch_all(self.db.pool())
        .await?;

        debug!(count = rows.len(), "loaded pending links");
        rows.into_iter().map(CandidateLink::try_from).collect()
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the insert fails.
    #[instrument(skip(self), fields(post = %parent_post_id, url = %original_url))]
    pub async fn insert_link(
        &self,
        parent_post_id: &str,
        original_url: &str,
    ) -> Result<Option<i64>> {
        let id: Option<(i64,)> = sqlx::query_as(
            r"INSERT INTO candidate_links (parent_post_id, original_url, link_type, link_status)
              VALUES (?, ?, ?, ?)
              ON CONFLICT (parent_post_id, original_url) DO NOTHING
              RETURNING id",
        )
        .bind(parent_post_id)
        .bind(original_url)
        .bind(LinkType::New.as_str())
        .bind(LinkStatus::New.as_str())
        .fetch_optional(self.db.pool())
        .await?;

        Ok(id.map(|(id,)| id))
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the write fails, including when the
    /// link's post and URL already belong to another id.
    #[instrument(skip(self, link), fields(id = link.id, status = %link.link_status))]
    pub async fn update_link(&self, link: &CandidateLink) -> Result<bool> {
        let result = sqlx::query(
            r"INSERT INTO candidate_links (id, parent_post_id, original_url, link_type, link_status)
              VALUES (?, ?, ?, ?, ?)
              ON CONFLICT (id) DO UPDATE SET
                  parent_post_id = excluded.parent_post_id,
                  original_url = excluded.original_url,
                  link_type = excluded.link_type,
                  link_status = excluded.link_status,
                  updated_at = datetime('now')",
        )
        .bind(link.id)
        .bind(&link.parent_post_id)
        .bind(&link.original_url)
        .bind(link.link_type.as_str())
        .bind(link.link_status.as_str())
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Json`] if the effects cannot be serialized, or
    /// [`StoreError::Database`] if the insert fails for a reason other than an
    /// existing profile (e.g. the origin link does not exist).
    #[instrument(skip(self, profile), fields(link = profile.origin_link_id, post = %profile.parent_post_id))]
    pub async fn insert_profile(&self, profile: &ProfileStub) -> Result<bool> {
        let effects = serde_json::to_string(&profile.lighting_effects)?;
        let result = sqlx::query(
            r"INSERT INTO profiles (origin_link_id, parent_post_id, download_url, lighting_effects)
              VALUES (?, ?, ?, ?)
              ON CONFLICT DO NOTHING",
        )
        .bind(profile.origin_link_id)
        .bind(&profile.parent_post_id)
        .bind(&profile.download_url)
        .bind(effects)
        .execute(self.db.pool())
        .await?;

        let inserted = result.rows_affected() > 0;
        if !inserted {
            debug!("profile already recorded for this link or post");
        }
        Ok(inserted)
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn get_link(&self, id: i64) -> Result<Option<CandidateLink>> {
        let row = sqlx::query_as::<_, LinkRow>(
            r"SELECT id, parent_post_id, original_url, link_type, link_status
              FROM candidate_links WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(CandidateLink::try_from).transpose()
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails, or
    /// [`StoreError::Json`] if the stored effects are not valid JSON.
    #[instrument(skip(self))]
    pub async fn profile_for_link(&self, link_id: i64) -> Result<Option<ProfileStub>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r"SELECT origin_link_id, parent_post_id, download_url, lighting_effects
              FROM profiles WHERE origin_link_id = ?",
        )
        .bind(link_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(ProfileStub::try_from).transpose()
    }
}

#[async_trait]
impl LinkRepository for LinkStore {
    async fn pending_links(&self) -> Result<Vec<CandidateLink>> {
        LinkStore::pending_links(self).await
    }

    async fn insert_link(&self, parent_post_id: &str, original_url: &str) -> Result<Option<i64>> {
        LinkStore::insert_link(self, parent_post_id, original_url).await
    }

    async fn update_link(&self, link: &CandidateLink) -> Result<bool> {
        LinkStore::update_link(self, link).await
    }

    async fn insert_profile(&self, profile: &ProfileStub) -> Result<bool> {
        LinkStore::insert_profile(self, profile).await
    }

    async fn get_link(&self, id: i64) -> Result<Option<CandidateLink>> {
        LinkStore::get_link(self, id).await
    }

    async fn profile_for_link(&self, link_id: i64) -> Result<Option<ProfileStub>> {
        LinkStore::profile_for_link(self, link_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn store() -> LinkStore {
        LinkStore::new(Database::new_in_memory().await.unwrap())
    }

    fn profile(link: &CandidateLink) -> ProfileStub {
        let effect = LightingEffect {
            name: "Wave".to_string(),
            devices: vec!["Keyboard".to_string()],
            colours: vec!["#00ff00".to_string()],
            effects: vec!["wave".to_string()],
        };
        ProfileStub::new(link, "https://drive.google.com/uc?id=X&export=download", vec![effect])
            .unwrap()
    }

    #[tokio::test]
    async fn test_insert_link_starts_new() {
        let store = store().await;
        let id = store.insert_link("post-1", "https://a").await.unwrap().unwrap();

        let link = store.get_link(id).await.unwrap().unwrap();
        assert_eq!(link, CandidateLink::new(id, "post-1", "https://a"));
    }

    #[tokio::test]
    async fn test_insert_link_duplicate_returns_none() {
        let store = store().await;
        assert!(store.insert_link("p", "https://a").await.unwrap().is_some());
        assert!(store.insert_link("p", "https://a").await.unwrap().is_none());
        assert!(store.insert_link("q", "https://a").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_pending_links_only_new_and_retry_in_id_order() {
        let store = store().await;
        let a = store.insert_link("p", "https://a").await.unwrap().unwrap();
        let b = store.insert_link("p", "https://b").await.unwrap().unwrap();
        let c = store.insert_link("p", "https://c").await.unwrap().unwrap();

        let link_b = store.get_link(b).await.unwrap().unwrap();
        store
            .update_link(&link_b.with_result(LinkType::GoogleDrive, LinkStatus::Ok))
            .await
            .unwrap();
        let link_c = store.get_link(c).await.unwrap().unwrap();
        store
            .update_link(&link_c.with_result(LinkType::GoogleDrive, LinkStatus::Retry))
            .await
            .unwrap();

        let ids: Vec<i64> = store
            .pending_links()
            .await
            .unwrap()
            .iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ids, vec![a, c]);
    }

    #[tokio::test]
    async fn test_update_link_is_idempotent() {
        let store = store().await;
        let id = store.insert_link("p", "https://a").await.unwrap().unwrap();
        let updated = CandidateLink::new(id, "p", "https://a")
            .with_result(LinkType::New, LinkStatus::Unsupported);

        assert!(store.update_link(&updated).await.unwrap());
        assert!(store.update_link(&updated).await.unwrap());
        assert_eq!(store.get_link(id).await.unwrap().unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_link_inserts_unknown_id() {
        let store = store().await;
        let link = CandidateLink::new(42, "p", "https://a");
        assert!(store.update_link(&link).await.unwrap());
        assert_eq!(store.get_link(42).await.unwrap().unwrap(), link);
    }

    #[tokio::test]
    async fn test_insert_profile_once_per_link_and_post() {
        let store = store().await;
        let a = store.insert_link("p", "https://a").await.unwrap().unwrap();
        let b = store.insert_link("p", "https://b").await.unwrap().unwrap();
        let link_a = store.get_link(a).await.unwrap().unwrap();
        let link_b = store.get_link(b).await.unwrap().unwrap();

        assert!(store.insert_profile(&profile(&link_a)).await.unwrap());
        assert!(!store.insert_profile(&profile(&link_a)).await.unwrap());
        assert!(!store.insert_profile(&profile(&link_b)).await.unwrap());
    }

    #[tokio::test]
    async fn test_profile_round_trips_effects() {
        let store = store().await;
        let id = store.insert_link("p", "https://a").await.unwrap().unwrap();
        let link = store.get_link(id).await.unwrap().unwrap();
        let stub = profile(&link);
        store.insert_profile(&stub).await.unwrap();

        assert_eq!(store.profile_for_link(id).await.unwrap(), Some(stub));
        assert!(store.profile_for_link(id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_profile_for_unknown_link_is_constraint_error() {
        let store = store().await;
        let orphan = CandidateLink::new(99, "p", "https://a");
        let err = store.insert_profile(&profile(&orphan)).await.unwrap_err();
        assert!(err.is_constraint_violation(), "got {err}");
    }

    #[tokio::test]
    async fn test_get_missing_link_is_none() {
        assert!(store().await.get_link(1).await.unwrap().is_none());
    }
}
