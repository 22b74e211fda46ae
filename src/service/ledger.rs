//! Favorites and watch-history ledger
//!
//! Per-user favorite set and most-recent-first watch history. References are
//! stored as ids and resolved against the catalog on every read. Favorites
//! also seed the AI recommendations.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::listing::published;
use crate::ai::{AiService, Candidate};
use crate::data::{
    ContentRepository, Favorite, FavoriteKind, Gallery, HistoryEntry, Photo, RepositoryExt, User,
    Video,
};
use crate::error::AppError;

/// Add or remove a favorite. Returns whether the set changed.
pub fn toggle_favorite(user: &mut User, favorite: Favorite, add: bool) -> bool {
    let present = user.favorites.contains(&favorite);
    match (add, present) {
        (true, false) => {
            user.favorites.push(favorite);
            true
        }
        (false, true) => {
            user.favorites.retain(|existing| existing != &favorite);
            true
        }
        _ => false,
    }
}

/// Move `video_id` to the front of the history, keeping `retention` entries.
pub fn record_view(user: &mut User, video_id: &str, now: DateTime<Utc>, retention: usize) {
    user.watch_history.retain(|entry| entry.id != video_id);
    user.watch_history.insert(
        0,
        HistoryEntry {
            id: video_id.to_string(),
            viewed_at: now,
        },
    );
    user.watch_history.truncate(retention);
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedFavorites {
    pub videos: Vec<Video>,
    pub galleries: Vec<Gallery>,
    pub photos: Vec<Photo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub video: Video,
    pub viewed_at: DateTime<Utc>,
}

/// Resolve favorites against the catalog.
///
/// Returns the visible items plus the favorites whose target no longer
/// exists at all. Favorites pointing at drafts are hidden but kept.
pub fn resolve_favorites(
    favorites: &[Favorite],
    videos: &[Video],
    galleries: &[Gallery],
) -> (ResolvedFavorites, Vec<Favorite>) {
    let videos: HashMap<&str, &Video> = videos.iter().map(|v| (v.id.as_str(), v)).collect();
    let galleries: HashMap<&str, &Gallery> =
        galleries.iter().map(|g| (g.id.as_str(), g)).collect();

    let mut resolved = ResolvedFavorites::default();
    let mut dangling = Vec::new();

    for favorite in favorites {
        match favorite.kind {
            FavoriteKind::Video => match videos.get(favorite.id.as_str()) {
                Some(video) if video.status.is_published() => resolved.videos.push((*video).clone()),
                Some(_) => {}
                None => dangling.push(favorite.clone()),
            },
            FavoriteKind::Gallery => match galleries.get(favorite.id.as_str()) {
                Some(gallery) if gallery.status.is_published() => {
                    resolved.galleries.push((*gallery).clone())
                }
                Some(_) => {}
                None => dangling.push(favorite.clone()),
            },
            FavoriteKind::Photo => {
                let photo = Photo::parse_id(&favorite.id).and_then(|(gallery_id, index)| {
                    galleries
                        .get(gallery_id)
                        .map(|gallery| (gallery, gallery.photos().into_iter().nth(index)))
                });
                match photo {
                    Some((gallery, Some(photo))) => {
                        if gallery.status.is_published() {
                            resolved.photos.push(photo);
                        }
                    }
                    _ => dangling.push(favorite.clone()),
                }
            }
        }
    }

    (resolved, dangling)
}

/// Resolve history entries, dropping videos that are gone or unpublished.
pub fn resolve_history(history: &[HistoryEntry], videos: &[Video]) -> Vec<HistoryItem> {
    let videos: HashMap<&str, &Video> = videos.iter().map(|v| (v.id.as_str(), v)).collect();
    history
        .iter()
        .filter_map(|entry| {
            videos
                .get(entry.id.as_str())
                .filter(|video| video.status.is_published())
                .map(|video| HistoryItem {
                    video: (*video).clone(),
                    viewed_at: entry.viewed_at,
                })
        })
        .collect()
}

/// A suggested catalog item
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "item", rename_all = "lowercase")]
pub enum Recommendation {
    Video(Video),
    Gallery(Gallery),
}

fn video_candidate(video: &Video) -> Candidate {
    Candidate {
        id: video.id.clone(),
        title: video.title.clone(),
        description: video.description.clone(),
        models: video.models.clone(),
        tags: video.tags.clone(),
    }
}

fn gallery_candidate(gallery: &Gallery) -> Candidate {
    Candidate {
        id: gallery.id.clone(),
        title: gallery.title.clone(),
        description: gallery.description.clone(),
        models: gallery.models.clone(),
        tags: gallery.tags.clone(),
    }
}

/// Ledger operations against stored users
pub struct LedgerService {
    repo: Arc<dyn ContentRepository>,
    retention: usize,
}

impl LedgerService {
    pub fn new(repo: Arc<dyn ContentRepository>, retention: usize) -> Self {
        Self { repo, retention }
    }

    async fn user(&self, user_id: &str) -> Result<User, AppError> {
        self.repo
            .get::<User>(user_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Favorites of a user, pruning references to deleted content.
    pub async fn favorites(&self, user_id: &str) -> Result<ResolvedFavorites, AppError> {
        let mut user = self.user(user_id).await?;
        let videos = self.repo.list::<Video>().await?;
        let galleries = self.repo.list::<Gallery>().await?;

        let (resolved, dangling) = resolve_favorites(&user.favorites, &videos, &galleries);
        if !dangling.is_empty() {
            user.favorites.retain(|favorite| !dangling.contains(favorite));
            self.repo.put(&user).await?;
            tracing::info!(
                user_id = %user.id,
                pruned = dangling.len(),
                "Pruned dangling favorites"
            );
        }

        Ok(resolved)
    }

    /// Add or remove a favorite. Unknown targets are rejected on add.
    pub async fn set_favorite(
        &self,
        user_id: &str,
        favorite: Favorite,
        add: bool,
    ) -> Result<bool, AppError> {
        let mut user = self.user(user_id).await?;

        if add && !self.target_exists(&favorite).await? {
            return Err(AppError::NotFound);
        }

        let changed = toggle_favorite(&mut user, favorite, add);
        if changed {
            self.repo.put(&user).await?;
        }
        Ok(changed)
    }

    async fn target_exists(&self, favorite: &Favorite) -> Result<bool, AppError> {
        Ok(match favorite.kind {
            FavoriteKind::Video => self.repo.get::<Video>(&favorite.id).await?.is_some(),
            FavoriteKind::Gallery => self.repo.get::<Gallery>(&favorite.id).await?.is_some(),
            FavoriteKind::Photo => match Photo::parse_id(&favorite.id) {
                Some((gallery_id, index)) => self
                    .repo
                    .get::<Gallery>(gallery_id)
                    .await?
                    .is_some_and(|gallery| index < gallery.album.len()),
                None => false,
            },
        })
    }

    pub async fn history(&self, user_id: &str) -> Result<Vec<HistoryItem>, AppError> {
        let user = self.user(user_id).await?;
        let videos = self.repo.list::<Video>().await?;
        Ok(resolve_history(&user.watch_history, &videos))
    }

    /// Suggest published videos and galleries from the user's favorites.
    pub async fn recommendations(
        &self,
        user_id: &str,
        ai: &AiService,
    ) -> Result<Vec<Recommendation>, AppError> {
        let favorites = self.favorites(user_id).await?;
        let videos = published(&self.repo.list::<Video>().await?);
        let galleries = published(&self.repo.list::<Gallery>().await?);

        let liked: Vec<Candidate> = favorites
            .videos
            .iter()
            .map(video_candidate)
            .chain(favorites.galleries.iter().map(gallery_candidate))
            .collect();
        let catalog: Vec<Candidate> = videos
            .iter()
            .map(video_candidate)
            .chain(galleries.iter().map(gallery_candidate))
            .collect();

        let ids = ai.recommend(&liked, &catalog).await?;
        Ok(ids
            .iter()
            .filter_map(|id| {
                videos
                    .iter()
                    .find(|video| &video.id == id)
                    .map(|video| Recommendation::Video(video.clone()))
                    .or_else(|| {
                        galleries
                            .iter()
                            .find(|gallery| &gallery.id == id)
                            .map(|gallery| Recommendation::Gallery(gallery.clone()))
                    })
            })
            .collect())
    }

    /// Record that a user watched a published video.
    pub async fn record_view(&self, user_id: &str, video_id: &str) -> Result<(), AppError> {
        let video = self.repo.get::<Video>(video_id).await?;
        if !video.is_some_and(|video| video.status.is_published()) {
            return Err(AppError::NotFound);
        }

        let mut user = self.user(user_id).await?;
        record_view(&mut user, video_id, Utc::now(), self.retention);
        self.repo.put(&user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockTextGenerator;
    use crate::data::{InMemoryRepository, PublishStatus, Role};
    use crate::service::listing::tests::video;

    fn user() -> User {
        User {
            id: "u1".to_string(),
            name: "Visitor".to_string(),
            email: "visitor@example.com".to_string(),
            image: String::new(),
            role: Role::User,
            favorites: vec![],
            watch_history: vec![],
            created_at: Utc::now(),
        }
    }

    fn gallery(id: &str, photos: usize) -> Gallery {
        Gallery {
            id: id.to_string(),
            title: format!("Gallery {id}"),
            description: String::new(),
            image: "https://cdn.example.com/cover.jpg".to_string(),
            album: (0..photos)
                .map(|i| format!("https://cdn.example.com/{id}/{i}.jpg"))
                .collect(),
            models: vec!["Ava".to_string()],
            tags: vec![],
            keywords: Default::default(),
            status: PublishStatus::Published,
            date: Utc::now(),
            resolution: None,
            category: None,
        }
    }

    fn fav(id: &str, kind: FavoriteKind) -> Favorite {
        Favorite {
            id: id.to_string(),
            kind,
        }
    }

    #[test]
    fn toggle_is_idempotent() {
        let mut user = user();
        let favorite = fav("v1", FavoriteKind::Video);

        assert!(toggle_favorite(&mut user, favorite.clone(), true));
        assert!(!toggle_favorite(&mut user, favorite.clone(), true));
        assert_eq!(user.favorites.len(), 1);

        assert!(toggle_favorite(&mut user, favorite.clone(), false));
        assert!(!toggle_favorite(&mut user, favorite, false));
        assert!(user.favorites.is_empty());
    }

    #[test]
    fn same_id_different_kind_are_distinct() {
        let mut user = user();
        toggle_favorite(&mut user, fav("x", FavoriteKind::Video), true);
        toggle_favorite(&mut user, fav("x", FavoriteKind::Gallery), true);
        assert_eq!(user.favorites.len(), 2);
    }

    #[test]
    fn record_view_moves_to_front_without_duplicates() {
        let mut user = user();
        let now = Utc::now();
        record_view(&mut user, "a", now, 100);
        record_view(&mut user, "b", now, 100);
        record_view(&mut user, "a", now, 100);

        let ids: Vec<&str> = user.watch_history.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn record_view_truncates_to_retention() {
        let mut user = user();
        for n in 0..10 {
            record_view(&mut user, &format!("v{n}"), Utc::now(), 3);
        }
        let ids: Vec<&str> = user.watch_history.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["v9", "v8", "v7"]);
    }

    #[test]
    fn resolve_favorites_reports_dangling_and_hides_drafts() {
        let mut draft = video("draft", 1, &[]);
        draft.status = PublishStatus::Draft;
        let videos = vec![video("live", 2, &[]), draft];
        let galleries = vec![gallery("g1", 2)];
        let favorites = vec![
            fav("live", FavoriteKind::Video),
            fav("draft", FavoriteKind::Video),
            fav("gone", FavoriteKind::Video),
            fav("g1", FavoriteKind::Gallery),
            fav("g1-photo-1", FavoriteKind::Photo),
            fav("g1-photo-9", FavoriteKind::Photo),
        ];

        let (resolved, dangling) = resolve_favorites(&favorites, &videos, &galleries);

        assert_eq!(resolved.videos.len(), 1);
        assert_eq!(resolved.galleries.len(), 1);
        assert_eq!(resolved.photos.len(), 1);
        assert_eq!(resolved.photos[0].title, "Gallery g1 - Photo 2");
        assert_eq!(
            dangling,
            vec![fav("gone", FavoriteKind::Video), fav("g1-photo-9", FavoriteKind::Photo)]
        );
    }

    #[test]
    fn resolve_history_skips_missing_videos() {
        let history = vec![
            HistoryEntry {
                id: "gone".to_string(),
                viewed_at: Utc::now(),
            },
            HistoryEntry {
                id: "live".to_string(),
                viewed_at: Utc::now(),
            },
        ];
        let items = resolve_history(&history, &[video("live", 1, &[])]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].video.id, "live");
    }

    #[tokio::test]
    async fn favorites_read_prunes_stored_user() {
        let repo: Arc<dyn ContentRepository> = Arc::new(InMemoryRepository::new());
        let mut stored = user();
        stored.favorites = vec![fav("gone", FavoriteKind::Video)];
        repo.put(&stored).await.unwrap();

        let ledger = LedgerService::new(repo.clone(), 100);
        let resolved = ledger.favorites("u1").await.unwrap();
        assert!(resolved.videos.is_empty());

        let reloaded: User = repo.get("u1").await.unwrap().unwrap();
        assert!(reloaded.favorites.is_empty());
    }

    #[tokio::test]
    async fn favoriting_unknown_content_is_not_found() {
        let repo: Arc<dyn ContentRepository> = Arc::new(InMemoryRepository::new());
        repo.put(&user()).await.unwrap();
        let ledger = LedgerService::new(repo, 100);

        let result = ledger
            .set_favorite("u1", fav("nope", FavoriteKind::Video), true)
            .await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn record_view_persists_history() {
        let repo: Arc<dyn ContentRepository> = Arc::new(InMemoryRepository::new());
        repo.put(&user()).await.unwrap();
        repo.put(&video("v1", 1, &[])).await.unwrap();
        let ledger = LedgerService::new(repo, 2);

        ledger.record_view("u1", "v1").await.unwrap();
        let history = ledger.history("u1").await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(matches!(
            ledger.record_view("u1", "missing").await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn recommendations_resolve_published_unfavorited_items() {
        let repo: Arc<dyn ContentRepository> = Arc::new(InMemoryRepository::new());
        let mut stored = user();
        stored.favorites = vec![fav("v1", FavoriteKind::Video)];
        repo.put(&stored).await.unwrap();
        let mut draft = video("v3", 3, &["noir"]);
        draft.status = PublishStatus::Draft;
        for item in [video("v1", 1, &["noir"]), video("v2", 2, &["noir"]), draft] {
            repo.put(&item).await.unwrap();
        }
        repo.put(&gallery("g1", 1)).await.unwrap();

        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .withf(|prompt| !prompt.text.contains("(ID: v3)"))
            .times(1)
            .returning(|_| Ok(r#"["v3", "g1", "v1", "v2"]"#.to_string()));
        let ai = AiService::new(Arc::new(generator), Arc::new(reqwest::Client::new()));

        let picks = LedgerService::new(repo, 100)
            .recommendations("u1", &ai)
            .await
            .unwrap();

        let ids: Vec<&str> = picks
            .iter()
            .map(|pick| match pick {
                Recommendation::Video(video) => video.id.as_str(),
                Recommendation::Gallery(gallery) => gallery.id.as_str(),
            })
            .collect();
        assert_eq!(ids, vec!["g1", "v2"]);

        let json = serde_json::to_value(&picks[0]).unwrap();
        assert_eq!(json["type"], "gallery");
        assert_eq!(json["item"]["id"], "g1");
    }
}
