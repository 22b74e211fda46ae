//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! The selection engine (keywords, shuffle, listing, related, ledger) is
//! pure; the services around it orchestrate the repository and change feed.

pub mod keywords;
pub mod listing;
pub mod ledger;
pub mod related;
pub mod shuffle;

mod browse;
mod catalog;
mod content;
mod home;
mod search;
mod seed;
mod users;
mod validation;

pub use browse::{BrowseService, GalleryDetail, ModelDetail, VideoDetail};
pub use catalog::{CatalogService, ModelImageInput, ModelInput, ProfileInput};
pub use content::{ContentService, GalleryInput, VideoInput};
pub use home::{HomeFeed, HomeService};
pub use ledger::{HistoryItem, LedgerService, Recommendation, ResolvedFavorites};
pub use listing::{ListQuery, Listable, Page, SortBy};
pub use search::{SearchQuery, SearchResults, SearchService, SearchType};
pub use seed::{SeedReport, SeedService};
pub use users::UserService;
pub use validation::is_url;
