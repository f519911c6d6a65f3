//! Playback-side collaborators and the role-aware sync adapter.

mod adapter;
mod traits;

pub use adapter::SyncAdapter;
pub use traits::{CatalogTrack, LocalPlayback, NoopCacheWarmer, TrackCacheWarmer, TrackResolver};
