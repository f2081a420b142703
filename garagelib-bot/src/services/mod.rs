//! Business services used by the dispatcher and the upload workflow

pub mod announcer;
pub mod artist_resolver;
pub mod catalog_browser;
pub mod notification_fanout;
pub mod publish_pipeline;

pub use announcer::announce_version;
pub use artist_resolver::{ArtistChoice, ArtistResolver, Attribution};
pub use catalog_browser::CatalogBrowser;
pub use notification_fanout::{broadcast, FanoutReport, DEFAULT_NOTIFY_DELAY};
pub use publish_pipeline::{PublishPipeline, PublishReport, PublishRequest};
