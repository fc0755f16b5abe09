/// Application name
pub const APP_NAME: &str = "FitStage";

/// Default number of votes a spectator may cast within one category.
/// Admins can override this per category at creation time.
pub const DEFAULT_MAX_VOTES_PER_CATEGORY: u32 = 5;

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Maximum post content length in characters
pub const MAX_POST_CONTENT_LEN: usize = 2_000;

/// Maximum display-name length in characters
pub const MAX_DISPLAY_NAME_LEN: usize = 64;

/// Maximum number of media attachments on a single post
pub const MAX_POST_MEDIA: usize = 10;

/// Maximum number of tags on a single post
pub const MAX_POST_TAGS: usize = 20;
