//! Shared constants used across the application.

/// Origin of the Graph API.
pub const DEFAULT_GRAPH_API_BASE: &str = "https://graph.facebook.com";

/// Graph API version path segment.
pub const DEFAULT_GRAPH_API_VERSION: &str = "v19.0";

/// Directory holding one snapshot file per post.
pub const DEFAULT_POSTS_DIR: &str = "posts";

/// Body of every automatic reply.
pub const DEFAULT_REPLY_MESSAGE: &str = "Thank for comment";

/// Fields requested when listing the feed.
pub const FEED_FIELDS: &str = "id,message,created_time,from,attachments,permalink_url";

/// Fields requested when listing a post's comments.
pub const COMMENT_FIELDS: &str = "id,message,created_time,from,like_count";

/// Graph API error code for missing permissions.
pub const PERMISSION_ERROR_CODE: i64 = 200;

/// Remediation advice logged when a reply fails with [`PERMISSION_ERROR_CODE`].
pub const PERMISSION_HINTS: &[&str] = &[
    "Page access token instead of user token",
    "pages_manage_posts permission",
    "Admin role on the page",
];

/// Permissions the token needs to read the feed and post replies.
pub const REQUIRED_PERMISSIONS: &[&str] = &[
    "pages_manage_posts",
    "pages_read_engagement",
    "pages_show_list",
];

/// User agent sent with every Graph API request.
pub const USER_AGENT: &str = concat!("page-reply-sync/", env!("CARGO_PKG_VERSION"));

/// Format of `last_updated` in snapshot files.
pub const LAST_UPDATED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Exit code of a run with no failures.
pub const EXIT_OK: i32 = 0;

/// Exit code for configuration, authentication, or startup errors.
pub const EXIT_FATAL: i32 = 1;

/// Exit code of a run that completed with some failures.
pub const EXIT_PARTIAL: i32 = 2;
