//! v001 -- Initial schema creation.
//!
//! Creates the core tables: `users`, `categories`, `competitors`,
//! `category_members`, `votes`, `posts`, `post_media`, `post_tags`, and
//! `engagement_events`.
//!
//! Vote tallies and ranks are intentionally absent: they are always derived
//! from `votes` at read time. The `posts` counters are the only denormalized
//! aggregates, updated in the same transaction as their event rows.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users (spectators, competitors, promoters, admins)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id           TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    display_name TEXT NOT NULL,
    role         TEXT NOT NULL,               -- spectator|competitor|promoter|admin
    created_at   TEXT NOT NULL                -- ISO-8601 / RFC-3339
);

-- ----------------------------------------------------------------
-- Competition categories (divisions)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS categories (
    id          TEXT PRIMARY KEY NOT NULL,    -- UUID v4
    name        TEXT NOT NULL,
    description TEXT,
    max_votes   INTEGER NOT NULL,             -- per-spectator quota
    status      TEXT NOT NULL DEFAULT 'upcoming',  -- display-only
    created_at  TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Competitors and their category memberships
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS competitors (
    id           TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    user_id      TEXT NOT NULL,               -- FK -> users(id)
    display_name TEXT NOT NULL,
    created_at   TEXT NOT NULL,               -- registration time, leaderboard tie-break

    FOREIGN KEY (user_id) REFERENCES users(id)
);

CREATE TABLE IF NOT EXISTS category_members (
    category_id   TEXT NOT NULL,              -- FK -> categories(id)
    competitor_id TEXT NOT NULL,              -- FK -> competitors(id)
    joined_at     TEXT NOT NULL,

    PRIMARY KEY (category_id, competitor_id),
    FOREIGN KEY (category_id)   REFERENCES categories(id)  ON DELETE CASCADE,
    FOREIGN KEY (competitor_id) REFERENCES competitors(id) ON DELETE CASCADE
);

-- ----------------------------------------------------------------
-- Votes (append-only; tallies derived by COUNT)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS votes (
    id            TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    spectator_id  TEXT NOT NULL,              -- FK -> users(id)
    competitor_id TEXT NOT NULL,              -- FK -> competitors(id)
    category_id   TEXT NOT NULL,              -- FK -> categories(id)
    created_at    TEXT NOT NULL,

    FOREIGN KEY (spectator_id)  REFERENCES users(id),
    FOREIGN KEY (competitor_id) REFERENCES competitors(id),
    FOREIGN KEY (category_id)   REFERENCES categories(id)
);

CREATE INDEX IF NOT EXISTS idx_votes_spectator_category
    ON votes(spectator_id, category_id);

CREATE INDEX IF NOT EXISTS idx_votes_competitor_category
    ON votes(competitor_id, category_id);

-- ----------------------------------------------------------------
-- Posts with engagement counters
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS posts (
    id         TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    author_id  TEXT NOT NULL,                 -- FK -> users(id)
    content    TEXT NOT NULL,
    likes      INTEGER NOT NULL DEFAULT 0,    -- monotonically non-decreasing
    comments   INTEGER NOT NULL DEFAULT 0,
    shares     INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,

    FOREIGN KEY (author_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts(created_at DESC);

CREATE TABLE IF NOT EXISTS post_media (
    post_id  TEXT NOT NULL,                   -- FK -> posts(id)
    position INTEGER NOT NULL,                -- preserves attachment order
    url      TEXT NOT NULL,

    PRIMARY KEY (post_id, position),
    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS post_tags (
    post_id TEXT NOT NULL,                    -- FK -> posts(id)
    tag     TEXT NOT NULL,

    PRIMARY KEY (post_id, tag),
    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
);

-- ----------------------------------------------------------------
-- Engagement events (audit trail + like dedup)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS engagement_events (
    id           TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    spectator_id TEXT NOT NULL,               -- FK -> users(id)
    post_id      TEXT NOT NULL,               -- FK -> posts(id)
    kind         TEXT NOT NULL,               -- like|comment|share
    created_at   TEXT NOT NULL,

    FOREIGN KEY (spectator_id) REFERENCES users(id),
    FOREIGN KEY (post_id)      REFERENCES posts(id) ON DELETE CASCADE
);

-- One like per (spectator, post); comments and shares may repeat.
CREATE UNIQUE INDEX IF NOT EXISTS idx_engagement_one_like
    ON engagement_events(spectator_id, post_id) WHERE kind = 'like';
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
