//! Post creation and feed listing (search filter + trending/latest sort).

use chrono::{DateTime, Utc};
use fitstage_shared::SortBy;
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{EngagementCounters, Post, PostFilter};

impl Database {
    /// Create a post with ordered media attachments and a tag set.
    pub fn create_post(
        &mut self,
        author_id: Uuid,
        content: &str,
        media: &[String],
        tags: &[String],
    ) -> Result<Post> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        let tx = self.conn_mut().transaction()?;

        let author_name: String = tx
            .query_row(
                "SELECT display_name FROM users WHERE id = ?1",
                params![author_id.to_string()],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound("author"),
                other => StoreError::Sqlite(other),
            })?;

        tx.execute(
            "INSERT INTO posts (id, author_id, content, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                id.to_string(),
                author_id.to_string(),
                content,
                now.to_rfc3339(),
            ],
        )?;

        for (position, url) in media.iter().enumerate() {
            tx.execute(
                "INSERT INTO post_media (post_id, position, url) VALUES (?1, ?2, ?3)",
                params![id.to_string(), position as i64, url],
            )?;
        }

        for tag in tags {
            tx.execute(
                "INSERT OR IGNORE INTO post_tags (post_id, tag) VALUES (?1, ?2)",
                params![id.to_string(), tag],
            )?;
        }

        tx.commit()?;

        Ok(Post {
            id,
            author_id,
            author_name,
            content: content.to_string(),
            media: media.to_vec(),
            tags: tags.to_vec(),
            stats: EngagementCounters::default(),
            created_at: now,
        })
    }

    /// Fetch a single post by id, including media and tags.
    pub fn get_post(&self, id: Uuid) -> Result<Post> {
        let mut post = self
            .conn()
            .query_row(
                "SELECT p.id, p.author_id, u.display_name, p.content,
                        p.likes, p.comments, p.shares, p.created_at
                 FROM posts p
                 JOIN users u ON u.id = p.author_id
                 WHERE p.id = ?1",
                params![id.to_string()],
                row_to_post,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound("post"),
                other => StoreError::Sqlite(other),
            })?;

        self.attach_media_and_tags(std::slice::from_mut(&mut post))?;
        Ok(post)
    }

    /// List posts matching the filter, ordered per [`SortBy`].
    ///
    /// The search text, when present, is a case-insensitive substring match
    /// against post content, author display name, or any tag; non-matching
    /// posts are excluded before sorting. Trending ties break newest-first
    /// then by id; latest ties break by id, so both orders are deterministic.
    pub fn list_posts(&self, filter: &PostFilter) -> Result<Vec<Post>> {
        let mut stmt = self.conn().prepare(
            "SELECT p.id, p.author_id, u.display_name, p.content,
                    p.likes, p.comments, p.shares, p.created_at
             FROM posts p
             JOIN users u ON u.id = p.author_id
             ORDER BY p.created_at DESC, p.id ASC",
        )?;

        let rows = stmt.query_map([], row_to_post)?;

        let mut posts = Vec::new();
        for row in rows {
            posts.push(row?);
        }
        self.attach_media_and_tags(&mut posts)?;

        if let Some(needle) = filter.search.as_deref() {
            let needle = needle.trim().to_lowercase();
            if !needle.is_empty() {
                posts.retain(|post| {
                    post.content.to_lowercase().contains(&needle)
                        || post.author_name.to_lowercase().contains(&needle)
                        || post.tags.iter().any(|tag| tag.to_lowercase().contains(&needle))
                });
            }
        }

        match filter.sort_by {
            SortBy::Trending => {
                posts.sort_by(|a, b| {
                    b.stats
                        .total()
                        .cmp(&a.stats.total())
                        .then_with(|| b.created_at.cmp(&a.created_at))
                        .then_with(|| a.id.cmp(&b.id))
                });
            }
            SortBy::Latest => {
                // Sorted on the parsed timestamps rather than the SQL text
                // column so sub-second precision differences cannot reorder.
                posts.sort_by(|a, b| {
                    b.created_at
                        .cmp(&a.created_at)
                        .then_with(|| a.id.cmp(&b.id))
                });
            }
        }

        if let Some(limit) = filter.limit {
            posts.truncate(limit);
        }
        Ok(posts)
    }

    /// Total number of posts (admin status).
    pub fn count_posts(&self) -> Result<u64> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Fill in `media` and `tags` for already-loaded posts.
    fn attach_media_and_tags(&self, posts: &mut [Post]) -> Result<()> {
        let mut media_stmt = self.conn().prepare(
            "SELECT url FROM post_media WHERE post_id = ?1 ORDER BY position ASC",
        )?;
        let mut tag_stmt = self
            .conn()
            .prepare("SELECT tag FROM post_tags WHERE post_id = ?1 ORDER BY tag ASC")?;

        for post in posts {
            let id = post.id.to_string();

            let media = media_stmt.query_map(params![id], |row| row.get::<_, String>(0))?;
            post.media = media.collect::<rusqlite::Result<Vec<_>>>()?;

            let tags = tag_stmt.query_map(params![id], |row| row.get::<_, String>(0))?;
            post.tags = tags.collect::<rusqlite::Result<Vec<_>>>()?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`Post`] (media and tags attached separately).
fn row_to_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
    let id_str: String = row.get(0)?;
    let author_id_str: String = row.get(1)?;
    let author_name: String = row.get(2)?;
    let content: String = row.get(3)?;
    let likes: i64 = row.get(4)?;
    let comments: i64 = row.get(5)?;
    let shares: i64 = row.get(6)?;
    let created_str: String = row.get(7)?;

    let id = Uuid::parse_str(&id_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))?;

    let author_id = Uuid::parse_str(&author_id_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e)))?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e)))?;

    Ok(Post {
        id,
        author_id,
        author_name,
        content,
        media: Vec::new(),
        tags: Vec::new(),
        stats: EngagementCounters {
            likes: likes as u64,
            comments: comments as u64,
            shares: shares as u64,
        },
        created_at,
    })
}
