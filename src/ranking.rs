//! Feed ordering. The trending score is never stored: it is recomputed
//! from counters and the current clock on every read, so a post keeps
//! decaying with age even when nothing else touches it.

use sqlx::SqlitePool;

use crate::db::{self, PostRecord};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sort {
    Recent,
    Top,
    Viewed,
    Trending,
}

impl Sort {
    /// Unknown or missing sort names fall back to recency.
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("top") => Sort::Top,
            Some("viewed") => Sort::Viewed,
            Some("trending") => Sort::Trending,
            _ => Sort::Recent,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Sort::Recent => "recent",
            Sort::Top => "top",
            Sort::Viewed => "viewed",
            Sort::Trending => "trending",
        }
    }
}

/// 1-indexed page with a clamped size, to bound the cost of a single read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: i64,
    pub size: i64,
}

impl PageParams {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        PageParams {
            page: page.unwrap_or(1).max(1),
            size: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(self) -> i64 {
        (self.page - 1) * self.size
    }
}

#[derive(Debug)]
pub struct FeedPage {
    pub posts: Vec<PostRecord>,
    pub total: i64,
    pub has_more: bool,
}

const COLS: &str = "p.id, p.content, p.upvotes, p.downvotes, p.impressions, \
     p.fake_region, p.created_at, \
     COALESCE(u.anonymous_name, 'Anonymous') AS author";

const FROM_POSTS: &str = "FROM posts p LEFT JOIN users u ON u.id = p.user_id";

/// One ordered page of the feed. A page read is not a snapshot: posts
/// mutated concurrently may appear in mixed states across the page.
pub async fn fetch_page(
    pool: &SqlitePool,
    sort: Sort,
    params: PageParams,
) -> Result<FeedPage, sqlx::Error> {
    let posts: Vec<PostRecord> = match sort {
        Sort::Recent => {
            // rowid is the insertion-order tiebreak for equal timestamps
            let sql = format!(
                "SELECT {COLS} {FROM_POSTS} ORDER BY p.created_at DESC, p.rowid DESC LIMIT ? OFFSET ?"
            );
            sqlx::query_as(&sql)
                .bind(params.size)
                .bind(params.offset())
                .fetch_all(pool)
                .await?
        }
        Sort::Top => {
            let sql = format!(
                "SELECT {COLS} {FROM_POSTS} ORDER BY p.upvotes DESC, p.created_at DESC LIMIT ? OFFSET ?"
            );
            sqlx::query_as(&sql)
                .bind(params.size)
                .bind(params.offset())
                .fetch_all(pool)
                .await?
        }
        Sort::Viewed => {
            let sql = format!(
                "SELECT {COLS} {FROM_POSTS} ORDER BY p.impressions DESC, p.created_at DESC LIMIT ? OFFSET ?"
            );
            sqlx::query_as(&sql)
                .bind(params.size)
                .bind(params.offset())
                .fetch_all(pool)
                .await?
        }
        Sort::Trending => {
            // score = net votes / (age in hours + 1), age from the bound clock
            let sql = format!(
                "SELECT {COLS}, \
                 CAST(p.upvotes - p.downvotes AS REAL) \
                   / ((? - p.created_at) / 3600000.0 + 1.0) AS trending_score \
                 {FROM_POSTS} \
                 ORDER BY trending_score DESC, p.created_at DESC LIMIT ? OFFSET ?"
            );
            sqlx::query_as(&sql)
                .bind(db::now_millis())
                .bind(params.size)
                .bind(params.offset())
                .fetch_all(pool)
                .await?
        }
    };

    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts")
        .fetch_one(pool)
        .await?;

    let has_more = params.offset() + (posts.len() as i64) < total;

    Ok(FeedPage {
        posts,
        total,
        has_more,
    })
}
