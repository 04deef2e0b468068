use axum::{debug_handler, extract::{Query, State}, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::{
    db::PostView,
    ranking::{self, PageParams, Sort},
    AppResult,
};

#[derive(Deserialize)]
pub(crate) struct ListQuery {
    page: Option<i64>,
    limit: Option<i64>,
    sort: Option<String>,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn list_posts(
    State(db_pool): State<SqlitePool>,
    Query(ListQuery { page, limit, sort }): Query<ListQuery>,
) -> AppResult<Json<Value>> {
    let sort = Sort::parse(sort.as_deref());
    let params = PageParams::new(page, limit);

    let feed_page = ranking::fetch_page(&db_pool, sort, params).await?;

    let posts: Vec<PostView> = feed_page.posts.into_iter().map(PostView::from).collect();
    let total_pages = total_pages(feed_page.total, params.size);

    Ok(Json(json!({
        "posts": posts,
        "pagination": {
            "currentPage": params.page,
            "totalPosts": feed_page.total,
            "hasMore": feed_page.has_more,
            "totalPages": total_pages,
        },
        "sort": sort.as_str(),
    })))
}

// rounding up; page size is always >= 1 by construction
fn total_pages(total: i64, size: i64) -> i64 {
    (total + size - 1) / size
}
