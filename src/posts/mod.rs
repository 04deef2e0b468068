mod impression;
mod list;
mod new;
mod single;
mod vote;

use axum::{
    routing::{get, put},
    Router,
};

use crate::AppState;

pub const MAX_CONTENT_LEN: usize = 500;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::list_posts).post(new::create_post))
        .route("/{id}", get(single::get_post))
        .route("/{id}/vote", put(vote::vote))
        .route("/{id}/impression", put(impression::impression))
}
