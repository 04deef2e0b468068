//! Credential plumbing around the identity pool: register, login,
//! logout, session verify, account deletion.

mod login;
mod logout;
mod register;
mod remove;
mod verify;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register::register))
        .route("/login", post(login::login))
        .route("/logout", post(logout::logout))
        .route("/verify", get(verify::verify))
        .route("/user/{id}", delete(remove::delete_account))
}

fn valid_username(username: &str) -> bool {
    (3..=20).contains(&username.chars().count())
        && username.chars().all(|c| c.is_ascii_alphanumeric())
}

fn valid_password(password: &str) -> bool {
    (6..=100).contains(&password.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        assert!(valid_username("abc"));
        assert!(valid_username("User1234"));
        assert!(!valid_username("ab"));
        assert!(!valid_username("has space"));
        assert!(!valid_username("way_too_long_for_a_username"));
    }

    #[test]
    fn password_rules() {
        assert!(valid_password("hunter2!"));
        assert!(!valid_password("short"));
    }
}
