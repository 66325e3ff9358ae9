// src/filter.rs
use crate::models::Token;

pub const ACTIVE_STATUS: &str = "active";

pub fn is_active(token: &Token) -> bool {
    token.status.as_deref() == Some(ACTIVE_STATUS)
}

/// Keep only tokens whose status is exactly `"active"`.
pub fn filter_active(tokens: Vec<Token>) -> Vec<Token> {
    tokens.into_iter().filter(is_active).collect()
}
