pub mod auth;
pub mod preferences;
pub mod server;
pub mod session;
pub mod todos;

#[cfg(test)]
pub(crate) mod testing;

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}
