pub mod email;
pub mod password;

pub use email::{EmailCipher, PLACEHOLDER_EMAIL};
pub use password::{hash_password, verify_password};
