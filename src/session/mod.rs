//! Session Handling
//!
//! The backend issues bearer tokens; this side only carries them. Browsers
//! hold the token in a cookie, the CLI in a file. Nothing here verifies a
//! token. A present, non-blank token is enough to pass the admin route
//! guard, and the backend rejects anything invalid.

pub mod cookie;
pub mod password;
pub mod token_store;

pub use cookie::{clear_cookie, set_cookie, token_from_cookie_header, SessionToken};
pub use password::{PasswordChange, PasswordError, MIN_PASSWORD_LEN};
pub use token_store::TokenStore;

/// Whether a request path is an admin route that needs a session
pub fn is_admin_path(path: &str) -> bool {
    path == "/admin" || path.starts_with("/admin/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_paths() {
        assert!(is_admin_path("/admin"));
        assert!(is_admin_path("/admin/"));
        assert!(is_admin_path("/admin/export-csv"));
        assert!(!is_admin_path("/administrator"));
        assert!(!is_admin_path("/dashboard"));
        assert!(!is_admin_path("/login"));
    }
}
