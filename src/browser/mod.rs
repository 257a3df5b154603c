//! Browser-driven collection of raw post units.

mod cookies;
mod driver;
mod page;
mod session;

pub use cookies::{load_cookies, parse_cookies, SameSite, SessionCookie};
pub use driver::ChromiumDriver;
pub use page::{
    feed_url, is_login_wall, login_url, search_terms, search_url, split_post_containers,
};
pub use session::{ProfileDirSession, SessionStore, DEFAULT_PROFILE_DIR};
