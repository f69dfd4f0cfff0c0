// handlers/public - token acquisition and account creation, no authentication required

pub mod login; // POST /login - authenticate and get JWT
pub mod register; // POST /register - create new account
pub mod utils;

pub use login::login_post;
pub use register::register_post;
