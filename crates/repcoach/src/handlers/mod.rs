//! HTTP request handlers and middleware.

mod chat;
mod current_user;
mod errors;
mod health;
mod page_guard;
mod pages;
mod session_gate;
mod version;
mod workouts;

pub use chat::chat;
pub use current_user::CurrentUser;
pub use errors::ApiError;
pub use health::{livez, readyz};
pub use page_guard::require_page_session;
pub use pages::{login_page, programs_page, routines_page};
pub use session_gate::session_gate;
pub use version::version;
pub use workouts::{list_routines, list_workout_programs};
