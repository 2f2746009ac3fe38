pub mod app;
pub mod application;
pub mod error;
pub mod handlers;
pub mod mailer;
pub mod state;

#[cfg(not(any(feature = "postgres", feature = "mysql", feature = "sqlite")))]
compile_error!("Enable exactly one of the `postgres`, `mysql`, or `sqlite` features for restkit-server.");

pub use app::{build_router, with_middleware};
pub use application::Application;
