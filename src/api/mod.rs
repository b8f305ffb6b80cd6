pub mod handlers;
pub mod routes;

pub use routes::{create_router, data_path, AppState, SOURCE_NAME};
