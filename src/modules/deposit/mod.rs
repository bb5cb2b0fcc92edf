pub mod controller;
pub mod crud;
pub mod model;
pub mod routes;
pub mod schema;

pub use crud::{WatchError, WatchRecorder, WatchStore};
pub use model::{DepositWatch, WatchStatus};
pub use routes::deposit_routes;
