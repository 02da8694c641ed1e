pub mod auth;
pub mod dashboard;
pub mod favorite;
pub mod meal;
pub mod order;
pub mod payment;
pub mod review;
pub mod role_request;
pub mod user;

mod router;
pub use router::get_router;
