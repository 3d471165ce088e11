pub mod api_router;
pub mod auth;
pub mod config;
pub mod courses;
pub mod enrollments;
pub mod llm;
pub mod quiz;
pub mod shared;
