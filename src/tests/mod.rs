//! Integration and unit tests for the StudyShelf application.
//!
//! - **api_tests**: endpoint tests driven through `tower::ServiceExt::oneshot`
//! - **config_tests**: configuration defaults and helpers
//! - **db_tests**: schema initialization and persistence round trips
//! - **error_tests**: error-to-response mapping

pub mod config_tests;
