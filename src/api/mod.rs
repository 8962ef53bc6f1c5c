// GraphQL transport for the deployment platform API.

pub mod auth;
pub mod client;
pub mod graphql;

pub use client::{ApiClient, GraphqlError};
