//! Zenobase API integration for the uploader.
//!
//! Provides a blocking client that:
//! - Opens an OAuth session (password or client-credentials grant)
//! - Maps bucket and event operations onto the REST resources
//! - Revokes the session on close or when dropped

mod bucket;
mod client;
mod error;

pub use bucket::{Bucket, BucketPage, BucketRef, EventList, MAX_LABEL_LEN, validate_label};
pub use client::{
    Client, ClientConfig, Credentials, DEFAULT_HOST, DEFAULT_TIMEOUT, MAX_PAGE_LIMIT, Method,
    Response,
};
pub use error::ApiError;
