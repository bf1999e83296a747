#![forbid(unsafe_code)]

//! Video bookmarking catalog: a libsql-backed store of YouTube links with
//! tags, learning status and progress, served over a JSON API.

pub mod catalog;
pub mod config;
pub mod error;
pub mod filter;
pub mod model;
pub mod rules;
pub mod service;
pub mod validation;
pub mod youtube;
