// Marginalia: a Micropub endpoint for a personal site
//
// This is the library root. Each module corresponds to one stage of getting
// a post from a Micropub client onto the site and out to the pages it mentions.

pub mod config;
pub mod db;
pub mod micropub;
pub mod output;
pub mod pipeline;
pub mod views;
pub mod web;
pub mod webmention;

/// User agent for every outbound request (token checks, page fetches, webmentions).
pub const USER_AGENT: &str = concat!("marginalia/", env!("CARGO_PKG_VERSION"), " (+micropub)");
