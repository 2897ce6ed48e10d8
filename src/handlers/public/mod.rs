// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Anonymous readers: service info, session acquisition, approved articles,
// categories, the org chart and live ads.
//
// Security Level: None
// Middleware: rate limiter only

pub mod ads;
pub mod articles;
pub mod auth;
pub mod categories;
pub mod org;
pub mod root;
