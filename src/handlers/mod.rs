// handlers/mod.rs - 3-Tier Handler Architecture
//
// Public (no auth) → Protected (any signed-in user) → Elevated (editor / admin)
//
// The tier a handler lives in says which RoleGate the router wraps it in; see
// `server::app`. Handlers themselves only do request validation, ownership checks
// and service calls.

pub mod public;    // Tier 1: No authentication required
pub mod protected; // Tier 2: Role >= user
pub mod elevated;  // Tier 3: Role >= editor, some routes admin only

pub mod extract;
pub mod validate;

pub use extract::{ApiJson, ApiQuery};
