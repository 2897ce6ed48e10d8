// handlers/protected/mod.rs - Protected handlers (any signed-in user)
//
// Every route in this tier sits behind `require_role` with `Role::User`, so the
// caller's `AuthUser` is always present in request extensions.
//
// Security Level: session token required
// Middleware: rate limiter + RoleGate(user)

pub mod comments;
pub mod session;
pub mod votes;
