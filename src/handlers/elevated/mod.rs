// handlers/elevated/mod.rs - Elevated handlers (editor and admin)
//
// Content management for editors; user administration, ad management and
// article approval for admins. The router decides which gate each route sits
// behind:
//
//   RoleGate(editor): manage articles, categories, org positions, uploads
//   RoleGate(admin):  approve articles, /api/admin/*
//
// Admins pass every editor gate because the role order is total.

pub mod ads;
pub mod articles;
pub mod categories;
pub mod org;
pub mod uploads;
pub mod users;
