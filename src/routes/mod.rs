/// Router Module Index
///
/// Routing is segregated by access tier so the guards are applied once, at
/// the module boundary, instead of being repeated inside handlers:
///
/// - `public`: anonymous endpoints (health, login).
/// - `authenticated`: catalog browsing; requires a resolved `AuthUser`, whose
///   level feeds the visibility filter on every query.
/// - `admin`: all mutations, nested under `/admin` behind the single admin
///   guard middleware.
pub mod public;

pub mod authenticated;

pub mod admin;
