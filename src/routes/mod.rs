/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated modules,
/// enforcing a Defense-in-Depth strategy. This structure ensures that
/// access control is applied explicitly at the module level (via Axum layers),
/// preventing accidental exposure of protected endpoints.
///
/// The three modules map directly to the defined access tiers.

/// Routes accessible to all clients (anonymous, read-only), plus the auth
/// service proxies (login, password reset).
pub mod public;

/// The `/api` CRUD surface, protected by the `AdminSession` extractor middleware.
/// Requires a validated admin session.
pub mod api;

/// The `/admin` page-data subtree, protected by the redirecting route guard.
pub mod admin;
