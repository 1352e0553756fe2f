/// Router Module Index
///
/// Routes grouped by who may call them. Page routes sit behind the edge filter;
/// API routes verify the token themselves through the `AuthUser` extractor.

/// Health check, the access-denied explanation, and the page-shell fallback.
pub mod public;

/// API routes for any verified principal.
pub mod authenticated;

/// API routes restricted to the admin role (checked inside the handlers).
pub mod admin;
