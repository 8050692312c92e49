pub mod services;

/// Public route prefix the upload directory is served under.
pub const UPLOADS_ROUTE: &str = "/uploads";
