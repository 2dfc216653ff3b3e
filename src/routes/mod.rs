/// Router Module Index
///
/// Routes are split by the access they require; each module's router is
/// wrapped with the matching middleware in `create_router`.

/// Routes open to anyone: health check, cached statistics, search-query terms.
pub mod public;

/// Routes requiring a signed-in user.
pub mod authenticated;

/// Routes restricted to staff: dashboard pages and the reprocessing trigger.
pub mod admin;
