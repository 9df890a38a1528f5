/// Policy resolution commands
pub mod policy;
/// Listing of the pull request comment commands
pub mod usage;
/// Bug validation commands
pub mod validate;
