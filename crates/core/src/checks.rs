//! # Pull Request Checks
//!
//! This module contains the pure checks that are run against pull request text.
//!
//! The checks are organized into submodules:
//! - `bug_reference`: Finds the bug a pull request title refers to
//! - `cherry_pick`: Recognizes pull requests created by the cherry-pick robot
//!
//! These checks are used by the event normalizer to decide what a webhook
//! delivery means for the referenced bug.

pub mod bug_reference;
pub mod cherry_pick;
