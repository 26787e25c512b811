//! Request DTOs for the admin API
//!
//! Defines the structure of incoming query strings.

use serde::Deserialize;

use crate::monitor::ErrorKind;

/// Query string for `GET /errors`
///
/// # Fields
/// - `kind`: Optional error kind filter (`api`, `ui`, `auth`, `performance`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorsQuery {
    #[serde(default)]
    pub kind: Option<ErrorKind>,
}
