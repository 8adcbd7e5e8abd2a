//! Administrative locations: communes and the villages inside them.

use serde::{Deserialize, Serialize};

/// A commune, the top-level administrative location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commune {
    pub id: String,
    pub name: String,
}

/// A village belonging to a commune.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Village {
    pub id: String,
    pub name: String,
    pub commune_id: String,
}
