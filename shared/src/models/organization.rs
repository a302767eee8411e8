//! Organization (asociación) models

use serde::{Deserialize, Serialize};

use crate::types::de;

/// A member organization of the cooperative
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    #[serde(rename = "nombre", default, deserialize_with = "de::string_or_empty")]
    pub name: String,
    #[serde(rename = "contacto", default, deserialize_with = "de::optional_label")]
    pub contact: Option<String>,
}

/// Lookup an organization by id
pub fn find_organization(organizations: &[Organization], id: Option<i64>) -> Option<&Organization> {
    let id = id?;
    organizations.iter().find(|org| org.id == id)
}
