//! Owner (propietario) extraction
//!
//! Owners are not a standalone upstream entity: they are synthesized by
//! scanning the owner arrays embedded in every lot and grouping by cédula.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::Lot;

/// A deduplicated owner across the whole lot collection
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Owner {
    pub national_id: String,
    pub full_name: String,
    /// Organization of the first lot the owner was seen in
    pub organization_id: Option<i64>,
    /// Other organizations the owner also delivered to, in first-seen order
    pub additional_organizations: Vec<i64>,
}

impl Owner {
    fn first_seen(national_id: &str, full_name: &str, organization_id: Option<i64>) -> Self {
        Self {
            national_id: national_id.to_string(),
            full_name: full_name.to_string(),
            organization_id,
            additional_organizations: Vec::new(),
        }
    }

    fn note_organization(&mut self, organization_id: Option<i64>) {
        let Some(org) = organization_id else { return };
        if self.organization_id == Some(org) || self.additional_organizations.contains(&org) {
            return;
        }
        if self.organization_id.is_none() {
            self.organization_id = Some(org);
        } else {
            self.additional_organizations.push(org);
        }
    }
}

/// Build the deduplicated owner list in first-seen order.
///
/// Owner records without a cédula cannot be keyed and are ignored.
pub fn extract_owners(lots: &[Lot]) -> Vec<Owner> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut owners: Vec<Owner> = Vec::new();

    for lot in lots {
        for entry in &lot.owners {
            let key = entry.national_id.trim();
            if key.is_empty() {
                continue;
            }
            match index.get(key) {
                Some(&pos) => owners[pos].note_organization(lot.organization_id),
                None => {
                    index.insert(key, owners.len());
                    owners.push(Owner::first_seen(key, &entry.full_name, lot.organization_id));
                }
            }
        }
    }

    owners
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lot(value: serde_json::Value) -> Lot {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_first_seen_order_and_primary_organization() {
        let lots = vec![
            lot(json!({ "id": 1, "organizacion": 1, "propietarios": [
                { "cedula": "002", "nombre_completo": "Rosa" },
                { "cedula": "001", "nombre_completo": "Juan" }
            ]})),
            lot(json!({ "id": 2, "organizacion": 2, "propietarios": [
                { "cedula": "001", "nombre_completo": "Juan" },
                { "cedula": "003", "nombre_completo": "Pedro" }
            ]})),
            lot(json!({ "id": 3, "organizacion": 2, "propietarios": [
                { "cedula": "001", "nombre_completo": "Juan" },
                { "cedula": "", "nombre_completo": "Sin cédula" }
            ]})),
        ];

        let owners = extract_owners(&lots);
        let ids: Vec<&str> = owners.iter().map(|o| o.national_id.as_str()).collect();

        assert_eq!(ids, vec!["002", "001", "003"]);
        assert_eq!(owners[1].organization_id, Some(1));
        assert_eq!(owners[1].additional_organizations, vec![2]);
    }
}
