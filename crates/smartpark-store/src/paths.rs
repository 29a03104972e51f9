use smartpark_core::{
    Identity,
    constants::{
        OCCUPANCY_DOCUMENT, RESERVATIONS_FIELD, SLOTS_FIELD, USER_STATE_FIELD, USERS_FIELD,
    },
};

/// Semantic document paths, relative to the store base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    root: String,
}

impl StorePaths {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into().trim_matches('/').to_string(),
        }
    }

    /// Authorization root: user records and the reservation list.
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn reservations(&self) -> String {
        format!("{}/{}", self.root, RESERVATIONS_FIELD)
    }

    /// Record of one reservation holder.
    pub fn user_record(&self, identity: &Identity) -> String {
        format!("{}/{}", self.root, identity)
    }

    /// Per-user state document holding the arrival flag.
    pub fn user_state(&self, identity: &Identity) -> String {
        format!(
            "{}/{}/{}/{}",
            self.root, USERS_FIELD, identity, USER_STATE_FIELD
        )
    }

    pub fn occupancy(&self) -> &'static str {
        OCCUPANCY_DOCUMENT
    }

    pub fn slots(&self) -> String {
        format!("{}/{}", OCCUPANCY_DOCUMENT, SLOTS_FIELD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let paths = StorePaths::new("/Estacionamiento_inteligente/");
        let id = Identity::from("juan");
        assert_eq!(paths.root(), "Estacionamiento_inteligente");
        assert_eq!(paths.reservations(), "Estacionamiento_inteligente/Reservas");
        assert_eq!(paths.user_record(&id), "Estacionamiento_inteligente/juan");
        assert_eq!(
            paths.user_state(&id),
            "Estacionamiento_inteligente/usuarios/juan/estado"
        );
        assert_eq!(paths.occupancy(), "estado");
        assert_eq!(paths.slots(), "estado/lugares");
    }
}
