//! Caller capability.
//!
//! All role-based branching in the payment subsystem goes through this one
//! tagged type and the single scoping predicate in `ops::access`, instead of
//! per-endpoint role checks.

use crate::{EngineError, users};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Actor {
    /// Administrative/back-office roles: unrestricted reads.
    Admin,
    /// Garden-scoped actor: sees only its own garden's payments.
    Garden { garden_id: String },
    /// Dister-scoped actor. Whether it is root or child (and therefore how
    /// wide its scope is) is resolved from the dister row at query time.
    Dister { dister_id: String },
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl TryFrom<&users::Model> for Actor {
    type Error = EngineError;

    fn try_from(user: &users::Model) -> Result<Self, Self::Error> {
        match user.role.as_str() {
            "admin" => Ok(Self::Admin),
            "garden" => {
                let garden_id = user.garden_id.clone().ok_or_else(|| {
                    EngineError::Forbidden("garden user without a garden".to_string())
                })?;
                Ok(Self::Garden { garden_id })
            }
            "dister" => {
                let dister_id = user.dister_id.clone().ok_or_else(|| {
                    EngineError::Forbidden("dister user without a dister".to_string())
                })?;
                Ok(Self::Dister { dister_id })
            }
            other => Err(EngineError::Forbidden(format!("unknown role: {other}"))),
        }
    }
}
