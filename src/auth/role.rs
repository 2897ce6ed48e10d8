use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User role. Declaration order is the privilege order: `User < Editor < Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum Role {
    User,
    Editor,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::User, Role::Editor, Role::Admin];

    /// Whether a holder of `self` may act as `required`.
    ///
    /// admin ⊇ {admin, editor, user}, editor ⊇ {editor, user}, user ⊇ {user}.
    pub fn implies(self, required: Role) -> bool {
        self >= required
    }

    /// Every role this role may act as.
    pub fn subsumes(self) -> Vec<Role> {
        Self::ALL.into_iter().filter(|r| self.implies(*r)).collect()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Editor => "editor",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "editor" => Ok(Role::Editor),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hierarchy_table() {
        assert_eq!(Role::Admin.subsumes(), vec![Role::User, Role::Editor, Role::Admin]);
        assert_eq!(Role::Editor.subsumes(), vec![Role::User, Role::Editor]);
        assert_eq!(Role::User.subsumes(), vec![Role::User]);
    }

    #[test]
    fn editor_against_admin_and_user() {
        assert!(!Role::Editor.implies(Role::Admin));
        assert!(Role::Editor.implies(Role::User));
    }

    #[test]
    fn implies_is_monotonic_down_the_chain() {
        for held in Role::ALL {
            for required in Role::ALL {
                if held.implies(required) {
                    for lower in Role::ALL.into_iter().filter(|r| *r <= required) {
                        assert!(held.implies(lower), "{} permits {} but not {}", held, required, lower);
                    }
                }
            }
        }
    }

    #[test]
    fn parses_and_prints() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert!("root".parse::<Role>().is_err());
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&Role::Editor).unwrap(), "\"editor\"");
        let parsed: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(parsed, Role::Admin);
    }
}
