use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::{
    models::{Decision, DenialReason, Principal, Role},
    permissions::PermissionTable,
};

/// Fixed explanatory page for authenticated-but-wrong-role navigations.
pub const ACCESS_DENIED_PATH: &str = "/access-denied";

/// Characters left readable in access-denied query values: paths keep their
/// slashes and multi-role lists keep their commas.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b',');

/// decide
///
/// Evaluates `path` for `principal` against the global Permission Table.
pub fn decide(path: &str, principal: Option<&Principal>) -> Decision {
    decide_with(PermissionTable::global(), path, principal)
}

/// decide_with
///
/// The three-way split, in order:
/// 1. No matching entry: allowed (the table is a denylist).
/// 2. Entry requires auth and there is no principal: denied, redirect to the
///    entry's own fallback (or `/`) so the user can log in and resume.
/// 3. Principal's role is not allowed: denied, always routed to the
///    access-denied page carrying both roles. Never the entry's fallback.
/// 4. Otherwise allowed.
pub fn decide_with(table: &PermissionTable, path: &str, principal: Option<&Principal>) -> Decision {
    let Some(entry) = table.resolve(path) else {
        return Decision::Allowed;
    };

    match principal {
        None if entry.requires_auth => Decision::Denied {
            reason: DenialReason::AuthenticationRequired,
            redirect_to: entry.redirect_to.unwrap_or("/").to_string(),
        },
        Some(principal) if !entry.allows(principal.role) => Decision::Denied {
            reason: DenialReason::RoleMismatch {
                required: entry.allowed_roles.to_vec(),
                actual: principal.role,
            },
            redirect_to: access_denied_url(entry.allowed_roles, principal.role, path),
        },
        _ => Decision::Allowed,
    }
}

/// Builds `/access-denied?required_role=<r>&user_role=<r>&attempted_path=<p>`.
pub fn access_denied_url(required: &[Role], actual: Role, attempted_path: &str) -> String {
    let required = required
        .iter()
        .map(|role| role.as_str())
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "{ACCESS_DENIED_PATH}?required_role={}&user_role={}&attempted_path={}",
        utf8_percent_encode(&required, QUERY_VALUE),
        actual,
        utf8_percent_encode(attempted_path, QUERY_VALUE),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::ROUTE_PERMISSIONS;

    fn principal(role: Role) -> Principal {
        Principal::new("user-1", role)
    }

    /// Turns a declared pattern into one concrete path that matches it.
    fn concrete(pattern: &str) -> String {
        let segments: Vec<String> = pattern
            .split('/')
            .filter(|s| !s.is_empty() && !s.starts_with('('))
            .map(|s| {
                if s.starts_with('[') || s.starts_with('{') {
                    "x1".to_string()
                } else {
                    s.to_string()
                }
            })
            .collect();
        format!("/{}", segments.join("/"))
    }

    #[test]
    fn every_protected_path_denies_every_disallowed_role() {
        for entry in ROUTE_PERMISSIONS {
            let path = concrete(entry.path);
            for role in Role::ALL {
                if entry.allowed_roles.contains(&role) {
                    continue;
                }
                match decide(&path, Some(&principal(role))) {
                    Decision::Denied {
                        reason: DenialReason::RoleMismatch { actual, .. },
                        redirect_to,
                    } => {
                        assert_eq!(actual, role);
                        assert!(redirect_to.starts_with(ACCESS_DENIED_PATH), "{redirect_to}");
                    }
                    other => panic!("{path} as {role}: expected role mismatch, got {other:?}"),
                }
            }
        }
    }

    #[test]
    fn every_protected_path_allows_its_roles() {
        for entry in ROUTE_PERMISSIONS {
            let path = concrete(entry.path);
            for role in entry.allowed_roles {
                assert_eq!(decide(&path, Some(&principal(*role))), Decision::Allowed);
            }
        }
    }

    #[test]
    fn public_paths_are_allowed_anonymously() {
        for path in ["/", "/competitions", "/competitions/abc", "/about", "/access-denied"] {
            assert_eq!(decide(path, None), Decision::Allowed);
        }
    }

    #[test]
    fn anonymous_on_protected_path_uses_entry_redirect() {
        assert_eq!(
            decide("/competitions/create", None),
            Decision::Denied {
                reason: DenialReason::AuthenticationRequired,
                redirect_to: "/competitions".to_string(),
            }
        );
        assert_eq!(
            decide("/profile", None),
            Decision::Denied {
                reason: DenialReason::AuthenticationRequired,
                redirect_to: "/".to_string(),
            }
        );
    }

    #[test]
    fn employee_on_employer_page_gets_explanation() {
        let decision = decide("/competitions/create", Some(&principal(Role::Employee)));
        assert_eq!(
            decision,
            Decision::Denied {
                reason: DenialReason::RoleMismatch {
                    required: vec![Role::Employer],
                    actual: Role::Employee,
                },
                redirect_to: "/access-denied?required_role=employer&user_role=employee&attempted_path=/competitions/create".to_string(),
            }
        );
    }

    #[test]
    fn access_denied_url_encodes_unsafe_characters() {
        let url = access_denied_url(&[Role::Employer, Role::Admin], Role::Employee, "/a b&c");
        assert_eq!(
            url,
            "/access-denied?required_role=employer,admin&user_role=employee&attempted_path=/a%20b%26c"
        );
    }

    #[test]
    fn decide_is_pure() {
        let p = principal(Role::Employee);
        assert_eq!(decide("/profile", Some(&p)), decide("/profile", Some(&p)));
        assert_eq!(decide("/profile", None), decide("/profile", None));
    }
}
