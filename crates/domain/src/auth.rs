/// Role carried by an authenticated triage operator. Authentication itself
/// lives outside this service; tokens only need to resolve to a role here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Admin,
    Anonymous,
}

impl Role {
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Anonymous => "anonymous",
        }
    }
}
