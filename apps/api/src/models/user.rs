use serde::{Deserialize, Serialize};

/// An authenticated user as reported by the hosted identity layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
}

/// Result of asking the identity collaborator who is calling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurrentUser {
    Authenticated(User),
    Unauthenticated,
}

impl CurrentUser {
    pub fn from_email(email: Option<&str>) -> Self {
        match email.map(str::trim) {
            Some(email) if !email.is_empty() => CurrentUser::Authenticated(User {
                email: email.to_string(),
            }),
            _ => CurrentUser::Unauthenticated,
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            CurrentUser::Authenticated(user) => Some(user),
            CurrentUser::Unauthenticated => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_email_is_unauthenticated() {
        assert_eq!(CurrentUser::from_email(None), CurrentUser::Unauthenticated);
        assert_eq!(
            CurrentUser::from_email(Some("   ")),
            CurrentUser::Unauthenticated
        );
    }

    #[test]
    fn test_email_is_trimmed() {
        let user = CurrentUser::from_email(Some(" ada@example.com "));
        assert_eq!(user.user().unwrap().email, "ada@example.com");
    }
}
