use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: usize,
}

impl Claims {
    #[must_use]
    pub const fn new(user_id: Uuid, exp: usize) -> Self {
        Self { sub: user_id, exp }
    }
}

/// An encoded access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Jwt(pub String);

impl Jwt {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extracts the token from an `Authorization` header value.
    #[must_use]
    pub fn from_bearer(header_value: &str) -> Option<Self> {
        header_value.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty()).map(|t| Self(t.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bearer() {
        assert_eq!(Jwt::from_bearer("Bearer abc.def.ghi"), Some(Jwt("abc.def.ghi".into())));
        assert_eq!(Jwt::from_bearer("Basic abc"), None);
        assert_eq!(Jwt::from_bearer("Bearer "), None);
    }
}
