use std::fmt;

/// API credential sent as `Authorization: token <value>`.
///
/// `Debug` never prints the secret so settings can be logged safely.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Header value in the form the Travis API expects.
    pub fn authorization(&self) -> String {
        format!("token {}", self.0)
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_header_value() {
        let token = Token::from("abc123");
        assert_eq!(token.authorization(), "token abc123");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let token = Token::from("super-secret");
        assert!(!format!("{token:?}").contains("super-secret"));
    }
}
