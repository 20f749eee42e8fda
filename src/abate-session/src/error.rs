//! Error types for session actions and the identity service.

/// Transport-level failure talking to the identity service.
///
/// Never reaches the navigation layer: the gate folds it into state.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Client(String),
}

pub(crate) const LOGIN_FAILED: &str = "Erro ao realizar login";
pub(crate) const REGISTER_FAILED: &str = "Erro ao registrar";
pub(crate) const LOGOUT_FAILED: &str = "Falha ao sair";

/// Why a login, registration or logout did not go through.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Conta inativa")]
    InactiveAccount,

    /// Carries the transport detail for logs; users only see the summary.
    #[error("Erro de conexão")]
    Connection(String),

    #[error("{message}")]
    Unknown { status: Option<u16>, message: String },
}

impl AuthError {
    /// Map a rejected login status to the failure shown to the user.
    pub fn from_login_status(status: u16) -> Self {
        match status {
            401 => AuthError::InvalidCredentials,
            403 => AuthError::InactiveAccount,
            other => AuthError::Unknown {
                status: Some(other),
                message: LOGIN_FAILED.to_string(),
            },
        }
    }

    /// HTTP-like status carried by the failure, when there was a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            AuthError::InvalidCredentials => Some(401),
            AuthError::InactiveAccount => Some(403),
            AuthError::Connection(_) => None,
            AuthError::Unknown { status, .. } => *status,
        }
    }
}

impl From<IdentityError> for AuthError {
    fn from(err: IdentityError) -> Self {
        AuthError::Connection(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_status_mapping() {
        assert_eq!(AuthError::from_login_status(401), AuthError::InvalidCredentials);
        assert_eq!(AuthError::from_login_status(403), AuthError::InactiveAccount);
        let other = AuthError::from_login_status(500);
        assert_eq!(other.status(), Some(500));
        assert_eq!(other.to_string(), "Erro ao realizar login");
        assert_eq!(AuthError::InvalidCredentials.to_string(), "Credenciais inválidas");
        assert_eq!(AuthError::InactiveAccount.to_string(), "Conta inativa");
    }

    #[test]
    fn test_status_roundtrip() {
        assert_eq!(AuthError::InvalidCredentials.status(), Some(401));
        assert_eq!(AuthError::InactiveAccount.status(), Some(403));
        let refused = AuthError::Connection("refused".into());
        assert_eq!(refused.status(), None);
        assert_eq!(refused.to_string(), "Erro de conexão");
    }
}
