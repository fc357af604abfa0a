//! Sign-in and registration forms
//!
//! Both forms validate locally first; nothing reaches the network until the
//! input is complete and, for registration, both passwords agree.

use thiserror::Error;

use crate::client::AuthService;
use crate::models::{LoginRequest, RegisterRequest, RegisterResponse, Session};

/// Local validation failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("Passwords do not match")]
    PasswordMismatch,
}

fn required(value: &str, label: &'static str) -> Result<String, FormError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(FormError::Missing(label))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Email + password sign-in form
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    error: Option<String>,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            error: None,
        }
    }

    /// Inline error from the last submission
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn validate(&self) -> Result<LoginRequest, FormError> {
        let email = required(&self.email, "Email")?;
        if self.password.is_empty() {
            return Err(FormError::Missing("Password"));
        }
        Ok(LoginRequest {
            email,
            password: self.password.clone(),
        })
    }

    /// Validate and sign in
    ///
    /// On success the session has already been stored by the service.
    pub async fn submit<A: AuthService + ?Sized>(&mut self, auth: &A) -> Option<Session> {
        self.error = None;

        let request = match self.validate() {
            Ok(request) => request,
            Err(e) => {
                self.error = Some(e.to_string());
                return None;
            }
        };

        match auth.login(&request).await {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!("Login failed: {}", e);
                self.error = Some(e.user_message("Login failed"));
                None
            }
        }
    }
}

/// Account creation form
#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub error: Option<String>,
}

impl RegisterForm {
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn validate(&self) -> Result<RegisterRequest, FormError> {
        let first_name = required(&self.first_name, "First name")?;
        let last_name = required(&self.last_name, "Last name")?;
        let email = required(&self.email, "Email")?;
        if self.password.is_empty() {
            return Err(FormError::Missing("Password"));
        }
        if self.password != self.confirm_password {
            return Err(FormError::PasswordMismatch);
        }

        Ok(RegisterRequest {
            first_name,
            last_name,
            email,
            password: self.password.clone(),
        })
    }

    /// Validate and create the account
    pub async fn submit<A: AuthService + ?Sized>(
        &mut self,
        auth: &A,
    ) -> Option<RegisterResponse> {
        self.error = None;

        let request = match self.validate() {
            Ok(request) => request,
            Err(e) => {
                self.error = Some(e.to_string());
                return None;
            }
        };

        match auth.register(&request).await {
            Ok(response) => Some(response),
            Err(e) => {
                tracing::warn!("Registration failed: {}", e);
                self.error = Some(e.user_message("Registration failed"));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientError, ClientResult};
    use crate::models::User;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeAuth {
        login_calls: AtomicUsize,
        register_calls: AtomicUsize,
        reject: bool,
    }

    #[async_trait]
    impl AuthService for FakeAuth {
        async fn login(&self, credentials: &LoginRequest) -> ClientResult<Session> {
            self.login_calls.fetch_add(1, Ordering::SeqCst);
            if self.reject {
                return Err(ClientError::Unauthorized {
                    message: "Invalid email or password".to_string(),
                });
            }
            Ok(Session {
                token: "t".to_string(),
                user: User {
                    id: 1,
                    first_name: "A".to_string(),
                    last_name: "B".to_string(),
                    email: credentials.email.clone(),
                },
            })
        }

        async fn register(&self, _request: &RegisterRequest) -> ClientResult<RegisterResponse> {
            self.register_calls.fetch_add(1, Ordering::SeqCst);
            if self.reject {
                return Err(ClientError::Timeout);
            }
            Ok(RegisterResponse {
                message: "User created successfully".to_string(),
                user_id: Some(1),
            })
        }
    }

    fn filled_register_form() -> RegisterForm {
        RegisterForm {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password: "engine".to_string(),
            confirm_password: "engine".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_password_mismatch_blocks_register() {
        let auth = FakeAuth::default();
        let mut form = filled_register_form();
        form.confirm_password = "engines".to_string();

        assert!(form.submit(&auth).await.is_none());
        assert_eq!(form.error(), Some("Passwords do not match"));
        assert_eq!(auth.register_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_register_success() {
        let auth = FakeAuth::default();
        let mut form = filled_register_form();

        let response = form.submit(&auth).await.unwrap();
        assert_eq!(response.user_id, Some(1));
        assert_eq!(form.error(), None);
        assert_eq!(auth.register_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_register_transport_failure_uses_fallback() {
        let auth = FakeAuth {
            reject: true,
            ..Default::default()
        };
        let mut form = filled_register_form();

        assert!(form.submit(&auth).await.is_none());
        assert_eq!(form.error(), Some("Registration failed"));
    }

    #[test]
    fn test_register_requires_fields() {
        let mut form = filled_register_form();
        form.last_name = "  ".to_string();
        assert_eq!(form.validate().unwrap_err(), FormError::Missing("Last name"));
    }

    #[tokio::test]
    async fn test_login_shows_server_message() {
        let auth = FakeAuth {
            reject: true,
            ..Default::default()
        };
        let mut form = LoginForm::new("ada@example.com", "wrong");

        assert!(form.submit(&auth).await.is_none());
        assert_eq!(form.error(), Some("Invalid email or password"));
    }

    #[tokio::test]
    async fn test_login_requires_email() {
        let auth = FakeAuth::default();
        let mut form = LoginForm::new("", "secret");

        assert!(form.submit(&auth).await.is_none());
        assert_eq!(form.error(), Some("Email is required"));
        assert_eq!(auth.login_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_login_success() {
        let auth = FakeAuth::default();
        let mut form = LoginForm::new(" ada@example.com ", "engine");

        let session = form.submit(&auth).await.unwrap();
        assert_eq!(session.user.email, "ada@example.com");
    }
}
