use crate::common::LineInput;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthField {
    #[default]
    Email,
    Password,
}

impl AuthField {
    pub fn toggle(self) -> Self {
        match self {
            AuthField::Email => AuthField::Password,
            AuthField::Password => AuthField::Email,
        }
    }
}

/// Sign-in/sign-up form.
#[derive(Debug, Default)]
pub struct AuthState {
    pub email: LineInput,
    pub password: LineInput,
    pub focus: AuthField,
    /// Informational message (e.g. confirmation email sent).
    pub notice: Option<String>,
}

impl AuthState {
    pub fn focused_mut(&mut self) -> &mut LineInput {
        match self.focus {
            AuthField::Email => &mut self.email,
            AuthField::Password => &mut self.password,
        }
    }

    /// Trimmed email and raw password, if both are filled in.
    pub fn credentials(&self) -> Option<(String, String)> {
        let email = self.email.text().trim();
        let password = self.password.text();
        (!email.is_empty() && !password.is_empty()).then(|| (email.to_string(), password.to_string()))
    }

    /// Forgets the password (after a completed attempt or sign-out).
    pub fn clear_secret(&mut self) {
        self.password.clear();
    }
}
