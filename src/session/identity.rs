use serde::{Deserialize, Serialize};

/// The narrow view of a signed-in user that the rest of the crate relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub display_name: String,
    pub email: String,
}

impl Identity {
    pub fn new(display_name: &str, email: &str) -> Self {
        Identity {
            display_name: display_name.trim().to_string(),
            email: email.trim().to_string(),
        }
    }

    /// Name to greet the user with, falling back to the email's local part.
    pub fn greeting_name(&self) -> &str {
        if !self.display_name.is_empty() {
            return &self.display_name;
        }
        self.email.split('@').next().unwrap_or(&self.email)
    }
}

/// `local@domain` with both sides non-empty and no whitespace.
pub fn is_plausible_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}
