//! Contact-form submissions. Transient: validated, turned into an email,
//! then discarded.

use serde::Deserialize;

use super::error::DomainError;

const MIN_MESSAGE_LEN: usize = 10;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub project_type: String,
    #[serde(default)]
    pub message: String,
}

impl ContactSubmission {
    pub fn validate(&self) -> Result<(), DomainError> {
        for (value, field) in [
            (&self.project_type, "projectType"),
            (&self.name, "name"),
            (&self.email, "email"),
            (&self.phone, "phone"),
            (&self.message, "message"),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::validation(format!("{field} is required")));
            }
        }

        if !is_plausible_email(self.email.trim()) {
            return Err(DomainError::validation(
                "please provide a valid email address",
            ));
        }

        if !is_plausible_phone(self.phone.trim()) {
            return Err(DomainError::validation(
                "phone may only contain digits, spaces, `+` and `-`",
            ));
        }

        if self.message.trim().chars().count() < MIN_MESSAGE_LEN {
            return Err(DomainError::validation(format!(
                "message must be at least {MIN_MESSAGE_LEN} characters"
            )));
        }

        Ok(())
    }
}

/// Structural check only: local part, one `@`, and a dotted domain. Real
/// deliverability is the SMTP transport's problem.
fn is_plausible_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && !tld.is_empty()
}

fn is_plausible_phone(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_ascii_digit() || c == '+' || c == ' ' || c == '-')
}
