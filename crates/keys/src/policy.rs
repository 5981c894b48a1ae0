//! Client-side password policy checks.
//!
//! Advisory only: the backend re-validates on `password.set`.

use krypta_protocol::PasswordSettings;

/// A single unmet password requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    TooShort { min: usize },
    MissingDigit,
    MissingLower,
    MissingUpper,
    MissingSpecial,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooShort { min } => write!(f, "at least {min} characters"),
            Self::MissingDigit => write!(f, "a digit"),
            Self::MissingLower => write!(f, "a lowercase letter"),
            Self::MissingUpper => write!(f, "an uppercase letter"),
            Self::MissingSpecial => write!(f, "a special character"),
        }
    }
}

impl Violation {
    fn satisfied_by(self, password: &str) -> bool {
        match self {
            Self::TooShort { min } => password.chars().count() >= min,
            Self::MissingDigit => password.chars().any(|c| c.is_ascii_digit()),
            Self::MissingLower => password.chars().any(char::is_lowercase),
            Self::MissingUpper => password.chars().any(char::is_uppercase),
            Self::MissingSpecial => password.chars().any(|c| !c.is_alphanumeric()),
        }
    }
}

/// Every requirement `settings` imposes, as the violation a password would
/// hit by missing it.
pub fn requirements(settings: &PasswordSettings) -> Vec<Violation> {
    let mut all = vec![Violation::TooShort {
        min: settings.length,
    }];
    for (required, violation) in [
        (settings.require_digits, Violation::MissingDigit),
        (settings.require_lower, Violation::MissingLower),
        (settings.require_upper, Violation::MissingUpper),
        (settings.require_special, Violation::MissingSpecial),
    ] {
        if required {
            all.push(violation);
        }
    }
    all
}

/// Return every requirement `password` fails. Empty means acceptable.
pub fn validate(settings: &PasswordSettings, password: &str) -> Vec<Violation> {
    requirements(settings)
        .into_iter()
        .filter(|v| !v.satisfied_by(password))
        .collect()
}

/// Comma-separated requirement list, e.g. for a prompt or an error.
pub fn join(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
