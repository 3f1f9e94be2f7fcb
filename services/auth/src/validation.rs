//! Input validation utilities

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Minimum number of characters a password needs
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Characters that satisfy the special-character criterion
pub const SPECIAL_CHARACTERS: &str = r#"!@#$%^&*(),.?":{}|<>"#;

/// One password requirement, in the order they are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    Length,
    Uppercase,
    Lowercase,
    Number,
    Special,
}

impl Criterion {
    /// All criteria in reporting order
    pub const ALL: [Criterion; 5] = [
        Criterion::Length,
        Criterion::Uppercase,
        Criterion::Lowercase,
        Criterion::Number,
        Criterion::Special,
    ];

    /// Phrase used in the deficiency message
    pub fn requirement(self) -> &'static str {
        match self {
            Criterion::Length => "at least 8 characters",
            Criterion::Uppercase => "one uppercase letter",
            Criterion::Lowercase => "one lowercase letter",
            Criterion::Number => "one number",
            Criterion::Special => "one special character",
        }
    }
}

/// Per-criterion outcome of a password evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirements {
    pub length: bool,
    pub uppercase: bool,
    pub lowercase: bool,
    pub number: bool,
    pub special: bool,
}

impl Requirements {
    pub fn is_met(&self, criterion: Criterion) -> bool {
        match criterion {
            Criterion::Length => self.length,
            Criterion::Uppercase => self.uppercase,
            Criterion::Lowercase => self.lowercase,
            Criterion::Number => self.number,
            Criterion::Special => self.special,
        }
    }

    /// Number of satisfied criteria
    pub fn satisfied(&self) -> usize {
        Criterion::ALL.iter().filter(|c| self.is_met(**c)).count()
    }

    /// Unmet criteria in reporting order
    pub fn unmet(&self) -> Vec<Criterion> {
        Criterion::ALL
            .into_iter()
            .filter(|c| !self.is_met(*c))
            .collect()
    }
}

/// Strength label derived from the number of satisfied criteria
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Weak,
    Medium,
    Strong,
}

impl Strength {
    fn from_satisfied(count: usize) -> Self {
        match count {
            0..=2 => Strength::Weak,
            3..=4 => Strength::Medium,
            _ => Strength::Strong,
        }
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Strength::Weak => "weak",
            Strength::Medium => "medium",
            Strength::Strong => "strong",
        };
        f.write_str(label)
    }
}

/// Result of evaluating a candidate password
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordEvaluation {
    /// True when every criterion holds
    pub valid: bool,
    pub requirements: Requirements,
    pub strength: Strength,
    /// "Strong password", or the unmet requirements in reporting order
    pub message: String,
}

fn class_regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("Failed to compile password regex"))
}

/// Evaluate a password against the five strength criteria
///
/// Length counts characters, not bytes. Letter and digit classes are ASCII
/// only; the special class is [`SPECIAL_CHARACTERS`].
pub fn evaluate_password(password: &str) -> PasswordEvaluation {
    static UPPERCASE: OnceLock<Regex> = OnceLock::new();
    static LOWERCASE: OnceLock<Regex> = OnceLock::new();
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    static SPECIAL: OnceLock<Regex> = OnceLock::new();

    let requirements = Requirements {
        length: password.chars().count() >= MIN_PASSWORD_LENGTH,
        uppercase: class_regex(&UPPERCASE, "[A-Z]").is_match(password),
        lowercase: class_regex(&LOWERCASE, "[a-z]").is_match(password),
        number: class_regex(&NUMBER, "[0-9]").is_match(password),
        special: class_regex(&SPECIAL, r#"[!@#$%^&*(),.?":{}|<>]"#).is_match(password),
    };

    let unmet = requirements.unmet();
    let valid = unmet.is_empty();
    let message = if valid {
        "Strong password".to_string()
    } else {
        let missing: Vec<&str> = unmet.iter().map(|c| c.requirement()).collect();
        format!("Password must contain {}", missing.join(", "))
    };

    PasswordEvaluation {
        valid,
        requirements,
        strength: Strength::from_satisfied(requirements.satisfied()),
        message,
    }
}

/// How strict login is about the password it is given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PasswordPolicy {
    /// Every strength criterion must hold
    #[default]
    Strict,
    /// Only the minimum length is enforced
    MinimumLength,
}

impl PasswordPolicy {
    /// Evaluate `password` and report whether this policy accepts it
    pub fn check(self, password: &str) -> (bool, PasswordEvaluation) {
        let evaluation = evaluate_password(password);
        let accepted = match self {
            PasswordPolicy::Strict => evaluation.valid,
            PasswordPolicy::MinimumLength => evaluation.requirements.length,
        };
        (accepted, evaluation)
    }
}

/// Validate that a required form field is present
pub fn validate_required(field: &'static str, value: &str) -> Result<(), &'static str> {
    if value.trim().is_empty() {
        return Err(field);
    }
    Ok(())
}
