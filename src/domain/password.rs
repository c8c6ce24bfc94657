//! Password acceptance rules applied when a password is set or reset.

const COMMON_PASSWORDS: &[&str] = &[
    "password", "password1", "password123", "12345678", "123456789", "1234567890",
    "qwerty123", "qwertyuiop", "iloveyou", "admin123", "welcome1", "letmein1",
    "abc12345", "football", "baseball", "sunshine", "princess", "11111111",
    "00000000", "passw0rd", "trustno1", "superman", "starwars", "whatever",
];

#[derive(Debug, Default)]
pub struct UserAttributes<'a> {
    pub email: &'a str,
    pub full_name: &'a str,
    pub student_id: &'a str,
}

/// Returns every rule the password breaks; empty means accepted.
#[must_use]
pub fn check_password(password: &str, min_len: usize, attrs: &UserAttributes<'_>) -> Vec<String> {
    let mut problems = Vec::new();

    if password.chars().count() < min_len {
        problems.push(format!(
            "This password is too short. It must contain at least {min_len} characters."
        ));
    }

    let lowered = password.to_lowercase();

    if COMMON_PASSWORDS.contains(&lowered.as_str()) {
        problems.push("This password is too common.".to_string());
    }

    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        problems.push("This password is entirely numeric.".to_string());
    }

    if let Some(attr) = similar_attribute(&lowered, attrs) {
        problems.push(format!("The password is too similar to the {attr}."));
    }

    problems
}

fn similar_attribute(lowered: &str, attrs: &UserAttributes<'_>) -> Option<&'static str> {
    let email_local = attrs.email.split('@').next().unwrap_or_default();
    let candidates = [
        ("email address", email_local.to_string()),
        ("student ID", attrs.student_id.to_string()),
    ];

    for (label, value) in candidates {
        let value = value.to_lowercase();
        if value.len() >= 3 && (lowered.contains(&value) || value.contains(lowered)) {
            return Some(label);
        }
    }

    let name_hit = attrs
        .full_name
        .split_whitespace()
        .map(str::to_lowercase)
        .any(|part| part.len() >= 4 && lowered.contains(&part));

    name_hit.then_some("full name")
}
