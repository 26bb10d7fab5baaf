use crate::format::FormatPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PolicyReport {
    pub ok: bool,
    pub length_ok: bool,
    pub has_digit: bool,
    pub has_upper: bool,
    pub has_symbol: bool,
    pub no_long_digit_run: bool,
}

fn longest_digit_run(password: &str) -> usize {
    let mut longest = 0;
    let mut run = 0;
    for c in password.chars() {
        if c.is_ascii_digit() {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    longest
}

/// Inspects a finished password against a policy. Independent of how the
/// password was produced; an empty password fails every check.
pub fn check_policy(password: &str, policy: &FormatPolicy) -> PolicyReport {
    if password.is_empty() {
        return PolicyReport::default();
    }

    let length_ok = password.chars().count() >= policy.effective_length();
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_symbol =
        policy.symbols.is_empty() || password.chars().any(|c| policy.symbols.contains(c));
    let no_long_digit_run = longest_digit_run(password) < 3;

    PolicyReport {
        ok: length_ok && has_digit && has_upper && has_symbol && no_long_digit_run,
        length_ok,
        has_digit,
        has_upper,
        has_symbol,
        no_long_digit_run,
    }
}
