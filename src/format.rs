use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use zeroize::Zeroizing;

pub const MIN_LENGTH: usize = 12;
pub const MAX_LENGTH: usize = 128;
pub const DEFAULT_SYMBOLS: &str = "@#%+=?^";

const MAX_DIGIT_RUN: usize = 2;

const UPPER_SEED: usize = 0;
const DIGIT_SEED: usize = 2;
const SYMBOL_SEED: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatPolicy {
    pub length: usize,
    /// Characters accepted as "symbol". Empty disables the symbol rule.
    pub symbols: String,
}

impl Default for FormatPolicy {
    fn default() -> Self {
        Self {
            length: 20,
            symbols: DEFAULT_SYMBOLS.to_string(),
        }
    }
}

impl FormatPolicy {
    pub fn effective_length(&self) -> usize {
        self.length.clamp(MIN_LENGTH, MAX_LENGTH)
    }
}

struct Slots<'a> {
    key: &'a [u8],
    len: usize,
    claimed: BTreeSet<usize>,
}

impl Slots<'_> {
    fn byte(&self, i: usize) -> usize {
        usize::from(self.key[i % self.key.len()])
    }

    fn pick_free_index(&mut self, seed: usize) -> usize {
        for t in 0..self.len + self.key.len() {
            let idx = (self.byte(seed + t) + t) % self.len;
            if self.claimed.insert(idx) {
                return idx;
            }
        }
        seed % self.len
    }
}

fn letter(byte: u8, upper: bool) -> char {
    let base = if upper { b'A' } else { b'a' };
    char::from(base + byte % 26)
}

/// Maps key material onto a password of `policy.effective_length()` chars
/// holding at least one uppercase letter, one digit, one policy symbol (when
/// the policy has any) and no run of three digits. Fully deterministic.
pub fn format_password(key: &[u8], policy: &FormatPolicy) -> Zeroizing<String> {
    let key: &[u8] = if key.is_empty() { &[0] } else { key };
    let len = policy.effective_length();

    let encoded = Zeroizing::new(URL_SAFE_NO_PAD.encode(key));
    let mut out: Zeroizing<Vec<char>> =
        Zeroizing::new(encoded.chars().cycle().take(len).collect());

    let symbols: Vec<char> = policy.symbols.chars().collect();

    // The first character already satisfying a class is kept out of reach of
    // the forcing steps, so no rule can undo another.
    let mut claimed = BTreeSet::new();
    let witnesses = [
        out.iter().position(char::is_ascii_uppercase),
        out.iter().position(char::is_ascii_digit),
        out.iter().position(|c| symbols.contains(c)),
    ];
    claimed.extend(witnesses.into_iter().flatten());

    let mut slots = Slots { key, len, claimed };

    if !out.iter().any(char::is_ascii_uppercase) {
        let idx = slots.pick_free_index(UPPER_SEED);
        out[idx] = if out[idx].is_ascii_lowercase() {
            out[idx].to_ascii_uppercase()
        } else {
            letter(key[1 % key.len()], true)
        };
    }

    if !out.iter().any(char::is_ascii_digit) {
        let idx = slots.pick_free_index(DIGIT_SEED);
        out[idx] = char::from(b'0' + key[3 % key.len()] % 10);
    }

    if !symbols.is_empty() && !out.iter().any(|c| symbols.contains(c)) {
        let idx = slots.pick_free_index(SYMBOL_SEED);
        out[idx] = symbols[usize::from(key[5 % key.len()]) % symbols.len()];
    }

    // Runs are broken at their last character unless it is the first of its
    // class; symbol sets may contain digits.
    let protected: BTreeSet<usize> = [
        out.iter().position(char::is_ascii_uppercase),
        out.iter().position(char::is_ascii_digit),
        out.iter().position(|c| symbols.contains(c)),
    ]
    .into_iter()
    .flatten()
    .collect();

    let mut run = 0;
    for i in 0..len {
        if !out[i].is_ascii_digit() {
            run = 0;
            continue;
        }
        run += 1;
        if run > MAX_DIGIT_RUN {
            let j = (i + 1 - run..=i)
                .rev()
                .find(|j| !protected.contains(j))
                .unwrap_or(i);
            let upper = key[(j + 1) % key.len()] & 1 == 1;
            out[j] = letter(key[j % key.len()], upper);
            run = i - j;
        }
    }

    Zeroizing::new(out.iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::check_policy;

    fn policy(length: usize, symbols: &str) -> FormatPolicy {
        FormatPolicy {
            length,
            symbols: symbols.to_string(),
        }
    }

    fn has_long_digit_run(s: &str) -> bool {
        s.as_bytes()
            .windows(3)
            .any(|w| w.iter().all(u8::is_ascii_digit))
    }

    #[test]
    fn test_zero_key_scenario() {
        let key = [0u8; 32];
        let password = format_password(&key, &policy(12, "@#"));

        assert_eq!(password.chars().count(), 12);
        assert_eq!(*password, "A0@AAAAAAAAA");
        assert_eq!(password.chars().filter(char::is_ascii_digit).count(), 1);
        assert_eq!(password.chars().filter(|c| "@#".contains(*c)).count(), 1);
        assert!(password.chars().any(|c| c.is_ascii_uppercase()));
        assert!(!has_long_digit_run(&password));
    }

    #[test]
    fn test_deterministic() {
        let key = [42u8; 32];
        let a = format_password(&key, &FormatPolicy::default());
        let b = format_password(&key, &FormatPolicy::default());
        assert_eq!(*a, *b);
    }

    #[test]
    fn test_length_is_clamped() {
        let key = [7u8; 32];
        assert_eq!(format_password(&key, &policy(4, "@")).len(), 12);
        assert_eq!(format_password(&key, &policy(500, "@")).len(), 128);
        assert_eq!(format_password(&key, &policy(64, "@")).len(), 64);
    }

    #[test]
    fn test_lowercase_is_uppercased_in_place() {
        // Encodes to "aaaaaaaa".
        let key = [0x69, 0xa6, 0x9a, 0x69, 0xa6, 0x9a];
        assert_eq!(URL_SAFE_NO_PAD.encode(key), "aaaaaaaa");

        let password = format_password(&key, &policy(12, ""));
        assert_eq!(*password, "aaaaaaaaaA5a");
    }

    #[test]
    fn test_empty_symbol_set_skips_symbol_rule() {
        let key = [0u8; 32];
        let password = format_password(&key, &policy(12, ""));
        assert_eq!(*password, "A0AAAAAAAAAA");
        assert!(check_policy(&password, &policy(12, "")).ok);
    }

    #[test]
    fn test_digit_runs_are_broken() {
        // Encodes to "000000000000".
        let key = [0xd3, 0x4d, 0x34, 0xd3, 0x4d, 0x34, 0xd3, 0x4d, 0x34];
        let encoded = URL_SAFE_NO_PAD.encode(key);
        assert_eq!(encoded, "000000000000");

        let password = format_password(&key, &policy(32, "@#"));
        assert!(!has_long_digit_run(&password));
        assert!(check_policy(&password, &policy(32, "@#")).ok);
    }

    #[test]
    fn test_digit_symbol_survives_run_limit() {
        let key = [243, 70];
        let p = policy(17, "1");
        let password = format_password(&key, &p);
        assert_eq!(*password, "80Y8j18SY80Y80Y80");
        assert!(password.contains('1'));
        assert!(check_policy(&password, &p).ok);
    }

    #[test]
    fn test_digit_symbols_satisfy_policy() {
        for symbols in ["0", "1", "9", "12", "@7"] {
            for seed in 0u8..=255 {
                let key = [seed, seed.wrapping_mul(7), 70, seed ^ 0x5a];
                let p = policy(12 + usize::from(seed % 40), symbols);
                let password = format_password(&key, &p);
                assert!(
                    check_policy(&password, &p).ok,
                    "symbols {symbols:?} seed {seed}: {}",
                    *password
                );
            }
        }
    }

    #[test]
    fn test_regression_default_policy() {
        let key = [
            0x0b, 0x80, 0xab, 0xaa, 0xf0, 0xec, 0xf0, 0xca, 0xda, 0x00, 0x39, 0x0b, 0x89, 0x1c,
            0x68, 0x40, 0x24, 0xac, 0x06, 0x6a, 0xb7, 0x81, 0x8b, 0x45, 0x85, 0x4f, 0x50, 0x45,
            0xaa, 0x23, 0x7e, 0xfa,
        ];
        let password = format_password(&key, &FormatPolicy::default());
        assert_eq!(*password, "C4CrqvDs8MraADkLi?xo");
    }

    #[test]
    fn test_empty_key_is_total() {
        let password = format_password(&[], &FormatPolicy::default());
        assert_eq!(password.len(), 20);
        assert!(check_policy(&password, &FormatPolicy::default()).ok);
    }

    #[test]
    fn test_non_ascii_symbols() {
        let key = [3u8; 32];
        let password = format_password(&key, &policy(16, "§"));
        assert_eq!(password.chars().count(), 16);
        assert!(password.contains('§'));
    }

    #[test]
    fn test_policy_satisfied_for_many_keys() {
        for seed in 0u8..=255 {
            let key: Vec<u8> = (0..32u8)
                .map(|i| seed.wrapping_mul(31).wrapping_add(i))
                .collect();
            let p = FormatPolicy::default();
            let password = format_password(&key, &p);
            assert!(check_policy(&password, &p).ok, "key seed {seed}: {}", *password);
        }
    }
}
