/// Separator placed between salt pieces: ASCII Unit Separator.
///
/// Part of the public contract. Normalization never lets this character
/// through, so distinct `(domain, label, version)` triples cannot serialize
/// to the same salt. Any external tool rebuilding salts must use it verbatim.
pub const SALT_DELIMITER: char = '\u{1F}';

pub fn build_salt<S: AsRef<str>>(pieces: &[S]) -> String {
    let mut salt = String::new();
    for (i, piece) in pieces.iter().enumerate() {
        if i > 0 {
            salt.push(SALT_DELIMITER);
        }
        salt.push_str(piece.as_ref());
    }
    salt
}
