//! Invitation code generation (C7). Consumption and TTL enforcement live in
//! [`super::repository::InvitationRepository`]; this module only produces
//! the opaque code itself.

use rand::Rng;

/// Excludes visually ambiguous characters (`0`/`O`, `1`/`I`/`l`) so a code
/// read aloud or retyped from a screenshot isn't misentered.
const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_LEN: usize = 8;

/// Generates an 8-character invitation code using a CSPRNG over the
/// unambiguous alphabet above.
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..ALPHABET.len());
            ALPHABET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_eight_characters() {
        assert_eq!(generate_code().len(), CODE_LEN);
    }

    #[test]
    fn excludes_ambiguous_characters() {
        for _ in 0..500 {
            let code = generate_code();
            assert!(!code.contains(['0', 'O', '1', 'I', 'l']));
        }
    }

    #[test]
    fn codes_are_not_trivially_repeated() {
        let a = generate_code();
        let b = generate_code();
        // Astronomically unlikely to collide; guards against a broken RNG seed.
        assert_ne!(a, b);
    }
}
