//! Opaque public identifiers.
//!
//! Shares and files are addressed from the outside only by a random token
//! drawn from a 62-symbol alphabet. Holding the token is the whole access
//! credential, so tokens come straight from the operating system CSPRNG and
//! a failing source is an error, never a reason to fall back to something
//! weaker.

/// Symbols a token may contain: digits, then upper case, then lower case.
pub const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Length of the public hash handed out for a share.
pub const SHARE_HASH_LEN: usize = 12;
/// Length of the public hash handed out for an uploaded file.
pub const FILE_HASH_LEN: usize = 16;

// Largest multiple of 62 that fits in a byte. Bytes at or above it are
// rejected so that `b % 62` stays uniform.
const REJECTION_BOUND: u8 = 248;
const CHUNK: usize = 64;
// Extra fill rounds allowed on top of what the length strictly needs.
const SLACK_ROUNDS: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum IdError {
    #[error("random source failure: {0}")]
    RandomSource(#[from] getrandom::Error),
    #[error("random source yielded no usable bytes after {0} rounds")]
    Exhausted(usize),
}

/// Generate a token of exactly `length` symbols from [`ALPHABET`] using the
/// operating system's CSPRNG.
pub fn generate(length: usize) -> Result<String, IdError> {
    generate_with(length, getrandom::getrandom)
}

/// Generate a token pulling raw bytes from `fill`.
///
/// The loop is bounded: a source that keeps producing only rejected bytes
/// ends in [`IdError::Exhausted`] instead of spinning.
pub fn generate_with<F>(length: usize, mut fill: F) -> Result<String, IdError>
where
    F: FnMut(&mut [u8]) -> Result<(), getrandom::Error>,
{
    let mut token = String::with_capacity(length);
    let mut buf = [0u8; CHUNK];
    let max_rounds = length / CHUNK + SLACK_ROUNDS;
    let mut rounds = 0;

    while token.len() < length {
        if rounds == max_rounds {
            return Err(IdError::Exhausted(rounds));
        }
        rounds += 1;

        // over-draw a little so one round usually absorbs the rejections
        let want = (length - token.len() + 8).min(CHUNK);
        fill(&mut buf[..want])?;

        for &byte in &buf[..want] {
            if token.len() == length {
                break;
            }
            if byte < REJECTION_BOUND {
                token.push(ALPHABET[(byte % 62) as usize] as char);
            }
        }
    }

    Ok(token)
}

/// Fill `buf` with raw bytes from the operating system's CSPRNG.
pub fn fill_random(buf: &mut [u8]) -> Result<(), IdError> {
    getrandom::getrandom(buf)?;
    Ok(())
}

/// Whether `token` could have been produced by [`generate`] with `length`.
pub fn is_well_formed(token: &str, length: usize) -> bool {
    token.len() == length && token.bytes().all(|b| b.is_ascii_alphanumeric())
}
