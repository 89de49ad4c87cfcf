//! Throwaway identifiers sent with each quote request.
//!
//! The tokens only need to be unlikely to collide within one run. They carry
//! no identity, are never stored, and are not meant to be secret, so a
//! non-cryptographic source is fine.
use rand::Rng;

/// Characters a token is drawn from (base 36, lowercase).
const TOKEN_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of a generated token.
pub const TOKEN_LEN: usize = 6;

/// Domain appended to the synthetic user id.
const USER_DOMAIN: &str = "test.com";

/// Generates a short random lowercase alphanumeric token.
pub fn random_token<R: Rng + ?Sized>(rng: &mut R) -> String
{
    (0..TOKEN_LEN)
        .map(|_| {
            let index = rng.random_range(0..TOKEN_ALPHABET.len());
            char::from(TOKEN_ALPHABET[index])
        })
        .collect()
}

/// Builds a synthetic user id such as `k3x9ab@test.com`.
pub fn user_id<R: Rng + ?Sized>(rng: &mut R) -> String
{
    format!("{}@{USER_DOMAIN}", random_token(rng))
}

/// Builds a session id scoped to the agent, such as `<agent_id>-k3x9ab`.
pub fn session_id<R: Rng + ?Sized>(rng: &mut R, agent_id: &str) -> String
{
    format!("{agent_id}-{}", random_token(rng))
}
