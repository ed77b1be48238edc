//! PKCE verifier and challenge generation (RFC 7636, S256 method).

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// A code verifier and its derived S256 challenge.
#[derive(Debug, Clone)]
pub struct PkcePair {
    /// Random secret kept client-side and sent with the code exchange.
    pub verifier: String,
    /// URL-safe base64 of SHA-256(verifier), sent with the consent request.
    pub challenge: String,
}

/// Generates a fresh verifier from 32 random bytes and derives its challenge.
#[must_use]
pub fn generate() -> PkcePair {
    let mut seed = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut seed);
    let verifier = URL_SAFE_NO_PAD.encode(seed);
    let challenge = challenge_for(&verifier);
    PkcePair {
        verifier,
        challenge,
    }
}

/// Derives the S256 challenge for a verifier.
#[must_use]
pub fn challenge_for(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}
