//! Per-packet authenticated encryption envelope.
//!
//! Unlike a session-handshake protocol (Noise, TLS), every packet here
//! carries its own key-exchange token (KXT): a point on the Ed25519
//! curve derived from a hash of the plaintext and the sender's public
//! key. The receiver recombines that token with its own private scalar
//! to recover the same shared secret the sender derived, then
//! re-derives the hash from the decrypted plaintext and checks it
//! against the claimed sender's public key — which is what makes a
//! spoofed `sender` field in the plaintext message header detectable
//! even though the AEAD tag itself only authenticates the ciphertext.

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use curve25519_dalek::constants::ED25519_BASEPOINT_TABLE;
use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use curve25519_dalek::scalar::Scalar;
use ed25519_dalek::hazmat::ExpandedSecretKey;
use ed25519_dalek::SigningKey;
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::address::Address;
use crate::error::CryptoError;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const KXT_LEN: usize = 32;

/// A node's Ed25519 identity, plus the raw scalar used for the
/// per-packet Diffie-Hellman-like key exchange.
pub struct Keypair {
    pub public: Address,
    signing: SigningKey,
    scalar: Scalar,
}

impl Drop for Keypair {
    fn drop(&mut self) {
        self.scalar.zeroize();
    }
}

impl Keypair {
    pub fn generate() -> Self {
        let signing = SigningKey::generate(&mut OsRng);
        Self::from_signing_key(signing)
    }

    pub fn from_private(bytes: [u8; 32]) -> Self {
        let signing = SigningKey::from_bytes(&bytes);
        Self::from_signing_key(signing)
    }

    fn from_signing_key(signing: SigningKey) -> Self {
        let expanded = ExpandedSecretKey::from(&signing.to_bytes());
        let scalar = expanded.scalar;
        let public = Address::from_bytes(signing.verifying_key().to_bytes());
        Self {
            public,
            signing,
            scalar,
        }
    }

    pub fn private_bytes(&self) -> [u8; 32] {
        self.signing.to_bytes()
    }

    fn public_point(&self) -> EdwardsPoint {
        &self.scalar * ED25519_BASEPOINT_TABLE
    }
}

fn decompress(addr: &Address) -> Result<EdwardsPoint, CryptoError> {
    CompressedEdwardsY(*addr.as_bytes())
        .decompress()
        .ok_or(CryptoError::BadKey)
}

/// Reduces a 32-byte hash to a scalar mod the group order via wide
/// reduction (matches the construction used when hashing arbitrary
/// plaintext into the exponent).
fn hash_to_scalar(plaintext: &[u8]) -> Scalar {
    let digest = Sha256::digest(plaintext);
    let mut wide = [0u8; 64];
    wide[..32].copy_from_slice(&digest);
    Scalar::from_bytes_mod_order_wide(&wide)
}

fn derive_key(shared: &EdwardsPoint) -> Key {
    let digest = Sha256::digest(shared.compress().as_bytes());
    *Key::from_slice(&digest)
}

/// An encrypted, authenticated packet ready for transport.
pub struct Packet {
    pub kxt: [u8; KXT_LEN],
    pub nonce: [u8; NONCE_LEN],
    pub ciphertext: Vec<u8>,
}

impl Packet {
    /// Total size of the on-wire representation: a 2-byte length
    /// prefix, the 32-byte KXT, and the nonce+ciphertext+tag body.
    pub fn wire_len(&self) -> usize {
        2 + KXT_LEN + NONCE_LEN + self.ciphertext.len()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let body_len = NONCE_LEN + self.ciphertext.len();
        let size = (KXT_LEN + body_len) as u16;
        let mut out = Vec::with_capacity(2 + size as usize);
        out.extend_from_slice(&size.to_be_bytes());
        out.extend_from_slice(&self.kxt);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self, CryptoError> {
        if buf.len() < 2 {
            return Err(CryptoError::TooShort);
        }
        let size = u16::from_be_bytes([buf[0], buf[1]]) as usize;
        if buf.len() != 2 + size || size < KXT_LEN + NONCE_LEN + TAG_LEN {
            return Err(CryptoError::TooShort);
        }
        let body = &buf[2..];
        let kxt: [u8; KXT_LEN] = body[..KXT_LEN].try_into().unwrap();
        let nonce: [u8; NONCE_LEN] = body[KXT_LEN..KXT_LEN + NONCE_LEN].try_into().unwrap();
        let ciphertext = body[KXT_LEN + NONCE_LEN..].to_vec();
        Ok(Self {
            kxt,
            nonce,
            ciphertext,
        })
    }
}

/// Encrypts `plaintext` (a serialized [`crate::message::Message`]) for
/// `receiver`, authenticated under `sender`'s identity.
pub fn encrypt(
    sender: &Keypair,
    receiver: &Address,
    plaintext: &[u8],
) -> Result<Packet, CryptoError> {
    let receiver_point = decompress(receiver)?;
    let h = hash_to_scalar(plaintext);

    let kxt_point = &h * &sender.public_point();
    let shared = (h * sender.scalar) * receiver_point;
    let key = derive_key(&shared);

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let cipher = ChaCha20Poly1305::new(&key);
    let ciphertext = cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad: &[],
            },
        )
        .map_err(|_| CryptoError::Integrity)?;

    Ok(Packet {
        kxt: kxt_point.compress().to_bytes(),
        nonce: nonce_bytes,
        ciphertext,
    })
}

/// Decrypts `packet` using `receiver`'s private scalar, then verifies
/// that the KXT matches the sender address embedded in the decrypted
/// plaintext (via `sender_of`). Returns the plaintext on success.
pub fn decrypt<F>(
    receiver: &Keypair,
    packet: &Packet,
    sender_of: F,
) -> Result<Vec<u8>, CryptoError>
where
    F: FnOnce(&[u8]) -> Option<Address>,
{
    let kxt_point = CompressedEdwardsY(packet.kxt)
        .decompress()
        .ok_or(CryptoError::BadKey)?;
    let shared = receiver.scalar * kxt_point;
    let key = derive_key(&shared);

    let cipher = ChaCha20Poly1305::new(&key);
    let nonce = Nonce::from_slice(&packet.nonce);
    let plaintext = cipher
        .decrypt(
            nonce,
            Payload {
                msg: &packet.ciphertext,
                aad: &[],
            },
        )
        .map_err(|_| CryptoError::Integrity)?;

    let claimed_sender = sender_of(&plaintext).ok_or(CryptoError::Integrity)?;
    let sender_point = decompress(&claimed_sender)?;
    let h = hash_to_scalar(&plaintext);
    let expected_kxt = (&h * &sender_point).compress().to_bytes();
    if expected_kxt != packet.kxt {
        return Err(CryptoError::Integrity);
    }

    Ok(plaintext)
}
