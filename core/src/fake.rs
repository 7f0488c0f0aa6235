//! Deterministic guardians for tests and local tooling.

use k256::ecdsa::SigningKey;

use crate::{
    vaa::{Body, Signature},
    GuardianAddress, GuardianSetInfo, Vaa,
};

const GUARDIAN_KEYS: [[u8; 32]; 7] = [
    [
        93, 217, 189, 224, 168, 81, 157, 93, 238, 38, 143, 8, 182, 94, 69, 77, 232, 199, 238, 206,
        15, 135, 221, 58, 43, 74, 0, 129, 54, 198, 62, 226,
    ],
    [
        150, 48, 135, 223, 194, 186, 243, 139, 177, 8, 126, 32, 210, 57, 42, 28, 29, 102, 196, 201,
        106, 136, 40, 149, 218, 150, 240, 213, 192, 128, 161, 245,
    ],
    [
        121, 51, 199, 93, 237, 227, 62, 220, 128, 129, 195, 4, 190, 163, 254, 12, 212, 224, 188,
        76, 141, 242, 229, 121, 192, 5, 161, 176, 136, 99, 83, 53,
    ],
    [
        224, 180, 4, 114, 215, 161, 184, 12, 218, 96, 20, 141, 154, 242, 46, 230, 167, 165, 54,
        141, 108, 64, 146, 27, 193, 89, 251, 139, 234, 132, 124, 30,
    ],
    [
        69, 1, 17, 179, 19, 47, 56, 47, 255, 219, 143, 89, 115, 54, 242, 209, 163, 131, 225, 30,
        59, 195, 217, 141, 167, 253, 6, 95, 252, 52, 7, 223,
    ],
    [
        181, 3, 165, 125, 15, 200, 155, 56, 157, 204, 105, 221, 203, 149, 215, 175, 220, 228, 200,
        37, 169, 39, 68, 127, 132, 196, 203, 232, 155, 55, 67, 253,
    ],
    [
        72, 81, 175, 107, 23, 108, 178, 66, 32, 53, 14, 117, 233, 33, 114, 102, 68, 89, 83, 201,
        129, 57, 56, 130, 214, 212, 172, 16, 23, 22, 234, 160,
    ],
];

pub fn default_guardian_keys() -> Vec<SigningKey> {
    GUARDIAN_KEYS
        .iter()
        .map(|k| SigningKey::from_slice(k).expect("fixed guardian key is a valid scalar"))
        .collect()
}

impl From<&SigningKey> for GuardianAddress {
    fn from(key: &SigningKey) -> Self {
        GuardianAddress::from_verifying_key(key.verifying_key())
    }
}

pub fn guardian_set_of(keys: &[SigningKey]) -> GuardianSetInfo {
    GuardianSetInfo::new(keys.iter().map(GuardianAddress::from).collect())
}

/// Signs `body` with every key; signature `i` carries guardian index `i`.
pub fn sign_body(keys: &[SigningKey], body: &Body) -> Vec<Signature> {
    let digest = body.digest();
    keys.iter()
        .enumerate()
        .map(|(idx, key)| {
            let (sig, recovery_id) = key
                .sign_prehash_recoverable(&digest.secp256k_hash)
                .expect("signing a 32 byte prehash");
            let bytes = sig.to_bytes();
            let mut r = [0u8; 32];
            let mut s = [0u8; 32];
            r.copy_from_slice(&bytes[..32]);
            s.copy_from_slice(&bytes[32..]);
            Signature {
                index: idx as u8,
                r,
                s,
                recovery_id: recovery_id.to_byte(),
            }
        })
        .collect()
}

/// A fully signed, serialized VAA.
pub fn sign_vaa(keys: &[SigningKey], guardian_set_index: u32, body: Body) -> Vec<u8> {
    let signatures = sign_body(keys, &body);
    Vaa::new(guardian_set_index, signatures, body).serialize()
}
