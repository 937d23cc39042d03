use std::hash::Hasher;

use twox_hash::XxHash64;

/// Tamanho do espaço do anel: 2^31 - 1.
pub const SPACE_SIZE: u32 = 2_147_483_647;

/// Posição no anel para um identificador (chave ou `host:port-vnode`).
pub fn ring_position(id: &str) -> u32 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(id.as_bytes());
    (hasher.finish() % u64::from(SPACE_SIZE)) as u32
}
