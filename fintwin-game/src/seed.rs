//! Reversible share codes carrying a career archetype and a replay seed.
//! Code format: `<ARCH>-<WORD><NN>`, e.g. `ST-PENNY42`, `BK-LEDGER07`.

use crate::careers::CareerArchetype;

const SEED_DOMAIN: &[u8; 6] = b"FINTW-";

fn fnv1a64(bytes: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;
    bytes.iter().fold(FNV_OFFSET, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME)
    })
}

fn sanitize_word(word: &str) -> String {
    word.chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

pub const WORD_LIST: [&str; 64] = [
    "PENNY", "POUND", "LEDGER", "BUDGET", "ISA", "PENSION", "RENT", "BILLS", "PAYDAY", "BONUS",
    "SALARY", "WAGES", "INVOICE", "RECEIPT", "TAX", "REBATE", "COUNCIL", "MORTGAGE", "DEPOSIT",
    "OVERDRFT", "LOAN", "CREDIT", "DEBIT", "INTEREST", "DIVIDEND", "SHARES", "BONDS", "INDEX",
    "FUND", "ASSET", "EQUITY", "CAPITAL", "MARGIN", "PROFIT", "CASH", "COINS", "WALLET", "PURSE",
    "SAVER", "THRIFT", "FRUGAL", "NESTEGG", "PIGGY", "VAULT", "TILL", "CHEQUE", "STERLING",
    "GUINEA", "FARTHING", "SHILLING", "CROWN", "SOVEREIGN", "TENNER", "FIVER", "QUID", "GRAND",
    "BURSARY", "GRANT", "STIPEND", "ALLOWANCE", "TUITION", "FEES", "TARIFF", "COMPOUND",
];

const WORD_BITS_MASK: u16 = 0x01FF;
const NN_SHIFT: u16 = 9;
const NN_MASK: u16 = 0x7F;

#[inline]
fn pack(word_index: u16, nn: u8) -> u16 {
    (word_index & WORD_BITS_MASK) | ((u16::from(nn) & NN_MASK) << NN_SHIFT)
}

#[inline]
fn unpack(packed: u16) -> (u16, u8) {
    let nn = u8::try_from((packed >> NN_SHIFT) & NN_MASK).unwrap_or(0);
    (packed & WORD_BITS_MASK, nn)
}

fn compose_seed(archetype: CareerArchetype, word_index: u16, nn: u8) -> u64 {
    let packed = pack(word_index, nn);
    let code = archetype.code().as_bytes();
    let [lo, hi] = packed.to_le_bytes();
    let mut buf = [0u8; 11];
    buf[..6].copy_from_slice(SEED_DOMAIN);
    buf[6] = code[0];
    buf[7] = code[1];
    buf[8] = lo;
    buf[9] = hi;
    buf[10] = 0xA5;
    let h = fnv1a64(&buf);
    (h & 0xFFFF_FFFF_FFFF_0000) | u64::from(packed)
}

/// Render the share code for `seed`.
///
/// Only the low 16 bits of the seed are shown, so a code replays exactly the
/// seeds produced by [`decode_to_seed`] or [`generate_code_from_entropy`].
#[must_use]
pub fn encode_friendly(archetype: CareerArchetype, seed: u64) -> String {
    let packed = u16::try_from(seed & 0xFFFF).unwrap_or(0);
    let (word_index, nn) = unpack(packed);
    let word = WORD_LIST[usize::from(word_index) % WORD_LIST.len()];
    format!("{}-{word}{:02}", archetype.code(), nn % 100)
}

/// Parse a share code into its archetype and replay seed.
#[must_use]
pub fn decode_to_seed(code: &str) -> Option<(CareerArchetype, u64)> {
    let (prefix, rest) = code.trim().split_once('-')?;
    let archetype = CareerArchetype::from_code(prefix)?;
    if rest.len() < 3 || !rest.is_char_boundary(rest.len() - 2) {
        return None;
    }
    let (word_part, nn_part) = rest.split_at(rest.len() - 2);
    if !nn_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let nn: u8 = nn_part.parse().ok()?;
    let word = sanitize_word(word_part);
    let index = WORD_LIST.iter().position(|w| sanitize_word(w) == word)?;
    let word_index = u16::try_from(index).ok()?;
    Some((archetype, compose_seed(archetype, word_index, nn)))
}

/// Share code for a session seeded with `seed`, if the code replays it.
///
/// Seeds that did not come from a share code generally have no code of their
/// own, since a code only carries 16 bits.
#[must_use]
pub fn share_code_for(archetype: CareerArchetype, seed: u64) -> Option<String> {
    let code = encode_friendly(archetype, seed);
    (decode_to_seed(&code) == Some((archetype, seed))).then_some(code)
}

/// Derive a fresh share code from arbitrary entropy (clock, counter, RNG).
#[must_use]
pub fn generate_code_from_entropy(archetype: CareerArchetype, entropy: u64) -> String {
    let word_index = u16::try_from(entropy % WORD_LIST.len() as u64).unwrap_or(0);
    let nn = u8::try_from((entropy >> 17) % 100).unwrap_or(0);
    encode_friendly(archetype, compose_seed(archetype, word_index, nn))
}
