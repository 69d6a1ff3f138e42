use rand::seq::SliceRandom;
use rand::Rng;

const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";
const SPECIAL: &[u8] = b"!@#$%^&*()-_=+";

const MIN_PER_CLASS: usize = 4;
const MIN_LENGTH: usize = 16;
const MAX_LENGTH: usize = 20;

/// Random initial password: 16 to 20 characters, at least four from each
/// character class, shuffled so the classes are not positionally grouped.
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    let length = rng.gen_range(MIN_LENGTH..=MAX_LENGTH);

    let mut chars: Vec<u8> = Vec::with_capacity(length);
    for class in [UPPER, LOWER, DIGITS, SPECIAL] {
        for _ in 0..MIN_PER_CLASS {
            chars.push(class[rng.gen_range(0..class.len())]);
        }
    }

    let union: Vec<u8> = [UPPER, LOWER, DIGITS, SPECIAL].concat();
    while chars.len() < length {
        chars.push(union[rng.gen_range(0..union.len())]);
    }

    chars.shuffle(&mut rng);
    String::from_utf8(chars).unwrap_or_default()
}
