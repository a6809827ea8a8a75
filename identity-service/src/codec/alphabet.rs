//! Fixed-width base36 rendering of big-endian unsigned integers.
//!
//! Both the identifier and the secret codec sit on top of these two
//! functions; they only differ in byte length, output width and the
//! prefix rules applied around the symbols.

pub const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Symbol used for left padding. Always `ALPHABET[0]`.
pub const ZERO_SYMBOL: u8 = ALPHABET[0];

/// Value of a single symbol, or `None` if it is outside the alphabet.
pub fn symbol_value(c: char) -> Option<u8> {
    match c {
        '0'..='9' => Some(c as u8 - b'0'),
        'a'..='z' => Some(c as u8 - b'a' + 10),
        _ => None,
    }
}

/// Problems found while turning symbols back into bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeFault {
    /// `index` is relative to the start of the symbol string.
    IllegalSymbol { index: usize, character: char },
    /// The symbols describe a number that does not fit in the target width.
    Overflow,
}

/// Render `bytes` (big-endian) as exactly `width` base36 symbols.
///
/// # Panics
///
/// Panics if the value needs more than `width` symbols. Callers size
/// `width` from the byte length, so this is an internal invariant and a
/// truncated identifier must never be produced.
pub fn encode_fixed(bytes: &[u8], width: usize) -> String {
    let mut number = bytes.to_vec();
    let mut digits: Vec<u8> = Vec::with_capacity(width);

    while number.iter().any(|&b| b != 0) {
        let mut remainder: u32 = 0;
        for byte in number.iter_mut() {
            let acc = (remainder << 8) | u32::from(*byte);
            *byte = (acc / 36) as u8;
            remainder = acc % 36;
        }
        digits.push(ALPHABET[remainder as usize]);
    }

    assert!(
        digits.len() <= width,
        "base36 rendering of {} bytes needs {} symbols, width is {}",
        bytes.len(),
        digits.len(),
        width
    );

    digits.resize(width, ZERO_SYMBOL);
    digits.iter().rev().map(|&d| d as char).collect()
}

/// Parse base36 `symbols` into a big-endian array of `N` bytes.
///
/// Every symbol is checked before any arithmetic so the first illegal
/// character is always the one reported.
pub fn decode_fixed<const N: usize>(symbols: &str) -> Result<[u8; N], DecodeFault> {
    let mut values = Vec::with_capacity(symbols.len());
    for (index, character) in symbols.char_indices() {
        let value =
            symbol_value(character).ok_or(DecodeFault::IllegalSymbol { index, character })?;
        values.push(value);
    }

    let mut out = [0u8; N];
    for value in values {
        let mut carry = u32::from(value);
        for byte in out.iter_mut().rev() {
            let acc = u32::from(*byte) * 36 + carry;
            *byte = (acc & 0xff) as u8;
            carry = acc >> 8;
        }
        if carry != 0 {
            return Err(DecodeFault::Overflow);
        }
    }

    Ok(out)
}

/// Smallest number of symbols able to hold any `bits`-bit value.
pub fn width_for_bits(bits: u32) -> usize {
    (f64::from(bits) / 36f64.log2()).ceil() as usize
}
