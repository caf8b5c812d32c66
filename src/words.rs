//! Arabic number words for spoken announcements.
//!
//! Composition follows the app's spoken register: groups are emitted from the largest
//! down (thousands, hundreds, tens, units) and joined with the conjunction "و".

use anyhow::{anyhow, Result};

/// Largest value the announcements are expected to speak.
pub const MAX_SPOKEN: u32 = 999_999;

const ZERO: &str = "صفر";
const THOUSAND: &str = "ألف";
const DECIMAL_POINT: &str = "فاصلة";
const CONJUNCTION: &str = " و";

const UNITS: [&str; 9] = [
    "واحد", "اثنان", "ثلاثة", "أربعة", "خمسة", "ستة", "سبعة", "ثمانية", "تسعة",
];

const TEENS: [&str; 10] = [
    "عشرة",
    "أحد عشر",
    "اثنا عشر",
    "ثلاثة عشر",
    "أربعة عشر",
    "خمسة عشر",
    "ستة عشر",
    "سبعة عشر",
    "ثمانية عشر",
    "تسعة عشر",
];

const TENS: [&str; 8] = [
    "عشرون", "ثلاثون", "أربعون", "خمسون", "ستون", "سبعون", "ثمانون", "تسعون",
];

// Indexed by hundreds digit - 1, so every hundreds digit has a word.
const HUNDREDS: [&str; 9] = [
    "مائة",
    "مائتان",
    "ثلاثمائة",
    "أربعمائة",
    "خمسمائة",
    "ستمائة",
    "سبعمائة",
    "ثمانمائة",
    "تسعمائة",
];

/// Render a non-negative integer as Arabic words.
///
/// Values above [`MAX_SPOKEN`] still compose: the thousands count is rendered by
/// the same function, so one million reads as "one thousand thousand".
pub fn to_arabic_words(n: u32) -> String {
    if n == 0 {
        return ZERO.to_string();
    }

    let mut parts: Vec<String> = Vec::with_capacity(4);
    let mut rest = n;

    if rest >= 1000 {
        parts.push(format!("{} {}", to_arabic_words(rest / 1000), THOUSAND));
        rest %= 1000;
    }

    let hundreds = rest / 100;
    if hundreds > 0 {
        parts.push(HUNDREDS[hundreds as usize - 1].to_string());
        rest %= 100;
    }

    if (10..20).contains(&rest) {
        parts.push(TEENS[rest as usize - 10].to_string());
    } else {
        let tens = rest / 10;
        if tens >= 2 {
            parts.push(TENS[tens as usize - 2].to_string());
        }
        let units = rest % 10;
        if units > 0 {
            parts.push(UNITS[units as usize - 1].to_string());
        }
    }

    parts.join(CONJUNCTION)
}

/// Word for a single decimal digit, zero included.
pub fn digit_word(digit: u8) -> Option<&'static str> {
    match digit {
        0 => Some(ZERO),
        1..=9 => Some(UNITS[digit as usize - 1]),
        _ => None,
    }
}

/// Render a measurement with up to two decimals, e.g. a distance in centimetres.
///
/// The value is rounded to hundredths. A non-zero fraction is spoken digit by digit
/// after "فاصلة".
pub fn decimal_to_arabic_words(value: f32) -> Result<String> {
    if !value.is_finite() || value < 0.0 {
        return Err(anyhow!("cannot speak value {}", value));
    }
    let hundredths = (value as f64 * 100.0).round();
    if hundredths > u32::MAX as f64 * 100.0 {
        return Err(anyhow!("value {} is too large to speak", value));
    }
    let hundredths = hundredths as u64;
    let whole = (hundredths / 100) as u32;
    let fraction = (hundredths % 100) as u8;

    let mut spoken = to_arabic_words(whole);
    if fraction > 0 {
        spoken.push(' ');
        spoken.push_str(DECIMAL_POINT);
        for digit in [fraction / 10, fraction % 10] {
            if let Some(word) = digit_word(digit) {
                spoken.push(' ');
                spoken.push_str(word);
            }
        }
    }
    Ok(spoken)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_a_literal() {
        assert_eq!(to_arabic_words(0), "صفر");
    }

    #[test]
    fn units_teens_and_tens() {
        assert_eq!(to_arabic_words(5), "خمسة");
        assert_eq!(to_arabic_words(10), "عشرة");
        assert_eq!(to_arabic_words(15), "خمسة عشر");
        assert_eq!(to_arabic_words(20), "عشرون");
        assert_eq!(to_arabic_words(25), "عشرون وخمسة");
    }

    #[test]
    fn hundreds_cover_every_digit() {
        assert_eq!(to_arabic_words(100), "مائة");
        assert_eq!(to_arabic_words(200), "مائتان");
        assert_eq!(to_arabic_words(350), "ثلاثمائة وخمسون");
        assert_eq!(to_arabic_words(911), "تسعمائة وأحد عشر");
        assert_eq!(to_arabic_words(105), "مائة وخمسة");
    }

    #[test]
    fn thousands_recurse() {
        assert_eq!(to_arabic_words(1000), "واحد ألف");
        assert_eq!(to_arabic_words(2500), "اثنان ألف وخمسمائة");
        assert_eq!(
            to_arabic_words(MAX_SPOKEN),
            "تسعمائة وتسعون وتسعة ألف وتسعمائة وتسعون وتسعة"
        );
    }

    #[test]
    fn rendering_is_deterministic() {
        for n in [0, 7, 19, 85, 640, 12_345] {
            assert_eq!(to_arabic_words(n), to_arabic_words(n));
        }
    }

    #[test]
    fn decimals_are_spoken_digit_by_digit() {
        assert_eq!(decimal_to_arabic_words(42.0).unwrap(), "أربعون واثنان");
        assert_eq!(decimal_to_arabic_words(12.5).unwrap(), "اثنا عشر فاصلة خمسة صفر");
        assert_eq!(decimal_to_arabic_words(0.07).unwrap(), "صفر فاصلة صفر سبعة");
    }

    #[test]
    fn decimals_reject_negative_and_non_finite() {
        assert!(decimal_to_arabic_words(-1.0).is_err());
        assert!(decimal_to_arabic_words(f32::NAN).is_err());
        assert!(decimal_to_arabic_words(f32::INFINITY).is_err());
    }
}
