//! Punycode encoding of identifiers, following RFC 3492 with a delimiter and
//! digit alphabet which only contain symbol characters.
//!
//! ASCII characters which are not valid in symbols are shifted out of the
//! basic range, so they get encoded like any other non-basic code point.

use crate::mangler::is_symbol_char;

const BASE: u64 = 36;
const TMIN: u64 = 1;
const TMAX: u64 = 26;
const SKEW: u64 = 38;
const DAMP: u64 = 700;
const INITIAL_BIAS: u64 = 72;
const INITIAL_N: u64 = 128;

const DELIMITER: char = '_';

/// Offset added to ASCII characters which are not symbol characters.
const NON_SYMBOL_OFFSET: u64 = 0xD800;

fn digit(d: u64) -> char {
    let d = u8::try_from(d).unwrap_or(u8::MAX);

    match d {
        0..=25 => char::from(b'a' + d),
        26..=35 => char::from(b'A' + d - 26),
        _ => unreachable!("punycode digit out of range: {d}"),
    }
}

fn adapt(mut delta: u64, num_points: u64, first_time: bool) -> u64 {
    delta /= if first_time { DAMP } else { 2 };
    delta += delta / num_points;

    let mut k = 0;
    while delta > ((BASE - TMIN) * TMAX) / 2 {
        delta /= BASE - TMIN;
        k += BASE;
    }

    k + (((BASE - TMIN + 1) * delta) / (delta + SKEW))
}

fn code_point(c: char) -> u64 {
    if c.is_ascii() && !is_symbol_char(c) {
        u64::from(c) + NON_SYMBOL_OFFSET
    } else {
        u64::from(c)
    }
}

/// Encodes the given identifier.
pub(crate) fn encode(input: &str) -> String {
    let points = input.chars().map(code_point).collect::<Vec<_>>();

    let mut output = input
        .chars()
        .zip(&points)
        .filter(|(_, point)| **point < INITIAL_N)
        .map(|(c, _)| c)
        .collect::<String>();

    let basic = output.len() as u64;
    let mut handled = basic;

    if basic > 0 {
        output.push(DELIMITER);
    }

    let mut n = INITIAL_N;
    let mut delta: u64 = 0;
    let mut bias = INITIAL_BIAS;

    while handled < points.len() as u64 {
        let Some(m) = points.iter().copied().filter(|point| *point >= n).min() else {
            break;
        };

        delta += (m - n) * (handled + 1);
        n = m;

        for &point in &points {
            if point < n {
                delta += 1;
            }

            if point == n {
                let mut q = delta;
                let mut k = BASE;

                loop {
                    let t = if k <= bias {
                        TMIN
                    } else if k >= bias + TMAX {
                        TMAX
                    } else {
                        k - bias
                    };

                    if q < t {
                        break;
                    }

                    output.push(digit(t + (q - t) % (BASE - t)));
                    q = (q - t) / (BASE - t);
                    k += BASE;
                }

                output.push(digit(q));
                bias = adapt(delta, handled + 1, handled == basic);
                delta = 0;
                handled += 1;
            }
        }

        delta += 1;
        n += 1;
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_non_basic() {
        assert_eq!(encode("ü"), "tda");
    }

    #[test]
    fn mixed_basic_and_non_basic() {
        assert_eq!(encode("münchen"), "mnchen_Dya");
    }

    #[test]
    fn non_symbol_ascii_is_encoded() {
        assert_eq!(encode("a.b"), "ab_xhJk");
        assert_eq!(encode("hello world"), "helloworld_zxJAc");
    }

    #[test]
    fn output_is_symbol_alphabet() {
        for input in ["日本語", "a-b-c", "💡 idea", "x+y=z"] {
            assert!(encode(input).chars().all(is_symbol_char), "{input}");
        }
    }
}
