//! Input masks for Brazilian documents, phones, postal codes, dates and currency

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskKind {
    Cpf,
    Cnpj,
    /// CPF up to 11 digits, CNPJ beyond
    CpfCnpj,
    Phone,
    Cep,
    Date,
    Currency,
}

impl MaskKind {
    /// Digits a complete value of this mask holds, when fixed
    pub fn full_length(&self) -> Option<usize> {
        match self {
            MaskKind::Cpf => Some(11),
            MaskKind::Cnpj => Some(14),
            MaskKind::Cep => Some(8),
            MaskKind::Date => Some(8),
            MaskKind::CpfCnpj | MaskKind::Phone | MaskKind::Currency => None,
        }
    }
}

pub fn digits_only(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Format `input` progressively under `mask`; surplus digits are dropped.
pub fn apply_mask(mask: MaskKind, input: &str) -> String {
    let digits = digits_only(input);
    match mask {
        MaskKind::Cpf => fill_pattern("###.###.###-##", &digits),
        MaskKind::Cnpj => fill_pattern("##.###.###/####-##", &digits),
        MaskKind::CpfCnpj => {
            if digits.len() <= 11 {
                fill_pattern("###.###.###-##", &digits)
            } else {
                fill_pattern("##.###.###/####-##", &digits)
            }
        }
        MaskKind::Phone => {
            if digits.len() <= 10 {
                fill_pattern("(##) ####-####", &digits)
            } else {
                fill_pattern("(##) #####-####", &digits)
            }
        }
        MaskKind::Cep => fill_pattern("#####-###", &digits),
        MaskKind::Date => fill_pattern("##/##/####", &digits),
        MaskKind::Currency => {
            if digits.is_empty() {
                return String::new();
            }
            let cents: u64 = digits
                .trim_start_matches('0')
                .chars()
                .take(15)
                .collect::<String>()
                .parse()
                .unwrap_or(0);
            format_currency(cents as f64 / 100.0)
        }
    }
}

/// Places digits into `#` slots; literal characters are emitted only while
/// digits remain, so partial input never ends in a dangling separator.
fn fill_pattern(pattern: &str, digits: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut remaining = digits.chars().peekable();
    for slot in pattern.chars() {
        if remaining.peek().is_none() {
            break;
        }
        if slot == '#' {
            if let Some(d) = remaining.next() {
                out.push(d);
            }
        } else {
            out.push(slot);
        }
    }
    out
}

/// `1234.5` -> `R$ 1.234,50`
pub fn format_currency(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::new();
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("{}R$ {},{:02}", if negative { "-" } else { "" }, grouped, frac)
}

/// `R$ 1.234,56` -> `1234.56`. Accepts plain `1234.56` too.
pub fn parse_currency(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    let negative = trimmed.starts_with('-');
    let cleaned: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };
    let value: f64 = normalized.parse().ok()?;
    Some(if negative { -value } else { value })
}

pub fn is_valid_cpf(input: &str) -> bool {
    let digits: Vec<u32> = digits_only(input)
        .chars()
        .filter_map(|c| c.to_digit(10))
        .collect();
    if digits.len() != 11 || digits.iter().all(|d| *d == digits[0]) {
        return false;
    }
    let check = |len: usize| -> u32 {
        let sum: u32 = digits[..len]
            .iter()
            .enumerate()
            .map(|(i, d)| d * (len as u32 + 1 - i as u32))
            .sum();
        let rest = (sum * 10) % 11;
        if rest == 10 {
            0
        } else {
            rest
        }
    };
    check(9) == digits[9] && check(10) == digits[10]
}

pub fn is_valid_cnpj(input: &str) -> bool {
    let digits: Vec<u32> = digits_only(input)
        .chars()
        .filter_map(|c| c.to_digit(10))
        .collect();
    if digits.len() != 14 || digits.iter().all(|d| *d == digits[0]) {
        return false;
    }
    const W1: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
    const W2: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
    let check = |weights: &[u32]| -> u32 {
        let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
        let rest = sum % 11;
        if rest < 2 {
            0
        } else {
            11 - rest
        }
    };
    check(&W1) == digits[12] && check(&W2) == digits[13]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progressive_cep_mask() {
        assert_eq!(apply_mask(MaskKind::Cep, "0100"), "0100");
        assert_eq!(apply_mask(MaskKind::Cep, "01001"), "01001");
        assert_eq!(apply_mask(MaskKind::Cep, "010010"), "01001-0");
        assert_eq!(apply_mask(MaskKind::Cep, "01001000"), "01001-000");
        assert_eq!(apply_mask(MaskKind::Cep, "01001-0009"), "01001-000");
    }

    #[test]
    fn test_document_masks() {
        assert_eq!(apply_mask(MaskKind::Cpf, "52998224725"), "529.982.247-25");
        assert_eq!(
            apply_mask(MaskKind::Cnpj, "11222333000181"),
            "11.222.333/0001-81"
        );
        assert_eq!(apply_mask(MaskKind::CpfCnpj, "529982247"), "529.982.247");
        assert_eq!(
            apply_mask(MaskKind::CpfCnpj, "11222333000181"),
            "11.222.333/0001-81"
        );
    }

    #[test]
    fn test_phone_mask_switches_on_length() {
        assert_eq!(apply_mask(MaskKind::Phone, "1133334444"), "(11) 3333-4444");
        assert_eq!(apply_mask(MaskKind::Phone, "11999998888"), "(11) 99999-8888");
    }

    #[test]
    fn test_currency_round_trip() {
        assert_eq!(format_currency(1234.5), "R$ 1.234,50");
        assert_eq!(format_currency(0.0), "R$ 0,00");
        assert_eq!(format_currency(1_000_000.0), "R$ 1.000.000,00");
        assert_eq!(parse_currency("R$ 1.234,50"), Some(1234.5));
        assert_eq!(parse_currency("1234.5"), Some(1234.5));
        assert_eq!(parse_currency(""), None);
        assert_eq!(apply_mask(MaskKind::Currency, "123456"), "R$ 1.234,56");
    }

    #[test]
    fn test_check_digits() {
        assert!(is_valid_cpf("529.982.247-25"));
        assert!(!is_valid_cpf("529.982.247-26"));
        assert!(!is_valid_cpf("111.111.111-11"));
        assert!(is_valid_cnpj("11.222.333/0001-81"));
        assert!(!is_valid_cnpj("11.222.333/0001-82"));
    }
}
