/// Parse a user-entered number: decimal, `0x` hex or `0b` binary.
///
/// Returns `None` for anything else, including values that do not fit `T`.
pub fn parse_number<T: TryFrom<u64>>(text: &str) -> Option<T> {
    let text = text.trim();
    let (digits, radix) = if let Some(hex) = strip_prefix_ci(text, "0x") {
        (hex, 16)
    } else if let Some(bin) = strip_prefix_ci(text, "0b") {
        (bin, 2)
    } else {
        (text, 10)
    };
    if digits.is_empty() || digits.starts_with('+') {
        return None;
    }
    let value = u64::from_str_radix(digits, radix).ok()?;
    T::try_from(value).ok()
}

fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    match text.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => Some(&text[prefix.len()..]),
        _ => None,
    }
}
