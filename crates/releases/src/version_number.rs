use crate::error::ReleaseError;

const MAX_COMPONENTS: usize = 4;
const BASE: i64 = 10_000;

/// Encodes a dotted native app version into a number whose ordering matches
/// component-wise version ordering.
///
/// Up to four components are accepted, each in `0..=9999`. Missing trailing
/// components count as zero, so `"1.2"` and `"1.2.0"` encode to the same
/// number.
pub fn encode(version: &str) -> Result<i64, ReleaseError> {
    let invalid = || ReleaseError::InvalidFormat(format!("invalid app version '{version}'"));

    if version.is_empty() {
        return Err(invalid());
    }

    let components: Vec<&str> = version.split('.').collect();
    if components.len() > MAX_COMPONENTS {
        return Err(invalid());
    }

    let mut number = 0;
    for index in 0..MAX_COMPONENTS {
        let value = match components.get(index) {
            Some(component) => parse_component(component).ok_or_else(invalid)?,
            None => 0,
        };
        number = number * BASE + value;
    }

    Ok(number)
}

fn parse_component(component: &str) -> Option<i64> {
    if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    component.parse::<i64>().ok().filter(|value| *value < BASE)
}
