use rand::Rng;

/// Smallest value a PNR can take. PNRs are always exactly ten digits, so the
/// leading digit is never zero.
pub const PNR_MIN: u64 = 1_000_000_000;

/// Largest value a PNR can take.
pub const PNR_MAX: u64 = 9_999_999_999;

/// Draw a fresh PNR candidate from the uniform range. Uniqueness is the
/// allocator's job; this only guarantees the format.
pub fn random_candidate() -> String {
    rand::thread_rng().gen_range(PNR_MIN..=PNR_MAX).to_string()
}

/// Whether `value` is a well-formed PNR: ten ASCII digits in
/// [PNR_MIN, PNR_MAX]. Lookups with malformed keys can be rejected without
/// touching storage.
pub fn is_well_formed(value: &str) -> bool {
    value.len() == 10
        && value.bytes().all(|b| b.is_ascii_digit())
        && value
            .parse::<u64>()
            .map(|n| (PNR_MIN..=PNR_MAX).contains(&n))
            .unwrap_or(false)
}
