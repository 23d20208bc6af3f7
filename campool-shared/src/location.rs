/// Shorten a stored free-text address to something fit for a notification
/// line: street addresses keep "number street, locality", everything else
/// keeps the leading place name.
pub fn display_location(full_address: &str) -> String {
    let parts: Vec<&str> = full_address.split(',').map(str::trim).collect();

    let first = match parts.first() {
        Some(p) if !p.is_empty() => *p,
        _ => return full_address.trim().to_string(),
    };

    if first.starts_with(|c: char| c.is_ascii_digit()) {
        parts
            .iter()
            .take(2)
            .copied()
            .collect::<Vec<&str>>()
            .join(", ")
    } else {
        first.to_string()
    }
}
