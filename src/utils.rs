/// Reduce a caller number or call id to a form safe to embed in a file name.
/// `+` signs are dropped rather than replaced, so `+15550001111` becomes
/// `15550001111` and not `_15550001111`.
pub fn sanitize_filename_component(value: &str) -> String {
    value
        .chars()
        .filter(|c| *c != '+')
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename_component() {
        assert_eq!(sanitize_filename_component("+15550001111"), "15550001111");
        assert_eq!(sanitize_filename_component("CA1234abcd"), "CA1234abcd");
        assert_eq!(
            sanitize_filename_component("Unknown Caller"),
            "Unknown_Caller"
        );
        assert_eq!(sanitize_filename_component("bad/../name"), "bad____name");
        assert_eq!(sanitize_filename_component("sip:alice@host"), "sip_alice_host");
    }
}
