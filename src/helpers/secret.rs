const VISIBLE_PREFIX: usize = 4;

/// Render a secret for logs: a short prefix plus its length, never the whole value.
pub fn mask(secret: &str) -> String {
    let prefix: String = secret.chars().take(VISIBLE_PREFIX).collect();
    if secret.chars().count() <= VISIBLE_PREFIX * 2 {
        return format!("***(len={})", secret.len());
    }
    format!("{}***(len={})", prefix, secret.len())
}

#[cfg(test)]
mod test {
    use super::mask;

    #[test]
    fn keeps_only_prefix_of_long_secrets() {
        let masked = mask("eyJhbGciOiJSUzI1NiJ9.payload.sig");
        assert!(masked.starts_with("eyJh***"));
        assert!(!masked.contains("payload"));
    }

    #[test]
    fn hides_short_secrets_entirely() {
        assert_eq!(mask("tok-1"), "***(len=5)");
    }
}
