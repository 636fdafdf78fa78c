/// Un nombre válido no es vacío y no contiene espacios en blanco.
pub fn validate_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::validate_name;

    #[test]
    fn rejects_whitespace_and_empty() {
        assert!(validate_name("filter_1"));
        assert!(!validate_name(""));
        assert!(!validate_name("two words"));
        assert!(!validate_name("tab\tname"));
    }
}
