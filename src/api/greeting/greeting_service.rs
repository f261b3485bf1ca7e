//! A service for greeting someone.

use tracing::instrument;

/// Returns a greeting based on someone's name.
#[instrument(ret)]
pub fn greet(name: &str) -> String {
    format!("Hello {name}")
}

#[cfg(test)]
mod tests {
    use super::greet;

    #[test]
    fn greet_formats_the_name_into_the_message() {
        assert_eq!("Hello Alice", greet("Alice"));
    }

    #[test]
    fn greet_accepts_an_empty_name() {
        assert_eq!("Hello ", greet(""));
    }

    #[test]
    fn greet_accepts_non_ascii_names() {
        assert_eq!("Hello Ada Lovelace", greet("Ada Lovelace"));
        assert_eq!("Hello Åse", greet("Åse"));
    }
}
