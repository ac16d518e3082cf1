pub mod components;
pub mod screens;
pub mod theme;

pub use theme::Theme;

/// Shorten `s` to at most `max_len` characters, ending in "...".
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("Gypsum", 10), "Gypsum");
        assert_eq!(truncate("Life Force Gold™ Pellets", 10), "Life Fo...");
        assert_eq!(truncate("Agricultural Limestone (CaCO₃)", 26), "Agricultural Limestone ...");
    }
}
