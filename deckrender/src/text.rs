//! Mise en forme du texte : troncature, retour à la ligne, durées
//!
//! Les fonctions prennent une fonction de mesure plutôt qu'une police, ce
//! qui les rend déterministes pour des métriques données.

const ELLIPSIS: &str = "...";

/// Tronque `text` pour tenir dans `max_width` pixels, suivi de "..."
///
/// Si le texte tient déjà, il est rendu tel quel. Sinon on retire un
/// caractère à la fois jusqu'à ce que `measure(texte + "...") <= max_width`.
pub fn truncate_text(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> String {
    if measure(text) <= max_width {
        return text.to_string();
    }
    force_ellipsis(text, max_width, measure)
}

/// Ajoute "..." en raccourcissant `text` autant que nécessaire
fn force_ellipsis(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> String {
    let mut kept = text.to_string();
    while !kept.is_empty() && measure(&format!("{}{}", kept, ELLIPSIS)) > max_width {
        kept.pop();
    }
    kept.push_str(ELLIPSIS);
    kept
}

/// Retour à la ligne glouton par mots, au plus `max_lines` lignes
///
/// Un mot plus large que la ligne est tronqué avec "...". Quand il reste du
/// texte au-delà de la dernière ligne, celle-ci se termine par "...".
pub fn wrap_text(
    text: &str,
    max_width: f32,
    max_lines: usize,
    measure: impl Fn(&str) -> f32,
) -> Vec<String> {
    if max_lines == 0 {
        return Vec::new();
    }
    if measure(text) <= max_width {
        return vec![text.to_string()];
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for word in text.split_whitespace() {
        current.push(word);
        if measure(&current.join(" ")) > max_width {
            if current.len() > 1 {
                current.pop();
                lines.push(current.join(" "));
                current = vec![word];
                // le mot seul peut encore déborder
                if measure(word) > max_width {
                    lines.push(truncate_text(word, max_width, &measure));
                    current.clear();
                }
            } else {
                lines.push(truncate_text(word, max_width, &measure));
                current.clear();
            }
        }
    }
    if !current.is_empty() {
        lines.push(current.join(" "));
    }

    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            if !last.ends_with(ELLIPSIS) {
                *last = force_ellipsis(last, max_width, &measure);
            }
        }
    }
    lines
}

/// Formate une durée en secondes : "2h 30m 15s", "1m 5s", "0s"
///
/// Chaque unité nulle est omise, sauf les secondes quand tout est nul.
pub fn format_retry_time(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    if secs > 0 || parts.is_empty() {
        parts.push(format!("{}s", secs));
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 10 px par caractère
    fn mono(s: &str) -> f32 {
        s.chars().count() as f32 * 10.0
    }

    #[test]
    fn test_format_retry_time() {
        assert_eq!(format_retry_time(0), "0s");
        assert_eq!(format_retry_time(65), "1m 5s");
        assert_eq!(format_retry_time(3661), "1h 1m 1s");
        assert_eq!(format_retry_time(3600), "1h");
        assert_eq!(format_retry_time(9015), "2h 30m 15s");
        assert_eq!(format_retry_time(120), "2m");
    }

    #[test]
    fn test_truncate_keeps_fitting_text() {
        assert_eq!(truncate_text("hello", 50.0, mono), "hello");
    }

    #[test]
    fn test_truncate_adds_ellipsis() {
        let out = truncate_text("hello world", 80.0, mono);
        assert_eq!(out, "hello...");
        assert!(mono(&out) <= 80.0);
    }

    #[test]
    fn test_truncate_handles_unicode() {
        let out = truncate_text("東京事変の曲名", 50.0, mono);
        assert_eq!(out, "東京...");
    }

    #[test]
    fn test_truncate_tiny_budget_terminates() {
        assert_eq!(truncate_text("abcdef", 10.0, mono), "...");
    }

    #[test]
    fn test_wrap_two_lines() {
        let lines = wrap_text("the quick brown fox", 100.0, 2, mono);
        assert_eq!(lines, vec!["the quick", "brown fox"]);
    }

    #[test]
    fn test_wrap_overflow_ends_with_ellipsis() {
        let lines = wrap_text("one two three four five six", 90.0, 2, mono);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "one two");
        assert!(lines[1].ends_with("..."));
        assert!(mono(&lines[1]) <= 90.0);
    }

    #[test]
    fn test_wrap_long_word_is_truncated() {
        let lines = wrap_text("supercalifragilistic", 80.0, 2, mono);
        assert_eq!(lines, vec!["super..."]);
    }
}
