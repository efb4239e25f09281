use ammonia;

/// Clean teacher-supplied free text (quiz titles, question text, options)
/// using the ammonia library.
///
/// Whitelist-based sanitization: safe tags survive, <script>/<iframe> and
/// event-handler attributes do not. Fail-safe against Stored XSS in the
/// quiz-taking clients, which render this text.
pub fn clean_text(input: &str) -> String {
    ammonia::clean(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_tags() {
        let cleaned = clean_text("What is 2+2?<script>alert(1)</script>");
        assert_eq!(cleaned, "What is 2+2?");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(clean_text("Plain question text"), "Plain question text");
    }
}
