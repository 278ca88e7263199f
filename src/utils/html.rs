use ammonia;

/// Clean hint text using the ammonia library before it is stored.
///
/// Hints are free text typed by students and rendered back to other
/// students, so they go through whitelist-based sanitization: safe tags
/// (like <b>, <p>) survive, dangerous tags (like <script>, <iframe>) and
/// attributes (like onclick) are stripped.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
