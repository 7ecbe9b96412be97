//! Filesystem-safe local filename from a remote base name.

/// Sanitizes a remote file name for use as a local file name.
///
/// - Replaces NUL, `/`, `\`, `:` and control characters with `_`
/// - Trims leading/trailing spaces, dots and underscores
/// - Collapses consecutive underscores
/// - Limits length to 255 bytes (NAME_MAX)
pub fn sanitize_local_name(name: &str) -> String {
    const NAME_MAX: usize = 255;

    let mut out = String::with_capacity(name.len());
    let mut prev_underscore = false;

    for c in name.chars() {
        let replacement = match c {
            '\0' | '/' | '\\' | ':' | ' ' | '\t' => '_',
            c if c.is_control() => '_',
            c => c,
        };

        if replacement == '_' {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(replacement);
            prev_underscore = false;
        }
    }

    let trimmed = out.trim_matches(|c| c == ' ' || c == '.' || c == '_');

    if trimmed.len() > NAME_MAX {
        let mut take = NAME_MAX;
        while take > 0 && !trimmed.is_char_boundary(take) {
            take -= 1;
        }
        trimmed[..take].to_string()
    } else {
        trimmed.to_string()
    }
}
