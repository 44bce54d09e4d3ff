/// Strips terminal escape sequences and control characters from text that came
/// from a remote service. Line breaks survive only when `keep_newlines` is set;
/// otherwise they become single spaces.
pub(super) fn sanitize_remote_text(text: &str, keep_newlines: bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_escape = false;
    let mut in_csi = false;
    let normalized = text.replace("\r\n", "\n");

    for ch in normalized.chars() {
        if in_escape {
            if in_csi {
                // CSI sequence terminates at bytes in range 0x40..0x7E.
                if ('@'..='~').contains(&ch) {
                    in_escape = false;
                    in_csi = false;
                }
                continue;
            }
            if ch == '[' {
                in_csi = true;
                continue;
            }
            in_escape = false;
            continue;
        }

        if ch == '\u{1b}' {
            in_escape = true;
            continue;
        }

        if ch == '\r' || ch == '\n' {
            if keep_newlines {
                out.push('\n');
            } else if !out.ends_with(' ') {
                out.push(' ');
            }
            continue;
        }

        if ch == '\t' {
            out.push(' ');
            continue;
        }

        if ch.is_control() {
            continue;
        }

        out.push(ch);
    }

    out
}
