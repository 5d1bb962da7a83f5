//! Text helpers shared by the bot engine and the Discord adapter

use std::sync::LazyLock;

use regex::Regex;

/// Maximum length of a single Discord message, in characters.
pub const DISCORD_MESSAGE_LIMIT: usize = 2000;

static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<@!?(\d+)>$").expect("mention regex is valid"));

/// Parse a user reference: either a mention (`<@123>`, `<@!123>`) or a raw id.
pub fn parse_user_ref(input: &str) -> Option<u64> {
    let input = input.trim();
    if let Some(caps) = MENTION_RE.captures(input) {
        return caps[1].parse().ok();
    }
    if !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit()) {
        return input.parse().ok();
    }
    None
}

/// Render a user id as a Discord mention.
pub fn mention(user_id: u64) -> String {
    format!("<@{}>", user_id)
}

/// Split `text` into chunks of at most `limit` characters.
///
/// Chunks break on line boundaries where possible; a single line longer than
/// `limit` is cut on character boundaries.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    if limit == 0 {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;
    let mut open = false;

    for line in text.split('\n') {
        let line_len = line.chars().count();
        let sep = usize::from(open);

        if current_len + sep + line_len <= limit {
            if sep == 1 {
                current.push('\n');
            }
            current.push_str(line);
            current_len += sep + line_len;
            open = true;
            continue;
        }

        if open {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        open = true;
        if line_len <= limit {
            current.push_str(line);
            current_len = line_len;
        } else {
            let chars: Vec<char> = line.chars().collect();
            let mut pieces = chars.chunks(limit).peekable();
            while let Some(piece) = pieces.next() {
                let piece: String = piece.iter().collect();
                if pieces.peek().is_some() {
                    chunks.push(piece);
                } else {
                    current_len = piece.chars().count();
                    current = piece;
                }
            }
        }
    }

    if open || chunks.is_empty() {
        chunks.push(current);
    }
    chunks
}
