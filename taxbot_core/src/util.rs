//! Text helpers shared by the transports.

/// Maximum length of a single Telegram message, in characters.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

/// Split `text` into consecutive chunks of at most `max_chars` characters.
///
/// Splits on character boundaries only; words may be cut in half. An empty
/// input yields no chunks. A `max_chars` of zero is treated as one.
#[must_use]
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0_usize;

    for ch in text.chars() {
        if count == max_chars {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
        current.push(ch);
        count += 1;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
