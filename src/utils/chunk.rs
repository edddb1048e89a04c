/// Split `text` into pieces of at most `max_len` characters.
///
/// Splits fall on char boundaries; a `max_len` of 0 is treated as 1.
pub fn chunk_reply(text: &str, max_len: usize) -> Vec<&str> {
    let max_len = max_len.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let split = rest
            .char_indices()
            .nth(max_len)
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        let (head, tail) = rest.split_at(split);
        chunks.push(head);
        rest = tail;
    }

    chunks
}
