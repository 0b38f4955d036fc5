/// Content-type prefixes eligible for automatic indexing, per §4.4.
const TEXT_ELIGIBLE_PREFIXES: &[&str] = &[
  "text/plain",
  "text/markdown",
  "text/html",
  "text/csv",
  "application/json",
  "application/xml",
  "text/xml",
];

/// Whether an uploaded object's content-type makes it eligible for
/// automatic indexing. Case-insensitive, trimmed, prefix match (so
/// `"text/plain; charset=utf-8"` is eligible).
pub fn is_text_eligible(content_type: &str) -> bool {
  let normalized = content_type.trim().to_ascii_lowercase();
  TEXT_ELIGIBLE_PREFIXES
    .iter()
    .any(|prefix| normalized.starts_with(prefix))
}

/// Word-window size used to chunk long documents, per §4.4.
pub const CHUNK_WORD_WINDOW: usize = 500;
/// Documents at or below this length (in bytes) are embedded whole.
pub const SINGLE_CHUNK_THRESHOLD: usize = 1000;

/// Splits `text` into non-overlapping windows of `CHUNK_WORD_WINDOW`
/// whitespace tokens. The last window may be shorter. Used only when
/// `text.len() > SINGLE_CHUNK_THRESHOLD`.
pub fn chunk_text(text: &str) -> Vec<String> {
  let words: Vec<&str> = text.split_whitespace().collect();
  if words.is_empty() {
    return Vec::new();
  }
  words
    .chunks(CHUNK_WORD_WINDOW)
    .map(|w| w.join(" "))
    .collect()
}

/// `chunk_id` naming convention: `"{object_id}_chunk_{i}"`.
pub fn chunk_id(object_id: &str, index: usize) -> String {
  format!("{object_id}_chunk_{index}")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn eligible_prefixes_match_case_insensitively() {
    assert!(is_text_eligible("TEXT/PLAIN"));
    assert!(is_text_eligible(" text/plain; charset=utf-8 "));
    assert!(is_text_eligible("application/json"));
    assert!(!is_text_eligible("image/png"));
    assert!(!is_text_eligible("application/octet-stream"));
  }

  #[test]
  fn short_text_has_no_chunks_needed() {
    assert!("short doc".len() <= SINGLE_CHUNK_THRESHOLD);
  }

  #[test]
  fn chunking_splits_on_word_windows() {
    let text = vec!["word"; 1200].join(" ");
    let chunks = chunk_text(&text);
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].split_whitespace().count(), 500);
    assert_eq!(chunks[1].split_whitespace().count(), 500);
    assert_eq!(chunks[2].split_whitespace().count(), 200);
  }

  #[test]
  fn chunk_id_follows_convention() {
    assert_eq!(chunk_id("b/doc.txt", 3), "b/doc.txt_chunk_3");
  }
}
