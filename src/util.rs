//! Small utility helpers used across modules.

use rand::Rng;

/// Uniform in-place permutation (Durstenfeld's Fisher-Yates).
/// Walks from the last index down to 1 and swaps each slot with a uniformly
/// chosen slot in `[0, i]`. The rng is explicit so tests can seed it.
pub fn shuffle<T, R: Rng + ?Sized>(mut items: Vec<T>, rng: &mut R) -> Vec<T> {
  for i in (1..items.len()).rev() {
    let j = rng.gen_range(0..=i);
    items.swap(i, j);
  }
  items
}

/// Log-safe truncation for large strings, on a char boundary.
pub fn trunc_for_log(s: &str, max_chars: usize) -> String {
  let count = s.chars().count();
  if count <= max_chars {
    s.to_string()
  } else {
    let head: String = s.chars().take(max_chars).collect();
    format!("{}… ({} chars total)", head, count)
  }
}
