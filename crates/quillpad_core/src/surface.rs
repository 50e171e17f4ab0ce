//! Editing surface abstraction and the in-crate text surface.
//!
//! The surface owns the live document model (a [`Delta`]) and the caret, and
//! notifies registered change callbacks on every content mutation - except
//! mutations applied with [`ApplyMode::Silent`], which is how remote pushes
//! are re-applied without feeding back into the save loop.
//!
//! Caret indices are measured in characters, with embeds counting as one.

use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::delta::{Delta, DeltaOp};

/// How a mutation is applied to the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    /// A local edit; change callbacks fire.
    User,
    /// A programmatic apply (remote push, initial load); callbacks do not fire.
    Silent,
}

/// Callback invoked with the new contents after a non-silent mutation.
pub type ChangeCallback = Arc<dyn Fn(&Delta) + Send + Sync>;

/// The editing surface contract the controller is written against.
pub trait EditingSurface: Send + Sync {
    /// Snapshot of the current contents.
    fn contents(&self) -> Delta;

    /// Replace the contents wholesale.
    fn set_contents(&self, content: Delta, mode: ApplyMode);

    /// Plain-text extraction of the current contents.
    fn plain_text(&self) -> String;

    /// The caret position, if one has been set.
    fn selection(&self) -> Option<usize>;

    /// Move the caret; the index is clamped to the valid range.
    fn set_selection(&self, index: usize, mode: ApplyMode);

    /// Register a change callback.
    fn on_change(&self, callback: ChangeCallback);
}

struct SurfaceState {
    content: Delta,
    selection: Option<usize>,
}

/// In-crate editing surface holding a [`Delta`] and a caret.
///
/// Hosts drive it through [`insert_text`](TextSurface::insert_text) and
/// [`delete_range`](TextSurface::delete_range); the controller drives it
/// through the [`EditingSurface`] trait.
pub struct TextSurface {
    state: RwLock<SurfaceState>,
    callbacks: RwLock<Vec<ChangeCallback>>,
}

impl TextSurface {
    /// Create an empty surface.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(SurfaceState {
                content: Delta::new(),
                selection: None,
            }),
            callbacks: RwLock::new(Vec::new()),
        }
    }

    /// Insert text at a character index, as a local edit.
    ///
    /// The index is clamped to the content length. Text inserted inside or
    /// at the end of a styled run inherits that run's attributes.
    pub fn insert_text(&self, index: usize, text: &str) {
        if text.is_empty() {
            return;
        }
        {
            let mut state = self.state.write().unwrap();
            let at = index.min(state.content.len());
            splice_insert(&mut state.content, at, text);
            state.selection = Some(at + text.chars().count());
        }
        self.fire_change();
    }

    /// Delete `count` characters starting at a character index, as a local
    /// edit. Embeds overlapped by the range are removed.
    pub fn delete_range(&self, index: usize, count: usize) {
        if count == 0 {
            return;
        }
        {
            let mut state = self.state.write().unwrap();
            let total = state.content.len();
            let start = index.min(total);
            let end = (index + count).min(total);
            if start == end {
                return;
            }
            splice_delete(&mut state.content, start, end);
            state.selection = Some(start);
        }
        self.fire_change();
    }

    /// Append text at the end of the document, as a local edit.
    pub fn append_text(&self, text: &str) {
        let at = self.state.read().unwrap().content.len();
        self.insert_text(at, text);
    }

    fn fire_change(&self) {
        let snapshot = self.state.read().unwrap().content.clone();
        let callbacks = self.callbacks.read().unwrap().clone();
        for callback in callbacks {
            callback(&snapshot);
        }
    }
}

impl Default for TextSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl EditingSurface for TextSurface {
    fn contents(&self) -> Delta {
        self.state.read().unwrap().content.clone()
    }

    fn set_contents(&self, content: Delta, mode: ApplyMode) {
        {
            let mut state = self.state.write().unwrap();
            state.content = content;
            // Keep the caret inside the new content
            let len = state.content.len();
            if let Some(sel) = state.selection {
                state.selection = Some(sel.min(len));
            }
        }
        if mode == ApplyMode::User {
            self.fire_change();
        }
    }

    fn plain_text(&self) -> String {
        self.state.read().unwrap().content.plain_text()
    }

    fn selection(&self) -> Option<usize> {
        self.state.read().unwrap().selection
    }

    fn set_selection(&self, index: usize, _mode: ApplyMode) {
        let mut state = self.state.write().unwrap();
        let len = state.content.len();
        state.selection = Some(index.min(len));
    }

    fn on_change(&self, callback: ChangeCallback) {
        self.callbacks.write().unwrap().push(callback);
    }
}

/// Byte offset of the `n`th character in `s` (or the string's end).
fn char_to_byte(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(b, _)| b).unwrap_or(s.len())
}

/// Insert `text` into `content` at character index `at` (pre-clamped).
fn splice_insert(content: &mut Delta, at: usize, text: &str) {
    enum Target {
        /// Splice into the string op at (index, char offset)
        Run(usize, usize),
        /// Insert a fresh unstyled op at this slot
        Slot(usize),
    }

    let mut remaining = at;
    let mut target = None;
    for (i, op) in content.0.iter().enumerate() {
        let len = op.len();
        if remaining > len {
            remaining -= len;
            continue;
        }
        target = Some(if op.as_text().is_some() {
            Target::Run(i, remaining)
        } else {
            // Embed boundary: before when at its start, after otherwise
            Target::Slot(if remaining == 0 { i } else { i + 1 })
        });
        break;
    }

    match target {
        Some(Target::Run(i, offset)) => {
            // Splice into the run, inheriting its attributes
            if let Value::String(s) = &mut content.0[i].insert {
                let byte = char_to_byte(s, offset);
                s.insert_str(byte, text);
            }
        }
        Some(Target::Slot(slot)) => content.0.insert(slot, DeltaOp::text(text)),
        None => content.0.push(DeltaOp::text(text)),
    }
}

/// Remove the character range `[start, end)` from `content` (pre-clamped).
fn splice_delete(content: &mut Delta, start: usize, end: usize) {
    let mut result: Vec<DeltaOp> = Vec::new();
    let mut pos = 0usize;
    for op in content.0.drain(..) {
        let op_len = op.len();
        let op_start = pos;
        let op_end = pos + op_len;
        pos = op_end;

        if op_end <= start || op_start >= end {
            result.push(op);
            continue;
        }
        match op.insert.as_str() {
            Some(s) => {
                let keep_head = start.saturating_sub(op_start);
                let cut_until = end.saturating_sub(op_start).min(op_len);
                let head: String = s.chars().take(keep_head).collect();
                let tail: String = s.chars().skip(cut_until).collect();
                let merged = head + &tail;
                if !merged.is_empty() {
                    result.push(DeltaOp {
                        insert: Value::String(merged),
                        attributes: op.attributes,
                    });
                }
            }
            None => {
                // Embed fully covered by the range: dropped
            }
        }
    }
    content.0 = result;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::Attributes;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn change_counter(surface: &TextSurface) -> Arc<AtomicUsize> {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = counter.clone();
        surface.on_change(Arc::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        }));
        counter
    }

    #[test]
    fn test_insert_and_delete_update_text_and_caret() {
        let surface = TextSurface::new();
        surface.insert_text(0, "Hello");
        surface.insert_text(5, " World");
        assert_eq!(surface.plain_text(), "Hello World");
        assert_eq!(surface.selection(), Some(11));

        surface.delete_range(5, 6);
        assert_eq!(surface.plain_text(), "Hello");
        assert_eq!(surface.selection(), Some(5));
    }

    #[test]
    fn test_insert_inside_styled_run_inherits_attributes() {
        let mut attrs = Attributes::new();
        attrs.insert("bold".to_string(), json!(true));
        let surface = TextSurface::new();
        surface.set_contents(
            Delta(vec![DeltaOp::styled("ad", attrs.clone())]),
            ApplyMode::Silent,
        );

        surface.insert_text(1, "bc");
        let contents = surface.contents();
        assert_eq!(contents.ops().len(), 1);
        assert_eq!(contents.ops()[0].as_text(), Some("abcd"));
        assert_eq!(contents.ops()[0].attributes, Some(attrs));
    }

    #[test]
    fn test_delete_across_ops_and_embeds() {
        let surface = TextSurface::new();
        surface.set_contents(
            Delta(vec![
                DeltaOp::text("ab"),
                DeltaOp {
                    insert: json!({"image": "x"}),
                    attributes: None,
                },
                DeltaOp::text("cd"),
            ]),
            ApplyMode::Silent,
        );

        // Range [1, 4) covers "b", the embed, and "c"
        surface.delete_range(1, 3);
        assert_eq!(surface.plain_text(), "ad");
        assert_eq!(surface.contents().len(), 2);
    }

    #[test]
    fn test_silent_set_contents_does_not_fire_change() {
        let surface = TextSurface::new();
        let counter = change_counter(&surface);

        surface.set_contents(Delta::from_text("pushed"), ApplyMode::Silent);
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        surface.set_contents(Delta::from_text("typed"), ApplyMode::User);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_local_edits_fire_change() {
        let surface = TextSurface::new();
        let counter = change_counter(&surface);

        surface.insert_text(0, "a");
        surface.insert_text(1, "b");
        surface.delete_range(0, 1);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_selection_clamped_on_set_and_on_shrink() {
        let surface = TextSurface::new();
        surface.insert_text(0, "abcdef");

        surface.set_selection(100, ApplyMode::Silent);
        assert_eq!(surface.selection(), Some(6));

        surface.set_contents(Delta::from_text("ab"), ApplyMode::Silent);
        assert_eq!(surface.selection(), Some(2));
    }

    #[test]
    fn test_insert_index_clamped_to_length() {
        let surface = TextSurface::new();
        surface.insert_text(42, "end");
        assert_eq!(surface.plain_text(), "end");
    }

    #[test]
    fn test_multibyte_text_handled_by_char_index() {
        let surface = TextSurface::new();
        surface.insert_text(0, "héllo");
        surface.insert_text(2, "X");
        assert_eq!(surface.plain_text(), "héXllo");
        surface.delete_range(1, 2);
        assert_eq!(surface.plain_text(), "hllo");
    }
}
