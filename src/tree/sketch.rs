//! Test helper that locates nodes by searching the source instead of
//! spelling out byte offsets.

use super::{Tree, TreeBuilder};

pub(crate) struct Sketch {
    builder: TreeBuilder,
    source: String,
    cursor: usize,
}

impl Sketch {
    pub(crate) fn new(source: &str) -> Self {
        Sketch { builder: TreeBuilder::new(source), source: source.to_string(), cursor: 0 }
    }

    fn find(&self, text: &str) -> usize {
        match self.source[self.cursor..].find(text) {
            Some(i) => self.cursor + i,
            None => panic!("`{}` not found after byte {}", text, self.cursor),
        }
    }

    /// Open a named node at the next occurrence of `at`.
    pub(crate) fn open(&mut self, kind: &str, field: Option<&str>, at: &str) -> &mut Self {
        let start = self.find(at);
        self.builder.open(kind, field, start).unwrap();
        self.cursor = start;
        self
    }

    pub(crate) fn leaf(&mut self, kind: &str, field: Option<&str>, text: &str) -> &mut Self {
        let start = self.find(text);
        self.builder.leaf(kind, field, start, start + text.len()).unwrap();
        self.cursor = start + text.len();
        self
    }

    pub(crate) fn token(&mut self, text: &str) -> &mut Self {
        let start = self.find(text);
        self.builder.token(text, None, start, start + text.len()).unwrap();
        self.cursor = start + text.len();
        self
    }

    /// Close the innermost node at the cursor.
    pub(crate) fn close(&mut self) -> &mut Self {
        self.builder.close(self.cursor).unwrap();
        self
    }

    pub(crate) fn close_at_end(&mut self) -> &mut Self {
        self.cursor = self.source.len();
        self.close()
    }

    pub(crate) fn finish(self) -> Tree {
        self.builder.finish().unwrap()
    }
}
