use std::collections::HashMap;

/// Per-pass colour assignment for feed titles.
///
/// Titles get palette indices round-robin in the order they are first seen.
/// Every index goes through the user's remap table before it is handed out.
#[derive(Debug, Clone, Default)]
pub struct ColorTable {
    assigned: HashMap<String, u8>,
    remap: HashMap<u8, u8>,
}

impl ColorTable {
    pub fn new(remap: HashMap<u8, u8>) -> Self {
        Self {
            assigned: HashMap::new(),
            remap,
        }
    }

    /// Colour for `title`, assigning the next free index on first sight.
    pub fn color_for(&mut self, title: &str) -> u8 {
        if let Some(color) = self.assigned.get(title) {
            return *color;
        }
        let index = (self.assigned.len() % 256) as u8;
        let color = self.map(index);
        self.assigned.insert(title.to_string(), color);
        color
    }

    /// Applies the remap table to a raw palette index.
    pub fn map(&self, index: u8) -> u8 {
        self.remap.get(&index).copied().unwrap_or(index)
    }
}
