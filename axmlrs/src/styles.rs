use std::collections::HashMap;
use std::path::Path;

use crate::ParseError;

/// Dictionary of framework style names keyed by resource id, loaded from a
/// text asset whose lines read `name = decimal-id`. Blank and malformed
/// lines are ignored. Immutable after load and safe to share across
/// threads.
#[derive(Clone, Debug, Default)]
pub struct FrameworkStyles {
    names: HashMap<u32, String>,
}

impl FrameworkStyles {
    pub fn from_text(text: &str) -> Self {
        let mut names = HashMap::new();
        for line in text.lines() {
            let Some((name, id)) = line.split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            if let Ok(id) = id.trim().parse::<u32>() {
                names.insert(id, name.to_owned());
            }
        }
        Self { names }
    }

    pub fn from_file(path: &Path) -> Result<Self, ParseError> {
        let text = std::fs::read_to_string(path).map_err(|e| ParseError::File(e.to_string()))?;
        Ok(Self::from_text(&text))
    }

    pub fn name(&self, res_id: u32) -> Option<&str> {
        self.names.get(&res_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
