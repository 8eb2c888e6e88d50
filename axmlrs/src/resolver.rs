use std::collections::HashSet;

use crate::arsc_parser::{ResourceEntry, ResourceTable};
use crate::chunks::ResType;
use crate::styles::FrameworkStyles;

// Framework style resources live in this id window (exclusive bounds).
const FRAMEWORK_STYLE_LO: u32 = 0x0103_0000;
const FRAMEWORK_STYLE_HI: u32 = 0x0103_1000;

/// A `lang` / `lang-COUNTRY` pair used to pick between per-configuration
/// resource entries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Locale {
    pub language: String,
    pub country: String,
}

impl Locale {
    /// Parses `""`, `"en"` or `"en-US"` (an underscore separator is
    /// accepted too).
    pub fn new(tag: &str) -> Self {
        let mut parts = tag.split(|c| c == '-' || c == '_');
        let language = parts.next().unwrap_or("").to_owned();
        let country = parts.next().unwrap_or("").to_owned();
        if language == "C" || language == "POSIX" {
            return Self::default();
        }
        Self { language, country }
    }

    /// The host's default locale from the environment (`LC_ALL`, then
    /// `LANG`), or the empty locale when none is set.
    pub fn host_default() -> Self {
        let raw = std::env::var("LC_ALL")
            .or_else(|_| std::env::var("LANG"))
            .unwrap_or_default();
        let tag = raw.split('.').next().unwrap_or("");
        Self::new(tag)
    }

    pub fn tag(&self) -> String {
        if self.language.is_empty() {
            String::new()
        } else if self.country.is_empty() {
            self.language.clone()
        } else {
            format!("{}-{}", self.language, self.country)
        }
    }
}

/// Turns resource ids into displayable strings: symbolic `@type/name`
/// references, dereferenced values, and attribute names.
pub struct ResourceResolver<'a> {
    table: Option<&'a ResourceTable>,
    styles: Option<&'a FrameworkStyles>,
    resolve_to_value: bool,
    locale: Locale,
}

impl<'a> ResourceResolver<'a> {
    pub fn new(
        table: Option<&'a ResourceTable>,
        styles: Option<&'a FrameworkStyles>,
        resolve_to_value: bool,
        locale: &Locale,
    ) -> Self {
        Self {
            table,
            styles,
            resolve_to_value,
            locale: locale.clone(),
        }
    }

    /// Resolves a reference id. Framework styles come from the style
    /// dictionary; everything else goes through the resource table, either
    /// symbolically or down the value chain.
    pub fn resolve_reference(&self, res_id: u32) -> Option<String> {
        if res_id > FRAMEWORK_STYLE_LO && res_id < FRAMEWORK_STYLE_HI {
            return Some(match self.styles.and_then(|s| s.name(res_id)) {
                Some(name) => format!("@android:style/{}", name),
                None => format!("@android:style/0x{:08x}", res_id),
            });
        }

        let entry = self.select_entry(res_id)?;
        if !self.resolve_to_value {
            return Some(format!("@{}/{}", entry.type_name, entry.key));
        }

        let mut visited = HashSet::new();
        visited.insert(res_id);
        Some(
            self.follow(entry, &mut visited)
                .unwrap_or_else(|| format!("@{}/{}", entry.type_name, entry.key)),
        )
    }

    /// The key under which an `attr` resource was defined, if the table
    /// knows the id.
    pub fn resolve_attribute_name(&self, res_id: u32) -> Option<String> {
        self.table?.attribute_name(res_id).map(str::to_owned)
    }

    /// Follows a reference chain until it produces a pool string. The
    /// visited set bounds the walk on cyclic tables.
    fn follow(&self, entry: &ResourceEntry, visited: &mut HashSet<u32>) -> Option<String> {
        let value = entry.value.as_ref()?;
        match value.data_type {
            ResType::STRING => self
                .table?
                .global_pool()
                .get(value.data as usize)
                .map(str::to_owned),
            ResType::REFERENCE | ResType::ATTRIBUTE => {
                if !visited.insert(value.data) {
                    return None;
                }
                self.follow(self.select_entry(value.data)?, visited)
            }
            _ => None,
        }
    }

    /// Picks the best candidate for an id: exact `lang-COUNTRY` first, then
    /// the bare language, then the locale-less entry, then whatever is
    /// first.
    fn select_entry(&self, res_id: u32) -> Option<&'a ResourceEntry> {
        let candidates = self.table?.entries(res_id)?;
        let full = self.locale.tag();
        if !self.locale.country.is_empty() {
            if let Some(e) = candidates.iter().find(|e| e.locale == full) {
                return Some(e);
            }
        }
        if !self.locale.language.is_empty() {
            if let Some(e) = candidates.iter().find(|e| e.locale == self.locale.language) {
                return Some(e);
            }
        }
        candidates
            .iter()
            .find(|e| e.locale.is_empty())
            .or_else(|| candidates.first())
    }
}
