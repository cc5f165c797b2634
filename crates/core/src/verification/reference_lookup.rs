/// Which entry of the reference table an asset identifier points at.
///
/// `"114"` names a whole chapter, `"114_1"` a single verse. Leading zeros are
/// insignificant in both parts (`"007_003"` is chapter 7, verse 3).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReferenceKey {
    Chapter(u32),
    Verse { chapter: u32, verse: u32 },
}

impl ReferenceKey {
    /// Parses an asset identifier, or `None` if it is neither form.
    pub fn parse(item_id: &str) -> Option<Self> {
        match item_id.split_once('_') {
            None => parse_part(item_id).map(ReferenceKey::Chapter),
            Some((chapter, verse)) => Some(ReferenceKey::Verse {
                chapter: parse_part(chapter)?,
                verse: parse_part(verse)?,
            }),
        }
    }
}

fn parse_part(part: &str) -> Option<u32> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

/// Source of the known-good English translation for an asset.
pub trait ReferenceLookup: Send + Sync {
    /// The reference translation for `item_id`, or `None` when the table has
    /// no entry for it.
    fn translation(&self, item_id: &str) -> Option<String>;
}
