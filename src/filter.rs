use crate::models::{Pengabdian, Publikasi};

/// Kategori
///
/// Closed set of publication categories the UI can filter on. Stored `kategori`
/// values are free-form text; this enum is the normalization target, never the
/// storage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kategori {
    Buku,
    Jurnal,
    OpEd,
    Press,
}

impl Kategori {
    /// Maps a stored or user-supplied spelling onto the canonical category.
    /// Trims and lowercases, then applies the synonym table. Unrecognized input
    /// yields `None`: such records fail every specific filter and only surface
    /// under "all".
    pub fn parse(raw: &str) -> Option<Kategori> {
        match raw.trim().to_lowercase().as_str() {
            "buku" | "book" => Some(Kategori::Buku),
            "jurnal" | "journal" => Some(Kategori::Jurnal),
            "op-ed" | "oped" => Some(Kategori::OpEd),
            "press" | "press/news" | "news" => Some(Kategori::Press),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Kategori::Buku => "buku",
            Kategori::Jurnal => "jurnal",
            Kategori::OpEd => "op-ed",
            Kategori::Press => "press",
        }
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Narrows a publication list by free-text search and category.
///
/// Search is a case-insensitive substring match over judul, penulis, keywords
/// and deskripsi; a blank search matches everything. The category filter is an
/// exact match after both sides pass through [`Kategori::parse`], so "Buku",
/// "book" and "BOOK" all land in the same bucket. `None` means "all".
pub fn filter_publikasi(
    mut items: Vec<Publikasi>,
    search: &str,
    kategori: Option<Kategori>,
) -> Vec<Publikasi> {
    let needle = search.trim().to_lowercase();
    items.retain(|p| {
        let kategori_match = match kategori {
            None => true,
            Some(wanted) => Kategori::parse(&p.kategori) == Some(wanted),
        };
        let search_match = needle.is_empty()
            || contains_ci(&p.judul, &needle)
            || contains_ci(&p.penulis, &needle)
            || p.keywords.as_deref().is_some_and(|k| contains_ci(k, &needle))
            || p.deskripsi.as_deref().is_some_and(|d| contains_ci(d, &needle));
        kategori_match && search_match
    });
    items
}

/// Narrows an activity list by free-text search over judul and keywords.
pub fn filter_pengabdian(mut items: Vec<Pengabdian>, search: &str) -> Vec<Pengabdian> {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return items;
    }
    items.retain(|p| {
        contains_ci(&p.judul, &needle)
            || p.keywords.as_deref().is_some_and(|k| contains_ci(k, &needle))
    });
    items
}
