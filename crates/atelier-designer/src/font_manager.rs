//! System font lookup for text elements.
//!
//! The font database is scanned once per process. Resolved fonts are leaked
//! into `'static` and cached per (family, weight, style), so every text
//! element with the same attributes shares one parsed face.

use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use fontdb::{Database, Family, Query, Source, Stretch, Style, Weight};
use parking_lot::Mutex;
use rusttype::Font;

use crate::model::{FontStyle, FontWeight};

type FontCache = HashMap<(String, FontWeight, FontStyle), Option<&'static Font<'static>>>;

fn database() -> &'static Database {
    static DATABASE: OnceLock<Database> = OnceLock::new();
    DATABASE.get_or_init(|| {
        let mut db = Database::new();
        db.load_system_fonts();
        tracing::debug!("Font database holds {} faces", db.len());
        db
    })
}

fn cache() -> &'static Mutex<FontCache> {
    static CACHE: OnceLock<Mutex<FontCache>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Installed family names, sorted and deduplicated (the property panel list)
pub fn list_font_families() -> Vec<String> {
    database()
        .faces()
        .flat_map(|face| face.families.iter().map(|(name, _)| name.clone()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn has_fonts() -> bool {
    database().faces().next().is_some()
}

/// Font for a text element
///
/// Tries `family`, then `fallback_family`, then any installed face, preferring
/// a regular sans. `None` only when the system has no usable font at all.
pub fn get_font_for(
    family: &str,
    fallback_family: &str,
    weight: FontWeight,
    style: FontStyle,
) -> Option<&'static Font<'static>> {
    let key = (family.to_string(), weight, style);
    if let Some(hit) = cache().lock().get(&key) {
        return *hit;
    }

    let resolved = query_face(family, weight, style)
        .or_else(|| query_face(fallback_family, weight, style))
        .or_else(any_face)
        .map(|font| &*Box::leak(Box::new(font)));
    if resolved.is_none() {
        tracing::warn!("No usable font for family '{}'", family);
    }

    cache().lock().insert(key, resolved);
    resolved
}

fn generic_family(name: &str) -> Family<'_> {
    match name.trim() {
        "" | "Sans" | "sans-serif" => Family::SansSerif,
        "Serif" | "serif" => Family::Serif,
        "Monospace" | "monospace" => Family::Monospace,
        other => Family::Name(other),
    }
}

fn query_face(family: &str, weight: FontWeight, style: FontStyle) -> Option<Font<'static>> {
    let families = [generic_family(family)];
    let query = Query {
        families: &families,
        weight: if weight == FontWeight::Bold {
            Weight::BOLD
        } else {
            Weight::NORMAL
        },
        stretch: Stretch::Normal,
        style: if style == FontStyle::Italic {
            Style::Italic
        } else {
            Style::Normal
        },
    };
    parse_face(database().query(&query)?)
}

fn any_face() -> Option<Font<'static>> {
    let mut faces: Vec<_> = database().faces().collect();
    faces.sort_by_key(|face| {
        let sans = face
            .families
            .iter()
            .any(|(name, _)| name.contains("Sans") && !name.contains("Mono"));
        (!sans, face.weight != Weight::NORMAL, face.style != Style::Normal)
    });
    faces.into_iter().find_map(|face| parse_face(face.id))
}

fn parse_face(id: fontdb::ID) -> Option<Font<'static>> {
    let face = database().face(id)?;
    let bytes = match &face.source {
        Source::File(path) | Source::SharedFile(path, _) => std::fs::read(path).ok()?,
        Source::Binary(data) => data.as_ref().as_ref().to_vec(),
    };
    Font::try_from_vec_and_index(bytes, face.index)
}
