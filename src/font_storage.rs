use std::{collections::HashMap, sync::Arc};

use crate::error::FontError;
use crate::font::{FontHandle, OutlineFont};

/// Process-wide font collection keyed by the URL features refer to.
///
/// Binary fonts are registered in a `fontdb` database (which gives us face
/// metadata and removal) and wrapped in an [`OutlineFont`]. Hosts with their
/// own metrics can skip the database and [`insert`](Self::insert) a handle
/// directly.
///
/// Nothing here is reset implicitly; entries live until [`remove`](Self::remove)
/// or [`clear`](Self::clear).
pub struct FontStorage {
    font_db: fontdb::Database,
    /// Faces registered in `font_db` for each URL.
    faces: HashMap<String, fontdb::ID, fxhash::FxBuildHasher>,
    loaded_font: HashMap<String, Arc<dyn FontHandle>, fxhash::FxBuildHasher>,
}

impl Default for FontStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl FontStorage {
    /// Creates an empty storage with an empty font database.
    pub fn new() -> Self {
        Self {
            font_db: fontdb::Database::new(),
            faces: HashMap::with_hasher(fxhash::FxBuildHasher::default()),
            loaded_font: HashMap::with_hasher(fxhash::FxBuildHasher::default()),
        }
    }
}

/// Loading
impl FontStorage {
    /// Parses `data` and stores it under `url`, replacing any previous font.
    ///
    /// Only the first face of a collection is used.
    pub fn load_font_binary(
        &mut self,
        url: &str,
        data: impl Into<Vec<u8>>,
    ) -> Result<Arc<dyn FontHandle>, FontError> {
        let data = Arc::new(data.into());
        // validate before touching the database so a bad payload leaves no trace
        let font = OutlineFont::from_bytes(Arc::clone(&data), 0)?;

        let ids = self
            .font_db
            .load_font_source(fontdb::Source::Binary(data));
        let Some(&id) = ids.first() else {
            return Err(FontError::NoFace(url.to_string()));
        };

        let font = match self.font_db.face(id).and_then(|f| f.families.first()) {
            Some((family, _)) => font.with_family(family.clone()),
            None => font,
        };
        log::debug!("Loaded font {} ({:?})", url, font.family());

        self.remove(url);
        self.faces.insert(url.to_string(), id);
        let handle: Arc<dyn FontHandle> = Arc::new(font);
        self.loaded_font.insert(url.to_string(), Arc::clone(&handle));
        Ok(handle)
    }

    /// Stores an externally provided handle under `url`.
    pub fn insert(&mut self, url: impl Into<String>, font: Arc<dyn FontHandle>) {
        let url = url.into();
        self.remove(&url);
        self.loaded_font.insert(url, font);
    }

    /// Drops the font stored under `url`, unregistering its face.
    pub fn remove(&mut self, url: &str) {
        if let Some(id) = self.faces.remove(url) {
            self.font_db.remove_face(id);
        }
        self.loaded_font.remove(url);
    }

    /// Drops every font and every registered face.
    pub fn clear(&mut self) {
        let ids: Vec<_> = self.faces.drain().map(|(_, id)| id).collect();
        for id in ids {
            self.font_db.remove_face(id);
        }
        self.loaded_font.clear();
    }
}

/// Lookup
impl FontStorage {
    /// Handle stored under `url`.
    pub fn font(&self, url: &str) -> Option<Arc<dyn FontHandle>> {
        self.loaded_font.get(url).map(Arc::clone)
    }

    /// Whether a font, binary or inserted, is stored under `url`.
    pub fn contains(&self, url: &str) -> bool {
        self.loaded_font.contains_key(url)
    }

    /// Whether no font is stored.
    pub fn is_empty(&self) -> bool {
        self.loaded_font.is_empty()
    }

    /// Number of stored fonts.
    pub fn len(&self) -> usize {
        self.loaded_font.len()
    }

    /// Face info of a binary font loaded for `url`.
    pub fn face(&self, url: &str) -> Option<&fontdb::FaceInfo> {
        self.font_db.face(*self.faces.get(url)?)
    }

    /// Copies the handles for `urls` that are present.
    pub fn snapshot<'a>(&self, urls: impl IntoIterator<Item = &'a str>) -> FontSet {
        let mut set = FontSet::default();
        for url in urls {
            if let Some(font) = self.font(url) {
                set.fonts.insert(url.to_string(), font);
            }
        }
        set
    }
}

/// Fonts resolved for one frame.
///
/// Compilation reads from this copy so the storage lock is never held while
/// features are compiled.
#[derive(Clone, Default)]
pub struct FontSet {
    fonts: HashMap<String, Arc<dyn FontHandle>, fxhash::FxBuildHasher>,
}

impl FontSet {
    /// Font resolved for `url` in this frame, if any.
    pub fn get(&self, url: &str) -> Option<Arc<dyn FontHandle>> {
        self.fonts.get(url).map(Arc::clone)
    }

    /// Number of resolved fonts.
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    /// Whether no font resolved.
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}
