//! Extension-based file categorization.
//!
//! A [`CategoryMap`] maps lowercase file extensions (without the leading dot)
//! to category folder names, falling back to a default category for anything
//! it does not know. The map is an ordinary value: build one, adjust it, and
//! hand it to the organizer.
//!
//! # Examples
//!
//! ```
//! use downtidy::file_category::CategoryMap;
//!
//! let map = CategoryMap::default();
//! assert_eq!(map.category_for("png"), "Images");
//! assert_eq!(map.category_for("PDF"), "PDFs");
//! assert_eq!(map.category_for("xyz"), "Other");
//! ```

use std::collections::{BTreeSet, HashMap};

/// Category used when an extension is unknown or missing.
pub const DEFAULT_CATEGORY: &str = "Other";

/// Maps file extensions to category folder names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMap {
    extension_map: HashMap<String, String>,
    default_category: String,
}

impl CategoryMap {
    /// Creates a `CategoryMap` with the standard downloads-folder scheme.
    pub fn new() -> Self {
        let mut map = Self::empty(DEFAULT_CATEGORY);
        map.populate_standard_mappings();
        map
    }

    /// Creates a map with no extension mappings at all.
    ///
    /// Every lookup returns `default_category` until mappings are added.
    pub fn empty(default_category: &str) -> Self {
        Self {
            extension_map: HashMap::new(),
            default_category: default_category.to_string(),
        }
    }

    fn populate_standard_mappings(&mut self) {
        // Videos
        for ext in ["mp4", "mkv", "mov", "avi", "flv", "wmv", "m4v"] {
            self.add_extension_mapping(ext, "Videos");
        }

        // Images
        for ext in [
            "jpg", "jpeg", "png", "gif", "webp", "heic", "svg", "bmp", "tif", "tiff",
        ] {
            self.add_extension_mapping(ext, "Images");
        }

        // PDFs get their own folder, other documents share one
        self.add_extension_mapping("pdf", "PDFs");
        for ext in [
            "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "md", "rtf",
        ] {
            self.add_extension_mapping(ext, "Documents");
        }

        // Archives
        for ext in ["zip", "tar", "gz", "tgz", "bz2", "rar", "7z"] {
            self.add_extension_mapping(ext, "Archives");
        }

        // Apps and installers
        for ext in ["dmg", "pkg", "exe", "apk"] {
            self.add_extension_mapping(ext, "Apps");
        }

        // Code
        for ext in ["py", "js", "java", "class", "jar"] {
            self.add_extension_mapping(ext, "Code");
        }

        // Audio
        for ext in ["mp3", "wav", "flac", "m4a"] {
            self.add_extension_mapping(ext, "Audio");
        }
    }

    /// Adds (or replaces) an extension to category mapping.
    ///
    /// The extension is lowercased and a single leading `.` is dropped, so
    /// `".JPG"` and `"jpg"` name the same key.
    pub fn add_extension_mapping(&mut self, ext: &str, category: &str) {
        self.extension_map
            .insert(normalize_extension(ext), category.to_string());
    }

    /// Removes an extension mapping, returning the category it pointed to.
    pub fn remove_extension_mapping(&mut self, ext: &str) -> Option<String> {
        self.extension_map.remove(&normalize_extension(ext))
    }

    /// Replaces the fallback category.
    pub fn set_default_category(&mut self, category: &str) {
        self.default_category = category.to_string();
    }

    /// Returns the mapped category for an extension, if there is one.
    ///
    /// # Examples
    ///
    /// ```
    /// use downtidy::file_category::CategoryMap;
    ///
    /// let map = CategoryMap::default();
    /// assert_eq!(map.lookup("Mp3"), Some("Audio"));
    /// assert_eq!(map.lookup("unknown"), None);
    /// ```
    pub fn lookup(&self, ext: &str) -> Option<&str> {
        self.extension_map
            .get(&ext.to_lowercase())
            .map(String::as_str)
    }

    /// Returns the category for an extension.
    ///
    /// Lookup is case-insensitive. Unknown and empty extensions yield the
    /// default category. This never fails.
    pub fn category_for(&self, ext: &str) -> &str {
        self.lookup(ext).unwrap_or(&self.default_category)
    }

    /// The fallback category.
    pub fn default_category(&self) -> &str {
        &self.default_category
    }

    /// All distinct category names, including the default, sorted.
    pub fn categories(&self) -> Vec<&str> {
        let mut names: BTreeSet<&str> = self.extension_map.values().map(String::as_str).collect();
        names.insert(&self.default_category);
        names.into_iter().collect()
    }

    /// Number of extension mappings.
    pub fn len(&self) -> usize {
        self.extension_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extension_map.is_empty()
    }
}

impl Default for CategoryMap {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.strip_prefix('.').unwrap_or(ext).to_lowercase()
}
