//! Storage-facing records and the external API shapes they are mapped from
//!
//! `SourcePhoto` / `SourceCollection` mirror the Unsplash JSON payloads (only the
//! fields we read). `CatalogEntry` / `CollectionEntry` are the documents written
//! to the catalog, keyed by the external id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Image URLs of a photo at different renditions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoUrls {
    #[serde(default)]
    pub raw: String,
    #[serde(default)]
    pub full: String,
    #[serde(default)]
    pub regular: String,
    #[serde(default)]
    pub small: String,
    #[serde(default)]
    pub thumb: String,
}

impl PhotoUrls {
    /// Best available full-size rendition
    pub fn best(&self) -> &str {
        [&self.full, &self.raw, &self.regular, &self.small, &self.thumb]
            .into_iter()
            .find(|url| !url.is_empty())
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// A photo as returned by the source API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourcePhoto {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub width: i32,
    #[serde(default)]
    pub height: i32,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub blur_hash: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub alt_description: Option<String>,
    #[serde(default)]
    pub urls: PhotoUrls,
    #[serde(default)]
    pub likes: i32,
    #[serde(default)]
    pub premium: Option<bool>,
    #[serde(default)]
    pub plus: Option<bool>,
}

/// A collection as returned by the source API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceCollection {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub total_photos: u32,
    #[serde(default)]
    pub cover_photo: Option<SourcePhoto>,
}

/// Wallpaper document (`wallpapers` table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CatalogEntry {
    #[serde(rename = "_id")]
    pub id: String,
    pub category_id: String,
    /// Milliseconds since the Unix epoch
    pub created_at: i64,
    pub width: i32,
    pub height: i32,
    pub color: String,
    pub blur_hash: String,
    pub description: String,
    pub image_url: String,
    pub likes: i32,
    pub is_premium: bool,
}

impl CatalogEntry {
    pub fn from_source(photo: &SourcePhoto, category_id: &str) -> Self {
        Self {
            id: photo.id.clone(),
            category_id: category_id.to_string(),
            created_at: photo
                .created_at
                .map(|at| at.timestamp_millis())
                .unwrap_or_default(),
            width: photo.width,
            height: photo.height,
            color: photo.color.clone().unwrap_or_default(),
            blur_hash: photo.blur_hash.clone().unwrap_or_default(),
            description: photo
                .description
                .clone()
                .or_else(|| photo.alt_description.clone())
                .unwrap_or_default(),
            image_url: photo.urls.best().to_string(),
            likes: photo.likes,
            is_premium: photo.premium.or(photo.plus).unwrap_or(false),
        }
    }
}

/// Category document (`wallpaper_categories` table)
///
/// Also used as the record kept in the checkpoint's `collections` list, so
/// every field but the id tolerates being absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CollectionEntry {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub cover_photo: String,
    #[serde(default)]
    pub blur_hash: String,
}

impl CollectionEntry {
    pub fn from_source(collection: &SourceCollection) -> Self {
        let cover = collection.cover_photo.as_ref();
        Self {
            id: collection.id.clone(),
            title: collection.title.clone(),
            cover_photo: cover
                .map(|photo| photo.urls.regular.clone())
                .unwrap_or_default(),
            blur_hash: cover
                .and_then(|photo| photo.blur_hash.clone())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn unsplash_photo() -> serde_json::Value {
        json!({
            "id": "LBI7cgq3pbM",
            "created_at": "2016-05-03T11:00:28-04:00",
            "width": 5245,
            "height": 3497,
            "color": "#60544D",
            "blur_hash": "LoC%a7IoIVxZ_NM|M{s:%hRjWAo0",
            "description": null,
            "alt_description": "green leaves",
            "likes": 12,
            "urls": {
                "raw": "https://images.unsplash.com/photo-1?ixid=raw",
                "full": "https://images.unsplash.com/photo-1?ixid=full",
                "regular": "https://images.unsplash.com/photo-1?w=1080",
                "small": "https://images.unsplash.com/photo-1?w=400",
                "thumb": "https://images.unsplash.com/photo-1?w=200"
            },
            "user": { "username": "ignored" }
        })
    }

    #[test]
    fn test_catalog_entry_from_unsplash_photo() {
        let photo: SourcePhoto = serde_json::from_value(unsplash_photo()).unwrap();
        let entry = CatalogEntry::from_source(&photo, "C1");

        assert_eq!(entry.id, "LBI7cgq3pbM");
        assert_eq!(entry.category_id, "C1");
        // 2016-05-03T15:00:28Z
        assert_eq!(entry.created_at, 1_462_287_628_000);
        assert_eq!(entry.width, 5245);
        assert_eq!(entry.color, "#60544D");
        assert_eq!(entry.description, "green leaves");
        assert_eq!(entry.image_url, "https://images.unsplash.com/photo-1?ixid=full");
        assert_eq!(entry.likes, 12);
        assert!(!entry.is_premium);
    }

    #[test]
    fn test_catalog_entry_premium_flags() {
        let mut photo = SourcePhoto {
            id: "p".into(),
            plus: Some(true),
            ..Default::default()
        };
        assert!(CatalogEntry::from_source(&photo, "c").is_premium);

        photo.premium = Some(false);
        assert!(!CatalogEntry::from_source(&photo, "c").is_premium);
    }

    #[test]
    fn test_catalog_entry_serializes_mongo_style_id() {
        let photo = SourcePhoto {
            id: "abc".into(),
            ..Default::default()
        };
        let value = serde_json::to_value(CatalogEntry::from_source(&photo, "c")).unwrap();
        assert_eq!(value["_id"], "abc");
        assert!(value.get("id").is_none());
        assert_eq!(value["image_url"], "");
    }

    #[test]
    fn test_collection_entry_from_source() {
        let collection: SourceCollection = serde_json::from_value(json!({
            "id": "317099",
            "title": "Nature",
            "total_photos": 120,
            "cover_photo": unsplash_photo()
        }))
        .unwrap();

        let entry = CollectionEntry::from_source(&collection);
        assert_eq!(entry.id, "317099");
        assert_eq!(entry.title, "Nature");
        assert_eq!(entry.cover_photo, "https://images.unsplash.com/photo-1?w=1080");
        assert_eq!(entry.blur_hash, "LoC%a7IoIVxZ_NM|M{s:%hRjWAo0");
    }

    #[test]
    fn test_collection_entry_accepts_bare_id() {
        let entry: CollectionEntry = serde_json::from_value(json!({ "_id": "C9" })).unwrap();
        assert_eq!(entry.id, "C9");
        assert!(entry.title.is_empty());
    }
}
