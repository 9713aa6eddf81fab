pub mod get_wallpaper;
pub mod list_categories;
pub mod list_wallpapers;
pub mod search_wallpapers;

pub use get_wallpaper::{GetWallpaperError, GetWallpaperQuery};
pub use list_categories::{ListCategoriesError, ListCategoriesQuery};
pub use list_wallpapers::{ListWallpapersError, ListWallpapersQuery};
pub use search_wallpapers::{SearchWallpapersError, SearchWallpapersQuery};

use wallpaper_common::WallpaperError;

/// Wallpapers per public page
pub const PAGE_SIZE: i64 = 30;

/// Rows to skip for a 1-based page
///
/// Pages whose offset does not fit in an `i64` are rejected as invalid.
pub(crate) fn page_offset(page: i64) -> Result<i64, WallpaperError> {
    WallpaperError::check_page(page)?;
    (page - 1)
        .checked_mul(PAGE_SIZE)
        .ok_or(WallpaperError::InvalidPage(page))
}

/// Columns selected into `CatalogEntry`
pub(crate) const WALLPAPER_COLUMNS: &str = "id, category_id, created_at, width, height, color, \
     blur_hash, description, image_url, likes, is_premium";
