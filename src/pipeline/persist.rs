use crate::{
    error::{CoverError, Result},
    models::ImageSet,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory name for a title: spaces become underscores, and so does every
/// character that would escape the output root or trip common filesystems.
pub fn title_dir_name(title: &str) -> String {
    let name: String = title
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match name.as_str() {
        "" | "." | ".." => "_".repeat(name.len().max(1)),
        _ => name,
    }
}

pub fn cover_file_name(number: usize) -> String {
    format!("cover_{}.png", number)
}

pub fn description_file_name(number: usize) -> String {
    format!("description_{}.txt", number)
}

/// Where cover `number` (1-based) of `title` lands under `root`.
pub fn cover_path(root: &Path, title: &str, number: usize) -> PathBuf {
    root.join(title_dir_name(title)).join(cover_file_name(number))
}

/// Write every cover and its description under `root`:
/// `<root>/<title>/cover_<n>.png` and `<root>/<title>/description_<n>.txt`.
///
/// Files from an earlier run with the same title and number are overwritten.
pub fn save(images: &ImageSet, root: &Path) -> Result<PathBuf> {
    fs::create_dir_all(root).map_err(|e| CoverError::io(root, e))?;

    for (title, covers) in images.iter() {
        let book_dir = root.join(title_dir_name(title));
        fs::create_dir_all(&book_dir).map_err(|e| CoverError::io(&book_dir, e))?;

        for (index, cover) in covers.iter().enumerate() {
            let number = index + 1;

            let image_path = book_dir.join(cover_file_name(number));
            fs::write(&image_path, &cover.bytes).map_err(|e| CoverError::io(&image_path, e))?;

            let description_path = book_dir.join(description_file_name(number));
            fs::write(&description_path, cover.description.as_bytes())
                .map_err(|e| CoverError::io(&description_path, e))?;
        }

        log::debug!("Saved {} covers to {}", covers.len(), book_dir.display());
    }

    Ok(root.to_path_buf())
}
