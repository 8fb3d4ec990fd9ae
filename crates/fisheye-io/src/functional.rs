use std::path::{Path, PathBuf};

use fisheye_image::{Image, ImageSize};

use crate::error::IoError;

/// File extensions recognised as images when listing a directory.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "tiff"];

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

fn decode(file_path: &Path) -> Result<image::DynamicImage, IoError> {
    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path.to_path_buf()));
    }

    let img = image::ImageReader::open(file_path)?
        .with_guessed_format()?
        .decode()?;

    Ok(img)
}

/// Reads an RGB8 image from the given file path.
///
/// Any format supported by the image crate is accepted; grayscale and alpha images
/// are converted to RGB.
///
/// # Arguments
///
/// * `file_path` - The path to a valid image file.
///
/// # Returns
///
/// An image containing the RGB8 pixel data.
pub fn read_image_any_rgb8(file_path: impl AsRef<Path>) -> Result<Image<u8, 3>, IoError> {
    let img = decode(file_path.as_ref())?;

    let size = ImageSize {
        width: img.width() as usize,
        height: img.height() as usize,
    };

    Ok(Image::new(size, img.into_rgb8().into_raw())?)
}

/// Reads a grayscale image from the given file path, converting color images.
pub fn read_image_any_gray8(file_path: impl AsRef<Path>) -> Result<Image<u8, 1>, IoError> {
    let img = decode(file_path.as_ref())?;

    let size = ImageSize {
        width: img.width() as usize,
        height: img.height() as usize,
    };

    Ok(Image::new(size, img.into_luma8().into_raw())?)
}

/// Writes an RGB8 image, choosing the encoder from the file extension.
///
/// # Arguments
///
/// * `file_path` - The output path, e.g. `out.png` or `out.jpg`.
/// * `image` - The image to write.
pub fn write_image_rgb8(file_path: impl AsRef<Path>, image: &Image<u8, 3>) -> Result<(), IoError> {
    write_buffer(
        file_path.as_ref(),
        image.as_slice(),
        image.size(),
        image::ExtendedColorType::Rgb8,
    )
}

/// Writes a grayscale image, choosing the encoder from the file extension.
pub fn write_image_gray8(file_path: impl AsRef<Path>, image: &Image<u8, 1>) -> Result<(), IoError> {
    write_buffer(
        file_path.as_ref(),
        image.as_slice(),
        image.size(),
        image::ExtendedColorType::L8,
    )
}

fn write_buffer(
    file_path: &Path,
    data: &[u8],
    size: ImageSize,
    color: image::ExtendedColorType,
) -> Result<(), IoError> {
    if !has_image_extension(file_path) {
        return Err(IoError::InvalidFileExtension(file_path.to_path_buf()));
    }

    image::save_buffer(
        file_path,
        data,
        size.width as u32,
        size.height as u32,
        color,
    )?;

    log::debug!("wrote {} image to {}", size, file_path.display());

    Ok(())
}

/// List the image files of a directory, sorted by path.
///
/// Only regular files with one of [`IMAGE_EXTENSIONS`] are returned; the listing
/// is not recursive.
pub fn list_images(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, IoError> {
    let dir = dir.as_ref();
    if !dir.exists() {
        return Err(IoError::FileDoesNotExist(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(IoError::NotADirectory(dir.to_path_buf()));
    }

    let mut paths = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter(|p| p.is_file() && has_image_extension(p))
        .collect::<Vec<_>>();

    paths.sort();

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_read_png() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("image.png");

        let data = (0..4 * 3 * 3).map(|v| v as u8).collect::<Vec<_>>();
        let image = Image::<u8, 3>::new(
            ImageSize {
                width: 4,
                height: 3,
            },
            data,
        )?;
        write_image_rgb8(&file_path, &image)?;

        let back = read_image_any_rgb8(&file_path)?;
        assert_eq!(back, image);

        let gray = read_image_any_gray8(&file_path)?;
        assert_eq!(gray.size(), image.size());
        Ok(())
    }

    #[test]
    fn write_read_gray_png() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("gray.png");
        let image = Image::<u8, 1>::new([3, 2].into(), vec![0, 50, 100, 150, 200, 250])?;
        write_image_gray8(&file_path, &image)?;
        assert_eq!(read_image_any_gray8(&file_path)?, image);

        // gray images are expanded to rgb
        let rgb = read_image_any_rgb8(&file_path)?;
        assert_eq!(&rgb.as_slice()[3..6], &[50, 50, 50]);
        Ok(())
    }

    #[test]
    fn missing_file_and_bad_extension() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        assert!(matches!(
            read_image_any_rgb8(tmp_dir.path().join("missing.png")),
            Err(IoError::FileDoesNotExist(_))
        ));

        let image = Image::<u8, 3>::from_size_val([2, 2].into(), 0)?;
        assert!(matches!(
            write_image_rgb8(tmp_dir.path().join("image.txt"), &image),
            Err(IoError::InvalidFileExtension(_))
        ));
        Ok(())
    }

    #[test]
    fn list_images_sorted() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let image = Image::<u8, 1>::from_size_val([2, 2].into(), 0)?;
        for name in ["b.png", "a.PNG", "c.jpg"] {
            write_image_gray8(tmp_dir.path().join(name), &image)?;
        }
        std::fs::write(tmp_dir.path().join("notes.txt"), "not an image")?;
        std::fs::create_dir(tmp_dir.path().join("sub.png"))?;

        let names = list_images(tmp_dir.path())?
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(String::from))
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["a.PNG", "b.png", "c.jpg"]);

        assert!(matches!(
            list_images(tmp_dir.path().join("a.PNG")),
            Err(IoError::NotADirectory(_))
        ));
        Ok(())
    }
}
