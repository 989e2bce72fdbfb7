//! Host capabilities the core consumes: file access, a diagnostic sink and
//! image decoding.

use log::error;
use macroquad::prelude::Image;
use std::io;
use std::path::{Path, PathBuf};

/// File access and diagnostic output provided by the host.
pub trait Platform {
    /// Read a whole file as UTF-8.
    fn read_text_file(&self, path: &Path) -> io::Result<String>;

    /// Read a whole file as bytes.
    fn read_binary_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Surface a diagnostic to the user (shader logs, fatal load errors).
    fn print_output(&self, text: &str);
}

/// Decoded RGBA8 image, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}

/// Turns encoded image bytes (PNG, ...) into RGBA8 pixels.
pub trait ImageDecoder {
    /// Decode `bytes`, or describe why they cannot be decoded.
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, String>;
}

/// Reads assets from the local file system, relative to `root`.
#[derive(Debug, Clone)]
pub struct FsPlatform {
    root: PathBuf,
}

impl FsPlatform {
    /// Resolve every path against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsPlatform { root: root.into() }
    }

    /// Asset root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl Platform for FsPlatform {
    fn read_text_file(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(self.resolve(path))
    }

    fn read_binary_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(self.resolve(path))
    }

    fn print_output(&self, text: &str) {
        error!("{}", text.trim_end());
        eprint!("{text}");
    }
}

/// Decoder backed by macroquad's `Image` loader.
#[derive(Debug, Clone, Copy, Default)]
pub struct MacroquadImageDecoder;

impl ImageDecoder for MacroquadImageDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, String> {
        let img = Image::from_file_with_format(bytes, None).map_err(|e| format!("{e:?}"))?;
        Ok(DecodedImage {
            width: img.width as u32,
            height: img.height as u32,
            pixels: img.bytes,
        })
    }
}
