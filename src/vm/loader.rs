// Program image loading: little-endian 16-bit words

use std::fs;
use std::path::Path;

use log::info;

use super::error::LoadError;
use super::memory::Memory;
use crate::config::MEMORY_SIZE;

/// Splits raw bytes into little-endian words
pub fn load_image(bytes: &[u8]) -> Result<Vec<u16>, LoadError> {
    if bytes.len() % 2 != 0 {
        return Err(LoadError::OddLength(bytes.len()));
    }
    let words: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    if words.len() > MEMORY_SIZE {
        return Err(LoadError::TooLarge(words.len()));
    }
    Ok(words)
}

/// Reads a program file straight into boot memory
pub fn load_file(path: &Path) -> Result<Memory, LoadError> {
    let bytes = fs::read(path)?;
    let words = load_image(&bytes)?;
    info!(target: "vm", "Loaded {} words from {}", words.len(), path.display());
    Memory::from_image(&words)
}
