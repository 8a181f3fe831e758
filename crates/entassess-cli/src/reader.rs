//! Sample-file loading.
//!
//! Input files carry one symbol per byte (optionally masked to the low
//! `bits_per_symbol` bits) or one symbol per little-endian `u32` word. A
//! window selector picks the `index`-th disjoint run of `size` symbols, so
//! large captures can be assessed piecewise without splitting files.

use std::fs;
use std::path::Path;

use entassess_core::{Error, Result};

/// How symbols are packed in the input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolFormat {
    /// One symbol per byte, masked to the low `bits` bits.
    Byte { bits: u32 },
    /// One symbol per 4-byte little-endian word.
    U32Le,
}

impl SymbolFormat {
    pub fn from_flags(word: bool, bits_per_symbol: u32) -> Result<Self> {
        if word {
            return Ok(Self::U32Le);
        }
        if !(1..=8).contains(&bits_per_symbol) {
            return Err(Error::OutOfRange(format!(
                "bits-per-symbol = {bits_per_symbol} not in 1..=8"
            )));
        }
        Ok(Self::Byte {
            bits: bits_per_symbol,
        })
    }
}

/// Load a sample file, optionally restricted to one window.
///
/// `window = (index, size)` selects symbols `[index·size, (index+1)·size)`
/// after decoding; selecting past the end of the file is an error rather
/// than a short read.
pub fn load_symbols(
    path: &Path,
    format: SymbolFormat,
    window: Option<(usize, usize)>,
) -> Result<Vec<u32>> {
    let bytes = fs::read(path)
        .map_err(|e| Error::Io(format!("{}: {e}", path.display())))?;

    let mut symbols: Vec<u32> = match format {
        SymbolFormat::Byte { bits } => {
            let mask = if bits == 8 { 0xff } else { (1u32 << bits) - 1 };
            bytes.iter().map(|&b| u32::from(b) & mask).collect()
        }
        SymbolFormat::U32Le => {
            if bytes.len() % 4 != 0 {
                log::warn!(
                    "{}: {} trailing byte(s) ignored in u32 mode",
                    path.display(),
                    bytes.len() % 4
                );
            }
            bytes
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect()
        }
    };

    if symbols.is_empty() {
        return Err(Error::InvalidInput(format!(
            "{}: no symbols decoded",
            path.display()
        )));
    }

    if let Some((index, size)) = window {
        if size == 0 {
            return Err(Error::OutOfRange("window size must be at least 1".to_string()));
        }
        let start = index
            .checked_mul(size)
            .ok_or_else(|| Error::OutOfRange("window offset overflows".to_string()))?;
        let end = start + size;
        if end > symbols.len() {
            return Err(Error::OutOfRange(format!(
                "window {index} of {size} symbols needs {end}, file has {}",
                symbols.len()
            )));
        }
        symbols = symbols[start..end].to_vec();
    }

    Ok(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(bytes: &[u8]) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "entassess-reader-{}-{}.bin",
            std::process::id(),
            bytes.len()
        ));
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(bytes).unwrap();
        path
    }

    #[test]
    fn byte_format_masks_low_bits() {
        let path = temp_file(&[0xff, 0x03, 0x81]);
        let syms = load_symbols(&path, SymbolFormat::Byte { bits: 2 }, None).unwrap();
        assert_eq!(syms, vec![3, 3, 1]);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn u32_format_reads_little_endian_words() {
        let path = temp_file(&[0x01, 0x00, 0x00, 0x00, 0xff, 0xff, 0x00, 0x00, 0xaa]);
        let syms = load_symbols(&path, SymbolFormat::U32Le, None).unwrap();
        assert_eq!(syms, vec![1, 0xffff]);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn window_selects_a_disjoint_run() {
        let path = temp_file(&[0, 1, 2, 3, 4, 5, 6, 7]);
        let syms = load_symbols(&path, SymbolFormat::Byte { bits: 8 }, Some((1, 3))).unwrap();
        assert_eq!(syms, vec![3, 4, 5]);
        assert!(load_symbols(&path, SymbolFormat::Byte { bits: 8 }, Some((2, 3))).is_err());
        fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let r = load_symbols(
            Path::new("/nonexistent/entassess.bin"),
            SymbolFormat::U32Le,
            None,
        );
        assert!(matches!(r, Err(Error::Io(_))));
    }

    #[test]
    fn bits_per_symbol_range_checked() {
        assert!(SymbolFormat::from_flags(false, 0).is_err());
        assert!(SymbolFormat::from_flags(false, 9).is_err());
        assert_eq!(
            SymbolFormat::from_flags(true, 8).unwrap(),
            SymbolFormat::U32Le
        );
    }
}
