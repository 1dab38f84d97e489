//! Index file metadata page.
//!
//! The first page (page 0) of the index file records what the tree
//! cannot rediscover from its own nodes: which page currently holds the
//! root, and the branching factor the file was created with. The root id
//! migrates whenever the root splits, so descent after a re-open must go
//! through this page rather than assume a fixed root location.

use crate::error::{IndexError, Result};
use crate::types::{PageId, PAGE_SIZE};

/// Magic bytes to identify a valid index file
pub const MAGIC: &[u8; 16] = b"BPlusIndexV01\0\0\0";

/// Metadata page size (uses the whole first page)
pub const META_PAGE_SIZE: usize = PAGE_SIZE;

/// Index file metadata page
///
/// Layout (all multi-byte fields little-endian):
/// ```text
/// Offset  Size  Description
/// 0       16    Magic string "BPlusIndexV01\0\0\0"
/// 16      4     Page size (currently always 4096)
/// 20      4     Degree (branching factor, fixed at creation)
/// 24      8     Root page id (i64, -1 before the first root exists)
/// 32      4     Checksum of bytes [0, 32) (CRC32)
/// ```
#[derive(Debug, Clone, Copy)]
pub struct MetaPage {
    /// Page size in bytes
    pub page_size: u32,
    /// Branching factor the file was created with
    pub degree: u32,
    /// Page currently holding the root node
    pub root_page: PageId,
}

impl MetaPage {
    /// Create a metadata page for a fresh index file
    pub fn new(degree: usize) -> Self {
        Self {
            page_size: PAGE_SIZE as u32,
            degree: degree as u32,
            root_page: PageId::NONE,
        }
    }

    /// Read a metadata page from bytes
    pub fn read(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 36 {
            return Err(IndexError::invalid_file("metadata page too short"));
        }

        if &bytes[0..16] != MAGIC {
            return Err(IndexError::invalid_file("invalid magic bytes"));
        }

        let page_size = u32::from_le_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);
        let degree = u32::from_le_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]);

        let mut buf = [0u8; 8];
        buf.copy_from_slice(&bytes[24..32]);
        let root_page = PageId::from_le_bytes(buf);

        let stored_checksum = u32::from_le_bytes([bytes[32], bytes[33], bytes[34], bytes[35]]);
        let computed_checksum = crc32fast::hash(&bytes[0..32]);
        if stored_checksum != computed_checksum {
            return Err(IndexError::corruption("metadata checksum mismatch"));
        }

        if page_size != PAGE_SIZE as u32 {
            return Err(IndexError::invalid_file(format!(
                "unsupported page size: {} (expected {})",
                page_size, PAGE_SIZE
            )));
        }

        Ok(Self {
            page_size,
            degree,
            root_page,
        })
    }

    /// Write this metadata page to bytes
    pub fn write(&self, bytes: &mut [u8]) {
        bytes[..META_PAGE_SIZE].fill(0);

        bytes[0..16].copy_from_slice(MAGIC);
        bytes[16..20].copy_from_slice(&self.page_size.to_le_bytes());
        bytes[20..24].copy_from_slice(&self.degree.to_le_bytes());
        bytes[24..32].copy_from_slice(&self.root_page.to_le_bytes());

        let checksum = crc32fast::hash(&bytes[0..32]);
        bytes[32..36].copy_from_slice(&checksum.to_le_bytes());
    }
}
