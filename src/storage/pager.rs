//! Pager implementation.
//!
//! The pager treats a single regular file as a growable array of
//! fixed-size pages and mediates all disk I/O for the tree. There is no
//! page cache: every read hits the file, and every write is flushed to
//! stable storage before it returns (unless durability is explicitly
//! turned off).

use crate::error::{IndexError, Result};
use crate::page::PageBuf;
use crate::storage::MetaPage;
use crate::types::{PageId, PAGE_SIZE};
use log::debug;
use parking_lot::RwLock;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// File-backed page store
pub struct Pager {
    /// The index file
    file: RwLock<File>,
    /// The metadata page (cached)
    meta: RwLock<MetaPage>,
    /// Tracked file length in bytes, always a multiple of PAGE_SIZE
    file_len: RwLock<u64>,
    /// Whether to flush each write to stable storage
    sync_on_write: bool,
}

impl Pager {
    /// Open or create an index file
    ///
    /// A fresh (empty) file gets a metadata page stamped with `degree`;
    /// an existing file's metadata page is validated and its stored
    /// degree takes precedence.
    pub fn open(path: &Path, degree: usize, sync_on_write: bool) -> Result<Self> {
        let io_open = |source| IndexError::IoOpen {
            path: path.to_path_buf(),
            source,
        };

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(io_open)?;

        let file_len = file.metadata().map_err(io_open)?.len();
        if file_len % PAGE_SIZE as u64 != 0 {
            return Err(IndexError::invalid_file(format!(
                "file length {} is not a multiple of the page size",
                file_len
            )));
        }

        let pager = Self {
            file: RwLock::new(file),
            meta: RwLock::new(MetaPage::new(degree)),
            file_len: RwLock::new(file_len),
            sync_on_write,
        };

        if file_len == 0 {
            // Fresh file: stamp the degree before anything is written.
            crate::types::validate_degree(degree)?;
            *pager.file_len.write() = PAGE_SIZE as u64;
            pager.flush_meta()?;
            debug!("created index file {} (degree {})", path.display(), degree);
        } else {
            let mut buf = PageBuf::new();
            pager.read_raw(PageId::META, buf.as_bytes_mut())?;
            let meta = MetaPage::read(buf.as_bytes())?;
            *pager.meta.write() = meta;
            debug!(
                "opened index file {} ({} pages, degree {}, root {})",
                path.display(),
                pager.num_pages(),
                meta.degree,
                meta.root_page
            );
        }

        Ok(pager)
    }

    /// Number of pages in the file, metadata page included
    pub fn num_pages(&self) -> i64 {
        (*self.file_len.read() / PAGE_SIZE as u64) as i64
    }

    /// Branching factor recorded in the metadata page
    pub fn degree(&self) -> usize {
        self.meta.read().degree as usize
    }

    /// Page currently holding the root node (NONE before the tree exists)
    pub fn root_page(&self) -> PageId {
        self.meta.read().root_page
    }

    /// Record a new root page id and persist the metadata page
    pub fn set_root_page(&self, page_id: PageId) -> Result<()> {
        self.meta.write().root_page = page_id;
        self.flush_meta()
    }

    /// Read a tree page into a fresh buffer
    pub fn read_page(&self, page_id: PageId) -> Result<PageBuf> {
        if !page_id.is_some() {
            return Err(IndexError::invalid_operation("cannot read the null page"));
        }
        if page_id == PageId::META {
            return Err(IndexError::invalid_operation(
                "page 0 is the metadata page, not a tree page",
            ));
        }

        let num_pages = self.num_pages();
        if page_id.value() >= num_pages {
            return Err(IndexError::ReadPastEnd { page_id, num_pages });
        }

        let mut buf = PageBuf::new();
        self.read_raw(page_id, buf.as_bytes_mut())?;
        Ok(buf)
    }

    /// Write a tree page and flush it to stable storage
    pub fn write_page(&self, page_id: PageId, data: &[u8]) -> Result<()> {
        if !page_id.is_some() {
            return Err(IndexError::invalid_operation("cannot write the null page"));
        }
        if page_id == PageId::META {
            return Err(IndexError::invalid_operation(
                "page 0 is the metadata page, not a tree page",
            ));
        }
        if data.len() != PAGE_SIZE {
            return Err(IndexError::invalid_operation(format!(
                "page data must be {} bytes, got {}",
                PAGE_SIZE,
                data.len()
            )));
        }

        self.write_raw(page_id, data)?;

        // A write past the current tail grows the file.
        let end = page_id.file_offset(PAGE_SIZE) + PAGE_SIZE as u64;
        let mut file_len = self.file_len.write();
        if end > *file_len {
            *file_len = end;
        }

        Ok(())
    }

    /// Append one zero-filled page to the file and return its id
    pub fn allocate_page(&self) -> Result<PageId> {
        let page_id = PageId::new(self.num_pages());
        let zeros = [0u8; PAGE_SIZE];
        self.write_raw(page_id, &zeros)?;
        *self.file_len.write() += PAGE_SIZE as u64;
        Ok(page_id)
    }

    /// Flush the metadata page and sync all file data
    pub fn sync(&self) -> Result<()> {
        self.flush_meta()?;
        let file = self.file.write();
        file.sync_all().map_err(|source| IndexError::IoWrite {
            page_id: PageId::META,
            offset: 0,
            source,
        })
    }

    /// Rewrite the metadata page from the cached copy
    fn flush_meta(&self) -> Result<()> {
        let mut buf = PageBuf::new();
        self.meta.read().write(buf.as_bytes_mut());
        self.write_raw(PageId::META, buf.as_bytes())
    }

    fn read_raw(&self, page_id: PageId, buf: &mut [u8]) -> Result<()> {
        let offset = page_id.file_offset(PAGE_SIZE);
        let io_read = |source| IndexError::IoRead {
            page_id,
            offset,
            source,
        };

        let mut file = self.file.write();
        file.seek(SeekFrom::Start(offset)).map_err(io_read)?;
        file.read_exact(buf).map_err(io_read)
    }

    fn write_raw(&self, page_id: PageId, data: &[u8]) -> Result<()> {
        let offset = page_id.file_offset(PAGE_SIZE);
        let io_write = |source| IndexError::IoWrite {
            page_id,
            offset,
            source,
        };

        let mut file = self.file.write();
        file.seek(SeekFrom::Start(offset)).map_err(io_write)?;
        file.write_all(data).map_err(io_write)?;

        if self.sync_on_write {
            file.sync_data().map_err(io_write)?;
        }

        Ok(())
    }
}
