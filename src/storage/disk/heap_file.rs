use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::debug;
use parking_lot::Mutex;
use thiserror::Error;

use crate::common::types::{PAGE_SIZE, PageId, TableId};
use crate::storage::page::HeapPage;

#[derive(Error, Debug)]
pub enum HeapFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("page {page_no} out of range for table {table_id} ({num_pages} pages)")]
    PageOutOfBounds {
        table_id: TableId,
        page_no: u32,
        num_pages: u32,
    },
}

/// One table's on-disk storage: a dense sequence of fixed-size pages. The
/// file length is always an exact multiple of the page size; page numbers
/// are zero-based offsets into that sequence.
pub struct HeapFile {
    db_file: Mutex<File>,
    table_id: TableId,
    path: PathBuf,
}

impl HeapFile {
    /// Open (or create) the backing file for a table.
    pub fn open(path: impl AsRef<Path>, table_id: TableId) -> Result<Self, HeapFileError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;

        Ok(Self {
            db_file: Mutex::new(file),
            table_id,
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Stable identifier of this table, assigned by the catalog.
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn num_pages(&self) -> Result<u32, HeapFileError> {
        let file = self.db_file.lock();
        Ok(Self::page_count(&file)?)
    }

    /// Read one page into the caller's buffer. Reading past the end of the
    /// file is an error, never an implicit extension.
    pub fn read_page(&self, page_no: u32, buf: &mut [u8; PAGE_SIZE]) -> Result<(), HeapFileError> {
        let mut file = self.db_file.lock();
        let num_pages = Self::page_count(&file)?;
        if page_no >= num_pages {
            return Err(HeapFileError::PageOutOfBounds {
                table_id: self.table_id,
                page_no,
                num_pages,
            });
        }

        file.seek(SeekFrom::Start(Self::page_offset(page_no)))?;
        file.read_exact(buf)?;
        Ok(())
    }

    /// Overwrite exactly one page. Writing page `num_pages` appends, which
    /// keeps the file length a multiple of the page size.
    pub fn write_page(&self, page_no: u32, data: &[u8; PAGE_SIZE]) -> Result<(), HeapFileError> {
        let mut file = self.db_file.lock();
        let num_pages = Self::page_count(&file)?;
        if page_no > num_pages {
            return Err(HeapFileError::PageOutOfBounds {
                table_id: self.table_id,
                page_no,
                num_pages,
            });
        }

        file.seek(SeekFrom::Start(Self::page_offset(page_no)))?;
        file.write_all(data)?;
        file.flush()?;
        Ok(())
    }

    /// Append one initialized empty page and return its page number.
    pub fn allocate_page(&self) -> Result<u32, HeapFileError> {
        let mut file = self.db_file.lock();
        let page_no = Self::page_count(&file)?;
        let page = HeapPage::empty(PageId::new(self.table_id, page_no));

        file.seek(SeekFrom::End(0))?;
        file.write_all(page.data())?;
        file.flush()?;

        debug!("allocated page {} in table {}", page_no, self.table_id);
        Ok(page_no)
    }

    fn page_count(file: &File) -> Result<u32, std::io::Error> {
        let len = file.metadata()?.len();
        Ok((len / PAGE_SIZE as u64) as u32)
    }

    fn page_offset(page_no: u32) -> u64 {
        page_no as u64 * PAGE_SIZE as u64
    }
}
