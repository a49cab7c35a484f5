use crate::common::types::{PAGE_SIZE, PageId, TransactionId};
use crate::storage::page::error::PageError;
use crate::storage::page::header::PageHeader;
use crate::storage::page::layout::{HEADER_SIZE, SLOT_SIZE, SlotEntry};
use crate::storage::tuple::{RecordId, Tuple};

/// In-memory image of one fixed-size page. Tuple records are
/// bincode-encoded and stored slotted: record bytes grow up from the
/// header, the slot array grows down from the end of the page.
///
/// A dirty page remembers the transaction that mutated it. Under the
/// no-steal policy that transaction is the only one that may write the
/// page back (at commit) or throw it away (at abort).
#[derive(Debug)]
pub struct HeapPage {
    pid: PageId,
    data: [u8; PAGE_SIZE],
    dirty: Option<TransactionId>,
}

impl HeapPage {
    /// A fresh page holding no records.
    pub fn empty(pid: PageId) -> Self {
        let mut page = Self {
            pid,
            data: [0; PAGE_SIZE],
            dirty: None,
        };
        page.put_header(&PageHeader::new());
        page
    }

    /// Wraps a page image read from disk. The image must carry an
    /// initialized header; heap files only ever contain initialized pages.
    pub fn from_bytes(pid: PageId, data: [u8; PAGE_SIZE]) -> Self {
        Self {
            pid,
            data,
            dirty: None,
        }
    }

    pub fn pid(&self) -> PageId {
        self.pid
    }

    pub fn data(&self) -> &[u8; PAGE_SIZE] {
        &self.data
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.is_some()
    }

    /// The transaction whose uncommitted mutation this page carries.
    pub fn dirtied_by(&self) -> Option<TransactionId> {
        self.dirty
    }

    pub fn mark_dirty(&mut self, tid: TransactionId) {
        self.dirty = Some(tid);
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = None;
    }

    /// Append a tuple, returning its slot index.
    pub fn insert_tuple(&mut self, tuple: &Tuple) -> Result<u32, PageError> {
        let record = bincode::serialize(tuple)?;
        let mut header = self.header();

        // Record bytes plus the slot entry for the record
        let record_size = record.len() as u32;
        let total_space_needed = record_size + SLOT_SIZE as u32;
        if header.free_space_size < total_space_needed {
            return Err(PageError::InsufficientSpace);
        }

        let slot = header.record_count;
        let record_start = header.free_space_offset as usize;
        self.data[record_start..record_start + record.len()].copy_from_slice(&record);

        let entry = SlotEntry {
            offset: header.free_space_offset,
            length: record_size,
        };
        self.put_slot(slot, &entry);

        header.free_space_offset += record_size;
        header.free_space_size -= total_space_needed;
        header.record_count += 1;
        self.put_header(&header);

        Ok(slot)
    }

    /// Delete the tuple in a slot. The slot entry stays behind with zero
    /// length so later slot indices keep their meaning; neither the entry
    /// nor the record bytes are reclaimed, so free space never grows back.
    pub fn delete_slot(&mut self, slot: u32) -> Result<(), PageError> {
        let header = self.header();
        if slot >= header.record_count {
            return Err(PageError::SlotOutOfRange(slot));
        }

        let mut entry = self.slot(slot);
        if entry.length == 0 {
            return Err(PageError::TupleDeleted);
        }
        entry.length = 0;
        self.put_slot(slot, &entry);

        Ok(())
    }

    /// Decode the tuple in a slot, with its record id attached.
    pub fn tuple(&self, slot: u32) -> Result<Tuple, PageError> {
        let header = self.header();
        if slot >= header.record_count {
            return Err(PageError::SlotOutOfRange(slot));
        }
        let entry = self.slot(slot);
        if entry.length == 0 {
            return Err(PageError::TupleDeleted);
        }
        let start = entry.offset as usize;
        let end = start + entry.length as usize;
        let mut tuple: Tuple = bincode::deserialize(&self.data[start..end])?;
        tuple.set_rid(RecordId {
            page: self.pid,
            slot,
        });
        Ok(tuple)
    }

    /// All live tuples in slot order.
    pub fn tuples(&self) -> Result<Vec<Tuple>, PageError> {
        let header = self.header();
        let mut tuples = Vec::with_capacity(header.record_count as usize);
        for slot in 0..header.record_count {
            if self.slot(slot).length == 0 {
                continue;
            }
            tuples.push(self.tuple(slot)?);
        }
        Ok(tuples)
    }

    /// Number of live (non-deleted) tuples.
    pub fn tuple_count(&self) -> u32 {
        let header = self.header();
        (0..header.record_count)
            .filter(|&slot| self.slot(slot).length != 0)
            .count() as u32
    }

    /// Number of slots ever allocated, deleted ones included.
    pub fn slot_count(&self) -> u32 {
        self.header().record_count
    }

    pub fn free_space(&self) -> u32 {
        self.header().free_space_size
    }

    fn header(&self) -> PageHeader {
        PageHeader::from_bytes(&self.data[0..HEADER_SIZE])
    }

    fn put_header(&mut self, header: &PageHeader) {
        self.data[0..HEADER_SIZE].copy_from_slice(&header.to_bytes());
    }

    fn slot(&self, slot: u32) -> SlotEntry {
        let pos = SlotEntry::position(slot);
        SlotEntry::from_bytes(&self.data[pos..pos + SLOT_SIZE])
    }

    fn put_slot(&mut self, slot: u32, entry: &SlotEntry) {
        let pos = SlotEntry::position(slot);
        self.data[pos..pos + SLOT_SIZE].copy_from_slice(&entry.to_bytes());
    }
}
