use byteorder::{ByteOrder, LittleEndian};

use crate::common::types::PAGE_SIZE;

pub const HEADER_SIZE: usize = 12; // 4 bytes per field * 3 fields
pub const SLOT_SIZE: usize = 8; // 4 bytes for offset + 4 bytes for length

/// One slot array entry. A deleted record keeps its slot with length 0;
/// slots are never reused, so slot indices stay stable.
#[derive(Debug, Clone, Copy)]
pub struct SlotEntry {
    pub offset: u32,
    pub length: u32,
}

impl SlotEntry {
    pub fn to_bytes(&self) -> [u8; SLOT_SIZE] {
        let mut bytes = [0u8; SLOT_SIZE];
        LittleEndian::write_u32(&mut bytes[0..4], self.offset);
        LittleEndian::write_u32(&mut bytes[4..8], self.length);
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let offset = LittleEndian::read_u32(&bytes[0..4]);
        let length = LittleEndian::read_u32(&bytes[4..8]);
        Self { offset, length }
    }

    /// Byte position of a slot entry; the slot array grows down from the
    /// end of the page.
    pub fn position(slot: u32) -> usize {
        PAGE_SIZE - SLOT_SIZE * (slot as usize + 1)
    }
}
