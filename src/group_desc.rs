//! Per-block-group descriptor table walker (§4.2).
//!
//! Descriptors are 32 bytes wide unless `INCOMPAT_64BIT` is set and
//! `desc_size > 32`, in which case a second 32-byte half carrying the high
//! halves of every lo/hi field pair follows. Grounded on the teacher's
//! `Ext4BlockGroupDescriptor` (`ext4_h.rs`) for field layout, widened here to
//! a `binrw` `import`-parameterized read so the struct can decode either
//! width from the same definition instead of two near-duplicate structs.

use binrw::BinRead;

use crate::flags;

#[derive(BinRead, Debug, Clone)]
#[br(little, import(desc_size: u16))]
pub struct GroupDescriptor {
    pub block_bitmap_lo: u32,
    pub inode_bitmap_lo: u32,
    pub inode_table_lo: u32,
    pub free_blocks_count_lo: u16,
    pub free_inodes_count_lo: u16,
    pub used_dirs_count_lo: u16,
    pub flags: u16,
    pub exclude_bitmap_lo: u32,
    pub block_bitmap_csum_lo: u16,
    pub inode_bitmap_csum_lo: u16,
    pub itable_unused_lo: u16,
    pub checksum: u16,
    #[br(if(desc_size > 32))]
    pub hi: Option<GroupDescriptorHi>,
}

#[derive(BinRead, Debug, Clone, Default)]
#[br(little)]
pub struct GroupDescriptorHi {
    pub block_bitmap_hi: u32,
    pub inode_bitmap_hi: u32,
    pub inode_table_hi: u32,
    pub free_blocks_count_hi: u16,
    pub free_inodes_count_hi: u16,
    pub used_dirs_count_hi: u16,
    pub itable_unused_hi: u16,
    pub exclude_bitmap_hi: u32,
    pub block_bitmap_csum_hi: u16,
    pub inode_bitmap_csum_hi: u16,
    pub reserved: u32,
}

impl GroupDescriptor {
    pub fn inode_table(&self) -> u64 {
        let hi = self.hi.as_ref().map(|h| h.inode_table_hi).unwrap_or(0);
        ((hi as u64) << 32) | self.inode_table_lo as u64
    }

    pub fn block_bitmap(&self) -> u64 {
        let hi = self.hi.as_ref().map(|h| h.block_bitmap_hi).unwrap_or(0);
        ((hi as u64) << 32) | self.block_bitmap_lo as u64
    }

    pub fn inode_bitmap(&self) -> u64 {
        let hi = self.hi.as_ref().map(|h| h.inode_bitmap_hi).unwrap_or(0);
        ((hi as u64) << 32) | self.inode_bitmap_lo as u64
    }

    pub fn free_blocks_count(&self) -> u32 {
        let hi = self.hi.as_ref().map(|h| h.free_blocks_count_hi).unwrap_or(0);
        ((hi as u32) << 16) | self.free_blocks_count_lo as u32
    }

    pub fn free_inodes_count(&self) -> u32 {
        let hi = self.hi.as_ref().map(|h| h.free_inodes_count_hi).unwrap_or(0);
        ((hi as u32) << 16) | self.free_inodes_count_lo as u32
    }

    pub fn used_dirs_count(&self) -> u32 {
        let hi = self.hi.as_ref().map(|h| h.used_dirs_count_hi).unwrap_or(0);
        ((hi as u32) << 16) | self.used_dirs_count_lo as u32
    }

    pub fn dump(&self, index: u64, out: &mut impl std::io::Write) -> std::io::Result<()> {
        writeln!(out, "Parsing Block Group {}:", index)?;
        writeln!(out, "  Block Bitmap: {}", self.block_bitmap())?;
        writeln!(out, "  Inode Bitmap: {}", self.inode_bitmap())?;
        writeln!(out, "  Inode Table: {}", self.inode_table())?;
        writeln!(out, "  Free Blocks Count: {}", self.free_blocks_count())?;
        writeln!(out, "  Free Inodes Count: {}", self.free_inodes_count())?;
        writeln!(out, "  Used Dirs Count: {}", self.used_dirs_count())?;
        writeln!(out, "  Flags: {}", flags::expand_flags(self.flags as u32, flags::BG_FLAGS))?;
        writeln!(out, "  Exclude Bitmap (lo): {}", self.exclude_bitmap_lo)?;
        writeln!(out, "  Itable Unused (lo): {}", self.itable_unused_lo)?;
        writeln!(out, "  Checksum: {:#06x}", self.checksum)?;
        if let Some(hi) = &self.hi {
            writeln!(out, "  Block Bitmap Checksum (lo/hi): {}/{}", self.block_bitmap_csum_lo, hi.block_bitmap_csum_hi)?;
            writeln!(out, "  Inode Bitmap Checksum (lo/hi): {}/{}", self.inode_bitmap_csum_lo, hi.inode_bitmap_csum_hi)?;
            writeln!(out, "  Exclude Bitmap (hi): {}", hi.exclude_bitmap_hi)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn descriptor_bytes(stride: usize) -> Vec<u8> {
        let mut buf = vec![0u8; stride];
        buf[8..12].copy_from_slice(&42u32.to_le_bytes()); // inode_table_lo
        if stride > 32 {
            buf[40..44].copy_from_slice(&7u32.to_le_bytes()); // inode_table_hi (3rd field of the hi half, at 32+8)
        }
        buf
    }

    #[test]
    fn decodes_32_byte_stride_with_no_hi_half() {
        let buf = descriptor_bytes(32);
        let mut cursor = Cursor::new(buf);
        let gd = GroupDescriptor::read_le_args(&mut cursor, (32,)).unwrap();
        assert_eq!(gd.inode_table(), 42);
        assert!(gd.hi.is_none());
    }

    #[test]
    fn decodes_64_byte_stride_with_hi_half() {
        let buf = descriptor_bytes(64);
        let mut cursor = Cursor::new(buf);
        let gd = GroupDescriptor::read_le_args(&mut cursor, (64,)).unwrap();
        assert_eq!(gd.inode_table(), (7u64 << 32) | 42);
        assert!(gd.hi.is_some());
    }
}
