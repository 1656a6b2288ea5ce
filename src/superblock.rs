//! The filesystem-wide metadata record at absolute byte offset 1024 (§4.1).
//!
//! Field layout is bit-exact ext4 `struct ext4_super_block`; grounded on the
//! teacher's own `Ext4SuperBlock` (`ext4_h.rs`), stripped of the write-path
//! CRC32c stream mapping the teacher applies around it (checksum
//! verification is a documented Non-goal here) and extended with the
//! dump-facing accessors a forensic reader needs instead.

use binrw::BinRead;

use crate::fixed_str::FixedStr;
use crate::flags;
use crate::util;

pub const EXT4_SUPER_MAGIC: u16 = 0xEF53;
const INCOMPAT_64BIT: u32 = 0x0080;

#[derive(BinRead, Debug, Clone)]
#[br(little)]
pub struct Superblock {
    pub inodes_count: u32,
    pub blocks_count_lo: u32,
    pub r_blocks_count_lo: u32,
    pub free_blocks_count_lo: u32,
    pub free_inodes_count: u32,
    pub first_data_block: u32,
    pub log_block_size: u32,
    pub log_cluster_size: u32,
    pub blocks_per_group: u32,
    pub clusters_per_group: u32,
    pub inodes_per_group: u32,
    pub mtime: u32,
    pub wtime: u32,
    pub mnt_count: u16,
    pub max_mnt_count: u16,
    pub magic: u16,
    pub state: u16,
    pub errors: u16,
    pub minor_rev_level: u16,
    pub lastcheck: u32,
    pub checkinterval: u32,
    pub creator_os: u32,
    pub rev_level: u32,
    pub def_resuid: u16,
    pub def_resgid: u16,
    pub first_ino: u32,
    pub inode_size: u16,
    pub block_group_nr: u16,
    pub feature_compat: u32,
    pub feature_incompat: u32,
    pub feature_ro_compat: u32,
    pub uuid: [u8; 16],
    pub volume_name: FixedStr<16>,
    pub last_mounted: FixedStr<64>,
    pub algorithm_usage_bitmap: u32,
    pub prealloc_blocks: u8,
    pub prealloc_dir_blocks: u8,
    pub reserved_gdt_blocks: u16,
    pub journal_uuid: [u8; 16],
    pub journal_inum: u32,
    pub journal_dev: u32,
    pub last_orphan: u32,
    pub hash_seed: [u32; 4],
    pub def_hash_version: u8,
    pub jnl_backup_type: u8,
    pub desc_size: u16,
    pub default_mount_opts: u32,
    pub first_meta_bg: u32,
    pub mkfs_time: u32,
    pub jnl_blocks: [u32; 17],
    pub blocks_count_hi: u32,
    pub r_blocks_count_hi: u32,
    pub free_blocks_count_hi: u32,
    pub min_extra_isize: u16,
    pub want_extra_isize: u16,
    pub flags: u32,
    pub raid_stride: u16,
    pub mmp_update_interval: u16,
    pub mmp_block: u64,
    pub raid_stripe_width: u32,
    pub log_groups_per_flex: u8,
    pub checksum_type: u8,
    pub encryption_level: u8,
    pub reserved_pad: u8,
    pub kbytes_written: u64,
    pub snapshot_inum: u32,
    pub snapshot_id: u32,
    pub snapshot_r_blocks_count: u64,
    pub snapshot_list: u32,
    pub error_count: u32,
    pub first_error_time: u32,
    pub first_error_ino: u32,
    pub first_error_block: u64,
    pub first_error_func: FixedStr<32>,
    pub first_error_line: u32,
    pub last_error_time: u32,
    pub last_error_ino: u32,
    pub last_error_line: u32,
    pub last_error_block: u64,
    pub last_error_func: FixedStr<32>,
    pub mount_opts: FixedStr<64>,
    pub usr_quota_inum: u32,
    pub grp_quota_inum: u32,
    pub overhead_clusters: u32,
    pub backup_bgs: [u32; 2],
    pub encrypt_algos: [u8; 4],
    pub encrypt_pw_salt: [u8; 16],
    pub lpf_ino: u32,
    pub prj_quota_inum: u32,
    pub checksum_seed: u32,
    pub wtime_hi: u8,
    pub mtime_hi: u8,
    pub mkfs_time_hi: u8,
    pub lastcheck_hi: u8,
    pub first_error_time_hi: u8,
    pub last_error_time_hi: u8,
    pub first_error_errcode: u8,
    pub last_error_errcode: u8,
    pub encoding: u16,
    pub encoding_flags: u16,
    pub orphan_file_inum: u32,
    #[br(count = 376)]
    pub reserved: Vec<u8>,
}

impl Superblock {
    pub const OFFSET: u64 = 1024;

    pub fn magic_ok(&self) -> bool {
        self.magic == EXT4_SUPER_MAGIC
    }

    pub fn blocks_count(&self) -> u64 {
        ((self.blocks_count_hi as u64) << 32) | self.blocks_count_lo as u64
    }

    /// `1024 << log_block_size` (§9); only 4096 is supported downstream.
    pub fn block_size(&self) -> u64 {
        1024u64 << self.log_block_size
    }

    pub fn is_64bit(&self) -> bool {
        self.feature_incompat & INCOMPAT_64BIT != 0
    }

    pub fn group_descriptor_stride(&self) -> u64 {
        if self.is_64bit() && self.desc_size > 32 {
            self.desc_size as u64
        } else {
            32
        }
    }

    /// `(first_data_block + 1) * block_size` (§4.2, §9) rather than the
    /// distilled source's hardcoded 4096.
    pub fn group_descriptor_table_offset(&self) -> u64 {
        (self.first_data_block as u64 + 1) * self.block_size()
    }

    pub fn group_count(&self) -> u64 {
        self.blocks_count().div_ceil(self.blocks_per_group as u64)
    }

    pub fn inode_size(&self) -> u64 {
        self.inode_size as u64
    }

    /// Full-text labelled dump of every field (§4.1).
    pub fn dump(&self, out: &mut impl std::io::Write) -> std::io::Result<()> {
        writeln!(out, "Parsing Super Block:")?;
        writeln!(out, "  Inodes Count: {}", self.inodes_count)?;
        writeln!(out, "  Blocks Count: {}", self.blocks_count())?;
        writeln!(out, "  Reserved Blocks Count (lo): {}", self.r_blocks_count_lo)?;
        writeln!(out, "  Free Blocks Count (lo): {}", self.free_blocks_count_lo)?;
        writeln!(out, "  Free Inodes Count: {}", self.free_inodes_count)?;
        writeln!(out, "  First Data Block: {}", self.first_data_block)?;
        writeln!(
            out,
            "  Log Block Size: {} (block size = {})",
            self.log_block_size,
            self.block_size()
        )?;
        writeln!(out, "  Blocks Per Group: {}", self.blocks_per_group)?;
        writeln!(out, "  Inodes Per Group: {}", self.inodes_per_group)?;
        writeln!(out, "  Mount Time: {}", util::format_timestamp(self.mtime))?;
        writeln!(out, "  Write Time: {}", util::format_timestamp(self.wtime))?;
        writeln!(out, "  Mount Count: {}", self.mnt_count)?;
        writeln!(out, "  Max Mount Count: {}", self.max_mnt_count)?;
        writeln!(
            out,
            "  Magic: {:#06x}{}",
            self.magic,
            if self.magic_ok() { "" } else { " (BAD MAGIC)" }
        )?;
        writeln!(out, "  State: {}", flags::name_of(self.state as u32, flags::FS_STATE))?;
        writeln!(
            out,
            "  Errors Behavior: {}",
            flags::name_of(self.errors as u32, flags::ERRORS_BEHAVIOR)
        )?;
        writeln!(out, "  Minor Revision Level: {}", self.minor_rev_level)?;
        writeln!(out, "  Last Check: {}", util::format_timestamp(self.lastcheck))?;
        writeln!(out, "  Check Interval: {}", self.checkinterval)?;
        writeln!(
            out,
            "  Creator OS: {}",
            flags::name_of(self.creator_os, flags::CREATOR_OS)
        )?;
        writeln!(
            out,
            "  Revision Level: {}",
            flags::name_of(self.rev_level, flags::REV_LEVEL)
        )?;
        writeln!(out, "  Default Reserved UID: {}", self.def_resuid)?;
        writeln!(out, "  Default Reserved GID: {}", self.def_resgid)?;
        writeln!(out, "  First Non-reserved Inode: {}", self.first_ino)?;
        writeln!(out, "  Inode Size: {}", self.inode_size)?;
        writeln!(out, "  Block Group Number: {}", self.block_group_nr)?;
        writeln!(
            out,
            "  Feature Compat: {}",
            flags::expand_flags(self.feature_compat, flags::FEATURE_COMPAT)
        )?;
        writeln!(
            out,
            "  Feature Incompat: {}",
            flags::expand_flags(self.feature_incompat, flags::FEATURE_INCOMPAT)
        )?;
        writeln!(
            out,
            "  Feature RO Compat: {}",
            flags::expand_flags(self.feature_ro_compat, flags::FEATURE_RO_COMPAT)
        )?;
        writeln!(out, "  UUID: {}", util::hex_pairs(&self.uuid))?;
        writeln!(out, "  Volume Name: {}", self.volume_name.as_str())?;
        writeln!(out, "  Last Mounted: {}", self.last_mounted.as_str())?;
        writeln!(out, "  Algorithm Usage Bitmap: {}", self.algorithm_usage_bitmap)?;
        writeln!(out, "  Prealloc Blocks: {}", self.prealloc_blocks)?;
        writeln!(out, "  Prealloc Dir Blocks: {}", self.prealloc_dir_blocks)?;
        writeln!(out, "  Reserved GDT Blocks: {}", self.reserved_gdt_blocks)?;
        writeln!(out, "  Journal UUID: {}", util::hex_pairs(&self.journal_uuid))?;
        writeln!(out, "  Journal Inode: {}", self.journal_inum)?;
        writeln!(out, "  Journal Device: {}", self.journal_dev)?;
        writeln!(out, "  Last Orphan: {}", self.last_orphan)?;
        writeln!(out, "  Hash Seed: {:?}", self.hash_seed)?;
        writeln!(
            out,
            "  Default Hash Version: {}",
            flags::name_of(self.def_hash_version as u32, flags::HASH_VERSION)
        )?;
        writeln!(out, "  Descriptor Size: {}", self.desc_size)?;
        writeln!(
            out,
            "  Default Mount Opts: {}",
            flags::expand_flags(self.default_mount_opts, flags::DEFAULT_MOUNT_OPTS)
        )?;
        writeln!(out, "  First Meta Block Group: {}", self.first_meta_bg)?;
        writeln!(out, "  Mkfs Time: {}", util::format_timestamp(self.mkfs_time))?;
        writeln!(out, "  Min Extra Isize: {}", self.min_extra_isize)?;
        writeln!(out, "  Want Extra Isize: {}", self.want_extra_isize)?;
        writeln!(out, "  Flags: {}", flags::expand_flags(self.flags, flags::MISC_FLAGS))?;
        writeln!(out, "  Kilobytes Written: {}", self.kbytes_written)?;
        writeln!(out, "  Error Count: {}", self.error_count)?;
        writeln!(out, "  Lost+Found Inode: {}", self.lpf_ino)?;
        writeln!(out, "  Checksum Seed: {:#010x}", self.checksum_seed)?;
        writeln!(out, "  Encoding: {}", self.encoding)?;
        writeln!(out, "  64BIT: {}", self.is_64bit())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn minimal_superblock_bytes(inode_size: u16, inodes_per_group: u32) -> Vec<u8> {
        let mut buf = vec![0u8; 1024];
        buf[0..4].copy_from_slice(&256u32.to_le_bytes()); // inodes_count
        buf[4..8].copy_from_slice(&8u32.to_le_bytes()); // blocks_count_lo
        buf[24..28].copy_from_slice(&2u32.to_le_bytes()); // log_block_size (1024 << 2 = 4096)
        buf[32..36].copy_from_slice(&8192u32.to_le_bytes()); // blocks_per_group
        buf[40..44].copy_from_slice(&inodes_per_group.to_le_bytes());
        buf[56..58].copy_from_slice(&EXT4_SUPER_MAGIC.to_le_bytes()); // magic
        buf[84..88].copy_from_slice(&11u32.to_le_bytes()); // first_ino
        buf[88..90].copy_from_slice(&inode_size.to_le_bytes());
        buf
    }

    #[test]
    fn decodes_magic_and_geometry() {
        let buf = minimal_superblock_bytes(256, 32);
        let mut cursor = Cursor::new(buf);
        let sb = Superblock::read_le(&mut cursor).unwrap();
        assert!(sb.magic_ok());
        assert_eq!(sb.block_size(), 4096);
        assert_eq!(sb.inode_size, 256);
        assert_eq!(sb.group_descriptor_table_offset(), 4096);
    }

    #[test]
    fn bad_magic_does_not_panic_and_is_reported() {
        let mut buf = minimal_superblock_bytes(256, 32);
        buf[56..58].copy_from_slice(&0u16.to_le_bytes());
        let mut cursor = Cursor::new(buf);
        let sb = Superblock::read_le(&mut cursor).unwrap();
        assert!(!sb.magic_ok());
    }

    #[test]
    fn group_count_rounds_up() {
        let buf = minimal_superblock_bytes(256, 32);
        let mut cursor = Cursor::new(buf);
        let sb = Superblock::read_le(&mut cursor).unwrap();
        // 8 blocks, 8192 per group -> 1 group
        assert_eq!(sb.group_count(), 1);
    }
}
