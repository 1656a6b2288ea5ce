//! The 128-byte (or larger) fixed inode record (§4.4) and its `i_mode`/
//! `i_flags` bit-level helpers.
//!
//! Field layout is grounded on the teacher's `Ext4Inode` (`ext4_h.rs`); the
//! 60-byte `i_block` area is kept as a raw byte array here (rather than the
//! teacher's always-extent `Ext4SingleExtent`) because this crate must
//! reinterpret it polymorphically as either an extent-tree root or a legacy
//! block map (§4.5, §4.5a, §9) depending on what it actually contains.

use binrw::BinRead;

use crate::flags;
use crate::util;

pub const S_IFMT: u16 = 0xF000;
pub const S_IFDIR: u16 = 0x4000;
pub const S_IFREG: u16 = 0x8000;
pub const S_IFLNK: u16 = 0xA000;

const MODE_NAMES: &[(u16, &str)] = &[
    (S_IFIFO, "S_IFIFO"),
    (0x2000, "S_IFCHR"),
    (S_IFDIR, "S_IFDIR"),
    (0x6000, "S_IFBLK"),
    (S_IFREG, "S_IFREG"),
    (S_IFLNK, "S_IFLNK"),
    (0xC000, "S_IFSOCK"),
];
const S_IFIFO: u16 = 0x1000;

#[derive(BinRead, Debug, Clone)]
#[br(little, import(inode_size: u16))]
pub struct Inode {
    pub mode: u16,
    pub uid: u16,
    pub size_lo: u32,
    pub atime: u32,
    pub ctime: u32,
    pub mtime: u32,
    pub dtime: u32,
    pub gid: u16,
    pub links_count: u16,
    pub blocks_lo: u32,
    pub flags: u32,
    pub osd1: u32,
    pub block: [u8; 60],
    pub generation: u32,
    pub file_acl_lo: u32,
    pub size_high: u32,
    pub obso_faddr: u32,
    pub blocks_high: u16,
    pub file_acl_high: u16,
    pub uid_high: u16,
    pub gid_high: u16,
    pub checksum_lo: u16,
    pub reserved: u16,
    #[br(if(inode_size > 128))]
    pub extra: Option<InodeExtra>,
}

#[derive(BinRead, Debug, Clone, Default)]
#[br(little)]
pub struct InodeExtra {
    pub extra_isize: u16,
    pub checksum_hi: u16,
    pub ctime_extra: u32,
    pub mtime_extra: u32,
    pub atime_extra: u32,
    pub crtime: u32,
    pub crtime_extra: u32,
    pub version_hi: u32,
    pub projid: u32,
}

/// Mirrors the reference parser's `DEBUG` toggle: when off (the default),
/// a zero `size_lo` alone marks a slot empty, before the uid/block check.
const DEBUG: bool = false;

impl Inode {
    /// Empty-slot skip policy (§4.3 step 2): applied once, at the table
    /// walk, before this record's other fields are dumped.
    pub fn looks_empty(&self) -> bool {
        if !DEBUG && self.size_lo == 0 {
            return true;
        }
        self.uid == 0 && self.block.iter().take(4).all(|&b| b == 0)
    }

    pub fn file_type(&self) -> u16 {
        self.mode & S_IFMT
    }

    pub fn is_dir(&self) -> bool {
        self.file_type() == S_IFDIR
    }

    pub fn size(&self) -> u64 {
        ((self.size_high as u64) << 32) | self.size_lo as u64
    }

    pub fn blocks(&self) -> u64 {
        ((self.blocks_high as u64) << 32) | self.blocks_lo as u64
    }

    pub fn file_acl(&self) -> u64 {
        ((self.file_acl_high as u64) << 32) | self.file_acl_lo as u64
    }

    pub fn uses_extents(&self) -> bool {
        self.flags & flags::EXT4_EXTENTS_FL != 0
    }

    pub fn uses_htree(&self) -> bool {
        self.flags & flags::EXT4_INDEX_FL != 0
    }

    pub fn dump(&self, global_inode: u64, out: &mut impl std::io::Write) -> std::io::Result<()> {
        writeln!(out, "Parsing Inode {}:", global_inode)?;
        let mode_names: Vec<(u32, &str)> = MODE_NAMES.iter().map(|&(v, n)| (v as u32, n)).collect();
        writeln!(
            out,
            "  Mode: {:#06o} ({})",
            self.mode,
            flags::name_of(self.file_type() as u32, &mode_names)
        )?;
        writeln!(out, "  UID: {}", (self.uid_high as u32) << 16 | self.uid as u32)?;
        writeln!(out, "  GID: {}", (self.gid_high as u32) << 16 | self.gid as u32)?;
        writeln!(out, "  Size: {}", self.size())?;
        writeln!(out, "  Access Time: {}", util::format_timestamp(self.atime))?;
        writeln!(out, "  Change Time: {}", util::format_timestamp(self.ctime))?;
        writeln!(out, "  Modification Time: {}", util::format_timestamp(self.mtime))?;
        writeln!(out, "  Deletion Time: {}", util::format_timestamp(self.dtime))?;
        writeln!(out, "  Links Count: {}", self.links_count)?;
        writeln!(out, "  Blocks: {}", self.blocks())?;
        writeln!(out, "  Flags: {}", flags::expand_flags(self.flags, flags::INODE_FLAGS))?;
        writeln!(out, "  Generation: {}", self.generation)?;
        writeln!(out, "  File ACL: {}", self.file_acl())?;
        writeln!(out, "  Checksum (lo): {:#06x}", self.checksum_lo)?;
        if let Some(extra) = &self.extra {
            writeln!(out, "  Extra Isize: {}", extra.extra_isize)?;
            writeln!(out, "  Checksum (hi): {:#06x}", extra.checksum_hi)?;
            writeln!(out, "  Creation Time: {}", util::format_timestamp(extra.crtime))?;
            writeln!(out, "  Project ID: {}", extra.projid)?;
        }
        writeln!(
            out,
            "  Block Area (as 15 u32 words): {:?}",
            legacy_words(&self.block)
        )?;
        Ok(())
    }
}

/// Reinterprets the 60-byte block area as 15 little-endian u32 words, used
/// both for the dump and as the legacy block map's raw input (§4.4, §4.5a).
pub fn legacy_words(block: &[u8; 60]) -> [u32; 15] {
    let mut words = [0u32; 15];
    for (i, word) in words.iter_mut().enumerate() {
        *word = u32::from_le_bytes(block[i * 4..i * 4 + 4].try_into().unwrap());
    }
    words
}
