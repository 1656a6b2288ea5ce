//! Symbolic names for the enumerated fields and bitmasks the dumper expands:
//! superblock state/errors/creator-os/revision/hash-version, feature flags,
//! block-group flags, inode flags, and directory file-type codes.
//!
//! Grounded on the distilled reference's `EXT4_*` dictionaries (every code
//! point and bit here matches a table in `original_source/Azr43l-Ext4parser.py`);
//! expressed here as plain `&[(u32, &str)]` tables walked by [`expand_flags`]
//! rather than as Python dicts, since nothing downstream needs to look a flag
//! up by name.

/// Renders a bitmask as the `+`-joined names of its set bits, in table order.
/// Bits not present in `table` are rendered as `0x<hex>` so nothing is silently
/// dropped from the dump.
pub fn expand_flags(value: u32, table: &[(u32, &str)]) -> String {
    let mut parts = Vec::new();
    let mut remaining = value;
    for &(bit, name) in table {
        if bit != 0 && value & bit == bit {
            parts.push(name.to_string());
            remaining &= !bit;
        }
    }
    if remaining != 0 {
        parts.push(format!("0x{:x}", remaining));
    }
    if parts.is_empty() {
        "(none)".to_string()
    } else {
        parts.join("+")
    }
}

/// Looks a single enumerated value up by exact match, falling back to the raw
/// decimal value so unrecognized codes still render instead of disappearing.
pub fn name_of(value: u32, table: &[(u32, &str)]) -> String {
    table
        .iter()
        .find(|&&(v, _)| v == value)
        .map(|&(_, name)| name.to_string())
        .unwrap_or_else(|| value.to_string())
}

pub const FS_STATE: &[(u32, &str)] = &[
    (0x0001, "EXT4_VALID_FS"),
    (0x0002, "EXT4_ERROR_FS"),
    (0x0004, "EXT4_ORPHAN_FS"),
];

pub const ERRORS_BEHAVIOR: &[(u32, &str)] = &[
    (1, "EXT4_ERRORS_CONTINUE"),
    (2, "EXT4_ERRORS_RO"),
    (3, "EXT4_ERRORS_PANIC"),
];

pub const CREATOR_OS: &[(u32, &str)] = &[
    (0, "EXT4_OS_LINUX"),
    (1, "EXT4_OS_HURD"),
    (2, "EXT4_OS_MASIX"),
    (3, "EXT4_OS_FREEBSD"),
    (4, "EXT4_OS_LITES"),
];

pub const REV_LEVEL: &[(u32, &str)] = &[(0, "EXT4_GOOD_OLD_REV"), (1, "EXT4_DYNAMIC_REV")];

pub const HASH_VERSION: &[(u32, &str)] = &[
    (0, "Legacy"),
    (1, "HalfMD4"),
    (2, "Tea"),
    (3, "Legacy-Unsigned"),
    (4, "HalfMD4-Unsigned"),
    (5, "Tea-Unsigned"),
    (6, "Splash"),
];

pub const FEATURE_COMPAT: &[(u32, &str)] = &[
    (0x0001, "DIR_PREALLOC"),
    (0x0002, "IMAGIC_INODES"),
    (0x0004, "HAS_JOURNAL"),
    (0x0008, "EXT_ATTR"),
    (0x0010, "RESIZE_INODE"),
    (0x0020, "DIR_INDEX"),
    (0x0200, "SPARSE_SUPER2"),
];

pub const FEATURE_INCOMPAT: &[(u32, &str)] = &[
    (0x0001, "COMPRESSION"),
    (0x0002, "FILETYPE"),
    (0x0004, "RECOVER"),
    (0x0008, "JOURNAL_DEV"),
    (0x0010, "META_BG"),
    (0x0040, "EXTENTS"),
    (0x0080, "64BIT"),
    (0x0100, "MMP"),
    (0x0200, "FLEX_BG"),
    (0x0400, "EA_INODE"),
    (0x1000, "DIRDATA"),
    (0x2000, "CSUM_SEED"),
    (0x4000, "LARGEDIR"),
    (0x8000, "INLINE_DATA"),
    (0x10000, "ENCRYPT"),
    (0x20000, "CASEFOLD"),
];

pub const FEATURE_RO_COMPAT: &[(u32, &str)] = &[
    (0x0001, "SPARSE_SUPER"),
    (0x0002, "LARGE_FILE"),
    (0x0004, "BTREE_DIR"),
    (0x0008, "HUGE_FILE"),
    (0x0010, "GDT_CSUM"),
    (0x0020, "DIR_NLINK"),
    (0x0040, "EXTRA_ISIZE"),
    (0x0080, "HAS_SNAPSHOT"),
    (0x0100, "QUOTA"),
    (0x0200, "BIGALLOC"),
    (0x0400, "METADATA_CSUM"),
    (0x1000, "READONLY"),
    (0x2000, "PROJECT"),
    (0x8000, "VERITY"),
];

pub const DEFAULT_MOUNT_OPTS: &[(u32, &str)] = &[
    (0x0001, "DEBUG"),
    (0x0002, "BSDGROUPS"),
    (0x0004, "XATTR_USER"),
    (0x0008, "ACL"),
    (0x0010, "UID16"),
    (0x0020, "JMODE_DATA"),
    (0x0040, "JMODE_ORDERED"),
    (0x0100, "NOBARRIER"),
    (0x0200, "BLOCK_VALIDITY"),
    (0x0400, "DISCARD"),
    (0x0800, "NODELALLOC"),
];

pub const MISC_FLAGS: &[(u32, &str)] = &[
    (0x0001, "SIGNED_HASH"),
    (0x0002, "UNSIGNED_HASH"),
    (0x0004, "TEST_FILESYS"),
    (0x0010, "IS_SNAPSHOT"),
    (0x0020, "FIX_SNAPSHOT"),
    (0x0040, "FIX_EXCLUDE"),
];

pub const BG_FLAGS: &[(u32, &str)] = &[
    (0x0001, "INODE_UNINIT"),
    (0x0002, "BLOCK_UNINIT"),
    (0x0004, "INODE_ZEROED"),
];

pub const INODE_FLAGS: &[(u32, &str)] = &[
    (0x1, "SECRM_FL"),
    (0x2, "UNRM_FL"),
    (0x4, "COMPR_FL"),
    (0x8, "SYNC_FL"),
    (0x10, "IMMUTABLE_FL"),
    (0x20, "APPEND_FL"),
    (0x40, "NODUMP_FL"),
    (0x80, "NOATIME_FL"),
    (0x100, "DIRTY_FL"),
    (0x200, "COMPRBLK_FL"),
    (0x400, "NOCOMPR_FL"),
    (0x800, "ECOMPR_FL"),
    (0x1000, "INDEX_FL"),
    (0x2000, "IMAGIC_FL"),
    (0x4000, "JOURNAL_DATA_FL"),
    (0x8000, "NOTAIL_FL"),
    (0x10000, "DIRSYNC_FL"),
    (0x20000, "TOPDIR_FL"),
    (0x40000, "HUGE_FILE_FL"),
    (0x80000, "EXTENTS_FL"),
    (0x200000, "EA_INODE_FL"),
    (0x400000, "EOFBLOCKS_FL"),
    (0x1000000, "INLINE_DATA_FL"),
    (0x80000000, "RESERVED_FL"),
];

pub const EXT4_INDEX_FL: u32 = 0x1000;
pub const EXT4_EXTENTS_FL: u32 = 0x80000;

pub const FILE_TYPE: &[(u32, &str)] = &[
    (0x0, "UNKNOWN"),
    (0x1, "REG_FILE"),
    (0x2, "DIR"),
    (0x3, "CHRDEV"),
    (0x4, "BLKDEV"),
    (0x5, "FIFO"),
    (0x6, "SOCK"),
    (0x7, "SYMLINK"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_multiple_set_bits_in_table_order() {
        let bits = 0x0008 | 0x0040; // EXTENTS + 64BIT
        assert_eq!(expand_flags(bits, FEATURE_INCOMPAT), "JOURNAL_DEV+EXTENTS");
    }

    #[test]
    fn unknown_bits_render_as_hex_rather_than_vanish() {
        assert_eq!(expand_flags(0x4000_0000, FEATURE_INCOMPAT), "0x40000000");
    }

    #[test]
    fn zero_renders_as_none() {
        assert_eq!(expand_flags(0, FEATURE_COMPAT), "(none)");
    }

    #[test]
    fn name_of_falls_back_to_raw_value() {
        assert_eq!(name_of(99, CREATOR_OS), "99");
    }
}
