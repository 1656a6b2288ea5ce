//! Linear directory block walker (§4.6).
//!
//! A directory's data blocks are a packed sequence of `dir_entry_2` records
//! with no fixed count; corrupted or sparse directories can desynchronize
//! the walk in several distinct ways. The advancement rules below preserve,
//! in order, every branch the distilled reference's `ext4_parse_direntry`
//! (`original_source/Azr43l-Ext4parser.py`) checks before falling through to
//! "decode this as a real entry and advance by `rec_len`" — this crate logs
//! each corrupt-record branch it takes instead of silently reproducing it.

use tracing::warn;

use crate::util;

#[derive(Debug, Clone)]
pub struct DirEntry {
    pub inode: u32,
    pub rec_len: u16,
    pub name_len: u8,
    pub file_type: u8,
    pub name: String,
}

const MIN_REC_LEN_FOR_NAME: u16 = 263;
const DOT_DOT_ADVANCE: u64 = 8;

struct RawEntry {
    inode: u32,
    rec_len: u16,
    name_len: u8,
    file_type: u8,
}

fn read_raw(data: &[u8], offset: u64) -> Option<RawEntry> {
    let o = offset as usize;
    let header = data.get(o..o + 8)?;
    Some(RawEntry {
        inode: u32::from_le_bytes(header[0..4].try_into().unwrap()),
        rec_len: u16::from_le_bytes(header[4..6].try_into().unwrap()),
        name_len: header[6],
        file_type: header[7],
    })
}

fn read_name(data: &[u8], offset: u64, name_len: u8) -> String {
    let start = offset as usize + 8;
    let end = start + name_len as usize;
    match data.get(start..end) {
        Some(bytes) => util::decode_name(bytes),
        None => String::new(),
    }
}

/// Walks one directory's worth of linear entries starting at `block_offset`
/// and spanning `region_len` bytes, applying the ten advancement rules in
/// order at every position. `max_inode` and `first_ino` bound the
/// plausibility checks a few of those rules perform.
pub fn walk_linear_directory(
    data: &[u8],
    block_offset: u64,
    region_len: u64,
    max_inode: u32,
    first_ino: u32,
) -> Vec<DirEntry> {
    let mut entries = Vec::new();
    let mut i: u64 = 0;
    while i < region_len {
        let offset = block_offset + i;

        // Rule 0: end-of-region zero check.
        match data.get(offset as usize..(offset as usize + 0x13)) {
            Some(region) if region.iter().all(|&b| b == 0) => break,
            None => break,
            _ => {}
        }

        let Some(raw) = read_raw(data, offset) else {
            break;
        };

        // Rule 1: ".." is always valid and always advances by a fixed 8 bytes.
        if raw.name_len == 2 {
            let name = read_name(data, offset, raw.name_len);
            if name == ".." {
                entries.push(DirEntry {
                    inode: raw.inode,
                    rec_len: raw.rec_len,
                    name_len: raw.name_len,
                    file_type: raw.file_type,
                    name,
                });
                i += DOT_DOT_ADVANCE;
                continue;
            }
        }

        // Rule 2: deleted entry masquerading as an oversized record.
        if raw.inode == 0 && raw.rec_len > MIN_REC_LEN_FOR_NAME && raw.name_len == 0 {
            warn!(offset, "directory entry inode=0 with oversized rec_len and no name, skipping 4 bytes");
            i += 4;
            continue;
        }

        // Rule 3: inode out of range with an otherwise-empty header.
        if raw.inode > max_inode && raw.rec_len == 0 && raw.name_len == 0 {
            warn!(offset, inode = raw.inode, max_inode, "directory entry inode exceeds inode count, skipping 4 bytes");
            i += 4;
            continue;
        }

        // Rule 4: zeroed padding entry shaped like a deleted 12-byte slot.
        if raw.inode == 0 && raw.rec_len == 12 && raw.name_len == 0 {
            i += 12;
            continue;
        }

        // Rule 5: oversized record claiming a reserved low inode number.
        if raw.rec_len > MIN_REC_LEN_FOR_NAME && raw.inode < first_ino && raw.inode > 0 {
            warn!(offset, inode = raw.inode, first_ino, "directory entry claims a reserved inode number, skipping 8 bytes");
            i += 8;
            continue;
        }

        // Rule 6: file type absent.
        if raw.file_type == 0 {
            i += 8;
            continue;
        }

        // Rule 7: a live inode with no name.
        if raw.name_len == 0 && raw.inode != 0 {
            warn!(offset, inode = raw.inode, "directory entry has a live inode but zero name length, skipping 8 bytes");
            i += 8;
            continue;
        }

        // Rule 8: oversized record with no name at all.
        if raw.rec_len > MIN_REC_LEN_FOR_NAME && raw.name_len == 0 {
            warn!(offset, "directory entry has an oversized rec_len and no name, skipping 8 bytes");
            i += 8;
            continue;
        }

        // Rule 9: inode beyond the filesystem's inode count.
        if raw.inode > max_inode {
            warn!(offset, inode = raw.inode, max_inode, "directory entry inode exceeds inode count, skipping 4 bytes");
            i += 4;
            continue;
        }

        // Rule 10: a well-formed record, or the end of usable data.
        if raw.rec_len == 0 || raw.name_len == 0 {
            break;
        }
        let name = read_name(data, offset, raw.name_len);
        entries.push(DirEntry {
            inode: raw.inode,
            rec_len: raw.rec_len,
            name_len: raw.name_len,
            file_type: raw.file_type,
            name,
        });
        i += raw.rec_len as u64;
    }
    entries
}

pub fn dump(entries: &[DirEntry], out: &mut impl std::io::Write) -> std::io::Result<()> {
    for entry in entries {
        writeln!(out, "  Inode: {}", entry.inode)?;
        writeln!(out, "  Record Length: {}", entry.rec_len)?;
        writeln!(out, "  Name Length: {}", entry.name_len)?;
        writeln!(
            out,
            "  File Type: {}",
            crate::flags::name_of(entry.file_type as u32, crate::flags::FILE_TYPE)
        )?;
        writeln!(out, "  Name: {}", entry.name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_bytes(inode: u32, rec_len: u16, name: &str, file_type: u8) -> Vec<u8> {
        let mut buf = vec![0u8; 8];
        buf[0..4].copy_from_slice(&inode.to_le_bytes());
        buf[4..6].copy_from_slice(&rec_len.to_le_bytes());
        buf[6] = name.len() as u8;
        buf[7] = file_type;
        buf.extend_from_slice(name.as_bytes());
        buf.resize(rec_len as usize, 0);
        buf
    }

    #[test]
    fn well_formed_entries_are_all_collected() {
        let mut data = entry_bytes(2, 12, ".", 2);
        data.extend(entry_bytes(12, 4072, "hello.txt", 1));
        data.resize(4096, 0);
        let entries = walk_linear_directory(&data, 0, 4096, 1000, 11);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, ".");
        assert_eq!(entries[1].name, "hello.txt");
    }

    #[test]
    fn dot_dot_is_recognized_and_advances_by_a_fixed_eight_bytes() {
        let mut data = entry_bytes(2, 12, "..", 2);
        data.resize(4096, 0);
        let entries = walk_linear_directory(&data, 0, 4096, 1000, 11);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "..");
    }

    #[test]
    fn zeroed_region_terminates_the_walk() {
        let data = vec![0u8; 4096];
        let entries = walk_linear_directory(&data, 0, 4096, 1000, 11);
        assert!(entries.is_empty());
    }

    #[test]
    fn oversized_rec_len_with_no_name_advances_without_panicking() {
        let mut data = vec![0u8; 4096];
        // inode=0, rec_len=300 (>263), name_len=0 at offset 0 - rule 2 fires and
        // advances 4 bytes instead of treating this as a valid 300-byte record.
        data[4..6].copy_from_slice(&300u16.to_le_bytes());
        let entries = walk_linear_directory(&data, 0, 4096, 1000, 11);
        assert!(entries.is_empty());
    }

    #[test]
    fn inode_beyond_max_is_skipped() {
        let mut data = vec![0u8; 4096];
        data[0..4].copy_from_slice(&999_999u32.to_le_bytes());
        let entries = walk_linear_directory(&data, 0, 4096, 1000, 11);
        assert!(entries.is_empty());
    }
}
