//! In-inode extended attribute area parsing (§4.8).
//!
//! The distilled reference (`original_source/Azr43l-Ext4parser.py`,
//! `ext4_parse_xattr`) always decodes this area at a fixed offset of 160
//! bytes into the inode record (not the external block `i_file_acl` points
//! at) and reads the header plus exactly one entry; SPEC_FULL.md §9 calls
//! the single-entry read a limitation of the distillation rather than a
//! property of the format, so this walker iterates the full entry list
//! until a `name_len == 0` terminator or the 128-byte region is exhausted.

use binrw::BinRead;

pub const XATTR_MAGIC: u32 = 0xEA020000;

#[derive(BinRead, Debug, Clone)]
#[br(little)]
pub struct XattrHeader {
    pub magic: u32,
    pub refcount: u32,
    pub blocks: u32,
    pub hash: u32,
    #[br(count = 16)]
    pub reserved: Vec<u8>,
}

#[derive(BinRead, Debug, Clone)]
#[br(little)]
pub struct XattrEntry {
    pub name_len: u8,
    pub name_index: u8,
    pub value_offs: u16,
    pub value_block: u32,
    pub value_size: u32,
    pub hash: u32,
    #[br(count = name_len)]
    pub name: Vec<u8>,
}

impl XattrEntry {
    pub fn name_string(&self) -> String {
        crate::util::decode_name(&self.name)
    }
}

/// The size of the in-inode xattr region the inode record reserves (§4.8).
pub const XATTR_REGION_LEN: u64 = 128;

/// Decodes the xattr header at `offset` and every entry that follows it, in
/// table order, stopping at the first zero-length name (the list terminator)
/// or once the cursor would run past `offset + XATTR_REGION_LEN`.
pub fn walk_xattr_block(data: &[u8], offset: u64) -> Option<(XattrHeader, Vec<XattrEntry>)> {
    let mut cursor = std::io::Cursor::new(data);
    cursor.set_position(offset);
    let header = XattrHeader::read_le(&mut cursor).ok()?;
    if header.magic != XATTR_MAGIC {
        return None;
    }

    let region_end = offset + XATTR_REGION_LEN;
    let mut entries = Vec::new();
    let mut pos = offset + 32 + 16; // header, then the reserved/pad skip before the entry list
    loop {
        if pos >= region_end {
            break;
        }
        let Some(name_len) = data.get(pos as usize).copied() else {
            break;
        };
        if name_len == 0 {
            break;
        }
        cursor.set_position(pos);
        let Ok(entry) = XattrEntry::read_le(&mut cursor) else {
            break;
        };
        pos = cursor.position();
        pos = pos.div_ceil(4) * 4; // entries are padded to a 4-byte boundary
        if pos > region_end {
            break;
        }
        entries.push(entry);
    }
    Some((header, entries))
}

pub fn dump(header: &XattrHeader, entries: &[XattrEntry], out: &mut impl std::io::Write) -> std::io::Result<()> {
    writeln!(out, "Extended Attributes:")?;
    writeln!(out, "  Reference Count: {}", header.refcount)?;
    writeln!(out, "  Blocks: {}", header.blocks)?;
    writeln!(out, "  Hash: {:#010x}", header.hash)?;
    for entry in entries {
        writeln!(
            out,
            "  {} (name_index={}, value_size={}, value_block={})",
            entry.name_string(),
            entry.name_index,
            entry.value_size,
            entry.value_block
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes() -> Vec<u8> {
        // 32-byte XattrHeader (magic, refcount, blocks, hash, reserved[16])
        // plus the 16-byte skip before the entry list begins at offset+48.
        let mut buf = vec![0u8; 48];
        buf[0..4].copy_from_slice(&XATTR_MAGIC.to_le_bytes());
        buf[4..8].copy_from_slice(&1u32.to_le_bytes()); // refcount
        buf
    }

    fn entry_bytes(name: &str, value_size: u32) -> Vec<u8> {
        let mut buf = vec![0u8; 16];
        buf[0] = name.len() as u8;
        buf[12..16].copy_from_slice(&value_size.to_le_bytes());
        buf.extend_from_slice(name.as_bytes());
        while buf.len() % 4 != 0 {
            buf.push(0);
        }
        buf
    }

    #[test]
    fn non_magic_region_returns_none() {
        let data = vec![0u8; 64];
        assert!(walk_xattr_block(&data, 0).is_none());
    }

    #[test]
    fn single_entry_list_terminates_after_terminator() {
        let mut data = header_bytes();
        data.extend(entry_bytes("user.test", 4));
        data.push(0); // terminator name_len
        data.resize(128, 0);
        let (header, entries) = walk_xattr_block(&data, 0).unwrap();
        assert_eq!(header.refcount, 1);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name_string(), "user.test");
        assert_eq!(entries[0].value_size, 4);
    }

    #[test]
    fn multiple_entries_are_all_collected() {
        let mut data = header_bytes();
        data.extend(entry_bytes("user.a", 1));
        data.extend(entry_bytes("user.bb", 2));
        data.push(0);
        data.resize(256, 0);
        let (_, entries) = walk_xattr_block(&data, 0).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name_string(), "user.a");
        assert_eq!(entries[1].name_string(), "user.bb");
    }
}
